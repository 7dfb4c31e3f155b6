use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Provisioning flow could not be presented: {0}")]
    NotPresented(String),
    #[error("Provisioning flow was cancelled")]
    Cancelled,
    #[error("Provisioning flow timed out waiting for completion material")]
    TimedOut,
    #[error("Secure element rejected the pass: {0}")]
    Platform(String),
}
