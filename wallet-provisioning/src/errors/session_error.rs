use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(String),
    #[error("Session {0} has no pending completion")]
    NoPendingCompletion(String),
    #[error("Session {0} already holds a pending completion")]
    CompletionAlreadyAttached(String),
    #[error("No session is bound to the provisioning flow")]
    NoActiveSession,
    #[error("Session {active} is already bound to the provisioning flow")]
    FlowAlreadyActive { active: String },
    #[error("Provisioning flow stopped waiting for completion material")]
    CompletionAbandoned,
    #[error("Session store is not running")]
    StoreClosed,
}
