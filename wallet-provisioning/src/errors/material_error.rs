use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    #[error("{0} is missing")]
    Missing(&'static str),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("{0} is not valid base64")]
    NotBase64(&'static str),
}
