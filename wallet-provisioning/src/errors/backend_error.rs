use super::material_error::MaterialError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Session has no backend URL")]
    NoBackendUrl,
    #[error("Could not reach backend: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Backend replied with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Backend reply is larger than {limit} bytes")]
    ReplyTooLarge { limit: usize },
    #[error("Backend reply is not the expected JSON: {0}")]
    MalformedResponse(String),
    #[error("Backend reply has invalid completion material: {0}")]
    InvalidMaterial(#[from] MaterialError),
}
