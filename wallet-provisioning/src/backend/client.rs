use crate::{
    errors::backend_error::BackendError,
    models::{
        challenge::ChallengePayload,
        completion_material::{CompletionMaterial, EncodedCompletionMaterial},
        options::ProvisioningOptions,
    },
};

/// Upper bound on a backend reply body.
pub const MAX_REPLY_BYTES: usize = 256 * 1024;

/// HTTP client for the merchant backend that turns a challenge into completion material.
#[derive(Clone, Debug, Default)]
pub struct BackendClient {
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new() -> Self {
        BackendClient {
            http: reqwest::Client::new(),
        }
    }

    pub async fn request_completion(
        &self,
        options: &ProvisioningOptions,
        payload: &ChallengePayload,
    ) -> Result<CompletionMaterial, BackendError> {
        let backend_url = options
            .backend_url
            .clone()
            .ok_or(BackendError::NoBackendUrl)?;

        let mut response = self
            .http
            .post(backend_url)
            .headers(options.backend_headers.clone())
            .timeout(options.backend_timeout)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        if response
            .content_length()
            .is_some_and(|length| length > MAX_REPLY_BYTES as u64)
        {
            return Err(BackendError::ReplyTooLarge {
                limit: MAX_REPLY_BYTES,
            });
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_REPLY_BYTES {
                return Err(BackendError::ReplyTooLarge {
                    limit: MAX_REPLY_BYTES,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let encoded: EncodedCompletionMaterial = serde_json::from_slice(&body)
            .map_err(|error| BackendError::MalformedResponse(error.to_string()))?;

        Ok(CompletionMaterial::try_from(encoded)?)
    }
}
