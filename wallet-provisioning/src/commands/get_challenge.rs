use super::traits::command::Command;
use crate::{
    errors::provisioning_error::ProvisioningError, models::challenge::ChallengePayload,
    session_store::SessionStore,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingChallenge {
    pub ok: bool,
    #[serde(flatten)]
    pub challenge: ChallengePayload,
}

/// Hands out the challenge a session is waiting on, for callers that missed the event.
pub struct GetChallenge {
    store: SessionStore,
}

impl GetChallenge {
    pub fn new(store: SessionStore) -> Self {
        GetChallenge { store }
    }
}

impl Command for GetChallenge {
    type Reply = PendingChallenge;

    async fn handle(&self, args: Value) -> Result<PendingChallenge, ProvisioningError> {
        let session_id = args
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or(ProvisioningError::InvalidOptions(
                "sessionId must be a string".to_string(),
            ))?;

        let session = self.store.get(session_id).await?;
        match session.challenge {
            Some(challenge) if session.pending_completion => Ok(PendingChallenge {
                ok: true,
                challenge,
            }),
            _ => Err(ProvisioningError::NoPendingCompletionHandler(
                session.session_id,
            )),
        }
    }
}
