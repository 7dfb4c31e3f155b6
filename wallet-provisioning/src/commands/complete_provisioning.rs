use super::traits::command::Command;
use crate::{
    errors::provisioning_error::ProvisioningError,
    models::{
        completion_material::{CompletionMaterial, EncodedCompletionMaterial},
        session::SessionId,
    },
    session_store::SessionStore,
};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const COMPLETED_REQUEST_SENT: &str = "completed_request_sent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSent {
    pub ok: bool,
    pub session_id: SessionId,
    pub status: &'static str,
}

/// Feeds externally supplied completion material to a waiting session.
pub struct CompleteProvisioning {
    store: SessionStore,
}

impl CompleteProvisioning {
    pub fn new(store: SessionStore) -> Self {
        CompleteProvisioning { store }
    }
}

impl Command for CompleteProvisioning {
    type Reply = CompletionSent;

    async fn handle(&self, args: Value) -> Result<CompletionSent, ProvisioningError> {
        let session_id = args
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or(ProvisioningError::InvalidOptions(
                "sessionId must be a string".to_string(),
            ))?
            .to_string();

        let session = self.store.get(&session_id).await?;
        if !session.pending_completion {
            return Err(ProvisioningError::NoPendingCompletionHandler(session_id));
        }

        let material = EncodedCompletionMaterial::deserialize(&args)
            .map_err(|error| error.to_string())
            .and_then(|encoded| {
                CompletionMaterial::try_from(encoded).map_err(|error| error.to_string())
            })
            .map_err(|reason| ProvisioningError::InvalidBackendPayload {
                session_id: session_id.clone(),
                reason,
            })?;

        let pending = self.store.consume_completion(&session_id).await?;
        pending
            .complete(material)
            .or(Err(ProvisioningError::NoPendingCompletionHandler(
                session_id.clone(),
            )))?;

        info!("Completion material sent for session {session_id}");
        Ok(CompletionSent {
            ok: true,
            session_id,
            status: COMPLETED_REQUEST_SENT,
        })
    }
}
