use super::session_error::SessionError;
use serde_json::{Value, json};
use thiserror::Error;

pub const UNAVAILABLE_OR_MISSING_ENTITLEMENT: &str = "unavailable_or_missing_entitlement";

/// Failures reported to the calling application as `{ok: false, error}` payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Device cannot add a payment pass")]
    CannotAddPaymentPass,
    #[error("Could not create request configuration: {0}")]
    CannotCreateRequestConfiguration(String),
    #[error("Session {active_session_id} is already provisioning")]
    ProvisioningInProgress { active_session_id: String },
    #[error("Could not present provisioning flow: {0}")]
    CannotPresentFlow(String),
    #[error("Unknown session {0}")]
    InvalidSession(String),
    #[error("Session {0} has no pending completion handler")]
    NoPendingCompletionHandler(String),
    #[error("Invalid completion material for session {session_id}: {reason}")]
    InvalidBackendPayload { session_id: String, reason: String },
    #[error("Unknown action {0}")]
    UnknownAction(String),
    #[error("Session store is not running")]
    SessionStoreUnavailable,
}

impl ProvisioningError {
    pub fn code(&self) -> &'static str {
        match self {
            ProvisioningError::InvalidOptions(_) => "invalid_options",
            ProvisioningError::CannotAddPaymentPass => "cannot_add_payment_pass",
            ProvisioningError::CannotCreateRequestConfiguration(_) => {
                "cannot_create_request_configuration"
            }
            ProvisioningError::ProvisioningInProgress { .. } => "provisioning_in_progress",
            ProvisioningError::CannotPresentFlow(_) => "cannot_present_flow",
            ProvisioningError::InvalidSession(_) => "invalid_session",
            ProvisioningError::NoPendingCompletionHandler(_) => "no_pending_completion_handler",
            ProvisioningError::InvalidBackendPayload { .. } => "invalid_backend_payload",
            ProvisioningError::UnknownAction(_) => "unknown_action",
            ProvisioningError::SessionStoreUnavailable => "session_store_unavailable",
        }
    }

    pub fn into_payload(self) -> Value {
        let mut payload = json!({
            "ok": false,
            "error": self.code(),
            "message": self.to_string(),
        });

        let extra = match self {
            ProvisioningError::CannotAddPaymentPass => {
                Some(("reason", UNAVAILABLE_OR_MISSING_ENTITLEMENT.to_string()))
            }
            ProvisioningError::ProvisioningInProgress { active_session_id } => {
                Some(("activeSessionId", active_session_id))
            }
            ProvisioningError::InvalidSession(session_id)
            | ProvisioningError::NoPendingCompletionHandler(session_id)
            | ProvisioningError::InvalidBackendPayload { session_id, .. } => {
                Some(("sessionId", session_id))
            }
            ProvisioningError::UnknownAction(action) => Some(("action", action)),
            _ => None,
        };

        if let (Some((key, value)), Some(object)) = (extra, payload.as_object_mut()) {
            object.insert(key.to_string(), Value::String(value));
        }

        payload
    }
}

impl From<SessionError> for ProvisioningError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotFound(session_id) => ProvisioningError::InvalidSession(session_id),
            SessionError::NoPendingCompletion(session_id)
            | SessionError::CompletionAlreadyAttached(session_id) => {
                ProvisioningError::NoPendingCompletionHandler(session_id)
            }
            SessionError::FlowAlreadyActive { active } => ProvisioningError::ProvisioningInProgress {
                active_session_id: active,
            },
            SessionError::NoActiveSession => ProvisioningError::InvalidSession(String::new()),
            SessionError::CompletionAbandoned => {
                ProvisioningError::NoPendingCompletionHandler(String::new())
            }
            SessionError::StoreClosed => ProvisioningError::SessionStoreUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_code_and_session_id() {
        let payload = ProvisioningError::InvalidSession("unknown-id".to_string()).into_payload();

        assert_eq!(payload["ok"], false);
        assert_eq!(payload["error"], "invalid_session");
        assert_eq!(payload["sessionId"], "unknown-id");
    }

    #[test]
    fn capability_failure_names_the_reason() {
        let payload = ProvisioningError::CannotAddPaymentPass.into_payload();

        assert_eq!(payload["error"], "cannot_add_payment_pass");
        assert_eq!(payload["reason"], UNAVAILABLE_OR_MISSING_ENTITLEMENT);
    }

    #[test]
    fn session_errors_map_to_stable_codes() {
        let error: ProvisioningError = SessionError::NoPendingCompletion("s1".to_string()).into();
        assert_eq!(error.code(), "no_pending_completion_handler");

        let error: ProvisioningError = SessionError::FlowAlreadyActive {
            active: "s2".to_string(),
        }
        .into();
        assert_eq!(error.code(), "provisioning_in_progress");
        assert_eq!(error.into_payload()["activeSessionId"], "s2");
    }
}
