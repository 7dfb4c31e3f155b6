use super::table::ExpiredSession;
use crate::{
    errors::session_error::SessionError,
    models::{
        challenge::{Challenge, ChallengePayload},
        options::ProvisioningOptions,
        session::{PendingCompletion, SessionId, SessionSnapshot},
    },
};
use chrono::TimeDelta;
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum StoreMessage {
    Create {
        options: ProvisioningOptions,
        reply: oneshot::Sender<Result<SessionId, SessionError>>,
    },

    Get {
        session_id: SessionId,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },

    Active {
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },

    AttachCompletion {
        session_id: SessionId,
        pending: PendingCompletion,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },

    AttachToActive {
        pending: PendingCompletion,
        challenge: Challenge,
        reply: oneshot::Sender<Result<(SessionSnapshot, ChallengePayload), SessionError>>,
    },

    ConsumeCompletion {
        session_id: SessionId,
        reply: oneshot::Sender<Result<PendingCompletion, SessionError>>,
    },

    Destroy {
        session_id: SessionId,
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },

    DestroyActive {
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },

    ExpireStale {
        max_age: TimeDelta,
        reply: oneshot::Sender<Vec<ExpiredSession>>,
    },
}
