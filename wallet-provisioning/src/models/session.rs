use super::{
    challenge::ChallengePayload,
    completion_material::CompletionMaterial,
    options::{Mode, ProvisioningOptions},
};
use crate::errors::session_error::SessionError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::oneshot;

pub type SessionId = String;

/// Single-use handle that resumes the secure-element flow with completion material.
///
/// The flow keeps the receiving half returned by [`PendingCompletion::channel`];
/// completing consumes the token, so it cannot be invoked twice.
#[derive(Debug)]
pub struct PendingCompletion {
    sender: oneshot::Sender<CompletionMaterial>,
}

impl PendingCompletion {
    pub fn channel() -> (PendingCompletion, oneshot::Receiver<CompletionMaterial>) {
        let (sender, receiver) = oneshot::channel();
        (PendingCompletion { sender }, receiver)
    }

    pub fn complete(self, material: CompletionMaterial) -> Result<(), SessionError> {
        self.sender
            .send(material)
            .or(Err(SessionError::CompletionAbandoned))
    }

    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

#[derive(Debug)]
pub struct Session {
    pub session_id: SessionId,
    pub options: Arc<ProvisioningOptions>,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
    pending_completion: Option<PendingCompletion>,
    challenge: Option<ChallengePayload>,
}

/// Read-only view of a session handed out by the store.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub options: Arc<ProvisioningOptions>,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
    pub pending_completion: bool,
    /// Last challenge the flow issued for this session.
    pub challenge: Option<ChallengePayload>,
}

impl Session {
    pub fn new(session_id: SessionId, options: ProvisioningOptions, created_at: DateTime<Utc>) -> Self {
        let mode = options.mode();
        Session {
            session_id,
            options: Arc::new(options),
            mode,
            created_at,
            pending_completion: None,
            challenge: None,
        }
    }

    pub fn attach_completion(&mut self, pending: PendingCompletion) -> Result<(), SessionError> {
        if self.pending_completion.is_some() {
            return Err(SessionError::CompletionAlreadyAttached(
                self.session_id.clone(),
            ));
        }

        self.pending_completion = Some(pending);
        Ok(())
    }

    pub fn take_completion(&mut self) -> Result<PendingCompletion, SessionError> {
        self.pending_completion
            .take()
            .ok_or(SessionError::NoPendingCompletion(self.session_id.clone()))
    }

    pub fn record_challenge(&mut self, challenge: ChallengePayload) {
        self.challenge = Some(challenge);
    }

    pub fn has_pending_completion(&self) -> bool {
        self.pending_completion.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            options: self.options.clone(),
            mode: self.mode,
            created_at: self.created_at,
            pending_completion: self.has_pending_completion(),
            challenge: self.challenge.clone(),
        }
    }
}
