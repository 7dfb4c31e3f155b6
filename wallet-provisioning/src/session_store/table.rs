use crate::{
    errors::session_error::SessionError,
    models::{
        challenge::{Challenge, ChallengePayload},
        options::ProvisioningOptions,
        session::{PendingCompletion, Session, SessionId, SessionSnapshot},
    },
};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ExpiredSession {
    pub session: SessionSnapshot,
    pub was_active: bool,
}

/// Sessions keyed by id, plus the one session bound to the live flow.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<SessionId, Session>,
    active: Option<SessionId>,
}

impl SessionTable {
    pub fn create(
        &mut self,
        options: ProvisioningOptions,
        now: DateTime<Utc>,
    ) -> Result<SessionId, SessionError> {
        if let Some(active) = &self.active {
            return Err(SessionError::FlowAlreadyActive {
                active: active.clone(),
            });
        }

        let mut session_id = new_session_id();
        while self.sessions.contains_key(&session_id) {
            session_id = new_session_id();
        }

        self.sessions.insert(
            session_id.clone(),
            Session::new(session_id.clone(), options, now),
        );
        self.active = Some(session_id.clone());

        Ok(session_id)
    }

    pub fn get(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        self.sessions
            .get(session_id)
            .map(Session::snapshot)
            .ok_or(SessionError::NotFound(session_id.to_string()))
    }

    pub fn active(&self) -> Option<SessionSnapshot> {
        self.active
            .as_ref()
            .and_then(|session_id| self.sessions.get(session_id))
            .map(Session::snapshot)
    }

    pub fn attach_completion(
        &mut self,
        session_id: &str,
        pending: PendingCompletion,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound(session_id.to_string()))?;

        session.attach_completion(pending)?;
        Ok(session.snapshot())
    }

    /// Binds a flow challenge to the active session: parks the continuation and
    /// keeps the challenge so it can be fetched again while the session waits.
    pub fn attach_to_active(
        &mut self,
        pending: PendingCompletion,
        challenge: &Challenge,
    ) -> Result<(SessionSnapshot, ChallengePayload), SessionError> {
        let session_id = self.active.as_ref().ok_or(SessionError::NoActiveSession)?;
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound(session_id.clone()))?;

        session.attach_completion(pending)?;
        let payload = ChallengePayload::new(&session.session_id, &session.options, challenge);
        session.record_challenge(payload.clone());

        Ok((session.snapshot(), payload))
    }

    pub fn consume_completion(&mut self, session_id: &str) -> Result<PendingCompletion, SessionError> {
        self.sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound(session_id.to_string()))?
            .take_completion()
    }

    pub fn destroy(&mut self, session_id: &str) -> Option<SessionSnapshot> {
        let session = self.sessions.remove(session_id)?;
        if self.active.as_deref() == Some(session_id) {
            self.active = None;
        }

        Some(session.snapshot())
    }

    pub fn destroy_active(&mut self) -> Option<SessionSnapshot> {
        let session_id = self.active.take()?;
        self.destroy(&session_id)
    }

    pub fn expire_stale(&mut self, max_age: TimeDelta, now: DateTime<Utc>) -> Vec<ExpiredSession> {
        let stale: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| now - session.created_at >= max_age)
            .map(|session| session.session_id.clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|session_id| {
                let was_active = self.active.as_deref() == Some(session_id.as_str());
                self.destroy(&session_id)
                    .map(|session| ExpiredSession { session, was_active })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn new_session_id() -> SessionId {
    guid_create::GUID::rand().to_string().to_lowercase()
}
