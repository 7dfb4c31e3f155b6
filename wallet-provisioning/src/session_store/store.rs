use super::{
    message::StoreMessage,
    table::{ExpiredSession, SessionTable},
};
use crate::{
    errors::session_error::SessionError,
    models::{
        challenge::{Challenge, ChallengePayload},
        options::ProvisioningOptions,
        session::{PendingCompletion, SessionId, SessionSnapshot},
    },
};
use chrono::{TimeDelta, Utc};
use log::{debug, trace, warn};
use tokio::sync::{mpsc, oneshot};

const STORE_CHANNEL_CAPACITY: usize = 64;

/// Handle to the task that owns every provisioning session.
///
/// All reads and writes go through one channel, so operations on the table and
/// on the active pointer are applied one at a time. The task stops once every
/// handle has been dropped, releasing whatever continuations were still pending.
#[derive(Clone, Debug)]
pub struct SessionStore {
    tx: mpsc::Sender<StoreMessage>,
}

impl SessionStore {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(STORE_CHANNEL_CAPACITY);
        tokio::spawn(run(rx));
        SessionStore { tx }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> StoreMessage,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(message(reply))
            .await
            .or(Err(SessionError::StoreClosed))?;

        response.await.or(Err(SessionError::StoreClosed))
    }

    pub async fn create(&self, options: ProvisioningOptions) -> Result<SessionId, SessionError> {
        self.request(|reply| StoreMessage::Create { options, reply })
            .await?
    }

    pub async fn get(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| StoreMessage::Get {
            session_id: session_id.to_string(),
            reply,
        })
        .await?
    }

    pub async fn active(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        self.request(|reply| StoreMessage::Active { reply }).await
    }

    pub async fn attach_completion(
        &self,
        session_id: &str,
        pending: PendingCompletion,
    ) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| StoreMessage::AttachCompletion {
            session_id: session_id.to_string(),
            pending,
            reply,
        })
        .await?
    }

    pub async fn attach_to_active(
        &self,
        pending: PendingCompletion,
        challenge: Challenge,
    ) -> Result<(SessionSnapshot, ChallengePayload), SessionError> {
        self.request(|reply| StoreMessage::AttachToActive {
            pending,
            challenge,
            reply,
        })
        .await?
    }

    pub async fn consume_completion(
        &self,
        session_id: &str,
    ) -> Result<PendingCompletion, SessionError> {
        self.request(|reply| StoreMessage::ConsumeCompletion {
            session_id: session_id.to_string(),
            reply,
        })
        .await?
    }

    pub async fn destroy(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        self.request(|reply| StoreMessage::Destroy {
            session_id: session_id.to_string(),
            reply,
        })
        .await
    }

    pub async fn destroy_active(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        self.request(|reply| StoreMessage::DestroyActive { reply })
            .await
    }

    pub async fn expire_stale(&self, max_age: TimeDelta) -> Result<Vec<ExpiredSession>, SessionError> {
        self.request(|reply| StoreMessage::ExpireStale { max_age, reply })
            .await
    }
}

async fn run(mut rx: mpsc::Receiver<StoreMessage>) {
    let mut table = SessionTable::default();

    while let Some(message) = rx.recv().await {
        match message {
            StoreMessage::Create { options, reply } => {
                let result = table.create(options, Utc::now());
                match &result {
                    Ok(session_id) => debug!("Created session {session_id}"),
                    Err(error) => debug!("Refused to create session: {error}"),
                }

                if let Err(Ok(session_id)) = reply.send(result) {
                    warn!("Creator of session {session_id} went away, destroying it");
                    table.destroy(&session_id);
                }
            }

            StoreMessage::Get { session_id, reply } => {
                reply.send(table.get(&session_id)).ok();
            }

            StoreMessage::Active { reply } => {
                reply.send(table.active()).ok();
            }

            StoreMessage::AttachCompletion {
                session_id,
                pending,
                reply,
            } => {
                let result = table.attach_completion(&session_id, pending);
                if result.is_ok() {
                    trace!("Session {session_id} is waiting for completion material");
                }
                reply.send(result).ok();
            }

            StoreMessage::AttachToActive {
                pending,
                challenge,
                reply,
            } => {
                let result = table.attach_to_active(pending, &challenge);
                if let Ok((session, _)) = &result {
                    trace!(
                        "Session {} is waiting for completion material",
                        session.session_id
                    );
                }
                reply.send(result).ok();
            }

            StoreMessage::ConsumeCompletion { session_id, reply } => {
                let result = table.consume_completion(&session_id);
                if let Err(Ok(pending)) = reply.send(result) {
                    // Nobody took the continuation, put it back.
                    if let Err(error) = table.attach_completion(&session_id, pending) {
                        warn!("Could not restore pending completion: {error}");
                    }
                }
            }

            StoreMessage::Destroy { session_id, reply } => {
                let destroyed = table.destroy(&session_id);
                if destroyed.is_some() {
                    debug!("Destroyed session {session_id}");
                }
                reply.send(destroyed).ok();
            }

            StoreMessage::DestroyActive { reply } => {
                let destroyed = table.destroy_active();
                if let Some(session) = &destroyed {
                    debug!("Destroyed active session {}", session.session_id);
                }
                reply.send(destroyed).ok();
            }

            StoreMessage::ExpireStale { max_age, reply } => {
                let expired = table.expire_stale(max_age, Utc::now());
                for session in &expired {
                    debug!("Expired session {}", session.session.session_id);
                }
                reply.send(expired).ok();
            }
        }
    }

    debug!("Session store stopped with {} resident sessions", table.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        challenge::DeviceInfo, completion_material::CompletionMaterial, options::Mode,
    };
    use serde_json::json;
    use std::time::Duration;

    fn options(value: serde_json::Value) -> ProvisioningOptions {
        ProvisioningOptions::from_value(&value, Duration::from_secs(25)).unwrap()
    }

    #[tokio::test]
    async fn lifecycle_through_the_actor() {
        let store = SessionStore::spawn();
        let session_id = store
            .create(options(json!({ "backendUrl": "https://merchant.example" })))
            .await
            .unwrap();

        let session = store.get(&session_id).await.unwrap();
        assert_eq!(session.mode, Mode::Backend);
        assert!(!session.pending_completion);

        let (pending, receiver) = PendingCompletion::channel();
        let challenge = Challenge {
            certificates: vec![vec![1]],
            nonce: vec![2],
            nonce_signature: vec![3],
            device: DeviceInfo {
                platform_version: "17.4".to_string(),
                model: "iPhone".to_string(),
            },
        };
        store.attach_to_active(pending, challenge).await.unwrap();
        assert!(store.get(&session_id).await.unwrap().pending_completion);

        let material = CompletionMaterial {
            activation_data: vec![1],
            encrypted_pass_data: vec![2],
            ephemeral_public_key: vec![3],
        };
        store
            .consume_completion(&session_id)
            .await
            .unwrap()
            .complete(material.clone())
            .unwrap();
        assert_eq!(receiver.await.unwrap(), material);

        assert_eq!(
            store.consume_completion(&session_id).await.unwrap_err(),
            SessionError::NoPendingCompletion(session_id.clone())
        );

        store.destroy(&session_id).await.unwrap();
        assert_eq!(
            store.get(&session_id).await.unwrap_err(),
            SessionError::NotFound(session_id)
        );
        assert!(store.active().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let store = SessionStore::spawn();

        assert_eq!(
            store.consume_completion("unknown-id").await.unwrap_err(),
            SessionError::NotFound("unknown-id".to_string())
        );
        assert!(store.destroy("unknown-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn destroy_active_clears_the_pointer() {
        let store = SessionStore::spawn();
        let session_id = store.create(options(json!({}))).await.unwrap();

        let destroyed = store.destroy_active().await.unwrap().unwrap();
        assert_eq!(destroyed.session_id, session_id);
        assert!(store.destroy_active().await.unwrap().is_none());
    }
}
