use crate::models::challenge::ChallengePayload;
use log::trace;
use serde::Serialize;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    time::Instant,
};

pub const SESSION_EXPIRED: &str = "session_expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Added,
    Failed,
    BackendFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub ok: bool,
    pub session_id: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn added(session_id: &str) -> Self {
        Outcome {
            ok: true,
            session_id: session_id.to_string(),
            status: OutcomeStatus::Added,
            error: None,
        }
    }

    pub fn failed(session_id: &str, error: impl Into<String>) -> Self {
        Outcome {
            ok: false,
            session_id: session_id.to_string(),
            status: OutcomeStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn backend_failed(session_id: &str, error: impl Into<String>) -> Self {
        Outcome {
            status: OutcomeStatus::BackendFailed,
            ..Outcome::failed(session_id, error)
        }
    }
}

/// Out-of-band notifications for the calling application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvisioningEvent {
    /// Challenge waiting for externally supplied completion material.
    Challenge(ChallengePayload),
    /// The secure-element flow concluded; the session is gone.
    Finished(Outcome),
    /// The merchant backend could not produce completion material. Not terminal.
    BackendFailed(Outcome),
    /// The session outlived its time to live and was destroyed.
    Expired(Outcome),
}

impl ProvisioningEvent {
    pub fn session_id(&self) -> &str {
        match self {
            ProvisioningEvent::Challenge(payload) => &payload.session_id,
            ProvisioningEvent::Finished(outcome)
            | ProvisioningEvent::BackendFailed(outcome)
            | ProvisioningEvent::Expired(outcome) => &outcome.session_id,
        }
    }
}

/// A published event with its position in the notifier's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencedEvent {
    pub seq: u64,
    #[serde(flatten)]
    pub event: ProvisioningEvent,
}

/// Events published after a cursor. Pass `cursor` back to receive only newer ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventBatch {
    pub cursor: u64,
    /// Events that fell out of the log before this read.
    #[serde(skip_serializing_if = "is_zero")]
    pub missed: u64,
    pub events: Vec<SequencedEvent>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[derive(Debug)]
struct EventLog {
    capacity: usize,
    last_seq: u64,
    events: VecDeque<SequencedEvent>,
}

impl EventLog {
    fn push(&mut self, event: ProvisioningEvent) -> u64 {
        self.last_seq += 1;
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(SequencedEvent {
            seq: self.last_seq,
            event,
        });

        self.last_seq
    }

    fn after(&self, cursor: u64) -> EventBatch {
        let events: Vec<SequencedEvent> = self
            .events
            .iter()
            .filter(|sequenced| sequenced.seq > cursor)
            .cloned()
            .collect();

        let first_kept = self
            .events
            .front()
            .map_or(self.last_seq + 1, |sequenced| sequenced.seq);

        EventBatch {
            cursor: events.last().map_or(cursor, |sequenced| sequenced.seq),
            missed: first_kept.saturating_sub(cursor + 1),
            events,
        }
    }
}

/// Fans events out to in-process subscribers and keeps the most recent ones
/// in a bounded log, so a client polling after an event fired still gets it.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: broadcast::Sender<ProvisioningEvent>,
    log: Arc<Mutex<EventLog>>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Notifier {
            tx,
            log: Arc::new(Mutex::new(EventLog {
                capacity,
                last_seq: 0,
                events: VecDeque::with_capacity(capacity),
            })),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ProvisioningEvent) {
        let session_id = event.session_id().to_string();
        // Logged before it is broadcast: a woken poller always finds it.
        let seq = self.lock_log().push(event.clone());

        match self.tx.send(event) {
            Ok(listeners) => {
                trace!("Event {seq} for session {session_id} sent to {listeners} listeners")
            }
            Err(_) => trace!("Event {seq} for session {session_id} logged without listeners"),
        }
    }

    pub fn events_after(&self, cursor: u64) -> EventBatch {
        self.lock_log().after(cursor)
    }

    /// Returns the logged events after `cursor`, waiting up to `timeout` for one
    /// to be published when there are none yet. An empty batch means the wait ran out.
    pub async fn wait_after(&self, cursor: u64, timeout: Duration) -> EventBatch {
        let mut rx = self.tx.subscribe();
        let deadline = Instant::now() + timeout;

        loop {
            let batch = self.events_after(cursor);
            if !batch.events.is_empty() {
                return batch;
            }

            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
                Ok(Err(RecvError::Closed)) | Err(_) => return batch,
            }
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, EventLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
