use crate::{
    errors::session_error::SessionError,
    flow::SecureElementFlow,
    notifier::{Notifier, Outcome, ProvisioningEvent, SESSION_EXPIRED},
    session_store::SessionStore,
};
use chrono::TimeDelta;
use log::{error, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Destroys sessions whose flow never reported back, so their continuations do not leak.
pub fn spawn(
    store: SessionStore,
    notifier: Notifier,
    flow: Arc<dyn SecureElementFlow>,
    session_ttl: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(error) = sweep(&store, &notifier, flow.as_ref(), session_ttl).await {
                error!("Watchdog stopped: {error}");
                break;
            }
        }
    })
}

pub async fn sweep(
    store: &SessionStore,
    notifier: &Notifier,
    flow: &dyn SecureElementFlow,
    session_ttl: Duration,
) -> Result<usize, SessionError> {
    let max_age = TimeDelta::from_std(session_ttl).unwrap_or(TimeDelta::MAX);
    let expired = store.expire_stale(max_age).await?;

    for expired_session in &expired {
        let session_id = &expired_session.session.session_id;
        warn!("Session {session_id} expired after {}s", session_ttl.as_secs());

        if expired_session.was_active {
            flow.dismiss();
        }

        notifier.publish(ProvisioningEvent::Expired(Outcome::failed(
            session_id,
            SESSION_EXPIRED,
        )));
    }

    if !expired.is_empty() {
        info!("Watchdog expired {} sessions", expired.len());
    }

    Ok(expired.len())
}
