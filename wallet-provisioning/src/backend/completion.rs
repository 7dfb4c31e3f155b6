use super::BackendClient;
use crate::{
    errors::session_error::SessionError,
    models::{challenge::ChallengePayload, session::SessionSnapshot},
    notifier::{Notifier, Outcome, ProvisioningEvent},
    session_store::SessionStore,
};
use log::{Level, debug, error, info, log};

/// Backend round-trip for a session created with a `backendUrl`.
///
/// Runs detached from the command that started the session. On failure the
/// continuation stays pending: the flow's own timeout, or the watchdog, ends
/// the session. The failure is still published as a `backend_failed` event.
pub async fn complete_from_backend(
    store: SessionStore,
    backend: BackendClient,
    notifier: Notifier,
    session: SessionSnapshot,
    payload: ChallengePayload,
) {
    let session_id = session.session_id.clone();
    let level = if session.options.debug {
        Level::Warn
    } else {
        Level::Debug
    };

    let material = match backend.request_completion(&session.options, &payload).await {
        Ok(material) => material,
        Err(error) => {
            log!(level, "Backend could not complete session {session_id}: {error}");
            notifier.publish(ProvisioningEvent::BackendFailed(Outcome::backend_failed(
                &session_id,
                error.to_string(),
            )));
            return;
        }
    };

    let pending = match store.consume_completion(&session_id).await {
        Ok(pending) => pending,
        Err(SessionError::NotFound(_) | SessionError::NoPendingCompletion(_)) => {
            debug!("Session {session_id} finished before the backend replied");
            return;
        }
        Err(error) => {
            error!("Could not take pending completion of session {session_id}: {error}");
            return;
        }
    };

    match pending.complete(material) {
        Ok(()) => info!("Backend completion sent for session {session_id}"),
        Err(error) => log!(level, "Session {session_id}: {error}"),
    }
}
