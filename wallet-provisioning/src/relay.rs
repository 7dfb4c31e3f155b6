use crate::{
    backend::{BackendClient, completion::complete_from_backend},
    errors::flow_error::FlowError,
    flow::SecureElementFlow,
    models::{
        challenge::Challenge,
        completion_material::CompletionMaterial,
        options::Mode,
        session::PendingCompletion,
    },
    notifier::{Notifier, Outcome, ProvisioningEvent},
    session_store::SessionStore,
};
use log::{error, info, warn};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;

/// Receives the secure-element flow's callbacks and routes them to the active session.
#[derive(Clone)]
pub struct FlowDelegate {
    store: SessionStore,
    notifier: Notifier,
    backend: BackendClient,
    flow: Weak<dyn SecureElementFlow>,
}

impl FlowDelegate {
    pub fn new(
        store: SessionStore,
        notifier: Notifier,
        backend: BackendClient,
        flow: &Arc<dyn SecureElementFlow>,
    ) -> Self {
        FlowDelegate {
            store,
            notifier,
            backend,
            flow: Arc::downgrade(flow),
        }
    }

    /// Binds the challenge to the active session and starts its completion path.
    ///
    /// The returned receiver resolves with the completion material once either
    /// the merchant backend or `completeProvisioning` supplies it. `None` means
    /// no session owns the flow and it has been dismissed.
    pub async fn request_challenge_response(
        &self,
        challenge: Challenge,
    ) -> Option<oneshot::Receiver<CompletionMaterial>> {
        let certificates = challenge.certificates.len();
        let (pending, response) = PendingCompletion::channel();
        let (session, payload) = match self.store.attach_to_active(pending, challenge).await {
            Ok(bound) => bound,
            Err(error) => {
                warn!("Dismissing provisioning flow, challenge has no owner: {error}");
                self.dismiss_flow();
                return None;
            }
        };

        info!(
            "Challenge received for session {} ({certificates} certificates)",
            session.session_id
        );

        match session.mode {
            Mode::Backend => {
                tokio::spawn(complete_from_backend(
                    self.store.clone(),
                    self.backend.clone(),
                    self.notifier.clone(),
                    session,
                    payload,
                ));
            }

            Mode::External => {
                self.notifier.publish(ProvisioningEvent::Challenge(payload));
            }
        }

        Some(response)
    }

    /// Terminal callback of the flow. Destroys the active session and reports the outcome.
    pub async fn finished(&self, result: Result<(), FlowError>) {
        let session = match self.store.destroy_active().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                warn!("Provisioning flow finished without an active session");
                self.dismiss_flow();
                return;
            }
            Err(error) => {
                error!("Could not destroy active session: {error}");
                self.dismiss_flow();
                return;
            }
        };

        let outcome = match result {
            Ok(()) => {
                info!("Pass added for session {}", session.session_id);
                Outcome::added(&session.session_id)
            }
            Err(error) => {
                warn!("Provisioning failed for session {}: {error}", session.session_id);
                Outcome::failed(&session.session_id, error.to_string())
            }
        };

        self.notifier.publish(ProvisioningEvent::Finished(outcome));
        self.dismiss_flow();
    }

    fn dismiss_flow(&self) {
        if let Some(flow) = self.flow.upgrade() {
            flow.dismiss();
        }
    }
}
