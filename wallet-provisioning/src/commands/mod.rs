use crate::{
    backend::BackendClient,
    errors::provisioning_error::ProvisioningError,
    flow::SecureElementFlow,
    notifier::{Notifier, ProvisioningEvent},
    relay::FlowDelegate,
    session_store::SessionStore,
};
use check_capability::{CapabilityReport, CheckCapability};
use complete_provisioning::{CompleteProvisioning, CompletionSent};
use get_challenge::{GetChallenge, PendingChallenge};
use log::{error, trace, warn};
use serde::Serialize;
use serde_json::{Value, json};
use start_provisioning::{ProvisioningStarted, StartProvisioning};
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use traits::command::Command;

pub mod check_capability;
pub mod complete_provisioning;
pub mod get_challenge;
pub mod start_provisioning;
pub mod traits;

/// Inbound operations of the calling application.
///
/// Every failure is returned as an `{ok: false, error}` payload from
/// [`CommandSurface::dispatch`]; the typed methods expose the same results
/// for Rust callers.
#[derive(Clone)]
pub struct CommandSurface {
    store: SessionStore,
    notifier: Notifier,
    flow: Arc<dyn SecureElementFlow>,
    delegate: FlowDelegate,
    default_backend_timeout: Duration,
}

impl CommandSurface {
    pub fn new(
        store: SessionStore,
        notifier: Notifier,
        flow: Arc<dyn SecureElementFlow>,
        backend: BackendClient,
        default_backend_timeout: Duration,
    ) -> Self {
        let delegate = FlowDelegate::new(store.clone(), notifier.clone(), backend, &flow);
        CommandSurface {
            store,
            notifier,
            flow,
            delegate,
            default_backend_timeout,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProvisioningEvent> {
        self.notifier.subscribe()
    }

    pub fn check_capability(&self) -> CapabilityReport {
        CheckCapability::new(self.flow.clone()).report()
    }

    pub async fn start_provisioning(
        &self,
        args: Value,
    ) -> Result<ProvisioningStarted, ProvisioningError> {
        StartProvisioning::new(
            self.store.clone(),
            self.flow.clone(),
            self.delegate.clone(),
            self.default_backend_timeout,
        )
        .handle(args)
        .await
    }

    pub async fn complete_provisioning(
        &self,
        args: Value,
    ) -> Result<CompletionSent, ProvisioningError> {
        CompleteProvisioning::new(self.store.clone())
            .handle(args)
            .await
    }

    pub async fn get_challenge(&self, args: Value) -> Result<PendingChallenge, ProvisioningError> {
        GetChallenge::new(self.store.clone()).handle(args).await
    }

    pub async fn dispatch(&self, action: &str, args: Value) -> Value {
        trace!("C: {action} {args}");
        let reply = match action {
            "checkCapability" | "canAddPaymentPass" => {
                reply_payload(CheckCapability::new(self.flow.clone()).handle(args).await)
            }

            "startProvisioning" | "startAddPaymentPass" => {
                reply_payload(self.start_provisioning(args).await)
            }

            "completeProvisioning" => reply_payload(self.complete_provisioning(args).await),

            "getChallenge" => reply_payload(self.get_challenge(args).await),

            _ => reply_payload::<Value>(Err(ProvisioningError::UnknownAction(action.to_string()))),
        };

        trace!("S: {reply}");
        reply
    }
}

fn reply_payload<T: Serialize>(result: Result<T, ProvisioningError>) -> Value {
    match result {
        Ok(reply) => serde_json::to_value(reply).unwrap_or_else(|error| {
            error!("Could not serialize reply: {error}");
            json!({ "ok": false, "error": "internal_error" })
        }),

        Err(error) => {
            warn!("Command failed: {error}");
            error.into_payload()
        }
    }
}
