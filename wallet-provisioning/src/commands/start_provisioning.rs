use super::traits::command::Command;
use crate::{
    errors::provisioning_error::ProvisioningError,
    flow::{RequestConfiguration, SecureElementFlow},
    models::{
        options::{Mode, ProvisioningOptions},
        session::SessionId,
    },
    relay::FlowDelegate,
    session_store::SessionStore,
};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

pub const PRESENTED: &str = "presented";

/// Acknowledges that the flow is on screen. The eventual outcome arrives as an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningStarted {
    pub ok: bool,
    pub session_id: SessionId,
    pub status: &'static str,
    pub mode: Mode,
}

pub struct StartProvisioning {
    store: SessionStore,
    flow: Arc<dyn SecureElementFlow>,
    delegate: FlowDelegate,
    default_backend_timeout: Duration,
}

impl StartProvisioning {
    pub fn new(
        store: SessionStore,
        flow: Arc<dyn SecureElementFlow>,
        delegate: FlowDelegate,
        default_backend_timeout: Duration,
    ) -> Self {
        StartProvisioning {
            store,
            flow,
            delegate,
            default_backend_timeout,
        }
    }
}

impl Command for StartProvisioning {
    type Reply = ProvisioningStarted;

    async fn handle(&self, args: Value) -> Result<ProvisioningStarted, ProvisioningError> {
        let options = ProvisioningOptions::from_value(&args, self.default_backend_timeout)?;

        // Capability can change between checkCapability and this call.
        if !self.flow.can_add_payment_pass() {
            return Err(ProvisioningError::CannotAddPaymentPass);
        }

        let configuration = RequestConfiguration::from_options(&options)?;
        let mode = options.mode();
        let session_id = self.store.create(options).await?;

        if let Err(error) = self.flow.present(configuration, self.delegate.clone()) {
            warn!("Could not present flow for session {session_id}: {error}");
            if let Err(error) = self.store.destroy(&session_id).await {
                error!("Could not destroy session {session_id}: {error}");
            }

            return Err(ProvisioningError::CannotPresentFlow(error.to_string()));
        }

        info!("Presented provisioning flow for session {session_id} in mode {mode:?}");
        Ok(ProvisioningStarted {
            ok: true,
            session_id,
            status: PRESENTED,
            mode,
        })
    }
}
