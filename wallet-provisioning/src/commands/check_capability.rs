use super::traits::command::Command;
use crate::{
    errors::provisioning_error::{ProvisioningError, UNAVAILABLE_OR_MISSING_ENTITLEMENT},
    flow::SecureElementFlow,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub ok: bool,
    pub can_add: bool,
    pub platform_version: String,
    pub ios_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

pub struct CheckCapability {
    flow: Arc<dyn SecureElementFlow>,
}

impl CheckCapability {
    pub fn new(flow: Arc<dyn SecureElementFlow>) -> Self {
        CheckCapability { flow }
    }

    pub fn report(&self) -> CapabilityReport {
        let can_add = self.flow.can_add_payment_pass();
        let platform_version = self.flow.device_info().platform_version;

        // The platform does not tell an incapable device apart from a missing entitlement.
        CapabilityReport {
            ok: true,
            can_add,
            ios_version: platform_version.clone(),
            platform_version,
            reason: (!can_add).then_some(UNAVAILABLE_OR_MISSING_ENTITLEMENT),
        }
    }
}

impl Command for CheckCapability {
    type Reply = CapabilityReport;

    async fn handle(&self, _args: Value) -> Result<CapabilityReport, ProvisioningError> {
        Ok(self.report())
    }
}
