use crate::errors::provisioning_error::ProvisioningError;
use serde::Serialize;
use serde_json::Value;

pub trait Command {
    type Reply: Serialize;

    fn handle(
        &self,
        args: Value,
    ) -> impl Future<Output = Result<Self::Reply, ProvisioningError>> + Send;
}
