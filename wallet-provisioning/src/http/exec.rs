use crate::{commands::CommandSurface, errors::provisioning_error::ProvisioningError};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde_json::Value;

/// Runs one command. Always answers 200; failures travel in the payload.
pub(crate) async fn exec(
    State(surface): State<CommandSurface>,
    Path(action): Path<String>,
    body: Bytes,
) -> Json<Value> {
    let args = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(args) => args,
            Err(error) => {
                return Json(
                    ProvisioningError::InvalidOptions(format!("body is not JSON: {error}"))
                        .into_payload(),
                );
            }
        }
    };

    Json(surface.dispatch(&action, args).await)
}
