use crate::errors::provisioning_error::ProvisioningError;
use reqwest::{
    Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, time::Duration};

pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 25_000;
pub const DEFAULT_ENCRYPTION_SCHEME: &str = "ECC_V2";

/// Completion path of a session, fixed when the session is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "A")]
    Backend,
    #[serde(rename = "B")]
    External,
}

impl Mode {
    pub fn from_backend_url(backend_url: Option<&Url>) -> Self {
        match backend_url {
            Some(_) => Mode::Backend,
            None => Mode::External,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawOptions {
    cardholder_name: Option<String>,
    primary_account_suffix: Option<String>,
    localized_description: Option<String>,
    encryption_scheme: Option<String>,
    payment_network: Option<String>,
    card_id: Option<Value>,
    backend_url: Option<String>,
    backend_headers: Option<HashMap<String, String>>,
    backend_timeout_ms: Option<u64>,
    debug: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ProvisioningOptions {
    pub cardholder_name: Option<String>,
    pub primary_account_suffix: Option<String>,
    pub localized_description: Option<String>,
    pub encryption_scheme: String,
    pub payment_network: Option<String>,
    pub card_id: Option<String>,
    pub backend_url: Option<Url>,
    pub backend_headers: HeaderMap,
    pub backend_timeout: Duration,
    pub debug: bool,
}

impl ProvisioningOptions {
    /// Parses the options object of a start command. `null` counts as `{}`.
    pub fn from_value(
        value: &Value,
        default_backend_timeout: Duration,
    ) -> Result<Self, ProvisioningError> {
        let raw = match value {
            Value::Null => RawOptions::default(),
            Value::Object(_) => RawOptions::deserialize(value)
                .map_err(|error| ProvisioningError::InvalidOptions(error.to_string()))?,
            _ => {
                return Err(ProvisioningError::InvalidOptions(
                    "options must be an object".to_string(),
                ));
            }
        };

        let card_id = match raw.card_id {
            None | Some(Value::Null) => None,
            Some(Value::String(card_id)) => Some(card_id),
            Some(Value::Number(card_id)) => Some(card_id.to_string()),
            Some(_) => {
                return Err(ProvisioningError::InvalidOptions(
                    "cardId must be a string or a number".to_string(),
                ));
            }
        };

        let backend_url = match raw.backend_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(url) => Some(parse_backend_url(url)?),
        };

        let backend_timeout = match raw.backend_timeout_ms {
            None => default_backend_timeout,
            Some(0) => {
                return Err(ProvisioningError::InvalidOptions(
                    "backendTimeoutMs must be positive".to_string(),
                ));
            }
            Some(milliseconds) => Duration::from_millis(milliseconds),
        };

        Ok(ProvisioningOptions {
            cardholder_name: raw.cardholder_name,
            primary_account_suffix: raw.primary_account_suffix,
            localized_description: raw.localized_description,
            encryption_scheme: raw
                .encryption_scheme
                .unwrap_or_else(|| DEFAULT_ENCRYPTION_SCHEME.to_string()),
            payment_network: raw.payment_network,
            card_id,
            backend_url,
            backend_headers: parse_headers(raw.backend_headers.unwrap_or_default())?,
            backend_timeout,
            debug: raw.debug.unwrap_or(false),
        })
    }

    pub fn mode(&self) -> Mode {
        Mode::from_backend_url(self.backend_url.as_ref())
    }
}

fn parse_backend_url(url: &str) -> Result<Url, ProvisioningError> {
    let parsed = Url::parse(url).or(Err(ProvisioningError::InvalidOptions(format!(
        "backendUrl is not a valid URL: {url}"
    ))))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ProvisioningError::InvalidOptions(format!(
            "backendUrl scheme {scheme} is not supported"
        ))),
    }
}

fn parse_headers(headers: HashMap<String, String>) -> Result<HeaderMap, ProvisioningError> {
    let mut header_map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).or(Err(
            ProvisioningError::InvalidOptions(format!("invalid backend header name {name}")),
        ))?;

        let header_value = HeaderValue::from_str(&value).or(Err(
            ProvisioningError::InvalidOptions(format!("invalid value for backend header {name}")),
        ))?;

        header_map.insert(header_name, header_value);
    }

    Ok(header_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<ProvisioningOptions, ProvisioningError> {
        ProvisioningOptions::from_value(&value, Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS))
    }

    #[test]
    fn null_options_select_external_mode() {
        let options = parse(Value::Null).unwrap();

        assert_eq!(options.mode(), Mode::External);
        assert_eq!(options.encryption_scheme, DEFAULT_ENCRYPTION_SCHEME);
        assert_eq!(options.backend_timeout, Duration::from_millis(25_000));
        assert!(!options.debug);
    }

    #[test]
    fn blank_backend_url_selects_external_mode() {
        let options = parse(json!({ "backendUrl": "  " })).unwrap();
        assert_eq!(options.mode(), Mode::External);
        assert!(options.backend_url.is_none());
    }

    #[test]
    fn backend_url_selects_backend_mode() {
        let options = parse(json!({
            "backendUrl": "https://merchant.example/provision",
            "backendHeaders": { "Authorization": "Bearer abc" },
            "backendTimeoutMs": 1500,
            "cardId": 42,
            "debug": true
        }))
        .unwrap();

        assert_eq!(options.mode(), Mode::Backend);
        assert_eq!(options.backend_timeout, Duration::from_millis(1500));
        assert_eq!(options.card_id.as_deref(), Some("42"));
        assert_eq!(options.backend_headers["authorization"], "Bearer abc");
        assert!(options.debug);
    }

    #[test]
    fn rejects_malformed_options() {
        let cases = [
            json!("not an object"),
            json!({ "cardholderName": 7 }),
            json!({ "backendUrl": "ftp://merchant.example" }),
            json!({ "backendUrl": "not a url" }),
            json!({ "backendTimeoutMs": 0 }),
            json!({ "backendHeaders": { "bad header": "x" } }),
            json!({ "cardId": ["nested"] }),
        ];

        for case in cases {
            let error = parse(case.clone()).unwrap_err();
            assert_eq!(error.code(), "invalid_options", "{case}");
        }
    }
}
