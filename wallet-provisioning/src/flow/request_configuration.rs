use crate::{errors::provisioning_error::ProvisioningError, models::options::ProvisioningOptions};
use regex::Regex;
use std::sync::LazyLock;

static ACCOUNT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,4}$").expect("Account suffix pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionScheme {
    EccV2,
    RsaV2,
}

impl EncryptionScheme {
    pub fn parse(scheme: &str) -> Option<Self> {
        match scheme.trim().to_ascii_uppercase().as_str() {
            "ECC_V2" => Some(EncryptionScheme::EccV2),
            "RSA_V2" => Some(EncryptionScheme::RsaV2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionScheme::EccV2 => "ECC_V2",
            EncryptionScheme::RsaV2 => "RSA_V2",
        }
    }
}

/// What the flow needs to show the card and pick the encryption scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfiguration {
    pub encryption_scheme: EncryptionScheme,
    pub cardholder_name: Option<String>,
    pub primary_account_suffix: Option<String>,
    pub localized_description: Option<String>,
    pub payment_network: Option<String>,
}

impl RequestConfiguration {
    pub fn from_options(options: &ProvisioningOptions) -> Result<Self, ProvisioningError> {
        let encryption_scheme = EncryptionScheme::parse(&options.encryption_scheme).ok_or(
            ProvisioningError::CannotCreateRequestConfiguration(format!(
                "unsupported encryption scheme {}",
                options.encryption_scheme
            )),
        )?;

        if let Some(suffix) = &options.primary_account_suffix {
            if !ACCOUNT_SUFFIX.is_match(suffix) {
                return Err(ProvisioningError::CannotCreateRequestConfiguration(
                    "primaryAccountSuffix must be 1 to 4 digits".to_string(),
                ));
            }
        }

        if let Some(name) = &options.cardholder_name {
            if name.trim().is_empty() {
                return Err(ProvisioningError::CannotCreateRequestConfiguration(
                    "cardholderName is blank".to_string(),
                ));
            }
        }

        Ok(RequestConfiguration {
            encryption_scheme,
            cardholder_name: options.cardholder_name.clone(),
            primary_account_suffix: options.primary_account_suffix.clone(),
            localized_description: options.localized_description.clone(),
            payment_network: options.payment_network.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn configuration(value: serde_json::Value) -> Result<RequestConfiguration, ProvisioningError> {
        let options = ProvisioningOptions::from_value(&value, Duration::from_secs(25)).unwrap();
        RequestConfiguration::from_options(&options)
    }

    #[test]
    fn defaults_to_ecc_v2() {
        let configuration = configuration(json!({ "cardholderName": "Ada", "primaryAccountSuffix": "4242" })).unwrap();

        assert_eq!(configuration.encryption_scheme, EncryptionScheme::EccV2);
        assert_eq!(configuration.primary_account_suffix.as_deref(), Some("4242"));
    }

    #[test]
    fn accepts_rsa_v2_in_any_case() {
        let configuration = configuration(json!({ "encryptionScheme": "rsa_v2" })).unwrap();
        assert_eq!(configuration.encryption_scheme.as_str(), "RSA_V2");
    }

    #[test]
    fn rejects_malformed_configuration_parameters() {
        let cases = [
            json!({ "encryptionScheme": "ECC_V1" }),
            json!({ "primaryAccountSuffix": "42a2" }),
            json!({ "primaryAccountSuffix": "12345" }),
            json!({ "cardholderName": "   " }),
        ];

        for case in cases {
            let error = configuration(case.clone()).unwrap_err();
            assert_eq!(error.code(), "cannot_create_request_configuration", "{case}");
        }
    }
}
