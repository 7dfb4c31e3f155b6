use super::options::ProvisioningOptions;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub platform_version: String,
    pub model: String,
}

/// Material the secure element hands out when it needs activation data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub certificates: Vec<Vec<u8>>,
    pub nonce: Vec<u8>,
    pub nonce_signature: Vec<u8>,
    pub device: DeviceInfo,
}

/// JSON body posted to the merchant backend, also published for external completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last4: Option<String>,
    pub certificates: Vec<String>,
    pub nonce: String,
    pub nonce_signature: String,
    pub device: DeviceInfo,
}

impl ChallengePayload {
    pub fn new(session_id: &str, options: &ProvisioningOptions, challenge: &Challenge) -> Self {
        ChallengePayload {
            session_id: session_id.to_string(),
            card_id: options.card_id.clone(),
            holder_name: options.cardholder_name.clone(),
            last4: options.primary_account_suffix.clone(),
            certificates: challenge
                .certificates
                .iter()
                .map(|certificate| STANDARD.encode(certificate))
                .collect(),
            nonce: STANDARD.encode(&challenge.nonce),
            nonce_signature: STANDARD.encode(&challenge.nonce_signature),
            device: challenge.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn payload_encodes_challenge_and_correlation_fields() {
        let options = ProvisioningOptions::from_value(
            &json!({ "cardId": "card-1", "cardholderName": "Ada Lovelace", "primaryAccountSuffix": "4242" }),
            Duration::from_secs(25),
        )
        .unwrap();

        let challenge = Challenge {
            certificates: vec![b"leaf".to_vec(), b"intermediate".to_vec()],
            nonce: vec![1, 2, 3],
            nonce_signature: vec![4, 5, 6],
            device: DeviceInfo {
                platform_version: "17.4".to_string(),
                model: "iPhone".to_string(),
            },
        };

        let payload = serde_json::to_value(ChallengePayload::new("s1", &options, &challenge)).unwrap();

        assert_eq!(
            payload,
            json!({
                "sessionId": "s1",
                "cardId": "card-1",
                "holderName": "Ada Lovelace",
                "last4": "4242",
                "certificates": ["bGVhZg==", "aW50ZXJtZWRpYXRl"],
                "nonce": "AQID",
                "nonceSignature": "BAUG",
                "device": { "platformVersion": "17.4", "model": "iPhone" }
            })
        );
    }

    #[test]
    fn payload_omits_absent_correlation_fields() {
        let options = ProvisioningOptions::from_value(&json!({}), Duration::from_secs(25)).unwrap();
        let challenge = Challenge {
            certificates: vec![],
            nonce: vec![0],
            nonce_signature: vec![0],
            device: DeviceInfo {
                platform_version: "17.4".to_string(),
                model: "iPhone".to_string(),
            },
        };

        let payload = serde_json::to_value(ChallengePayload::new("s1", &options, &challenge)).unwrap();
        assert!(payload.get("cardId").is_none());
        assert!(payload.get("last4").is_none());
    }
}
