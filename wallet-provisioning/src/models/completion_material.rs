use crate::errors::material_error::MaterialError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;

/// Completion material as it travels over the wire, base64 text per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCompletionMaterial {
    pub activation_data: Option<String>,
    pub encrypted_pass_data: Option<String>,
    pub ephemeral_public_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionMaterial {
    pub activation_data: Vec<u8>,
    pub encrypted_pass_data: Vec<u8>,
    pub ephemeral_public_key: Vec<u8>,
}

impl TryFrom<EncodedCompletionMaterial> for CompletionMaterial {
    type Error = MaterialError;

    fn try_from(encoded: EncodedCompletionMaterial) -> Result<Self, Self::Error> {
        Ok(CompletionMaterial {
            activation_data: decode_field("activationData", encoded.activation_data)?,
            encrypted_pass_data: decode_field("encryptedPassData", encoded.encrypted_pass_data)?,
            ephemeral_public_key: decode_field(
                "ephemeralPublicKey",
                encoded.ephemeral_public_key,
            )?,
        })
    }
}

fn decode_field(name: &'static str, value: Option<String>) -> Result<Vec<u8>, MaterialError> {
    let value = value.ok_or(MaterialError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(MaterialError::Empty(name));
    }

    let bytes = STANDARD
        .decode(value)
        .or(Err(MaterialError::NotBase64(name)))?;

    if bytes.is_empty() {
        return Err(MaterialError::Empty(name));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(activation: Option<&str>, pass: Option<&str>, key: Option<&str>) -> EncodedCompletionMaterial {
        EncodedCompletionMaterial {
            activation_data: activation.map(str::to_string),
            encrypted_pass_data: pass.map(str::to_string),
            ephemeral_public_key: key.map(str::to_string),
        }
    }

    #[test]
    fn decodes_all_three_fields() {
        let material =
            CompletionMaterial::try_from(encoded(Some("YWN0"), Some("cGFzcw=="), Some("a2V5"))).unwrap();

        assert_eq!(material.activation_data, b"act");
        assert_eq!(material.encrypted_pass_data, b"pass");
        assert_eq!(material.ephemeral_public_key, b"key");
    }

    #[test]
    fn missing_field_is_named() {
        let error = CompletionMaterial::try_from(encoded(Some("YWN0"), Some("cGFzcw=="), None)).unwrap_err();
        assert_eq!(error, MaterialError::Missing("ephemeralPublicKey"));
    }

    #[test]
    fn rejects_empty_and_undecodable_fields() {
        let error = CompletionMaterial::try_from(encoded(Some(""), Some("cGFzcw=="), Some("a2V5"))).unwrap_err();
        assert_eq!(error, MaterialError::Empty("activationData"));

        let error =
            CompletionMaterial::try_from(encoded(Some("YWN0"), Some("not base64!"), Some("a2V5"))).unwrap_err();
        assert_eq!(error, MaterialError::NotBase64("encryptedPassData"));
    }
}
