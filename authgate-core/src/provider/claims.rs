//! Claim extraction helpers shared by the adapters

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_json::Value;

use super::CustomClaims;
use crate::{Error, Result};

/// JWT segments are unpadded base64url, but some issuers pad them anyway.
const JWT_SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the payload of a JWT issued by the provider.
///
/// The token was received directly from the provider's token endpoint over
/// TLS, so the signature is not re-verified here.
pub fn decode_jwt_claims(token: &str) -> Result<Value> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => return Err(Error::UserInfo("token is not a JWT".to_string())),
    };

    let bytes = JWT_SEGMENT
        .decode(payload)
        .map_err(|e| Error::UserInfo(format!("Invalid JWT payload encoding: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::UserInfo(format!("Invalid JWT payload: {e}")))
}

/// Copy the configured claims out of a user-info document.
///
/// Names that are absent from the document are skipped.
#[must_use]
pub fn map_claims(raw: &Value, names: &[String]) -> CustomClaims {
    let mut custom = CustomClaims::default();
    let Some(object) = raw.as_object() else {
        return custom;
    };

    for name in names {
        if let Some(value) = object.get(name) {
            custom.claims.insert(name.clone(), value.clone());
        }
    }
    custom
}

/// First non-empty string among `keys` in `raw`.
#[must_use]
pub fn first_string(raw: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}
