use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// JOSE header fields relevant to key selection and algorithm checks.
///
/// `alg` is kept as the raw string so that `"none"` and unknown names reach
/// the validator's allow-list instead of failing as parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    pub alg: Option<String>,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// A structurally decoded credential whose signature has not been checked.
///
/// Nothing here is trustworthy. The only way to obtain a [`ClaimSet`](crate::ClaimSet)
/// is to pass this through [`ClaimValidator::validate`](crate::ClaimValidator::validate).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    raw: String,
    header: TokenHeader,
    algorithm: String,
    payload: Map<String, Value>,
}

impl DecodedToken {
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// The `alg` header value.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The `kid` header value, used to select the verification key.
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    /// The payload as sent by the caller. Not verified.
    pub fn unverified_claims(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }
}

/// Decode a bearer credential into its header and payload without verifying it.
///
/// The credential must have exactly three dot-separated segments. The header and
/// payload must be unpadded base64url JSON objects; the signature segment is only
/// checked for encoding, since `alg: none` tokens legitimately leave it empty and
/// must still reach the algorithm allow-list.
pub fn decode(token: &str) -> Result<DecodedToken, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments[..] else {
        return Err(DecodeError::SegmentCount(segments.len()));
    };

    let header_bytes = decode_segment(header_b64, "header")?;
    let payload_bytes = decode_segment(payload_b64, "payload")?;
    URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| DecodeError::Encoding("signature"))?;

    let header: TokenHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| DecodeError::Json("header", e.to_string()))?;
    let algorithm = header.alg.clone().ok_or(DecodeError::MissingAlgorithm)?;

    let payload = match serde_json::from_slice::<Value>(&payload_bytes)
        .map_err(|e| DecodeError::Json("payload", e.to_string()))?
    {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::Json(
                "payload",
                format!("expected object, found {}", json_kind(&other)),
            ))
        }
    };

    Ok(DecodedToken {
        raw: token.to_string(),
        header,
        algorithm,
        payload,
    })
}

fn decode_segment(segment: &str, name: &'static str) -> Result<Vec<u8>, DecodeError> {
    if segment.is_empty() {
        return Err(DecodeError::Encoding(name));
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| DecodeError::Encoding(name))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(value: &Value) -> String {
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn payload_must_be_object() {
        let token = format!(
            "{}.{}.",
            b64(&serde_json::json!({"alg": "HS256"})),
            b64(&serde_json::json!([1, 2]))
        );
        assert!(matches!(decode(&token), Err(DecodeError::Json("payload", _))));
    }

    #[test]
    fn header_without_alg_is_rejected() {
        let token = format!(
            "{}.{}.",
            b64(&serde_json::json!({"typ": "JWT"})),
            b64(&serde_json::json!({"sub": "x"}))
        );
        assert_eq!(decode(&token), Err(DecodeError::MissingAlgorithm));
    }

    #[test]
    fn empty_header_segment_is_encoding_error() {
        let token = format!(".{}.", b64(&serde_json::json!({"sub": "x"})));
        assert_eq!(decode(&token), Err(DecodeError::Encoding("header")));
    }

    #[test]
    fn padded_segments_are_rejected() {
        assert_eq!(decode("eyJ=.eyJ=.sig"), Err(DecodeError::Encoding("header")));
    }
}
