//! Bearer token inspection. Claims are decoded without signature verification;
//! this is for eyeballing what the backend issued, not for trusting it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::JwtError;

#[derive(Debug, Clone, PartialEq)]
pub struct JwtClaims {
    pub claims: Map<String, Value>,
}

impl JwtClaims {
    pub fn subject(&self) -> Option<String> {
        match self.claims.get("sub")? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("iat")
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("exp")
    }

    /// Tokens without `exp` never expire
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map_or(false, |exp| exp <= now)
    }

    fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        let secs = self.claims.get(key)?.as_i64()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

pub fn decode_claims(token: &str) -> Result<JwtClaims, JwtError> {
    let token = token.trim();
    let token = token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("bearer "))
        .unwrap_or(token);

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(JwtError::Segments(parts.len()));
    }

    let payload = parts[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| JwtError::Base64(e.to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(claims)) => Ok(JwtClaims { claims }),
        Ok(other) => Err(JwtError::Json(format!("expected object, got {}", other))),
        Err(e) => Err(JwtError::Json(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn test_decode_claims() {
        let token = make_token(r#"{"sub":"13800138000","userId":7,"iat":1700000000,"exp":1700086400}"#);
        let claims = decode_claims(&token).unwrap();

        assert_eq!(claims.subject().as_deref(), Some("13800138000"));
        assert_eq!(claims.claims.get("userId"), Some(&Value::from(7)));
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1700086400);
        assert!(claims.is_expired_at(Utc.timestamp_opt(1700086400, 0).unwrap()));
        assert!(!claims.is_expired_at(Utc.timestamp_opt(1700000001, 0).unwrap()));
    }

    #[test]
    fn test_padded_and_prefixed_token() {
        let token = make_token(r#"{"sub":"a"}"#);
        let (header, rest) = token.split_once('.').unwrap();
        let (payload, sig) = rest.split_once('.').unwrap();
        let padded = format!("Bearer {}.{}==.{}", header, payload, sig);
        assert_eq!(decode_claims(&padded).unwrap().subject().as_deref(), Some("a"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(decode_claims("invalid.token"), Err(JwtError::Segments(2)));
        assert!(matches!(decode_claims("a.!!!.c"), Err(JwtError::Base64(_))));
        let not_object = make_token("[1,2]");
        assert!(matches!(decode_claims(&not_object), Err(JwtError::Json(_))));
    }
}
