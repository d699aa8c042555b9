//! Typed view of the backend's `{success, message, data}` response wrapper.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    pub data: Option<T>,
}

impl<T: serde::de::DeserializeOwned> ApiEnvelope<T> {
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// `data` of the login-with-code response
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct LoginData {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct UserRef {
    /// Numeric or string depending on the backend
    #[serde(default)]
    pub id: Option<Value>,
}

impl UserRef {
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
