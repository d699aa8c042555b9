use crate::client::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SEND_CODE_PATH: &str = "/api/auth/send-code";
pub const DEFAULT_LOGIN_PATH: &str = "/api/auth/login-with-code";

/// A parsed probe suite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Overrides the configured base URL unless one is given on the command line
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default, alias = "defaultTimeout")]
    pub default_timeout_ms: Option<u64>,

    /// Steps sent before login, without a token
    #[serde(default)]
    pub public: Vec<StepSpec>,

    #[serde(default)]
    pub login: Option<LoginSpec>,

    /// Steps sent after a successful login
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

impl Suite {
    /// Copy of the suite keeping only steps that carry every tag in `tags`.
    /// An empty filter keeps everything.
    pub fn select(&self, tags: &[String]) -> Suite {
        if tags.is_empty() {
            return self.clone();
        }
        let keep = |s: &&StepSpec| tags.iter().all(|t| s.tags.contains(t));
        Suite {
            public: self.public.iter().filter(keep).cloned().collect(),
            steps: self.steps.iter().filter(keep).cloned().collect(),
            ..self.clone()
        }
    }

    /// Login is only attempted when there is something to authenticate for
    pub fn needs_login(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn step_count(&self) -> usize {
        self.public.len() + self.steps.len()
    }
}

/// Phone/code login configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginSpec {
    pub phone: String,

    /// Used only when the send-code response carries no code
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default = "default_send_code_path")]
    pub send_code_path: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Extra query parameters for the login call (e.g. gender)
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,

    #[serde(default, alias = "timeout")]
    pub timeout_ms: Option<u64>,
}

impl LoginSpec {
    pub fn new(phone: &str) -> Self {
        Self {
            phone: phone.to_string(),
            code: None,
            send_code_path: default_send_code_path(),
            login_path: default_login_path(),
            params: BTreeMap::new(),
            timeout_ms: None,
        }
    }

    pub fn param_pairs(&self) -> Vec<(String, String)> {
        scalar_pairs(&self.params)
    }
}

fn default_send_code_path() -> String {
    DEFAULT_SEND_CODE_PATH.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

/// A single request in a suite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    pub name: String,

    #[serde(default)]
    pub method: Method,

    pub path: String,

    #[serde(default)]
    pub query: BTreeMap<String, serde_json::Value>,

    /// JSON body
    #[serde(default)]
    pub body: Option<serde_json::Value>,

    /// Form-encoded body, takes precedence over `body`
    #[serde(default)]
    pub form: Option<BTreeMap<String, serde_json::Value>>,

    /// Send the bearer token (authenticated steps only, default true)
    #[serde(default)]
    pub auth: Option<bool>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, alias = "timeout")]
    pub timeout_ms: Option<u64>,

    /// variable name -> JSON path in the response
    #[serde(default)]
    pub save: BTreeMap<String, String>,

    /// Variables that must be set, otherwise the step is skipped
    #[serde(default)]
    pub requires: Vec<String>,
}

impl StepSpec {
    pub fn new(name: &str, method: Method, path: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            query: BTreeMap::new(),
            body: None,
            form: None,
            auth: None,
            tags: Vec::new(),
            timeout_ms: None,
            save: BTreeMap::new(),
            requires: Vec::new(),
        }
    }

    pub fn sends_auth(&self) -> bool {
        self.auth.unwrap_or(true)
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        scalar_pairs(&self.query)
    }

    pub fn form_pairs(&self) -> Option<Vec<(String, String)>> {
        self.form.as_ref().map(scalar_pairs)
    }
}

/// Render YAML scalars (strings, numbers, bools) as query/form strings
fn scalar_pairs(map: &BTreeMap<String, serde_json::Value>) -> Vec<(String, String)> {
    map.iter()
        .map(|(k, v)| {
            let s = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (k.clone(), s)
        })
        .collect()
}
