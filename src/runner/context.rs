use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").expect("placeholder pattern"))
}

/// Variables visible to step templates during one run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Variables set by the harness (phone, token, user_id) or saved from responses
    pub vars: HashMap<String, String>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a variable from vars or the process environment
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.get_var(name).is_some()
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    /// Substitute ${varname} or ${varname.json.path} patterns in a string.
    /// Unknown placeholders are left as they are.
    pub fn substitute(&self, text: &str) -> String {
        placeholder()
            .replace_all(text, |caps: &regex::Captures| {
                let full_key = &caps[1];

                if let Some(val) = self.get_var(full_key) {
                    return val;
                }

                match full_key {
                    "time" => return chrono::Local::now().format("%H:%M:%S").to_string(),
                    "date" => return chrono::Local::now().format("%Y-%m-%d").to_string(),
                    "timestamp" => return chrono::Utc::now().timestamp().to_string(),
                    _ => {}
                }

                // ${var.a.b} reads into a variable holding JSON
                if let Some((var_name, json_path)) = full_key.split_once('.') {
                    if let Some(json_str) = self.get_var(var_name) {
                        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&json_str) {
                            if let Some(target) = lookup(&value, json_path) {
                                return value_to_string(target);
                            }
                        }
                    }
                }

                format!("${{{}}}", full_key)
            })
            .to_string()
    }

    /// Substitute placeholders in every string inside a JSON value
    pub fn substitute_json(&self, value: &serde_json::Value) -> serde_json::Value {
        use serde_json::Value;
        match value {
            Value::String(s) => Value::String(self.substitute(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.substitute_json(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute_json(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn substitute_pairs(&self, pairs: &[(String, String)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.clone(), self.substitute(v)))
            .collect()
    }

    /// Store values from a JSON response body into variables.
    /// Returns the variable names whose path was not found.
    pub fn capture(&mut self, save: &BTreeMap<String, String>, body: &str) -> Vec<String> {
        if save.is_empty() {
            return Vec::new();
        }

        let json: serde_json::Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) => return save.keys().cloned().collect(),
        };

        let mut missing = Vec::new();
        for (var_name, path) in save {
            let found = if path == "$" || path == "." {
                Some(json.to_string())
            } else {
                lookup(&json, path).map(value_to_string)
            };

            match found {
                Some(val) => self.set_var(var_name, &val),
                None => missing.push(var_name.clone()),
            }
        }
        missing
    }
}

/// Resolve a dotted path ("data.orderId") or JSON pointer ("/data/orderId")
pub fn lookup<'a>(json: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    let pointer = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path.replace('.', "/"))
    };

    json.pointer(&pointer)
        .or_else(|| json.get(path))
        .filter(|v| !v.is_null())
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitute_known_and_unknown() {
        let mut ctx = RunContext::new();
        ctx.set_var("user_id", "42");

        assert_eq!(ctx.substitute("/api/users/profile/${user_id}"), "/api/users/profile/42");
        assert_eq!(
            ctx.substitute("/api/x/${lumi_probe_surely_unset_var}"),
            "/api/x/${lumi_probe_surely_unset_var}"
        );
    }

    #[test]
    fn test_substitute_json_path_into_var() {
        let mut ctx = RunContext::new();
        ctx.set_var("order", r#"{"data":{"orderId":"R-1"}}"#);
        assert_eq!(ctx.substitute("${order.data.orderId}"), "R-1");
    }

    #[test]
    fn test_substitute_json_body() {
        let mut ctx = RunContext::new();
        ctx.set_var("phone", "13800138000");
        let body = json!({"phone": "${phone}", "amount": 6.0, "tags": ["${phone}"]});
        assert_eq!(
            ctx.substitute_json(&body),
            json!({"phone": "13800138000", "amount": 6.0, "tags": ["13800138000"]})
        );
    }

    #[test]
    fn test_capture() {
        let mut ctx = RunContext::new();
        let mut save = BTreeMap::new();
        save.insert("order_id".to_string(), "data.orderId".to_string());
        save.insert("coins".to_string(), "/data/coins".to_string());
        save.insert("missing".to_string(), "data.nope".to_string());

        let missing = ctx.capture(&save, r#"{"success":true,"data":{"orderId":"R-9","coins":60}}"#);

        assert_eq!(ctx.get_var("order_id").as_deref(), Some("R-9"));
        assert_eq!(ctx.get_var("coins").as_deref(), Some("60"));
        assert_eq!(missing, vec!["missing".to_string()]);
    }

    #[test]
    fn test_capture_non_json_reports_all_missing() {
        let mut ctx = RunContext::new();
        let mut save = BTreeMap::new();
        save.insert("a".to_string(), "data".to_string());
        assert_eq!(ctx.capture(&save, "<html>"), vec!["a".to_string()]);
    }
}
