use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "lumi-probe.yaml";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Target used when neither a URL nor a server preset is given
    pub base_url: String,

    /// Per-request timeout (ms)
    pub timeout_ms: u64,

    /// Characters of each response body kept in the report
    pub body_limit: usize,

    pub output_dir: PathBuf,

    pub report_file: String,

    /// Named targets for `--server`
    pub servers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert("local".to_string(), "http://localhost:8080".to_string());

        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 10_000,
            body_limit: 500,
            output_dir: PathBuf::from("."),
            report_file: "probe_report.json".to_string(),
            servers,
        }
    }
}

impl Config {
    /// Defaults, then the config file, then `PROBE_*` environment variables.
    /// CLI flags are applied afterwards by the caller.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        // Presets from the file extend the built-in ones
        for (name, url) in Self::default().servers {
            config.servers.entry(name).or_insert(url);
        }

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("PROBE_BASE_URL") {
            self.base_url = url;
        }
        try_load(&lookup, "PROBE_TIMEOUT_MS", &mut self.timeout_ms);
        try_load(&lookup, "PROBE_BODY_LIMIT", &mut self.body_limit);
        if let Some(dir) = lookup("PROBE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    /// Resolve the target: explicit URL, then server preset, then `base_url`
    pub fn resolve_base_url(&self, url: Option<&str>, server: Option<&str>) -> Result<String> {
        if let Some(url) = url {
            return Ok(url.to_string());
        }
        if let Some(name) = server {
            return self.servers.get(name).cloned().with_context(|| {
                let known: Vec<&str> = self.servers.keys().map(String::as_str).collect();
                format!("Unknown server '{}'. Known: {}", name, known.join(", "))
            });
        }
        Ok(self.base_url.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn try_load<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(e) => warn!("Invalid {key} value '{raw}': {e}, keeping current setting"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env(env(&[
            ("PROBE_BASE_URL", "http://staging:9000"),
            ("PROBE_TIMEOUT_MS", "2500"),
            ("PROBE_OUTPUT_DIR", "/tmp/out"),
        ]));

        assert_eq!(config.base_url, "http://staging:9000");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.body_limit, 500);
    }

    #[test]
    fn test_invalid_env_value_is_ignored() {
        let config = Config::default().with_env(env(&[("PROBE_BODY_LIMIT", "lots")]));
        assert_eq!(config.body_limit, 500);
    }

    #[test]
    fn test_file_merges_server_presets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumi-probe.yaml");
        std::fs::write(
            &path,
            "timeoutMs: 3000\nservers:\n  prod: https://api.example.com\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.timeout_ms, 3000);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.servers["prod"], "https://api.example.com");
        assert_eq!(config.servers["local"], "http://localhost:8080");
    }

    #[test]
    fn test_resolve_base_url() {
        let config = Config::default();

        assert_eq!(
            config.resolve_base_url(Some("http://x"), Some("local")).unwrap(),
            "http://x"
        );
        assert_eq!(
            config.resolve_base_url(None, Some("local")).unwrap(),
            "http://localhost:8080"
        );
        assert!(config.resolve_base_url(None, Some("nope")).is_err());
        assert_eq!(config.resolve_base_url(None, None).unwrap(), config.base_url);
    }
}
