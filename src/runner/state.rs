use crate::auth::Credential;
use crate::client::Method;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Outcome of one HTTP call. Built once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub name: String,
    pub endpoint: String,
    pub method: Method,
    /// 0 when no response was received
    pub status_code: u16,
    pub success: bool,
    pub response: String,
    pub error: Option<String>,
    pub timestamp: String,
    pub duration_ms: u64,
}

/// 2xx, nothing else
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// How a failed probe is bucketed in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Unauthorized,
    ServerError,
    Other,
}

impl ProbeResult {
    pub fn from_response(
        name: &str,
        endpoint: &str,
        method: Method,
        status_code: u16,
        body: &str,
        body_limit: usize,
        duration_ms: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            method,
            status_code,
            success: is_success(status_code),
            response: truncate(body, body_limit),
            error: None,
            timestamp: chrono::Local::now().to_rfc3339(),
            duration_ms,
        }
    }

    pub fn from_error(
        name: &str,
        endpoint: &str,
        method: Method,
        error: &str,
        duration_ms: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            method,
            status_code: 0,
            success: false,
            response: String::new(),
            error: Some(error.to_string()),
            timestamp: chrono::Local::now().to_rfc3339(),
            duration_ms,
        }
    }

    pub fn failure_class(&self) -> Option<FailureClass> {
        if self.success {
            return None;
        }
        Some(match self.status_code {
            401 => FailureClass::Unauthorized,
            500 => FailureClass::ServerError,
            _ => FailureClass::Other,
        })
    }
}

/// Cut `text` to at most `limit` characters.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// A selected step that was never sent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedProbe {
    pub name: String,
    pub endpoint: String,
    pub method: Method,
    pub reason: String,
}

/// Harness lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum HarnessState {
    Init,
    Authenticated(Credential),
    Done,
}

impl HarnessState {
    pub fn name(&self) -> &'static str {
        match self {
            HarnessState::Init => "init",
            HarnessState::Authenticated(_) => "authenticated",
            HarnessState::Done => "done",
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            HarnessState::Authenticated(c) => Some(c),
            _ => None,
        }
    }
}

/// Everything recorded while a run is in progress
#[derive(Debug, Clone)]
pub struct ProbeSession {
    pub run_id: String,
    pub suite_name: String,
    pub base_url: String,
    pub results: Vec<ProbeResult>,
    pub skipped: Vec<SkippedProbe>,
    pub auth_error: Option<String>,
    pub started_at: String,
    started: Instant,
}

impl ProbeSession {
    pub fn new(run_id: &str, suite_name: &str, base_url: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            suite_name: suite_name.to_string(),
            base_url: base_url.to_string(),
            results: Vec::new(),
            skipped: Vec::new(),
            auth_error: None,
            started_at: chrono::Local::now().to_rfc3339(),
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, result: ProbeResult) {
        self.results.push(result);
    }

    pub fn skip(&mut self, name: &str, endpoint: &str, method: Method, reason: &str) {
        self.skipped.push(SkippedProbe {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            method,
            reason: reason.to_string(),
        });
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
