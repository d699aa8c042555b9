use std::time::{Duration, Instant};

use super::state::ProbeResult;
use crate::client::{HttpRequest, Method, RequestBody, Transport};

pub const DEFAULT_BODY_LIMIT: usize = 500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One request to issue
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeCall {
    pub name: String,
    pub method: Method,
    /// Path relative to the base URL, already substituted
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub bearer: Option<String>,
    pub timeout: Option<Duration>,
}

impl ProbeCall {
    pub fn new(name: &str, method: Method, path: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            bearer: None,
            timeout: None,
        }
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

/// The recorded result plus the untruncated body for callers that decode it
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub result: ProbeResult,
    /// None when no response arrived
    pub body: Option<String>,
}

/// Issues probes against one base URL
pub struct Prober<T: Transport> {
    transport: T,
    base_url: String,
    body_limit: usize,
    default_timeout: Duration,
}

impl<T: Transport> Prober<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
            default_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a probe. Never fails: HTTP errors and transport errors both end
    /// up in the returned `ProbeResult`.
    pub fn send(&self, call: &ProbeCall) -> ProbeOutcome {
        let mut request = HttpRequest::new(
            call.method,
            format!("{}{}", self.base_url, call.path),
            call.timeout.unwrap_or(self.default_timeout),
        );
        request.query = call.query.clone();
        request.body = call.body.clone();
        if let Some(token) = &call.bearer {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        log::debug!("-> {} {}", request.method, request.url);
        let started = Instant::now();

        match self.transport.execute(&request) {
            Ok(response) => {
                let duration_ms = response.elapsed.as_millis() as u64;
                log::debug!("<- {} {} ({}ms)", response.status, call.path, duration_ms);
                let result = ProbeResult::from_response(
                    &call.name,
                    &call.path,
                    call.method,
                    response.status,
                    &response.body,
                    self.body_limit,
                    duration_ms,
                );
                ProbeOutcome {
                    result,
                    body: Some(response.body),
                }
            }
            Err(err) => {
                log::debug!("<- {} {} failed: {}", call.method, call.path, err);
                let result = ProbeResult::from_error(
                    &call.name,
                    &call.path,
                    call.method,
                    &err.to_string(),
                    started.elapsed().as_millis() as u64,
                );
                ProbeOutcome { result, body: None }
            }
        }
    }
}
