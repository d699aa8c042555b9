//! In-memory transport answering from canned responses.
//!
//! Every executed request is kept so tests can assert on what was sent.

use std::cell::RefCell;
use std::time::Duration;

use reqwest::Url;

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::TransportError;

#[derive(Debug, Clone)]
enum Reply {
    Response { status: u16, body: String },
    Fail(TransportError),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    path: String,
    reply: Reply,
}

pub struct ScriptedTransport {
    routes: Vec<Route>,
    fallback: Reply,
    sent: RefCell<Vec<HttpRequest>>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedTransport {
    /// Unmatched requests answer 404.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: Reply::Response {
                status: 404,
                body: r#"{"success":false,"message":"not found"}"#.to_string(),
            },
            sent: RefCell::new(Vec::new()),
        }
    }

    pub fn route(mut self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            reply: Reply::Response {
                status,
                body: body.to_string(),
            },
        });
        self
    }

    pub fn fail(mut self, method: Method, path: &str, error: TransportError) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            reply: Reply::Fail(error),
        });
        self
    }

    pub fn fallback(mut self, status: u16, body: &str) -> Self {
        self.fallback = Reply::Response {
            status,
            body: body.to_string(),
        };
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.borrow_mut().push(request.clone());

        let path = url_path(&request.url);
        let reply = self
            .routes
            .iter()
            .find(|r| r.method == request.method && r.path == path)
            .map(|r| &r.reply)
            .unwrap_or(&self.fallback);

        match reply {
            Reply::Response { status, body } => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
                elapsed: Duration::from_millis(1),
            }),
            Reply::Fail(err) => Err(err.clone()),
        }
    }
}

/// Path component of an absolute URL, without query string.
fn url_path(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split('?').next().unwrap_or(url).to_string())
}
