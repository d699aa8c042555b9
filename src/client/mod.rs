//! HTTP transport seam.
//!
//! The harness only talks to the network through [`Transport`], so the probe
//! logic can be driven by the blocking reqwest client in real runs and by a
//! [`ScriptedTransport`] in tests.

pub mod reqwest_transport;
pub mod scripted;
pub mod types;

pub use reqwest_transport::ReqwestTransport;
pub use scripted::ScriptedTransport;
pub use types::*;

use crate::error::TransportError;

/// Blocking HTTP transport
pub trait Transport {
    /// Execute a request. Any status code is an `Ok`; only failures that
    /// prevent a response (refused connection, timeout, DNS) are errors.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}
