//! Blocking reqwest implementation of [`Transport`].

use std::time::Instant;

use reqwest::blocking::Client;

use super::{HttpRequest, HttpResponse, Method, RequestBody, Transport};
use crate::error::TransportError;

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("lumi-probe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Request(err.to_string()))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(map_method(request.method), &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Form(fields)) => builder.form(fields),
            None => builder,
        };

        let started = Instant::now();
        let response = builder
            .send()
            .map_err(|err| classify(err, request))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|err| classify(err, request))?;

        Ok(HttpResponse {
            status,
            body,
            elapsed: started.elapsed(),
        })
    }
}

fn map_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(err: reqwest::Error, request: &HttpRequest) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(request.timeout)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}
