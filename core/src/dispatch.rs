//! The request-issuing capability the clients are built on.
//!
//! # Design
//! A dispatcher executes one `HttpRequest` and hands back the `HttpResponse`
//! untouched, whatever its status. Deciding what a 404 means is the client's
//! job; the dispatcher only fails when no response was obtained at all.
//! Closures implement the trait, so tests and host applications can plug in
//! their own transport without a wrapper type.

use std::io;

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes HTTP requests on behalf of a client.
pub trait RequestDispatcher: Send + Sync {
    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> RequestDispatcher for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking dispatcher backed by a `ureq` agent.
///
/// The agent is configured to return 4xx/5xx responses as data. The request's
/// `timeout`, when set, bounds the whole round-trip.
#[derive(Debug, Clone)]
pub struct UreqDispatcher {
    agent: ureq::Agent,
}

impl UreqDispatcher {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDispatcher for UreqDispatcher {
    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_options(self.agent.get(url), &request).call(),
            (HttpMethod::Delete, _) => with_options(self.agent.delete(url), &request).call(),
            (HttpMethod::Post, Some(body)) => {
                with_options(self.agent.post(url), &request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_options(self.agent.post(url), &request).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_options(self.agent.put(url), &request).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_options(self.agent.put(url), &request).send_empty(),
        };

        let mut response = result.map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_options<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = request.timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

fn classify(error: ureq::Error) -> TransportError {
    let kind = match &error {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
        _ => TransportErrorKind::Connection,
    };
    TransportError::new(kind, error)
}
