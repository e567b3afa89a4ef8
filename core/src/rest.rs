//! Authenticated REST client bound to a fixed URI prefix.
//!
//! # Design
//! `PrefixedRestClient` mirrors the build/parse split of a host-does-IO
//! client: `build_request` and `parse_response` are pure, and
//! `authed_request` glues them around exactly one dispatcher call. The prefix
//! and every default option are fixed at construction, so two calls with the
//! same arguments always produce the same request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dispatch::RequestDispatcher;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Outcome of a successful `authed_request`.
///
/// Clients built with `only_data` always produce `Data`; the others keep the
/// status and headers next to the parsed body.
#[derive(Debug, Clone, PartialEq)]
pub enum RestResponse {
    Data(Value),
    Full {
        status: u16,
        headers: Vec<(String, String)>,
        data: Value,
    },
}

impl RestResponse {
    pub fn data(&self) -> &Value {
        match self {
            RestResponse::Data(data) | RestResponse::Full { data, .. } => data,
        }
    }

    pub fn into_data(self) -> Value {
        match self {
            RestResponse::Data(data) | RestResponse::Full { data, .. } => data,
        }
    }
}

#[derive(Clone)]
pub struct PrefixedRestClient {
    base_url: String,
    prefix: String,
    access_token: Option<String>,
    dispatcher: Arc<dyn RequestDispatcher>,
    timeout: Option<Duration>,
    query_params: BTreeMap<String, String>,
    use_authorization_header: bool,
    only_data: bool,
}

impl PrefixedRestClient {
    /// Bind `config` to `prefix`.
    ///
    /// Fails with [`ApiError::Configuration`] when `base_url` is missing or
    /// blank, or when no dispatcher is configured.
    pub fn new(config: ClientConfig, prefix: impl Into<String>, only_data: bool) -> Result<Self> {
        let base_url = config
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::Configuration("missing required option `base_url`".to_string()))?;
        let dispatcher = config
            .dispatcher
            .ok_or_else(|| ApiError::Configuration("missing required option `dispatcher`".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.into(),
            access_token: config.access_token,
            dispatcher,
            timeout: config.timeout,
            query_params: config.query_params,
            use_authorization_header: config.use_authorization_header,
            only_data,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build the request for `method` on `{base_url}{prefix}{path}`.
    ///
    /// `path` must already be encoded; query keys and values are encoded here.
    /// Configured query parameters override caller ones with the same key; a
    /// caller-supplied `access_token` is kept over the configured token.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<HttpRequest> {
        let mut params: Vec<(&str, &str)> = query
            .iter()
            .filter(|(key, _)| !self.query_params.contains_key(*key))
            .copied()
            .collect();
        params.extend(self.query_params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut headers = Vec::new();
        if let Some(token) = &self.access_token {
            if self.use_authorization_header {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            } else if !params.iter().any(|(key, _)| *key == "access_token") {
                params.push(("access_token", token.as_str()));
            }
        }

        let body = match body {
            Some(value) => {
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(serde_json::to_string(value).map_err(ApiError::Serialization)?)
            }
            None => None,
        };

        let mut url = format!("{}{}{}", self.base_url, self.prefix, path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&params));
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
            timeout: self.timeout,
        })
    }

    /// Map a response to data, or to `ApiError::Remote` on a non-2xx status.
    pub fn parse_response(&self, response: HttpResponse) -> Result<RestResponse> {
        if !response.is_success() {
            return Err(ApiError::Remote {
                status: response.status,
                body: response.body,
            });
        }

        let data = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).map_err(ApiError::Deserialization)?
        };

        if self.only_data {
            Ok(RestResponse::Data(data))
        } else {
            Ok(RestResponse::Full {
                status: response.status,
                headers: response.headers,
                data,
            })
        }
    }

    /// Issue one authenticated request and parse its response.
    pub fn authed_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<RestResponse> {
        let request = self.build_request(method, path, query, body)?;
        let target = request.path().to_string();
        debug!(%method, url = %target, "dispatching request");

        let response = self.dispatcher.dispatch(request).inspect_err(|e| {
            warn!(%method, url = %target, kind = %e.kind(), error = %e, "dispatch failed");
        })?;
        self.parse_response(response).inspect_err(|e| {
            if let ApiError::Remote { status, .. } = e {
                warn!(%method, url = %target, status, errcode = ?e.errcode(), "request rejected");
            }
        })
    }

    /// Like [`authed_request`](Self::authed_request), decoding the data into `T`.
    pub fn authed_data<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<T> {
        let data = self.authed_request(method, path, query, body)?.into_data();
        serde_json::from_value(data).map_err(ApiError::Deserialization)
    }
}

/// Percent-encode one path segment.
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
