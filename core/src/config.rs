//! Client configuration.
//!
//! `ClientOptions` is the serializable part (loadable from TOML);
//! `ClientConfig` adds the request dispatcher, which cannot come from a file.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::RequestDispatcher;
use crate::error::{ApiError, Result};

/// File-backed client options.
///
/// ```toml
/// base_url = "https://matrix.example.org"
/// access_token = "syt_..."
/// local_timeout_ms = 10000
/// use_authorization_header = true
///
/// [query_params]
/// user_id = "@bot:example.org"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Base URL of the homeserver client-server API.
    pub base_url: Option<String>,

    pub access_token: Option<String>,

    /// Per-request timeout. Absent means no client-side timeout.
    pub local_timeout_ms: Option<u64>,

    /// Extra query parameters appended to every request, e.g. `user_id` for
    /// application services.
    pub query_params: BTreeMap<String, String>,

    /// Send the token as `Authorization: Bearer` instead of `?access_token=`.
    pub use_authorization_header: bool,

    /// Initial partner-account flag.
    pub is_partner: Option<bool>,
}

impl ClientOptions {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ApiError::Configuration(e.to_string()))
    }
}

/// Everything a client needs at construction.
///
/// `base_url` and `dispatcher` are required; they are `Option`s so a missing
/// value is rejected by the client constructor instead of at first use.
#[derive(Clone, Default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub dispatcher: Option<Arc<dyn RequestDispatcher>>,
    pub timeout: Option<Duration>,
    pub query_params: BTreeMap<String, String>,
    pub use_authorization_header: bool,
    pub is_partner: Option<bool>,
}

impl ClientConfig {
    /// Shorthand for the two required fields.
    pub fn new(base_url: impl Into<String>, dispatcher: Arc<dyn RequestDispatcher>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            dispatcher: Some(dispatcher),
            ..Self::default()
        }
    }

    pub fn from_options(options: ClientOptions, dispatcher: Option<Arc<dyn RequestDispatcher>>) -> Self {
        Self {
            base_url: options.base_url,
            access_token: options.access_token,
            dispatcher,
            timeout: options.local_timeout_ms.map(Duration::from_millis),
            query_params: options.query_params,
            use_authorization_header: options.use_authorization_header,
            is_partner: options.is_partner,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn with_authorization_header(mut self, enabled: bool) -> Self {
        self.use_authorization_header = enabled;
        self
    }

    pub fn with_partner(mut self, is_partner: bool) -> Self {
        self.is_partner = Some(is_partner);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("dispatcher", &self.dispatcher.as_ref().map(|_| "<dispatcher>"))
            .field("timeout", &self.timeout)
            .field("query_params", &self.query_params)
            .field("use_authorization_header", &self.use_authorization_header)
            .field("is_partner", &self.is_partner)
            .finish()
    }
}
