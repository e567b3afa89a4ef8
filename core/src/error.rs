//! Error types for the Watcha API clients.
//!
//! # Design
//! Callers match on the variant to tell a misconfigured client, a server that
//! answered with an error status, and a request that never got an answer
//! apart. `Remote` keeps the status and the body exactly as received; the
//! Matrix `errcode` is only read on demand through [`ApiError::errcode`].

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Classification of dispatch-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The configured request timeout elapsed.
    Timeout,
    /// Connection, DNS, TLS or I/O failure.
    Connection,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => f.write_str("timeout"),
            TransportErrorKind::Connection => f.write_str("connection"),
        }
    }
}

/// The dispatcher could not complete the round-trip.
#[derive(Error, Debug)]
#[error("transport error ({kind}): {source}")]
pub struct TransportError {
    kind: TransportErrorKind,
    source: Box<dyn StdError + Send + Sync>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn timeout(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(TransportErrorKind::Timeout, source)
    }

    pub fn connection(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::new(TransportErrorKind::Connection, source)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }
}

/// Errors returned by the Watcha and Nextcloud clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Required construction fields are missing or options failed to parse.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An identifier that must not be empty was empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status of a `Remote` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Matrix `errcode` carried in a `Remote` error body, e.g. `M_NOT_FOUND`.
    pub fn errcode(&self) -> Option<String> {
        let ApiError::Remote { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value.get("errcode")?.as_str().map(str::to_string)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
