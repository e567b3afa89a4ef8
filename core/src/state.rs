//! Matrix room state events.
//!
//! The Nextcloud wrapper does not own room state; it writes and reads it
//! through whatever `StateEventSender` the host client supplies.
//! `MatrixStateEvents` is the stock implementation over the client-server
//! API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::rest::{encode_segment, PrefixedRestClient};

/// URI path for the Matrix client-server API.
pub const PREFIX_R0: &str = "/_matrix/client/r0";

/// Acknowledgement of a state-event write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEventAck {
    pub event_id: String,
}

/// Write and read keyed room state.
///
/// A `state_key` of `None` addresses the event type's default slot, i.e. the
/// empty state key.
pub trait StateEventSender: Send + Sync {
    fn send_state_event(
        &self,
        room_id: &str,
        event_type: &str,
        content: &Value,
        state_key: Option<&str>,
    ) -> Result<StateEventAck>;

    fn state_event(&self, room_id: &str, event_type: &str, state_key: Option<&str>) -> Result<Value>;
}

/// `StateEventSender` backed by `/_matrix/client/r0/rooms/{roomId}/state`.
#[derive(Clone)]
pub struct MatrixStateEvents {
    http: PrefixedRestClient,
}

impl MatrixStateEvents {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: PrefixedRestClient::new(config, PREFIX_R0, true)?,
        })
    }
}

impl StateEventSender for MatrixStateEvents {
    fn send_state_event(
        &self,
        room_id: &str,
        event_type: &str,
        content: &Value,
        state_key: Option<&str>,
    ) -> Result<StateEventAck> {
        let path = state_path(room_id, event_type, state_key);
        self.http.authed_data(HttpMethod::Put, &path, &[], Some(content))
    }

    fn state_event(&self, room_id: &str, event_type: &str, state_key: Option<&str>) -> Result<Value> {
        let path = state_path(room_id, event_type, state_key);
        Ok(self.http.authed_request(HttpMethod::Get, &path, &[], None)?.into_data())
    }
}

fn state_path(room_id: &str, event_type: &str, state_key: Option<&str>) -> String {
    let mut path = format!(
        "/rooms/{}/state/{}",
        encode_segment(room_id),
        encode_segment(event_type)
    );
    if let Some(key) = state_key {
        path.push('/');
        path.push_str(&encode_segment(key));
    }
    path
}

pub(crate) fn require_room_id(room_id: &str) -> Result<()> {
    if room_id.is_empty() {
        return Err(ApiError::InvalidArgument("room id must not be empty".to_string()));
    }
    Ok(())
}
