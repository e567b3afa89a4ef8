//! Wrappers for the Watcha APIs.
//!
//! # Design
//! `WatchaApi` owns a `NextcloudApi` rather than extending it, and keeps the
//! partner-account flag as a plain field. The flag is local to this value:
//! nothing persists it and no request reads or writes it.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::nextcloud::NextcloudApi;
use crate::state::{MatrixStateEvents, StateEventSender};

/// URI path for the Watcha API.
pub const PREFIX_WATCHA: &str = "/_watcha";

#[derive(Clone)]
pub struct WatchaApi {
    nextcloud: NextcloudApi,
    is_partner: Option<bool>,
}

impl WatchaApi {
    /// Build the wrappers, writing room state through the Matrix
    /// client-server API with the same configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let state = MatrixStateEvents::new(config.clone())?;
        Self::with_state_events(config, Arc::new(state))
    }

    /// Build the wrappers on top of the host client's state-event capability.
    pub fn with_state_events(config: ClientConfig, state: Arc<dyn StateEventSender>) -> Result<Self> {
        let is_partner = config.is_partner;
        Ok(Self {
            nextcloud: NextcloudApi::new(config, state)?,
            is_partner,
        })
    }

    pub fn nextcloud(&self) -> &NextcloudApi {
        &self.nextcloud
    }

    /// Whether the client is configured for a partner account; `None` if
    /// never set.
    pub fn is_partner(&self) -> Option<bool> {
        self.is_partner
    }

    pub fn set_partner(&mut self, is_partner: bool) {
        self.is_partner = Some(is_partner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, TransportError};
    use crate::http::{HttpRequest, HttpResponse};

    fn failing_config() -> ClientConfig {
        let dispatcher = |_request: HttpRequest| -> std::result::Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: r#"{"errcode":"M_UNKNOWN","error":"Internal error"}"#.to_string(),
            })
        };
        ClientConfig::new("http://localhost:8008", Arc::new(dispatcher))
    }

    #[test]
    fn partner_flag_defaults_to_config() {
        let api = WatchaApi::new(failing_config()).unwrap();
        assert_eq!(api.is_partner(), None);

        let api = WatchaApi::new(failing_config().with_partner(false)).unwrap();
        assert_eq!(api.is_partner(), Some(false));
    }

    #[test]
    fn set_partner_overwrites() {
        let mut api = WatchaApi::new(failing_config().with_partner(false)).unwrap();
        api.set_partner(true);
        assert_eq!(api.is_partner(), Some(true));
        api.set_partner(false);
        assert_eq!(api.is_partner(), Some(false));
    }

    #[test]
    fn partner_flag_survives_failed_requests() {
        let mut api = WatchaApi::new(failing_config()).unwrap();
        api.set_partner(true);

        assert!(matches!(api.nextcloud().own_calendars(), Err(ApiError::Remote { status: 500, .. })));
        assert!(api.nextcloud().set_room_calendar("!r:hs", Some("c")).is_err());
        assert_eq!(api.is_partner(), Some(true));
    }

    #[test]
    fn construction_fails_without_dispatcher() {
        let mut config = failing_config();
        config.dispatcher = None;
        assert!(matches!(WatchaApi::new(config), Err(ApiError::Configuration(_))));
    }

    #[test]
    fn state_writes_use_matrix_prefix() {
        use std::sync::Mutex;

        let seen: Arc<Mutex<Vec<HttpRequest>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        let dispatcher = move |request: HttpRequest| -> std::result::Result<HttpResponse, TransportError> {
            recorder.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"event_id":"$abc"}"#.to_string(),
            })
        };
        let api = WatchaApi::new(ClientConfig::new("http://localhost:8008", Arc::new(dispatcher))).unwrap();

        let ack = api.nextcloud().unset_room_calendar("room1", "statekey1").unwrap();
        assert_eq!(ack.event_id, "$abc");

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0].url,
            "http://localhost:8008/_matrix/client/r0/rooms/room1/state/watcha.room.nextcloud_calendar/statekey1"
        );
        assert_eq!(seen[0].body.as_deref(), Some("{}"));
    }
}
