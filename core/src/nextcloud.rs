//! Low-level wrappers for the Watcha Nextcloud calendar APIs.
//!
//! Calendar reads and reordering go to `/_watcha/nextcloud`; linking a room
//! to a calendar is room state (`watcha.room.nextcloud_calendar`) written
//! through the host's `StateEventSender`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::HttpMethod;
use crate::rest::{encode_segment, PrefixedRestClient};
use crate::state::{require_room_id, StateEventAck, StateEventSender};
use crate::watcha::PREFIX_WATCHA;

/// URI path for the Nextcloud API, below [`PREFIX_WATCHA`].
pub const PREFIX_NEXTCLOUD: &str = "/nextcloud";

/// State event type linking a room to a Nextcloud calendar.
pub const CALENDAR_EVENT_TYPE: &str = "watcha.room.nextcloud_calendar";

/// One entry of the user's calendar list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub id: String,
    pub displayname: String,
}

/// Content of a `watcha.room.nextcloud_calendar` state event.
///
/// `id` is `None` both for a link whose target is not known yet and for an
/// unset (`{}`) event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCalendar {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Clone)]
pub struct NextcloudApi {
    http: PrefixedRestClient,
    state: Arc<dyn StateEventSender>,
}

impl NextcloudApi {
    pub fn new(config: ClientConfig, state: Arc<dyn StateEventSender>) -> Result<Self> {
        let prefix = format!("{PREFIX_WATCHA}{PREFIX_NEXTCLOUD}");
        Ok(Self {
            http: PrefixedRestClient::new(config, prefix, true)?,
            state,
        })
    }

    /// The REST client bound to `/_watcha/nextcloud`.
    pub fn http(&self) -> &PrefixedRestClient {
        &self.http
    }

    /// List the calendars of the authenticated user.
    pub fn own_calendars(&self) -> Result<Vec<CalendarSummary>> {
        self.http.authed_data(HttpMethod::Get, "/calendars", &[], None)
    }

    /// Fetch one calendar. The payload is passed through as-is.
    pub fn calendar(&self, calendar_id: &str) -> Result<Value> {
        let path = format!("/calendars/{}", calendar_segment(calendar_id)?);
        Ok(self.http.authed_request(HttpMethod::Get, &path, &[], None)?.into_data())
    }

    /// Move a calendar to the top of the user's list.
    pub fn reorder_calendar(&self, calendar_id: &str) -> Result<Value> {
        let path = format!("/calendars/{}/top", calendar_segment(calendar_id)?);
        Ok(self.http.authed_request(HttpMethod::Put, &path, &[], None)?.into_data())
    }

    /// Link `room_id` to a calendar.
    ///
    /// Without a calendar id the event is still written, with `{"id": null}`.
    pub fn set_room_calendar(&self, room_id: &str, calendar_id: Option<&str>) -> Result<StateEventAck> {
        require_room_id(room_id)?;
        let content = json!({ "id": calendar_id });
        self.state
            .send_state_event(room_id, CALENDAR_EVENT_TYPE, &content, None)
    }

    /// Clear the link stored under `state_key` by writing empty content.
    pub fn unset_room_calendar(&self, room_id: &str, state_key: &str) -> Result<StateEventAck> {
        require_room_id(room_id)?;
        self.state
            .send_state_event(room_id, CALENDAR_EVENT_TYPE, &json!({}), Some(state_key))
    }

    /// Read the calendar currently linked to `room_id`.
    pub fn room_calendar(&self, room_id: &str) -> Result<RoomCalendar> {
        require_room_id(room_id)?;
        let content = self.state.state_event(room_id, CALENDAR_EVENT_TYPE, None)?;
        serde_json::from_value(content).map_err(ApiError::Deserialization)
    }
}

fn calendar_segment(calendar_id: &str) -> Result<String> {
    if calendar_id.is_empty() {
        return Err(ApiError::InvalidArgument("calendar id must not be empty".to_string()));
    }
    Ok(encode_segment(calendar_id))
}
