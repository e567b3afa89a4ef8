//! Client wrappers for the Watcha homeserver extensions.
//!
//! # Overview
//! `WatchaApi` exposes the `/_watcha` namespace: the partner-account flag and,
//! through `NextcloudApi`, the Nextcloud calendar integration. Both sit on a
//! `PrefixedRestClient`, which turns a path into an authenticated request and
//! hands it to a `RequestDispatcher`.
//!
//! # Design
//! - Requests and responses are plain data; the dispatcher is the only piece
//!   that touches the network. `UreqDispatcher` is the blocking default and
//!   any closure can stand in for it.
//! - Each call issues at most one request. No retries, no caching.
//! - Room-to-calendar links are Matrix room state, written through a
//!   `StateEventSender` supplied by the host client or built from the same
//!   configuration (`MatrixStateEvents`).

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod nextcloud;
pub mod rest;
pub mod state;
pub mod watcha;

pub use config::{ClientConfig, ClientOptions};
pub use dispatch::{RequestDispatcher, UreqDispatcher};
pub use error::{ApiError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use nextcloud::{CalendarSummary, NextcloudApi, RoomCalendar, CALENDAR_EVENT_TYPE, PREFIX_NEXTCLOUD};
pub use rest::{PrefixedRestClient, RestResponse};
pub use state::{MatrixStateEvents, StateEventAck, StateEventSender, PREFIX_R0};
pub use watcha::{WatchaApi, PREFIX_WATCHA};
