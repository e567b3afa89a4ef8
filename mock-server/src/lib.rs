use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Token accepted by the mock homeserver.
pub const ACCESS_TOKEN: &str = "mock-token";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub displayname: String,
}

#[derive(Debug, Default)]
pub struct Homeserver {
    /// Calendar list in display order.
    pub calendars: Vec<Calendar>,
    /// Room state keyed by (room id, event type, state key).
    pub room_state: HashMap<(String, String, String), Value>,
}

impl Homeserver {
    pub fn with_calendars(calendars: Vec<Calendar>) -> Self {
        Self {
            calendars,
            room_state: HashMap::new(),
        }
    }
}

pub type Db = Arc<RwLock<Homeserver>>;

#[derive(Debug)]
pub struct MatrixError {
    status: StatusCode,
    errcode: &'static str,
    error: String,
}

impl MatrixError {
    fn new(status: StatusCode, errcode: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            errcode,
            error: error.into(),
        }
    }

    fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "M_NOT_FOUND", error)
    }
}

impl IntoResponse for MatrixError {
    fn into_response(self) -> Response {
        let body = json!({ "errcode": self.errcode, "error": self.error });
        (self.status, Json(body)).into_response()
    }
}

pub fn seed_calendars() -> Vec<Calendar> {
    vec![
        Calendar {
            id: "personal".to_string(),
            displayname: "Personal".to_string(),
        },
        Calendar {
            id: "team".to_string(),
            displayname: "Team".to_string(),
        },
    ]
}

pub fn app() -> Router {
    app_with(Homeserver::with_calendars(seed_calendars()))
}

pub fn app_with(homeserver: Homeserver) -> Router {
    let db: Db = Arc::new(RwLock::new(homeserver));
    Router::new()
        .route("/_watcha/nextcloud/calendars", get(list_calendars))
        .route("/_watcha/nextcloud/calendars/{calendar_id}", get(get_calendar))
        .route("/_watcha/nextcloud/calendars/{calendar_id}/top", put(reorder_calendar))
        .route(
            "/_matrix/client/r0/rooms/{room_id}/state/{event_type}",
            get(get_default_state).put(put_default_state),
        )
        .route(
            "/_matrix/client/r0/rooms/{room_id}/state/{event_type}/{state_key}",
            get(get_keyed_state).put(put_keyed_state),
        )
        .layer(middleware::from_fn(require_token))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock homeserver listening");
    }
    axum::serve(listener, app()).await
}

#[derive(Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

async fn require_token(Query(query): Query<TokenQuery>, request: Request, next: Next) -> Response {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    match bearer.or(query.access_token) {
        None => MatrixError::new(
            StatusCode::UNAUTHORIZED,
            "M_MISSING_TOKEN",
            "Missing access token",
        )
        .into_response(),
        Some(token) if token != ACCESS_TOKEN => MatrixError::new(
            StatusCode::UNAUTHORIZED,
            "M_UNKNOWN_TOKEN",
            "Unrecognised access token",
        )
        .into_response(),
        Some(_) => {
            debug!(method = %request.method(), path = request.uri().path(), "authorized");
            next.run(request).await
        }
    }
}

async fn list_calendars(State(db): State<Db>) -> Json<Vec<Calendar>> {
    Json(db.read().await.calendars.clone())
}

async fn get_calendar(
    State(db): State<Db>,
    Path(calendar_id): Path<String>,
) -> Result<Json<Value>, MatrixError> {
    let hs = db.read().await;
    let position = hs
        .calendars
        .iter()
        .position(|c| c.id == calendar_id)
        .ok_or_else(|| MatrixError::not_found(format!("Unknown calendar {calendar_id}")))?;
    let calendar = &hs.calendars[position];
    Ok(Json(json!({
        "id": calendar.id,
        "displayname": calendar.displayname,
        "position": position,
    })))
}

async fn reorder_calendar(
    State(db): State<Db>,
    Path(calendar_id): Path<String>,
) -> Result<Json<Value>, MatrixError> {
    let mut hs = db.write().await;
    let position = hs
        .calendars
        .iter()
        .position(|c| c.id == calendar_id)
        .ok_or_else(|| MatrixError::not_found(format!("Unknown calendar {calendar_id}")))?;
    let calendar = hs.calendars.remove(position);
    hs.calendars.insert(0, calendar);
    Ok(Json(json!({})))
}

async fn get_default_state(
    State(db): State<Db>,
    Path((room_id, event_type)): Path<(String, String)>,
) -> Result<Json<Value>, MatrixError> {
    read_state(&db, room_id, event_type, String::new()).await
}

async fn get_keyed_state(
    State(db): State<Db>,
    Path((room_id, event_type, state_key)): Path<(String, String, String)>,
) -> Result<Json<Value>, MatrixError> {
    read_state(&db, room_id, event_type, state_key).await
}

async fn put_default_state(
    State(db): State<Db>,
    Path((room_id, event_type)): Path<(String, String)>,
    Json(content): Json<Value>,
) -> Json<Value> {
    write_state(&db, room_id, event_type, String::new(), content).await
}

async fn put_keyed_state(
    State(db): State<Db>,
    Path((room_id, event_type, state_key)): Path<(String, String, String)>,
    Json(content): Json<Value>,
) -> Json<Value> {
    write_state(&db, room_id, event_type, state_key, content).await
}

async fn read_state(
    db: &Db,
    room_id: String,
    event_type: String,
    state_key: String,
) -> Result<Json<Value>, MatrixError> {
    db.read()
        .await
        .room_state
        .get(&(room_id, event_type, state_key))
        .cloned()
        .map(Json)
        .ok_or_else(|| MatrixError::not_found("Event not found."))
}

async fn write_state(
    db: &Db,
    room_id: String,
    event_type: String,
    state_key: String,
    content: Value,
) -> Json<Value> {
    let event_id = format!("${}", Uuid::new_v4().simple());
    debug!(%room_id, %event_type, %state_key, %event_id, "state event stored");
    db.write()
        .await
        .room_state
        .insert((room_id, event_type, state_key), content);
    Json(json!({ "event_id": event_id }))
}
