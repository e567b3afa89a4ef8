//! Verify requests and parsed results against JSON vectors in `test-vectors/`.
//!
//! Each vector names an operation, its inputs, the request the client must
//! emit, a simulated response, and either the expected result or the expected
//! error. Bodies are compared as parsed JSON so field order does not matter.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use watcha_core::{
    ApiError, ClientConfig, HttpMethod, HttpRequest, HttpResponse, TransportError, WatchaApi,
};

const BASE_URL: &str = "http://localhost:8008";

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

/// A client whose dispatcher records every request and answers with `sim`.
fn client_for(sim: &Value) -> (WatchaApi, Arc<Mutex<Vec<HttpRequest>>>) {
    let status = sim["status"].as_u64().unwrap() as u16;
    let body = sim["body"].as_str().unwrap().to_string();
    let seen: Arc<Mutex<Vec<HttpRequest>>> = Arc::default();
    let recorder = Arc::clone(&seen);

    let dispatcher = move |request: HttpRequest| -> Result<HttpResponse, TransportError> {
        recorder.lock().unwrap().push(request);
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.clone(),
        })
    };
    let config = ClientConfig::new(BASE_URL, Arc::new(dispatcher))
        .with_access_token("vector-token")
        .with_authorization_header(true);
    (WatchaApi::new(config).unwrap(), seen)
}

fn check_request(name: &str, seen: &Mutex<Vec<HttpRequest>>, expected: &Value) {
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1, "{name}: exactly one request");
    let req = &seen[0];

    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");
    assert_eq!(req.header("Authorization"), Some("Bearer vector-token"), "{name}: auth header");

    match expected.get("body") {
        Some(body) => {
            let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&sent, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn check_outcome(name: &str, case: &Value, result: Result<Value, ApiError>) {
    if let Some(expected_error) = case.get("expected_error") {
        let err = result.unwrap_err();
        let status = expected_error["status"].as_u64().unwrap() as u16;
        assert!(
            matches!(err, ApiError::Remote { status: got, .. } if got == status),
            "{name}: expected Remote {status}, got {err:?}"
        );
        assert_eq!(err.errcode().as_deref(), expected_error["errcode"].as_str(), "{name}: errcode");
    } else {
        assert_eq!(result.unwrap(), case["expected_result"], "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Calendars
// ---------------------------------------------------------------------------

#[test]
fn calendar_test_vectors() {
    let raw = include_str!("../../test-vectors/calendars.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (api, seen) = client_for(&case["simulated_response"]);
        let nextcloud = api.nextcloud();

        let result = match case["operation"].as_str().unwrap() {
            "own_calendars" => nextcloud
                .own_calendars()
                .map(|calendars| serde_json::to_value(calendars).unwrap()),
            "calendar" => nextcloud.calendar(case["calendar_id"].as_str().unwrap()),
            "reorder_calendar" => nextcloud.reorder_calendar(case["calendar_id"].as_str().unwrap()),
            other => panic!("{name}: unknown operation {other}"),
        };

        check_request(name, &seen, &case["expected_request"]);
        check_outcome(name, case, result);
    }
}

// ---------------------------------------------------------------------------
// Room calendar state
// ---------------------------------------------------------------------------

#[test]
fn room_calendar_test_vectors() {
    let raw = include_str!("../../test-vectors/room_calendar.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (api, seen) = client_for(&case["simulated_response"]);
        let nextcloud = api.nextcloud();
        let room_id = case["room_id"].as_str().unwrap();

        let result = match case["operation"].as_str().unwrap() {
            "set_room_calendar" => nextcloud.set_room_calendar(room_id, case["calendar_id"].as_str()),
            "unset_room_calendar" => {
                nextcloud.unset_room_calendar(room_id, case["state_key"].as_str().unwrap())
            }
            other => panic!("{name}: unknown operation {other}"),
        }
        .map(|ack| serde_json::to_value(ack).unwrap());

        check_request(name, &seen, &case["expected_request"]);
        check_outcome(name, case, result);
    }
}
