//! Integration tests for the delivery pipeline
//!
//! These tests use fixture files in `tests/fixtures/` (an inbound track
//! message, the expected endpoint and the expected payload) and a recording
//! transport in place of the network.

use appsflyer_relay_core::config::DEFAULT_BASE_URL;
use appsflyer_relay_core::message;
use appsflyer_relay_core::transport::{OutboundRequest, TransportResponse};
use appsflyer_relay_core::{
    AppsFlyer, DeliveryOutcome, Error, Event, InvalidReason, Result, Settings, Transport,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(format!("{}.json", name))
}

fn load_fixture(name: &str) -> Value {
    let content = std::fs::read_to_string(fixture_path(name)).expect("fixture should exist");
    serde_json::from_str(&content).expect("fixture should be valid JSON")
}

/// Records every request and answers with a fixed status
struct RecordingTransport {
    status: u16,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl RecordingTransport {
    fn answering(status: u16) -> Self {
        Self {
            status,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordingTransport {
    async fn post_json(&self, request: &OutboundRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(TransportResponse {
            status: self.status,
            body: "ok".to_string(),
        })
    }
}

fn settings() -> Settings {
    Settings {
        dev_key: "pSX9JjSNkWUR8AJQQ7kQoE".to_string(),
        apple_app_id: Some("822613531".to_string()),
        android_app_id: Some("com.segment.analytics.sample".to_string()),
    }
}

fn adapter_with(settings: Settings, status: u16) -> AppsFlyer<RecordingTransport> {
    AppsFlyer::new(settings, RecordingTransport::answering(status), DEFAULT_BASE_URL)
        .expect("settings carry a dev key")
}

fn sent(adapter: &AppsFlyer<RecordingTransport>) -> Vec<OutboundRequest> {
    adapter.dispatcher().transport().requests()
}

/// Compare a sent body with the fixture output, decoding `eventValue`
fn assert_payload_matches(body: &Value, expected: &Value) {
    let mut body = body.clone();
    let mut expected = expected.clone();

    let decode = |v: &mut Value| -> Value {
        let raw = v["eventValue"].take();
        match raw.as_str() {
            Some("") | None => raw,
            Some(s) => serde_json::from_str(s).expect("eventValue should be JSON"),
        }
    };

    assert_eq!(decode(&mut body), decode(&mut expected), "eventValue differs");
    assert_eq!(body, expected);
}

// ============================================
// Fixture-driven delivery
// ============================================

async fn run_fixture(name: &str) {
    let fixture = load_fixture(name);
    let event = message::track_from_value(fixture["input"].clone()).expect("input should decode");

    let adapter = adapter_with(settings(), 200);
    let outcome = adapter.deliver(&event).await.expect("delivery should succeed");
    assert_eq!(outcome, DeliveryOutcome::Delivered { status: 200 });

    let requests = sent(&adapter);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert_eq!(
        request.url,
        format!(
            "https://api2.appsflyer.com/inappevent/{}",
            fixture["endpoint"].as_str().unwrap()
        )
    );
    assert_eq!(
        request.headers,
        vec![(
            "authentication".to_string(),
            "pSX9JjSNkWUR8AJQQ7kQoE".to_string()
        )]
    );
    assert_eq!(request.max_retries, 2);
    assert_payload_matches(&request.body, &fixture["output"]);
}

#[tokio::test]
async fn test_track_event_ios() {
    run_fixture("track-event-ios").await;
}

#[tokio::test]
async fn test_track_event_android() {
    run_fixture("track-event-android").await;
}

#[tokio::test]
async fn test_track_event_props_ios() {
    run_fixture("track-event-props-ios").await;
}

#[tokio::test]
async fn test_track_event_props_android() {
    run_fixture("track-event-props-android").await;
}

// ============================================
// Validation through the public entry point
// ============================================

fn track(device: Value) -> Event {
    message::track_from_value(serde_json::json!({
        "type": "track",
        "event": "Test Event",
        "timestamp": "2016-08-03T12:17:00.000Z",
        "context": { "device": device },
        "integrations": { "AppsFlyer": { "appsFlyerId": "xxx" } }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_invalid_if_ios_and_no_apple_app_id() {
    let adapter = adapter_with(
        Settings {
            apple_app_id: None,
            ..settings()
        },
        200,
    );
    let event = track(serde_json::json!({"type": "ios", "advertisingId": "159358"}));

    let err = adapter.deliver(&event).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Invalid(InvalidReason::MissingAppleAppId)
    ));
    assert!(sent(&adapter).is_empty());
}

#[tokio::test]
async fn test_invalid_if_android_and_no_android_app_id() {
    let adapter = adapter_with(
        Settings {
            android_app_id: None,
            ..settings()
        },
        200,
    );
    let event = track(serde_json::json!({"type": "android", "advertisingId": "159358"}));

    let err = adapter.deliver(&event).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Invalid(InvalidReason::MissingAndroidAppId)
    ));
}

#[tokio::test]
async fn test_valid_without_apple_app_id_if_android() {
    let adapter = adapter_with(
        Settings {
            apple_app_id: None,
            ..settings()
        },
        200,
    );
    let event = track(serde_json::json!({"type": "android", "advertisingId": "159358"}));
    assert!(adapter.deliver(&event).await.is_ok());
}

#[tokio::test]
async fn test_valid_without_android_app_id_if_ios() {
    let adapter = adapter_with(
        Settings {
            android_app_id: None,
            ..settings()
        },
        200,
    );
    let event = track(serde_json::json!({"type": "ios", "advertisingId": "159358"}));
    assert!(adapter.deliver(&event).await.is_ok());
}

#[tokio::test]
async fn test_invalid_without_apps_flyer_id() {
    let adapter = adapter_with(settings(), 200);
    let event = message::track_from_value(serde_json::json!({
        "event": "Test Event",
        "context": { "device": {"type": "ios", "advertisingId": "159358"} }
    }))
    .unwrap();

    let err = adapter.deliver(&event).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Invalid(InvalidReason::MissingAppsFlyerId)
    ));
}

#[tokio::test]
async fn test_unsupported_device_type_is_dropped_silently() {
    let adapter = adapter_with(settings(), 200);
    let event = track(serde_json::json!({"type": "some_random_value"}));

    let outcome = adapter.deliver(&event).await.unwrap();
    assert!(matches!(outcome, DeliveryOutcome::Rejected(_)));
    assert!(sent(&adapter).is_empty());
}

#[tokio::test]
async fn test_missing_advertising_id_still_delivers() {
    let adapter = adapter_with(settings(), 200);
    let event = message::track_from_value(serde_json::json!({
        "type": "track",
        "event": "Test Event",
        "context": {
            "device": { "type": "ios" },
            "app": { "namespace": "com.segment.analytics.sample" }
        },
        "integrations": { "AppsFlyer": { "appsFlyerId": "xxx" } }
    }))
    .unwrap();

    let outcome = adapter.deliver(&event).await.unwrap();
    assert_eq!(outcome, DeliveryOutcome::Delivered { status: 200 });

    let body = &sent(&adapter)[0].body;
    assert!(body.get("idfa").is_none());
    assert_eq!(body["bundle_id"], "com.segment.analytics.sample");
}

#[tokio::test]
async fn test_server_side_event_without_ip_omits_field() {
    let adapter = adapter_with(settings(), 200);
    let event = track(serde_json::json!({"type": "android", "advertisingId": "159358"}));

    adapter.deliver(&event).await.unwrap();
    let body = &sent(&adapter)[0].body;
    assert!(body.get("ip").is_none());
}

// ============================================
// Delivery failures
// ============================================

#[tokio::test]
async fn test_error_status_is_delivery_failure() {
    let adapter = adapter_with(settings(), 403);
    let event = track(serde_json::json!({"type": "android"}));

    let err = adapter.deliver(&event).await.unwrap_err();
    assert!(err.is_delivery());
    assert!(matches!(err, Error::Delivery { status: Some(403), .. }));
}

// ============================================
// Concurrency
// ============================================

#[tokio::test]
async fn test_concurrent_deliveries_share_one_adapter() {
    let adapter = std::sync::Arc::new(adapter_with(settings(), 200));

    let mut handles = Vec::new();
    for i in 0..8 {
        let adapter = adapter.clone();
        handles.push(tokio::spawn(async move {
            let device_type = if i % 2 == 0 { "ios" } else { "android" };
            let event = track(serde_json::json!({"type": device_type}));
            adapter.deliver(&event).await
        }));
    }

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered { status: 200 });
    }

    let requests = sent(&adapter);
    assert_eq!(requests.len(), 8);
    let ios = requests
        .iter()
        .filter(|r| r.url.ends_with("/id822613531"))
        .count();
    assert_eq!(ios, 4);
}
