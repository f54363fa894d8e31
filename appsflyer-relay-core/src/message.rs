//! Decoding of inbound track messages
//!
//! The routing platform hands over track messages shaped like this:
//!
//! ```json
//! {
//!   "type": "track",
//!   "event": "Purchase",
//!   "timestamp": "2016-08-03T12:17:00.000Z",
//!   "properties": { "revenue": 9.99, "currency": "USD" },
//!   "context": {
//!     "ip": "1.2.3.4",
//!     "device": { "type": "ios", "advertisingId": "159358" },
//!     "library": { "name": "analytics-ios", "version": "3.0.0" },
//!     "app": { "namespace": "com.segment.analytics.sample" }
//!   },
//!   "integrations": { "AppsFlyer": { "appsFlyerId": "1415211453000-6513894" } }
//! }
//! ```
//!
//! Only the fields the delivery pipeline reads are decoded; everything else is
//! ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::adapter::NAME;
use crate::error::{Error, Result};
use crate::types::{Device, Event, IntegrationOptions, Library};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackMessage {
    #[serde(rename = "type")]
    message_type: Option<String>,
    event: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
    context: Option<Context>,
    integrations: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct Context {
    ip: Option<String>,
    device: Option<DeviceContext>,
    library: Option<LibraryContext>,
    app: Option<AppContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceContext {
    #[serde(rename = "type")]
    device_type: Option<String>,
    advertising_id: Option<Value>,
}

/// Older clients send the library as a bare name
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LibraryContext {
    Name(String),
    Full {
        #[serde(default)]
        name: String,
        #[serde(default)]
        version: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct AppContext {
    namespace: Option<String>,
}

/// Decode a track message from JSON text.
pub fn parse_track(json: &str) -> Result<Event> {
    let value: Value = serde_json::from_str(json)?;
    track_from_value(value)
}

/// Decode a track message from an already parsed JSON value.
pub fn track_from_value(value: Value) -> Result<Event> {
    let message: TrackMessage = serde_json::from_value(value)
        .map_err(|e| Error::Message(format!("malformed track message: {}", e)))?;

    if let Some(message_type) = message.message_type.as_deref() {
        if !message_type.eq_ignore_ascii_case("track") {
            return Err(Error::Message(format!(
                "unsupported message type: {}",
                message_type
            )));
        }
    }

    let event_name = message
        .event
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Message("track message has no event name".to_string()))?;

    let properties = message.properties.unwrap_or_default();
    let currency = properties
        .get("currency")
        .and_then(Value::as_str)
        .map(str::to_string);

    // Sections may be missing or explicitly null
    let context = message.context.unwrap_or_default();
    let device = context.device.unwrap_or_default();
    let integrations = message.integrations.unwrap_or_default();

    let library = match context.library {
        Some(LibraryContext::Name(name)) => Library {
            name,
            version: String::new(),
        },
        Some(LibraryContext::Full { name, version }) => Library { name, version },
        None => Library::default(),
    };

    Ok(Event {
        event_name,
        timestamp: message.timestamp.unwrap_or_else(Utc::now),
        currency,
        ip_address: context.ip,
        properties,
        device: Device {
            device_type: device.device_type,
            advertising_id: device.advertising_id.as_ref().and_then(scalar_to_string),
        },
        library,
        app_namespace: context.app.and_then(|app| app.namespace),
        integration_options: IntegrationOptions {
            apps_flyer_id: integrations
                .get(NAME)
                .and_then(|options| options.get("appsFlyerId"))
                .and_then(scalar_to_string),
        },
    })
}

/// Strings and numbers as text; anything else carries no identifier
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
