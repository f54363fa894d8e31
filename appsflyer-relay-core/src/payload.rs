//! Payload construction for the server-to-server in-app events API
//!
//! Converts a validated [`Event`] into the exact body AppsFlyer expects, plus
//! the per-app endpoint it is posted to.
//!
//! ## Wire format
//!
//! The API mixes camelCase and snake_case field names and only accepts string
//! values. Events whose `eventValue` map holds non-string values are dropped
//! by AppsFlyer without an error, so every property is stringified here.
//!
//! ```json
//! {
//!   "appsflyer_id": "1415211453000-6513894",
//!   "eventName": "Purchase",
//!   "eventCurrency": "USD",
//!   "eventTime": "2016-08-03 12:17:00.000",
//!   "af_events_api": "true",
//!   "eventValue": "{\"af_revenue\":\"9.99\"}",
//!   "ip": "1.2.3.4",
//!   "advertising_id": "159358"
//! }
//! ```
//!
//! These server-side events are always classified as organic by AppsFlyer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::device;
use crate::error::Result;
use crate::types::{DeviceType, Event};
use crate::validate::InvalidReason;

/// Property renamed to AppsFlyer's revenue field
const REVENUE_KEY: &str = "revenue";
const AF_REVENUE_KEY: &str = "af_revenue";

/// Body of one in-app event request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub appsflyer_id: String,

    #[serde(rename = "eventName")]
    pub event_name: String,

    #[serde(rename = "eventCurrency")]
    pub event_currency: String,

    /// UTC, millisecond precision, e.g. `2016-08-03 12:17:00.000`
    #[serde(rename = "eventTime")]
    pub event_time: String,

    /// Always `"true"`
    pub af_events_api: String,

    /// `""` or a JSON object of string values
    #[serde(rename = "eventValue")]
    pub event_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    // iOS only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idfa: Option<String>,

    // iOS only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,

    // Android only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertising_id: Option<String>,
}

/// A payload together with where it goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEvent {
    /// App-specific path segment appended to the API base URL
    pub endpoint: String,
    pub device_type: DeviceType,
    pub payload: Payload,
}

/// Build the endpoint and payload for an event that passed validation.
///
/// Fails with [`InvalidReason`] if the app ID for the resolved platform is not
/// configured, which validation already rules out.
pub fn build(event: &Event, settings: &Settings) -> Result<OutboundEvent> {
    let device_type = device::resolve(event);
    let endpoint = select_endpoint(device_type, settings)?;

    let appsflyer_id = event
        .apps_flyer_id()
        .ok_or(InvalidReason::MissingAppsFlyerId)?
        .to_string();

    let advertising_id = event.device.advertising_id().map(str::to_string);
    let (idfa, bundle_id, advertising_id) = match device_type {
        DeviceType::Ios => (advertising_id, event.app_namespace.clone(), None),
        DeviceType::Android => (None, None, advertising_id),
    };

    let payload = Payload {
        appsflyer_id,
        event_name: event.event_name.clone(),
        event_currency: event.currency().to_string(),
        event_time: format_event_time(event),
        af_events_api: "true".to_string(),
        event_value: encode_event_value(&event.properties)?,
        ip: event.ip_address.clone().filter(|ip| !ip.is_empty()),
        idfa,
        bundle_id,
        advertising_id,
    };

    Ok(OutboundEvent {
        endpoint,
        device_type,
        payload,
    })
}

/// Per-app endpoint: `id<appleAppID>` for iOS, the package name for Android.
///
/// The Apple App ID is configured without its `id` prefix, which the API requires.
pub fn select_endpoint(device_type: DeviceType, settings: &Settings) -> Result<String> {
    let endpoint = match device_type {
        DeviceType::Ios => format!(
            "id{}",
            settings
                .apple_app_id()
                .ok_or(InvalidReason::MissingAppleAppId)?
        ),
        DeviceType::Android => settings
            .android_app_id()
            .ok_or(InvalidReason::MissingAndroidAppId)?
            .to_string(),
    };
    Ok(endpoint)
}

fn format_event_time(event: &Event) -> String {
    event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Encode properties into the `eventValue` string.
///
/// `revenue` becomes `af_revenue`, null and empty values are dropped, and the
/// rest are stringified. An empty result encodes as `""`.
pub fn encode_event_value(properties: &serde_json::Map<String, Value>) -> Result<String> {
    let mut renamed = properties.clone();
    if let Some(revenue) = renamed.remove(REVENUE_KEY) {
        renamed.insert(AF_REVENUE_KEY.to_string(), revenue);
    }

    let values: BTreeMap<String, String> = renamed
        .into_iter()
        .filter_map(|(key, value)| stringify_value(&value).map(|v| (key, v)))
        .collect();

    if values.is_empty() {
        return Ok(String::new());
    }

    Ok(serde_json::to_string(&values)?)
}

/// String form of a property value, `None` for null and empty strings
fn stringify_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_to_string(n)),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Floats print in plain decimal between 1e-6 and 1e21 (`10.0` → `10`,
/// `1e16` → `10000000000000000`); outside that range they keep exponent form.
fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && (1e-6..1e21).contains(&f.abs()) => format!("{}", f),
        _ => n.to_string(),
    }
}
