//! Core domain types for appsflyer-relay
//!
//! | Term | Definition |
//! |------|------------|
//! | **Event** | A track event (one user action) parsed and enriched upstream |
//! | **Device type** | The resolved mobile platform, `ios` or `android` |
//! | **Integration option** | A per-event value for this destination only (the AppsFlyer ID) |
//!
//! Events are read-only to the delivery pipeline. Nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency reported when the event does not carry one
pub const DEFAULT_CURRENCY: &str = "USD";

// ============================================
// Event
// ============================================

/// A track event ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Name of the user action (e.g. "Purchase")
    pub event_name: String,
    /// When the action happened
    pub timestamp: DateTime<Utc>,
    /// ISO currency code; see [`Event::currency`]
    pub currency: Option<String>,
    /// Client IP, present for client-proxied events
    pub ip_address: Option<String>,
    /// Free-form event properties
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    /// Device context
    #[serde(default)]
    pub device: Device,
    /// Originating client SDK
    #[serde(default)]
    pub library: Library,
    /// App bundle identifier
    pub app_namespace: Option<String>,
    /// Options addressed to this destination
    #[serde(default)]
    pub integration_options: IntegrationOptions,
}

impl Event {
    /// Create an event with the given name and timestamp and empty context.
    pub fn new(event_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_name: event_name.into(),
            timestamp,
            currency: None,
            ip_address: None,
            properties: serde_json::Map::new(),
            device: Device::default(),
            library: Library::default(),
            app_namespace: None,
            integration_options: IntegrationOptions::default(),
        }
    }

    /// Currency code, `USD` when absent or blank
    pub fn currency(&self) -> &str {
        self.currency
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    /// AppsFlyer device ID supplied by the caller, if any
    pub fn apps_flyer_id(&self) -> Option<&str> {
        self.integration_options
            .apps_flyer_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// Device context of an event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    /// Raw device type as reported by the client (any casing)
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    /// IDFA on iOS, Google advertising ID on Android
    pub advertising_id: Option<String>,
}

impl Device {
    /// Raw device type, ignoring blank values
    pub fn device_type(&self) -> Option<&str> {
        self.device_type.as_deref().filter(|t| !t.is_empty())
    }

    /// Advertising ID, ignoring blank values
    pub fn advertising_id(&self) -> Option<&str> {
        self.advertising_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Client SDK that produced the event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    pub version: String,
}

/// Per-event options addressed to the AppsFlyer destination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrationOptions {
    /// Destination-assigned device identifier (required for delivery)
    pub apps_flyer_id: Option<String>,
}

// ============================================
// Device type
// ============================================

/// Mobile platform an event is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ios,
    Android,
}

impl DeviceType {
    /// Parse an explicit device type, ignoring case.
    ///
    /// Returns `None` for anything other than `ios` or `android`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "ios" => Some(DeviceType::Ios),
            "android" => Some(DeviceType::Android),
            _ => None,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Ios => "ios",
            DeviceType::Android => "android",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_parse_ignores_case() {
        assert_eq!(DeviceType::parse("iOS"), Some(DeviceType::Ios));
        assert_eq!(DeviceType::parse("ANDROID"), Some(DeviceType::Android));
        assert_eq!(DeviceType::parse("windows"), None);
        assert_eq!(DeviceType::parse(""), None);
    }

    #[test]
    fn test_currency_defaults_to_usd() {
        let mut event = Event::new("Purchase", Utc::now());
        assert_eq!(event.currency(), "USD");

        event.currency = Some(String::new());
        assert_eq!(event.currency(), "USD");

        event.currency = Some("EUR".to_string());
        assert_eq!(event.currency(), "EUR");
    }

    #[test]
    fn test_blank_apps_flyer_id_is_absent() {
        let mut event = Event::new("Purchase", Utc::now());
        assert_eq!(event.apps_flyer_id(), None);

        event.integration_options.apps_flyer_id = Some(String::new());
        assert_eq!(event.apps_flyer_id(), None);

        event.integration_options.apps_flyer_id = Some("1415211453000-6513894".to_string());
        assert_eq!(event.apps_flyer_id(), Some("1415211453000-6513894"));
    }
}
