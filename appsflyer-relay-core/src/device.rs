//! Device type resolution
//!
//! Resolution order:
//! 1. An explicit `device.type` of `ios` or `android` (any casing)
//! 2. A library name containing `ios` (any casing)
//! 3. Android
//!
//! Step 3 keeps older server-side events working: they predate explicit device
//! typing and were always attributed to Android. It is not a real inference, so
//! an event with no platform signal at all still ends up as Android. Explicit
//! values other than `ios`/`android` are rejected by the validator before this
//! fallback is reached.

use crate::types::{DeviceType, Event};

/// Resolve the platform an event belongs to. Never fails.
pub fn resolve(event: &Event) -> DeviceType {
    if let Some(device_type) = event.device.device_type().and_then(DeviceType::parse) {
        return device_type;
    }

    if event.library.name.to_lowercase().contains("ios") {
        return DeviceType::Ios;
    }

    DeviceType::Android
}
