//! Deliverability checks
//!
//! Checks run in a fixed order and the first failing one decides the outcome:
//!
//! 1. dev key configured (also enforced when the adapter is built)
//! 2. explicit device type is `ios` or `android`, otherwise **Rejected**
//! 3. Apple App ID configured for iOS events
//! 4. Android App ID configured for Android events
//! 5. AppsFlyer device ID supplied in the integration options
//!
//! **Rejected** events are a class this destination never accepts; they are
//! dropped without surfacing an error. **Invalid** events are in scope but miss
//! a precondition; they surface to the caller as [`crate::Error::Invalid`].

use thiserror::Error;

use crate::config::Settings;
use crate::device;
use crate::types::{DeviceType, Event};

/// Why an in-scope event cannot be delivered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("settings.appsFlyerDevKey is required")]
    MissingDevKey,

    #[error("settings.appsFlyerDevKey contains characters not allowed in an HTTP header")]
    MalformedDevKey,

    #[error("iOS apps must configure the Apple App ID in the settings")]
    MissingAppleAppId,

    #[error("Android apps must configure the Android App ID in the settings")]
    MissingAndroidAppId,

    #[error("AppsFlyer Device ID is required")]
    MissingAppsFlyerId,
}

/// Why an event is out of scope for this destination
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("device type {0:?} is not supported, expected \"ios\" or \"android\"")]
    UnsupportedDeviceType(String),
}

/// Result of running the checks against one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Deliverable; carries the resolved platform
    Valid(DeviceType),
    Invalid(InvalidReason),
    Rejected(RejectReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

/// Check that `event` can be delivered with `settings`.
pub fn validate(event: &Event, settings: &Settings) -> ValidationOutcome {
    if !settings.has_dev_key() {
        return ValidationOutcome::Invalid(InvalidReason::MissingDevKey);
    }

    if let Some(raw) = event.device.device_type() {
        if DeviceType::parse(raw).is_none() {
            return ValidationOutcome::Rejected(RejectReason::UnsupportedDeviceType(
                raw.to_string(),
            ));
        }
    }

    let device_type = device::resolve(event);

    match device_type {
        DeviceType::Ios if settings.apple_app_id().is_none() => {
            return ValidationOutcome::Invalid(InvalidReason::MissingAppleAppId);
        }
        DeviceType::Android if settings.android_app_id().is_none() => {
            return ValidationOutcome::Invalid(InvalidReason::MissingAndroidAppId);
        }
        _ => {}
    }

    if event.apps_flyer_id().is_none() {
        return ValidationOutcome::Invalid(InvalidReason::MissingAppsFlyerId);
    }

    ValidationOutcome::Valid(device_type)
}
