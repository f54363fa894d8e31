//! The AppsFlyer destination
//!
//! [`AppsFlyer::deliver`] runs one event through the pipeline:
//!
//! ```text
//! Event → validate → build payload → dispatch → DeliveryOutcome
//!            │
//!            ├─ Rejected → Ok(DeliveryOutcome::Rejected), nothing sent
//!            └─ Invalid  → Err(Error::Invalid), nothing sent
//! ```
//!
//! An adapter holds immutable settings and can deliver events concurrently.

use reqwest::header::HeaderValue;

use crate::config::{Config, Settings};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::payload::{self, OutboundEvent};
use crate::transport::{HttpTransport, Transport};
use crate::types::Event;
use crate::validate::{self, InvalidReason, RejectReason, ValidationOutcome};

/// Destination name, as used in an event's integration options
pub const NAME: &str = "AppsFlyer";

/// What happened to an event that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by AppsFlyer
    Delivered { status: u16 },
    /// Out of scope for this destination; dropped without sending
    Rejected(RejectReason),
}

/// Result of a dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// What would be sent
    Deliverable(OutboundEvent),
    Rejected(RejectReason),
}

/// AppsFlyer server-to-server delivery adapter
pub struct AppsFlyer<T> {
    settings: Settings,
    dispatcher: Dispatcher<T>,
}

impl AppsFlyer<HttpTransport> {
    /// Build an adapter that talks HTTP, from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.transport)?;
        Self::new(config.appsflyer.clone(), transport, &config.transport.base_url)
    }
}

impl<T: Transport> AppsFlyer<T> {
    /// Create an adapter.
    ///
    /// Returns [`InvalidReason::MissingDevKey`] if no dev key is configured and
    /// [`InvalidReason::MalformedDevKey`] if it cannot be sent as a header.
    pub fn new(settings: Settings, transport: T, base_url: &str) -> Result<Self> {
        if !settings.has_dev_key() {
            return Err(Error::Invalid(InvalidReason::MissingDevKey));
        }
        if HeaderValue::from_str(&settings.dev_key).is_err() {
            return Err(Error::Invalid(InvalidReason::MalformedDevKey));
        }

        Ok(Self {
            settings,
            dispatcher: Dispatcher::new(transport, base_url),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Validate and build without sending.
    pub fn preview(&self, event: &Event) -> Result<Preview> {
        match validate::validate(event, &self.settings) {
            ValidationOutcome::Valid(_) => Ok(Preview::Deliverable(payload::build(
                event,
                &self.settings,
            )?)),
            ValidationOutcome::Rejected(reason) => {
                tracing::debug!(event = %event.event_name, reason = %reason, "Event rejected");
                Ok(Preview::Rejected(reason))
            }
            ValidationOutcome::Invalid(reason) => {
                tracing::info!(event = %event.event_name, reason = %reason, "Event invalid");
                Err(Error::Invalid(reason))
            }
        }
    }

    /// Deliver one event.
    pub async fn deliver(&self, event: &Event) -> Result<DeliveryOutcome> {
        let outbound = match validate::validate(event, &self.settings) {
            ValidationOutcome::Valid(_) => payload::build(event, &self.settings)?,
            ValidationOutcome::Rejected(reason) => {
                tracing::debug!(event = %event.event_name, reason = %reason, "Event rejected");
                return Ok(DeliveryOutcome::Rejected(reason));
            }
            ValidationOutcome::Invalid(reason) => {
                tracing::info!(event = %event.event_name, reason = %reason, "Event invalid");
                return Err(Error::Invalid(reason));
            }
        };

        tracing::debug!(
            event = %event.event_name,
            device_type = %outbound.device_type,
            endpoint = %outbound.endpoint,
            "Delivering event"
        );

        match self
            .dispatcher
            .send(&outbound.endpoint, &outbound.payload, &self.settings)
            .await
        {
            Ok(receipt) => {
                tracing::debug!(
                    event = %event.event_name,
                    status = receipt.status,
                    "Delivered event to AppsFlyer"
                );
                Ok(DeliveryOutcome::Delivered {
                    status: receipt.status,
                })
            }
            Err(e) => {
                tracing::warn!(
                    event = %event.event_name,
                    endpoint = %outbound.endpoint,
                    error = %e,
                    "Failed to deliver event to AppsFlyer"
                );
                Err(e)
            }
        }
    }
}
