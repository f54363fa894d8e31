//! # appsflyer-relay-core
//!
//! Delivers analytics track events to the AppsFlyer server-to-server in-app
//! events API.
//!
//! This library provides:
//! - Domain types for track events
//! - Device type resolution and deliverability checks
//! - Payload construction for the in-app events API
//! - HTTP dispatch with bounded retry
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Pipeline
//!
//! - **Resolve:** pick `ios` or `android` for the event
//! - **Validate:** accept, reject (silently dropped) or mark invalid (an error)
//! - **Build:** endpoint plus the exact wire payload
//! - **Dispatch:** one POST, up to two retries
//!
//! ## Example
//!
//! ```rust,no_run
//! use appsflyer_relay_core::{message, AppsFlyer, Config};
//!
//! # async fn run() -> appsflyer_relay_core::Result<()> {
//! let config = Config::load()?;
//! let adapter = AppsFlyer::from_config(&config)?;
//!
//! let event = message::parse_track(r#"{"event": "Purchase"}"#)?;
//! let outcome = adapter.deliver(&event).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use adapter::{AppsFlyer, DeliveryOutcome, Preview};
pub use config::{Config, Settings};
pub use error::{Error, Result};
pub use payload::{OutboundEvent, Payload};
pub use transport::{HttpTransport, Transport};
pub use types::*;
pub use validate::{InvalidReason, RejectReason, ValidationOutcome};

// Public modules
pub mod adapter;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod message;
pub mod payload;
pub mod transport;
pub mod types;
pub mod validate;
