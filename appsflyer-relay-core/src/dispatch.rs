//! Sends built payloads to the in-app events API
//!
//! One POST per event to `<base_url>/<endpoint>` with the dev key in the
//! `authentication` header. Retries are delegated to the [`Transport`]; the
//! dispatcher only maps the final answer to success or [`Error::Delivery`].

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::payload::Payload;
use crate::transport::{OutboundRequest, Transport};

/// Automatic retries per delivery, after the first attempt
pub const MAX_RETRIES: usize = 2;

/// Header carrying the dev key
pub const AUTH_HEADER: &str = "authentication";

/// Successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// HTTP status returned by AppsFlyer
    pub status: u16,
}

/// Posts payloads through a transport
pub struct Dispatcher<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full URL for an endpoint
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(endpoint))
    }

    /// Deliver one payload.
    pub async fn send(
        &self,
        endpoint: &str,
        payload: &Payload,
        settings: &Settings,
    ) -> Result<DeliveryReceipt> {
        let request = OutboundRequest {
            url: self.url_for(endpoint),
            headers: vec![(AUTH_HEADER.to_string(), settings.dev_key.clone())],
            body: serde_json::to_value(payload)?,
            max_retries: MAX_RETRIES,
        };

        let response = self.transport.post_json(&request).await?;

        if response.is_success() {
            Ok(DeliveryReceipt {
                status: response.status,
            })
        } else {
            Err(Error::Delivery {
                status: Some(response.status),
                message: format!("API error: {}", response.body),
            })
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
