//! HTTP transport for the PayPal notification round-trip
//!
//! The only network interaction in the verification path. Modelled as a
//! trait so tests inject a recording stub and assert that failing checks
//! never reach the wire.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::payments::error::{PaymentError, PaymentResult};

/// Response to a form POST: status code and raw body.
#[derive(Debug, Clone)]
pub struct PostResponse {
    pub status: u16,
    pub body: String,
}

/// Performs a single form POST and returns status plus body.
///
/// No retries: a transport failure is surfaced to the caller as-is.
#[async_trait]
pub trait IpnTransport: Send + Sync {
    async fn post(&self, url: &str, fields: &[(String, String)]) -> PaymentResult<PostResponse>;
}

/// Production transport backed by a shared `reqwest` client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                PaymentError::transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl IpnTransport for HttpTransport {
    async fn post(&self, url: &str, fields: &[(String, String)]) -> PaymentResult<PostResponse> {
        let response = self.client.post(url).form(fields).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(PostResponse { status, body })
    }
}
