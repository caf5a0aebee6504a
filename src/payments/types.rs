//! Payment gateway types and data structures
//!
//! Common types used across all gateway providers for building redirect
//! payloads and verifying the notifications posted back.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::payments::fees::ceil_to_precision;

/// Payment request configured by the caller before rendering a redirect form.
///
/// Owned exclusively by the calling context; nothing here is shared between
/// requests. Amount carries two-decimal monetary semantics; gateways that
/// want integer minor units convert during field building.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in major units (e.g. 10.50 for ten euros fifty)
    pub amount: f64,
    /// Currency code, ISO 4217 alpha ("EUR") or numeric ("978")
    pub currency: String,
    /// Merchant-side order identifier (padded to the gateway minimum)
    pub order: String,
    /// Gateway operation type; plain payment unless stated otherwise
    pub transaction_type: TransactionType,
    /// Cardholder/buyer name
    pub buyer_name: Option<String>,
    /// Product description (truncated per gateway limit)
    pub description: Option<String>,
    /// Consumer language hint for the gateway's payment page
    pub language: Option<String>,
    /// Redirect target after a successful payment
    pub success_url: String,
    /// Redirect target after a failed or cancelled payment
    pub error_url: String,
    /// Server-to-server notification endpoint
    pub notify_url: String,
}

impl PaymentRequest {
    pub fn new(amount: f64, currency: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            order: order.into(),
            ..Self::default()
        }
    }
}

/// Gateway operation type, carried on the wire as the Redsys numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "0")]
    Payment,
    #[serde(rename = "1")]
    Preauthorization,
    #[serde(rename = "2")]
    Confirmation,
    #[serde(rename = "3")]
    Refund,
    #[serde(rename = "5")]
    Subscription,
    #[serde(rename = "9")]
    Cancellation,
}

impl TransactionType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Payment => "0",
            Self::Preauthorization => "1",
            Self::Confirmation => "2",
            Self::Refund => "3",
            Self::Subscription => "5",
            Self::Cancellation => "9",
        }
    }
}

impl Default for TransactionType {
    fn default() -> Self {
        Self::Payment
    }
}

/// Raw key/value data a gateway posted back.
///
/// Field order is preserved: PayPal's authenticity round-trip must echo the
/// payload to the gateway in exactly the order it was received.
#[derive(Debug, Clone, Default)]
pub struct NotificationPayload {
    fields: Vec<(String, String)>,
}

impl NotificationPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// First value posted under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Verified terminal state of a notification.
///
/// A refund is a recognised outcome, not an anomaly: callers must branch on
/// it explicitly to mirror the refund in their own ledgers.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// Payment confirmed by the gateway, with the computed transaction fee
    Confirmed { fee: f64 },
    /// Gateway reported a refund of a previously collected payment
    Refunded { amount: f64, currency: String },
}

/// How the gateway's transaction fee is computed at verification time.
#[derive(Clone)]
pub enum FeePolicy {
    /// Flat fraction of the verified amount, ceiling-rounded to cents
    FlatPercentage(f64),
    /// Integrator-supplied delegate for anything a flat fraction cannot express
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl FeePolicy {
    pub fn fee_for(&self, amount: f64) -> f64 {
        match self {
            Self::FlatPercentage(rate) => ceil_to_precision(amount * rate, 2),
            Self::Custom(calculator) => calculator(amount),
        }
    }
}

impl fmt::Debug for FeePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatPercentage(rate) => f.debug_tuple("FlatPercentage").field(rate).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Truncates to a maximum number of characters, respecting UTF-8 boundaries.
pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
