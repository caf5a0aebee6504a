//! Payment gateway trait definitions
//!
//! Defines the common interface that all gateway providers must implement.

use crate::payments::error::PaymentResult;
use crate::payments::types::{NotificationPayload, PaymentOutcome, PaymentRequest};
use async_trait::async_trait;

/// Trait for payment gateway implementations
///
/// All gateway providers (PayPal, Redsys HMAC-SHA256, Redsys legacy SHA1)
/// implement this trait to provide a unified request/notification lifecycle.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Endpoint the rendered hidden-field form must POST to
    fn payment_url(&self) -> &str;

    /// Build the outbound field set for a payment request
    ///
    /// The result is an ordered list of `(name, value)` pairs intended for a
    /// hidden-field HTML form submitted to `payment_url()`. Configuration
    /// problems (unknown currency, missing credentials) surface here, before
    /// any signature computation or network interaction.
    fn build_fields(&self, request: &PaymentRequest) -> PaymentResult<Vec<(String, String)>>;

    /// Authenticate and reconcile an inbound gateway notification
    ///
    /// Verifies the payload against the gateway's rules (signature or
    /// round-trip authenticity, response code, amount and currency match),
    /// computes the gateway fee, and distinguishes refund flows from plain
    /// payments.
    ///
    /// # Arguments
    /// * `request` - The payment request the notification should settle
    /// * `payload` - Raw key/value data the gateway posted back
    ///
    /// # Returns
    /// * `PaymentOutcome` - Confirmed with the computed fee, or Refunded
    async fn verify_notification(
        &self,
        request: &PaymentRequest,
        payload: &NotificationPayload,
    ) -> PaymentResult<PaymentOutcome>;
}

/// Duplicate-transaction guard for gateways that redeliver notifications.
///
/// Injected as a single capability so the lookup and the store cannot be
/// configured separately. The adapter performs a plain lookup-then-store;
/// callers that may receive concurrent notifications for the same id must
/// back this with an atomic check-and-set.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Whether `txn_id` has already been processed
    async fn exists(&self, txn_id: &str) -> bool;

    /// Record `txn_id` as processed
    async fn store(&self, txn_id: &str);
}
