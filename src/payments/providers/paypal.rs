//! PayPal Standard payments integration
//!
//! Builds the hidden-field Buy Now form and verifies Instant Payment
//! Notifications by echoing them back to PayPal, which answers with a
//! literal `VERIFIED` or `INVALID` token.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::fees::to_cents;
use crate::payments::traits::{PaymentGateway, TransactionStore};
use crate::payments::transport::{HttpTransport, IpnTransport};
use crate::payments::types::{
    truncate_chars, NotificationPayload, PaymentOutcome, PaymentRequest,
};

const CMD_BUY_NOW: &str = "_xclick";
const CMD_NOTIFY_VALIDATE: &str = "_notify-validate";
const ITEM_NAME_MAX_CHARS: usize = 125;

pub const PAYPAL_PAYMENT_URL: &str = "https://www.paypal.com/cgi-bin/webscr";
pub const PAYPAL_SANDBOX_PAYMENT_URL: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr";

/// PayPal provider configuration
#[derive(Debug, Clone)]
pub struct PaypalConfig {
    /// Merchant account email (the `business` field, and the address
    /// notifications must name as receiver)
    pub business: String,
    /// Payment endpoint; the sandbox URL for test accounts
    pub payment_url: String,
    /// Round-trip request timeout in seconds
    pub timeout_secs: u64,
    /// Checkout page logo (`cpp_logo_image`)
    pub logo_url: Option<String>,
    /// Item image shown on the checkout page (`image_url`)
    pub image_url: Option<String>,
    /// Text on the return button (`cbt`)
    pub return_button_text: Option<String>,
}

impl Default for PaypalConfig {
    fn default() -> Self {
        Self {
            business: String::new(),
            payment_url: PAYPAL_PAYMENT_URL.to_string(),
            timeout_secs: 30,
            logo_url: None,
            image_url: None,
            return_button_text: None,
        }
    }
}

impl PaypalConfig {
    /// Create config from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let business = std::env::var("PAYPAL_BUSINESS").map_err(|_| {
            PaymentError::missing_config("PAYPAL_BUSINESS environment variable is required")
        })?;

        let payment_url = std::env::var("PAYPAL_PAYMENT_URL")
            .unwrap_or_else(|_| PAYPAL_PAYMENT_URL.to_string());

        let timeout_secs = std::env::var("PAYPAL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            business,
            payment_url,
            timeout_secs,
            logo_url: std::env::var("PAYPAL_LOGO_URL").ok(),
            image_url: std::env::var("PAYPAL_IMAGE_URL").ok(),
            return_button_text: std::env::var("PAYPAL_RETURN_BUTTON_TEXT").ok(),
        })
    }
}

/// PayPal Standard gateway provider
pub struct PaypalProvider {
    config: PaypalConfig,
    transport: Arc<dyn IpnTransport>,
    txn_store: Option<Arc<dyn TransactionStore>>,
}

impl PaypalProvider {
    /// Create a new PayPal provider instance
    pub fn new(config: PaypalConfig) -> PaymentResult<Self> {
        let transport = Arc::new(HttpTransport::new(config.timeout_secs)?);
        Ok(Self {
            config,
            transport,
            txn_store: None,
        })
    }

    /// Create provider from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(PaypalConfig::from_env()?)
    }

    /// Replace the round-trip transport (used by tests)
    pub fn with_transport(mut self, transport: Arc<dyn IpnTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Enable duplicate-transaction detection.
    ///
    /// Without a store the duplicate check is skipped entirely, a trade-off
    /// the integrator accepts explicitly by not providing one.
    pub fn with_transaction_store(mut self, store: Arc<dyn TransactionStore>) -> Self {
        self.txn_store = Some(store);
        self
    }
}

#[async_trait]
impl PaymentGateway for PaypalProvider {
    fn name(&self) -> &'static str {
        "paypal"
    }

    fn payment_url(&self) -> &str {
        &self.config.payment_url
    }

    fn build_fields(&self, request: &PaymentRequest) -> PaymentResult<Vec<(String, String)>> {
        let item_name = request
            .description
            .as_deref()
            .unwrap_or(&request.order);

        let mut fields = vec![
            ("cmd".to_string(), CMD_BUY_NOW.to_string()),
            ("business".to_string(), self.config.business.clone()),
            ("amount".to_string(), format!("{:.2}", request.amount)),
            (
                "currency_code".to_string(),
                request.currency.to_ascii_uppercase(),
            ),
            ("custom".to_string(), request.order.clone()),
            ("notify_url".to_string(), request.notify_url.clone()),
            (
                "item_name".to_string(),
                truncate_chars(item_name, ITEM_NAME_MAX_CHARS),
            ),
            ("no_shipping".to_string(), "1".to_string()),
            ("no_note".to_string(), "1".to_string()),
            ("return".to_string(), request.success_url.clone()),
            ("cancel_return".to_string(), request.error_url.clone()),
            ("charset".to_string(), "utf-8".to_string()),
        ];

        if let Some(logo_url) = &self.config.logo_url {
            fields.push(("cpp_logo_image".to_string(), logo_url.clone()));
        }
        if let Some(image_url) = &self.config.image_url {
            fields.push(("image_url".to_string(), image_url.clone()));
        }
        if let Some(cbt) = &self.config.return_button_text {
            fields.push(("cbt".to_string(), cbt.clone()));
        }

        Ok(fields)
    }

    async fn verify_notification(
        &self,
        request: &PaymentRequest,
        payload: &NotificationPayload,
    ) -> PaymentResult<PaymentOutcome> {
        info!(
            "Verifying PayPal notification: order={} amount={} {}",
            request.order, request.amount, request.currency
        );

        // Receiver check comes first: a notification for another merchant
        // account must never reach the network round-trip.
        let receiver = payload.get("receiver_email").unwrap_or_default();
        if receiver != self.config.business {
            return Err(PaymentError::merchant_mismatch(
                &self.config.business,
                receiver,
            ));
        }

        let status = payload.get("payment_status").unwrap_or_default();
        let is_refund = status.eq_ignore_ascii_case("refunded")
            || status.eq_ignore_ascii_case("reversed");
        if !is_refund && !status.eq_ignore_ascii_case("completed") {
            return Err(PaymentError::unexpected_status(status));
        }

        // Refunds arrive with the gross negated; financial validation still
        // applies before the refund is surfaced.
        let expected_gross = if is_refund {
            -request.amount
        } else {
            request.amount
        };
        let gross_raw = payload.get("mc_gross").unwrap_or_default();
        let currency_raw = payload.get("mc_currency").unwrap_or_default();
        let gross_matches = gross_raw
            .trim()
            .parse::<f64>()
            .map(|gross| to_cents(gross) == to_cents(expected_gross))
            .unwrap_or(false);
        if !gross_matches || !currency_raw.eq_ignore_ascii_case(&request.currency) {
            return Err(PaymentError::AmountMismatch {
                expected_amount: format!("{:.2}", expected_gross),
                expected_currency: request.currency.clone(),
                received_amount: gross_raw.to_string(),
                received_currency: currency_raw.to_string(),
            });
        }

        // Authenticity round-trip: echo the payload back, in the order it
        // arrived, with cmd=_notify-validate appended. Single attempt.
        let mut echo: Vec<(String, String)> = payload.pairs().to_vec();
        echo.push((
            "cmd".to_string(),
            CMD_NOTIFY_VALIDATE.to_string(),
        ));
        let response = self.transport.post(&self.config.payment_url, &echo).await?;
        if response.status != 200 || !response.body.trim().eq_ignore_ascii_case("VERIFIED") {
            warn!(
                "PayPal refused the notification echo: status={} body={}",
                response.status, response.body
            );
            return Err(PaymentError::GatewayRejected {
                status: response.status,
                body: response.body,
            });
        }

        // Absent or unparseable mc_fee resolves to 0
        let fee = payload
            .get("mc_fee")
            .and_then(|fee| fee.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        if is_refund {
            info!(
                "PayPal notification is a refund: order={} amount={}",
                request.order, request.amount
            );
            return Ok(PaymentOutcome::Refunded {
                amount: request.amount,
                currency: request.currency.clone(),
            });
        }

        if let Some(store) = &self.txn_store {
            let txn_id = payload.get("txn_id").unwrap_or_default();
            if store.exists(txn_id).await {
                warn!("Duplicate PayPal transaction: txn_id={}", txn_id);
                return Err(PaymentError::duplicate_transaction(txn_id));
            }
            store.store(txn_id).await;
        }

        info!(
            "PayPal notification verified: order={} fee={}",
            request.order, fee
        );
        Ok(PaymentOutcome::Confirmed { fee })
    }
}
