//! Redsys virtual POS integration (legacy SHA1 scheme)
//!
//! Older terminals sign a flat concatenation of fields with plain SHA1 and
//! post the merchant data as individual form fields instead of the JSON
//! envelope. The scheme predates fee computation and refund/duplicate
//! handling, so this provider only confirms plain payments.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::payments::codes;
use crate::payments::crypto;
use crate::payments::currency;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::fees::to_cents;
use crate::payments::providers::redsys::{
    format_amount, is_authorized, pad_order, parse_notified_amount, REDSYS_PAYMENT_URL,
};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{NotificationPayload, PaymentOutcome, PaymentRequest};

/// Redsys provider configuration (legacy SHA1 scheme)
#[derive(Debug, Clone)]
pub struct RedsysSha1Config {
    /// Merchant code (FUC) assigned by the acquiring bank
    pub merchant_code: String,
    /// Terminal number, usually "1"
    pub terminal: String,
    /// Shared secret appended to the signed concatenation
    pub secret_key: String,
    /// Commerce name shown on the payment page
    pub merchant_name: Option<String>,
    /// Payment endpoint; the test endpoint for integration accounts
    pub payment_url: String,
}

impl Default for RedsysSha1Config {
    fn default() -> Self {
        Self {
            merchant_code: String::new(),
            terminal: "1".to_string(),
            secret_key: String::new(),
            merchant_name: None,
            payment_url: REDSYS_PAYMENT_URL.to_string(),
        }
    }
}

impl RedsysSha1Config {
    /// Create config from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let merchant_code = std::env::var("REDSYS_MERCHANT_CODE").map_err(|_| {
            PaymentError::missing_config("REDSYS_MERCHANT_CODE environment variable is required")
        })?;

        let secret_key = std::env::var("REDSYS_SECRET_KEY").map_err(|_| {
            PaymentError::missing_config("REDSYS_SECRET_KEY environment variable is required")
        })?;

        Ok(Self {
            merchant_code,
            terminal: std::env::var("REDSYS_TERMINAL").unwrap_or_else(|_| "1".to_string()),
            secret_key,
            merchant_name: std::env::var("REDSYS_MERCHANT_NAME").ok(),
            payment_url: std::env::var("REDSYS_PAYMENT_URL")
                .unwrap_or_else(|_| REDSYS_PAYMENT_URL.to_string()),
        })
    }
}

/// Redsys gateway provider, legacy SHA1 scheme
pub struct RedsysSha1Provider {
    config: RedsysSha1Config,
}

impl RedsysSha1Provider {
    pub fn new(config: RedsysSha1Config) -> Self {
        Self { config }
    }

    pub fn from_env() -> PaymentResult<Self> {
        Ok(Self::new(RedsysSha1Config::from_env()?))
    }

    /// Request-side signature: SHA1 over
    /// amount + order + merchant code + currency + transaction type +
    /// notification URL + secret, uppercase hex.
    fn request_signature(
        &self,
        amount: &str,
        order: &str,
        currency_numeric: u16,
        transaction_type: &str,
        merchant_url: &str,
    ) -> String {
        crypto::sha1_hex_upper(&format!(
            "{}{}{}{}{}{}{}",
            amount,
            order,
            self.config.merchant_code,
            currency_numeric,
            transaction_type,
            merchant_url,
            self.config.secret_key
        ))
    }

    /// Notification-side signature: SHA1 over
    /// amount + order + merchant code + currency + response + secret,
    /// uppercase hex.
    fn notification_signature(
        &self,
        amount: &str,
        order: &str,
        currency: &str,
        response: &str,
    ) -> String {
        crypto::sha1_hex_upper(&format!(
            "{}{}{}{}{}{}",
            amount, order, self.config.merchant_code, currency, response, self.config.secret_key
        ))
    }
}

#[async_trait]
impl PaymentGateway for RedsysSha1Provider {
    fn name(&self) -> &'static str {
        "redsys-sha1"
    }

    fn payment_url(&self) -> &str {
        &self.config.payment_url
    }

    fn build_fields(&self, request: &PaymentRequest) -> PaymentResult<Vec<(String, String)>> {
        let currency_numeric = currency::resolve_numeric(&request.currency)?;
        let order = pad_order(&request.order);
        let amount = format_amount(request.amount, currency_numeric);
        let transaction_type = request.transaction_type.code();

        let signature = self.request_signature(
            &amount,
            &order,
            currency_numeric,
            transaction_type,
            &request.notify_url,
        );

        info!(
            "Built Redsys legacy payment fields: order={} amount={}",
            order, amount
        );

        let mut fields = vec![
            ("Ds_Merchant_Amount".to_string(), amount),
            ("Ds_Merchant_Order".to_string(), order),
            (
                "Ds_Merchant_MerchantCode".to_string(),
                self.config.merchant_code.clone(),
            ),
            (
                "Ds_Merchant_Currency".to_string(),
                currency_numeric.to_string(),
            ),
            (
                "Ds_Merchant_TransactionType".to_string(),
                transaction_type.to_string(),
            ),
            ("Ds_Merchant_Terminal".to_string(), self.config.terminal.clone()),
            (
                "Ds_Merchant_MerchantURL".to_string(),
                request.notify_url.clone(),
            ),
            ("Ds_Merchant_MerchantSignature".to_string(), signature),
            ("Ds_Merchant_UrlOK".to_string(), request.success_url.clone()),
            ("Ds_Merchant_UrlKO".to_string(), request.error_url.clone()),
        ];

        if let Some(name) = &self.config.merchant_name {
            fields.push(("Ds_Merchant_MerchantName".to_string(), name.clone()));
        }
        if let Some(description) = &request.description {
            fields.push((
                "Ds_Merchant_ProductDescription".to_string(),
                description.clone(),
            ));
        }
        if let Some(buyer) = &request.buyer_name {
            fields.push(("Ds_Merchant_Titular".to_string(), buyer.clone()));
        }
        if let Some(language) = &request.language {
            fields.push(("Ds_Merchant_ConsumerLanguage".to_string(), language.clone()));
        }

        Ok(fields)
    }

    async fn verify_notification(
        &self,
        request: &PaymentRequest,
        payload: &NotificationPayload,
    ) -> PaymentResult<PaymentOutcome> {
        const REQUIRED: [&str; 5] = [
            "Ds_Amount",
            "Ds_Order",
            "Ds_Currency",
            "Ds_Response",
            "Ds_Signature",
        ];
        let missing: Vec<&str> = REQUIRED
            .iter()
            .copied()
            .filter(|field| payload.get(field).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PaymentError::missing_fields(missing.join(", ")));
        }

        let amount_raw = payload.get("Ds_Amount").unwrap_or_default();
        let order = payload.get("Ds_Order").unwrap_or_default();
        let notified_currency = payload.get("Ds_Currency").unwrap_or_default();
        let response = payload.get("Ds_Response").unwrap_or_default();
        let received_signature = payload.get("Ds_Signature").unwrap_or_default();

        let expected_signature =
            self.notification_signature(amount_raw, order, notified_currency, response);
        if !crypto::constant_time_eq(
            &expected_signature,
            &received_signature.to_ascii_uppercase(),
        ) {
            warn!("Redsys legacy signature mismatch for order {}", order);
            return Err(PaymentError::SignatureMismatch {
                expected: expected_signature,
                received: received_signature.to_string(),
            });
        }

        let response_code: i64 = response
            .trim()
            .parse()
            .map_err(|_| PaymentError::unexpected_status(response))?;
        if !is_authorized(response_code) {
            return Err(PaymentError::GatewayDenied {
                code: response_code,
                description: codes::describe_response(response_code).to_string(),
            });
        }

        let notified_numeric: u16 = notified_currency
            .trim()
            .parse()
            .map_err(|_| PaymentError::unknown_currency(notified_currency))?;
        let notified_alpha = currency::alpha_for(notified_numeric)?;
        let notified_amount = parse_notified_amount(amount_raw, notified_alpha)?;

        let request_alpha = currency::alpha_for(currency::resolve_numeric(&request.currency)?)?;
        if to_cents(notified_amount) != to_cents(request.amount) || notified_alpha != request_alpha
        {
            return Err(PaymentError::AmountMismatch {
                expected_amount: format!("{:.2}", request.amount),
                expected_currency: request_alpha.to_string(),
                received_amount: format!("{:.2}", notified_amount),
                received_currency: notified_alpha.to_string(),
            });
        }

        info!("Redsys legacy notification verified: order={}", order);

        // The legacy scheme carries no fee or refund information
        Ok(PaymentOutcome::Confirmed { fee: 0.0 })
    }
}
