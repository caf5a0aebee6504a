//! Redsys virtual POS integration (HMAC-SHA256 scheme)
//!
//! Current Redsys signature scheme: the merchant parameters travel as
//! base64-encoded JSON signed with HMAC-SHA256 under a key derived per
//! order. Notifications come back in the same envelope and are
//! authenticated before any decoded field is trusted.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::payments::codes;
use crate::payments::crypto;
use crate::payments::currency::{self, EUR_NUMERIC};
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::fees::to_cents;
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    truncate_chars, FeePolicy, NotificationPayload, PaymentOutcome, PaymentRequest,
    TransactionType,
};

pub const SIGNATURE_VERSION: &str = "HMAC_SHA256_V1";

pub const REDSYS_PAYMENT_URL: &str = "https://sis.redsys.es/sis/realizarPago";
pub const REDSYS_TEST_PAYMENT_URL: &str = "https://sis-t.redsys.es:25443/sis/realizarPago";

const MERCHANT_NAME_MAX_CHARS: usize = 25;
const DESCRIPTION_MAX_CHARS: usize = 125;
const TITULAR_MAX_CHARS: usize = 60;
const ORDER_MIN_CHARS: usize = 4;

/// Redsys provider configuration (HMAC-SHA256 scheme)
#[derive(Debug, Clone)]
pub struct RedsysConfig {
    /// Merchant code (FUC) assigned by the acquiring bank
    pub merchant_code: String,
    /// Terminal number, usually "1"
    pub terminal: String,
    /// Base64-encoded 3DES merchant secret
    pub secret_key: String,
    /// Commerce name shown on the payment page
    pub merchant_name: Option<String>,
    /// Payment endpoint; the test endpoint for integration accounts
    pub payment_url: String,
    /// Optional payment-method restriction (`DS_MERCHANT_PAYMETHODS`)
    pub pay_methods: Option<String>,
    /// Transaction fee computation, resolved at verification time
    pub fee: Option<FeePolicy>,
}

impl Default for RedsysConfig {
    fn default() -> Self {
        Self {
            merchant_code: String::new(),
            terminal: "1".to_string(),
            secret_key: String::new(),
            merchant_name: None,
            payment_url: REDSYS_PAYMENT_URL.to_string(),
            pay_methods: None,
            fee: None,
        }
    }
}

impl RedsysConfig {
    /// Create config from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let merchant_code = std::env::var("REDSYS_MERCHANT_CODE").map_err(|_| {
            PaymentError::missing_config("REDSYS_MERCHANT_CODE environment variable is required")
        })?;

        let secret_key = std::env::var("REDSYS_SECRET_KEY").map_err(|_| {
            PaymentError::missing_config("REDSYS_SECRET_KEY environment variable is required")
        })?;

        let fee = std::env::var("REDSYS_FEE_PERCENTAGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(FeePolicy::FlatPercentage);

        Ok(Self {
            merchant_code,
            terminal: std::env::var("REDSYS_TERMINAL").unwrap_or_else(|_| "1".to_string()),
            secret_key,
            merchant_name: std::env::var("REDSYS_MERCHANT_NAME").ok(),
            payment_url: std::env::var("REDSYS_PAYMENT_URL")
                .unwrap_or_else(|_| REDSYS_PAYMENT_URL.to_string()),
            pay_methods: std::env::var("REDSYS_PAY_METHODS").ok(),
            fee,
        })
    }
}

/// Merchant parameter envelope, serialised to JSON and base64-encoded
/// into `Ds_MerchantParameters`.
#[derive(Debug, Serialize)]
struct MerchantParameters {
    #[serde(rename = "DS_MERCHANT_AMOUNT")]
    amount: String,
    #[serde(rename = "DS_MERCHANT_ORDER")]
    order: String,
    #[serde(rename = "DS_MERCHANT_MERCHANTCODE")]
    merchant_code: String,
    #[serde(rename = "DS_MERCHANT_CURRENCY")]
    currency: String,
    #[serde(rename = "DS_MERCHANT_TRANSACTIONTYPE")]
    transaction_type: String,
    #[serde(rename = "DS_MERCHANT_TERMINAL")]
    terminal: String,
    #[serde(rename = "DS_MERCHANT_MERCHANTURL")]
    merchant_url: String,
    #[serde(rename = "DS_MERCHANT_MERCHANTNAME", skip_serializing_if = "Option::is_none")]
    merchant_name: Option<String>,
    #[serde(
        rename = "DS_MERCHANT_PRODUCTDESCRIPTION",
        skip_serializing_if = "Option::is_none"
    )]
    product_description: Option<String>,
    #[serde(rename = "DS_MERCHANT_TITULAR", skip_serializing_if = "Option::is_none")]
    titular: Option<String>,
    #[serde(
        rename = "DS_MERCHANT_CONSUMERLANGUAGE",
        skip_serializing_if = "Option::is_none"
    )]
    consumer_language: Option<String>,
    #[serde(rename = "DS_MERCHANT_PAYMETHODS", skip_serializing_if = "Option::is_none")]
    pay_methods: Option<String>,
    #[serde(rename = "DS_MERCHANT_URLOK")]
    url_ok: String,
    #[serde(rename = "DS_MERCHANT_URLKO")]
    url_ko: String,
}

/// Decoded notification parameters. Only read after the signature over the
/// encoded form has been verified.
#[derive(Debug, Deserialize)]
struct NotificationParameters {
    #[serde(rename = "Ds_Amount")]
    amount: String,
    #[serde(rename = "Ds_Order")]
    order: String,
    #[serde(rename = "Ds_Currency")]
    currency: String,
    #[serde(rename = "Ds_Response")]
    response: String,
    #[serde(rename = "Ds_TransactionType", default)]
    transaction_type: String,
}

/// Redsys gateway provider, HMAC-SHA256 scheme
pub struct RedsysProvider {
    config: RedsysConfig,
}

impl RedsysProvider {
    pub fn new(config: RedsysConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> PaymentResult<Self> {
        Ok(Self::new(RedsysConfig::from_env()?))
    }
}

/// Two-decimal amount string; EUR travels as integer minor units, so the
/// decimal point is stripped and the last two digits are the cents.
pub(super) fn format_amount(amount: f64, currency_numeric: u16) -> String {
    let formatted = format!("{:.2}", amount);
    if currency_numeric == EUR_NUMERIC {
        formatted.replace('.', "")
    } else {
        formatted
    }
}

/// Left-pads the order id with zeroes to the gateway minimum.
pub(super) fn pad_order(order: &str) -> String {
    format!("{:0>width$}", order, width = ORDER_MIN_CHARS)
}

/// Recovers the major-unit amount a notification carries.
pub(super) fn parse_notified_amount(raw: &str, alpha: &str) -> PaymentResult<f64> {
    let mut amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PaymentError::encoding(format!("Unparseable notification amount '{}'", raw)))?;
    if alpha == "EUR" {
        amount /= 100.0;
    }
    Ok(amount)
}

/// Whether a Redsys response code means the operation was authorised.
pub(super) fn is_authorized(code: i64) -> bool {
    (0..=99).contains(&code) || code == 900
}

#[async_trait]
impl PaymentGateway for RedsysProvider {
    fn name(&self) -> &'static str {
        "redsys"
    }

    fn payment_url(&self) -> &str {
        &self.config.payment_url
    }

    fn build_fields(&self, request: &PaymentRequest) -> PaymentResult<Vec<(String, String)>> {
        // Currency resolution happens before any signature work so a
        // misconfigured request fails as a configuration error.
        let currency_numeric = currency::resolve_numeric(&request.currency)?;
        let order = pad_order(&request.order);

        let parameters = MerchantParameters {
            amount: format_amount(request.amount, currency_numeric),
            order: order.clone(),
            merchant_code: self.config.merchant_code.clone(),
            currency: currency_numeric.to_string(),
            transaction_type: request.transaction_type.code().to_string(),
            terminal: self.config.terminal.clone(),
            merchant_url: request.notify_url.clone(),
            merchant_name: self
                .config
                .merchant_name
                .as_deref()
                .map(|name| truncate_chars(name, MERCHANT_NAME_MAX_CHARS)),
            product_description: request
                .description
                .as_deref()
                .map(|description| truncate_chars(description, DESCRIPTION_MAX_CHARS)),
            titular: request
                .buyer_name
                .as_deref()
                .map(|name| truncate_chars(name, TITULAR_MAX_CHARS)),
            consumer_language: request.language.clone(),
            pay_methods: self.config.pay_methods.clone(),
            url_ok: request.success_url.clone(),
            url_ko: request.error_url.clone(),
        };

        let encoded = BASE64.encode(serde_json::to_string(&parameters)?);
        let signature = crypto::redsys_signature(&self.config.secret_key, &order, &encoded)?;

        info!(
            "Built Redsys payment fields: order={} amount={} currency={}",
            order, parameters.amount, parameters.currency
        );

        Ok(vec![
            (
                "Ds_SignatureVersion".to_string(),
                SIGNATURE_VERSION.to_string(),
            ),
            ("Ds_MerchantParameters".to_string(), encoded),
            ("Ds_Signature".to_string(), signature),
        ])
    }

    async fn verify_notification(
        &self,
        request: &PaymentRequest,
        payload: &NotificationPayload,
    ) -> PaymentResult<PaymentOutcome> {
        let (params_b64, received_signature) = match (
            payload.get("Ds_MerchantParameters"),
            payload.get("Ds_Signature"),
        ) {
            (Some(params), Some(signature)) => (params, signature),
            _ => {
                return Err(PaymentError::missing_fields(
                    "Ds_MerchantParameters, Ds_Signature",
                ))
            }
        };

        let decoded = BASE64.decode(params_b64)?;
        let parameters: NotificationParameters = serde_json::from_slice(&decoded)?;

        // The signature is keyed on the order id the notification itself
        // carries, and must match before any decoded field is trusted.
        let expected_signature =
            crypto::redsys_signature(&self.config.secret_key, &parameters.order, params_b64)?;
        if !crypto::constant_time_eq(&expected_signature, received_signature) {
            warn!(
                "Redsys signature mismatch for order {}",
                parameters.order
            );
            return Err(PaymentError::SignatureMismatch {
                expected: expected_signature,
                received: received_signature.to_string(),
            });
        }

        let response_code: i64 = parameters
            .response
            .trim()
            .parse()
            .map_err(|_| PaymentError::unexpected_status(&parameters.response))?;
        if !is_authorized(response_code) {
            return Err(PaymentError::GatewayDenied {
                code: response_code,
                description: codes::describe_response(response_code).to_string(),
            });
        }

        let notified_numeric: u16 = parameters
            .currency
            .trim()
            .parse()
            .map_err(|_| PaymentError::unknown_currency(&parameters.currency))?;
        let notified_alpha = currency::alpha_for(notified_numeric)?;
        let notified_amount = parse_notified_amount(&parameters.amount, notified_alpha)?;

        let request_alpha = currency::alpha_for(currency::resolve_numeric(&request.currency)?)?;
        if to_cents(notified_amount) != to_cents(request.amount)
            || notified_alpha != request_alpha
        {
            return Err(PaymentError::AmountMismatch {
                expected_amount: format!("{:.2}", request.amount),
                expected_currency: request_alpha.to_string(),
                received_amount: format!("{:.2}", notified_amount),
                received_currency: notified_alpha.to_string(),
            });
        }

        let fee = match &self.config.fee {
            Some(policy) => policy.fee_for(notified_amount),
            None => 0.0,
        };

        let transaction_type = parameters.transaction_type.as_str();
        if transaction_type == TransactionType::Refund.code() {
            info!(
                "Redsys notification is a refund: order={} amount={}",
                parameters.order, notified_amount
            );
            return Ok(PaymentOutcome::Refunded {
                amount: notified_amount,
                currency: notified_alpha.to_string(),
            });
        }
        if transaction_type != TransactionType::Payment.code() {
            return Err(PaymentError::unexpected_transaction_type(transaction_type));
        }

        info!(
            "Redsys notification verified: order={} fee={}",
            parameters.order, fee
        );
        Ok(PaymentOutcome::Confirmed { fee })
    }
}
