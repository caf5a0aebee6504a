use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

/// Typed failures for payment field building and notification verification.
///
/// Every variant carries the context needed to debug the failure without
/// re-deriving it from logs. Field-building failures (`UnknownCurrency`,
/// `MissingConfig`) are raised synchronously before any network interaction.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Notification receiver '{received}' does not match configured merchant '{expected}'")]
    MerchantMismatch { expected: String, received: String },

    #[error("Unexpected payment status '{status}'")]
    UnexpectedStatus { status: String },

    #[error("Amount mismatch: expected {expected_amount} {expected_currency}, notification carries {received_amount} {received_currency}")]
    AmountMismatch {
        expected_amount: String,
        expected_currency: String,
        received_amount: String,
        received_currency: String,
    },

    #[error("Notification is missing required fields: {fields}")]
    MissingFields { fields: String },

    #[error("Signature mismatch: expected '{expected}', received '{received}'")]
    SignatureMismatch { expected: String, received: String },

    #[error("Gateway denied the transaction with response code {code}: {description}")]
    GatewayDenied { code: i64, description: String },

    #[error("Gateway rejected the notification (HTTP {status}): {body}")]
    GatewayRejected { status: u16, body: String },

    #[error("Transaction '{txn_id}' has already been processed")]
    DuplicateTransaction { txn_id: String },

    #[error("Unexpected transaction type '{transaction_type}'")]
    UnexpectedTransactionType { transaction_type: String },

    #[error("Unknown currency code '{code}'")]
    UnknownCurrency { code: String },

    #[error("Missing configuration: {message}")]
    MissingConfig { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl PaymentError {
    pub fn merchant_mismatch(expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self::MerchantMismatch {
            expected: expected.into(),
            received: received.into(),
        }
    }

    pub fn unexpected_status(status: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status: status.into(),
        }
    }

    pub fn missing_fields(fields: impl Into<String>) -> Self {
        Self::MissingFields {
            fields: fields.into(),
        }
    }

    pub fn duplicate_transaction(txn_id: impl Into<String>) -> Self {
        Self::DuplicateTransaction {
            txn_id: txn_id.into(),
        }
    }

    pub fn unexpected_transaction_type(transaction_type: impl Into<String>) -> Self {
        Self::UnexpectedTransactionType {
            transaction_type: transaction_type.into(),
        }
    }

    pub fn unknown_currency(code: impl Into<String>) -> Self {
        Self::UnknownCurrency { code: code.into() }
    }

    pub fn missing_config(message: impl Into<String>) -> Self {
        Self::MissingConfig {
            message: message.into(),
        }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether the failure was detected before the payload could be
    /// authenticated (as opposed to a post-authentication business check).
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::SignatureMismatch { .. } | Self::GatewayRejected { .. }
        )
    }
}

impl From<reqwest::Error> for PaymentError {
    fn from(err: reqwest::Error) -> Self {
        PaymentError::transport(format!("Request error: {}", err))
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(err: serde_json::Error) -> Self {
        PaymentError::encoding(format!("JSON error: {}", err))
    }
}

impl From<base64::DecodeError> for PaymentError {
    fn from(err: base64::DecodeError) -> Self {
        PaymentError::encoding(format!("Base64 error: {}", err))
    }
}

impl From<openssl::error::ErrorStack> for PaymentError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        PaymentError::encoding(format!("Cipher error: {}", err))
    }
}
