//! Payment gateway integration module
//!
//! This module provides a unified interface for payment gateways (PayPal
//! Standard, Redsys virtual POS in both signature schemes) to collect
//! payments and verify the notifications posted back by the gateway.

pub mod codes;
pub mod crypto;
pub mod currency;
pub mod error;
pub mod fees;
pub mod providers;
pub mod traits;
pub mod transport;
pub mod types;

// Re-export commonly used items
pub use error::{PaymentError, PaymentResult};
pub use traits::{PaymentGateway, TransactionStore};
pub use types::{FeePolicy, NotificationPayload, PaymentOutcome, PaymentRequest, TransactionType};
