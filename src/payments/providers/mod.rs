//! Payment gateway implementations
//!
//! Concrete implementations of the PaymentGateway trait for each gateway.

pub mod paypal;
pub mod redsys;
pub mod redsys_sha1;

pub use paypal::PaypalProvider;
pub use redsys::RedsysProvider;
pub use redsys_sha1::RedsysSha1Provider;
