//! Merchant payment collection backend
//!
//! Prepares signed redirect payloads for third-party payment gateways and
//! verifies the asynchronous notifications they post back. The library
//! never moves money: it builds the hidden-field form a merchant page
//! renders, then authenticates and reconciles the gateway's callback.

pub mod api;
pub mod config;
pub mod payments;
