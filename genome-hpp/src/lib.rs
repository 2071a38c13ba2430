#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Signed redirects to the Genome hosted payment page.
//!
//! This crate assembles a canonical, ordered set of payment parameters,
//! signs it with the merchant's shared secret, and produces the URL the
//! customer's browser is redirected to. The same rules verify the signed
//! parameters the gateway sends back on redirect or webhook.
//!
//! # Overview
//!
//! A [`PaymentRequest`](payment::PaymentRequest) is created with its five
//! mandatory fields and configured through chained setters. A
//! [`HostedPaymentPageManager`](manager::HostedPaymentPageManager) encodes it
//! with the [`CanonicalEncoder`](encoding::CanonicalEncoder), signs the schema
//! fields with the [`SignatureEngine`](signature::SignatureEngine), and appends
//! the `signature` parameter after all other fields.
//!
//! Everything here is synchronous and free of I/O; transport is left to the
//! caller.
//!
//! # Modules
//!
//! - [`encoding`] - Canonical field ordering, query serialization and callback parsing
//! - [`environment`] - Production, sandbox and custom gateway base URLs
//! - [`error`] - Error taxonomy and machine-readable reasons
//! - [`field`] - The closed set of gateway-defined payment fields
//! - [`manager`] - Merchant account and hosted payment page managers
//! - [`nonce`] - Replay-protection nonce
//! - [`payment`] - The payment request container
//! - [`signature`] - Signature modes and HMAC computation
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for build and verify
//! - `cli` - Derives `clap::ValueEnum` for [`SignatureMode`](signature::SignatureMode)

pub mod encoding;
pub mod environment;
pub mod error;
pub mod field;
pub mod manager;
pub mod nonce;
pub mod payment;
pub mod signature;

pub use error::HppError;
pub use manager::{HostedPaymentPageManager, MerchantAccountManager, VerifiedCallback};
pub use payment::PaymentRequest;
pub use signature::SignatureMode;
