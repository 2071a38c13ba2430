//! Command-line front end for the Genome hosted payment page.
//!
//! Reads merchant credentials from a TOML file, then either prints a signed
//! redirect URL or verifies a callback query string.
//!
//! # Modules
//!
//! - [`commands`] — Argument definitions and command handlers
//! - [`config`] — Merchant configuration with environment variable expansion
//! - [`error`] — Command error types

pub mod commands;
pub mod config;
pub mod error;

pub use commands::{Cli, run};
