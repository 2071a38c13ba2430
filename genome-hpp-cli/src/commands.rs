//! Command-line arguments and command handlers.
//!
//! - `build` — prints a signed redirect URL for the given payment
//! - `verify` — checks a callback query string and prints its payment data as JSON

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use genome_hpp::manager::HostedPaymentPageManager;
use genome_hpp::nonce::Nonce;
use genome_hpp::signature::SignatureMode;
use genome_hpp::{HppError, PaymentRequest};
use rust_decimal::Decimal;

use crate::config::{DEFAULT_CONFIG_PATH, MerchantConfig};
use crate::error::CliError;

/// Build and verify Genome hosted payment page redirects.
#[derive(Debug, Parser)]
#[command(name = "genome-hpp-cli", version, about)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Overrides the signature mode from the configuration file.
    #[arg(long, value_enum)]
    pub signature_mode: Option<SignatureMode>,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a signed redirect URL.
    Build(BuildArgs),
    /// Verify a callback query string or URL.
    Verify {
        /// Query string or full URL received from the gateway.
        query: String,
    },
}

/// Payment data for the `build` command.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Order identifier on the merchant side.
    #[arg(long)]
    pub order_id: String,

    /// Customer identifier on the merchant side.
    #[arg(long)]
    pub user_id: String,

    /// Merchant category code.
    #[arg(long)]
    pub mcc: String,

    /// ISO 4217 alpha-3 currency code.
    #[arg(long)]
    pub currency: String,

    /// Payment amount.
    #[arg(long)]
    pub amount: Decimal,

    /// Explicit nonce.
    #[arg(long, conflicts_with = "auto_nonce")]
    pub nonce: Option<u64>,

    /// Use the current Unix time as nonce.
    #[arg(long)]
    pub auto_nonce: bool,

    /// Redirect target after a successful payment.
    #[arg(long, requires = "failure_url")]
    pub success_url: Option<String>,

    /// Redirect target after a failed payment.
    #[arg(long, requires = "success_url")]
    pub failure_url: Option<String>,

    /// Payment description.
    #[arg(long)]
    pub description: Option<String>,

    /// Customer phone.
    #[arg(long)]
    pub phone: Option<String>,

    /// Customer email.
    #[arg(long)]
    pub email: Option<String>,

    /// Customer first name.
    #[arg(long, requires = "last_name")]
    pub first_name: Option<String>,

    /// Customer last name.
    #[arg(long, requires = "first_name")]
    pub last_name: Option<String>,

    /// Show the phone input.
    #[arg(long)]
    pub show_phone: Option<bool>,

    /// Show the email input.
    #[arg(long)]
    pub show_email: Option<bool>,

    /// Show the description.
    #[arg(long)]
    pub show_description: Option<bool>,

    /// Show the GDPR agreement.
    #[arg(long)]
    pub show_gdpr_agreement: Option<bool>,

    /// Custom field, may be repeated.
    #[arg(long = "custom", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub custom: Vec<(String, String)>,
}

impl BuildArgs {
    /// Converts the arguments into a payment request.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidInput`] for an invalid currency, amount, or
    /// custom field key.
    pub fn to_request(&self) -> Result<PaymentRequest, HppError> {
        let mut request = PaymentRequest::new(
            &self.order_id,
            &self.user_id,
            &self.mcc,
            &self.currency,
            self.amount,
        )?;

        if let Some(nonce) = self.nonce {
            request.set_nonce(Nonce::new(nonce))?;
        } else if self.auto_nonce {
            request.set_nonce_automatically()?;
        }
        if let (Some(success), Some(failure)) = (&self.success_url, &self.failure_url) {
            request.set_redirect_urls(success, failure);
        }
        if let Some(description) = &self.description {
            request.set_description(description);
        }
        if let Some(phone) = &self.phone {
            request.set_phone(phone);
        }
        if let Some(email) = &self.email {
            request.set_email(email);
        }
        if let (Some(first), Some(last)) = (&self.first_name, &self.last_name) {
            request.set_first_last_name(first, last);
        }
        if let Some(show) = self.show_phone {
            request.set_show_phone(show);
        }
        if let Some(show) = self.show_email {
            request.set_show_email(show);
        }
        if let Some(show) = self.show_description {
            request.set_show_description(show);
        }
        if let Some(show) = self.show_gdpr_agreement {
            request.set_show_gdpr_agreement(show);
        }
        request.add_custom_fields(self.custom.iter().cloned())?;
        Ok(request)
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

/// Runs the selected command and returns what should be printed.
///
/// # Errors
///
/// Returns an error if the configuration is unusable or the command fails.
pub fn run(cli: &Cli) -> Result<String, CliError> {
    let mut config = MerchantConfig::load_from(&cli.config)?;
    if let Some(mode) = cli.signature_mode {
        config.signature_mode = mode;
    }
    tracing::info!(
        environment = %config.environment,
        mode = %config.signature_mode,
        "Loaded configuration"
    );
    let manager = config.hosted_payment_page_manager()?;

    match &cli.command {
        Command::Build(args) => build(&manager, args),
        Command::Verify { query } => verify(&manager, query),
    }
}

/// Returns the signed redirect URL for `build`.
///
/// # Errors
///
/// Returns an error if the request is invalid or cannot be signed.
pub fn build(manager: &HostedPaymentPageManager, args: &BuildArgs) -> Result<String, CliError> {
    let request = args.to_request()?;
    let url = manager.build_redirect_url(&request)?;
    tracing::info!(order_id = %request.order_id(), "Built redirect url");
    Ok(url.into())
}

/// Returns the verified payment data of `verify` as pretty JSON.
///
/// # Errors
///
/// Returns an error if the signature does not verify or the payload is malformed.
pub fn verify(manager: &HostedPaymentPageManager, query: &str) -> Result<String, CliError> {
    let verified = manager.verify_callback_query(query)?;
    tracing::info!(order_id = %verified.request.order_id(), "Callback verified");
    let body = serde_json::json!({
        "request": verified.request,
        "extra": verified.extra,
    });
    Ok(serde_json::to_string_pretty(&body)?)
}
