//! Merchant credential configuration.
//!
//! Loads credentials from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! login = "merchant@example.com"
//! password = "$GENOME_PASSWORD"
//! environment = "sandbox"
//! api_key = "pk_test_123"
//! api_secret = "${GENOME_API_SECRET}"
//! signature_mode = "MODE_A_TS"
//! nonce_tolerance_secs = 600
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `genome.toml`)
//! - `GENOME_API_KEY` — Override the API key
//! - `GENOME_API_SECRET` — Override the API secret
//! - Any variable referenced by `$VAR` in the config file

use std::fmt;
use std::path::Path;

use genome_hpp::environment::Environment;
use genome_hpp::manager::{HostedPaymentPageManager, MerchantAccountManager};
use genome_hpp::signature::SignatureMode;
use serde::Deserialize;

use crate::error::CliError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "genome.toml";

/// Merchant credentials and signing settings.
#[derive(Clone, Deserialize)]
pub struct MerchantConfig {
    /// Merchant account login.
    #[serde(default)]
    pub login: String,

    /// Merchant account password.
    #[serde(default)]
    pub password: String,

    /// `production`, `sandbox`, or a base URL (default: `production`).
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Hosted payment page API key.
    #[serde(default)]
    pub api_key: String,

    /// Hosted payment page API secret.
    #[serde(default)]
    pub api_secret: String,

    /// Signature mode (default: `MODE_A_TS`).
    #[serde(default)]
    pub signature_mode: SignatureMode,

    /// Accepted distance in seconds between a callback nonce and now.
    #[serde(default)]
    pub nonce_tolerance_secs: Option<u64>,
}

impl fmt::Debug for MerchantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantConfig")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("environment", &self.environment)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("signature_mode", &self.signature_mode)
            .field("nonce_tolerance_secs", &self.nonce_tolerance_secs)
            .finish()
    }
}

fn default_environment() -> String {
    "production".to_owned()
}

impl MerchantConfig {
    /// Loads configuration from a specific file path.
    ///
    /// A missing file is treated as empty, so credentials may come from
    /// environment overrides alone. `GENOME_API_KEY` and `GENOME_API_SECRET`
    /// override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let content = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let mut config = Self::parse(&content, |name| std::env::var(name).ok())?;

        if let Ok(api_key) = std::env::var("GENOME_API_KEY") {
            config.api_key = api_key;
        }
        if let Ok(api_secret) = std::env::var("GENOME_API_SECRET") {
            config.api_secret = api_secret;
        }

        Ok(config)
    }

    /// Parses TOML after expanding variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expanded text is not valid configuration.
    pub fn parse<F>(content: &str, lookup: F) -> Result<Self, CliError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, lookup);
        Ok(toml::from_str(&expanded)?)
    }

    /// Builds the hosted payment page manager described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] if the API key or secret is empty or still
    /// an unresolved `$VAR` reference, or if the environment is invalid.
    pub fn hosted_payment_page_manager(&self) -> Result<HostedPaymentPageManager, CliError> {
        require_resolved("api_key", &self.api_key)?;
        require_resolved("api_secret", &self.api_secret)?;

        let environment: Environment = self.environment.parse()?;
        let account = MerchantAccountManager::new(&self.login, &self.password, Some(environment));
        let manager = account.hosted_payment_page_manager(
            &self.api_key,
            &self.api_secret,
            self.signature_mode,
        );

        Ok(match self.nonce_tolerance_secs {
            Some(secs) => manager.with_nonce_tolerance(secs),
            None => manager,
        })
    }
}

fn require_resolved(name: &'static str, value: &str) -> Result<(), CliError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CliError::Config(format!("{name} is not set")));
    }
    if value.starts_with('$') {
        return Err(CliError::Config(format!(
            "{name} references an unset environment variable"
        )));
    }
    Ok(())
}

/// Expands `$VAR` and `${VAR}` patterns using `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }
        let closed = braced && chars.next_if_eq(&'}').is_some();

        match lookup(&name) {
            Some(value) if !name.is_empty() => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}
