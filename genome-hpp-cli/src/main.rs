//! Genome hosted payment page command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Print a signed redirect URL
//! genome-hpp-cli build --order-id A1 --user-id U9 --mcc 5411 \
//!     --currency EUR --amount 19.99 --auto-nonce
//!
//! # Verify a callback
//! genome-hpp-cli verify 'order_id=A1&...&signature=...'
//!
//! # Use another config file and log level
//! CONFIG=/path/to/genome.toml RUST_LOG=debug genome-hpp-cli verify '...'
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `genome.toml`)
//! - `GENOME_API_KEY` / `GENOME_API_SECRET` — Override the credentials
//! - `RUST_LOG` — Log level filter (default: `info`)

use std::io::Write;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use genome_hpp_cli::Cli;
use genome_hpp_cli::error::CliError;

fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout carries only the command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        tracing::error!(code = e.code(), "Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let output = genome_hpp_cli::run(cli)?;
    writeln!(std::io::stdout().lock(), "{output}")?;
    Ok(())
}
