//! Error types for the command-line tool.

use genome_hpp::HppError;

/// Errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be read or output could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML or has invalid values.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration is incomplete.
    #[error("config error: {0}")]
    Config(String),

    /// Request building or verification failed.
    #[error("{0}")]
    Hpp(#[from] HppError),

    /// Output could not be serialized.
    #[error("failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    /// Machine-readable code printed alongside the message.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::Parse(_) | Self::Config(_) => "config_error",
            Self::Hpp(err) => err.reason().as_str(),
            Self::Render(_) => "render_error",
        }
    }
}
