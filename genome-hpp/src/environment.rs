//! Gateway environments.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use url::Url;

use crate::error::HppError;

/// Base URL of the production hosted payment page.
pub const PRODUCTION_BASE_URL: &str = "https://hpp.genome.eu/";

/// Base URL of the sandbox hosted payment page.
pub const SANDBOX_BASE_URL: &str = "https://hpp-sandbox.genome.eu/";

/// Which gateway deployment redirects are built for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    /// Live payments.
    #[default]
    Production,
    /// Test payments.
    Sandbox,
    /// Any other deployment, e.g. a local mock.
    Custom(Url),
}

impl Environment {
    /// Creates a custom environment from a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn custom(base_url: &str) -> Result<Self, HppError> {
        Ok(Self::Custom(Url::parse(base_url)?))
    }

    /// Returns the base URL redirects are appended to.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidBaseUrl`] if the built-in URL does not parse.
    pub fn base_url(&self) -> Result<Url, HppError> {
        match self {
            Self::Production => Ok(Url::parse(PRODUCTION_BASE_URL)?),
            Self::Sandbox => Ok(Url::parse(SANDBOX_BASE_URL)?),
            Self::Custom(url) => Ok(url.clone()),
        }
    }

    /// Returns `true` for the sandbox deployment.
    #[must_use]
    pub const fn is_sandbox(&self) -> bool {
        matches!(self, Self::Sandbox)
    }
}

impl FromStr for Environment {
    type Err = HppError;

    /// Accepts `production`, `sandbox`, or an absolute URL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Self::custom(other),
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Sandbox => f.write_str("sandbox"),
            Self::Custom(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_base_urls_parse() {
        assert_eq!(
            Environment::Production.base_url().unwrap().as_str(),
            PRODUCTION_BASE_URL
        );
        assert_eq!(
            Environment::Sandbox.base_url().unwrap().as_str(),
            SANDBOX_BASE_URL
        );
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert!("sandbox".parse::<Environment>().unwrap().is_sandbox());
        let custom: Environment = "http://localhost:8080/pay".parse().unwrap();
        assert_eq!(custom.to_string(), "http://localhost:8080/pay");
        assert!(matches!(
            "not a url".parse::<Environment>(),
            Err(HppError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_default_is_production() {
        assert_eq!(Environment::default(), Environment::Production);
    }
}
