//! Error types for hosted payment page request building and verification.
//!
//! Every failure is local and synchronous: a request either builds completely
//! or fails before any network interaction. Each [`HppError`] maps to a stable
//! machine-readable [`ErrorReason`].

use serde::{Deserialize, Serialize};

use crate::field::PaymentField;
use crate::nonce::Nonce;

/// Errors raised while configuring, building, or verifying hosted payment requests.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HppError {
    /// A value supplied by the caller or the gateway is malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The signature mode requires a nonce but none was set.
    #[error("Nonce is required by signature mode MODE_A_TS but is not set")]
    MissingNonce,
    /// The nonce was already set to a different value.
    #[error("Nonce is already set to {0}")]
    NonceAlreadySet(Nonce),
    /// The inbound nonce lies outside the accepted replay window.
    #[error("Nonce {nonce} is outside the accepted window of {tolerance}s around {now}")]
    NonceExpired {
        /// Nonce carried by the inbound payload.
        nonce: Nonce,
        /// Verification time.
        now: Nonce,
        /// Accepted distance in seconds.
        tolerance: u64,
    },
    /// A required field has no value.
    #[error("Field '{0}' is not set")]
    FieldNotSet(PaymentField),
    /// The inbound payload carries no `signature` parameter.
    #[error("Signature parameter is missing")]
    MissingSignature,
    /// The recomputed signature does not match the supplied one.
    #[error("Signature is invalid")]
    SignatureInvalid,
    /// The signature mode string is not recognised.
    #[error("Unknown signature mode '{0}', expected MODE_A or MODE_A_TS")]
    UnknownSignatureMode(String),
    /// The environment base URL could not be parsed.
    #[error("Invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

impl HppError {
    /// Creates an [`HppError::InvalidInput`] from any message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns the machine-readable reason for this error.
    #[must_use]
    pub const fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidInput(_) => ErrorReason::InvalidInput,
            Self::MissingNonce => ErrorReason::MissingNonce,
            Self::NonceAlreadySet(_) => ErrorReason::NonceAlreadySet,
            Self::NonceExpired { .. } => ErrorReason::NonceExpired,
            Self::FieldNotSet(_) => ErrorReason::FieldNotSet,
            Self::MissingSignature => ErrorReason::MissingSignature,
            Self::SignatureInvalid => ErrorReason::SignatureInvalid,
            Self::UnknownSignatureMode(_) => ErrorReason::UnknownSignatureMode,
            Self::InvalidBaseUrl(_) => ErrorReason::InvalidBaseUrl,
        }
    }
}

/// Machine-readable error reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorReason {
    /// Malformed caller or gateway value.
    InvalidInput,
    /// Nonce required but absent.
    MissingNonce,
    /// Nonce overwrite attempted.
    NonceAlreadySet,
    /// Nonce outside the replay window.
    NonceExpired,
    /// Required field absent.
    FieldNotSet,
    /// No signature supplied.
    MissingSignature,
    /// Signature mismatch.
    SignatureInvalid,
    /// Unrecognised signature mode.
    UnknownSignatureMode,
    /// Unparsable base URL.
    InvalidBaseUrl,
}

impl ErrorReason {
    /// Returns the `snake_case` string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::MissingNonce => "missing_nonce",
            Self::NonceAlreadySet => "nonce_already_set",
            Self::NonceExpired => "nonce_expired",
            Self::FieldNotSet => "field_not_set",
            Self::MissingSignature => "missing_signature",
            Self::SignatureInvalid => "signature_invalid",
            Self::UnknownSignatureMode => "unknown_signature_mode",
            Self::InvalidBaseUrl => "invalid_base_url",
        }
    }
}

impl core::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
