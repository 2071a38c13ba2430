//! Redirect signatures.
//!
//! The signature is an HMAC-SHA256 keyed with the merchant's API secret,
//! computed over the schema pairs of a [`CanonicalPairs`] rendered as
//! `key=value` and joined with `|`, and transmitted as lowercase hex. Values
//! have `%`, `|` and `=` percent-encoded so that no two field sets produce the
//! same message.
//!
//! Custom fields never take part in the signature. Whether `ts_nonce` does is
//! decided by the [`SignatureMode`].

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::encoding::CanonicalPairs;
use crate::error::HppError;
use crate::field::PaymentField;

type HmacSha256 = Hmac<Sha256>;

/// Separator placed between `key=value` items of the signed message.
pub const SIGNATURE_SEPARATOR: char = '|';

/// Which fields the signature covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SignatureMode {
    /// Schema fields without the nonce. No replay protection.
    #[serde(rename = "MODE_A")]
    #[cfg_attr(feature = "cli", value(name = "MODE_A"))]
    A,
    /// Schema fields including a mandatory nonce.
    #[default]
    #[serde(rename = "MODE_A_TS")]
    #[cfg_attr(feature = "cli", value(name = "MODE_A_TS"))]
    ATs,
}

impl SignatureMode {
    /// Returns the mode name used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A => "MODE_A",
            Self::ATs => "MODE_A_TS",
        }
    }

    /// Returns `true` if requests must carry a nonce.
    #[must_use]
    pub const fn requires_nonce(&self) -> bool {
        matches!(self, Self::ATs)
    }

    /// Returns `true` if `field` is part of the signed message.
    #[must_use]
    pub const fn signs(&self, field: PaymentField) -> bool {
        !matches!((self, field), (Self::A, PaymentField::Nonce))
    }
}

impl Display for SignatureMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMode {
    type Err = HppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MODE_A" => Ok(Self::A),
            "MODE_A_TS" => Ok(Self::ATs),
            other => Err(HppError::UnknownSignatureMode(other.to_owned())),
        }
    }
}

/// Computes and verifies signatures with a shared secret.
#[derive(Clone)]
pub struct SignatureEngine {
    secret: String,
    mode: SignatureMode,
}

impl fmt::Debug for SignatureEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureEngine")
            .field("secret", &"<redacted>")
            .field("mode", &self.mode)
            .finish()
    }
}

impl SignatureEngine {
    /// Creates an engine for the given secret and mode.
    pub fn new(secret: impl Into<String>, mode: SignatureMode) -> Self {
        Self {
            secret: secret.into(),
            mode,
        }
    }

    /// The signing mode.
    #[must_use]
    pub const fn mode(&self) -> SignatureMode {
        self.mode
    }

    /// Builds the message the signature is computed over.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::MissingNonce`] if the mode requires a nonce and
    /// `pairs` has none.
    pub fn message(&self, pairs: &CanonicalPairs) -> Result<String, HppError> {
        if self.mode.requires_nonce() && pairs.get(PaymentField::Nonce).is_none() {
            return Err(HppError::MissingNonce);
        }
        let mut message = String::new();
        for (field, value) in pairs.schema() {
            if !self.mode.signs(*field) {
                continue;
            }
            if !message.is_empty() {
                message.push(SIGNATURE_SEPARATOR);
            }
            message.push_str(field.as_str());
            message.push('=');
            push_escaped(&mut message, value);
        }
        Ok(message)
    }

    /// Signs `pairs` and returns the lowercase hex signature.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::MissingNonce`] if the mode requires a nonce and
    /// `pairs` has none.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "hpp.sign", skip_all, fields(mode = %self.mode))
    )]
    pub fn sign(&self, pairs: &CanonicalPairs) -> Result<String, HppError> {
        let tag = self.tag(&self.message(pairs)?)?;
        Ok(hex::encode(tag))
    }

    /// Checks `provided` against the signature of `pairs` in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::SignatureInvalid`] on mismatch or malformed hex and
    /// [`HppError::MissingNonce`] if the mode requires a nonce and `pairs`
    /// has none.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "hpp.verify_signature", skip_all, fields(mode = %self.mode))
    )]
    pub fn verify(&self, pairs: &CanonicalPairs, provided: &str) -> Result<(), HppError> {
        let expected = self.tag(&self.message(pairs)?)?;
        let provided = hex::decode(provided).map_err(|_| HppError::SignatureInvalid)?;
        if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            Ok(())
        } else {
            #[cfg(feature = "telemetry")]
            tracing::warn!("Signature mismatch");
            Err(HppError::SignatureInvalid)
        }
    }

    fn tag(&self, message: &str) -> Result<Vec<u8>, HppError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| HppError::invalid_input(format!("unusable api secret: {e}")))?;
        mac.update(message.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn push_escaped(message: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '%' => message.push_str("%25"),
            '=' => message.push_str("%3D"),
            SIGNATURE_SEPARATOR => message.push_str("%7C"),
            other => message.push(other),
        }
    }
}
