//! Replay-protection nonce carried in the `ts_nonce` field.
//!
//! A [`Nonce`] is either a Unix timestamp in seconds or a merchant-side counter.
//! Under [`SignatureMode::ATs`](crate::signature::SignatureMode::ATs) it is part of
//! the signed payload, so a captured redirect cannot be replayed with a fresh nonce.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::HppError;

/// An integer nonce, usually the number of seconds since the Unix epoch.
///
/// Encoded on the wire as a plain decimal integer:
///
/// ```text
/// ts_nonce=1700000000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(u64);

impl Nonce {
    /// Creates a nonce from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the current system time in seconds as a nonce.
    ///
    /// A clock set before the Unix epoch yields `0`.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self(secs)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns the absolute distance between two nonces.
    #[must_use]
    pub const fn distance(&self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl From<u64> for Nonce {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for Nonce {
    type Err = HppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self).map_err(|_| {
            HppError::invalid_input(format!("nonce must be a non-negative integer, '{s}' given"))
        })
    }
}

impl Display for Nonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_parse_and_display() {
        let nonce: Nonce = "1700000000".parse().unwrap();
        assert_eq!(nonce.value(), 1_700_000_000);
        assert_eq!(nonce.to_string(), "1700000000");
    }

    #[test]
    fn test_nonce_rejects_negative_and_garbage() {
        assert!("-1".parse::<Nonce>().is_err());
        assert!("12a".parse::<Nonce>().is_err());
        assert!("".parse::<Nonce>().is_err());
    }

    #[test]
    fn test_nonce_now_is_after_2023() {
        assert!(Nonce::now().value() > 1_700_000_000);
    }

    #[test]
    fn test_nonce_distance_is_symmetric() {
        let a = Nonce::new(100);
        let b = Nonce::new(160);
        assert_eq!(a.distance(b), 60);
        assert_eq!(b.distance(a), 60);
    }

    #[test]
    fn test_nonce_serializes_as_integer() {
        let json = serde_json::to_string(&Nonce::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
