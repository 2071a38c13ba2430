//! Schema fields of a hosted payment request.
//!
//! [`PaymentField`] is the closed set of gateway-defined parameter names. Its
//! declaration order, exposed as [`PaymentField::ALL`], is the canonical order
//! used for both the query string and the signature input, so it must never be
//! reordered.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::HppError;
use crate::nonce::Nonce;

/// A gateway-defined payment parameter.
///
/// Wire names never start with `custom_`, so they cannot collide with
/// merchant-defined custom fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentField {
    /// Order identifier on the merchant side.
    OrderId,
    /// Customer identifier on the merchant side.
    UserId,
    /// Merchant category code.
    Mcc,
    /// ISO 4217 alpha-3 currency code.
    #[serde(rename = "currency_iso")]
    Currency,
    /// Payment amount.
    Amount,
    /// Replay-protection nonce.
    #[serde(rename = "ts_nonce")]
    Nonce,
    /// Redirect target after a successful payment.
    SuccessUrl,
    /// Redirect target after a failed payment.
    FailureUrl,
    /// Free-form payment description.
    Description,
    /// Customer phone.
    Phone,
    /// Customer email.
    Email,
    /// Customer first name.
    FirstName,
    /// Customer last name.
    LastName,
    /// Whether the page shows the phone input.
    ShowPhone,
    /// Whether the page shows the email input.
    ShowEmail,
    /// Whether the page shows the description.
    ShowDescription,
    /// Whether the page shows the GDPR agreement.
    ShowGdprAgreement,
}

impl PaymentField {
    /// All fields in canonical declaration order.
    ///
    /// `mcc` precedes `currency_iso` and `amount`, as in the gateway's worked
    /// example. The field constants of the PHP client are declared as
    /// `amount, currency_iso, mcc`; integrations that mirror that client's
    /// ordering will not produce matching signatures.
    pub const ALL: [Self; 17] = [
        Self::OrderId,
        Self::UserId,
        Self::Mcc,
        Self::Currency,
        Self::Amount,
        Self::Nonce,
        Self::SuccessUrl,
        Self::FailureUrl,
        Self::Description,
        Self::Phone,
        Self::Email,
        Self::FirstName,
        Self::LastName,
        Self::ShowPhone,
        Self::ShowEmail,
        Self::ShowDescription,
        Self::ShowGdprAgreement,
    ];

    /// Fields that are set at construction and can never be unset.
    pub const MANDATORY: [Self; 5] = [
        Self::OrderId,
        Self::UserId,
        Self::Mcc,
        Self::Currency,
        Self::Amount,
    ];

    /// Returns the wire name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OrderId => "order_id",
            Self::UserId => "user_id",
            Self::Amount => "amount",
            Self::Currency => "currency_iso",
            Self::Mcc => "mcc",
            Self::Nonce => "ts_nonce",
            Self::SuccessUrl => "success_url",
            Self::FailureUrl => "failure_url",
            Self::Description => "description",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::ShowPhone => "show_phone",
            Self::ShowEmail => "show_email",
            Self::ShowDescription => "show_description",
            Self::ShowGdprAgreement => "show_gdpr_agreement",
        }
    }

    /// Looks a field up by its wire name.
    #[must_use]
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }

    /// Returns `true` for fields set at construction.
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        Self::MANDATORY.contains(self)
    }

    /// Returns `true` for the boolean display flags.
    #[must_use]
    pub const fn is_flag(&self) -> bool {
        matches!(
            self,
            Self::ShowPhone | Self::ShowEmail | Self::ShowDescription | Self::ShowGdprAgreement
        )
    }
}

impl Display for PaymentField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentField {
    type Err = HppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire_name(s)
            .ok_or_else(|| HppError::invalid_input(format!("unknown payment field '{s}'")))
    }
}

/// A scalar value held by a [`PaymentField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text value.
    Text(String),
    /// Decimal amount.
    Decimal(Decimal),
    /// Integer value (the nonce).
    Integer(u64),
    /// Display flag.
    Bool(bool),
}

impl FieldValue {
    /// Renders the value the way it appears on the wire.
    ///
    /// Booleans become `true`/`false`; decimals drop trailing zeros and never
    /// use thousands separators.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Decimal(amount) => amount.normalize().to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Bool(flag) => flag.to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Nonce> for FieldValue {
    fn from(value: Nonce) -> Self {
        Self::Integer(value.value())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_declaration_order_is_protocol_order() {
        let names: Vec<&str> = PaymentField::ALL.iter().map(PaymentField::as_str).collect();
        assert_eq!(
            names,
            [
                "order_id",
                "user_id",
                "mcc",
                "currency_iso",
                "amount",
                "ts_nonce",
                "success_url",
                "failure_url",
                "description",
                "phone",
                "email",
                "first_name",
                "last_name",
                "show_phone",
                "show_email",
                "show_description",
                "show_gdpr_agreement",
            ]
        );
    }

    #[test]
    fn test_all_is_sorted_by_ord() {
        let mut sorted = PaymentField::ALL;
        sorted.sort();
        assert_eq!(sorted, PaymentField::ALL);
    }

    #[test]
    fn test_wire_names_roundtrip() {
        for field in PaymentField::ALL {
            assert_eq!(PaymentField::from_wire_name(field.as_str()), Some(field));
            assert!(!field.as_str().starts_with("custom_"));
        }
        assert_eq!(PaymentField::from_wire_name("signature"), None);
        assert!("custom_x".parse::<PaymentField>().is_err());
    }

    #[test]
    fn test_serde_names_match_wire_names() {
        for field in PaymentField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }

    #[test]
    fn test_field_value_wire_format() {
        assert_eq!(FieldValue::from(true).to_wire(), "true");
        assert_eq!(FieldValue::from(false).to_wire(), "false");
        assert_eq!(FieldValue::from(dec!(19.99)).to_wire(), "19.99");
        assert_eq!(FieldValue::from(dec!(20.00)).to_wire(), "20");
        assert_eq!(FieldValue::from(dec!(1234567.5)).to_wire(), "1234567.5");
        assert_eq!(FieldValue::from(Nonce::new(7)).to_wire(), "7");
        assert_eq!(FieldValue::from("a b").to_wire(), "a b");
    }

    #[test]
    fn test_mandatory_and_flags() {
        assert!(PaymentField::Currency.is_mandatory());
        assert!(!PaymentField::Nonce.is_mandatory());
        assert!(PaymentField::ShowGdprAgreement.is_flag());
        assert!(!PaymentField::Email.is_flag());
    }
}
