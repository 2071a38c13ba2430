//! Mutable container of hosted payment data.
//!
//! A [`PaymentRequest`] is created once per payment attempt with its five
//! mandatory fields, configured through chained setters, and then handed to
//! [`HostedPaymentPageManager`](crate::manager::HostedPaymentPageManager) to be
//! encoded and signed.
//!
//! # Example
//!
//! ```rust
//! use genome_hpp::payment::PaymentRequest;
//! use rust_decimal::Decimal;
//!
//! let mut request = PaymentRequest::new("A1", "U9", "5411", "eur", Decimal::new(1999, 2))?;
//! request
//!     .set_email("buyer@example.com")
//!     .set_phone("+37120000000")
//!     .set_show_email(true)
//!     .add_custom_field("custom_cart", "42")?;
//!
//! assert_eq!(request.currency(), "EUR");
//! assert_eq!(request.email(), Some("buyer@example.com"));
//! # Ok::<(), genome_hpp::error::HppError>(())
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::HppError;
use crate::field::{FieldValue, PaymentField};
use crate::nonce::Nonce;

/// Prefix every custom field key must start with.
pub const CUSTOM_FIELD_PREFIX: &str = "custom_";

/// Minimum length of a custom field key, prefix included.
pub const CUSTOM_FIELD_MIN_LEN: usize = 8;

/// Payment data for one hosted payment page redirect.
///
/// Optional fields are tracked as [`Option`]s, so reading an unset field
/// yields `None` rather than failing. Custom fields are kept in a separate
/// map ordered by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    order_id: String,
    user_id: String,
    mcc: String,
    #[serde(rename = "currency_iso")]
    currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    #[serde(rename = "ts_nonce", skip_serializing_if = "Option::is_none")]
    nonce: Option<Nonce>,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_phone: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_email: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_description: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    show_gdpr_agreement: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    custom: BTreeMap<String, String>,
}

impl PaymentRequest {
    /// Creates a payment request with the mandatory fields.
    ///
    /// The currency is upper-cased.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidInput`] if the currency is not three ASCII
    /// letters or the amount is negative.
    pub fn new(
        order_id: impl Into<String>,
        user_id: impl Into<String>,
        mcc: impl Into<String>,
        currency: &str,
        amount: Decimal,
    ) -> Result<Self, HppError> {
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(HppError::invalid_input(format!(
                "currency must be a 3-letter ISO code, '{currency}' given"
            )));
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(HppError::invalid_input(format!(
                "amount must not be negative, {amount} given"
            )));
        }
        Ok(Self {
            order_id: order_id.into(),
            user_id: user_id.into(),
            mcc: mcc.into(),
            currency: currency.to_ascii_uppercase(),
            amount,
            nonce: None,
            success_url: None,
            failure_url: None,
            description: None,
            phone: None,
            email: None,
            first_name: None,
            last_name: None,
            show_phone: None,
            show_email: None,
            show_description: None,
            show_gdpr_agreement: None,
            custom: BTreeMap::new(),
        })
    }

    /// Sets the replay-protection nonce.
    ///
    /// Setting the same value again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::NonceAlreadySet`] if a different nonce is already set.
    pub fn set_nonce(&mut self, nonce: Nonce) -> Result<&mut Self, HppError> {
        match self.nonce {
            Some(existing) if existing != nonce => Err(HppError::NonceAlreadySet(existing)),
            _ => {
                self.nonce = Some(nonce);
                Ok(self)
            }
        }
    }

    /// Sets the nonce to the current Unix time in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::NonceAlreadySet`] if a different nonce is already set.
    pub fn set_nonce_automatically(&mut self) -> Result<&mut Self, HppError> {
        self.set_nonce(Nonce::now())
    }

    /// Sets the success and failure redirect URLs together.
    pub fn set_redirect_urls(
        &mut self,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> &mut Self {
        self.success_url = Some(success_url.into());
        self.failure_url = Some(failure_url.into());
        self
    }

    /// Sets the payment description.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the customer phone.
    pub fn set_phone(&mut self, phone: impl Into<String>) -> &mut Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the customer email.
    pub fn set_email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the customer first and last name together.
    pub fn set_first_last_name(
        &mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> &mut Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Shows or hides the phone input on the hosted page.
    pub const fn set_show_phone(&mut self, show: bool) -> &mut Self {
        self.show_phone = Some(show);
        self
    }

    /// Shows or hides the email input on the hosted page.
    pub const fn set_show_email(&mut self, show: bool) -> &mut Self {
        self.show_email = Some(show);
        self
    }

    /// Shows or hides the description on the hosted page.
    pub const fn set_show_description(&mut self, show: bool) -> &mut Self {
        self.show_description = Some(show);
        self
    }

    /// Shows or hides the GDPR agreement on the hosted page.
    pub const fn set_show_gdpr_agreement(&mut self, show: bool) -> &mut Self {
        self.show_gdpr_agreement = Some(show);
        self
    }

    /// Adds or overwrites a merchant-defined custom field.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidInput`] if the key does not start with
    /// `custom_` or is shorter than 8 characters.
    pub fn add_custom_field(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Self, HppError> {
        let key = key.into();
        if !is_custom_key(&key) {
            return Err(HppError::invalid_input(format!(
                "custom value key should start with \"{CUSTOM_FIELD_PREFIX}\", '{key}' given"
            )));
        }
        self.custom.insert(key, value.into());
        Ok(self)
    }

    /// Adds every entry as a custom field.
    ///
    /// Entries before the first invalid key stay applied.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidInput`] on the first invalid key.
    pub fn add_custom_fields<I, K, V>(&mut self, fields: I) -> Result<&mut Self, HppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in fields {
            self.add_custom_field(key, value)?;
        }
        Ok(self)
    }

    /// Order identifier on the merchant side.
    #[must_use]
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Customer identifier on the merchant side.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Merchant category code.
    #[must_use]
    pub fn mcc(&self) -> &str {
        &self.mcc
    }

    /// Upper-cased ISO currency code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Payment amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Replay-protection nonce, if set.
    #[must_use]
    pub const fn nonce(&self) -> Option<Nonce> {
        self.nonce
    }

    /// Returns `true` once a nonce is set.
    #[must_use]
    pub const fn has_nonce(&self) -> bool {
        self.nonce.is_some()
    }

    /// Success redirect URL, if set.
    #[must_use]
    pub fn success_url(&self) -> Option<&str> {
        self.success_url.as_deref()
    }

    /// Failure redirect URL, if set.
    #[must_use]
    pub fn failure_url(&self) -> Option<&str> {
        self.failure_url.as_deref()
    }

    /// Payment description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Customer phone, if set.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Customer email, if set.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Customer first name, if set.
    #[must_use]
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Customer last name, if set.
    #[must_use]
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Phone display flag, if set.
    #[must_use]
    pub const fn show_phone(&self) -> Option<bool> {
        self.show_phone
    }

    /// Email display flag, if set.
    #[must_use]
    pub const fn show_email(&self) -> Option<bool> {
        self.show_email
    }

    /// Description display flag, if set.
    #[must_use]
    pub const fn show_description(&self) -> Option<bool> {
        self.show_description
    }

    /// GDPR agreement display flag, if set.
    #[must_use]
    pub const fn show_gdpr_agreement(&self) -> Option<bool> {
        self.show_gdpr_agreement
    }

    /// Custom fields ordered by key.
    #[must_use]
    pub const fn custom_fields(&self) -> &BTreeMap<String, String> {
        &self.custom
    }

    /// Value of a single custom field.
    #[must_use]
    pub fn custom_field(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }

    /// Returns the value held by a schema field, or `None` if it is unset.
    #[must_use]
    pub fn value(&self, field: PaymentField) -> Option<FieldValue> {
        let text = |value: &Option<String>| value.as_deref().map(FieldValue::from);
        match field {
            PaymentField::OrderId => Some(FieldValue::from(self.order_id.as_str())),
            PaymentField::UserId => Some(FieldValue::from(self.user_id.as_str())),
            PaymentField::Mcc => Some(FieldValue::from(self.mcc.as_str())),
            PaymentField::Currency => Some(FieldValue::from(self.currency.as_str())),
            PaymentField::Amount => Some(FieldValue::from(self.amount)),
            PaymentField::Nonce => self.nonce.map(FieldValue::from),
            PaymentField::SuccessUrl => text(&self.success_url),
            PaymentField::FailureUrl => text(&self.failure_url),
            PaymentField::Description => text(&self.description),
            PaymentField::Phone => text(&self.phone),
            PaymentField::Email => text(&self.email),
            PaymentField::FirstName => text(&self.first_name),
            PaymentField::LastName => text(&self.last_name),
            PaymentField::ShowPhone => self.show_phone.map(FieldValue::from),
            PaymentField::ShowEmail => self.show_email.map(FieldValue::from),
            PaymentField::ShowDescription => self.show_description.map(FieldValue::from),
            PaymentField::ShowGdprAgreement => self.show_gdpr_agreement.map(FieldValue::from),
        }
    }

    /// Returns the value held by a schema field.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::FieldNotSet`] if the field is unset.
    pub fn require(&self, field: PaymentField) -> Result<FieldValue, HppError> {
        self.value(field).ok_or(HppError::FieldNotSet(field))
    }
}

/// Returns `true` if `key` is acceptable as a custom field key.
#[must_use]
pub fn is_custom_key(key: &str) -> bool {
    key.len() >= CUSTOM_FIELD_MIN_LEN && key.starts_with(CUSTOM_FIELD_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> PaymentRequest {
        PaymentRequest::new("A1", "U9", "5411", "eur", dec!(19.99)).unwrap()
    }

    #[test]
    fn test_new_sets_mandatory_fields() {
        let request = sample();
        assert_eq!(request.order_id(), "A1");
        assert_eq!(request.user_id(), "U9");
        assert_eq!(request.mcc(), "5411");
        assert_eq!(request.currency(), "EUR");
        assert_eq!(request.amount(), dec!(19.99));
        for field in PaymentField::MANDATORY {
            assert!(request.value(field).is_some());
        }
    }

    #[test]
    fn test_currency_normalized_to_uppercase() {
        let request = PaymentRequest::new("o", "u", "5411", "usd", dec!(1)).unwrap();
        assert_eq!(request.currency(), "USD");
    }

    #[test]
    fn test_new_rejects_bad_currency() {
        for currency in ["us", "usdx", "u$d", ""] {
            let err = PaymentRequest::new("o", "u", "5411", currency, dec!(1)).unwrap_err();
            assert!(matches!(err, HppError::InvalidInput(_)), "{currency}");
        }
    }

    #[test]
    fn test_new_rejects_negative_amount() {
        let err = PaymentRequest::new("o", "u", "5411", "EUR", dec!(-0.01)).unwrap_err();
        assert!(matches!(err, HppError::InvalidInput(_)));
        assert!(PaymentRequest::new("o", "u", "5411", "EUR", dec!(0)).is_ok());
    }

    #[test]
    fn test_unset_optional_fields_read_as_none() {
        let request = sample();
        assert_eq!(request.email(), None);
        assert_eq!(request.success_url(), None);
        assert_eq!(request.show_phone(), None);
        assert!(!request.has_nonce());
        assert!(matches!(
            request.require(PaymentField::Email),
            Err(HppError::FieldNotSet(PaymentField::Email))
        ));
    }

    #[test]
    fn test_fluent_setters() {
        let mut request = sample();
        request
            .set_redirect_urls("https://shop.test/ok", "https://shop.test/fail")
            .set_description("Groceries")
            .set_phone("+100")
            .set_email("a@b.c")
            .set_first_last_name("Ann", "Lee")
            .set_show_phone(true)
            .set_show_email(false)
            .set_show_description(true)
            .set_show_gdpr_agreement(false);

        assert_eq!(request.success_url(), Some("https://shop.test/ok"));
        assert_eq!(request.failure_url(), Some("https://shop.test/fail"));
        assert_eq!(request.description(), Some("Groceries"));
        assert_eq!(request.phone(), Some("+100"));
        assert_eq!(request.email(), Some("a@b.c"));
        assert_eq!(request.first_name(), Some("Ann"));
        assert_eq!(request.last_name(), Some("Lee"));
        assert_eq!(request.show_phone(), Some(true));
        assert_eq!(request.show_email(), Some(false));
        assert_eq!(request.show_description(), Some(true));
        assert_eq!(request.show_gdpr_agreement(), Some(false));
    }

    #[test]
    fn test_custom_key_rules() {
        let mut request = sample();
        assert!(matches!(
            request.add_custom_field("bad_key", "x"),
            Err(HppError::InvalidInput(_))
        ));
        assert!(matches!(
            request.add_custom_field("custom_", "x"),
            Err(HppError::InvalidInput(_))
        ));
        assert!(request.add_custom_field("custom_x", "x").is_ok());
        assert_eq!(request.custom_field("custom_x"), Some("x"));
    }

    #[test]
    fn test_custom_field_overwrites() {
        let mut request = sample();
        request.add_custom_field("custom_cart", "1").unwrap();
        request.add_custom_field("custom_cart", "2").unwrap();
        assert_eq!(request.custom_field("custom_cart"), Some("2"));
        assert_eq!(request.custom_fields().len(), 1);
    }

    #[test]
    fn test_add_custom_fields_stops_at_first_invalid_key() {
        let mut request = sample();
        let result = request.add_custom_fields([
            ("custom_a1", "1"),
            ("nope_key1", "2"),
            ("custom_b1", "3"),
        ]);
        assert!(result.is_err());
        assert_eq!(request.custom_field("custom_a1"), Some("1"));
        assert_eq!(request.custom_field("custom_b1"), None);
    }

    #[test]
    fn test_nonce_is_immutable_once_set() {
        let mut request = sample();
        request.set_nonce(Nonce::new(1_700_000_000)).unwrap();
        assert!(request.set_nonce(Nonce::new(1_700_000_000)).is_ok());
        assert!(matches!(
            request.set_nonce(Nonce::new(1_700_000_001)),
            Err(HppError::NonceAlreadySet(n)) if n.value() == 1_700_000_000
        ));
        assert!(request.set_nonce_automatically().is_err());
        assert_eq!(request.nonce(), Some(Nonce::new(1_700_000_000)));
    }

    #[test]
    fn test_set_nonce_automatically() {
        let mut request = sample();
        request.set_nonce_automatically().unwrap();
        assert!(request.has_nonce());
    }

    #[test]
    fn test_serializes_only_set_fields() {
        let mut request = sample();
        request.set_show_email(true);
        request.add_custom_field("custom_ref", "r-1").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "order_id": "A1",
                "user_id": "U9",
                "mcc": "5411",
                "currency_iso": "EUR",
                "amount": "19.99",
                "show_email": true,
                "custom": { "custom_ref": "r-1" },
            })
        );
    }
}
