//! Canonical encoding of payment requests.
//!
//! The outgoing query string and the signature input are both derived from
//! the same [`CanonicalPairs`]: schema fields in [`PaymentField::ALL`] order
//! (unset fields skipped), followed by custom fields in lexicographic key
//! order. Serialization uses `application/x-www-form-urlencoded` rules, so
//! spaces become `+`.
//!
//! The inbound direction is handled by [`CallbackParams`], which keeps the raw
//! strings received from the gateway so signatures are checked over exactly
//! what was sent.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use rust_decimal::Decimal;
use url::{Url, form_urlencoded};

use crate::error::HppError;
use crate::field::PaymentField;
use crate::nonce::Nonce;
use crate::payment::{PaymentRequest, is_custom_key};

/// Name of the query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Ordered `(key, value)` pairs of a payment request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalPairs {
    schema: Vec<(PaymentField, String)>,
    custom: Vec<(String, String)>,
}

impl CanonicalPairs {
    /// Schema field pairs in canonical order.
    #[must_use]
    pub fn schema(&self) -> &[(PaymentField, String)] {
        &self.schema
    }

    /// Custom field pairs ordered by key.
    #[must_use]
    pub fn custom(&self) -> &[(String, String)] {
        &self.custom
    }

    /// Value of a schema field, if present.
    #[must_use]
    pub fn get(&self, field: PaymentField) -> Option<&str> {
        self.schema
            .iter()
            .find(|(key, _)| *key == field)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over all pairs: schema fields first, then custom fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schema
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
            .chain(
                self.custom
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            )
    }

    /// Serializes all pairs as a form-urlencoded query string.
    #[must_use]
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Serializes all pairs followed by the `signature` parameter.
    #[must_use]
    pub fn to_signed_query(&self, signature: &str) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .append_pair(SIGNATURE_PARAM, signature)
            .finish()
    }
}

/// Converts a [`PaymentRequest`] into [`CanonicalPairs`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalEncoder;

impl CanonicalEncoder {
    /// Encodes every set schema field and every custom field.
    #[must_use]
    pub fn encode(request: &PaymentRequest) -> CanonicalPairs {
        let schema = PaymentField::ALL
            .into_iter()
            .filter_map(|field| request.value(field).map(|value| (field, value.to_wire())))
            .collect();
        let custom = request
            .custom_fields()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        CanonicalPairs { schema, custom }
    }
}

/// Parameters received from the gateway on a redirect or webhook.
///
/// Parameters are split into schema fields, custom fields, the signature,
/// and anything else (`extra`). Extra parameters are not covered by the
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallbackParams {
    schema: BTreeMap<PaymentField, String>,
    custom: BTreeMap<String, String>,
    extra: BTreeMap<String, String>,
    signature: Option<String>,
}

impl CallbackParams {
    /// Parses a form-urlencoded query string.
    ///
    /// A leading `?` is ignored. If the input is an absolute URL only its
    /// query component is used.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidInput`] if a schema field, a custom field or
    /// the signature appears more than once.
    pub fn from_query(query: &str) -> Result<Self, HppError> {
        if let Some(url) = Url::parse(query).ok().filter(Url::has_host) {
            return Self::from_pairs(url.query_pairs());
        }
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    /// Collects already-decoded parameter pairs.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::InvalidInput`] if a schema field, a custom field or
    /// the signature appears more than once.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, HppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.insert(key.as_ref(), value.into())?;
        }
        Ok(params)
    }

    fn insert(&mut self, key: &str, value: String) -> Result<(), HppError> {
        let duplicate =
            || HppError::invalid_input(format!("parameter '{key}' appears more than once"));
        if key == SIGNATURE_PARAM {
            if self.signature.replace(value).is_some() {
                return Err(duplicate());
            }
        } else if let Some(field) = PaymentField::from_wire_name(key) {
            match self.schema.entry(field) {
                Entry::Occupied(_) => return Err(duplicate()),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        } else if is_custom_key(key) {
            match self.custom.entry(key.to_owned()) {
                Entry::Occupied(_) => return Err(duplicate()),
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        } else {
            self.extra.insert(key.to_owned(), value);
        }
        Ok(())
    }

    /// Supplied signature, if any.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Raw value of a schema field.
    #[must_use]
    pub fn raw(&self, field: PaymentField) -> Option<&str> {
        self.schema.get(&field).map(String::as_str)
    }

    /// Parameters outside the schema and custom namespaces.
    #[must_use]
    pub const fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Canonical pairs built from the raw received strings.
    #[must_use]
    pub fn canonical(&self) -> CanonicalPairs {
        let schema = self
            .schema
            .iter()
            .map(|(field, value)| (*field, value.clone()))
            .collect();
        let custom = self
            .custom
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        CanonicalPairs { schema, custom }
    }

    /// Decodes the parameters into a [`PaymentRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`HppError::FieldNotSet`] if a mandatory field is missing and
    /// [`HppError::InvalidInput`] if a value cannot be parsed.
    pub fn decode(&self) -> Result<PaymentRequest, HppError> {
        let require = |field| self.raw(field).ok_or(HppError::FieldNotSet(field));

        let amount_raw = require(PaymentField::Amount)?;
        let amount = amount_raw.parse::<Decimal>().map_err(|_| {
            HppError::invalid_input(format!(
                "amount must be a decimal number, '{amount_raw}' given"
            ))
        })?;

        let mut request = PaymentRequest::new(
            require(PaymentField::OrderId)?,
            require(PaymentField::UserId)?,
            require(PaymentField::Mcc)?,
            require(PaymentField::Currency)?,
            amount,
        )?;

        if let Some(nonce) = self.raw(PaymentField::Nonce) {
            request.set_nonce(nonce.parse::<Nonce>()?)?;
        }
        if let (Some(success), Some(failure)) = (
            self.raw(PaymentField::SuccessUrl),
            self.raw(PaymentField::FailureUrl),
        ) {
            request.set_redirect_urls(success, failure);
        } else if self.raw(PaymentField::SuccessUrl).is_some()
            || self.raw(PaymentField::FailureUrl).is_some()
        {
            return Err(HppError::invalid_input(
                "success_url and failure_url must be supplied together",
            ));
        }
        if let Some(description) = self.raw(PaymentField::Description) {
            request.set_description(description);
        }
        if let Some(phone) = self.raw(PaymentField::Phone) {
            request.set_phone(phone);
        }
        if let Some(email) = self.raw(PaymentField::Email) {
            request.set_email(email);
        }
        if let (Some(first), Some(last)) = (
            self.raw(PaymentField::FirstName),
            self.raw(PaymentField::LastName),
        ) {
            request.set_first_last_name(first, last);
        } else if self.raw(PaymentField::FirstName).is_some()
            || self.raw(PaymentField::LastName).is_some()
        {
            return Err(HppError::invalid_input(
                "first_name and last_name must be supplied together",
            ));
        }
        if let Some(show) = self.flag(PaymentField::ShowPhone)? {
            request.set_show_phone(show);
        }
        if let Some(show) = self.flag(PaymentField::ShowEmail)? {
            request.set_show_email(show);
        }
        if let Some(show) = self.flag(PaymentField::ShowDescription)? {
            request.set_show_description(show);
        }
        if let Some(show) = self.flag(PaymentField::ShowGdprAgreement)? {
            request.set_show_gdpr_agreement(show);
        }
        request.add_custom_fields(
            self.custom
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )?;
        Ok(request)
    }

    fn flag(&self, field: PaymentField) -> Result<Option<bool>, HppError> {
        self.raw(field)
            .map(|raw| match raw {
                "true" => Ok(true),
                "false" => Ok(false),
                other => Err(HppError::invalid_input(format!(
                    "{field} must be 'true' or 'false', '{other}' given"
                ))),
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> PaymentRequest {
        PaymentRequest::new("A1", "U9", "5411", "eur", dec!(19.99)).unwrap()
    }

    #[test]
    fn test_encode_mandatory_fields_in_order() {
        let mut request = sample();
        request.set_nonce(Nonce::new(1_700_000_000)).unwrap();
        let pairs = CanonicalEncoder::encode(&request);
        let collected: Vec<(&str, &str)> = pairs.iter().collect();
        assert_eq!(
            collected,
            [
                ("order_id", "A1"),
                ("user_id", "U9"),
                ("mcc", "5411"),
                ("currency_iso", "EUR"),
                ("amount", "19.99"),
                ("ts_nonce", "1700000000"),
            ]
        );
    }

    #[test]
    fn test_encode_skips_unset_fields_and_orders_by_schema() {
        let mut request = sample();
        // Set in reverse schema order; output must follow the schema.
        request
            .set_show_gdpr_agreement(true)
            .set_email("a@b.c")
            .set_redirect_urls("https://s", "https://f");
        let query = CanonicalEncoder::encode(&request).to_query();
        assert_eq!(
            query,
            "order_id=A1&user_id=U9&mcc=5411&currency_iso=EUR&amount=19.99\
             &success_url=https%3A%2F%2Fs&failure_url=https%3A%2F%2Ff\
             &email=a%40b.c&show_gdpr_agreement=true"
        );
    }

    #[test]
    fn test_custom_fields_follow_schema_in_key_order() {
        let mut request = sample();
        request.add_custom_field("custom_zeta", "z").unwrap();
        request.add_custom_field("custom_alpha", "a").unwrap();
        request.set_phone("1");
        let pairs = CanonicalEncoder::encode(&request);
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "order_id",
                "user_id",
                "mcc",
                "currency_iso",
                "amount",
                "phone",
                "custom_alpha",
                "custom_zeta",
            ]
        );
    }

    #[test]
    fn test_query_uses_plus_for_spaces() {
        let mut request = sample();
        request.set_description("two words & more");
        let query = CanonicalEncoder::encode(&request).to_query();
        assert!(query.ends_with("&description=two+words+%26+more"));
    }

    #[test]
    fn test_signed_query_appends_signature_last() {
        let pairs = CanonicalEncoder::encode(&sample());
        let query = pairs.to_signed_query("abc123");
        assert!(query.ends_with("&amount=19.99&signature=abc123"));
    }

    #[test]
    fn test_callback_params_split_namespaces() {
        let params = CallbackParams::from_query(
            "https://shop.test/return?order_id=A1&custom_cart=7&status=success&signature=ff",
        )
        .unwrap();
        assert_eq!(params.raw(PaymentField::OrderId), Some("A1"));
        assert_eq!(params.signature(), Some("ff"));
        assert_eq!(params.extra().get("status").map(String::as_str), Some("success"));
        assert_eq!(params.canonical().custom(), [("custom_cart".to_owned(), "7".to_owned())]);
    }

    #[test]
    fn test_callback_params_reject_duplicate_keys() {
        for query in [
            "amount=1&amount=2",
            "signature=a&signature=b",
            "custom_cart=1&custom_cart=2",
        ] {
            let err = CallbackParams::from_query(query).unwrap_err();
            assert!(matches!(err, HppError::InvalidInput(_)), "{query}");
        }
        let params = CallbackParams::from_query("status=a&status=b").unwrap();
        assert_eq!(params.extra().get("status").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_raw_query_with_unescaped_url_values() {
        let params = CallbackParams::from_query(
            "order_id=A1&success_url=https://s.test/ok?x=1&failure_url=https://s.test/fail\
             &signature=ff",
        )
        .unwrap();
        assert_eq!(params.raw(PaymentField::SuccessUrl), Some("https://s.test/ok?x=1"));
        assert_eq!(params.raw(PaymentField::FailureUrl), Some("https://s.test/fail"));
        assert_eq!(params.signature(), Some("ff"));
    }

    #[test]
    fn test_leading_question_mark_is_ignored() {
        let params = CallbackParams::from_query("?order_id=A1&signature=ff").unwrap();
        assert_eq!(params.raw(PaymentField::OrderId), Some("A1"));
        assert_eq!(params.signature(), Some("ff"));
    }

    #[test]
    fn test_decode_roundtrips_configured_request() {
        let mut request = sample();
        request
            .set_nonce(Nonce::new(1_700_000_000))
            .unwrap()
            .set_redirect_urls("https://s.test/ok?a=1", "https://s.test/fail")
            .set_description("two words")
            .set_first_last_name("Ann", "Lee")
            .set_show_phone(false)
            .add_custom_field("custom_ref", "r 1")
            .unwrap();

        let query = CanonicalEncoder::encode(&request).to_query();
        let decoded = CallbackParams::from_query(&query).unwrap().decode().unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_decode_requires_mandatory_fields() {
        let params =
            CallbackParams::from_query("order_id=A1&user_id=U9&mcc=5411&amount=1").unwrap();
        assert!(matches!(
            params.decode(),
            Err(HppError::FieldNotSet(PaymentField::Currency))
        ));
    }

    #[test]
    fn test_decode_rejects_malformed_values() {
        let base = "order_id=A1&user_id=U9&mcc=5411&currency_iso=EUR";
        for tail in [
            "&amount=abc",
            "&amount=-1",
            "&amount=1&ts_nonce=x",
            "&amount=1&show_email=yes",
            "&amount=1&success_url=https%3A%2F%2Fs",
        ] {
            let params = CallbackParams::from_query(&format!("{base}{tail}")).unwrap();
            assert!(
                matches!(params.decode(), Err(HppError::InvalidInput(_))),
                "{tail}"
            );
        }
    }
}
