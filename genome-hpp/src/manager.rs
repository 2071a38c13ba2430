//! Merchant account and hosted payment page managers.
//!
//! [`MerchantAccountManager`] holds the merchant login and environment and
//! hands out [`HostedPaymentPageManager`]s, which own the API key, the API
//! secret and the [`SignatureMode`] and turn [`PaymentRequest`]s into signed
//! redirect URLs.
//!
//! Both types are immutable after construction and can be shared between
//! threads freely.
//!
//! # Example
//!
//! ```rust
//! use genome_hpp::environment::Environment;
//! use genome_hpp::manager::MerchantAccountManager;
//! use genome_hpp::payment::PaymentRequest;
//! use genome_hpp::signature::SignatureMode;
//! use rust_decimal::Decimal;
//!
//! let account = MerchantAccountManager::new("merchant", "password", Some(Environment::Sandbox));
//! let hpp = account.hosted_payment_page_manager("api-key", "api-secret", SignatureMode::ATs);
//!
//! let mut request = PaymentRequest::new("A1", "U9", "5411", "eur", Decimal::new(1999, 2))?;
//! request.set_nonce_automatically()?;
//!
//! let url = hpp.build_redirect_url(&request)?;
//! let verified = hpp.verify_callback_query(url.as_str())?;
//! assert_eq!(verified.request, request);
//! # Ok::<(), genome_hpp::error::HppError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "telemetry")]
use tracing::instrument;
use url::Url;

use crate::encoding::{CallbackParams, CanonicalEncoder};
use crate::environment::Environment;
use crate::error::HppError;
#[cfg(feature = "telemetry")]
use crate::field::PaymentField;
use crate::nonce::Nonce;
use crate::payment::PaymentRequest;
use crate::signature::{SignatureEngine, SignatureMode};

/// General manager for merchant account activity.
#[derive(Clone)]
pub struct MerchantAccountManager {
    login: String,
    password: String,
    environment: Environment,
}

impl fmt::Debug for MerchantAccountManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantAccountManager")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

impl MerchantAccountManager {
    /// Creates a manager, defaulting to [`Environment::Production`].
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        environment: Option<Environment>,
    ) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            environment: environment.unwrap_or_default(),
        }
    }

    /// Merchant account login.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Merchant account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Environment settings.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Creates a hosted payment page manager for this account.
    #[must_use]
    pub fn hosted_payment_page_manager(
        &self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        mode: SignatureMode,
    ) -> HostedPaymentPageManager {
        HostedPaymentPageManager::new(self.environment.clone(), api_key, api_secret, mode)
            .with_merchant_login(self.login.clone())
    }
}

/// A callback whose signature has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCallback {
    /// Payment data covered by the signature, plus custom fields.
    pub request: PaymentRequest,
    /// Parameters outside the schema and custom namespaces. Not signed.
    pub extra: BTreeMap<String, String>,
}

/// Builds signed hosted payment page redirects and verifies gateway callbacks.
#[derive(Debug, Clone)]
pub struct HostedPaymentPageManager {
    merchant_login: Option<String>,
    environment: Environment,
    api_key: String,
    engine: SignatureEngine,
    nonce_tolerance: Option<u64>,
}

impl HostedPaymentPageManager {
    /// Creates a manager for the given environment and credentials.
    pub fn new(
        environment: Environment,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        mode: SignatureMode,
    ) -> Self {
        Self {
            merchant_login: None,
            environment,
            api_key: api_key.into(),
            engine: SignatureEngine::new(api_secret, mode),
            nonce_tolerance: None,
        }
    }

    /// Records the login of the owning merchant account.
    #[must_use]
    pub fn with_merchant_login(mut self, login: impl Into<String>) -> Self {
        self.merchant_login = Some(login.into());
        self
    }

    /// Rejects inbound nonces more than `secs` seconds away from the
    /// verification time.
    #[must_use]
    pub fn with_nonce_tolerance(mut self, secs: u64) -> Self {
        self.nonce_tolerance = Some(secs);
        self
    }

    /// Login of the owning merchant account, if known.
    #[must_use]
    pub fn merchant_login(&self) -> Option<&str> {
        self.merchant_login.as_deref()
    }

    /// Hosted payment page API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Signature mode used for redirects and callbacks.
    #[must_use]
    pub const fn signature_mode(&self) -> SignatureMode {
        self.engine.mode()
    }

    /// Environment redirects are built for.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Encodes and signs `request`, returning the query string with the
    /// `signature` parameter last.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::MissingNonce`] if the mode is
    /// [`SignatureMode::ATs`] and the request has no nonce.
    pub fn build_query(&self, request: &PaymentRequest) -> Result<String, HppError> {
        let pairs = CanonicalEncoder::encode(request);
        let signature = self.engine.sign(&pairs)?;
        Ok(pairs.to_signed_query(&signature))
    }

    /// Builds the URL the customer is redirected to.
    ///
    /// # Errors
    ///
    /// Returns [`HppError::MissingNonce`] if the mode is
    /// [`SignatureMode::ATs`] and the request has no nonce, or
    /// [`HppError::InvalidBaseUrl`] if the environment URL is unusable.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "hpp.build_redirect_url",
            skip_all,
            fields(order_id = %request.order_id(), mode = %self.signature_mode())
        )
    )]
    pub fn build_redirect_url(&self, request: &PaymentRequest) -> Result<Url, HppError> {
        let query = self.build_query(request)?;
        let mut url = self.environment.base_url()?;
        url.set_query(Some(&query));
        #[cfg(feature = "telemetry")]
        tracing::debug!(environment = %self.environment, "Built redirect url");
        Ok(url)
    }

    /// Verifies a callback given as a query string or full URL.
    ///
    /// # Errors
    ///
    /// See [`Self::verify_callback`].
    pub fn verify_callback_query(&self, query: &str) -> Result<VerifiedCallback, HppError> {
        self.verify_callback(&CallbackParams::from_query(query)?)
    }

    /// Verifies a callback against the current time.
    ///
    /// # Errors
    ///
    /// See [`Self::verify_callback_at`].
    pub fn verify_callback(&self, params: &CallbackParams) -> Result<VerifiedCallback, HppError> {
        self.verify_callback_at(params, Nonce::now())
    }

    /// Verifies the signature of a callback and decodes its payment data.
    ///
    /// The signature is checked over the raw received values before any of
    /// them is parsed. The nonce window, if configured, is checked against
    /// `now` afterwards.
    ///
    /// # Errors
    ///
    /// - [`HppError::MissingSignature`] if there is no `signature` parameter
    /// - [`HppError::MissingNonce`] if the mode requires a nonce and none was sent
    /// - [`HppError::SignatureInvalid`] if the signature does not match
    /// - [`HppError::NonceExpired`] if the nonce lies outside the tolerance
    /// - [`HppError::FieldNotSet`] / [`HppError::InvalidInput`] if the signed
    ///   payload cannot be decoded
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "hpp.verify_callback",
            skip_all,
            fields(mode = %self.signature_mode(), order_id = params.raw(PaymentField::OrderId))
        )
    )]
    pub fn verify_callback_at(
        &self,
        params: &CallbackParams,
        now: Nonce,
    ) -> Result<VerifiedCallback, HppError> {
        let signature = params.signature().ok_or(HppError::MissingSignature)?;
        self.engine.verify(&params.canonical(), signature)?;

        let request = params.decode()?;
        if let (Some(tolerance), Some(nonce), true) = (
            self.nonce_tolerance,
            request.nonce(),
            self.signature_mode().requires_nonce(),
        ) {
            if nonce.distance(now) > tolerance {
                return Err(HppError::NonceExpired {
                    nonce,
                    now,
                    tolerance,
                });
            }
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(extra = params.extra().len(), "Callback signature verified");
        Ok(VerifiedCallback {
            request,
            extra: params.extra().clone(),
        })
    }
}
