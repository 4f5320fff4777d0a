//! Gravatar URL builder and existence probe.
//!
//! [`Gravatar`] is immutable and cheap to clone: it holds the injected
//! profile store, the parameter pipeline, and a shared `reqwest::Client`.
//! Per-call state (the default-image override) lives in a [`Request`]
//! value, so one `Gravatar` can serve concurrent callers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::config::GravatarConfig;
use crate::email::{hash_email, validate_email};
use crate::error::GravatarError;
use crate::fallback::Fallback;
use crate::params::{assemble, default_parameters, ParamContext, ParameterFn};
use crate::profile::{Profile, ProfileStore, ResolvedProfile, Selector};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default-image value that makes Gravatar answer 404 for unknown hashes.
const NOT_FOUND_SENTINEL: u16 = 404;

/// Builds avatar URLs from an email address and a profile selection.
#[derive(Clone)]
pub struct Gravatar {
    store: Arc<dyn ProfileStore>,
    client: Client,
    base_url: Url,
    secure_base_url: Url,
    parameters: Arc<[ParameterFn]>,
}

impl fmt::Debug for Gravatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gravatar")
            .field("base_url", &self.base_url.as_str())
            .field("secure_base_url", &self.secure_base_url.as_str())
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}

impl Gravatar {
    /// Creates a builder pointed at the public Gravatar hosts.
    ///
    /// # Errors
    ///
    /// Returns [`GravatarError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(store: Arc<dyn ProfileStore>) -> Result<Self, GravatarError> {
        Self::from_config(store, &GravatarConfig::default())
    }

    /// Creates a builder from runtime configuration (hosts, probe timeout,
    /// user agent). Point the hosts at a mock server in tests.
    ///
    /// # Errors
    ///
    /// Returns [`GravatarError::Http`] if the HTTP client cannot be built, or
    /// [`GravatarError::InvalidBaseUrl`] if either host is not a valid
    /// absolute URL.
    pub fn from_config(
        store: Arc<dyn ProfileStore>,
        config: &GravatarConfig,
    ) -> Result<Self, GravatarError> {
        let timeout = Duration::from_secs(config.probe_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            store,
            client,
            base_url: avatar_base(&config.base_url)?,
            secure_base_url: avatar_base(&config.secure_base_url)?,
            parameters: default_parameters().into(),
        })
    }

    /// Replaces the parameter pipeline. Functions run in the given order.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<ParameterFn>) -> Self {
        self.parameters = parameters.into();
        self
    }

    #[must_use]
    pub fn store(&self) -> &dyn ProfileStore {
        self.store.as_ref()
    }

    /// Starts a request with no default-image override.
    pub fn request(&self) -> Request<'_> {
        Request {
            gravatar: self,
            fallback: None,
        }
    }

    /// Starts a request whose next URL uses `value` as the default image.
    ///
    /// See [`Request::fallback`] for accepted values.
    pub fn fallback(&self, value: &str) -> Request<'_> {
        self.request().fallback(value)
    }

    /// Builds the avatar URL for `email` with the selected profile.
    ///
    /// # Errors
    ///
    /// Returns [`GravatarError::InvalidEmail`] for a malformed address.
    pub fn get(&self, email: &str, selector: impl Into<Selector>) -> Result<Url, GravatarError> {
        self.request().get(email, selector)
    }

    /// Asks Gravatar whether an avatar is registered for `email`.
    ///
    /// Best-effort: a failed probe (network, DNS, timeout) is logged and
    /// reported as `false`. Use [`Gravatar::probe`] to see those failures.
    ///
    /// # Errors
    ///
    /// Returns [`GravatarError::InvalidEmail`] for a malformed address.
    pub async fn exists(&self, email: &str) -> Result<bool, GravatarError> {
        match self.probe(email).await {
            Err(GravatarError::ProbeFailed { url, source }) => {
                tracing::warn!(url = %url, error = %source, "gravatar probe failed");
                Ok(false)
            }
            other => other,
        }
    }

    /// Sends a `HEAD` request for `email`'s avatar with the `d=404` sentinel
    /// and returns whether Gravatar answered `200 OK`.
    ///
    /// Uses the `default` profile; any per-call default image is ignored so
    /// the sentinel always reaches the service.
    ///
    /// # Errors
    ///
    /// - [`GravatarError::InvalidEmail`] for a malformed address, before any
    ///   network access.
    /// - [`GravatarError::ProbeFailed`] if the request could not complete.
    pub async fn probe(&self, email: &str) -> Result<bool, GravatarError> {
        validate_email(email)?;

        let sentinel = Profile::new().with("fallback", NOT_FOUND_SENTINEL);
        let profile = self.store.resolve(&Selector::Overrides(sentinel));
        let url = self.build_url(email, &profile, None);

        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|source| GravatarError::ProbeFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!(url = %url, status = status.as_u16(), "gravatar probe answered");
        Ok(status == StatusCode::OK)
    }

    /// Concatenates host, hash, optional extension, and the assembled query.
    ///
    /// The query separator is always present, even when no parameter is
    /// produced.
    fn build_url(
        &self,
        email: &str,
        profile: &ResolvedProfile,
        fallback: Option<&Fallback>,
    ) -> Url {
        let mut url = if profile.secure() {
            self.secure_base_url.clone()
        } else {
            self.base_url.clone()
        };

        let mut file = hash_email(email);
        if let Some(ext) = profile.force_extension() {
            file.push('.');
            file.push_str(&ext);
        }
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&file);
        }

        let ctx = ParamContext { profile, fallback };
        let pairs = assemble(&self.parameters, &ctx);
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }

        tracing::debug!(url = %url, "built gravatar url");
        url
    }
}

/// Normalises a host into `<host>/avatar/`.
fn avatar_base(raw: &str) -> Result<Url, GravatarError> {
    let normalised = format!("{}/avatar/", raw.trim_end_matches('/'));
    let url = Url::parse(&normalised).map_err(|e| GravatarError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(GravatarError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "not a hierarchical URL".to_string(),
        });
    }
    Ok(url)
}

/// One URL request: carries the per-call default-image override.
///
/// Consumed by [`Request::get`], so an override applies to exactly one URL.
#[derive(Debug, Clone)]
#[must_use]
pub struct Request<'a> {
    gravatar: &'a Gravatar,
    fallback: Option<Fallback>,
}

impl Request<'_> {
    /// Sets the default image for this request.
    ///
    /// Accepts a themed keyword (`mp`, `identicon`, `monsterid`, `wavatar`,
    /// `retro`, `robohash`, `blank`; `mm` is read as `mp`) or an absolute
    /// URL with a path. Any other value clears the override, leaving the
    /// profile's `fallback` in effect.
    pub fn fallback(mut self, value: &str) -> Self {
        self.fallback = Fallback::parse(value);
        if self.fallback.is_none() {
            tracing::warn!(fallback = %value, "ignoring unrecognized fallback image");
        }
        self
    }

    /// Builds the avatar URL for `email` with the selected profile.
    ///
    /// # Errors
    ///
    /// Returns [`GravatarError::InvalidEmail`] for a malformed address.
    pub fn get(self, email: &str, selector: impl Into<Selector>) -> Result<Url, GravatarError> {
        validate_email(email)?;

        let selector = selector.into();
        tracing::debug!(selector = ?selector, "resolving avatar profile");
        let profile = self.gravatar.store.resolve(&selector);

        Ok(self
            .gravatar
            .build_url(email, &profile, self.fallback.as_ref()))
    }
}
