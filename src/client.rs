// ABOUTME: Garmin Connect API client with builder-style construction
// ABOUTME: Owns the HTTP client, region selection, retry tuning, and the social-profile cache
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::auth::TokenProvider;
use crate::constants::{api, endpoints, http};
use crate::errors::{GarminError, GarminResult};
use crate::request::{self, RetryConfig};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Regional API family the account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarminDomain {
    /// Worldwide deployment (`garmin.com`).
    #[default]
    Global,
    /// Mainland-China deployment (`garmin.cn`).
    China,
}

/// Garmin Connect API client.
///
/// Construction goes through [`GarminClient::builder`]; all data access goes
/// through the per-resource methods and [`build_snapshot`]. The client keeps a
/// single-entry cache of the social profile because the display name and
/// profile id are interpolated into several endpoint URLs; the cache lives for
/// the lifetime of the client and is only dropped with it.
///
/// [`build_snapshot`]: GarminClient::build_snapshot
pub struct GarminClient {
    http: Client,
    auth: Arc<dyn TokenProvider>,
    base_url: String,
    retry: RetryConfig,
    profile: Mutex<Option<Value>>,
}

impl GarminClient {
    /// Start building a client around the given credential source.
    #[must_use]
    pub fn builder(auth: Arc<dyn TokenProvider>) -> GarminClientBuilder {
        GarminClientBuilder::new(auth)
    }

    /// Client with default configuration (global region, default retry).
    #[must_use]
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self::builder(auth).build()
    }

    /// API origin every request is issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Social profile of the signed-in user, fetched once and then served
    /// from the in-client cache.
    ///
    /// # Errors
    ///
    /// Returns [`GarminError::Auth`] when no usable credential exists and
    /// [`GarminError::Api`] when the profile endpoint fails.
    pub async fn user_profile(&self) -> GarminResult<Value> {
        let mut cache = self.profile.lock().await;
        if let Some(profile) = cache.as_ref() {
            debug!("Serving social profile from cache");
            return Ok(profile.clone());
        }
        let profile = self.api_get(endpoints::USER_PROFILE, &[]).await?;
        *cache = Some(profile.clone());
        Ok(profile)
    }

    /// Display name from the social profile, needed in several URLs.
    pub(crate) async fn display_name(&self) -> GarminResult<String> {
        let profile = self.user_profile().await?;
        profile
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| GarminError::transport("social profile carries no displayName"))
    }

    /// Numeric profile id from the social profile, needed by the gear service.
    pub(crate) async fn profile_id(&self) -> GarminResult<i64> {
        let profile = self.user_profile().await?;
        profile
            .get("profileId")
            .or_else(|| profile.get("id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| GarminError::transport("social profile carries no profile id"))
    }

    /// GET `path` under the configured origin through the request executor.
    pub(crate) async fn api_get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> GarminResult<Value> {
        let url = format!("{}{path}", self.base_url);
        request::execute(
            &self.http,
            self.auth.as_ref(),
            &self.retry,
            Method::GET,
            &url,
            params,
        )
        .await
    }
}

/// Builder for [`GarminClient`].
pub struct GarminClientBuilder {
    auth: Arc<dyn TokenProvider>,
    domain: GarminDomain,
    base_url: Option<String>,
    http: Option<Client>,
    retry: RetryConfig,
}

impl GarminClientBuilder {
    fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            domain: GarminDomain::default(),
            base_url: None,
            http: None,
            retry: RetryConfig::default(),
        }
    }

    /// Select the regional API family.
    #[must_use]
    pub fn domain(mut self, domain: GarminDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Override the API origin, e.g. to point at a mock server.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use a preconfigured HTTP client instead of the built-in one.
    #[must_use]
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Tune the 429/5xx retry behavior.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Finish construction.
    #[must_use]
    pub fn build(self) -> GarminClient {
        let base = self.base_url.unwrap_or_else(|| api::BASE_URL.to_owned());
        // Region selection is a plain domain substitution on the origin, the
        // same mechanism the mobile clients use.
        let base_url = match self.domain {
            GarminDomain::Global => base,
            GarminDomain::China => base.replace(api::GLOBAL_DOMAIN, api::CHINA_DOMAIN),
        };
        GarminClient {
            http: self.http.unwrap_or_else(default_http_client),
            auth: self.auth,
            base_url,
            retry: self.retry,
            profile: Mutex::new(None),
        }
    }
}

fn default_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(http::REQUEST_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(http::CONNECT_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| Client::new())
}
