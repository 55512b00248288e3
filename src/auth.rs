// ABOUTME: Credential provider contract consumed by the request executor
// ABOUTME: Ships a fixed-token implementation for embedders that manage tokens out of band
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::errors::{GarminError, GarminResult};
use async_trait::async_trait;

/// Source of the bearer access token used on every API call.
///
/// The login/MFA handshake and token persistence live outside this crate;
/// implementations own the credential and its lifecycle. The client only ever
/// reads the current token and asks for a refresh after a 401.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current bearer access token, if one is held.
    ///
    /// An empty string is treated by the client exactly like `None`.
    async fn access_token(&self) -> Option<String>;

    /// Obtain a fresh token after the current one was rejected.
    ///
    /// A failed refresh must leave the stored token unusable (stale or
    /// cleared) rather than silently pretending success; the executor retries
    /// the request with whatever `access_token` returns afterwards.
    async fn refresh(&self) -> GarminResult<()>;
}

/// Provider wrapping a token obtained out of band.
///
/// Cannot mint new tokens: `refresh` always fails and the stored token stays
/// as-is, so a rejected token surfaces as an API error on the retried call.
pub struct StaticTokenProvider {
    token: tokio::sync::RwLock<Option<String>>,
}

impl StaticTokenProvider {
    /// Wrap an existing bearer token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: tokio::sync::RwLock::new(Some(token.into())),
        }
    }

    /// Provider that starts without any token.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            token: tokio::sync::RwLock::new(None),
        }
    }

    /// Replace the stored token, e.g. after an external re-login.
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Drop the stored token.
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    async fn refresh(&self) -> GarminResult<()> {
        Err(GarminError::auth(
            "static token provider cannot mint a new token",
        ))
    }
}
