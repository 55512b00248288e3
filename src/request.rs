// ABOUTME: Authenticated request executor with token refresh and transient-failure retry
// ABOUTME: Single entry point used by every sub-resource fetcher of the client
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! One logical API call = token injection, a single 401-triggered refresh with
//! one retried request, and a bounded backoff loop for 429/5xx responses. Each
//! backoff re-issue starts over from the token read, so a refresh performed by
//! an earlier attempt is picked up automatically.

use crate::auth::TokenProvider;
use crate::constants::{headers, retry};
use crate::errors::{GarminError, GarminResult};
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Configuration for retry behavior on 429 and 5xx responses.
///
/// Serializable so embedders can persist client settings alongside their own
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial call.
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds, doubled on each retry.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: retry::MAX_RETRIES,
            initial_backoff_ms: retry::INITIAL_BACKOFF_MS,
        }
    }
}

/// Outcome of one full attempt (including any 401 recovery within it).
enum Attempt {
    /// Terminal for this logical call, success or failure.
    Done(GarminResult<Value>),
    /// Retryable status; carries the status code for the give-up error.
    Transient(u16),
}

/// Issue one authenticated API call with full retry semantics.
///
/// Token expiry (401) is handled separately from capacity problems (429/5xx):
/// a 401 triggers one refresh and one immediate re-send, while 429/5xx burn
/// through the bounded backoff schedule. The two never consume each other's
/// budget.
pub(crate) async fn execute(
    http: &Client,
    auth: &dyn TokenProvider,
    retry: &RetryConfig,
    method: Method,
    url: &str,
    params: &[(&str, String)],
) -> GarminResult<Value> {
    let mut attempt: u32 = 0;
    loop {
        match attempt_once(http, auth, method.clone(), url, params).await {
            Attempt::Done(result) => return result,
            Attempt::Transient(status) => {
                if attempt >= retry.max_retries {
                    let max_retries = retry.max_retries;
                    error!("Garmin API request to {url} still failing ({status}) after {max_retries} retries");
                    return Err(GarminError::api(status, url));
                }
                let delay = backoff_delay(retry, attempt);
                let backoff_ms = delay.as_millis();
                let next = attempt + 1;
                let max_retries = retry.max_retries;
                warn!("Garmin API transient failure ({status}) - retry {next}/{max_retries} after {backoff_ms}ms backoff");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Delay before re-issuing attempt number `attempt` (zero-based).
fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let factor = 2_u64.saturating_pow(attempt);
    Duration::from_millis(retry.initial_backoff_ms.saturating_mul(factor))
}

/// 429 and all 5xx responses are worth re-trying after a backoff.
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One pass through the status-dispatch ladder, 401 recovery included.
async fn attempt_once(
    http: &Client,
    auth: &dyn TokenProvider,
    method: Method,
    url: &str,
    params: &[(&str, String)],
) -> Attempt {
    let Some(token) = usable_token(auth).await else {
        return Attempt::Done(Err(GarminError::auth("no access token available")));
    };

    debug!("Garmin API request: {method} {url}");
    let response = match send(http, method.clone(), url, params, &token).await {
        Ok(response) => response,
        Err(e) => {
            return Attempt::Done(Err(GarminError::transport(format!(
                "request to {url} failed: {e}"
            ))));
        }
    };

    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED => {
            Attempt::Done(recover_from_401(http, auth, method, url, params).await)
        }
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
            debug!("Garmin API returned {status} for {url} - treating as empty");
            Attempt::Done(Ok(empty_object()))
        }
        StatusCode::OK => Attempt::Done(parse_body(response, url).await),
        _ if is_transient(status) => Attempt::Transient(status.as_u16()),
        _ => Attempt::Done(Err(GarminError::api(status.as_u16(), url))),
    }
}

/// Refresh the credential once and re-send the request exactly once.
///
/// Only 200, 204, and 404 are acceptable on the retried call; everything else
/// (a second 401 included) is a terminal API error. A failing refresh is
/// logged but not propagated: the re-read token decides the outcome.
async fn recover_from_401(
    http: &Client,
    auth: &dyn TokenProvider,
    method: Method,
    url: &str,
    params: &[(&str, String)],
) -> GarminResult<Value> {
    warn!("Garmin API rejected token (401) for {url} - refreshing credentials");
    if let Err(e) = auth.refresh().await {
        warn!("Token refresh failed: {e}");
    }

    let Some(token) = usable_token(auth).await else {
        return Err(GarminError::auth("no access token available after refresh"));
    };

    let response = send(http, method, url, params, &token)
        .await
        .map_err(|e| GarminError::transport(format!("request to {url} failed: {e}")))?;

    let status = response.status();
    match status {
        StatusCode::OK => parse_body(response, url).await,
        StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(empty_object()),
        _ => Err(GarminError::api(status.as_u16(), url)),
    }
}

/// Current token, with an empty string treated as missing.
async fn usable_token(auth: &dyn TokenProvider) -> Option<String> {
    auth.access_token().await.filter(|token| !token.is_empty())
}

async fn send(
    http: &Client,
    method: Method,
    url: &str,
    params: &[(&str, String)],
    token: &str,
) -> Result<Response, reqwest::Error> {
    let mut request = http
        .request(method, url)
        .header("Authorization", format!("Bearer {token}"))
        .header("User-Agent", headers::USER_AGENT)
        .header("Accept", headers::ACCEPT);
    if !params.is_empty() {
        request = request.query(params);
    }
    request.send().await
}

async fn parse_body(response: Response, url: &str) -> GarminResult<Value> {
    response
        .json()
        .await
        .map_err(|e| GarminError::transport(format!("failed to parse response from {url}: {e}")))
}
