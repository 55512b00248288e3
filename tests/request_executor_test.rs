// ABOUTME: Integration tests for the authenticated request executor
// ABOUTME: Exercises token injection, 401 recovery, empty-body normalization, and retry behavior
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use async_trait::async_trait;
use garmin_connect::{
    GarminClient, GarminError, GarminResult, RetryConfig, StaticTokenProvider, TokenProvider,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROBE_PATH: &str = "/biometric-service/biometric/latestBiometrics";

/// Provider that swaps in a fresh token when refreshed, counting refreshes.
struct RefreshingProvider {
    current: tokio::sync::RwLock<String>,
    next: String,
    refreshes: AtomicUsize,
}

impl RefreshingProvider {
    fn new(current: &str, next: &str) -> Self {
        Self {
            current: tokio::sync::RwLock::new(current.to_owned()),
            next: next.to_owned(),
            refreshes: AtomicUsize::new(0),
        }
    }

    fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for RefreshingProvider {
    async fn access_token(&self) -> Option<String> {
        Some(self.current.read().await.clone())
    }

    async fn refresh(&self) -> GarminResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        *self.current.write().await = self.next.clone();
        Ok(())
    }
}

/// Provider whose refresh drops the token entirely.
struct ClearingProvider {
    current: tokio::sync::RwLock<Option<String>>,
}

impl ClearingProvider {
    fn new(token: &str) -> Self {
        Self {
            current: tokio::sync::RwLock::new(Some(token.to_owned())),
        }
    }
}

#[async_trait]
impl TokenProvider for ClearingProvider {
    async fn access_token(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    async fn refresh(&self) -> GarminResult<()> {
        *self.current.write().await = None;
        Ok(())
    }
}

/// Client against the mock server with near-instant backoff delays.
fn client_for(server: &MockServer, provider: Arc<dyn TokenProvider>) -> GarminClient {
    GarminClient::builder(provider)
        .base_url(server.uri())
        .retry(RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 5,
        })
        .build()
}

#[tokio::test]
async fn test_missing_token_fails_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::unauthenticated()));
    let err = client.lactate_threshold().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_empty_token_counts_as_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_success_carries_bearer_and_identity_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("User-Agent", "GCM-iOS-5.7.2.1"))
        .and(header("Accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"lactateThresholdHeartRate": 165})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("test-token")));
    let result = client.lactate_threshold().await.unwrap();
    assert_eq!(result, json!({"lactateThresholdHeartRate": 165}));
}

#[tokio::test]
async fn test_no_content_normalizes_to_empty_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let result = client.lactate_threshold().await.unwrap();
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn test_not_found_normalizes_to_empty_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let result = client.lactate_threshold().await.unwrap();
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn test_401_then_success_refreshes_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(RefreshingProvider::new("stale", "fresh"));
    let client = client_for(&server, provider.clone());

    let result = client.lactate_threshold().await.unwrap();
    assert_eq!(result, json!({"ok": true}));
    assert_eq!(provider.refresh_count(), 1);
}

#[tokio::test]
async fn test_second_401_is_terminal_with_a_single_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let provider = Arc::new(RefreshingProvider::new("stale", "also-rejected"));
    let client = client_for(&server, provider.clone());

    let err = client.lactate_threshold().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(provider.refresh_count(), 1);
}

#[tokio::test]
async fn test_failed_refresh_still_retries_with_stale_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    // The static provider cannot refresh; the stale token is re-sent once and
    // the second 401 becomes the terminal error.
    let client = client_for(&server, Arc::new(StaticTokenProvider::new("stale")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_refresh_that_clears_the_token_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(ClearingProvider::new("stale")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_429_responses_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let result = client.lactate_threshold().await.unwrap();
    assert_eq!(result, json!({"ok": 1}));
}

#[tokio::test]
async fn test_429_gives_up_after_three_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    assert!(client.lactate_threshold().await.is_ok());
}

#[tokio::test]
async fn test_server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_client_errors_fail_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_429_on_the_post_refresh_retry_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    // The retried call after a refresh accepts only 200/204/404; it never
    // burns the transient-failure retry budget.
    let provider = Arc::new(RefreshingProvider::new("stale", "fresh"));
    let client = client_for(&server, provider.clone());

    let err = client.lactate_threshold().await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(provider.refresh_count(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_an_api_error_without_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let err = client.lactate_threshold().await.unwrap_err();
    assert!(matches!(err, GarminError::Api { status: None, .. }));
}

#[tokio::test]
async fn test_activity_search_sends_pagination_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activitylist-service/activities/search/activities"))
        .and(query_param("start", "20"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"activityId": 21, "activityName": "Tempo Run"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let result = client.activities(20, 10).await.unwrap();
    assert_eq!(result, json!([{"activityId": 21, "activityName": "Tempo Run"}]));
}

#[tokio::test]
async fn test_activity_types_catalogue_is_a_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/activity-service/activity/activityTypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"typeId": 1, "typeKey": "running"},
            {"typeId": 2, "typeKey": "cycling"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(StaticTokenProvider::new("t")));
    let types = client.activity_types().await.unwrap();
    assert_eq!(types.as_array().map(Vec::len), Some(2));
}
