// ABOUTME: Garmin Connect API client with authenticated fan-out snapshot aggregation
// ABOUTME: Request executor, per-endpoint fetchers, aggregation engine, and alarm scheduler
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Garmin Connect Client
//!
//! An async client for the Garmin Connect wellness API. The heart of the
//! crate is the authenticated fan-out pipeline: one
//! [`GarminClient::build_snapshot`] call fetches ~30 sub-resources (daily
//! summary, sleep, stress, body battery, training metrics, gear, blood
//! pressure, device alarms, ...) and folds them into a single flat snapshot
//! for one calendar date.
//!
//! ## Features
//!
//! - **Token-based auth**: bring your own [`TokenProvider`]; 401 responses
//!   trigger one refresh and one transparent retry
//! - **Transient-failure retry**: 429/5xx responses back off exponentially
//!   (1 s, 2 s, 4 s) before giving up
//! - **Failure isolation**: a failing sub-resource costs only its own fields;
//!   the snapshot is always best-effort
//! - **Alarm scheduling**: device alarms become concrete next-occurrence
//!   timestamps in the user's timezone
//!
//! ## Example
//!
//! ```rust,no_run
//! use garmin_connect::{GarminClient, StaticTokenProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> garmin_connect::GarminResult<()> {
//!     let auth = Arc::new(StaticTokenProvider::new("oauth-access-token"));
//!     let client = GarminClient::new(auth);
//!
//!     let today = chrono::Utc::now().date_naive();
//!     let snapshot = client.build_snapshot(today, Some("Europe/Berlin")).await?;
//!     println!("steps today: {:?}", snapshot.get("totalSteps"));
//!     Ok(())
//! }
//! ```

/// Next-occurrence scheduling for device alarms
pub mod alarms;

/// Credential provider contract and the fixed-token implementation
pub mod auth;

/// Client construction, region selection, and the social-profile cache
pub mod client;

/// API origins, endpoint paths, headers, and tuning constants
pub mod constants;

/// Error types shared across the crate
pub mod errors;

/// Authenticated request executor with refresh and retry semantics
pub mod request;

/// Per-endpoint sub-resource fetchers
pub mod resources;

/// Aggregation engine building the flat daily snapshot
pub mod snapshot;

// Re-export key types for convenience

pub use auth::{StaticTokenProvider, TokenProvider};
pub use client::{GarminClient, GarminClientBuilder, GarminDomain};
pub use errors::{GarminError, GarminResult};
pub use request::RetryConfig;
pub use snapshot::Snapshot;
