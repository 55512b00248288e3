// ABOUTME: Error types shared by the request executor and the aggregation engine
// ABOUTME: Distinguishes fatal credential failures from per-resource API failures
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use thiserror::Error;

/// Result alias used throughout the crate.
pub type GarminResult<T> = Result<T, GarminError>;

/// Failure taxonomy of the client.
///
/// There are exactly two kinds: credential failures (`Auth`), which abort an
/// entire aggregation run, and everything else (`Api`), which the aggregation
/// engine swallows per sub-resource. Transport faults (connect errors, body
/// read errors, malformed JSON) are folded into `Api` with no status so that
/// downstream isolation logic has a single error kind to catch.
#[derive(Debug, Error)]
pub enum GarminError {
    /// No usable access token was available, before or after a refresh.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A request failed with a non-success HTTP status or a transport fault.
    #[error("{message}")]
    Api {
        /// Originating HTTP status, when the failure came from a response.
        status: Option<u16>,
        /// Human-readable failure description.
        message: String,
    },
}

impl GarminError {
    /// Credential failure. Fatal to a whole aggregation run.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Request rejected by the upstream API with the given status.
    pub fn api(status: u16, url: &str) -> Self {
        Self::Api {
            status: Some(status),
            message: format!("request to {url} failed with status {status}"),
        }
    }

    /// Transport-level fault with no HTTP status to report.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Api {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth(_) => None,
            Self::Api { status, .. } => *status,
        }
    }

    /// Whether this is a credential failure.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
