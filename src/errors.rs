// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for kiali-probe.
//!
//! Every wait, fetch and cluster mutation in the library returns [`ProbeError`].
//! The variants separate three kinds of failure that a scenario must never
//! confuse:
//!
//! - the system has not converged yet and the deadline ran out ([`ProbeError::Timeout`])
//! - the system answered with an error ([`ProbeError::UnexpectedStatus`])
//! - the observed state is structurally wrong ([`ProbeError::Assertion`])
//!
//! All of them are fatal to the running scenario. None are retried here.

use crate::graph::GraphType;
use crate::status_codes::map_status_to_reason;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the library.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors raised by probes, pollers and collaborators.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Deadline exceeded while waiting for a condition
    ///
    /// Carries the message given when the deadline was created and a debug
    /// rendering of the last value the poller fetched, if any.
    #[error("{message}")]
    Timeout {
        /// Message supplied when the deadline was created
        message: String,
        /// Time spent in the wait scope
        elapsed: Duration,
        /// Last fetched value, rendered with `Debug`
        last_observation: Option<String>,
    },

    /// A fetch returned a status code outside the expected set
    #[error("{operation} returned HTTP {actual}, expected one of {expected:?}: {reason}")]
    UnexpectedStatus {
        /// Named API operation
        operation: String,
        /// Accepted status codes
        expected: Vec<u16>,
        /// Status code actually received
        actual: u16,
        /// Human readable classification of `actual`
        reason: String,
        /// Start of the response body
        body: String,
    },

    /// The observed state does not match what the scenario requires
    #[error("assertion failed: {message}")]
    Assertion {
        /// What was expected
        message: String,
        /// Last observed value, rendered with `Debug`
        last_observation: Option<String>,
    },

    /// Two graphs of different granularity were compared
    #[error("graph type mismatch: expected {expected}, got {actual}")]
    GraphTypeMismatch {
        /// Graph type the comparison is bound to
        expected: GraphType,
        /// Graph type of the offending snapshot
        actual: GraphType,
    },

    /// An argument is out of range (zero interval, zero deadline, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The named API operation is not in the operation table
    #[error("unknown API operation '{0}'")]
    UnknownOperation(String),

    /// A path template placeholder had no value
    #[error("operation '{operation}' requires path parameter '{parameter}'")]
    MissingPathParameter {
        /// Named API operation
        operation: String,
        /// Missing placeholder
        parameter: String,
    },

    /// Invalid or incomplete configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport level HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("failed to decode {context}: {source}")]
    Decode {
        /// What was being decoded
        context: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Suite or fixture YAML could not be parsed
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A cluster CLI command could not be spawned
    #[error("failed to run '{command}': {source}")]
    Command {
        /// Command line that failed
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Kubernetes API failure
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl ProbeError {
    /// Build an `UnexpectedStatus` error, classifying the status and trimming the body.
    #[must_use]
    pub fn unexpected_status(operation: &str, expected: &[u16], actual: u16, body: &str) -> Self {
        let (_, reason) = map_status_to_reason(actual);
        let body = body
            .chars()
            .take(crate::constants::ERROR_BODY_PREVIEW_LEN)
            .collect();
        Self::UnexpectedStatus {
            operation: operation.to_string(),
            expected: expected.to_vec(),
            actual,
            reason,
            body,
        }
    }

    /// Build an `Assertion` error without an observation.
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
            last_observation: None,
        }
    }

    /// Build a `Decode` error with context.
    #[must_use]
    pub fn decode(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            context: context.into(),
            source,
        }
    }

    /// True for deadline expiry.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Last observation attached to a timeout or assertion, if any.
    #[must_use]
    pub fn last_observation(&self) -> Option<&str> {
        match self {
            Self::Timeout {
                last_observation, ..
            }
            | Self::Assertion {
                last_observation, ..
            } => last_observation.as_deref(),
            _ => None,
        }
    }

    /// Short label used for metrics (`timeout`, `unexpected_status`, ...).
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Assertion { .. } | Self::GraphTypeMismatch { .. } => "assertion",
            Self::InvalidArgument(_)
            | Self::UnknownOperation(_)
            | Self::MissingPathParameter { .. }
            | Self::Config(_) => "invalid_input",
            Self::Http(_) => "network_error",
            Self::Decode { .. } | Self::Yaml(_) => "decode_error",
            Self::Command { .. } => "command_error",
            Self::Kube(_) => "kube_error",
        }
    }
}
