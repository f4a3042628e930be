// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for kiali-probe.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Polling Constants
// ============================================================================

/// Default interval between poll attempts (1 second)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Default deadline for a single wait scope (60 seconds)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

/// Deadline used when waiting for the Kiali config map to change (5 minutes)
pub const CONFIG_MAP_TIMEOUT_SECS: u64 = 300;

/// Interval used when waiting for the Kiali config map to change
pub const CONFIG_MAP_POLL_INTERVAL_SECS: u64 = 10;

/// Deadline used when waiting for the Kiali deployment to become ready (3 minutes)
pub const DEPLOYMENT_READY_TIMEOUT_SECS: u64 = 180;

/// Interval used when waiting for the Kiali deployment to become ready
pub const DEPLOYMENT_READY_POLL_INTERVAL_SECS: u64 = 3;

/// Message carried by the timeout raised while waiting for a badge to appear
pub const CREATE_TIMEOUT_MESSAGE: &str = "Timed out waiting for Create";

/// Message carried by the timeout raised while waiting for a badge to disappear
pub const DELETE_TIMEOUT_MESSAGE: &str = "Timed out waiting for Delete";

// ============================================================================
// HTTP API Constants
// ============================================================================

/// Per-request timeout for Kiali API calls (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default graph duration query parameter
pub const DEFAULT_GRAPH_DURATION: &str = "60s";

/// Maximum number of response body bytes kept in error messages
pub const ERROR_BODY_PREVIEW_LEN: usize = 512;

/// Auth strategies that require a bearer token to be configured
pub const TOKEN_AUTH_STRATEGIES: &[&str] = &["openshift", "token"];

// ============================================================================
// Environment Variables
// ============================================================================

/// Kiali base URL (`https://kiali-hostname`)
pub const ENV_KIALI_URL: &str = "URL";

/// Bearer token used when the auth strategy requires one
pub const ENV_KIALI_TOKEN: &str = "TOKEN";

/// Skip TLS certificate verification when set to `true`
pub const ENV_INSECURE: &str = "KIALI_PROBE_INSECURE";

/// Per-request timeout override in seconds
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "KIALI_PROBE_REQUEST_TIMEOUT_SECS";

/// Path or name of the cluster CLI binary
pub const ENV_OC_BINARY: &str = "KIALI_PROBE_OC";

// ============================================================================
// Cluster Constants
// ============================================================================

/// Default cluster CLI binary
pub const DEFAULT_OC_BINARY: &str = "oc";

/// Label selector used to find the Kiali deployment
pub const KIALI_LABEL_SELECTOR: &str = "app=kiali";

/// Key holding the Kiali configuration inside its config map
pub const KIALI_CONFIG_KEY: &str = "config.yaml";

/// Pod template annotation used to trigger a rolling restart
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

/// Default namespace for mesh sample workloads
pub const DEFAULT_NAMESPACE: &str = "bookinfo";

#[cfg(test)]
#[path = "constants_tests.rs"]
mod constants_tests;
