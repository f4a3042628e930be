// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed response bodies for the Kiali endpoints the probe reads.
//!
//! Only the fields the probe looks at are modelled; everything is optional or
//! defaulted so that newer server versions adding fields keep decoding.

use crate::constants::TOKEN_AUTH_STRATEGIES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Authentication
// ============================================================================

/// Body of `/api/auth/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    /// Authentication strategy (`anonymous`, `token`, `openshift`, `openid`, `header`)
    pub strategy: String,
    /// OAuth authorization endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    /// Logout endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logout_endpoint: Option<String>,
    /// Current session, if any
    #[serde(default)]
    pub session_info: SessionInfo,
    /// True when the signing secret is missing on the server
    #[serde(default)]
    pub secret_missing: bool,
}

impl AuthInfo {
    /// True if the strategy only accepts bearer tokens.
    #[must_use]
    pub fn requires_token(&self) -> bool {
        TOKEN_AUTH_STRATEGIES
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&self.strategy))
    }
}

/// Session details attached to [`AuthInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Logged in user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Session expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<String>,
}

// ============================================================================
// Status
// ============================================================================

/// Body of `/api/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    /// Free form status entries (`Kiali version`, `Kiali state`, ...)
    #[serde(default)]
    pub status: BTreeMap<String, String>,
    /// Versions of the services Kiali talks to
    #[serde(default)]
    pub external_services: Vec<ExternalServiceInfo>,
    /// Warnings raised by the server
    #[serde(default)]
    pub warning_messages: Vec<String>,
    /// Mesh environment flags
    #[serde(default)]
    pub istio_environment: Option<IstioEnvironment>,
}

impl StatusInfo {
    /// `Kiali version` entry.
    #[must_use]
    pub fn kiali_version(&self) -> Option<&str> {
        self.status.get("Kiali version").map(String::as_str)
    }

    /// `Kiali state` entry.
    #[must_use]
    pub fn kiali_state(&self) -> Option<&str> {
        self.status.get("Kiali state").map(String::as_str)
    }
}

/// One external service in [`StatusInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalServiceInfo {
    /// Service name
    pub name: String,
    /// Reported version
    #[serde(default)]
    pub version: Option<String>,
    /// Service URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Mesh environment flags in [`StatusInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IstioEnvironment {
    /// True when the Istio API is reachable
    #[serde(default, rename = "istioAPIEnabled")]
    pub istio_api_enabled: bool,
}

// ============================================================================
// Health
// ============================================================================

/// Kind of object a namespace health query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthType {
    /// App health (the server default)
    #[default]
    App,
    /// Service health
    Service,
    /// Workload health
    Workload,
}

impl HealthType {
    /// Query parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthType::App => "app",
            HealthType::Service => "service",
            HealthType::Workload => "workload",
        }
    }
}

impl fmt::Display for HealthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `/api/namespaces/{namespace}/health`, keyed by object name.
pub type NamespaceHealth = BTreeMap<String, ObjectHealth>;

/// Health of one app, service or workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectHealth {
    /// Replica status per workload (apps)
    #[serde(default)]
    pub workload_statuses: Option<Vec<WorkloadStatus>>,
    /// Replica status (workloads)
    #[serde(default)]
    pub workload_status: Option<WorkloadStatus>,
    /// Request rates by direction
    #[serde(default)]
    pub requests: Option<RequestHealth>,
}

impl ObjectHealth {
    /// True if every reported workload has all desired replicas available.
    #[must_use]
    pub fn replicas_ready(&self) -> bool {
        self.workload_statuses
            .iter()
            .flatten()
            .chain(self.workload_status.iter())
            .all(WorkloadStatus::is_ready)
    }
}

/// Replica counts for one workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStatus {
    /// Workload name
    pub name: String,
    /// Desired replicas
    #[serde(default)]
    pub desired_replicas: i32,
    /// Current replicas
    #[serde(default)]
    pub current_replicas: i32,
    /// Available replicas
    #[serde(default)]
    pub available_replicas: i32,
    /// Replicas with a synced sidecar, `-1` when unknown
    #[serde(default)]
    pub synced_proxies: i32,
}

impl WorkloadStatus {
    /// True if all desired replicas are available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.available_replicas >= self.desired_replicas
    }
}

/// Request rates keyed by protocol, then by response code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestHealth {
    /// Inbound rates
    #[serde(default)]
    pub inbound: BTreeMap<String, BTreeMap<String, f64>>,
    /// Outbound rates
    #[serde(default)]
    pub outbound: BTreeMap<String, BTreeMap<String, f64>>,
}

// ============================================================================
// Metrics
// ============================================================================

/// One series in a metrics response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    /// Series name
    pub name: String,
    /// Prometheus labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// `[timestamp, value]` pairs, left undecoded
    #[serde(default)]
    pub datapoints: Vec<serde_json::Value>,
    /// Aggregation (`avg`, `0.99`, ...) for histograms
    #[serde(default)]
    pub stat: Option<String>,
}

/// Body of the namespace and object metrics endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    /// gRPC messages received
    #[serde(default)]
    pub grpc_received: Vec<MetricSeries>,
    /// gRPC messages sent
    #[serde(default)]
    pub grpc_sent: Vec<MetricSeries>,
    /// Request count
    #[serde(default)]
    pub request_count: Vec<MetricSeries>,
    /// Request error count
    #[serde(default)]
    pub request_error_count: Vec<MetricSeries>,
    /// Request duration histogram
    #[serde(default)]
    pub request_duration_millis: Vec<MetricSeries>,
    /// Request throughput
    #[serde(default)]
    pub request_throughput: Vec<MetricSeries>,
    /// Response throughput
    #[serde(default)]
    pub response_throughput: Vec<MetricSeries>,
    /// Request size histogram
    #[serde(default)]
    pub request_size: Vec<MetricSeries>,
    /// Response size histogram
    #[serde(default)]
    pub response_size: Vec<MetricSeries>,
    /// TCP bytes received
    #[serde(default)]
    pub tcp_received: Vec<MetricSeries>,
    /// TCP bytes sent
    #[serde(default)]
    pub tcp_sent: Vec<MetricSeries>,
    /// TCP connections opened
    #[serde(default)]
    pub tcp_opened: Vec<MetricSeries>,
    /// TCP connections closed
    #[serde(default)]
    pub tcp_closed: Vec<MetricSeries>,
}

impl MetricsResponse {
    /// Total number of series across all metrics.
    #[must_use]
    pub fn series_count(&self) -> usize {
        [
            &self.grpc_received,
            &self.grpc_sent,
            &self.request_count,
            &self.request_error_count,
            &self.request_duration_millis,
            &self.request_throughput,
            &self.response_throughput,
            &self.request_size,
            &self.response_size,
            &self.tcp_received,
            &self.tcp_sent,
            &self.tcp_opened,
            &self.tcp_closed,
        ]
        .iter()
        .map(|series| series.len())
        .sum()
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod models_tests;
