// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed wrappers over the operations the probe reads most.
//!
//! Each wrapper requires HTTP 200 and decodes the body into a model type.
//! Any other status surfaces as `UnexpectedStatus`.

use super::{ApiClient, ApiRequest, ApiResponse};
use crate::constants::DEFAULT_GRAPH_DURATION;
use crate::errors::ProbeResult;
use crate::graph::{GraphSnapshot, GraphType};
use crate::models::{AuthInfo, HealthType, MetricsResponse, NamespaceHealth, StatusInfo};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

/// Parameters of a namespace graph query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQuery {
    /// Namespaces to include
    pub namespaces: Vec<String>,
    /// Graph granularity
    pub graph_type: GraphType,
    /// Telemetry window (`60s`, `10m`, ...)
    pub duration: String,
    /// Additional query parameters (`injectServiceNodes`, `appenders`, ...)
    pub extra: BTreeMap<String, String>,
}

impl GraphQuery {
    /// Query for one namespace with the default duration.
    pub fn new(namespace: impl Into<String>, graph_type: GraphType) -> Self {
        Self {
            namespaces: vec![namespace.into()],
            graph_type,
            duration: DEFAULT_GRAPH_DURATION.to_string(),
            extra: BTreeMap::new(),
        }
    }

    /// Add a namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// Set the telemetry window.
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// Set an additional query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The `graphNamespaces` request for this query.
    #[must_use]
    pub fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::new("graphNamespaces")
            .with_param("namespaces", self.namespaces.join(","))
            .with_param("graphType", self.graph_type.as_str())
            .with_param("duration", self.duration.clone());
        for (key, value) in &self.extra {
            request = request.with_param(key.clone(), value.clone());
        }
        request
    }
}

/// Kind of object an object graph is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// An app, all versions
    App,
    /// A service
    Service,
    /// A workload
    Workload,
}

impl ObjectKind {
    fn graph_operation(self) -> &'static str {
        match self {
            ObjectKind::App => "graphApp",
            ObjectKind::Service => "graphService",
            ObjectKind::Workload => "graphWorkload",
        }
    }

    fn path_key(self) -> &'static str {
        match self {
            ObjectKind::App => "app",
            ObjectKind::Service => "service",
            ObjectKind::Workload => "workload",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_key())
    }
}

fn expect_ok<T: DeserializeOwned>(response: &ApiResponse) -> ProbeResult<T> {
    response.expect_status(&[200])?.json()
}

fn expect_graph(response: &ApiResponse) -> ProbeResult<GraphSnapshot> {
    response.expect_status(&[200])?;
    GraphSnapshot::from_json(&response.text)
}

/// Fetch the namespace graph described by `query`.
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed graph, transport errors.
pub async fn graph_namespaces<C>(client: &C, query: &GraphQuery) -> ProbeResult<GraphSnapshot>
where
    C: ApiClient + ?Sized,
{
    let response = client.request(query.to_request()).await?;
    expect_graph(&response)
}

/// Fetch the graph centred on one app, service or workload.
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed graph, transport errors.
pub async fn object_graph<C>(
    client: &C,
    kind: ObjectKind,
    name: &str,
    namespace: &str,
    graph_type: GraphType,
) -> ProbeResult<GraphSnapshot>
where
    C: ApiClient + ?Sized,
{
    let request = ApiRequest::new(kind.graph_operation())
        .with_path("namespace", namespace)
        .with_path(kind.path_key(), name)
        .with_param("graphType", graph_type.as_str())
        .with_param("duration", DEFAULT_GRAPH_DURATION);
    let response = client.request(request).await?;
    expect_graph(&response)
}

/// Fetch the graph centred on one version of an app.
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed graph, transport errors.
pub async fn app_version_graph<C>(
    client: &C,
    app: &str,
    version: &str,
    namespace: &str,
    graph_type: GraphType,
) -> ProbeResult<GraphSnapshot>
where
    C: ApiClient + ?Sized,
{
    let request = ApiRequest::new("graphAppVersion")
        .with_path("namespace", namespace)
        .with_path("app", app)
        .with_path("version", version)
        .with_param("graphType", graph_type.as_str())
        .with_param("duration", DEFAULT_GRAPH_DURATION);
    let response = client.request(request).await?;
    expect_graph(&response)
}

/// Health of every object of `health_type` in `namespace`.
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed body, transport errors.
pub async fn namespace_health<C>(
    client: &C,
    namespace: &str,
    health_type: HealthType,
) -> ProbeResult<NamespaceHealth>
where
    C: ApiClient + ?Sized,
{
    let request = ApiRequest::new("namespaceHealth")
        .with_path("namespace", namespace)
        .with_param("type", health_type.as_str())
        .with_param("rateInterval", DEFAULT_GRAPH_DURATION);
    expect_ok(&client.request(request).await?)
}

/// Metrics for `namespace`, filtered by `params` (`filters[]`, `rateInterval`, ...).
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed body, transport errors.
pub async fn namespace_metrics<C>(
    client: &C,
    namespace: &str,
    params: &BTreeMap<String, String>,
) -> ProbeResult<MetricsResponse>
where
    C: ApiClient + ?Sized,
{
    let mut request = ApiRequest::new("namespaceMetrics").with_path("namespace", namespace);
    request.params.extend(params.clone());
    expect_ok(&client.request(request).await?)
}

/// Server status and external service versions.
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed body, transport errors.
pub async fn status<C>(client: &C) -> ProbeResult<StatusInfo>
where
    C: ApiClient + ?Sized,
{
    expect_ok(&client.request(ApiRequest::new("getStatus")).await?)
}

/// Authentication strategy of the server.
///
/// # Errors
///
/// `UnexpectedStatus` unless 200, `Decode` on a malformed body, transport errors.
pub async fn auth_info<C>(client: &C) -> ProbeResult<AuthInfo>
where
    C: ApiClient + ?Sized,
{
    expect_ok(&client.request(ApiRequest::new("authInfo")).await?)
}

#[cfg(test)]
#[path = "endpoints_tests.rs"]
mod endpoints_tests;
