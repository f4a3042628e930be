// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Named Kiali API operations and their path templates.
//!
//! Templates are relative to the Kiali base URL and always start with `/api`.
//! Placeholders are written `{name}` and each must be a whole path segment.

use super::HttpMethod;
use crate::errors::{ProbeError, ProbeResult};
use std::collections::BTreeMap;

/// A named operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Operation name (`graphNamespaces`, `serviceHealth`, ...)
    pub name: &'static str,
    /// Default HTTP method
    pub method: HttpMethod,
    /// Path template, e.g. `/api/namespaces/{namespace}/health`
    pub template: &'static str,
}

const fn get(name: &'static str, template: &'static str) -> Operation {
    Operation {
        name,
        method: HttpMethod::Get,
        template,
    }
}

/// All known operations.
pub const OPERATIONS: &[Operation] = &[
    get("Root", "/api"),
    get("getStatus", "/api/status"),
    get("getConfig", "/api/config"),
    get("authInfo", "/api/auth/info"),
    get("jaegerInfo", "/api/jaeger"),
    get("grafanaInfo", "/api/grafana"),
    get("meshTls", "/api/mesh/tls"),
    get("namespaceList", "/api/namespaces"),
    get("namespaceMetrics", "/api/namespaces/{namespace}/metrics"),
    get("namespaceHealth", "/api/namespaces/{namespace}/health"),
    get("namespaceValidations", "/api/namespaces/{namespace}/validations"),
    get("namespaceTls", "/api/namespaces/{namespace}/tls"),
    get("istioConfigList", "/api/namespaces/{namespace}/istio"),
    get(
        "istioConfigDetails",
        "/api/namespaces/{namespace}/istio/{object_type}/{object}",
    ),
    get(
        "istioConfigDetailsSubtype",
        "/api/namespaces/{namespace}/istio/{object_type}/{object_subtype}/{object}",
    ),
    get(
        "objectValidations",
        "/api/namespaces/{namespace}/{object_type}/{object}/istio_validations",
    ),
    get("serviceList", "/api/namespaces/{namespace}/services"),
    get("serviceDetails", "/api/namespaces/{namespace}/services/{service}"),
    get(
        "serviceMetrics",
        "/api/namespaces/{namespace}/services/{service}/metrics",
    ),
    get(
        "serviceHealth",
        "/api/namespaces/{namespace}/services/{service}/health",
    ),
    get(
        "serviceValidations",
        "/api/namespaces/{namespace}/services/{service}/istio_validations",
    ),
    get(
        "serviceDashboard",
        "/api/namespaces/{namespace}/services/{service}/dashboard",
    ),
    get("appList", "/api/namespaces/{namespace}/apps"),
    get("appDetails", "/api/namespaces/{namespace}/apps/{app}"),
    get("appMetrics", "/api/namespaces/{namespace}/apps/{app}/metrics"),
    get("appHealth", "/api/namespaces/{namespace}/apps/{app}/health"),
    get("appDashboard", "/api/namespaces/{namespace}/apps/{app}/dashboard"),
    get("workloadList", "/api/namespaces/{namespace}/workloads"),
    get("workloadDetails", "/api/namespaces/{namespace}/workloads/{workload}"),
    get(
        "workloadMetrics",
        "/api/namespaces/{namespace}/workloads/{workload}/metrics",
    ),
    get(
        "workloadHealth",
        "/api/namespaces/{namespace}/workloads/{workload}/health",
    ),
    get(
        "workloadDashboard",
        "/api/namespaces/{namespace}/workloads/{workload}/dashboard",
    ),
    get("graphNamespaces", "/api/namespaces/graph"),
    get(
        "graphService",
        "/api/namespaces/{namespace}/services/{service}/graph",
    ),
    get(
        "graphWorkload",
        "/api/namespaces/{namespace}/workloads/{workload}/graph",
    ),
    get(
        "graphApp",
        "/api/namespaces/{namespace}/applications/{app}/graph",
    ),
    get(
        "graphAppVersion",
        "/api/namespaces/{namespace}/applications/{app}/versions/{version}/graph",
    ),
    get("podLogs", "/api/namespaces/{namespace}/pods/{pod}/logs"),
];

/// Find an operation by name.
///
/// # Errors
///
/// Returns `UnknownOperation` if no operation has that name.
pub fn lookup(name: &str) -> ProbeResult<&'static Operation> {
    OPERATIONS
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| ProbeError::UnknownOperation(name.to_string()))
}

impl Operation {
    /// Placeholder names in template order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&'static str> {
        self.template
            .split('/')
            .filter_map(placeholder_name)
            .collect()
    }

    /// Expand the template into path segments, placeholders filled from `path`.
    ///
    /// Segment values are returned raw; percent-encoding is left to the URL
    /// builder.
    ///
    /// # Errors
    ///
    /// Returns `MissingPathParameter` for an absent or empty placeholder value.
    pub fn segments(&self, path: &BTreeMap<String, String>) -> ProbeResult<Vec<String>> {
        self.template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| match placeholder_name(segment) {
                Some(name) => path
                    .get(name)
                    .filter(|v| !v.is_empty())
                    .cloned()
                    .ok_or_else(|| ProbeError::MissingPathParameter {
                        operation: self.name.to_string(),
                        parameter: name.to_string(),
                    }),
                None => Ok(segment.to_string()),
            })
            .collect()
    }

    /// Expanded path as a string, for logs.
    ///
    /// # Errors
    ///
    /// Same as [`Operation::segments`].
    pub fn expand(&self, path: &BTreeMap<String, String>) -> ProbeResult<String> {
        Ok(format!("/{}", self.segments(path)?.join("/")))
    }
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

#[cfg(test)]
#[path = "operations_tests.rs"]
mod operations_tests;
