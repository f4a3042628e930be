// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kiali HTTP API access.
//!
//! Requests are addressed by operation name (`graphNamespaces`,
//! `namespaceHealth`, ...) rather than by URL. The [`operations`] table maps
//! each name to a method and a `/api/...` path template; an [`ApiClient`]
//! expands the template and performs the call.
//!
//! Responses are returned whatever their status code. Callers decide which
//! codes are acceptable with [`ApiResponse::expect_status`]; nothing here
//! retries.
//!
//! # Example
//!
//! ```rust,no_run
//! use kiali_probe::api::{ApiClient, ApiRequest, KialiClient};
//! use kiali_probe::config::ProbeConfig;
//!
//! # async fn example() -> kiali_probe::errors::ProbeResult<()> {
//! let client = KialiClient::connect(&ProbeConfig::from_env()?).await?;
//! let response = client
//!     .request(ApiRequest::new("namespaceHealth").with_path("namespace", "bookinfo"))
//!     .await?;
//! response.expect_status(&[200])?;
//! # Ok(())
//! # }
//! ```

pub mod endpoints;
pub mod kiali;
pub mod operations;

pub use endpoints::{GraphQuery, ObjectKind};
pub use kiali::KialiClient;
pub use operations::{lookup, Operation, OPERATIONS};

use crate::errors::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// HTTP method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call to a named operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRequest {
    /// Operation name from the operation table
    pub method_name: String,
    /// Method override; the operation's own method when `None`
    pub method: Option<HttpMethod>,
    /// Values for `{placeholder}` segments of the path template
    pub path: BTreeMap<String, String>,
    /// Query string parameters
    pub params: BTreeMap<String, String>,
    /// JSON body
    pub data: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Request for `method_name` with no parameters.
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            ..Self::default()
        }
    }

    /// Set a path placeholder.
    #[must_use]
    pub fn with_path(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(key.into(), value.into());
        self
    }

    /// Set a query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Override the operation's HTTP method.
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// Status code and body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// Operation that produced this response
    pub operation: String,
    /// HTTP status code
    pub status_code: u16,
    /// Raw body
    pub text: String,
}

impl ApiResponse {
    /// Decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ProbeResult<T> {
        serde_json::from_str(&self.text)
            .map_err(|e| ProbeError::decode(format!("{} response", self.operation), e))
    }

    /// Decode the body as untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the body is not JSON.
    pub fn json_value(&self) -> ProbeResult<serde_json::Value> {
        self.json()
    }

    /// Fail unless the status code is one of `expected`.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedStatus` carrying the start of the body.
    pub fn expect_status(&self, expected: &[u16]) -> ProbeResult<&Self> {
        if expected.contains(&self.status_code) {
            Ok(self)
        } else {
            Err(ProbeError::unexpected_status(
                &self.operation,
                expected,
                self.status_code,
                &self.text,
            ))
        }
    }

    /// True for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Something that can perform named API operations.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Perform `request`, returning the response whatever its status code.
    ///
    /// # Errors
    ///
    /// `UnknownOperation`, `MissingPathParameter`, or a transport failure.
    async fn request(&self, request: ApiRequest) -> ProbeResult<ApiResponse>;
}

#[async_trait]
impl<C: ApiClient + ?Sized> ApiClient for Arc<C> {
    async fn request(&self, request: ApiRequest) -> ProbeResult<ApiResponse> {
        (**self).request(request).await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
