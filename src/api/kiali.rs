// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `reqwest` implementation of [`ApiClient`] for a live Kiali server.

use super::endpoints;
use super::operations::lookup;
use super::{ApiClient, ApiRequest, ApiResponse, HttpMethod};
use crate::config::ProbeConfig;
use crate::errors::{ProbeError, ProbeResult};
use crate::metrics;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// HTTP client bound to one Kiali base URL.
#[derive(Debug, Clone)]
pub struct KialiClient {
    http: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl KialiClient {
    /// Build a client without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the underlying client cannot be built.
    pub fn new(config: &ProbeConfig) -> ProbeResult<Self> {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            token: config.token.clone(),
        })
    }

    /// Build a client and check that the server's auth strategy can be satisfied.
    ///
    /// Reads `/api/auth/info`. The `openshift` and `token` strategies require a
    /// configured token.
    ///
    /// # Errors
    ///
    /// - `Config` if a token is required but none is configured
    /// - `UnexpectedStatus` if the auth info endpoint does not answer 200
    /// - `Http` or `Decode` on transport or body failures
    pub async fn connect(config: &ProbeConfig) -> ProbeResult<Self> {
        let client = Self::new(config)?;
        let auth = endpoints::auth_info(&client).await?;

        if auth.requires_token() && client.token.is_none() {
            return Err(ProbeError::Config(format!(
                "Kiali at {} uses the '{}' auth strategy; set the TOKEN environment variable",
                client.base_url, auth.strategy
            )));
        }

        info!(
            url = %client.base_url,
            strategy = %auth.strategy,
            authenticated = client.token.is_some(),
            "Connected to Kiali"
        );
        Ok(client)
    }

    /// Base URL requests are made against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, request: &ApiRequest, segments: &[String]) -> ProbeResult<Url> {
        let mut url = self.base_url.clone();
        url.set_query(None);
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ProbeError::Config(format!("Kiali URL '{}' cannot be a base", self.base_url))
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.params);
        }
        Ok(url)
    }
}

#[async_trait]
impl ApiClient for KialiClient {
    async fn request(&self, request: ApiRequest) -> ProbeResult<ApiResponse> {
        let operation = lookup(&request.method_name)?;
        let segments = operation.segments(&request.path)?;
        let url = self.url_for(&request, &segments)?;
        let method = request.method.unwrap_or(operation.method);

        debug!(
            operation = operation.name,
            method = %method,
            url = %url,
            has_body = request.data.is_some(),
            "Kiali API request"
        );

        let mut builder = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
            HttpMethod::Patch => self.http.patch(url),
            HttpMethod::Delete => self.http.delete(url),
        };
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        let start = Instant::now();
        let response = builder.send().await.inspect_err(|e| {
            metrics::record_error(operation.name, "network_error");
            debug!(operation = operation.name, error = %e, "Kiali API request failed");
        })?;
        let status_code = response.status().as_u16();
        let text = response.text().await?;

        debug!(
            operation = operation.name,
            status = status_code,
            bytes = text.len(),
            elapsed = ?start.elapsed(),
            "Kiali API response"
        );
        metrics::record_api_request(operation.name, status_code);

        Ok(ApiResponse {
            operation: operation.name.to_string(),
            status_code,
            text,
        })
    }
}

#[cfg(test)]
#[path = "kiali_tests.rs"]
mod kiali_tests;
