// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Probe configuration.
//!
//! Connection settings come from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `URL` | Kiali base URL (`https://kiali-hostname`) | required |
//! | `TOKEN` | Bearer token for `openshift` and `token` auth | none |
//! | `KIALI_PROBE_INSECURE` | Skip TLS verification (`true`/`false`) | `false` |
//! | `KIALI_PROBE_REQUEST_TIMEOUT_SECS` | Per-request timeout | `10` |
//!
//! The binary overrides any of them from command line flags. The cluster CLI
//! binary is not part of this configuration; see `cli::ConnectionArgs`.

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, ENV_INSECURE, ENV_KIALI_TOKEN, ENV_KIALI_URL,
    ENV_REQUEST_TIMEOUT_SECS,
};
use crate::errors::{ProbeError, ProbeResult};
use std::time::Duration;
use url::Url;

/// Kiali connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Kiali base URL
    pub url: Url,
    /// Bearer token
    pub token: Option<String>,
    /// Skip TLS certificate verification
    pub insecure: bool,
    /// Per-request timeout
    pub request_timeout: Duration,
}

// The token never ends up in logs.
impl std::fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("url", &self.url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ProbeConfig {
    /// Configuration for `url` with defaults for everything else.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `url` is not an absolute http(s) URL.
    pub fn new(url: &str) -> ProbeResult<Self> {
        Ok(Self {
            url: parse_base_url(url)?,
            token: None,
            insecure: false,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Read the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `URL` is missing or any value is malformed.
    pub fn from_env() -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `URL` is missing or any value is malformed.
    pub fn from_lookup<F>(lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = non_empty(ENV_KIALI_URL).ok_or_else(|| {
            ProbeError::Config(format!(
                "{ENV_KIALI_URL} environment variable is required, in 'https://kiali-hostname' format"
            ))
        })?;
        let mut config = Self::new(&url)?;

        config.token = non_empty(ENV_KIALI_TOKEN);

        if let Some(raw) = non_empty(ENV_INSECURE) {
            config.insecure = parse_bool(ENV_INSECURE, &raw)?;
        }

        if let Some(raw) = non_empty(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ProbeError::Config(format!(
                    "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs))?;
        }

        Ok(config)
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Skip or enforce TLS verification.
    #[must_use]
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Set the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `timeout` is zero.
    pub fn with_request_timeout(mut self, timeout: Duration) -> ProbeResult<Self> {
        if timeout.is_zero() {
            return Err(ProbeError::Config(
                "request timeout must be positive".to_string(),
            ));
        }
        self.request_timeout = timeout;
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> ProbeResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ProbeError::Config(format!("invalid Kiali URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProbeError::Config(format!(
            "Kiali URL must use http or https, got '{raw}'"
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ProbeError::Config(format!(
            "Kiali URL must include a host, got '{raw}'"
        )));
    }
    Ok(url)
}

fn parse_bool(key: &str, raw: &str) -> ProbeResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ProbeError::Config(format!(
            "{key} must be true or false, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
