// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Endpoint checks and suite files.
//!
//! A suite is a YAML file listing endpoint checks and badge scenarios:
//!
//! ```yaml
//! poll:
//!   interval: 1
//!   timeout: 60
//! checks:
//!   - method: namespaceHealth
//!     path: { namespace: bookinfo }
//!     params: { type: app, rateInterval: 60s }
//!     expect: 200
//!   - method: graphNamespaces
//!     params: { namespaces: bookinfo, graphType: versionedApp, duration: invalid }
//!     expect: 400
//! scenarios:
//!   - name: circuit breaker
//!     fixture: fixtures/circuit-breaker.yaml
//!     badges: [hasCB]
//! ```
//!
//! Expected status codes are data: when the server changes which code it
//! returns for a bad request, only the suite file changes.

use crate::api::{ApiClient, ApiRequest, HttpMethod};
use crate::cluster::ClusterController;
use crate::errors::{ProbeError, ProbeResult};
use crate::metrics;
use crate::scenario::{BadgeScenario, ScenarioReport};
use crate::wait::PollSettings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

fn default_expect() -> u16 {
    200
}

/// One request and the status code it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointCheck {
    /// Operation name from the operation table
    pub method: String,
    /// Path template values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub path: BTreeMap<String, String>,
    /// Query parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Overrides the operation's HTTP method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<HttpMethod>,
    /// Expected status code
    #[serde(default = "default_expect")]
    pub expect: u16,
}

impl EndpointCheck {
    /// Check that `method` answers 200.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: BTreeMap::new(),
            params: BTreeMap::new(),
            http_method: None,
            expect: default_expect(),
        }
    }

    /// Set a path template value.
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

    /// Expect `status` instead of 200.
    #[must_use]
    pub fn expecting(mut self, status: u16) -> Self {
        self.expect = status;
        self
    }

    fn to_request(&self) -> ApiRequest {
        ApiRequest {
            method_name: self.method.clone(),
            method: self.http_method,
            path: self.path.clone(),
            params: self.params.clone(),
            data: None,
        }
    }

    /// Perform the request and verify its status and that the body is JSON.
    ///
    /// Returns the status code received.
    ///
    /// # Errors
    ///
    /// `UnexpectedStatus` on a status mismatch, `Decode` for a non-JSON body,
    /// or any error from the client.
    pub async fn run<C>(&self, client: &C) -> ProbeResult<u16>
    where
        C: ApiClient + ?Sized,
    {
        let response = client.request(self.to_request()).await?;
        response.expect_status(&[self.expect])?.json_value()?;
        Ok(response.status_code)
    }
}

/// Outcome of one endpoint check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    /// Operation name
    pub method: String,
    /// Expected status code
    pub expected: u16,
    /// `None` if the check passed, otherwise why it failed
    pub failure: Option<String>,
}

impl CheckReport {
    /// True if the check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            None => write!(f, "PASS {} ({})", self.method, self.expected),
            Some(reason) => write!(f, "FAIL {} ({}): {reason}", self.method, self.expected),
        }
    }
}

/// Run every check, reporting each one; a failure does not stop the rest.
pub async fn run_checks<C>(client: &C, checks: &[EndpointCheck]) -> Vec<CheckReport>
where
    C: ApiClient + ?Sized,
{
    let mut reports = Vec::with_capacity(checks.len());
    for check in checks {
        let failure = match check.run(client).await {
            Ok(_) => None,
            Err(e) => {
                warn!(
                    method = %check.method,
                    expected = check.expect,
                    error = %e,
                    "Endpoint check failed"
                );
                metrics::record_error(&check.method, e.category());
                Some(e.to_string())
            }
        };
        metrics::record_run("check", failure.is_none());
        reports.push(CheckReport {
            method: check.method.clone(),
            expected: check.expect,
            failure,
        });
    }
    let passed = reports.iter().filter(|r| r.passed()).count();
    info!(passed = passed, total = reports.len(), "Endpoint checks finished");
    reports
}

/// Checks and scenarios loaded from a suite file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    /// Poll settings for scenarios that do not set their own
    #[serde(default)]
    pub poll: PollSettings,
    /// Endpoint checks
    #[serde(default)]
    pub checks: Vec<EndpointCheck>,
    /// Badge scenarios
    #[serde(default)]
    pub scenarios: Vec<BadgeScenario>,
}

/// Outcome of a whole suite.
#[derive(Debug)]
pub struct SuiteReport {
    /// One report per check, in suite order
    pub checks: Vec<CheckReport>,
    /// Scenario name and outcome, in suite order
    pub scenarios: Vec<(String, ProbeResult<ScenarioReport>)>,
}

impl SuiteReport {
    /// True if every check and scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckReport::passed)
            && self.scenarios.iter().all(|(_, outcome)| outcome.is_ok())
    }

    /// Number of failed checks and scenarios.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.checks.iter().filter(|r| !r.passed()).count()
            + self.scenarios.iter().filter(|(_, o)| o.is_err()).count()
    }
}

impl Suite {
    /// Parse a suite from YAML.
    ///
    /// # Errors
    ///
    /// `Yaml` if the document is malformed, `InvalidArgument` if a scenario is invalid.
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        let suite: Suite = serde_yaml::from_str(yaml)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Read a suite file. Relative fixture paths resolve against the file's directory.
    ///
    /// # Errors
    ///
    /// `Config` if the file cannot be read, otherwise as [`Suite::from_yaml`].
    pub async fn load(path: &Path) -> ProbeResult<Self> {
        let yaml = tokio::fs::read_to_string(path).await.map_err(|e| {
            ProbeError::Config(format!("failed to read suite {}: {e}", path.display()))
        })?;
        let mut suite = Self::from_yaml(&yaml)?;
        if let Some(dir) = path.parent() {
            suite.resolve_fixtures(dir);
        }
        info!(
            suite = %path.display(),
            checks = suite.checks.len(),
            scenarios = suite.scenarios.len(),
            "Loaded suite"
        );
        Ok(suite)
    }

    fn resolve_fixtures(&mut self, dir: &Path) {
        for scenario in &mut self.scenarios {
            if scenario.fixture.is_relative() {
                scenario.fixture = dir.join(&scenario.fixture);
            }
        }
    }

    /// Reject suites with invalid poll settings or scenarios.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` describing the first problem found.
    pub fn validate(&self) -> ProbeResult<()> {
        self.poll.validate()?;
        for scenario in &self.scenarios {
            scenario.validate()?;
        }
        for check in &self.checks {
            if check.method.trim().is_empty() {
                return Err(ProbeError::InvalidArgument(
                    "check method must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Run all checks, then every scenario in order.
    ///
    /// Scenarios run one at a time since they share the cluster.
    pub async fn run<A, C>(&self, api: &A, cluster: &C) -> SuiteReport
    where
        A: ApiClient + ?Sized,
        C: ClusterController + ?Sized,
    {
        let checks = run_checks(api, &self.checks).await;

        let mut scenarios = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            let outcome = scenario.run(api, cluster, &self.poll).await;
            scenarios.push((scenario.name.clone(), outcome));
        }

        SuiteReport { checks, scenarios }
    }
}

#[cfg(test)]
#[path = "suite_tests.rs"]
mod suite_tests;
