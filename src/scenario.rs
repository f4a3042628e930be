// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Badge convergence scenarios.
//!
//! A scenario applies an Istio fixture, waits until the graph shows the
//! badges the fixture should produce, removes the fixture and waits until the
//! badges are gone again:
//!
//! ```text
//! baseline ──apply──> wait for increase ──delete──> wait for reversion
//! ```
//!
//! The delete always happens, even when the increase never shows up.

use crate::api::endpoints::{self, GraphQuery};
use crate::api::ApiClient;
use crate::cluster::{with_fixture, ClusterController};
use crate::constants::{CREATE_TIMEOUT_MESSAGE, DEFAULT_NAMESPACE, DELETE_TIMEOUT_MESSAGE};
use crate::errors::{ProbeError, ProbeResult};
use crate::graph::{BadgeKind, GraphDiffer, GraphSnapshot, GraphType};
use crate::metrics;
use crate::wait::PollSettings;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_graph_type() -> GraphType {
    GraphType::VersionedApp
}

/// One fixture and the badges it should make appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeScenario {
    /// Scenario name used in logs and metrics
    pub name: String,
    /// Manifest applied with the cluster controller
    pub fixture: PathBuf,
    /// Namespace the fixture is applied in and the graph is read from
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Graph granularity to observe
    #[serde(default = "default_graph_type")]
    pub graph_type: GraphType,
    /// Badges expected while the fixture is in place
    pub badges: Vec<BadgeKind>,
    /// Overrides the suite's poll settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<PollSettings>,
}

/// Badge counts observed over one scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Counts before the fixture was applied
    pub baseline: BTreeMap<BadgeKind, usize>,
    /// Counts once every badge had appeared
    pub peak: BTreeMap<BadgeKind, usize>,
    /// Counts once every badge had reverted
    pub final_counts: BTreeMap<BadgeKind, usize>,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1}s):", self.name, self.elapsed.as_secs_f64())?;
        for (badge, baseline) in &self.baseline {
            let peak = self.peak.get(badge).copied().unwrap_or_default();
            let last = self.final_counts.get(badge).copied().unwrap_or_default();
            write!(f, " {badge} {baseline}->{peak}->{last}")?;
        }
        Ok(())
    }
}

impl BadgeScenario {
    /// Scenario observing `badges` on the versioned app graph of `namespace`.
    pub fn new(
        name: impl Into<String>,
        fixture: impl Into<PathBuf>,
        namespace: impl Into<String>,
        badges: Vec<BadgeKind>,
    ) -> Self {
        Self {
            name: name.into(),
            fixture: fixture.into(),
            namespace: namespace.into(),
            graph_type: default_graph_type(),
            badges,
            poll: None,
        }
    }

    /// Observe another graph type.
    #[must_use]
    pub fn with_graph_type(mut self, graph_type: GraphType) -> Self {
        self.graph_type = graph_type;
        self
    }

    /// Use `poll` instead of the caller's settings.
    #[must_use]
    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = Some(poll);
        self
    }

    /// Reject scenarios that could never fail.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty name or badge list, or invalid poll settings.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.name.trim().is_empty() {
            return Err(ProbeError::InvalidArgument(
                "scenario name must not be empty".to_string(),
            ));
        }
        if self.badges.is_empty() {
            return Err(ProbeError::InvalidArgument(format!(
                "scenario '{}' lists no badges",
                self.name
            )));
        }
        if let Some(poll) = &self.poll {
            poll.validate()?;
        }
        Ok(())
    }

    /// Run the scenario against `api` and `cluster`.
    ///
    /// `defaults` applies unless the scenario carries its own poll settings.
    ///
    /// # Errors
    ///
    /// - `Timeout` with "Timed out waiting for Create" or "Timed out waiting for Delete"
    /// - `GraphTypeMismatch` if the server answers with another graph type
    /// - `Assertion` if the fixture could not be applied or deleted
    /// - any API or cluster error, surfaced without retry
    pub async fn run<A, C>(
        &self,
        api: &A,
        cluster: &C,
        defaults: &PollSettings,
    ) -> ProbeResult<ScenarioReport>
    where
        A: ApiClient + ?Sized,
        C: ClusterController + ?Sized,
    {
        let result = self.execute(api, cluster, defaults).await;
        metrics::record_run("scenario", result.is_ok());
        match &result {
            Ok(report) => info!(scenario = %self.name, report = %report, "Scenario passed"),
            Err(e) => {
                metrics::record_error(&self.name, e.category());
                error!(scenario = %self.name, error = %e, "Scenario failed");
            }
        }
        result
    }

    async fn execute<A, C>(
        &self,
        api: &A,
        cluster: &C,
        defaults: &PollSettings,
    ) -> ProbeResult<ScenarioReport>
    where
        A: ApiClient + ?Sized,
        C: ClusterController + ?Sized,
    {
        self.validate()?;
        let settings = self.poll.unwrap_or(*defaults);
        settings.validate()?;

        let started = Instant::now();
        let differ = GraphDiffer::new(self.graph_type, settings.interval)?;
        let query = GraphQuery::new(self.namespace.clone(), self.graph_type);
        let fetch = || endpoints::graph_namespaces(api, &query);

        let before = fetch().await?;
        differ.ensure_graph_type(&before)?;
        let baseline = self.counts(|badge| before.badge_count(badge));
        info!(
            scenario = %self.name,
            fixture = %self.fixture.display(),
            namespace = %self.namespace,
            baseline = ?baseline,
            "Starting badge scenario"
        );

        let peak = with_fixture(cluster, &self.fixture, &self.namespace, || async {
            let deadline = settings.deadline(CREATE_TIMEOUT_MESSAGE)?;
            let snapshots = try_join_all(self.badges.iter().map(|&badge| {
                differ.wait_for_badge_increase(fetch, badge, before.badge_count(badge), &deadline)
            }))
            .await?;
            Ok(self.observed(&snapshots))
        })
        .await?;

        let deadline = settings.deadline(DELETE_TIMEOUT_MESSAGE)?;
        let snapshots = try_join_all(self.badges.iter().map(|&badge| {
            differ.wait_for_badge_reversion(fetch, badge, before.badge_count(badge), &deadline)
        }))
        .await?;
        let final_counts = self.observed(&snapshots);

        Ok(ScenarioReport {
            name: self.name.clone(),
            baseline,
            peak,
            final_counts,
            elapsed: started.elapsed(),
        })
    }

    fn counts<F>(&self, count: F) -> BTreeMap<BadgeKind, usize>
    where
        F: Fn(BadgeKind) -> usize,
    {
        self.badges.iter().map(|&badge| (badge, count(badge))).collect()
    }

    /// Pair each badge with the count in the snapshot its own wait returned.
    fn observed(&self, snapshots: &[GraphSnapshot]) -> BTreeMap<BadgeKind, usize> {
        self.badges
            .iter()
            .zip(snapshots)
            .map(|(&badge, snapshot)| (badge, snapshot.badge_count(badge)))
            .collect()
    }
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod scenario_tests;
