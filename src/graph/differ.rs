// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Before/after comparison of graph snapshots.
//!
//! A [`GraphDiffer`] is bound to one [`GraphType`]. Every snapshot it sees,
//! whether fetched during a wait or handed to [`compare`], must have that graph
//! type; anything else is rejected with `GraphTypeMismatch` instead of being
//! compared.
//!
//! Convergence predicates:
//!
//! - creation: `count > 0 && count >= baseline`
//! - reversion: `count <= baseline`

use super::snapshot::{GraphSnapshot, Node};
use super::types::{BadgeKind, GraphType};
use crate::errors::{ProbeError, ProbeResult};
use crate::wait::{poll_until_with, Deadline};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Number of nodes in `snapshot` carrying `badge`.
#[must_use]
pub fn badge_count(snapshot: &GraphSnapshot, badge: BadgeKind) -> usize {
    snapshot.badge_count(badge)
}

/// Counts before and after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Graph type shared by both snapshots
    pub graph_type: GraphType,
    /// Node count before
    pub nodes_before: usize,
    /// Node count after
    pub nodes_after: usize,
    /// Edge count before
    pub edges_before: usize,
    /// Edge count after
    pub edges_after: usize,
    /// `(before, after)` count per badge kind
    pub badges: BTreeMap<BadgeKind, (usize, usize)>,
    /// Node ids only present after
    pub added_nodes: Vec<String>,
    /// Node ids only present before
    pub removed_nodes: Vec<String>,
}

impl SnapshotDiff {
    /// Signed change in node count.
    #[must_use]
    pub fn node_delta(&self) -> i64 {
        delta(self.nodes_before, self.nodes_after)
    }

    /// Signed change in edge count.
    #[must_use]
    pub fn edge_delta(&self) -> i64 {
        delta(self.edges_before, self.edges_after)
    }

    /// Signed change in the count of `badge`.
    #[must_use]
    pub fn badge_delta(&self, badge: BadgeKind) -> i64 {
        self.badges
            .get(&badge)
            .map_or(0, |(before, after)| delta(*before, *after))
    }

    /// True if no node, edge or badge count decreased.
    #[must_use]
    pub fn is_monotonic_growth(&self) -> bool {
        self.nodes_after >= self.nodes_before
            && self.edges_after >= self.edges_before
            && self.badges.values().all(|(before, after)| after >= before)
    }

    /// Fail unless no count decreased.
    ///
    /// # Errors
    ///
    /// Returns `Assertion` naming the first decreasing count.
    pub fn assert_monotonic_growth(&self) -> ProbeResult<()> {
        if self.nodes_after < self.nodes_before {
            return Err(self.failure(format!(
                "node count decreased from {} to {}",
                self.nodes_before, self.nodes_after
            )));
        }
        if self.edges_after < self.edges_before {
            return Err(self.failure(format!(
                "edge count decreased from {} to {}",
                self.edges_before, self.edges_after
            )));
        }
        if let Some((badge, (before, after))) =
            self.badges.iter().find(|(_, (before, after))| after < before)
        {
            return Err(self.failure(format!(
                "{badge} count decreased from {before} to {after}"
            )));
        }
        Ok(())
    }

    /// Fail unless the after snapshot has exactly these node and edge counts.
    ///
    /// # Errors
    ///
    /// Returns `Assertion` on mismatch.
    pub fn assert_exact_counts(&self, nodes: usize, edges: usize) -> ProbeResult<()> {
        if self.nodes_after != nodes || self.edges_after != edges {
            return Err(self.failure(format!(
                "expected {nodes} nodes and {edges} edges, found {} nodes and {} edges",
                self.nodes_after, self.edges_after
            )));
        }
        Ok(())
    }

    /// Fail unless the after snapshot has exactly `expected` nodes with `badge`.
    ///
    /// # Errors
    ///
    /// Returns `Assertion` on mismatch.
    pub fn assert_badge_count(&self, badge: BadgeKind, expected: usize) -> ProbeResult<()> {
        let after = self.badges.get(&badge).map_or(0, |(_, after)| *after);
        if after != expected {
            return Err(self.failure(format!(
                "expected {expected} nodes with {badge}, found {after}"
            )));
        }
        Ok(())
    }

    fn failure(&self, message: String) -> ProbeError {
        ProbeError::Assertion {
            message,
            last_observation: Some(format!("{self:?}")),
        }
    }
}

fn delta(before: usize, after: usize) -> i64 {
    i64::try_from(after).unwrap_or(i64::MAX) - i64::try_from(before).unwrap_or(i64::MAX)
}

/// Compare two snapshots of the same graph type.
///
/// # Errors
///
/// Returns `GraphTypeMismatch` if the graph types differ.
pub fn compare(before: &GraphSnapshot, after: &GraphSnapshot) -> ProbeResult<SnapshotDiff> {
    if before.graph_type != after.graph_type {
        return Err(ProbeError::GraphTypeMismatch {
            expected: before.graph_type,
            actual: after.graph_type,
        });
    }

    let ids_before = before.node_ids();
    let ids_after = after.node_ids();

    Ok(SnapshotDiff {
        graph_type: before.graph_type,
        nodes_before: before.node_count(),
        nodes_after: after.node_count(),
        edges_before: before.edge_count(),
        edges_after: after.edge_count(),
        badges: BadgeKind::ALL
            .into_iter()
            .map(|b| (b, (before.badge_count(b), after.badge_count(b))))
            .collect(),
        added_nodes: ids_after
            .difference(&ids_before)
            .map(|id| (*id).to_string())
            .collect(),
        removed_nodes: ids_before
            .difference(&ids_after)
            .map(|id| (*id).to_string())
            .collect(),
    })
}

/// Waits on a live graph endpoint for badge and node changes.
#[derive(Debug, Clone, Copy)]
pub struct GraphDiffer {
    graph_type: GraphType,
    interval: Duration,
}

impl GraphDiffer {
    /// Bind a differ to `graph_type`, polling every `interval`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `interval` is zero.
    pub fn new(graph_type: GraphType, interval: Duration) -> ProbeResult<Self> {
        if interval.is_zero() {
            return Err(ProbeError::InvalidArgument(
                "graph poll interval must be positive".to_string(),
            ));
        }
        Ok(Self {
            graph_type,
            interval,
        })
    }

    /// Graph type this differ accepts.
    #[must_use]
    pub fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// Reject a snapshot of another graph type.
    ///
    /// # Errors
    ///
    /// Returns `GraphTypeMismatch`.
    pub fn ensure_graph_type(&self, snapshot: &GraphSnapshot) -> ProbeResult<()> {
        if snapshot.graph_type != self.graph_type {
            return Err(ProbeError::GraphTypeMismatch {
                expected: self.graph_type,
                actual: snapshot.graph_type,
            });
        }
        Ok(())
    }

    /// Compare two snapshots, both of this differ's graph type.
    ///
    /// # Errors
    ///
    /// Returns `GraphTypeMismatch` if either snapshot has another graph type.
    pub fn compare(
        &self,
        before: &GraphSnapshot,
        after: &GraphSnapshot,
    ) -> ProbeResult<SnapshotDiff> {
        self.ensure_graph_type(before)?;
        self.ensure_graph_type(after)?;
        compare(before, after)
    }

    /// Poll until at least one node, and at least `baseline` nodes, carry `badge`.
    ///
    /// # Errors
    ///
    /// `Timeout` with the deadline message, `GraphTypeMismatch`, or any fetch error.
    pub async fn wait_for_badge_increase<F, Fut>(
        &self,
        fetch: F,
        badge: BadgeKind,
        baseline: usize,
        deadline: &Deadline,
    ) -> ProbeResult<GraphSnapshot>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<GraphSnapshot>>,
    {
        info!(
            badge = %badge,
            baseline = baseline,
            graph_type = %self.graph_type,
            "Waiting for badge to appear"
        );
        let snapshot = self
            .wait_for(
                fetch,
                move |s: &GraphSnapshot| {
                    let count = s.badge_count(badge);
                    count > 0 && count >= baseline
                },
                deadline,
            )
            .await?;
        debug!(badge = %badge, count = snapshot.badge_count(badge), "Badge present");
        Ok(snapshot)
    }

    /// Poll until no more than `baseline` nodes carry `badge`.
    ///
    /// # Errors
    ///
    /// `Timeout` with the deadline message, `GraphTypeMismatch`, or any fetch error.
    pub async fn wait_for_badge_reversion<F, Fut>(
        &self,
        fetch: F,
        badge: BadgeKind,
        baseline: usize,
        deadline: &Deadline,
    ) -> ProbeResult<GraphSnapshot>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<GraphSnapshot>>,
    {
        info!(
            badge = %badge,
            baseline = baseline,
            graph_type = %self.graph_type,
            "Waiting for badge to revert"
        );
        let snapshot = self
            .wait_for(
                fetch,
                move |s: &GraphSnapshot| s.badge_count(badge) <= baseline,
                deadline,
            )
            .await?;
        debug!(badge = %badge, count = snapshot.badge_count(badge), "Badge reverted");
        Ok(snapshot)
    }

    /// Poll until some node matches `predicate`, e.g. a new workload showing up.
    ///
    /// # Errors
    ///
    /// `Timeout` with the deadline message, `GraphTypeMismatch`, or any fetch error.
    pub async fn wait_for_node<F, Fut, P>(
        &self,
        fetch: F,
        predicate: P,
        deadline: &Deadline,
    ) -> ProbeResult<GraphSnapshot>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<GraphSnapshot>>,
        P: Fn(&Node) -> bool,
    {
        self.wait_for(fetch, |s: &GraphSnapshot| s.nodes.iter().any(&predicate), deadline)
            .await
    }

    async fn wait_for<F, Fut, P>(
        &self,
        mut fetch: F,
        predicate: P,
        deadline: &Deadline,
    ) -> ProbeResult<GraphSnapshot>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeResult<GraphSnapshot>>,
        P: FnMut(&GraphSnapshot) -> bool,
    {
        let differ = *self;
        poll_until_with(
            || {
                let pending = fetch();
                async move {
                    let snapshot = pending.await?;
                    differ.ensure_graph_type(&snapshot)?;
                    Ok(snapshot)
                }
            },
            predicate,
            GraphSnapshot::summary,
            self.interval,
            deadline,
        )
        .await
    }
}

#[cfg(test)]
#[path = "differ_tests.rs"]
mod differ_tests;
