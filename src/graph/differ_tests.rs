// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `differ.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{ProbeError, ProbeResult};
    use crate::graph::{badge_count, compare, BadgeKind, GraphDiffer, GraphSnapshot, GraphType};
    use crate::wait::Deadline;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Graph with `nodes` nodes, `with_cb` of them carrying the circuit breaker badge.
    fn graph(graph_type: &str, nodes: usize, with_cb: usize) -> GraphSnapshot {
        let nodes: Vec<_> = (0..nodes)
            .map(|i| {
                let has_cb = i < with_cb;
                json!({ "data": { "id": format!("n{i}"), "nodeType": "app", "hasCB": has_cb } })
            })
            .collect();
        let edges: Vec<_> = (1..nodes.len())
            .map(|i| {
                json!({ "data": {
                    "id": format!("e{i}"),
                    "source": "n0",
                    "target": format!("n{i}"),
                }})
            })
            .collect();
        GraphSnapshot::from_value(json!({
            "graphType": graph_type,
            "elements": { "nodes": nodes, "edges": edges }
        }))
        .unwrap()
    }

    fn differ() -> GraphDiffer {
        GraphDiffer::new(GraphType::VersionedApp, Duration::from_secs(1)).unwrap()
    }

    /// Fetch that returns `before` for the first `switch_after` calls, then `after`.
    fn staged_fetch(
        before: GraphSnapshot,
        after: GraphSnapshot,
        switch_after: usize,
        calls: Arc<AtomicUsize>,
    ) -> impl FnMut() -> std::future::Ready<ProbeResult<GraphSnapshot>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let snapshot = if n < switch_after {
                before.clone()
            } else {
                after.clone()
            };
            std::future::ready(Ok(snapshot))
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = GraphDiffer::new(GraphType::App, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidArgument(_)));
    }

    #[test]
    fn test_badge_count_free_function() {
        let snapshot = graph("versionedApp", 5, 3);
        assert_eq!(badge_count(&snapshot, BadgeKind::CircuitBreaker), 3);
        assert_eq!(badge_count(&snapshot, BadgeKind::Mirroring), 0);
    }

    #[test]
    fn test_compare_counts_and_deltas() {
        let before = graph("versionedApp", 3, 0);
        let after = graph("versionedApp", 5, 2);

        let diff = compare(&before, &after).unwrap();
        assert_eq!(diff.node_delta(), 2);
        assert_eq!(diff.edge_delta(), 2);
        assert_eq!(diff.badge_delta(BadgeKind::CircuitBreaker), 2);
        assert_eq!(diff.badge_delta(BadgeKind::VirtualService), 0);
        assert_eq!(diff.added_nodes, vec!["n3".to_string(), "n4".to_string()]);
        assert!(diff.removed_nodes.is_empty());
        assert!(diff.is_monotonic_growth());
        diff.assert_monotonic_growth().unwrap();
        diff.assert_exact_counts(5, 4).unwrap();
        diff.assert_badge_count(BadgeKind::CircuitBreaker, 2).unwrap();
    }

    #[test]
    fn test_compare_detects_shrinking_graph() {
        let before = graph("versionedApp", 5, 2);
        let after = graph("versionedApp", 4, 2);

        let diff = compare(&before, &after).unwrap();
        assert!(!diff.is_monotonic_growth());
        assert_eq!(diff.removed_nodes, vec!["n4".to_string()]);

        let err = diff.assert_monotonic_growth().unwrap_err();
        assert!(matches!(err, ProbeError::Assertion { .. }));
        assert!(err.to_string().contains("node count decreased from 5 to 4"));
        assert!(err.last_observation().is_some());
    }

    #[test]
    fn test_exact_counts_mismatch() {
        let before = graph("app", 2, 0);
        let after = graph("app", 3, 0);
        let diff = compare(&before, &after).unwrap();

        let err = diff.assert_exact_counts(3, 5).unwrap_err();
        assert!(err.to_string().contains("expected 3 nodes and 5 edges"));
    }

    #[test]
    fn test_compare_rejects_mixed_graph_types() {
        let before = graph("app", 2, 0);
        let after = graph("workload", 2, 0);

        let err = compare(&before, &after).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::GraphTypeMismatch {
                expected: GraphType::App,
                actual: GraphType::Workload
            }
        ));
    }

    #[test]
    fn test_bound_differ_rejects_other_graph_type() {
        let a = graph("app", 2, 0);
        let b = graph("app", 2, 0);

        let err = differ().compare(&a, &b).unwrap_err();
        assert!(matches!(err, ProbeError::GraphTypeMismatch { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_badge_increase_converges() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = staged_fetch(
            graph("versionedApp", 4, 0),
            graph("versionedApp", 4, 2),
            3,
            calls.clone(),
        );
        let deadline =
            Deadline::new(Duration::from_secs(60), "Timed out waiting for Create").unwrap();

        let snapshot = differ()
            .wait_for_badge_increase(fetch, BadgeKind::CircuitBreaker, 0, &deadline)
            .await
            .unwrap();

        assert_eq!(snapshot.badge_count(BadgeKind::CircuitBreaker), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_badge_increase_requires_baseline() {
        // baseline 2 means a single badge is not enough
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = staged_fetch(
            graph("versionedApp", 4, 1),
            graph("versionedApp", 4, 2),
            2,
            calls.clone(),
        );
        let deadline =
            Deadline::new(Duration::from_secs(60), "Timed out waiting for Create").unwrap();

        let snapshot = differ()
            .wait_for_badge_increase(fetch, BadgeKind::CircuitBreaker, 2, &deadline)
            .await
            .unwrap();

        assert_eq!(snapshot.badge_count(BadgeKind::CircuitBreaker), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_badge_increase_times_out_with_summary() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = staged_fetch(
            graph("versionedApp", 2, 0),
            graph("versionedApp", 2, 0),
            0,
            calls.clone(),
        );
        let deadline =
            Deadline::new(Duration::from_secs(5), "Timed out waiting for Create").unwrap();

        let err = differ()
            .wait_for_badge_increase(fetch, BadgeKind::CircuitBreaker, 0, &deadline)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Timed out waiting for Create");
        let observation = err.last_observation().unwrap();
        assert!(observation.starts_with("versionedApp graph: 2 nodes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_badge_reversion_converges() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = staged_fetch(
            graph("versionedApp", 4, 3),
            graph("versionedApp", 4, 1),
            2,
            calls.clone(),
        );
        let deadline =
            Deadline::new(Duration::from_secs(60), "Timed out waiting for Delete").unwrap();

        let snapshot = differ()
            .wait_for_badge_reversion(fetch, BadgeKind::CircuitBreaker, 1, &deadline)
            .await
            .unwrap();

        assert_eq!(snapshot.badge_count(BadgeKind::CircuitBreaker), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mismatched_fetch_fails_fast() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = staged_fetch(graph("app", 2, 2), graph("app", 2, 2), 0, calls.clone());
        let deadline =
            Deadline::new(Duration::from_secs(60), "Timed out waiting for Create").unwrap();

        let err = differ()
            .wait_for_badge_increase(fetch, BadgeKind::CircuitBreaker, 0, &deadline)
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::GraphTypeMismatch { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_node() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = staged_fetch(
            graph("versionedApp", 2, 0),
            graph("versionedApp", 6, 0),
            1,
            calls.clone(),
        );
        let deadline =
            Deadline::new(Duration::from_secs(10), "Timed out waiting for node").unwrap();

        let snapshot = differ()
            .wait_for_node(fetch, |n| n.id == "n5", &deadline)
            .await
            .unwrap();

        assert!(snapshot.find_node(|n| n.id == "n5").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
