// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `suite.rs`

#[cfg(test)]
mod tests {
    use crate::api::{ApiClient, ApiRequest, ApiResponse};
    use crate::cluster::ClusterController;
    use crate::errors::{ProbeError, ProbeResult};
    use crate::graph::BadgeKind;
    use crate::suite::{run_checks, EndpointCheck, Suite};
    use crate::wait::PollSettings;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Answers per operation name; unknown operations get a 404 JSON error.
    struct RoutedClient {
        routes: BTreeMap<&'static str, (u16, &'static str)>,
    }

    #[async_trait]
    impl ApiClient for RoutedClient {
        async fn request(&self, request: ApiRequest) -> ProbeResult<ApiResponse> {
            let (status_code, body) = self
                .routes
                .get(request.method_name.as_str())
                .copied()
                .unwrap_or((404, r#"{"error":"not found"}"#));
            Ok(ApiResponse {
                operation: request.method_name,
                status_code,
                text: body.to_string(),
            })
        }
    }

    fn client() -> RoutedClient {
        RoutedClient {
            routes: BTreeMap::from([
                ("getStatus", (200, r#"{"status":{"Kiali version":"v2.0"}}"#)),
                ("graphNamespaces", (400, r#"{"error":"invalid duration"}"#)),
                ("getConfig", (200, "<html>login</html>")),
            ]),
        }
    }

    /// Cluster controller that must never be reached.
    struct NoCluster;

    #[async_trait]
    impl ClusterController for NoCluster {
        async fn apply(&self, _: &Path, _: &str) -> ProbeResult<bool> {
            panic!("apply must not be called");
        }

        async fn delete(&self, _: &Path, _: &str) -> ProbeResult<bool> {
            panic!("delete must not be called");
        }

        async fn wait_for_state(&self, _: &str, _: &str, _: &PollSettings) -> ProbeResult<bool> {
            panic!("wait_for_state must not be called");
        }
    }

    #[tokio::test]
    async fn test_check_passes_on_expected_status() {
        let status = EndpointCheck::new("getStatus").run(&client()).await.unwrap();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_negative_check_passes_on_expected_error() {
        let check = EndpointCheck::new("graphNamespaces")
            .with_param("duration", "invalid")
            .expecting(400);
        assert_eq!(check.run(&client()).await.unwrap(), 400);
    }

    #[tokio::test]
    async fn test_check_requires_json_body() {
        let err = EndpointCheck::new("getConfig").run(&client()).await.unwrap_err();
        assert!(matches!(err, ProbeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_run_checks_continues_after_failure() {
        let checks = vec![
            EndpointCheck::new("namespaceList"),
            EndpointCheck::new("getStatus"),
            EndpointCheck::new("graphNamespaces").expecting(400),
        ];

        let reports = run_checks(&client(), &checks).await;

        assert_eq!(reports.len(), 3);
        assert!(!reports[0].passed());
        assert!(reports[0].failure.as_deref().unwrap().contains("HTTP 404"));
        assert!(reports[1].passed());
        assert!(reports[2].passed());
        assert_eq!(reports[1].to_string(), "PASS getStatus (200)");
        assert!(reports[0].to_string().starts_with("FAIL namespaceList (200): "));
    }

    const SUITE: &str = r#"
poll:
  interval: 2
  timeout: 90
checks:
  - method: namespaceHealth
    path: { namespace: bookinfo }
    params: { type: app }
  - method: graphNamespaces
    params: { duration: invalid }
    expect: 400
scenarios:
  - name: circuit breaker
    fixture: fixtures/cb.yaml
    badges: [hasCB]
  - name: absolute
    fixture: /opt/fixtures/vs.yaml
    badges: [hasVS]
"#;

    #[test]
    fn test_parse_suite() {
        let suite = Suite::from_yaml(SUITE).unwrap();
        assert_eq!(suite.poll.interval, Duration::from_secs(2));
        assert_eq!(suite.poll.timeout, Duration::from_secs(90));
        assert_eq!(suite.checks.len(), 2);
        assert_eq!(suite.checks[0].expect, 200);
        assert_eq!(suite.checks[0].path["namespace"], "bookinfo");
        assert_eq!(suite.checks[1].expect, 400);
        assert_eq!(suite.scenarios[0].badges, vec![BadgeKind::CircuitBreaker]);
    }

    #[test]
    fn test_empty_suite_uses_default_poll() {
        let suite = Suite::from_yaml("{}").unwrap();
        assert_eq!(suite.poll, PollSettings::default());
        assert!(suite.checks.is_empty());
    }

    #[test]
    fn test_invalid_scenario_rejected() {
        let yaml = "scenarios:\n  - name: empty\n    fixture: x.yaml\n    badges: []\n";
        let err = Suite::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(Suite::from_yaml("poll: { interval: 0, timeout: 10 }").is_err());
    }

    #[tokio::test]
    async fn test_load_resolves_relative_fixtures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("suite.yaml");
        std::fs::write(&path, SUITE).unwrap();

        let suite = Suite::load(&path).await.unwrap();

        assert_eq!(suite.scenarios[0].fixture, dir.path().join("fixtures/cb.yaml"));
        assert_eq!(suite.scenarios[1].fixture, PathBuf::from("/opt/fixtures/vs.yaml"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = Suite::load(&dir.path().join("missing.yaml")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[tokio::test]
    async fn test_suite_report_counts_failures() {
        let suite = Suite {
            checks: vec![
                EndpointCheck::new("getStatus"),
                EndpointCheck::new("namespaceList"),
            ],
            ..Suite::default()
        };

        let report = suite.run(&client(), &NoCluster).await;

        assert!(!report.passed());
        assert_eq!(report.failures(), 1);
        assert!(report.scenarios.is_empty());
    }
}
