// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `endpoints.rs`

#[cfg(test)]
mod tests {
    use crate::api::endpoints::{
        app_version_graph, graph_namespaces, namespace_health, namespace_metrics, object_graph,
        status,
    };
    use crate::api::{ApiClient, ApiRequest, ApiResponse, GraphQuery, ObjectKind};
    use crate::errors::{ProbeError, ProbeResult};
    use crate::graph::GraphType;
    use crate::models::HealthType;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Answers every request with one canned response and records what it was asked.
    struct CannedClient {
        status_code: u16,
        body: String,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl CannedClient {
        fn new(status_code: u16, body: &str) -> Self {
            Self {
                status_code,
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> ApiRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ApiClient for CannedClient {
        async fn request(&self, request: ApiRequest) -> ProbeResult<ApiResponse> {
            let operation = request.method_name.clone();
            self.seen.lock().unwrap().push(request);
            Ok(ApiResponse {
                operation,
                status_code: self.status_code,
                text: self.body.clone(),
            })
        }
    }

    const EMPTY_GRAPH: &str = r#"{"graphType":"versionedApp","elements":{"nodes":[],"edges":[]}}"#;

    #[test]
    fn test_graph_query_params() {
        let request = GraphQuery::new("bookinfo", GraphType::Workload)
            .with_namespace("istio-system")
            .with_duration("10m")
            .with_param("injectServiceNodes", "true")
            .to_request();

        assert_eq!(request.method_name, "graphNamespaces");
        assert_eq!(request.params["namespaces"], "bookinfo,istio-system");
        assert_eq!(request.params["graphType"], "workload");
        assert_eq!(request.params["duration"], "10m");
        assert_eq!(request.params["injectServiceNodes"], "true");
    }

    #[tokio::test]
    async fn test_graph_namespaces_decodes_snapshot() {
        let client = CannedClient::new(200, EMPTY_GRAPH);
        let query = GraphQuery::new("bookinfo", GraphType::VersionedApp);
        let snapshot = graph_namespaces(&client, &query).await.unwrap();

        assert_eq!(snapshot.graph_type, GraphType::VersionedApp);
        assert_eq!(snapshot.node_count(), 0);
    }

    #[tokio::test]
    async fn test_graph_namespaces_surfaces_500() {
        let client = CannedClient::new(500, "internal error");
        let err = graph_namespaces(&client, &GraphQuery::new("bookinfo", GraphType::VersionedApp))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::UnexpectedStatus { actual: 500, .. }));
        assert_eq!(client.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_object_graph_request() {
        let client = CannedClient::new(200, EMPTY_GRAPH);
        object_graph(&client, ObjectKind::Service, "mongodb", "bookinfo", GraphType::VersionedApp)
            .await
            .unwrap();

        let request = client.last();
        assert_eq!(request.method_name, "graphService");
        assert_eq!(request.path["service"], "mongodb");
        assert_eq!(request.path["namespace"], "bookinfo");
        assert_eq!(request.params["graphType"], "versionedApp");
    }

    #[tokio::test]
    async fn test_app_version_graph_request() {
        let client = CannedClient::new(200, EMPTY_GRAPH);
        app_version_graph(&client, "reviews", "v2", "bookinfo", GraphType::VersionedApp)
            .await
            .unwrap();

        let request = client.last();
        assert_eq!(request.method_name, "graphAppVersion");
        assert_eq!(request.path["version"], "v2");
    }

    #[tokio::test]
    async fn test_namespace_health() {
        let client = CannedClient::new(
            200,
            r#"{"details-v1":{"workloadStatus":{"name":"details-v1","desiredReplicas":1,"availableReplicas":1}}}"#,
        );
        let health = namespace_health(&client, "bookinfo", HealthType::Workload).await.unwrap();

        assert!(health["details-v1"].replicas_ready());
        assert_eq!(client.last().params["type"], "workload");
    }

    #[tokio::test]
    async fn test_namespace_metrics_passes_filters() {
        let client = CannedClient::new(200, r#"{"request_count":[]}"#);
        let params = BTreeMap::from([("filters[]".to_string(), "request_count".to_string())]);

        let metrics = namespace_metrics(&client, "istio-system", &params).await.unwrap();

        assert_eq!(metrics.series_count(), 0);
        assert_eq!(client.last().params["filters[]"], "request_count");
    }

    #[tokio::test]
    async fn test_status_decode_error() {
        let client = CannedClient::new(200, "not json");
        let err = status(&client).await.unwrap_err();
        assert!(matches!(err, ProbeError::Decode { .. }));
    }
}
