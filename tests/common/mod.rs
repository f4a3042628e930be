// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared helpers for integration tests: a simulated mesh that serves the graph
//! endpoint through wiremock and reacts to fixture applies and deletes.

#![allow(dead_code)]

use async_trait::async_trait;
use kiali_probe::api::KialiClient;
use kiali_probe::cluster::ClusterController;
use kiali_probe::config::ProbeConfig;
use kiali_probe::errors::ProbeResult;
use kiali_probe::graph::BadgeKind;
use kiali_probe::wait::PollSettings;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const NO_BADGES: &[BadgeKind] = &[];

/// Graph JSON with the given nodes; each node lists the badges it carries.
pub fn graph_json(graph_type: &str, nodes: &[(&str, &[BadgeKind])]) -> Value {
    let nodes: Vec<Value> = nodes
        .iter()
        .map(|&(id, badges)| {
            let mut data = json!({
                "id": id,
                "nodeType": "app",
                "namespace": "bookinfo",
                "app": id.split('-').next().unwrap_or(id),
            });
            for badge in badges {
                data[badge.field_name()] = json!(true);
            }
            json!({ "data": data })
        })
        .collect();
    let edges: Vec<Value> = nodes
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, node)| {
            json!({ "data": {
                "id": format!("e{i}"),
                "source": nodes[0]["data"]["id"],
                "target": node["data"]["id"],
            }})
        })
        .collect();
    json!({
        "timestamp": 1_700_000_000,
        "duration": 60,
        "graphType": graph_type,
        "elements": { "nodes": nodes, "edges": edges }
    })
}

#[derive(Default)]
struct MeshState {
    applied: bool,
    visible: bool,
    reads_since_change: usize,
    graph_reads: usize,
    log: Vec<String>,
}

/// A bookinfo-like mesh. Badges of the applied fixture become visible in the
/// graph `lag` graph reads after an apply and disappear `lag` reads after a delete.
#[derive(Clone)]
pub struct FakeMesh {
    badges: Vec<BadgeKind>,
    lag: usize,
    graph_type: &'static str,
    fail_status: Option<u16>,
    state: Arc<Mutex<MeshState>>,
}

impl FakeMesh {
    pub fn new(badges: Vec<BadgeKind>, lag: usize) -> Self {
        Self {
            badges,
            lag,
            graph_type: "versionedApp",
            fail_status: None,
            state: Arc::new(Mutex::new(MeshState::default())),
        }
    }

    /// Serve graphs of another type than requested.
    pub fn with_graph_type(mut self, graph_type: &'static str) -> Self {
        self.graph_type = graph_type;
        self
    }

    /// Answer every graph read with `status`.
    pub fn failing_with(mut self, status: u16) -> Self {
        self.fail_status = Some(status);
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn graph_reads(&self) -> usize {
        self.state.lock().unwrap().graph_reads
    }

    /// Serve the graph endpoint of `server` from this mesh.
    pub async fn mount(&self, server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/namespaces/graph"))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }
}

impl Respond for FakeMesh {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        state.graph_reads += 1;
        if let Some(status) = self.fail_status {
            return ResponseTemplate::new(status).set_body_json(json!({ "error": "graph failure" }));
        }

        state.reads_since_change += 1;
        if state.reads_since_change > self.lag {
            state.visible = state.applied;
        }

        let reviews: &[BadgeKind] = if state.visible { &self.badges } else { NO_BADGES };
        ResponseTemplate::new(200).set_body_json(graph_json(
            self.graph_type,
            &[
                ("productpage-v1", NO_BADGES),
                ("details-v1", NO_BADGES),
                ("reviews-v1", reviews),
                ("ratings-v1", NO_BADGES),
            ],
        ))
    }
}

#[async_trait]
impl ClusterController for FakeMesh {
    async fn apply(&self, file: &Path, namespace: &str) -> ProbeResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.applied = true;
        state.reads_since_change = 0;
        state.log.push(format!("apply {} {namespace}", file.display()));
        Ok(true)
    }

    async fn delete(&self, file: &Path, namespace: &str) -> ProbeResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.applied = false;
        state.reads_since_change = 0;
        state.log.push(format!("delete {} {namespace}", file.display()));
        Ok(true)
    }

    async fn wait_for_state(&self, _: &str, _: &str, _: &PollSettings) -> ProbeResult<bool> {
        Ok(true)
    }
}

/// Client for `server` with a short request timeout.
pub fn client(server: &MockServer) -> KialiClient {
    let config = ProbeConfig::new(&server.uri())
        .unwrap()
        .with_request_timeout(Duration::from_secs(5))
        .unwrap();
    KialiClient::new(&config).unwrap()
}

/// Fast poll settings for tests against a local mock server.
pub fn fast_poll(timeout: Duration) -> PollSettings {
    PollSettings::new(Duration::from_millis(20), timeout).unwrap()
}
