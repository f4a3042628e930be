// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Point-in-time graph snapshots decoded from the graph endpoint.
//!
//! The endpoint answers with a Cytoscape style document:
//!
//! ```json
//! {
//!   "timestamp": 1700000000,
//!   "duration": 60,
//!   "graphType": "versionedApp",
//!   "elements": {
//!     "nodes": [{ "data": { "id": "n0", "nodeType": "app", "hasCB": true } }],
//!     "edges": [{ "data": { "id": "e0", "source": "n0", "target": "n1" } }]
//!   }
//! }
//! ```
//!
//! The wire types stay private; callers get [`GraphSnapshot`] with named,
//! typed fields and badges folded into a set.

use super::types::{BadgeKind, GraphType};
use crate::errors::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// A graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique node id within the snapshot
    pub id: String,
    /// `app`, `workload`, `service`, `box`, `unknown`, `aggregate`
    pub node_type: String,
    /// Cluster name
    pub cluster: Option<String>,
    /// Namespace
    pub namespace: String,
    /// App label value
    pub app: Option<String>,
    /// Version label value
    pub version: Option<String>,
    /// Workload name
    pub workload: Option<String>,
    /// Service name
    pub service: Option<String>,
    /// Box kind for compound nodes (`app`, `namespace`, `cluster`)
    pub is_box: Option<String>,
    /// Kubernetes labels
    pub labels: BTreeMap<String, String>,
    /// Badges present on the node
    pub badges: BTreeSet<BadgeKind>,
}

impl Node {
    /// True if the node carries `badge`.
    #[must_use]
    pub fn has_badge(&self, badge: BadgeKind) -> bool {
        self.badges.contains(&badge)
    }
}

/// Traffic figures attached to an edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeMetrics {
    /// Protocol (`http`, `grpc`, `tcp`)
    pub protocol: Option<String>,
    /// Rates keyed by rate name
    pub rates: BTreeMap<String, String>,
    /// Response time in milliseconds
    pub response_time_ms: Option<f64>,
    /// Throughput in bytes per second
    pub throughput: Option<f64>,
    /// Percentage of traffic using mutual TLS
    pub mtls_percentage: Option<f64>,
}

/// A graph edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Unique edge id within the snapshot
    pub id: String,
    /// Source node id
    pub source: String,
    /// Target node id
    pub target: String,
    /// Traffic figures
    pub metrics: EdgeMetrics,
}

/// An immutable fetch of the mesh dependency graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    /// Granularity of the graph
    pub graph_type: GraphType,
    /// Nodes in endpoint order
    pub nodes: Vec<Node>,
    /// Edges in endpoint order
    pub edges: Vec<Edge>,
    /// Query time reported by the endpoint
    pub timestamp: Option<DateTime<Utc>>,
    /// Telemetry window in seconds
    pub duration_secs: i64,
}

impl GraphSnapshot {
    /// Decode a snapshot from the endpoint's JSON body.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the body is not a graph document.
    pub fn from_json(body: &str) -> ProbeResult<Self> {
        let config: GraphConfig =
            serde_json::from_str(body).map_err(|e| ProbeError::decode("graph response", e))?;
        Ok(config.into())
    }

    /// Decode a snapshot from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the value is not a graph document.
    pub fn from_value(value: serde_json::Value) -> ProbeResult<Self> {
        let config: GraphConfig =
            serde_json::from_value(value).map_err(|e| ProbeError::decode("graph response", e))?;
        Ok(config.into())
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes carrying `badge`.
    #[must_use]
    pub fn badge_count(&self, badge: BadgeKind) -> usize {
        self.nodes.iter().filter(|n| n.has_badge(badge)).count()
    }

    /// Count of every badge kind, zeros included.
    #[must_use]
    pub fn badge_counts(&self) -> BTreeMap<BadgeKind, usize> {
        BadgeKind::ALL
            .into_iter()
            .map(|badge| (badge, self.badge_count(badge)))
            .collect()
    }

    /// First node matching `predicate`.
    pub fn find_node<P>(&self, predicate: P) -> Option<&Node>
    where
        P: Fn(&Node) -> bool,
    {
        self.nodes.iter().find(|n| predicate(n))
    }

    /// Node ids in endpoint order.
    #[must_use]
    pub fn node_ids(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// One line summary used in logs and timeout errors.
    #[must_use]
    pub fn summary(&self) -> String {
        let badges: Vec<String> = self
            .badge_counts()
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(badge, count)| format!("{badge}={count}"))
            .collect();
        format!(
            "{} graph: {} nodes, {} edges, badges [{}]",
            self.graph_type,
            self.node_count(),
            self.edge_count(),
            badges.join(", ")
        )
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphConfig {
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    duration: i64,
    graph_type: GraphType,
    #[serde(default)]
    elements: Elements,
}

#[derive(Debug, Default, Deserialize)]
struct Elements {
    #[serde(default)]
    nodes: Option<Vec<Wrapper<NodeData>>>,
    #[serde(default)]
    edges: Option<Vec<Wrapper<EdgeData>>>,
}

#[derive(Debug, Deserialize)]
struct Wrapper<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeData {
    id: String,
    #[serde(default)]
    node_type: String,
    #[serde(default)]
    cluster: Option<String>,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    app: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    workload: Option<String>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    is_box: Option<String>,
    #[serde(default)]
    labels: Option<BTreeMap<String, String>>,
    #[serde(default, rename = "hasCB")]
    has_cb: bool,
    #[serde(default, rename = "hasVS")]
    has_vs: Option<serde_json::Value>,
    #[serde(default)]
    has_traffic_shifting: bool,
    #[serde(default, rename = "hasTCPTrafficShifting")]
    has_tcp_traffic_shifting: bool,
    #[serde(default)]
    has_request_timeout: bool,
    #[serde(default)]
    has_fault_injection: bool,
    #[serde(default)]
    has_request_routing: bool,
    #[serde(default)]
    has_mirroring: bool,
}

impl NodeData {
    fn badges(&self) -> BTreeSet<BadgeKind> {
        // hasVS is an object (possibly empty) when a virtual service is attached
        let has_vs = self.has_vs.as_ref().is_some_and(|v| !v.is_null());
        [
            (BadgeKind::CircuitBreaker, self.has_cb),
            (BadgeKind::VirtualService, has_vs),
            (BadgeKind::TrafficShifting, self.has_traffic_shifting),
            (BadgeKind::TcpTrafficShifting, self.has_tcp_traffic_shifting),
            (BadgeKind::RequestTimeout, self.has_request_timeout),
            (BadgeKind::FaultInjection, self.has_fault_injection),
            (BadgeKind::RequestRouting, self.has_request_routing),
            (BadgeKind::Mirroring, self.has_mirroring),
        ]
        .into_iter()
        .filter_map(|(badge, present)| present.then_some(badge))
        .collect()
    }
}

impl From<NodeData> for Node {
    fn from(data: NodeData) -> Self {
        let badges = data.badges();
        Node {
            id: data.id,
            node_type: data.node_type,
            cluster: data.cluster,
            namespace: data.namespace,
            app: data.app,
            version: data.version,
            workload: data.workload,
            service: data.service,
            is_box: data.is_box,
            labels: data.labels.unwrap_or_default(),
            badges,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeData {
    id: String,
    source: String,
    target: String,
    #[serde(default)]
    response_time: Option<String>,
    #[serde(default)]
    throughput: Option<String>,
    #[serde(default, rename = "isMTLS")]
    is_mtls: Option<String>,
    #[serde(default)]
    traffic: Option<ProtocolTraffic>,
}

#[derive(Debug, Default, Deserialize)]
struct ProtocolTraffic {
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    rates: Option<BTreeMap<String, String>>,
}

impl From<EdgeData> for Edge {
    fn from(data: EdgeData) -> Self {
        let traffic = data.traffic.unwrap_or_default();
        Edge {
            id: data.id,
            source: data.source,
            target: data.target,
            metrics: EdgeMetrics {
                protocol: traffic.protocol.filter(|p| !p.is_empty()),
                rates: traffic.rates.unwrap_or_default(),
                response_time_ms: parse_figure(data.response_time.as_deref()),
                throughput: parse_figure(data.throughput.as_deref()),
                mtls_percentage: parse_figure(data.is_mtls.as_deref()),
            },
        }
    }
}

impl From<GraphConfig> for GraphSnapshot {
    fn from(config: GraphConfig) -> Self {
        let elements = config.elements;
        GraphSnapshot {
            graph_type: config.graph_type,
            nodes: elements
                .nodes
                .unwrap_or_default()
                .into_iter()
                .map(|w| w.data.into())
                .collect(),
            edges: elements
                .edges
                .unwrap_or_default()
                .into_iter()
                .map(|w| w.data.into())
                .collect(),
            timestamp: (config.timestamp > 0)
                .then(|| DateTime::from_timestamp(config.timestamp, 0))
                .flatten(),
            duration_secs: config.duration,
        }
    }
}

fn parse_figure(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod snapshot_tests;
