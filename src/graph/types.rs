// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Graph granularity and node badge kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of a mesh dependency graph.
///
/// Different graph types produce structurally different node sets, so two
/// snapshots are only ever compared when their graph types match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphType {
    /// One node per app
    App,
    /// One node per app version, boxed by app
    VersionedApp,
    /// One node per workload
    Workload,
    /// One node per service
    Service,
}

impl GraphType {
    /// All graph types.
    pub const ALL: [GraphType; 4] = [
        GraphType::App,
        GraphType::VersionedApp,
        GraphType::Workload,
        GraphType::Service,
    ];

    /// Query parameter value (`app`, `versionedApp`, `workload`, `service`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphType::App => "app",
            GraphType::VersionedApp => "versionedApp",
            GraphType::Workload => "workload",
            GraphType::Service => "service",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GraphType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown graph type '{s}' (expected app, versionedApp, workload or service)")
            })
    }
}

/// A boolean marker on a graph node for an Istio policy attached to it.
///
/// The variant names match the node data fields emitted by the graph endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BadgeKind {
    /// Destination rule with a circuit breaker
    #[serde(rename = "hasCB")]
    CircuitBreaker,
    /// Virtual service attached
    #[serde(rename = "hasVS")]
    VirtualService,
    /// HTTP traffic shifting between versions
    #[serde(rename = "hasTrafficShifting")]
    TrafficShifting,
    /// TCP traffic shifting between versions
    #[serde(rename = "hasTCPTrafficShifting")]
    TcpTrafficShifting,
    /// Virtual service with a request timeout
    #[serde(rename = "hasRequestTimeout")]
    RequestTimeout,
    /// Virtual service with fault injection
    #[serde(rename = "hasFaultInjection")]
    FaultInjection,
    /// Virtual service with request routing rules
    #[serde(rename = "hasRequestRouting")]
    RequestRouting,
    /// Virtual service with traffic mirroring
    #[serde(rename = "hasMirroring")]
    Mirroring,
}

impl BadgeKind {
    /// All badge kinds.
    pub const ALL: [BadgeKind; 8] = [
        BadgeKind::CircuitBreaker,
        BadgeKind::VirtualService,
        BadgeKind::TrafficShifting,
        BadgeKind::TcpTrafficShifting,
        BadgeKind::RequestTimeout,
        BadgeKind::FaultInjection,
        BadgeKind::RequestRouting,
        BadgeKind::Mirroring,
    ];

    /// Node data field carrying this badge.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            BadgeKind::CircuitBreaker => "hasCB",
            BadgeKind::VirtualService => "hasVS",
            BadgeKind::TrafficShifting => "hasTrafficShifting",
            BadgeKind::TcpTrafficShifting => "hasTCPTrafficShifting",
            BadgeKind::RequestTimeout => "hasRequestTimeout",
            BadgeKind::FaultInjection => "hasFaultInjection",
            BadgeKind::RequestRouting => "hasRequestRouting",
            BadgeKind::Mirroring => "hasMirroring",
        }
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for BadgeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeKind::ALL
            .into_iter()
            .find(|b| b.field_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = BadgeKind::ALL.iter().map(BadgeKind::field_name).collect();
                format!("unknown badge '{s}' (expected one of {})", known.join(", "))
            })
    }
}
