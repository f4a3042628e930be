// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mesh dependency graph snapshots and their comparison.
//!
//! - [`types`] - graph granularity and badge kinds
//! - [`snapshot`] - decoding of the graph endpoint response
//! - [`differ`] - before/after comparison and convergence waits

pub mod differ;
pub mod snapshot;
pub mod types;

pub use differ::{badge_count, compare, GraphDiffer, SnapshotDiff};
pub use snapshot::{Edge, EdgeMetrics, GraphSnapshot, Node};
pub use types::{BadgeKind, GraphType};
