// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cluster mutation.
//!
//! Scenarios change the cluster only through a [`ClusterController`]: apply a
//! fixture file, delete it again, wait for pods to reach a state. The
//! [`with_fixture`] scope guarantees the delete happens on every exit path.

pub mod fixture;
pub mod oc;

pub use fixture::with_fixture;
pub use oc::OcController;

use crate::errors::ProbeResult;
use crate::wait::PollSettings;
use async_trait::async_trait;
use std::path::Path;

/// Applies and removes fixture files in a cluster.
#[async_trait]
pub trait ClusterController: Send + Sync {
    /// Apply `file` in `namespace`. True if the cluster reports the objects created or configured.
    ///
    /// # Errors
    ///
    /// Returns an error only if the apply could not be attempted.
    async fn apply(&self, file: &Path, namespace: &str) -> ProbeResult<bool>;

    /// Delete the objects in `file` from `namespace`. True if the cluster reports them deleted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the delete could not be attempted.
    async fn delete(&self, file: &Path, namespace: &str) -> ProbeResult<bool>;

    /// Poll the pods in `namespace` until their listing contains `state`.
    ///
    /// Returns `false` when `settings.timeout` runs out.
    ///
    /// # Errors
    ///
    /// Any failure other than the deadline expiring.
    async fn wait_for_state(
        &self,
        namespace: &str,
        state: &str,
        settings: &PollSettings,
    ) -> ProbeResult<bool>;
}
