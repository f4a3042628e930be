// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Scoped fixture acquisition.

use super::ClusterController;
use crate::errors::{ProbeError, ProbeResult};
use futures::FutureExt;
use std::future::Future;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::{error, info, warn};

/// Apply `file`, run `body`, then delete `file` whatever happened.
///
/// The delete runs after `body` returns `Ok`, after it returns `Err` and after
/// it panics; a panic is resumed once the delete has finished. An apply the
/// cluster did not acknowledge is still followed by a delete, since it may have
/// partially succeeded.
///
/// # Errors
///
/// - `Assertion` if the apply was not acknowledged
/// - the error returned by `body`, if any
/// - `Assertion` if `body` succeeded but the delete was not acknowledged
/// - any error from the controller itself
///
/// # Example
///
/// ```rust,no_run
/// use kiali_probe::cluster::{with_fixture, OcController};
/// use std::path::Path;
///
/// # async fn example() -> kiali_probe::errors::ProbeResult<()> {
/// let oc = OcController::default();
/// with_fixture(&oc, Path::new("fixtures/circuit-breaker.yaml"), "bookinfo", || async {
///     // observe the cluster while the fixture is in place
///     Ok(())
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_fixture<C, F, Fut, T>(
    controller: &C,
    file: &Path,
    namespace: &str,
    body: F,
) -> ProbeResult<T>
where
    C: ClusterController + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
{
    info!(file = %file.display(), namespace = %namespace, "Acquiring fixture");

    let applied = controller.apply(file, namespace).await?;
    if !applied {
        error!(
            file = %file.display(),
            namespace = %namespace,
            "Fixture apply was not acknowledged"
        );
        release(controller, file, namespace).await;
        return Err(ProbeError::assertion(format!(
            "failed to apply {} in namespace {namespace}",
            file.display()
        )));
    }

    let outcome = AssertUnwindSafe(body()).catch_unwind().await;
    let released = release(controller, file, namespace).await;

    match outcome {
        Err(panic) => resume_unwind(panic),
        Ok(Err(e)) => Err(e),
        Ok(Ok(value)) if released => Ok(value),
        Ok(Ok(_)) => Err(ProbeError::assertion(format!(
            "failed to delete {} from namespace {namespace}",
            file.display()
        ))),
    }
}

/// Delete the fixture, logging instead of failing so the caller's outcome wins.
async fn release<C>(controller: &C, file: &Path, namespace: &str) -> bool
where
    C: ClusterController + ?Sized,
{
    match controller.delete(file, namespace).await {
        Ok(true) => {
            info!(file = %file.display(), namespace = %namespace, "Released fixture");
            true
        }
        Ok(false) => {
            warn!(
                file = %file.display(),
                namespace = %namespace,
                "Fixture delete was not acknowledged"
            );
            false
        }
        Err(e) => {
            warn!(
                file = %file.display(),
                namespace = %namespace,
                error = %e,
                "Fixture delete failed"
            );
            false
        }
    }
}

#[cfg(test)]
#[path = "fixture_tests.rs"]
mod fixture_tests;
