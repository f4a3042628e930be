// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `fixture.rs`

#[cfg(test)]
mod tests {
    use crate::cluster::{with_fixture, ClusterController};
    use crate::errors::{ProbeError, ProbeResult};
    use crate::wait::PollSettings;
    use async_trait::async_trait;
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;
    use std::path::Path;
    use std::sync::Mutex;

    /// Records every call; apply and delete answer with fixed results.
    struct RecordingController {
        apply_ok: bool,
        delete_ok: bool,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingController {
        fn new(apply_ok: bool, delete_ok: bool) -> Self {
            Self {
                apply_ok,
                delete_ok,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClusterController for RecordingController {
        async fn apply(&self, file: &Path, namespace: &str) -> ProbeResult<bool> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("apply {} {namespace}", file.display()));
            Ok(self.apply_ok)
        }

        async fn delete(&self, file: &Path, namespace: &str) -> ProbeResult<bool> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete {} {namespace}", file.display()));
            Ok(self.delete_ok)
        }

        async fn wait_for_state(&self, _: &str, _: &str, _: &PollSettings) -> ProbeResult<bool> {
            Ok(true)
        }
    }

    const FILE: &str = "cb.yaml";

    #[tokio::test]
    async fn test_deletes_after_success() {
        let controller = RecordingController::new(true, true);

        let value = with_fixture(&controller, Path::new(FILE), "bookinfo", || async {
            controller.calls.lock().unwrap().push("body".to_string());
            Ok(42)
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(
            controller.calls(),
            vec!["apply cb.yaml bookinfo", "body", "delete cb.yaml bookinfo"]
        );
    }

    #[tokio::test]
    async fn test_deletes_after_error() {
        let controller = RecordingController::new(true, true);

        let err = with_fixture(&controller, Path::new(FILE), "bookinfo", || async {
            Err::<(), _>(ProbeError::assertion("graph never converged"))
        })
        .await
        .unwrap_err();

        assert!(err.to_string().contains("graph never converged"));
        assert_eq!(controller.calls().last().unwrap(), "delete cb.yaml bookinfo");
    }

    #[tokio::test]
    async fn test_deletes_after_panic_then_resumes() {
        let controller = RecordingController::new(true, true);

        let outcome = AssertUnwindSafe(with_fixture(
            &controller,
            Path::new(FILE),
            "bookinfo",
            || async {
                if controller.apply_ok {
                    panic!("body blew up");
                }
                Ok(())
            },
        ))
        .catch_unwind()
        .await;

        let panic = outcome.unwrap_err();
        assert_eq!(panic.downcast_ref::<&str>(), Some(&"body blew up"));
        assert_eq!(controller.calls().last().unwrap(), "delete cb.yaml bookinfo");
    }

    #[tokio::test]
    async fn test_unacknowledged_apply_fails_and_still_deletes() {
        let controller = RecordingController::new(false, true);

        let err = with_fixture(&controller, Path::new(FILE), "bookinfo", || async {
            if !controller.apply_ok {
                panic!("body must not run");
            }
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProbeError::Assertion { .. }));
        assert_eq!(
            controller.calls(),
            vec!["apply cb.yaml bookinfo", "delete cb.yaml bookinfo"]
        );
    }

    #[tokio::test]
    async fn test_unacknowledged_delete_fails_successful_body() {
        let controller = RecordingController::new(true, false);

        let err = with_fixture(&controller, Path::new(FILE), "bookinfo", || async { Ok(()) })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed to delete cb.yaml"));
    }

    #[tokio::test]
    async fn test_body_error_wins_over_delete_failure() {
        let controller = RecordingController::new(true, false);

        let err = with_fixture(&controller, Path::new(FILE), "bookinfo", || async {
            Err::<(), _>(ProbeError::InvalidArgument("bad".to_string()))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProbeError::InvalidArgument(_)));
    }
}
