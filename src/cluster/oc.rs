// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! [`ClusterController`] backed by the `oc` (or `kubectl`) command line.

use super::ClusterController;
use crate::constants::DEFAULT_OC_BINARY;
use crate::errors::{ProbeError, ProbeResult};
use crate::metrics;
use crate::wait::{poll_until_with, PollSettings};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Captured result of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// True if the process exited with status 0
    pub success: bool,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Drives the cluster through a CLI binary.
#[derive(Debug, Clone)]
pub struct OcController {
    binary: String,
}

impl Default for OcController {
    fn default() -> Self {
        Self::new(DEFAULT_OC_BINARY)
    }
}

impl OcController {
    /// Controller running `binary` (a name on `PATH` or a full path).
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Binary this controller runs.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Run the binary with `args` and capture its output.
    ///
    /// A non-zero exit is not an error; callers inspect the output.
    ///
    /// # Errors
    ///
    /// Returns `Command` if the process cannot be spawned.
    pub async fn run(&self, args: &[&str]) -> ProbeResult<CommandOutput> {
        let command_line = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %command_line, "Running cluster command");

        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProbeError::Command {
                command: command_line.clone(),
                source,
            })?;

        let output = CommandOutput::from(output);
        if !output.success {
            warn!(
                command = %command_line,
                stderr = %output.stderr.trim(),
                "Cluster command exited with failure"
            );
        }
        Ok(output)
    }

    async fn run_on_file(
        &self,
        action: &str,
        file: &Path,
        namespace: &str,
    ) -> ProbeResult<CommandOutput> {
        let file = file.to_string_lossy();
        self.run(&[action, "-n", namespace, "-f", file.as_ref()]).await
    }

    /// List the pods of `namespace`.
    ///
    /// # Errors
    ///
    /// Returns `Command` if the process cannot be spawned.
    pub async fn get_pods(&self, namespace: &str) -> ProbeResult<String> {
        Ok(self.run(&["get", "pods", "-n", namespace]).await?.stdout)
    }
}

/// True if `apply` output reports at least one object created or configured.
#[must_use]
pub fn apply_succeeded(stdout: &str) -> bool {
    stdout.contains("created") || stdout.contains("configure")
}

/// True if `delete` output reports at least one object deleted.
#[must_use]
pub fn delete_succeeded(stdout: &str) -> bool {
    stdout.contains("deleted")
}

#[async_trait]
impl ClusterController for OcController {
    async fn apply(&self, file: &Path, namespace: &str) -> ProbeResult<bool> {
        let output = self.run_on_file("apply", file, namespace).await?;
        let ok = apply_succeeded(&output.stdout);
        metrics::record_fixture_operation("apply", ok);
        info!(
            file = %file.display(),
            namespace = %namespace,
            applied = ok,
            "Applied fixture"
        );
        Ok(ok)
    }

    async fn delete(&self, file: &Path, namespace: &str) -> ProbeResult<bool> {
        let output = self.run_on_file("delete", file, namespace).await?;
        let ok = delete_succeeded(&output.stdout);
        metrics::record_fixture_operation("delete", ok);
        info!(
            file = %file.display(),
            namespace = %namespace,
            deleted = ok,
            "Deleted fixture"
        );
        Ok(ok)
    }

    async fn wait_for_state(
        &self,
        namespace: &str,
        state: &str,
        settings: &PollSettings,
    ) -> ProbeResult<bool> {
        settings.validate()?;
        let deadline =
            settings.deadline(format!("Timed out waiting for pods in {namespace} to be {state}"))?;

        let result = poll_until_with(
            || self.get_pods(namespace),
            |pods: &String| pods.contains(state),
            |pods: &String| pods.clone(),
            settings.interval,
            &deadline,
        )
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if e.is_timeout() => {
                warn!(namespace = %namespace, state = %state, "Pods did not reach state in time");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "oc_tests.rs"]
mod oc_tests;
