// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The Kiali server deployment under test.
//!
//! Some checks need Kiali configured a particular way. [`KialiInstance`] finds
//! the deployment, rewrites its config map and rolls it so the server picks the
//! change up, waiting at each step until the cluster reflects it.

use crate::constants::{KIALI_CONFIG_KEY, KIALI_LABEL_SELECTOR, RESTARTED_AT_ANNOTATION};
use crate::errors::{ProbeError, ProbeResult};
use crate::wait::{poll_until, PollSettings};
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ListParams, Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

/// A located Kiali deployment.
#[derive(Clone)]
pub struct KialiInstance {
    client: Client,
    namespace: String,
    name: String,
}

impl std::fmt::Debug for KialiInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KialiInstance")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl KialiInstance {
    /// Find the single deployment labelled `app=kiali` across all namespaces.
    ///
    /// # Errors
    ///
    /// `Config` if none or more than one is found; `Kube` on API failures.
    pub async fn discover(client: Client) -> ProbeResult<Self> {
        let api: Api<Deployment> = Api::all(client.clone());
        let deployments = api
            .list(&ListParams::default().labels(KIALI_LABEL_SELECTOR))
            .await?;
        let (namespace, name) = select_single(&deployments.items)?;

        info!(namespace = %namespace, name = %name, "Found Kiali deployment");
        Ok(Self {
            client,
            namespace,
            name,
        })
    }

    /// Namespace of the deployment.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name of the deployment, which is also the name of its config map.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn config_maps(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    fn deployments(&self) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Current `config.yaml` content.
    ///
    /// # Errors
    ///
    /// `Config` if the key is missing; `Kube` on API failures.
    pub async fn config_yaml(&self) -> ProbeResult<String> {
        let config_map = self.config_maps().get(&self.name).await?;
        config_value(&config_map).ok_or_else(|| {
            ProbeError::Config(format!(
                "config map {}/{} has no {KIALI_CONFIG_KEY} key",
                self.namespace, self.name
            ))
        })
    }

    /// Replace `config.yaml` and wait until the config map reflects it.
    ///
    /// # Errors
    ///
    /// `Yaml` if `yaml` does not parse; `Timeout` if the change is not observed
    /// within `settings.timeout`; `Kube` on API failures.
    pub async fn update_config(&self, yaml: &str, settings: &PollSettings) -> ProbeResult<()> {
        // reject malformed content before touching the cluster
        serde_yaml::from_str::<serde_yaml::Value>(yaml)?;
        settings.validate()?;

        let patch = json!({ "data": { KIALI_CONFIG_KEY: yaml } });
        self.config_maps()
            .patch(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        info!(namespace = %self.namespace, name = %self.name, "Patched Kiali config map");

        let deadline = settings.deadline(format!(
            "Timed out waiting for config map {}/{} to update",
            self.namespace, self.name
        ))?;
        poll_until(
            || self.config_yaml(),
            |current: &String| current == yaml,
            settings.interval,
            &deadline,
        )
        .await?;
        Ok(())
    }

    /// True if the deployment has rolled out all desired replicas.
    ///
    /// # Errors
    ///
    /// `Kube` on API failures.
    pub async fn is_ready(&self) -> ProbeResult<bool> {
        let deployment = self.deployments().get(&self.name).await?;
        Ok(deployment_ready(&deployment))
    }

    /// Trigger a rolling restart and wait for the new pods to be ready.
    ///
    /// # Errors
    ///
    /// `Timeout` if the rollout does not finish within `settings.timeout`;
    /// `Kube` on API failures.
    pub async fn restart(&self, settings: &PollSettings) -> ProbeResult<()> {
        settings.validate()?;

        let patch = json!({
            "spec": {
                "template": {
                    "metadata": {
                        "annotations": {
                            RESTARTED_AT_ANNOTATION: Utc::now().to_rfc3339()
                        }
                    }
                }
            }
        });
        let deployments = self.deployments();
        let patched = deployments
            .patch(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!(
            name = %self.name,
            generation = ?patched.metadata.generation,
            "Patched restart annotation"
        );
        info!(namespace = %self.namespace, name = %self.name, "Restarting Kiali");

        let deadline = settings.deadline(format!(
            "Timed out waiting for deployment {}/{} to be ready",
            self.namespace, self.name
        ))?;
        poll_until(
            || self.is_ready(),
            |ready: &bool| *ready,
            settings.interval,
            &deadline,
        )
        .await?;

        info!(namespace = %self.namespace, name = %self.name, "Kiali restarted");
        Ok(())
    }
}

/// Namespace and name of the only deployment in `deployments`.
///
/// # Errors
///
/// `Config` for zero or several deployments.
pub fn select_single(deployments: &[Deployment]) -> ProbeResult<(String, String)> {
    match deployments {
        [only] => Ok((only.namespace().unwrap_or_default(), only.name_any())),
        [] => Err(ProbeError::Config(format!(
            "no deployment labelled {KIALI_LABEL_SELECTOR} found"
        ))),
        many => {
            let names: Vec<String> = many
                .iter()
                .map(|d| format!("{}/{}", d.namespace().unwrap_or_default(), d.name_any()))
                .collect();
            Err(ProbeError::Config(format!(
                "expected one deployment labelled {KIALI_LABEL_SELECTOR}, found {}: {}",
                many.len(),
                names.join(", ")
            )))
        }
    }
}

/// `config.yaml` entry of a config map.
#[must_use]
pub fn config_value(config_map: &ConfigMap) -> Option<String> {
    config_map
        .data
        .as_ref()
        .and_then(|data| data.get(KIALI_CONFIG_KEY))
        .cloned()
}

/// True once the controller has observed the latest spec and every desired
/// replica is updated and ready.
#[must_use]
pub fn deployment_ready(deployment: &Deployment) -> bool {
    let desired = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .unwrap_or(1);
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };

    let generation = deployment.metadata.generation.unwrap_or(0);
    let observed = status.observed_generation.unwrap_or(0);

    observed >= generation
        && status.updated_replicas.unwrap_or(0) == desired
        && status.ready_replicas.unwrap_or(0) == desired
        && status.replicas.unwrap_or(0) == desired
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod instance_tests;
