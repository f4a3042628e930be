// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command line interface.
//!
//! Every subcommand returns `Ok(true)` when everything it checked passed,
//! `Ok(false)` when a probe failed, and `Err` when it could not run at all
//! (bad configuration, unreachable server, unreadable suite).

use crate::api::endpoints::{self, GraphQuery};
use crate::api::KialiClient;
use crate::cluster::{ClusterController, OcController};
use crate::config::ProbeConfig;
use crate::constants::{
    CONFIG_MAP_POLL_INTERVAL_SECS, CONFIG_MAP_TIMEOUT_SECS, DEFAULT_NAMESPACE,
    DEPLOYMENT_READY_POLL_INTERVAL_SECS, DEPLOYMENT_READY_TIMEOUT_SECS, ENV_KIALI_TOKEN,
    ENV_KIALI_URL, ENV_OC_BINARY,
};
use crate::graph::{BadgeKind, GraphType};
use crate::instance::KialiInstance;
use crate::scenario::BadgeScenario;
use crate::suite::{run_checks, Suite};
use crate::wait::PollSettings;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Convergence probes for the Kiali API
#[derive(Parser, Debug)]
#[command(name = "kiali-probe", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print Prometheus metrics to stdout before exiting
    #[arg(long, global = true)]
    pub print_metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the environment-provided connection settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Kiali base URL, overrides $URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Bearer token, overrides $TOKEN
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Cluster CLI binary, overrides $KIALI_PROBE_OC
    #[arg(long, global = true)]
    pub oc: Option<String>,
}

impl ConnectionArgs {
    /// Resolve the probe configuration from flags, then `env`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if no URL is available or any value is malformed.
    pub fn probe_config_from<F>(&self, env: F) -> crate::errors::ProbeResult<ProbeConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ProbeConfig::from_lookup(|key| {
            let flag = match key {
                ENV_KIALI_URL => self.url.clone(),
                ENV_KIALI_TOKEN => self.token.clone(),
                _ => None,
            };
            flag.or_else(|| env(key))
        })?;
        Ok(if self.insecure {
            config.with_insecure(true)
        } else {
            config
        })
    }

    fn probe_config(&self) -> Result<ProbeConfig> {
        self.probe_config_from(|key| std::env::var(key).ok())
            .context("failed to resolve Kiali connection settings")
    }

    /// Cluster controller for the configured binary; needs no Kiali URL.
    #[must_use]
    pub fn oc_controller_from<F>(&self, env: F) -> OcController
    where
        F: Fn(&str) -> Option<String>,
    {
        self.oc
            .clone()
            .or_else(|| env(ENV_OC_BINARY).filter(|v| !v.trim().is_empty()))
            .map_or_else(OcController::default, OcController::new)
    }

    fn oc_controller(&self) -> OcController {
        self.oc_controller_from(|key| std::env::var(key).ok())
    }

    async fn kiali_client(&self) -> Result<KialiClient> {
        let config = self.probe_config()?;
        info!(url = %config.url, "Connecting to Kiali");
        KialiClient::connect(&config)
            .await
            .with_context(|| format!("failed to connect to Kiali at {}", config.url))
    }
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the endpoint checks of a suite file
    Check(CheckArgs),
    /// Apply a fixture and wait for its badges to appear and disappear
    Badge(BadgeArgs),
    /// Run the checks and scenarios of a suite file
    Suite(SuiteArgs),
    /// Print node, edge and badge counts of a namespace graph
    Graph(GraphArgs),
    /// Wait until the pod listing of a namespace shows a state
    WaitPods(WaitPodsArgs),
    /// Replace the Kiali server configuration and restart it
    KialiConfig(KialiConfigArgs),
}

/// Timing flags shared by waiting subcommands.
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds to wait before giving up
    #[arg(long, default_value_t = 60.0)]
    pub timeout: f64,

    /// Seconds between attempts
    #[arg(long, default_value_t = 1.0)]
    pub interval: f64,
}

impl PollArgs {
    fn settings(&self) -> Result<PollSettings> {
        PollSettings::from_secs_f64(self.interval, self.timeout).context("invalid poll settings")
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Suite file
    #[arg(long)]
    pub suite: PathBuf,
}

#[derive(Args, Debug)]
pub struct BadgeArgs {
    /// Manifest to apply
    #[arg(long)]
    pub fixture: PathBuf,

    /// Namespace to apply it in
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Badge the fixture should produce (hasCB, hasVS, ...); repeatable
    #[arg(long = "badge", required = true)]
    pub badges: Vec<BadgeKind>,

    /// Graph type to observe
    #[arg(long, default_value = "versionedApp")]
    pub graph_type: GraphType,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Args, Debug)]
pub struct SuiteArgs {
    /// Suite file
    #[arg(long)]
    pub suite: PathBuf,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Namespace to graph
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Graph type
    #[arg(long, default_value = "versionedApp")]
    pub graph_type: GraphType,
}

#[derive(Args, Debug)]
pub struct WaitPodsArgs {
    /// Namespace to watch
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Text the pod listing must contain
    #[arg(long, default_value = "Running")]
    pub state: String,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Args, Debug)]
pub struct KialiConfigArgs {
    /// New content of config.yaml
    #[arg(long)]
    pub file: PathBuf,

    /// Only update the config map
    #[arg(long)]
    pub no_restart: bool,
}

impl Cli {
    /// Run the selected subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the subcommand could not run.
    pub async fn run(&self) -> Result<bool> {
        let connection = &self.connection;
        match &self.command {
            Command::Check(args) => args.run(connection).await,
            Command::Badge(args) => args.run(connection).await,
            Command::Suite(args) => args.run(connection).await,
            Command::Graph(args) => args.run(connection).await,
            Command::WaitPods(args) => args.run(connection).await,
            Command::KialiConfig(args) => args.run().await,
        }
    }
}

impl CheckArgs {
    async fn run(&self, connection: &ConnectionArgs) -> Result<bool> {
        let suite = Suite::load(&self.suite).await?;
        let client = connection.kiali_client().await?;

        let reports = run_checks(&client, &suite.checks).await;
        for report in &reports {
            println!("{report}");
        }
        Ok(reports.iter().all(|r| r.passed()))
    }
}

impl BadgeArgs {
    async fn run(&self, connection: &ConnectionArgs) -> Result<bool> {
        let settings = self.poll.settings()?;
        let client = connection.kiali_client().await?;
        let oc = connection.oc_controller();

        let scenario = BadgeScenario::new(
            self.fixture.display().to_string(),
            self.fixture.clone(),
            self.namespace.clone(),
            self.badges.clone(),
        )
        .with_graph_type(self.graph_type);

        match scenario.run(&client, &oc, &settings).await {
            Ok(report) => {
                println!("PASS {report}");
                Ok(true)
            }
            Err(e) => {
                println!("FAIL {}: {e}", scenario.name);
                Ok(false)
            }
        }
    }
}

impl SuiteArgs {
    async fn run(&self, connection: &ConnectionArgs) -> Result<bool> {
        let suite = Suite::load(&self.suite).await?;
        let client = connection.kiali_client().await?;
        let oc = connection.oc_controller();

        let report = suite.run(&client, &oc).await;
        for check in &report.checks {
            println!("{check}");
        }
        for (name, outcome) in &report.scenarios {
            match outcome {
                Ok(scenario) => println!("PASS {scenario}"),
                Err(e) => println!("FAIL {name}: {e}"),
            }
        }
        println!(
            "{} failure(s) in {} check(s) and {} scenario(s)",
            report.failures(),
            report.checks.len(),
            report.scenarios.len()
        );
        Ok(report.passed())
    }
}

impl GraphArgs {
    async fn run(&self, connection: &ConnectionArgs) -> Result<bool> {
        let client = connection.kiali_client().await?;
        let query = GraphQuery::new(self.namespace.clone(), self.graph_type);
        let snapshot = endpoints::graph_namespaces(&client, &query)
            .await
            .with_context(|| format!("failed to fetch the {} graph", self.namespace))?;

        println!("{}", snapshot.summary());
        for (badge, count) in snapshot.badge_counts() {
            println!("  {badge}: {count}");
        }
        Ok(true)
    }
}

impl WaitPodsArgs {
    async fn run(&self, connection: &ConnectionArgs) -> Result<bool> {
        let settings = self.poll.settings()?;
        let reached = connection
            .oc_controller()
            .wait_for_state(&self.namespace, &self.state, &settings)
            .await?;
        if reached {
            println!("pods in {} reached {}", self.namespace, self.state);
        } else {
            println!("pods in {} did not reach {} in time", self.namespace, self.state);
        }
        Ok(reached)
    }
}

impl KialiConfigArgs {
    async fn run(&self) -> Result<bool> {
        let yaml = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("failed to read {}", self.file.display()))?;

        let client = kube::Client::try_default()
            .await
            .context("failed to create Kubernetes client")?;
        let instance = KialiInstance::discover(client).await?;

        let config_map = PollSettings::new(
            Duration::from_secs(CONFIG_MAP_POLL_INTERVAL_SECS),
            Duration::from_secs(CONFIG_MAP_TIMEOUT_SECS),
        )?;
        instance.update_config(&yaml, &config_map).await?;

        if !self.no_restart {
            let rollout = PollSettings::new(
                Duration::from_secs(DEPLOYMENT_READY_POLL_INTERVAL_SECS),
                Duration::from_secs(DEPLOYMENT_READY_TIMEOUT_SECS),
            )?;
            instance.restart(&rollout).await?;
        }

        println!(
            "updated {}/{}{}",
            instance.namespace(),
            instance.name(),
            if self.no_restart { "" } else { " and restarted it" }
        );
        Ok(true)
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod cli_tests;
