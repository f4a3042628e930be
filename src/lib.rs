// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # kiali-probe - convergence probes for the Kiali API
//!
//! kiali-probe drives a live Kiali installation the way an end-to-end suite
//! does: it changes the cluster, then waits, within a bounded time, for the
//! change to show up in the service graph and the REST API.
//!
//! ## Overview
//!
//! - [`wait`] - deadlines and the fixed-interval condition poller
//! - [`graph`] - graph snapshots, badge counts and snapshot comparison
//! - [`api`] - named API operations, the `reqwest` client and typed endpoints
//! - [`cluster`] - fixture apply/delete through `oc`, with guaranteed cleanup
//! - [`instance`] - the Kiali deployment: config map updates and restarts
//! - [`scenario`] - badge create/revert scenarios
//! - [`suite`] - endpoint checks and YAML suite files
//!
//! ## Example
//!
//! ```rust,no_run
//! use kiali_probe::api::KialiClient;
//! use kiali_probe::cluster::OcController;
//! use kiali_probe::config::ProbeConfig;
//! use kiali_probe::graph::BadgeKind;
//! use kiali_probe::scenario::BadgeScenario;
//! use kiali_probe::wait::PollSettings;
//!
//! # async fn example() -> kiali_probe::errors::ProbeResult<()> {
//! let client = KialiClient::connect(&ProbeConfig::from_env()?).await?;
//! let scenario = BadgeScenario::new(
//!     "circuit breaker",
//!     "fixtures/circuit-breaker.yaml",
//!     "bookinfo",
//!     vec![BadgeKind::CircuitBreaker],
//! );
//! let report = scenario
//!     .run(&client, &OcController::default(), &PollSettings::default())
//!     .await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod errors;
pub mod graph;
pub mod instance;
pub mod metrics;
pub mod models;
pub mod scenario;
pub mod status_codes;
pub mod suite;
pub mod wait;
