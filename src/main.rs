// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use kiali_probe::cli::Cli;
use kiali_probe::metrics;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

/// Exit code when interrupted, as a shell reports SIGINT
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("kiali-probe")
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    // Respects RUST_LOG (default info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    // Logs go to stderr so stdout only carries results
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    debug!(command = ?cli.command, "Logging initialized");
    info!("Starting kiali-probe");

    let outcome = tokio::select! {
        result = cli.run() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, fixtures applied by a running scenario may remain");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    if cli.print_metrics {
        match metrics::gather_metrics() {
            Ok(text) => print!("{text}"),
            Err(e) => error!(error = %e, "Failed to encode metrics"),
        }
    }

    match outcome {
        Ok(true) => {
            info!("All probes passed");
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => {
            error!("One or more probes failed");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e),
    }
}
