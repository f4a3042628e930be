// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cooperative wall-clock deadlines.
//!
//! A [`Deadline`] does not interrupt anything. The code running inside a wait
//! scope consults it on every iteration and stops once it reports expiry. The
//! timeout error it produces always carries the message the deadline was
//! created with.
//!
//! Time is read from `tokio::time::Instant`, so tests running with paused time
//! advance deadlines deterministically.

use crate::errors::{ProbeError, ProbeResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A bounded wait scope.
#[derive(Debug, Clone)]
pub struct Deadline {
    message: String,
    duration: Duration,
    started: Instant,
}

impl Deadline {
    /// Start a deadline now.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `duration` is zero.
    pub fn new(duration: Duration, message: impl Into<String>) -> ProbeResult<Self> {
        let message = message.into();
        if duration.is_zero() {
            return Err(ProbeError::InvalidArgument(format!(
                "deadline '{message}' must have a positive duration"
            )));
        }
        Ok(Self {
            message,
            duration,
            started: Instant::now(),
        })
    }

    /// Start a deadline from a number of seconds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `secs` is zero, negative, not finite or too large.
    pub fn from_secs_f64(secs: f64, message: impl Into<String>) -> ProbeResult<Self> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ProbeError::InvalidArgument(format!(
                "deadline duration must be a positive number of seconds, got {secs}"
            )));
        }
        let duration = Duration::try_from_secs_f64(secs).map_err(|e| {
            ProbeError::InvalidArgument(format!("deadline of {secs} seconds: {e}"))
        })?;
        Self::new(duration, message)
    }

    /// Message carried by the timeout error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Total duration of the scope.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time spent since the deadline started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left before expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed())
    }

    /// True once elapsed time reaches the duration.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.duration
    }

    /// Fail with `Timeout` if the deadline has expired.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` carrying the deadline message once expired.
    pub fn check(&self) -> ProbeResult<()> {
        if self.is_expired() {
            return Err(self.timeout(None));
        }
        Ok(())
    }

    /// Build the timeout error for this deadline.
    #[must_use]
    pub fn timeout(&self, last_observation: Option<String>) -> ProbeError {
        ProbeError::Timeout {
            message: self.message.clone(),
            elapsed: self.elapsed(),
            last_observation,
        }
    }
}

/// Run `body` inside a fresh deadline.
///
/// The body receives the deadline and is expected to check it on each
/// iteration. Whatever the body returns is passed through; a timeout is logged
/// before it propagates.
///
/// # Errors
///
/// Returns `InvalidArgument` for a zero duration, otherwise the body's error.
///
/// # Example
///
/// ```rust,no_run
/// use kiali_probe::wait::with_deadline;
/// use std::time::Duration;
///
/// # async fn example() -> kiali_probe::errors::ProbeResult<()> {
/// with_deadline(Duration::from_secs(10), "Timed out waiting for pods", |deadline| async move {
///     while !deadline.is_expired() {
///         tokio::time::sleep(Duration::from_secs(1)).await;
///     }
///     deadline.check()
/// })
/// .await
/// # }
/// ```
pub async fn with_deadline<T, F, Fut>(
    duration: Duration,
    message: impl Into<String>,
    body: F,
) -> ProbeResult<T>
where
    F: FnOnce(Deadline) -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
{
    let deadline = Deadline::new(duration, message)?;
    debug!(
        message = deadline.message(),
        duration = ?deadline.duration(),
        "Entering wait scope"
    );

    let result = body(deadline.clone()).await;

    if let Err(e) = &result {
        if e.is_timeout() {
            warn!(
                message = deadline.message(),
                elapsed = ?deadline.elapsed(),
                "Wait scope expired"
            );
        }
    }
    result
}

#[cfg(test)]
#[path = "deadline_tests.rs"]
mod deadline_tests;
