// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fixed-interval condition polling bounded by a [`Deadline`].
//!
//! One poll is a strict sequence: check the deadline, fetch, evaluate the
//! predicate, sleep. A failing fetch is surfaced immediately; only an
//! unsatisfied predicate leads to another attempt. Independent polls can run
//! concurrently since each one owns its fetch and its deadline.

use super::deadline::Deadline;
use crate::constants::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS};
use crate::errors::{ProbeError, ProbeResult};
use crate::metrics;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum length of the rendered last observation kept in a timeout
const OBSERVATION_PREVIEW_LEN: usize = 2048;

/// Interval and deadline for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PollSettings {
    /// Sleep between attempts
    #[serde(with = "secs")]
    pub interval: Duration,
    /// Total time allowed for the wait
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
        }
    }
}

impl PollSettings {
    /// Build settings, rejecting zero durations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either duration is zero.
    pub fn new(interval: Duration, timeout: Duration) -> ProbeResult<Self> {
        let settings = Self { interval, timeout };
        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from seconds.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either value is not a positive finite number
    /// or does not fit in a `Duration`.
    pub fn from_secs_f64(interval_secs: f64, timeout_secs: f64) -> ProbeResult<Self> {
        let seconds = |name: &str, value: f64| {
            if !value.is_finite() || value <= 0.0 {
                return Err(ProbeError::InvalidArgument(format!(
                    "poll {name} must be a positive number of seconds, got {value}"
                )));
            }
            Duration::try_from_secs_f64(value).map_err(|e| {
                ProbeError::InvalidArgument(format!("poll {name} of {value} seconds: {e}"))
            })
        };
        Self::new(
            seconds("interval", interval_secs)?,
            seconds("timeout", timeout_secs)?,
        )
    }

    /// Reject zero durations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if either duration is zero.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.interval.is_zero() {
            return Err(ProbeError::InvalidArgument(
                "poll interval must be positive".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ProbeError::InvalidArgument(
                "poll timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Start a deadline using these settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the timeout is zero.
    pub fn deadline(&self, message: impl Into<String>) -> ProbeResult<Deadline> {
        Deadline::new(self.timeout, message)
    }
}

/// Outcome of one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// Predicate held for this value
    Satisfied(T),
    /// Predicate did not hold yet
    Pending(T),
}

impl<T> PollOutcome<T> {
    /// Evaluate `predicate` against `value`.
    pub fn evaluate<P>(value: T, predicate: P) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        if predicate(&value) {
            Self::Satisfied(value)
        } else {
            Self::Pending(value)
        }
    }

    /// True for `Satisfied`.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }

    /// The observed value.
    pub fn into_inner(self) -> T {
        match self {
            Self::Satisfied(value) | Self::Pending(value) => value,
        }
    }
}

/// Poll `fetch` until `predicate` holds or the deadline expires.
///
/// Returns the first fetched value for which the predicate returned true.
///
/// # Errors
///
/// - `InvalidArgument` if `interval` is zero
/// - `Timeout` carrying the deadline message and the last observation
/// - any error returned by `fetch`, immediately
///
/// # Example
///
/// ```rust,no_run
/// use kiali_probe::wait::{poll_until, PollSettings};
///
/// # async fn example() -> kiali_probe::errors::ProbeResult<()> {
/// let settings = PollSettings::default();
/// let deadline = settings.deadline("Timed out waiting for workload")?;
/// let count = poll_until(
///     || async { Ok::<usize, kiali_probe::errors::ProbeError>(3) },
///     |count| *count >= 3,
///     settings.interval,
///     &deadline,
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn poll_until<T, F, Fut, P>(
    fetch: F,
    predicate: P,
    interval: Duration,
    deadline: &Deadline,
) -> ProbeResult<T>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
    P: FnMut(&T) -> bool,
{
    poll_until_with(fetch, predicate, |value| format!("{value:?}"), interval, deadline).await
}

/// Like [`poll_until`], rendering the last observation with `describe`.
///
/// Useful when `Debug` output of the fetched value is too large to be worth
/// keeping in an error (graph snapshots, for instance).
///
/// # Errors
///
/// Same as [`poll_until`].
pub async fn poll_until_with<T, F, Fut, P, D>(
    mut fetch: F,
    mut predicate: P,
    describe: D,
    interval: Duration,
    deadline: &Deadline,
) -> ProbeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<T>>,
    P: FnMut(&T) -> bool,
    D: Fn(&T) -> String,
{
    if interval.is_zero() {
        return Err(ProbeError::InvalidArgument(format!(
            "poll interval for '{}' must be positive",
            deadline.message()
        )));
    }

    let mut attempt: u32 = 0;
    let mut last: Option<T> = None;

    loop {
        if deadline.is_expired() {
            let observation = last.as_ref().map(|value| preview(&describe(value)));
            warn!(
                wait = deadline.message(),
                attempts = attempt,
                elapsed = ?deadline.elapsed(),
                "Condition not satisfied before deadline"
            );
            metrics::record_wait_outcome(deadline.message(), "timeout", deadline.elapsed());
            return Err(deadline.timeout(observation));
        }

        attempt += 1;
        metrics::record_poll_attempt(deadline.message());

        let value = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    wait = deadline.message(),
                    attempt = attempt,
                    error = %e,
                    "Fetch failed, not retrying"
                );
                metrics::record_wait_outcome(deadline.message(), "error", deadline.elapsed());
                return Err(e);
            }
        };

        match PollOutcome::evaluate(value, &mut predicate) {
            PollOutcome::Satisfied(value) => {
                debug!(
                    wait = deadline.message(),
                    attempt = attempt,
                    elapsed = ?deadline.elapsed(),
                    "Condition satisfied"
                );
                metrics::record_wait_outcome(deadline.message(), "satisfied", deadline.elapsed());
                return Ok(value);
            }
            PollOutcome::Pending(value) => {
                debug!(
                    wait = deadline.message(),
                    attempt = attempt,
                    elapsed = ?deadline.elapsed(),
                    observation = %describe(&value),
                    "Condition not yet satisfied"
                );
                last = Some(value);
            }
        }

        tokio::time::sleep(interval.min(deadline.remaining())).await;
    }
}

fn preview(rendered: &str) -> String {
    if rendered.chars().count() <= OBSERVATION_PREVIEW_LEN {
        return rendered.to_string();
    }
    let mut cut: String = rendered.chars().take(OBSERVATION_PREVIEW_LEN).collect();
    cut.push_str("...");
    cut
}

/// Serde helpers for durations written as seconds in suite files.
mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a positive number of seconds, got {secs}"
            )));
        }
        Duration::try_from_secs_f64(secs).map_err(|e| {
            serde::de::Error::custom(format!("duration of {secs} seconds: {e}"))
        })
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod poller_tests;
