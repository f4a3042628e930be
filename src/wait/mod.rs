// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bounded waiting for eventually consistent cluster state.
//!
//! - [`Deadline`] / [`with_deadline`] bound the total wall-clock time of a wait
//! - [`poll_until`] retries a fetch-and-check cycle on a fixed interval
//!
//! Every wait goes `PENDING -> SATISFIED | EXPIRED` and never leaves a terminal
//! state.

pub mod deadline;
pub mod poller;

pub use deadline::{with_deadline, Deadline};
pub use poller::{poll_until, poll_until_with, PollOutcome, PollSettings};
