// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Execution traces and aggregate metrics.
//!
//! The simulator produces three artifacts:
//! - `scheduler.log`: one line per process state transition,
//! - `memory.log`: one line per allocation or release,
//! - `scheduler.perf`: aggregate metrics, rewritten on every finish.
//!
//! The coordinator emits typed events ([`event::SchedEvent`],
//! [`event::MemEvent`]) into an [`sink::EventSink`]; the production sink owns
//! the three files for the lifetime of the run and flushes after each event,
//! while tests collect events in memory.

pub mod event;
pub mod metrics;
pub mod sink;
pub mod testing;

pub use metrics::{PerfSnapshot, RunMetrics};
pub use sink::{EventSink, FileSinks};
