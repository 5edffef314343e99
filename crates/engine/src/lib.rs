// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Tick-driven scheduling core.
//!
//! The engine emulates one CPU and one contiguous address space under a
//! shared logical clock. A single-threaded [`coordinator::Coordinator`] owns
//! all mutable state and, once per tick, drains the intake ring, lets the
//! memory manager gate admission, asks the configured policy to elect a
//! runnable, and steers worker processes with suspend/resume so that exactly
//! one of them consumes the tick.
//!
//! Parallelism exists only at the edges: the workload feeder thread produces
//! into the intake ring, and each admitted job is backed by a worker process
//! counting its runtime down. Both are replaceable in tests (a manual clock
//! and an in-process worker set live in [`testing`]).

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod feeder;
pub mod pcb;
pub mod policy;
pub mod table;
pub mod testing;
pub mod worker;

pub use clock::{LogicalClock, WallClock};
pub use coordinator::{Coordinator, RunSummary};
pub use error::Error;
pub use worker::{OsWorkerSet, WorkerSet};
