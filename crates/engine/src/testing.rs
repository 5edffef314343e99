// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Deterministic doubles for the clock and the worker set.
//!
//! Tests drive the coordinator one tick at a time with [`ManualClock`] and
//! observe worker control through [`SimWorkerSet`], which keeps the full
//! transition history in memory instead of touching OS processes.

use crate::clock::LogicalClock;
use crate::error::Error;
use crate::worker::WorkerSet;
use schedsim_config::{JobId, Tick};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A clock that advances only under test control.
#[derive(Clone, Default)]
pub struct ManualClock {
    tick: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by one tick and returns the new value.
    pub fn advance(&self) -> Tick {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Jumps the clock to `tick`.
    pub fn set(&self, tick: Tick) {
        self.tick.store(tick, Ordering::SeqCst);
    }
}

impl LogicalClock for ManualClock {
    fn now(&self) -> Tick {
        self.tick.load(Ordering::SeqCst)
    }

    fn next_tick_due(&self) -> Option<Instant> {
        None
    }
}

/// One observed worker control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerTransition {
    /// The worker was spawned and left suspended.
    Spawned,
    /// The worker received the resume signal.
    Resumed,
    /// The worker received the stop signal.
    Suspended,
    /// The worker ran out and was reaped.
    Reaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimWorkerState {
    Suspended,
    Running,
}

/// In-process worker set recording every transition.
#[derive(Debug, Default)]
pub struct SimWorkerSet {
    states: HashMap<JobId, SimWorkerState>,
    log: Vec<(JobId, WorkerTransition)>,
}

impl SimWorkerSet {
    /// Creates an empty worker set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The transitions observed for `job`, in order.
    #[must_use]
    pub fn transitions_for(&self, job: JobId) -> Vec<WorkerTransition> {
        self.log
            .iter()
            .filter(|(id, _)| *id == job)
            .map(|(_, transition)| *transition)
            .collect()
    }

    /// Number of workers currently alive.
    #[must_use]
    pub fn live(&self) -> usize {
        self.states.len()
    }

    /// True if `job`'s worker exists and is resumed.
    #[must_use]
    pub fn is_running(&self, job: JobId) -> bool {
        self.states.get(&job) == Some(&SimWorkerState::Running)
    }

    fn record(&mut self, job: JobId, transition: WorkerTransition) {
        self.log.push((job, transition));
    }

    fn lost(job: JobId) -> Error {
        Error::WorkerLost {
            job,
            details: "no tracked worker".to_owned(),
        }
    }
}

impl WorkerSet for SimWorkerSet {
    fn spawn(&mut self, job: JobId, _runtime: u64) -> Result<(), Error> {
        let _ = self.states.insert(job, SimWorkerState::Suspended);
        self.record(job, WorkerTransition::Spawned);
        Ok(())
    }

    fn resume(&mut self, job: JobId) -> Result<(), Error> {
        match self.states.get_mut(&job) {
            Some(state) => {
                *state = SimWorkerState::Running;
                self.record(job, WorkerTransition::Resumed);
                Ok(())
            }
            None => Err(Self::lost(job)),
        }
    }

    fn suspend(&mut self, job: JobId) -> Result<(), Error> {
        match self.states.get_mut(&job) {
            Some(state) => {
                *state = SimWorkerState::Suspended;
                self.record(job, WorkerTransition::Suspended);
                Ok(())
            }
            None => Err(Self::lost(job)),
        }
    }

    fn reap(&mut self, job: JobId) -> Result<(), Error> {
        match self.states.remove(&job) {
            Some(_) => {
                self.record(job, WorkerTransition::Reaped);
                Ok(())
            }
            None => Err(Self::lost(job)),
        }
    }

    fn shutdown(&mut self) {
        self.states.clear();
    }
}
