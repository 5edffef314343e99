// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! The five interchangeable scheduling policies.
//!
//! The coordinator drives a fixed per-tick skeleton (drain, admit, finish
//! check, election, accounting); policies differ only in their ready
//! structure and preemption rule. The running job is held by the
//! coordinator's running slot and is never a member of the ready structure:
//! a preemption re-inserts it through [`Policy::requeue`], which is also the
//! moment SRTN refreshes its remaining-time key.

use crate::table::ProcessTable;
use schedsim_config::{JobId, SchedulerKind};

mod fcfs;
mod hpf;
mod queues;
mod rr;
mod sjf;
mod srtn;

/// Outcome of one election.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Election {
    /// The running job keeps the CPU.
    Keep,
    /// Run this job instead; it has been removed from the ready structure,
    /// and the coordinator must requeue the preempted job, if any.
    Switch(JobId),
    /// No running job and nothing ready.
    Idle,
}

/// A scheduling policy's ready structure and election rule.
pub trait Policy {
    /// Which policy this is.
    fn kind(&self) -> SchedulerKind;

    /// Adds a newly admitted job to the ready structure.
    fn admit(&mut self, id: JobId, table: &ProcessTable);

    /// Chooses the job that should own the next tick.
    fn elect(&mut self, running: Option<JobId>, table: &ProcessTable) -> Election;

    /// Returns a preempted job to the ready structure.
    fn requeue(&mut self, id: JobId, table: &ProcessTable);

    /// Notifies the policy that the running job finished and was reaped.
    fn on_finish(&mut self, id: JobId);

    /// Ids currently ready, in no particular order. Used for wait accounting.
    fn ready_ids(&self) -> Vec<JobId>;

    /// True when nothing is ready.
    fn is_empty(&self) -> bool;
}

/// Builds the policy for `kind`. `quantum` is only meaningful for round
/// robin.
#[must_use]
pub fn build(kind: SchedulerKind, quantum: u64) -> Box<dyn Policy> {
    match kind {
        SchedulerKind::Fcfs => Box::new(fcfs::Fcfs::new()),
        SchedulerKind::Sjf => Box::new(sjf::Sjf::new()),
        SchedulerKind::Hpf => Box::new(hpf::Hpf::new()),
        SchedulerKind::Srtn => Box::new(srtn::Srtn::new()),
        SchedulerKind::RoundRobin => Box::new(rr::RoundRobin::new(quantum)),
    }
}
