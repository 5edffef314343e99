// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Process control blocks.

use schedsim_config::workload::JobSpec;
use schedsim_config::{JobId, Tick};
use schedsim_memory::Span;

/// Lifecycle state of an admitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Admitted (or admitted-but-waiting for memory), not currently running.
    Waiting,
    /// Elected by the policy; its worker is resumed.
    Running,
    /// Remaining time reached zero; the block is about to be released.
    Finished,
}

/// One process control block. Created when a job is drained from intake,
/// released when the job finishes.
#[derive(Debug, Clone)]
pub struct Pcb {
    /// Identifier copied from the descriptor.
    pub id: JobId,
    /// Arrival tick copied from the descriptor.
    pub arrival: Tick,
    /// Total required CPU time copied from the descriptor.
    pub runtime: u64,
    /// Scheduling priority copied from the descriptor.
    pub priority: i64,
    /// Memory footprint copied from the descriptor.
    pub mem_size: u64,
    /// First tick the job ran; `None` until then.
    pub start_time: Option<Tick>,
    /// Ticks still to run.
    pub remaining: u64,
    /// Ticks actually spent running.
    pub executed: u64,
    /// Ticks spent admitted but not running, memory waits included.
    pub waiting: u64,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// The granted memory block, once admitted.
    pub region: Option<Span>,
}

impl Pcb {
    /// Creates a fresh block for a drained descriptor.
    #[must_use]
    pub fn new(spec: &JobSpec) -> Self {
        Self {
            id: spec.id,
            arrival: spec.arrival,
            runtime: spec.runtime,
            priority: spec.priority,
            mem_size: spec.mem_size,
            start_time: None,
            remaining: spec.runtime,
            executed: 0,
            waiting: 0,
            state: ProcessState::Waiting,
            region: None,
        }
    }

    /// Ticks from arrival to `now`.
    #[must_use]
    pub fn turnaround(&self, now: Tick) -> u64 {
        now.saturating_sub(self.arrival)
    }

    /// Turnaround divided by total runtime.
    #[must_use]
    pub fn weighted_turnaround(&self, now: Tick) -> f64 {
        self.turnaround(now) as f64 / self.runtime as f64
    }

    /// Whether the time accounting invariants hold.
    #[must_use]
    pub fn accounting_holds(&self) -> bool {
        self.remaining <= self.runtime && self.executed + self.remaining == self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> JobSpec {
        JobSpec {
            id: 3,
            arrival: 2,
            runtime: 4,
            priority: 7,
            mem_size: 64,
        }
    }

    #[test]
    fn fresh_blocks_start_waiting_with_full_remaining() {
        let pcb = Pcb::new(&spec());
        assert_eq!(pcb.remaining, 4);
        assert_eq!(pcb.executed, 0);
        assert_eq!(pcb.state, ProcessState::Waiting);
        assert!(pcb.start_time.is_none());
        assert!(pcb.region.is_none());
        assert!(pcb.accounting_holds());
    }

    #[test]
    fn turnaround_is_weighted_by_runtime() {
        let pcb = Pcb::new(&spec());
        assert_eq!(pcb.turnaround(8), 6);
        assert!((pcb.weighted_turnaround(8) - 1.5).abs() < f64::EPSILON);
    }
}
