// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Typed trace events and their on-disk line formats.

use schedsim_config::{JobId, Tick};
use std::fmt;

/// A process state transition observed by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedAction {
    /// The job ran for the first time.
    Started,
    /// The job resumed after a preemption.
    Resumed,
    /// The job was preempted.
    Stopped,
    /// The job's remaining time reached zero and it was reaped.
    Finished,
}

impl fmt::Display for SchedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SchedAction::Started => "started",
            SchedAction::Resumed => "resumed",
            SchedAction::Stopped => "stopped",
            SchedAction::Finished => "finished",
        };
        write!(f, "{label}")
    }
}

/// Turnaround figures attached to a finish transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishStats {
    /// Ticks from arrival to finish.
    pub turnaround: u64,
    /// Turnaround divided by runtime.
    pub weighted: f64,
}

/// One line of the scheduler trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedEvent {
    /// Tick at which the transition happened.
    pub tick: Tick,
    /// The transitioning job.
    pub job: JobId,
    /// What happened.
    pub action: SchedAction,
    /// The job's arrival tick.
    pub arrival: Tick,
    /// The job's total runtime in ticks.
    pub total: u64,
    /// Ticks still to run after this transition.
    pub remaining: u64,
    /// Ticks the job has spent admitted but not running.
    pub waiting: u64,
    /// Present only on [`SchedAction::Finished`].
    pub finish: Option<FinishStats>,
}

impl fmt::Display for SchedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "At time {} process {} {} arr {} total {} remain {} wait {}",
            self.tick, self.job, self.action, self.arrival, self.total, self.remaining,
            self.waiting
        )?;
        if let Some(stats) = &self.finish {
            write!(f, " TA {} WTA {:.2}", stats.turnaround, stats.weighted)?;
        }
        Ok(())
    }
}

/// The direction of a memory trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemAction {
    /// Bytes were granted to a process.
    Allocated,
    /// Bytes were returned by a process.
    Freed,
}

impl fmt::Display for MemAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MemAction::Allocated => "allocated",
            MemAction::Freed => "freed",
        };
        write!(f, "{label}")
    }
}

/// One line of the memory trace. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemEvent {
    /// Tick at which the event happened.
    pub tick: Tick,
    /// Whether bytes were granted or returned.
    pub action: MemAction,
    /// Size of the block in bytes.
    pub bytes: u64,
    /// The owning job.
    pub job: JobId,
    /// First byte of the block.
    pub from: u64,
    /// Last byte of the block, inclusive.
    pub to: u64,
}

impl fmt::Display for MemEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "At time {} {} {} bytes for process {} from {} to {}",
            self.tick, self.action, self.bytes, self.job, self.from, self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scheduler_lines_match_the_trace_format() {
        let event = SchedEvent {
            tick: 4,
            job: 2,
            action: SchedAction::Resumed,
            arrival: 1,
            total: 5,
            remaining: 3,
            waiting: 2,
            finish: None,
        };
        assert_eq!(
            event.to_string(),
            "At time 4 process 2 resumed arr 1 total 5 remain 3 wait 2"
        );
    }

    #[test]
    fn finish_lines_carry_turnaround_figures() {
        let event = SchedEvent {
            tick: 6,
            job: 3,
            action: SchedAction::Finished,
            arrival: 2,
            total: 1,
            remaining: 0,
            waiting: 3,
            finish: Some(FinishStats {
                turnaround: 4,
                weighted: 4.0,
            }),
        };
        assert_eq!(
            event.to_string(),
            "At time 6 process 3 finished arr 2 total 1 remain 0 wait 3 TA 4 WTA 4.00"
        );
    }

    #[test]
    fn memory_lines_use_inclusive_bounds() {
        let event = MemEvent {
            tick: 0,
            action: MemAction::Allocated,
            bytes: 40,
            job: 1,
            from: 0,
            to: 39,
        };
        assert_eq!(
            event.to_string(),
            "At time 0 allocated 40 bytes for process 1 from 0 to 39"
        );
    }
}
