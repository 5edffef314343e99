// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Aggregate run metrics.

use schedsim_config::Tick;
use std::fmt;

/// Accumulates the run-wide counters behind `scheduler.perf`.
#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    busy_ticks: u64,
    finished: u64,
    total_weighted_turnaround: f64,
    total_waiting: u64,
}

impl RunMetrics {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a tick during which some job ran.
    pub fn record_busy_tick(&mut self) {
        self.busy_ticks += 1;
    }

    /// Records a finished job.
    pub fn record_finish(&mut self, waiting: u64, weighted_turnaround: f64) {
        self.finished += 1;
        self.total_waiting += waiting;
        self.total_weighted_turnaround += weighted_turnaround;
    }

    /// Number of ticks during which the emulated CPU was busy.
    #[must_use]
    pub fn busy_ticks(&self) -> u64 {
        self.busy_ticks
    }

    /// Number of finished jobs.
    #[must_use]
    pub fn finished(&self) -> u64 {
        self.finished
    }

    /// The metrics as of tick `now`.
    #[must_use]
    pub fn snapshot(&self, now: Tick) -> PerfSnapshot {
        let cpu_utilization = if now == 0 {
            0.0
        } else {
            self.busy_ticks as f64 / now as f64 * 100.0
        };
        let (avg_wta, avg_waiting) = if self.finished == 0 {
            (0.0, 0.0)
        } else {
            (
                self.total_weighted_turnaround / self.finished as f64,
                self.total_waiting as f64 / self.finished as f64,
            )
        };
        PerfSnapshot {
            cpu_utilization,
            avg_wta,
            avg_waiting,
        }
    }
}

/// The contents of `scheduler.perf` at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSnapshot {
    /// Busy ticks over elapsed ticks, as a percentage.
    pub cpu_utilization: f64,
    /// Mean weighted turnaround over finished jobs.
    pub avg_wta: f64,
    /// Mean waiting time over finished jobs, in ticks.
    pub avg_waiting: f64,
}

impl fmt::Display for PerfSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU utilization = {:.2}%", self.cpu_utilization)?;
        writeln!(f, "Avg WTA = {:.2}", self.avg_wta)?;
        writeln!(f, "Avg Waiting = {:.2}", self.avg_waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_averages_finished_jobs() {
        let mut metrics = RunMetrics::new();
        for _ in 0..6 {
            metrics.record_busy_tick();
        }
        metrics.record_finish(0, 1.0);
        metrics.record_finish(3, 2.0);
        metrics.record_finish(4, 4.0);

        let snapshot = metrics.snapshot(6);
        assert_eq!(snapshot.cpu_utilization, 100.0);
        assert!((snapshot.avg_wta - 7.0 / 3.0).abs() < 1e-9);
        assert!((snapshot.avg_waiting - 7.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_run_yields_zeroes() {
        let metrics = RunMetrics::new();
        let snapshot = metrics.snapshot(0);
        assert_eq!(snapshot.cpu_utilization, 0.0);
        assert_eq!(snapshot.avg_wta, 0.0);
        assert_eq!(snapshot.avg_waiting, 0.0);
    }

    #[test]
    fn perf_file_format() {
        let snapshot = PerfSnapshot {
            cpu_utilization: 85.7143,
            avg_wta: 2.3333,
            avg_waiting: 1.0,
        };
        assert_eq!(
            snapshot.to_string(),
            "CPU utilization = 85.71%\nAvg WTA = 2.33\nAvg Waiting = 1.00\n"
        );
    }
}
