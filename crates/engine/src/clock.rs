// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! The logical clock.
//!
//! The coordinator and the workload feeder only ever poll the clock; nothing
//! is delivered by callback. The production clock derives the tick from
//! elapsed wall time; tests drive a manual clock tick by tick.

use schedsim_config::Tick;
use std::time::{Duration, Instant};

/// An opaque source of monotonically non-decreasing ticks.
pub trait LogicalClock {
    /// The current tick.
    fn now(&self) -> Tick;

    /// Wall-clock instant at which the tick after [`LogicalClock::now`] is
    /// due, used to bound the coordinator's idle wait. Clocks that only
    /// advance under external control return `None`.
    fn next_tick_due(&self) -> Option<Instant>;
}

/// Clock mapping elapsed wall time onto ticks of a fixed duration.
pub struct WallClock {
    epoch: Instant,
    tick: Duration,
}

impl WallClock {
    /// Starts the clock now; tick zero begins immediately.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is zero.
    #[must_use]
    pub fn start(tick: Duration) -> Self {
        assert!(!tick.is_zero(), "tick duration must be positive");
        Self {
            epoch: Instant::now(),
            tick,
        }
    }

    /// The configured tick duration.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        self.tick
    }
}

impl LogicalClock for WallClock {
    fn now(&self) -> Tick {
        (self.epoch.elapsed().as_nanos() / self.tick.as_nanos()) as Tick
    }

    fn next_tick_due(&self) -> Option<Instant> {
        let elapsed_ticks = self.now() + 1;
        let offset = Duration::from_nanos(
            (self.tick.as_nanos() as u64).saturating_mul(elapsed_ticks),
        );
        Some(self.epoch + offset)
    }
}
