// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for trace sinks.

use crate::event::{MemEvent, SchedEvent};
use crate::metrics::PerfSnapshot;
use crate::sink::EventSink;
use std::io;

/// Sink that keeps every event in memory, for assertions.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Scheduler transitions, in emission order.
    pub scheduler: Vec<SchedEvent>,
    /// Memory events, in emission order.
    pub memory: Vec<MemEvent>,
    /// Every perf snapshot ever published; the last one is the "file".
    pub perf: Vec<PerfSnapshot>,
}

impl CollectingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for CollectingSink {
    fn scheduler(&mut self, event: &SchedEvent) -> io::Result<()> {
        self.scheduler.push(*event);
        Ok(())
    }

    fn memory(&mut self, event: &MemEvent) -> io::Result<()> {
        self.memory.push(*event);
        Ok(())
    }

    fn perf(&mut self, snapshot: &PerfSnapshot) -> io::Result<()> {
        self.perf.push(*snapshot);
        Ok(())
    }
}
