// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Event sinks.
//!
//! The production sink keeps all three output files open for the lifetime of
//! the run and flushes after every event, so a crash loses at most the line
//! being written.

use crate::event::{MemEvent, SchedEvent};
use crate::metrics::PerfSnapshot;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

/// Destination for coordinator trace events.
pub trait EventSink {
    /// Records one scheduler state transition.
    fn scheduler(&mut self, event: &SchedEvent) -> io::Result<()>;

    /// Records one memory allocation or release.
    fn memory(&mut self, event: &MemEvent) -> io::Result<()>;

    /// Replaces the performance report with a fresh snapshot.
    fn perf(&mut self, snapshot: &PerfSnapshot) -> io::Result<()>;
}

/// File-backed sink writing `scheduler.log`, `memory.log`, `scheduler.perf`.
pub struct FileSinks {
    scheduler: File,
    memory: File,
    perf: File,
}

impl FileSinks {
    /// Creates the three output files inside `dir`, truncating leftovers from
    /// a previous run, and writes the scheduler trace header.
    pub fn create(dir: &Path) -> io::Result<Self> {
        let mut scheduler = Self::open(dir, "scheduler.log")?;
        writeln!(
            scheduler,
            "#At time t process id state arr a total r remain x wait w"
        )?;
        scheduler.flush()?;
        Ok(Self {
            scheduler,
            memory: Self::open(dir, "memory.log")?,
            perf: Self::open(dir, "scheduler.perf")?,
        })
    }

    fn open(dir: &Path, name: &str) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(dir.join(name))
    }
}

impl EventSink for FileSinks {
    fn scheduler(&mut self, event: &SchedEvent) -> io::Result<()> {
        writeln!(self.scheduler, "{event}")?;
        self.scheduler.flush()
    }

    fn memory(&mut self, event: &MemEvent) -> io::Result<()> {
        writeln!(self.memory, "{event}")?;
        self.memory.flush()
    }

    fn perf(&mut self, snapshot: &PerfSnapshot) -> io::Result<()> {
        self.perf.set_len(0)?;
        let _ = self.perf.seek(SeekFrom::Start(0))?;
        write!(self.perf, "{snapshot}")?;
        self.perf.flush()
    }
}
