// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Worker process control.
//!
//! Each admitted job is backed by a detached worker process whose only duty
//! is to burn its runtime, one tick at a time, while resumed. The controller
//! owns spawn, suspend, resume, and reap; the scheduling core talks to it
//! through the [`WorkerSet`] trait so tests can substitute an in-process
//! double that advances deterministic virtual ticks.
//!
//! The spawn handshake: the worker prints a single readiness line on stdout
//! and then stops itself, so the controller's suspension can never interrupt
//! worker initialization. Reaping resumes a stopped worker and waits for its
//! genuine exit, which keeps teardown from racing the final tick.

use crate::error::Error;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use schedsim_config::JobId;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Control surface over the per-job worker processes.
pub trait WorkerSet {
    /// Launches a worker for `job`, waits for its readiness handshake, and
    /// leaves it suspended.
    fn spawn(&mut self, job: JobId, runtime: u64) -> Result<(), Error>;

    /// Delivers the resume signal to `job`'s worker.
    fn resume(&mut self, job: JobId) -> Result<(), Error>;

    /// Delivers the stop signal to `job`'s worker.
    fn suspend(&mut self, job: JobId) -> Result<(), Error>;

    /// Lets a finished worker run out and reaps it.
    fn reap(&mut self, job: JobId) -> Result<(), Error>;

    /// Terminates and reaps every remaining worker. Idempotent; used by
    /// teardown.
    fn shutdown(&mut self);
}

/// Production controller driving real OS processes with SIGSTOP/SIGCONT.
pub struct OsWorkerSet {
    program: PathBuf,
    tick: Duration,
    children: HashMap<JobId, Child>,
}

impl OsWorkerSet {
    /// Creates a controller that spawns `program` with the given tick length.
    #[must_use]
    pub fn new(program: PathBuf, tick: Duration) -> Self {
        Self {
            program,
            tick,
            children: HashMap::new(),
        }
    }

    fn pid(child: &Child) -> Pid {
        Pid::from_raw(child.id() as i32)
    }

    /// Sends `signal`, treating an already-exited worker as success: a worker
    /// whose sleep expired during a suspension can run out a tick early, and
    /// any real loss is still surfaced by the reap that follows.
    fn signal(child: &Child, signal: Signal, job: JobId) -> Result<(), Error> {
        match kill(Self::pid(child), signal) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(Error::WorkerLost {
                job,
                details: format!("could not deliver {signal}: {errno}"),
            }),
        }
    }

    fn tracked(&mut self, job: JobId) -> Result<&Child, Error> {
        self.children.get(&job).ok_or_else(|| Error::WorkerLost {
            job,
            details: "no tracked worker process".to_owned(),
        })
    }
}

impl WorkerSet for OsWorkerSet {
    fn spawn(&mut self, job: JobId, runtime: u64) -> Result<(), Error> {
        let mut child = Command::new(&self.program)
            .arg(runtime.to_string())
            .arg("--tick-ms")
            .arg(self.tick.as_millis().to_string())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| Error::WorkerLost {
                job,
                details: format!("could not spawn `{}`: {e}", self.program.display()),
            })?;

        // Readiness handshake: one line, then the worker stops itself.
        let stdout = child.stdout.take().ok_or_else(|| Error::WorkerLost {
            job,
            details: "worker stdout was not captured".to_owned(),
        })?;
        let mut line = String::new();
        let read = BufReader::new(stdout).read_line(&mut line);
        match read {
            Ok(n) if n > 0 => {}
            Ok(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::WorkerLost {
                    job,
                    details: "worker exited before signaling readiness".to_owned(),
                });
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::WorkerLost {
                    job,
                    details: format!("could not read readiness handshake: {e}"),
                });
            }
        }

        // The worker raises SIGSTOP on its own; this covers workers that do
        // not.
        Self::signal(&child, Signal::SIGSTOP, job)?;
        tracing::debug!(job, pid = child.id(), "worker spawned and suspended");
        let _ = self.children.insert(job, child);
        Ok(())
    }

    fn resume(&mut self, job: JobId) -> Result<(), Error> {
        let child = self.tracked(job)?;
        Self::signal(child, Signal::SIGCONT, job)
    }

    fn suspend(&mut self, job: JobId) -> Result<(), Error> {
        let child = self.tracked(job)?;
        Self::signal(child, Signal::SIGSTOP, job)
    }

    fn reap(&mut self, job: JobId) -> Result<(), Error> {
        let mut child = self.children.remove(&job).ok_or_else(|| Error::WorkerLost {
            job,
            details: "no tracked worker process".to_owned(),
        })?;
        // A preempted worker sits stopped in the middle of its last tick; let
        // it run out before waiting for the exit handshake.
        Self::signal(&child, Signal::SIGCONT, job)?;
        let status = child.wait().map_err(|e| Error::WorkerLost {
            job,
            details: format!("could not reap worker: {e}"),
        })?;
        if !status.success() {
            tracing::warn!(job, %status, "worker exited abnormally");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        for (job, mut child) in self.children.drain() {
            tracing::debug!(job, pid = child.id(), "killing worker during teardown");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for OsWorkerSet {
    fn drop(&mut self) {
        // No worker may outlive its controller.
        self.shutdown();
    }
}
