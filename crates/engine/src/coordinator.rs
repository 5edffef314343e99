// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! The coordinator loop.
//!
//! Each observed tick runs the fixed pipeline
//! *drain intake → attempt admission → elect & run → account waiting*,
//! then parks in a wait state until the clock advances or new arrivals land.
//! All shared mutable state (intake ring, memory layout, process table) is
//! owned here; worker processes never touch it.
//!
//! Ordering guarantees within one tick:
//! 1. intake is drained before admission,
//! 2. admission (fresh arrivals, then the wait queue) before election,
//! 3. election before worker resume/stop,
//! 4. wait accounting after election, so the elected job is not counted as
//!    waiting in the tick it ran.
//!
//! Each integer tick is observed at most once by the election logic; arrivals
//! landing mid-tick are drained and admitted promptly but only elected on the
//! next tick.

use crate::clock::LogicalClock;
use crate::error::Error;
use crate::pcb::{Pcb, ProcessState};
use crate::policy::{self, Election, Policy};
use crate::table::ProcessTable;
use crate::worker::WorkerSet;
use schedsim_channel::spsc::Consumer;
use schedsim_config::workload::JobSpec;
use schedsim_config::{JobId, SchedulerKind, SimSettings, Tick};
use schedsim_memory::MemoryManager;
use schedsim_telemetry::event::{FinishStats, MemAction, MemEvent, SchedAction, SchedEvent};
use schedsim_telemetry::metrics::RunMetrics;
use schedsim_telemetry::sink::EventSink;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Outcome of a completed (or interrupted) run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The last tick the coordinator processed.
    pub ticks: Tick,
    /// Number of jobs that ran to completion.
    pub finished: u64,
    /// Jobs still parked on the wait queue at exit; on a non-interrupted run
    /// these are exactly the jobs whose footprint exceeds the address space.
    pub unserviceable: Vec<JobId>,
    /// The final performance snapshot.
    pub perf: schedsim_telemetry::PerfSnapshot,
    /// Whether the run was cut short by an interrupt.
    pub interrupted: bool,
}

/// The top-level tick-driven coordinator.
pub struct Coordinator<W: WorkerSet, S: EventSink> {
    clock: Arc<dyn LogicalClock + Send + Sync>,
    intake: Consumer<JobSpec>,
    memory: MemoryManager,
    policy: Box<dyn Policy>,
    table: ProcessTable,
    workers: W,
    sink: S,
    metrics: RunMetrics,
    /// The single job owning the emulated CPU, if any.
    running: Option<JobId>,
    /// Drained this tick, admission not yet attempted.
    pending: VecDeque<JobId>,
    /// Admitted-but-waiting for memory, in arrival order.
    wait_queue: VecDeque<JobId>,
    scratch: Vec<JobSpec>,
    poll: Duration,
    interrupted: Arc<AtomicBool>,
    torn_down: bool,
}

impl<W: WorkerSet, S: EventSink> Coordinator<W, S> {
    /// Assembles a coordinator from its collaborators.
    pub fn new(
        settings: &SimSettings,
        scheduler: SchedulerKind,
        clock: Arc<dyn LogicalClock + Send + Sync>,
        intake: Consumer<JobSpec>,
        memory: MemoryManager,
        workers: W,
        sink: S,
    ) -> Self {
        Self {
            clock,
            intake,
            memory,
            policy: policy::build(scheduler, settings.quantum),
            table: ProcessTable::with_capacity(settings.table_capacity),
            workers,
            sink,
            metrics: RunMetrics::new(),
            running: None,
            pending: VecDeque::new(),
            wait_queue: VecDeque::new(),
            scratch: Vec::new(),
            poll: settings.poll_interval(),
            interrupted: Arc::new(AtomicBool::new(false)),
            torn_down: false,
        }
    }

    /// Flag that cancels the run when set; hand it to a signal watcher.
    #[must_use]
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupted.clone()
    }

    /// Drives the loop until the workload completes, an interrupt lands, or a
    /// fatal error occurs. Teardown runs exactly once on every exit path.
    pub fn run(&mut self) -> Result<RunSummary, Error> {
        let mut last: Option<Tick> = None;
        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                tracing::info!("interrupt received, tearing down");
                self.teardown();
                return Ok(self.summary(last.unwrap_or(0), true));
            }

            let now = self.clock.now();
            if last == Some(now) {
                // Wait state: suspend until the tick advances, waking early
                // to admit fresh arrivals without electing them.
                let deadline = self
                    .clock
                    .next_tick_due()
                    .unwrap_or_else(|| Instant::now() + self.poll);
                if self.intake.wait_arrivals_until(deadline) && self.drain_intake() > 0 {
                    if let Err(e) = self.attempt_admission(now) {
                        self.teardown();
                        return Err(e);
                    }
                }
                continue;
            }
            last = Some(now);

            match self.step(now) {
                Ok(_ran) => {}
                Err(e) => {
                    tracing::error!(error = %e, "fatal error, tearing down");
                    self.teardown();
                    return Err(e);
                }
            }

            if self.is_complete() {
                tracing::info!(tick = now, "workload complete");
                self.teardown();
                return Ok(self.summary(now, false));
            }
        }
    }

    /// Runs one full tick. Returns whether a job consumed the tick.
    pub fn step(&mut self, now: Tick) -> Result<bool, Error> {
        let _ = self.drain_intake();
        self.attempt_admission(now)?;
        let ran = self.elect_and_run(now)?;
        self.account_waiting();
        debug_assert!(self.memory.is_well_formed());
        debug_assert!(self.table.iter_live().all(Pcb::accounting_holds));
        Ok(ran)
    }

    /// True once no job can make further progress: the feeder is done and
    /// everything left on the wait queue can never fit.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.running.is_none()
            && self.pending.is_empty()
            && self.policy.is_empty()
            && self.intake.is_disconnected()
            && self.wait_queue.iter().all(|&id| {
                self.table
                    .get(id)
                    .is_some_and(|pcb| pcb.mem_size > self.memory.total())
            })
    }

    /// The job currently owning the CPU.
    #[must_use]
    pub fn running(&self) -> Option<JobId> {
        self.running
    }

    /// Looks up a live control block.
    #[must_use]
    pub fn pcb(&self, id: JobId) -> Option<&Pcb> {
        self.table.get(id)
    }

    /// The memory-starved jobs, in arrival order.
    #[must_use]
    pub fn wait_queue(&self) -> Vec<JobId> {
        self.wait_queue.iter().copied().collect()
    }

    /// The event sink, for inspection.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The worker set, for inspection.
    #[must_use]
    pub fn workers(&self) -> &W {
        &self.workers
    }

    /// The run metrics accumulated so far.
    #[must_use]
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    fn summary(&self, ticks: Tick, interrupted: bool) -> RunSummary {
        RunSummary {
            ticks,
            finished: self.metrics.finished(),
            unserviceable: self.wait_queue(),
            perf: self.metrics.snapshot(ticks),
            interrupted,
        }
    }

    /// One-shot teardown: every worker is stopped and reaped. Sinks flush per
    /// event, so whatever trace exists is already on disk.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.workers.shutdown();
    }

    /// Copies all pending descriptors out of the ring and registers their
    /// control blocks. A contended intake lock yields to the next poll; no
    /// data is lost because the producer blocks on full.
    fn drain_intake(&mut self) -> usize {
        self.scratch.clear();
        let Some(count) = self.intake.try_drain_into(&mut self.scratch) else {
            tracing::trace!("intake lock contended, retrying next poll");
            return 0;
        };
        for spec in self.scratch.drain(..) {
            tracing::debug!(job = spec.id, "drained from intake");
            self.table.insert(Pcb::new(&spec));
            self.pending.push_back(spec.id);
        }
        count
    }

    /// Tries to admit fresh arrivals in arrival order, then retries the wait
    /// queue head to tail. Jobs that still do not fit keep their place.
    fn attempt_admission(&mut self, now: Tick) -> Result<(), Error> {
        while let Some(id) = self.pending.pop_front() {
            if !self.try_admit(id, now)? {
                self.wait_queue.push_back(id);
            }
        }
        for _ in 0..self.wait_queue.len() {
            let id = self.wait_queue.pop_front().expect("length checked");
            if !self.try_admit(id, now)? {
                self.wait_queue.push_back(id);
            }
        }
        Ok(())
    }

    fn try_admit(&mut self, id: JobId, now: Tick) -> Result<bool, Error> {
        let (mem_size, runtime) = {
            let pcb = self.table.get(id).expect("drained job is live");
            (pcb.mem_size, pcb.runtime)
        };
        let Some(span) = self.memory.allocate(mem_size, id) else {
            tracing::trace!(job = id, mem_size, "no block fits, job waits");
            return Ok(false);
        };
        self.emit_memory(MemEvent {
            tick: now,
            action: MemAction::Allocated,
            bytes: span.size,
            job: id,
            from: span.start,
            to: span.last(),
        })?;
        self.workers.spawn(id, runtime)?;
        if let Some(pcb) = self.table.get_mut(id) {
            pcb.region = Some(span);
        }
        self.policy.admit(id, &self.table);
        tracing::debug!(job = id, offset = span.start, "admitted");
        Ok(true)
    }

    fn elect_and_run(&mut self, now: Tick) -> Result<bool, Error> {
        if let Some(id) = self.running {
            let remaining = self.table.get(id).expect("running job is live").remaining;
            if remaining == 0 {
                self.finish_running(id, now)?;
            }
        }

        match self.policy.elect(self.running, &self.table) {
            Election::Idle => return Ok(false),
            Election::Keep => {}
            Election::Switch(next) => {
                if let Some(prev) = self.running.take() {
                    self.workers.suspend(prev)?;
                    self.table
                        .get_mut(prev)
                        .expect("running job is live")
                        .state = ProcessState::Waiting;
                    self.emit_transition(now, prev, SchedAction::Stopped)?;
                    self.policy.requeue(prev, &self.table);
                }
                let action = {
                    let pcb = self.table.get_mut(next).expect("elected job is live");
                    pcb.state = ProcessState::Running;
                    if pcb.start_time.is_none() {
                        pcb.start_time = Some(now);
                        SchedAction::Started
                    } else {
                        SchedAction::Resumed
                    }
                };
                self.workers.resume(next)?;
                self.emit_transition(now, next, action)?;
                self.running = Some(next);
            }
        }

        match self.running {
            Some(id) => {
                let pcb = self.table.get_mut(id).expect("running job is live");
                pcb.remaining -= 1;
                pcb.executed += 1;
                self.metrics.record_busy_tick();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn finish_running(&mut self, id: JobId, now: Tick) -> Result<(), Error> {
        self.policy.on_finish(id);

        let region = self.table.get(id).expect("running job is live").region;
        if let Some(region) = region {
            match self.memory.free(region.start, id) {
                Ok(span) => self.emit_memory(MemEvent {
                    tick: now,
                    action: MemAction::Freed,
                    bytes: span.size,
                    job: id,
                    from: span.start,
                    to: span.last(),
                })?,
                Err(error) => {
                    debug_assert!(false, "region bookkeeping broke: {error}");
                    tracing::error!(job = id, %error, "could not release region");
                }
            }
        }

        self.workers.reap(id)?;

        let (event, waiting, weighted) = {
            let pcb = self.table.get_mut(id).expect("running job is live");
            pcb.state = ProcessState::Finished;
            let turnaround = pcb.turnaround(now);
            let weighted = pcb.weighted_turnaround(now);
            (
                SchedEvent {
                    tick: now,
                    job: id,
                    action: SchedAction::Finished,
                    arrival: pcb.arrival,
                    total: pcb.runtime,
                    remaining: 0,
                    waiting: pcb.waiting,
                    finish: Some(FinishStats {
                        turnaround,
                        weighted,
                    }),
                },
                pcb.waiting,
                weighted,
            )
        };
        self.metrics.record_finish(waiting, weighted);
        self.emit_sched(event)?;
        let snapshot = self.metrics.snapshot(now);
        self.sink.perf(&snapshot).map_err(|error| Error::Trace {
            context: "scheduler.perf",
            error,
        })?;

        let _ = self.table.release(id);
        self.running = None;
        tracing::info!(job = id, tick = now, "finished");
        Ok(())
    }

    /// Every admitted-but-not-running job ages by one tick: the ready
    /// structure's members plus the memory wait queue.
    fn account_waiting(&mut self) {
        for id in self.policy.ready_ids() {
            if let Some(pcb) = self.table.get_mut(id) {
                pcb.waiting += 1;
            }
        }
        for index in 0..self.wait_queue.len() {
            let id = self.wait_queue[index];
            if let Some(pcb) = self.table.get_mut(id) {
                pcb.waiting += 1;
            }
        }
    }

    fn emit_transition(&mut self, now: Tick, id: JobId, action: SchedAction) -> Result<(), Error> {
        let pcb = self.table.get(id).expect("job is live");
        let event = SchedEvent {
            tick: now,
            job: id,
            action,
            arrival: pcb.arrival,
            total: pcb.runtime,
            remaining: pcb.remaining,
            waiting: pcb.waiting,
            finish: None,
        };
        self.emit_sched(event)
    }

    fn emit_sched(&mut self, event: SchedEvent) -> Result<(), Error> {
        self.sink.scheduler(&event).map_err(|error| Error::Trace {
            context: "scheduler.log",
            error,
        })
    }

    fn emit_memory(&mut self, event: MemEvent) -> Result<(), Error> {
        self.sink.memory(&event).map_err(|error| Error::Trace {
            context: "memory.log",
            error,
        })
    }
}
