// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scheduling scenarios driven tick by tick on a manual clock,
//! with in-process workers and collecting sinks.

use pretty_assertions::assert_eq;
use schedsim_channel::spsc::{self, Producer};
use schedsim_config::workload::JobSpec;
use schedsim_config::{JobId, MemoryKind, SchedulerKind, SimSettings, Tick};
use schedsim_engine::Coordinator;
use schedsim_engine::testing::{ManualClock, SimWorkerSet, WorkerTransition};
use schedsim_memory::MemoryManager;
use schedsim_telemetry::event::{MemAction, SchedAction, SchedEvent};
use schedsim_telemetry::testing::CollectingSink;
use std::sync::Arc;

/// Tick-stepped simulation harness: releases jobs into the intake at their
/// arrival ticks and closes the ring after the last one.
struct Sim {
    coordinator: Coordinator<SimWorkerSet, CollectingSink>,
    producer: Option<Producer<JobSpec>>,
    jobs: Vec<JobSpec>,
    next_job: usize,
}

impl Sim {
    fn new(
        scheduler: SchedulerKind,
        memory_kind: MemoryKind,
        memory_size: u64,
        quantum: u64,
        mut jobs: Vec<JobSpec>,
    ) -> Self {
        jobs.sort_by_key(|job| job.arrival);
        let settings = SimSettings {
            memory_size,
            quantum,
            ..SimSettings::default()
        };
        let (producer, consumer) = spsc::channel(settings.intake_capacity);
        let memory = MemoryManager::new(memory_kind, memory_size).expect("memory manager");
        let coordinator = Coordinator::new(
            &settings,
            scheduler,
            Arc::new(ManualClock::new()),
            consumer,
            memory,
            SimWorkerSet::new(),
            CollectingSink::new(),
        );
        Self {
            coordinator,
            producer: Some(producer),
            jobs,
            next_job: 0,
        }
    }

    fn tick(&mut self, now: Tick) -> bool {
        let mut exhausted = false;
        if let Some(producer) = &self.producer {
            while self.next_job < self.jobs.len() && self.jobs[self.next_job].arrival <= now {
                producer
                    .try_send(self.jobs[self.next_job])
                    .expect("intake has room");
                self.next_job += 1;
            }
            exhausted = self.next_job == self.jobs.len();
        }
        if exhausted {
            // Dropping the producer closes the ring, as the feeder would.
            self.producer = None;
        }
        self.coordinator.step(now).expect("tick succeeds")
    }

    /// Runs until the coordinator reports completion, returning the last
    /// processed tick.
    fn run_to_completion(&mut self, limit: Tick) -> Tick {
        for now in 0..limit {
            let _ = self.tick(now);
            if self.coordinator.is_complete() {
                return now;
            }
        }
        panic!("workload did not complete within {limit} ticks");
    }

    fn events(&self) -> &[SchedEvent] {
        &self.coordinator.sink().scheduler
    }

    fn finish_tick(&self, job: JobId) -> Tick {
        self.events()
            .iter()
            .find(|e| e.job == job && e.action == SchedAction::Finished)
            .unwrap_or_else(|| panic!("job {job} never finished"))
            .tick
    }

    fn transitions(&self, job: JobId) -> Vec<(Tick, SchedAction)> {
        self.events()
            .iter()
            .filter(|e| e.job == job)
            .map(|e| (e.tick, e.action))
            .collect()
    }

    fn allocations(&self, job: JobId) -> Vec<(Tick, MemAction, u64, u64)> {
        self.coordinator
            .sink()
            .memory
            .iter()
            .filter(|e| e.job == job)
            .map(|e| (e.tick, e.action, e.from, e.bytes))
            .collect()
    }
}

fn job(id: JobId, arrival: Tick, runtime: u64, priority: i64, mem_size: u64) -> JobSpec {
    JobSpec {
        id,
        arrival,
        runtime,
        priority,
        mem_size,
    }
}

/// Replays the scheduler trace: every resume/stop window must add up to the
/// job's full runtime, and total executed time cannot exceed wall time.
fn assert_trace_replays(sim: &Sim, jobs: &[JobSpec], last_tick: Tick) {
    let mut total_executed = 0;
    for spec in jobs {
        let transitions = sim.transitions(spec.id);
        let mut executed = 0;
        let mut running_since = None;
        for &(tick, action) in &transitions {
            match action {
                SchedAction::Started | SchedAction::Resumed => {
                    assert!(running_since.is_none(), "job {} resumed twice", spec.id);
                    running_since = Some(tick);
                }
                SchedAction::Stopped | SchedAction::Finished => {
                    let since = running_since
                        .take()
                        .unwrap_or_else(|| panic!("job {} stopped while idle", spec.id));
                    executed += tick - since;
                }
            }
        }
        assert_eq!(
            executed, spec.runtime,
            "replayed executed time for job {}",
            spec.id
        );
        total_executed += executed;
    }
    assert!(total_executed <= last_tick, "CPU time exceeded wall time");
}

#[test]
fn fcfs_first_fit_runs_in_arrival_order() {
    let jobs = vec![
        job(1, 0, 3, 5, 40),
        job(2, 1, 2, 1, 40),
        job(3, 2, 1, 9, 40),
    ];
    let mut sim = Sim::new(SchedulerKind::Fcfs, MemoryKind::FirstFit, 100, 2, jobs.clone());
    let last = sim.run_to_completion(64);

    assert_eq!(sim.finish_tick(1), 3);
    assert_eq!(sim.finish_tick(2), 5);
    assert_eq!(sim.finish_tick(3), 6);

    // Offsets 0 and 40; job 3 reuses offset 0 once job 1 frees it.
    assert_eq!(sim.allocations(1)[0], (0, MemAction::Allocated, 0, 40));
    assert_eq!(sim.allocations(2)[0], (1, MemAction::Allocated, 40, 40));
    assert_eq!(sim.allocations(3)[0], (4, MemAction::Allocated, 0, 40));

    let perf = sim.coordinator.sink().perf.last().expect("perf written");
    assert!((perf.avg_wta - 7.0 / 3.0).abs() < 0.01);
    assert!((perf.cpu_utilization - 100.0).abs() < 0.01);

    assert_trace_replays(&sim, &jobs, last);
}

#[test]
fn hpf_preempts_for_higher_priority() {
    let jobs = vec![
        job(1, 0, 5, 1, 10),
        job(2, 1, 2, 9, 10),
        job(3, 2, 2, 5, 10),
    ];
    let mut sim = Sim::new(SchedulerKind::Hpf, MemoryKind::FirstFit, 1024, 2, jobs.clone());
    let last = sim.run_to_completion(64);

    // Job 2 takes the CPU the tick it arrives.
    assert_eq!(
        sim.transitions(1)[..2],
        [(0, SchedAction::Started), (1, SchedAction::Stopped)]
    );
    assert_eq!(sim.transitions(2)[0], (1, SchedAction::Started));

    assert_eq!(sim.finish_tick(2), 3);
    // Priority 5 beats the preempted priority-1 job.
    assert_eq!(sim.transitions(3)[0], (3, SchedAction::Started));
    assert_eq!(sim.finish_tick(3), 5);

    // Job 1 gets the CPU back for its remaining four ticks.
    assert_eq!(sim.transitions(1)[2], (5, SchedAction::Resumed));
    assert_eq!(sim.finish_tick(1), 9);

    assert_trace_replays(&sim, &jobs, last);
}

#[test]
fn srtn_best_fit_preempts_on_shorter_remaining() {
    let jobs = vec![job(1, 0, 6, 0, 30), job(2, 2, 2, 0, 30)];
    let mut sim = Sim::new(SchedulerKind::Srtn, MemoryKind::BestFit, 100, 2, jobs.clone());
    let last = sim.run_to_completion(64);

    // remaining(1) = 4 vs remaining(2) = 2 at tick 2.
    assert_eq!(
        sim.transitions(1)[..2],
        [(0, SchedAction::Started), (2, SchedAction::Stopped)]
    );
    assert_eq!(sim.transitions(2)[0], (2, SchedAction::Started));
    assert_eq!(sim.finish_tick(2), 4);
    assert_eq!(sim.transitions(1)[2], (4, SchedAction::Resumed));
    assert_eq!(sim.finish_tick(1), 8);

    assert_trace_replays(&sim, &jobs, last);
}

#[test]
fn round_robin_next_fit_rotates_on_the_quantum() {
    let jobs = vec![
        job(1, 0, 4, 0, 20),
        job(2, 1, 3, 0, 20),
        job(3, 2, 1, 0, 20),
    ];
    let mut sim = Sim::new(
        SchedulerKind::RoundRobin,
        MemoryKind::NextFit,
        100,
        2,
        jobs.clone(),
    );
    let last = sim.run_to_completion(64);

    // Next-fit walks forward: 0, 20, 40.
    assert_eq!(sim.allocations(1)[0], (0, MemAction::Allocated, 0, 20));
    assert_eq!(sim.allocations(2)[0], (1, MemAction::Allocated, 20, 20));
    assert_eq!(sim.allocations(3)[0], (2, MemAction::Allocated, 40, 20));

    // Schedule: 1 for a quantum, 2 for a quantum, 3 to completion, then the
    // leftovers of 1 and 2.
    assert_eq!(
        sim.transitions(1),
        vec![
            (0, SchedAction::Started),
            (2, SchedAction::Stopped),
            (5, SchedAction::Resumed),
            (7, SchedAction::Finished),
        ]
    );
    assert_eq!(
        sim.transitions(2),
        vec![
            (2, SchedAction::Started),
            (4, SchedAction::Stopped),
            (7, SchedAction::Resumed),
            (8, SchedAction::Finished),
        ]
    );
    assert_eq!(sim.transitions(3)[0], (4, SchedAction::Started));
    assert_eq!(sim.finish_tick(3), 5);

    assert_trace_replays(&sim, &jobs, last);
}

#[test]
fn buddy_rounds_up_and_restores_the_tree() {
    let jobs = vec![job(1, 0, 2, 0, 100)];
    let mut sim = Sim::new(SchedulerKind::Fcfs, MemoryKind::Buddy, 1024, 2, jobs);
    let _ = sim.run_to_completion(16);

    // 100 bytes round up to an order-7 block at offset zero; the free
    // releases the whole rounded block.
    assert_eq!(
        sim.allocations(1),
        vec![
            (0, MemAction::Allocated, 0, 128),
            (2, MemAction::Freed, 0, 128),
        ]
    );
}

#[test]
fn memory_wait_queue_admits_in_arrival_order() {
    let jobs = vec![
        job(1, 0, 5, 0, 40),
        job(2, 0, 5, 0, 40),
        job(3, 0, 5, 0, 10),
    ];
    let mut sim = Sim::new(SchedulerKind::Fcfs, MemoryKind::FirstFit, 50, 2, jobs.clone());

    // Tick 0: 1 and 3 fit; 2 parks on the wait queue.
    let _ = sim.tick(0);
    assert_eq!(sim.allocations(1)[0], (0, MemAction::Allocated, 0, 40));
    assert_eq!(sim.allocations(3)[0], (0, MemAction::Allocated, 40, 10));
    assert_eq!(sim.coordinator.wait_queue(), vec![2]);

    let mut now = 1;
    while !sim.coordinator.is_complete() {
        let _ = sim.tick(now);
        now += 1;
        assert!(now < 64, "did not complete");
    }
    let last = now - 1;

    // Job 1 frees at tick 5; 2 is admitted on the next tick's retry.
    assert_eq!(sim.finish_tick(1), 5);
    assert_eq!(sim.allocations(2)[0], (6, MemAction::Allocated, 0, 40));

    // Both the CPU-starved and the memory-starved job aged while waiting.
    let waiting_3 = sim
        .events()
        .iter()
        .find(|e| e.job == 3 && e.action == SchedAction::Started)
        .expect("job 3 started")
        .waiting;
    assert_eq!(waiting_3, 5);
    let waiting_2 = sim
        .events()
        .iter()
        .find(|e| e.job == 2 && e.action == SchedAction::Started)
        .expect("job 2 started")
        .waiting;
    assert_eq!(waiting_2, 10);

    assert_eq!(sim.finish_tick(3), 10);
    assert_eq!(sim.finish_tick(2), 15);

    assert_trace_replays(&sim, &jobs, last);
}

#[test]
fn workers_follow_the_policy_decisions() {
    let jobs = vec![job(1, 0, 3, 1, 10), job(2, 1, 1, 9, 10)];
    let mut sim = Sim::new(SchedulerKind::Hpf, MemoryKind::FirstFit, 100, 2, jobs);
    let _ = sim.run_to_completion(16);

    let workers = sim.coordinator.workers();
    assert_eq!(
        workers.transitions_for(1),
        vec![
            WorkerTransition::Spawned,
            WorkerTransition::Resumed,
            WorkerTransition::Suspended,
            WorkerTransition::Resumed,
            WorkerTransition::Reaped,
        ]
    );
    assert_eq!(
        workers.transitions_for(2),
        vec![
            WorkerTransition::Spawned,
            WorkerTransition::Resumed,
            WorkerTransition::Reaped,
        ]
    );
    assert_eq!(workers.live(), 0);
}

#[test]
fn accounting_invariants_hold_every_tick() {
    let jobs = vec![
        job(1, 0, 4, 2, 30),
        job(2, 1, 3, 8, 30),
        job(3, 1, 2, 5, 30),
        job(4, 3, 1, 9, 30),
    ];
    let ids: Vec<JobId> = jobs.iter().map(|j| j.id).collect();
    let mut sim = Sim::new(SchedulerKind::Hpf, MemoryKind::BestFit, 70, 2, jobs);

    let mut now = 0;
    while !sim.coordinator.is_complete() {
        let _ = sim.tick(now);
        let mut running = 0;
        for &id in &ids {
            if let Some(pcb) = sim.coordinator.pcb(id) {
                assert!(pcb.accounting_holds(), "accounting broke for job {id}");
                if pcb.state == schedsim_engine::pcb::ProcessState::Running {
                    running += 1;
                }
            }
        }
        assert!(running <= 1, "more than one running job at tick {now}");
        now += 1;
        assert!(now < 64, "did not complete");
    }
}
