// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Round robin with a fixed quantum.

use super::{Election, Policy};
use crate::table::ProcessTable;
use schedsim_config::{JobId, SchedulerKind};
use std::collections::VecDeque;

/// Circular ready list plus a quantum counter.
///
/// The counter advances once per ran tick; the cursor moves only on quantum
/// boundaries, where the coordinator requeues the preempted job at the tail.
/// Termination of the running job resets the counter, so its successor gets a
/// full quantum.
pub(super) struct RoundRobin {
    queue: VecDeque<JobId>,
    quantum: u64,
    used: u64,
}

impl RoundRobin {
    pub(super) fn new(quantum: u64) -> Self {
        debug_assert!(quantum > 0);
        Self {
            queue: VecDeque::new(),
            quantum,
            used: 0,
        }
    }
}

impl Policy for RoundRobin {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::RoundRobin
    }

    fn admit(&mut self, id: JobId, _table: &ProcessTable) {
        self.queue.push_back(id);
    }

    fn elect(&mut self, running: Option<JobId>, _table: &ProcessTable) -> Election {
        let election = if self.used == 0 {
            // Quantum boundary: move on if anyone else is ready.
            match (running, self.queue.pop_front()) {
                (_, Some(next)) => Election::Switch(next),
                (Some(_), None) => Election::Keep,
                (None, None) => Election::Idle,
            }
        } else {
            match running {
                Some(_) => Election::Keep,
                None => match self.queue.pop_front() {
                    Some(next) => Election::Switch(next),
                    None => Election::Idle,
                },
            }
        };
        if election != Election::Idle {
            self.used = (self.used + 1) % self.quantum;
        }
        election
    }

    fn requeue(&mut self, id: JobId, _table: &ProcessTable) {
        self.queue.push_back(id);
    }

    fn on_finish(&mut self, _id: JobId) {
        self.used = 0;
    }

    fn ready_ids(&self) -> Vec<JobId> {
        self.queue.iter().copied().collect()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
