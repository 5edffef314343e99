// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Shortest remaining time next, preemptive.

use super::queues::ScoredQueue;
use super::{Election, Policy};
use crate::table::ProcessTable;
use schedsim_config::{JobId, SchedulerKind};

/// Priority list keyed by negated remaining time.
///
/// Only the running job's remaining time ever changes, and the running job is
/// not a member of the list, so queued keys stay accurate; the key refresh
/// mandated for the running job happens when a preemption re-inserts it.
pub(super) struct Srtn {
    ready: ScoredQueue,
}

impl Srtn {
    pub(super) fn new() -> Self {
        Self {
            ready: ScoredQueue::new(),
        }
    }

    fn score(table: &ProcessTable, id: JobId) -> i64 {
        let pcb = table.get(id).expect("admitted job is live");
        -(pcb.remaining as i64)
    }
}

impl Policy for Srtn {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Srtn
    }

    fn admit(&mut self, id: JobId, table: &ProcessTable) {
        self.ready.push(id, Self::score(table, id));
    }

    fn elect(&mut self, running: Option<JobId>, table: &ProcessTable) -> Election {
        match running {
            None => match self.ready.pop() {
                Some(id) => Election::Switch(id),
                None => Election::Idle,
            },
            Some(current) => match self.ready.peek() {
                // Strictly shorter remaining time wins; a tie keeps the
                // earlier (running) job.
                Some((_, score)) if score > Self::score(table, current) => {
                    let id = self.ready.pop().expect("peeked entry exists");
                    Election::Switch(id)
                }
                _ => Election::Keep,
            },
        }
    }

    fn requeue(&mut self, id: JobId, table: &ProcessTable) {
        self.ready.push(id, Self::score(table, id));
    }

    fn on_finish(&mut self, _id: JobId) {}

    fn ready_ids(&self) -> Vec<JobId> {
        self.ready.ids()
    }

    fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }
}
