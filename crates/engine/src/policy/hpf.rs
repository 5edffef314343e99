// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Highest priority first, preemptive.

use super::queues::ScoredQueue;
use super::{Election, Policy};
use crate::table::ProcessTable;
use schedsim_config::{JobId, SchedulerKind};

/// Priority list keyed by job priority. Re-elected every tick: a strictly
/// higher-priority arrival takes the CPU immediately, and an equal priority
/// leaves the earlier job running.
pub(super) struct Hpf {
    ready: ScoredQueue,
}

impl Hpf {
    pub(super) fn new() -> Self {
        Self {
            ready: ScoredQueue::new(),
        }
    }

    fn score(table: &ProcessTable, id: JobId) -> i64 {
        table.get(id).expect("admitted job is live").priority
    }
}

impl Policy for Hpf {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Hpf
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
