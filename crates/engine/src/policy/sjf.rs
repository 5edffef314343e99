// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Shortest job first, non-preemptive.

use super::queues::ScoredQueue;
use super::{Election, Policy};
use crate::table::ProcessTable;
use schedsim_config::{JobId, SchedulerKind};

/// Priority list keyed by negated total runtime: shortest first. Once a job
/// owns the CPU it keeps it; a shorter arrival waits.
pub(super) struct Sjf {
    ready: ScoredQueue,
}

impl Sjf {
    pub(super) fn new() -> Self {
        Self {
            ready: ScoredQueue::new(),
        }
    }

    fn score(table: &ProcessTable, id: JobId) -> i64 {
        let pcb = table.get(id).expect("admitted job is live");
        -(pcb.runtime as i64)
    }
}

impl Policy for Sjf {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Sjf
    }

    fn admit(&mut self, id: JobId, table: &ProcessTable) {
        self.ready.push(id, Self::score(table, id));
    }

    fn elect(&mut self, running: Option<JobId>, _table: &ProcessTable) -> Election {
        if running.is_some() {
            return Election::Keep;
        }
        match self.ready.pop() {
            Some(id) => Election::Switch(id),
            None => Election::Idle,
        }
    }

    fn requeue(&mut self, id: JobId, table: &ProcessTable) {
        debug_assert!(false, "SJF never preempts");
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

#[cfg(test)]
mod tests {
    use super::super::test_support::table;
    use super::*;

    #[test]
    fn shortest_runtime_wins_and_running_is_kept() {
        let table = table(&[(1, 6, 0), (2, 2, 0), (3, 4, 0)]);
        let mut policy = Sjf::new();
        policy.admit(1, &table);
        policy.admit(2, &table);
        policy.admit(3, &table);

        assert_eq!(policy.elect(None, &table), Election::Switch(2));
        assert_eq!(policy.elect(Some(2), &table), Election::Keep);
        assert_eq!(policy.elect(None, &table), Election::Switch(3));
        assert_eq!(policy.elect(None, &table), Election::Switch(1));
    }

    #[test]
    fn equal_runtimes_run_in_admission_order() {
        let table = table(&[(4, 3, 0), (5, 3, 0)]);
        let mut policy = Sjf::new();
        policy.admit(5, &table);
        policy.admit(4, &table);
        assert_eq!(policy.elect(None, &table), Election::Switch(5));
    }
}
