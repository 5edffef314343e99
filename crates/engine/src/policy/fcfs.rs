// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! First come, first served.

use super::{Election, Policy};
use crate::table::ProcessTable;
use schedsim_config::{JobId, SchedulerKind};
use std::collections::VecDeque;

/// FIFO of admitted jobs; the head runs to completion.
pub(super) struct Fcfs {
    queue: VecDeque<JobId>,
}

impl Fcfs {
    pub(super) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl Policy for Fcfs {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Fcfs
    }

    fn admit(&mut self, id: JobId, _table: &ProcessTable) {
        self.queue.push_back(id);
    }

    fn elect(&mut self, running: Option<JobId>, _table: &ProcessTable) -> Election {
        if running.is_some() {
            return Election::Keep;
        }
        match self.queue.pop_front() {
            Some(id) => Election::Switch(id),
            None => Election::Idle,
        }
    }

    fn requeue(&mut self, id: JobId, _table: &ProcessTable) {
        debug_assert!(false, "FCFS never preempts");
        self.queue.push_front(id);
    }

    fn on_finish(&mut self, _id: JobId) {}

    fn ready_ids(&self) -> Vec<JobId> {
        self.queue.iter().copied().collect()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::table;
    use super::*;

    #[test]
    fn runs_in_arrival_order_without_preemption() {
        let table = table(&[(1, 3, 0), (2, 1, 0), (3, 2, 0)]);
        let mut policy = Fcfs::new();
        policy.admit(1, &table);
        policy.admit(2, &table);
        policy.admit(3, &table);

        assert_eq!(policy.elect(None, &table), Election::Switch(1));
        // Shorter or later jobs never displace the head.
        assert_eq!(policy.elect(Some(1), &table), Election::Keep);
        assert_eq!(policy.ready_ids().len(), 2);

        assert_eq!(policy.elect(None, &table), Election::Switch(2));
        assert_eq!(policy.elect(None, &table), Election::Switch(3));
        assert_eq!(policy.elect(None, &table), Election::Idle);
    }
}
