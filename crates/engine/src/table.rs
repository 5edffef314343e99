// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! The process table: a dense map from job id to control block.
//!
//! Capacity grows by doubling whenever an arriving id falls out of bounds and
//! never shrinks; ids are stable and small. Slots of finished jobs are
//! released on finish, and looking one up afterwards yields `None`.

use crate::pcb::Pcb;
use schedsim_config::JobId;

/// Dense id-indexed table of live control blocks.
pub struct ProcessTable {
    slots: Vec<Option<Pcb>>,
    live: usize,
}

impl ProcessTable {
    /// Creates a table with the given initial capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "process table capacity must be positive");
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        Self { slots, live: 0 }
    }

    /// Inserts a block, growing the table by doubling if its id is out of
    /// bounds. Replacing a live entry is a caller bug.
    pub fn insert(&mut self, pcb: Pcb) {
        let index = pcb.id as usize;
        if index >= self.slots.len() {
            let mut capacity = self.slots.len() * 2;
            while index >= capacity {
                capacity *= 2;
            }
            self.slots.resize_with(capacity, || None);
        }
        debug_assert!(self.slots[index].is_none(), "job id {} already live", pcb.id);
        self.slots[index] = Some(pcb);
        self.live += 1;
    }

    /// Looks up a live block.
    #[must_use]
    pub fn get(&self, id: JobId) -> Option<&Pcb> {
        self.slots.get(id as usize).and_then(|slot| slot.as_ref())
    }

    /// Looks up a live block mutably.
    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Pcb> {
        self.slots.get_mut(id as usize).and_then(|slot| slot.as_mut())
    }

    /// Removes and returns a finished job's block.
    pub fn release(&mut self, id: JobId) -> Option<Pcb> {
        let released = self.slots.get_mut(id as usize).and_then(Option::take);
        if released.is_some() {
            self.live -= 1;
        }
        released
    }

    /// Number of live blocks.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Current slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over live blocks in id order.
    pub fn iter_live(&self) -> impl Iterator<Item = &Pcb> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }
}
