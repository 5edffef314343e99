// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Power-of-two buddy allocation.
//!
//! Every allocation is rounded up to the next power of two and aligned to its
//! own size, so a block's buddy is always found by flipping the single order
//! bit (`offset ^ size`). Free blocks are kept per order in ordered sets,
//! which makes splits deterministic: the lowest-address candidate is always
//! carved first.

use crate::Span;
use crate::error::Error;
use schedsim_config::JobId;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy)]
struct Allocation {
    order: u32,
    owner: JobId,
}

/// Buddy allocator over a power-of-two address space.
pub struct BuddyAllocator {
    total: u64,
    max_order: u32,
    /// Free block offsets, indexed by order (block size `1 << order`).
    free_by_order: Vec<BTreeSet<u64>>,
    allocations: HashMap<u64, Allocation>,
}

impl BuddyAllocator {
    /// Creates an allocator covering `[0, total)`; `total` must be a power of
    /// two.
    pub fn new(total: u64) -> Result<Self, Error> {
        if total == 0 || !total.is_power_of_two() {
            return Err(Error::InvalidCapacity {
                total,
                details: "buddy allocation requires a power-of-two address space".to_owned(),
            });
        }
        let max_order = total.trailing_zeros();
        let mut free_by_order = vec![BTreeSet::new(); max_order as usize + 1];
        let _ = free_by_order[max_order as usize].insert(0);
        Ok(Self {
            total,
            max_order,
            free_by_order,
            allocations: HashMap::new(),
        })
    }

    /// Size of the managed address space.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Allocates the smallest power-of-two block holding `size` bytes.
    ///
    /// The returned span covers the whole rounded block.
    pub fn allocate(&mut self, size: u64, job: JobId) -> Option<Span> {
        if size == 0 || size > self.total {
            return None;
        }
        let order = size.next_power_of_two().trailing_zeros();

        // Smallest available order that can satisfy the request.
        let source = (order..=self.max_order)
            .find(|&o| !self.free_by_order[o as usize].is_empty())?;
        let offset = *self.free_by_order[source as usize]
            .iter()
            .next()
            .expect("order verified non-empty");
        let _ = self.free_by_order[source as usize].remove(&offset);

        // Split down to the target order, keeping the lower half each time.
        let mut current = source;
        while current > order {
            current -= 1;
            let _ = self.free_by_order[current as usize].insert(offset + (1 << current));
        }

        let _ = self
            .allocations
            .insert(offset, Allocation { order, owner: job });
        Some(Span {
            start: offset,
            size: 1 << order,
        })
    }

    /// Frees the block starting at `offset` and owned by `job`, merging with
    /// its buddy repeatedly while the buddy is free and of equal order.
    pub fn free(&mut self, offset: u64, job: JobId) -> Result<Span, Error> {
        match self.allocations.get(&offset) {
            Some(allocation) if allocation.owner == job => {}
            _ => return Err(Error::UnknownRegion { offset, job }),
        }
        let allocation = self
            .allocations
            .remove(&offset)
            .expect("presence verified above");
        let span = Span {
            start: offset,
            size: 1 << allocation.order,
        };

        let mut offset = offset;
        let mut order = allocation.order;
        while order < self.max_order {
            let buddy = offset ^ (1 << order);
            if !self.free_by_order[order as usize].remove(&buddy) {
                break;
            }
            offset = offset.min(buddy);
            order += 1;
        }
        let _ = self.free_by_order[order as usize].insert(offset);
        Ok(span)
    }

    /// True when no block is allocated and the space is one root free block.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.allocations.is_empty()
            && self.free_by_order[self.max_order as usize].contains(&0)
    }

    /// Free block offsets of the given order, in address order.
    #[must_use]
    pub fn free_blocks(&self, order: u32) -> Vec<u64> {
        self.free_by_order
            .get(order as usize)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rounds_up_to_the_next_power_of_two() {
        let mut buddy = BuddyAllocator::new(1024).expect("allocator");
        let span = buddy.allocate(100, 1).expect("alloc");
        assert_eq!(span, Span { start: 0, size: 128 });

        // The split chain leaves one free block per higher order.
        assert_eq!(buddy.free_blocks(7), vec![128]);
        assert_eq!(buddy.free_blocks(8), vec![256]);
        assert_eq!(buddy.free_blocks(9), vec![512]);
    }

    #[test]
    fn free_restores_the_root_block() {
        let mut buddy = BuddyAllocator::new(1024).expect("allocator");
        let span = buddy.allocate(100, 1).expect("alloc");
        let freed = buddy.free(span.start, 1).expect("free");
        assert_eq!(freed, span);
        assert!(buddy.is_pristine());
    }

    #[test]
    fn buddies_merge_only_with_their_own_buddy() {
        let mut buddy = BuddyAllocator::new(256).expect("allocator");
        let a = buddy.allocate(64, 1).expect("alloc");
        let b = buddy.allocate(64, 2).expect("alloc");
        let c = buddy.allocate(64, 3).expect("alloc");
        assert_eq!((a.start, b.start, c.start), (0, 64, 128));

        // Freeing b alone cannot merge: its buddy a is still allocated.
        let _ = buddy.free(64, 2).expect("free");
        assert_eq!(buddy.free_blocks(6), vec![64, 192]);

        // Freeing a merges a+b, then the pair merges with the free upper half
        // once c goes away.
        let _ = buddy.free(0, 1).expect("free");
        assert_eq!(buddy.free_blocks(7), vec![0]);
        let _ = buddy.free(128, 3).expect("free");
        assert!(buddy.is_pristine());
    }

    #[test]
    fn exhaustion_returns_none_without_state_damage() {
        let mut buddy = BuddyAllocator::new(128).expect("allocator");
        let _ = buddy.allocate(100, 1).expect("alloc takes the whole space");
        assert_eq!(buddy.allocate(1, 2), None);
        assert_eq!(buddy.allocate(129, 3), None);

        let _ = buddy.free(0, 1).expect("free");
        assert!(buddy.is_pristine());
    }

    #[test]
    fn unknown_region_is_reported() {
        let mut buddy = BuddyAllocator::new(128).expect("allocator");
        let span = buddy.allocate(32, 1).expect("alloc");
        assert_eq!(
            buddy.free(span.start, 9),
            Err(Error::UnknownRegion { offset: span.start, job: 9 })
        );
        assert_eq!(
            buddy.free(64, 1),
            Err(Error::UnknownRegion { offset: 64, job: 1 })
        );
    }

    #[test]
    fn non_power_of_two_capacity_is_rejected() {
        assert!(BuddyAllocator::new(0).is_err());
        assert!(BuddyAllocator::new(100).is_err());
    }
}
