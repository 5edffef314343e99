// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the memory manager.
//!
//! Note that a failed allocation is not an error: `allocate` returns `None`
//! and the caller parks the job on its wait queue.

use schedsim_config::JobId;

/// Errors that can occur while managing the emulated address space.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// `free` was called with an offset/owner pair that does not match any
    /// live allocation. This indicates a bookkeeping bug in the caller.
    #[error("No region at offset {offset} owned by process {job}")]
    UnknownRegion {
        /// The offset passed to `free`.
        offset: u64,
        /// The job claiming ownership.
        job: JobId,
    },

    /// The configured address-space size is unusable for the strategy.
    #[error("Invalid memory capacity {total}: {details}")]
    InvalidCapacity {
        /// The rejected capacity.
        total: u64,
        /// Why the capacity was rejected.
        details: String,
    },
}
