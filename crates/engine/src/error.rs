// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the scheduling core.

use schedsim_config::JobId;

/// All errors that can occur while driving a simulation run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A wrapper for configuration errors.
    #[error("A configuration error occurred: {0}")]
    Config(#[from] schedsim_config::error::Error),

    /// A wrapper for memory-manager construction errors.
    #[error("A memory error occurred: {0}")]
    Memory(#[from] schedsim_memory::error::Error),

    /// A trace sink could not be written.
    #[error("Could not write {context}: {error}")]
    Trace {
        /// Which artifact failed (e.g. `scheduler.log`).
        context: &'static str,
        /// The underlying I/O failure.
        #[source]
        error: std::io::Error,
    },

    /// A worker process failed its readiness or exit handshake. Fatal: the
    /// coordinator tears down the run.
    #[error("Worker for process {job} was lost: {details}")]
    WorkerLost {
        /// The job whose worker disappeared.
        job: JobId,
        /// What the controller observed.
        details: String,
    },

    /// A helper thread could not be spawned.
    #[error("Could not spawn the {task} thread: {details}")]
    Spawn {
        /// The thread's role.
        task: &'static str,
        /// The underlying failure.
        details: String,
    },
}
