// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the config crate.

/// Errors that can occur while reading the simulation configuration or the
/// workload file.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An unknown algorithm selector was supplied on the command line or in a
    /// settings file.
    #[error("Invalid {what} selector `{value}`")]
    InvalidSelector {
        /// Which selector was malformed (scheduling or memory).
        what: &'static str,
        /// The rejected value, verbatim.
        value: String,
    },

    /// A file could not be opened or read.
    #[error("Could not read `{path}`: {details}")]
    FileRead {
        /// The path that failed to open.
        path: String,
        /// A description of the underlying I/O failure.
        details: String,
    },

    /// A settings file did not deserialize into [`crate::SimSettings`].
    #[error("Invalid settings in `{path}`: {details}")]
    Deserialization {
        /// The settings file path.
        path: String,
        /// A description of the error reported by the deserializer.
        details: String,
    },

    /// A settings value is out of range for the simulation.
    #[error("Invalid setting: {details}")]
    InvalidSetting {
        /// Which setting is invalid and why.
        details: String,
    },

    /// A non-comment workload line has fewer than five fields or a field that
    /// does not parse.
    #[error("Error in input file line {line}: {details}")]
    InvalidLine {
        /// The 1-based line number of the offending line.
        line: usize,
        /// Why the line was rejected.
        details: String,
    },

    /// Two workload lines declare the same job id.
    #[error("Error in input file line {line}: duplicate job id {id}")]
    DuplicateJobId {
        /// The 1-based line number of the second declaration.
        line: usize,
        /// The duplicated job id.
        id: crate::JobId,
    },
}
