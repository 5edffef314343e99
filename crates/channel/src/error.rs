// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Errors for the intake channel.

/// Errors that can occur sending descriptors into the intake ring.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SendError<T> {
    /// The ring is full and the descriptor could not be enqueued.
    #[error("Intake ring is full and the descriptor could not be enqueued")]
    Full(T),

    /// The consumer is gone and the descriptor could not be enqueued.
    #[error("Intake ring is closed and the descriptor could not be enqueued")]
    Closed(T),
}

impl<T> SendError<T> {
    /// Returns the descriptor that failed to send; useful when the caller
    /// wants the value back either way.
    pub fn inner(self) -> T {
        match self {
            Self::Full(t) => t,
            Self::Closed(t) => t,
        }
    }
}
