// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Bounded channels used to hand jobs from the workload feeder to the
//! coordinator.

pub mod error;
pub mod spsc;
