// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Simulation configuration.
//!
//! Data model:
//! - simulation settings (memory size, intake capacity, quantum, tick length)
//! - algorithm selectors (scheduling policy, memory strategy)
//! - workload descriptors parsed from the input file
//!
//! A run is fully described by one [`SimSettings`] value, one
//! [`SchedulerKind`], one [`MemoryKind`], and the list of [`workload::JobSpec`]
//! entries read from the workload file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod settings;
pub mod workload;

pub use settings::SimSettings;

/// Integer unit of the logical clock; the smallest scheduling granularity.
pub type Tick = u64;

/// Identifier of a job, as given in the workload file.
///
/// Job ids double as dense indexes into the process table, so they are kept
/// small and unsigned.
pub type JobId = u32;

/// The scheduling policy driving the coordinator's election step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchedulerKind {
    /// First come, first served; non-preemptive.
    Fcfs,
    /// Shortest job first; non-preemptive.
    Sjf,
    /// Highest priority first; preemptive.
    Hpf,
    /// Shortest remaining time next; preemptive.
    Srtn,
    /// Round robin with a fixed quantum.
    RoundRobin,
}

impl SchedulerKind {
    /// The numeric selector used on the command line.
    #[must_use]
    pub const fn selector(self) -> u8 {
        match self {
            SchedulerKind::Fcfs => 1,
            SchedulerKind::Sjf => 2,
            SchedulerKind::Hpf => 3,
            SchedulerKind::Srtn => 4,
            SchedulerKind::RoundRobin => 5,
        }
    }

    /// All policies, in selector order.
    pub const ALL: [SchedulerKind; 5] = [
        SchedulerKind::Fcfs,
        SchedulerKind::Sjf,
        SchedulerKind::Hpf,
        SchedulerKind::Srtn,
        SchedulerKind::RoundRobin,
    ];
}

impl TryFrom<u8> for SchedulerKind {
    type Error = error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SchedulerKind::Fcfs),
            2 => Ok(SchedulerKind::Sjf),
            3 => Ok(SchedulerKind::Hpf),
            4 => Ok(SchedulerKind::Srtn),
            5 => Ok(SchedulerKind::RoundRobin),
            other => Err(error::Error::InvalidSelector {
                what: "scheduling algorithm",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for SchedulerKind {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "fcfs" => Ok(SchedulerKind::Fcfs),
            "2" | "sjf" => Ok(SchedulerKind::Sjf),
            "3" | "hpf" => Ok(SchedulerKind::Hpf),
            "4" | "srtn" => Ok(SchedulerKind::Srtn),
            "5" | "rr" | "round-robin" => Ok(SchedulerKind::RoundRobin),
            other => Err(error::Error::InvalidSelector {
                what: "scheduling algorithm",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SchedulerKind::Fcfs => "FCFS",
            SchedulerKind::Sjf => "SJF",
            SchedulerKind::Hpf => "HPF",
            SchedulerKind::Srtn => "SRTN",
            SchedulerKind::RoundRobin => "RR",
        };
        write!(f, "{label}")
    }
}

/// The strategy the memory manager uses to place allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryKind {
    /// First free segment that fits, scanning from offset zero.
    FirstFit,
    /// First fit, resuming the scan after the previously allocated segment.
    NextFit,
    /// Smallest free segment that fits; ties broken by lowest start.
    BestFit,
    /// Power-of-two buddy allocation.
    Buddy,
}

impl MemoryKind {
    /// The numeric selector used on the command line.
    #[must_use]
    pub const fn selector(self) -> u8 {
        match self {
            MemoryKind::FirstFit => 1,
            MemoryKind::NextFit => 2,
            MemoryKind::BestFit => 3,
            MemoryKind::Buddy => 4,
        }
    }

    /// All strategies, in selector order.
    pub const ALL: [MemoryKind; 4] = [
        MemoryKind::FirstFit,
        MemoryKind::NextFit,
        MemoryKind::BestFit,
        MemoryKind::Buddy,
    ];
}

impl TryFrom<u8> for MemoryKind {
    type Error = error::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MemoryKind::FirstFit),
            2 => Ok(MemoryKind::NextFit),
            3 => Ok(MemoryKind::BestFit),
            4 => Ok(MemoryKind::Buddy),
            other => Err(error::Error::InvalidSelector {
                what: "memory allocation algorithm",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for MemoryKind {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "first-fit" | "ff" => Ok(MemoryKind::FirstFit),
            "2" | "next-fit" | "nf" => Ok(MemoryKind::NextFit),
            "3" | "best-fit" | "bf" => Ok(MemoryKind::BestFit),
            "4" | "buddy" => Ok(MemoryKind::Buddy),
            other => Err(error::Error::InvalidSelector {
                what: "memory allocation algorithm",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MemoryKind::FirstFit => "first-fit",
            MemoryKind::NextFit => "next-fit",
            MemoryKind::BestFit => "best-fit",
            MemoryKind::Buddy => "buddy",
        };
        write!(f, "{label}")
    }
}
