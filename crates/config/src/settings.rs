// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Tunable constants of a simulation run.

use crate::MemoryKind;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default size of the emulated address space, in bytes.
pub const DEFAULT_MEMORY_SIZE: u64 = 1024;
/// Default capacity of the job intake ring.
pub const DEFAULT_INTAKE_CAPACITY: usize = 1024;
/// Default round-robin quantum, in ticks.
pub const DEFAULT_QUANTUM: u64 = 2;
/// Default initial capacity of the process table.
pub const DEFAULT_TABLE_CAPACITY: usize = 16;
/// Default wall-time length of one logical tick.
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// The tunable constants of a run.
///
/// Every field has a default matching the constants of the reference
/// implementation, so an empty settings file (or none at all) yields a valid
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimSettings {
    /// Size `M` of the emulated address space `[0, M)`, in bytes.
    pub memory_size: u64,
    /// Capacity `B` of the bounded intake ring.
    pub intake_capacity: usize,
    /// Round-robin quantum `Q`, in ticks.
    pub quantum: u64,
    /// Initial process-table capacity; the table doubles past this on demand.
    pub table_capacity: usize,
    /// Wall-time length of one logical tick.
    #[serde(with = "humantime_serde")]
    pub tick: Duration,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
            quantum: DEFAULT_QUANTUM,
            table_capacity: DEFAULT_TABLE_CAPACITY,
            tick: DEFAULT_TICK,
        }
    }
}

impl SimSettings {
    /// Loads settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| Error::Deserialization {
            path: path.display().to_string(),
            details: e.to_string(),
        })
    }

    /// Validates the settings against the selected memory strategy.
    ///
    /// The buddy strategy additionally requires a power-of-two address space.
    pub fn validate(&self, memory: MemoryKind) -> Result<(), Error> {
        if self.memory_size == 0 {
            return Err(Error::InvalidSetting {
                details: "memory_size must be positive".to_owned(),
            });
        }
        if self.intake_capacity == 0 {
            return Err(Error::InvalidSetting {
                details: "intake_capacity must be positive".to_owned(),
            });
        }
        if self.quantum == 0 {
            return Err(Error::InvalidSetting {
                details: "quantum must be positive".to_owned(),
            });
        }
        if self.table_capacity == 0 {
            return Err(Error::InvalidSetting {
                details: "table_capacity must be positive".to_owned(),
            });
        }
        if self.tick.is_zero() {
            return Err(Error::InvalidSetting {
                details: "tick must be a positive duration".to_owned(),
            });
        }
        if memory == MemoryKind::Buddy && !self.memory_size.is_power_of_two() {
            return Err(Error::InvalidSetting {
                details: format!(
                    "memory_size {} must be a power of two for the buddy strategy",
                    self.memory_size
                ),
            });
        }
        Ok(())
    }

    /// Interval at which blocked producers and the idle coordinator re-poll.
    ///
    /// One tenth of a tick, clamped to at least one millisecond.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        (self.tick / 10).max(Duration::from_millis(1))
    }
}
