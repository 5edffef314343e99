// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Workload file parsing.
//!
//! The workload is a plain text file with one job per line:
//!
//! ```text
//! #id  arrival  runtime  priority  mem_size
//! 1    0        6        3         120
//! 2    2        2        1         40
//! ```
//!
//! Fields are separated by tabs or spaces; lines starting with `#` are
//! comments. Trailing fields beyond the fifth are ignored.

use crate::error::Error;
use crate::{JobId, Tick};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

/// One job descriptor as read from the workload file. Immutable once read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobSpec {
    /// Identifier of the job; unique within a workload.
    pub id: JobId,
    /// Tick at which the job enters the system.
    pub arrival: Tick,
    /// Total CPU time the job needs, in ticks. Always positive.
    pub runtime: u64,
    /// Scheduling priority; larger means more urgent under HPF.
    pub priority: i64,
    /// Bytes of contiguous memory the job needs for its whole lifetime.
    pub mem_size: u64,
}

/// Parses a workload from any buffered reader.
///
/// Jobs are returned in file order; callers that need arrival order must sort.
pub fn parse_workload<R: BufRead>(reader: R) -> Result<Vec<JobSpec>, Error> {
    let mut jobs = Vec::new();
    let mut seen = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line.map_err(|e| Error::InvalidLine {
            line: number,
            details: e.to_string(),
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let job = parse_line(trimmed, number)?;
        if !seen.insert(job.id) {
            return Err(Error::DuplicateJobId {
                line: number,
                id: job.id,
            });
        }
        jobs.push(job);
    }

    Ok(jobs)
}

/// Reads and parses the workload file at `path`.
pub fn load_workload(path: &Path) -> Result<Vec<JobSpec>, Error> {
    let file = std::fs::File::open(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    parse_workload(std::io::BufReader::new(file))
}

fn parse_line(line: &str, number: usize) -> Result<JobSpec, Error> {
    let mut fields = line.split_whitespace();
    let mut next = |name: &'static str| {
        fields.next().ok_or_else(|| Error::InvalidLine {
            line: number,
            details: format!("missing field `{name}` (expected 5 fields)"),
        })
    };

    let id = parse_field::<JobId>(next("id")?, "id", number)?;
    let arrival = parse_field::<Tick>(next("arrival")?, "arrival", number)?;
    let runtime = parse_field::<u64>(next("runtime")?, "runtime", number)?;
    let priority = parse_field::<i64>(next("priority")?, "priority", number)?;
    let mem_size = parse_field::<u64>(next("mem_size")?, "mem_size", number)?;

    if runtime == 0 {
        return Err(Error::InvalidLine {
            line: number,
            details: "runtime must be positive".to_owned(),
        });
    }
    if mem_size == 0 {
        return Err(Error::InvalidLine {
            line: number,
            details: "mem_size must be at least 1".to_owned(),
        });
    }

    Ok(JobSpec {
        id,
        arrival,
        runtime,
        priority,
        mem_size,
    })
}

fn parse_field<T: std::str::FromStr>(
    raw: &str,
    name: &'static str,
    number: usize,
) -> Result<T, Error> {
    raw.parse().map_err(|_| Error::InvalidLine {
        line: number,
        details: format!("field `{name}` has invalid value `{raw}`"),
    })
}
