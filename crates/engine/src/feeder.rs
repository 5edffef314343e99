// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! The workload feeder.
//!
//! Walks the parsed workload in arrival order and releases each descriptor
//! into the intake ring when the logical clock reaches its arrival tick. The
//! feeder is the single producer of the ring; dropping its producer handle at
//! the end is the coordinator's "no more arrivals" signal.

use crate::clock::LogicalClock;
use crate::error::Error;
use schedsim_channel::spsc::Producer;
use schedsim_config::workload::JobSpec;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Spawns the feeder thread.
///
/// `poll` bounds both the arrival-tick polling cadence and the backoff used
/// while the ring is full.
pub fn spawn(
    mut jobs: Vec<JobSpec>,
    producer: Producer<JobSpec>,
    clock: Arc<dyn LogicalClock + Send + Sync>,
    poll: Duration,
) -> Result<JoinHandle<()>, Error> {
    jobs.sort_by_key(|job| job.arrival);
    thread::Builder::new()
        .name("workload-feeder".to_owned())
        .spawn(move || {
            for job in jobs {
                while clock.now() < job.arrival {
                    if producer.is_closed() {
                        tracing::debug!("intake consumer dropped, stopping feeder");
                        return;
                    }
                    thread::sleep(poll);
                }
                tracing::debug!(job = job.id, tick = clock.now(), "releasing job to intake");
                if producer.send_blocking(job, poll).is_err() {
                    // The coordinator is gone; nothing left to feed.
                    tracing::debug!("intake consumer dropped, stopping feeder");
                    return;
                }
            }
            // Dropping the producer closes the ring.
        })
        .map_err(|e| Error::Spawn {
            task: "workload-feeder",
            details: e.to_string(),
        })
}
