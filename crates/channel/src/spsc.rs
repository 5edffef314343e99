// Copyright The schedsim authors
// SPDX-License-Identifier: Apache-2.0

//! Single-producer, single-consumer bounded ring guarded by one binary lock.
//!
//! The producer side lives on the workload feeder thread; the consumer side
//! is owned by the coordinator. The consumer never removes single entries: it
//! drains the whole ring in one critical section, so the lock hold time is
//! bounded by the ring capacity. A producer facing a full ring blocks with a
//! bounded backoff until the consumer makes room.

use crate::error::SendError;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct RingState<T> {
    buffer: VecDeque<T>,
    capacity: usize,
    is_closed: bool,
}

struct Shared<T> {
    state: Mutex<RingState<T>>,
    /// Signaled by the producer when the ring becomes non-empty.
    arrivals: Condvar,
    /// Signaled by the consumer when the ring is drained.
    space: Condvar,
}

/// Creates a new bounded SPSC ring with the given capacity.
///
/// # Panics
///
/// Panics if `capacity` is zero.
#[must_use]
pub fn channel<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(capacity > 0, "intake capacity must be positive");
    let shared = Arc::new(Shared {
        state: Mutex::new(RingState {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            is_closed: false,
        }),
        arrivals: Condvar::new(),
        space: Condvar::new(),
    });
    (
        Producer {
            shared: shared.clone(),
        },
        Consumer { shared },
    )
}

/// The producing half of the ring. Held by the workload feeder.
pub struct Producer<T> {
    shared: Arc<Shared<T>>,
}

/// The consuming half of the ring. Held by the coordinator.
pub struct Consumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Producer<T> {
    /// Appends a descriptor if the ring has room.
    pub fn try_send(&self, value: T) -> Result<(), SendError<T>> {
        let mut state = self.shared.state.lock();
        if state.is_closed {
            return Err(SendError::Closed(value));
        }
        if state.buffer.len() >= state.capacity {
            return Err(SendError::Full(value));
        }
        state.buffer.push_back(value);
        drop(state);
        let _ = self.shared.arrivals.notify_one();
        Ok(())
    }

    /// Appends a descriptor, blocking while the ring is full.
    ///
    /// The wait re-checks at most every `backoff`, so a wakeup lost to timing
    /// is repaired on the next poll. Returns `Closed` only if the consumer is
    /// gone.
    pub fn send_blocking(&self, value: T, backoff: Duration) -> Result<(), SendError<T>> {
        let mut state = self.shared.state.lock();
        loop {
            if state.is_closed {
                return Err(SendError::Closed(value));
            }
            if state.buffer.len() < state.capacity {
                state.buffer.push_back(value);
                drop(state);
                let _ = self.shared.arrivals.notify_one();
                return Ok(());
            }
            let _ = self.shared.space.wait_for(&mut state, backoff);
        }
    }

    /// Closes the ring. Pending entries stay readable by the consumer.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.is_closed = true;
        drop(state);
        let _ = self.shared.arrivals.notify_one();
    }

    /// True once the consumer is gone; the producer has nobody to feed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().is_closed
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> Consumer<T> {
    /// Drains every pending descriptor into `out`, all or nothing.
    ///
    /// Returns `None` without touching `out` if the lock is contended right
    /// now; the caller retries on its next poll. No data is lost because the
    /// producer blocks on a full ring.
    pub fn try_drain_into(&self, out: &mut Vec<T>) -> Option<usize> {
        let mut state = self.shared.state.try_lock()?;
        let count = state.buffer.len();
        out.extend(state.buffer.drain(..));
        drop(state);
        if count > 0 {
            let _ = self.shared.space.notify_one();
        }
        Some(count)
    }

    /// Blocks until the ring is non-empty or the deadline passes.
    ///
    /// A closed ring simply sleeps out the deadline; the caller uses the
    /// deadline for tick pacing, not only for arrivals. Returns `true` if
    /// entries are waiting.
    pub fn wait_arrivals_until(&self, deadline: Instant) -> bool {
        let mut state = self.shared.state.lock();
        while state.buffer.is_empty() {
            if self
                .shared
                .arrivals
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        !state.buffer.is_empty()
    }

    /// True once the producer is gone and the ring is fully drained.
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        let state = self.shared.state.lock();
        state.is_closed && state.buffer.is_empty()
    }

    /// Number of descriptors currently waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.state.lock().buffer.len()
    }

    /// True if no descriptors are currently waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        // Unblock a producer stuck in send_blocking.
        let mut state = self.shared.state.lock();
        state.is_closed = true;
        drop(state);
        let _ = self.shared.space.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn drain_is_all_or_nothing() {
        let (tx, rx) = channel(4);
        tx.try_send(1).expect("send");
        tx.try_send(2).expect("send");
        tx.try_send(3).expect("send");

        let mut out = Vec::new();
        assert_eq!(rx.try_drain_into(&mut out), Some(3));
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(rx.try_drain_into(&mut out), Some(0));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn full_ring_rejects_and_unblocks_after_drain() {
        let (tx, rx) = channel(1);
        tx.try_send(10).expect("send");
        assert_eq!(tx.try_send(11), Err(SendError::Full(11)));

        let producer = thread::spawn(move || {
            tx.send_blocking(11, Duration::from_millis(1)).expect("send unblocks");
        });

        // Give the producer a chance to block, then make room.
        thread::sleep(Duration::from_millis(10));
        let mut out = Vec::new();
        assert_eq!(rx.try_drain_into(&mut out), Some(1));
        producer.join().expect("producer thread");

        out.clear();
        assert_eq!(rx.try_drain_into(&mut out), Some(1));
        assert_eq!(out, vec![11]);
    }

    #[test]
    fn close_drains_then_disconnects() {
        let (tx, rx) = channel(4);
        tx.try_send(7).expect("send");
        drop(tx);

        assert!(!rx.is_disconnected());
        let mut out = Vec::new();
        assert_eq!(rx.try_drain_into(&mut out), Some(1));
        assert!(rx.is_disconnected());
    }

    #[test]
    fn send_to_dropped_consumer_fails() {
        let (tx, rx) = channel(4);
        drop(rx);
        assert_eq!(tx.try_send(1), Err(SendError::Closed(1)));
        assert_eq!(
            tx.send_blocking(2, Duration::from_millis(1)),
            Err(SendError::Closed(2))
        );
        assert_eq!(SendError::Closed(2).inner(), 2);
    }

    #[test]
    fn wait_observes_new_arrivals() {
        let (tx, rx) = channel(4);
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            tx.try_send(42).expect("send");
            // Keep the producer alive until the consumer sees the entry.
            thread::sleep(Duration::from_millis(50));
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        assert!(rx.wait_arrivals_until(deadline));
        producer.join().expect("producer thread");
    }

    #[test]
    fn wait_times_out_when_idle() {
        let (_tx, rx) = channel::<u32>(4);
        let deadline = Instant::now() + Duration::from_millis(5);
        assert!(!rx.wait_arrivals_until(deadline));
    }
}
