//! Handoff queue between the capture and record stages.
//!
//! This is the only structure mutated by two different flows. The capture
//! side appends under a short-held lock; the record side swaps the entire
//! pending batch out and clears the queue in one operation. Neither critical
//! section does any decoding or I/O, so the capture stage is never blocked
//! for longer than a `Vec` append or pointer swap.
//!
//! Growth is unbounded: the capture side must never block or drop. The
//! record stage watches drained batch sizes and logs a backlog warning when
//! the persist stage falls behind.

use std::mem;
use std::sync::{Mutex, PoisonError};

use crate::types::TimestampedDatagram;

/// Lock-protected append buffer preserving arrival order.
#[derive(Debug, Default)]
pub struct HandoffQueue {
    pending: Mutex<Vec<TimestampedDatagram>>,
}

impl HandoffQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one datagram. Called only from the capture stage.
    pub fn push(&self, datagram: TimestampedDatagram) {
        // A poisoned lock still holds valid data; both critical sections are
        // a plain append or swap.
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(datagram);
    }

    /// Take the entire pending batch, leaving the queue empty.
    ///
    /// Arrival order is preserved. Called only from the record stage.
    pub fn swap(&self) -> Vec<TimestampedDatagram> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        mem::take(&mut *pending)
    }
}
