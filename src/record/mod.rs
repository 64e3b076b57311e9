//! Record stage: drain, decode, group, persist.
//!
//! The record stage runs on its own period, decoupled from datagram arrival.
//! Each wake it swaps the entire pending batch out of the handoff queue,
//! decodes and validates every datagram in arrival order, groups consecutive
//! records by session UID, and hands each same-session run to the sink.
//! Wakes are phase-aligned to wall-clock multiples of the period, so batch
//! boundaries are predictable rather than drifting with processing time.
//!
//! Decode failures are strictly per-datagram: the offending datagram is
//! dropped with a diagnostic and the rest of the batch proceeds.

pub mod store;

pub use store::SessionStoreManager;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::protocol::{self, TelemetryPacket};
use crate::queue::HandoffQueue;
use crate::types::{SessionRecord, TimestampedDatagram, posix_now};

/// Datagrams in a single drained batch that indicate the persist stage is
/// falling behind arrival rate.
const BACKLOG_WARN_THRESHOLD: usize = 10_000;

/// Where the record stage sends same-session runs of validated records.
///
/// [`SessionStoreManager`] is the production sink; tests substitute an
/// in-memory one.
#[async_trait]
pub trait RecordSink: Send {
    /// Persist one same-session batch atomically. Empty batches are no-ops.
    async fn write_batch(&mut self, records: Vec<SessionRecord>) -> Result<()>;

    /// No records arrived for `age` seconds; finalize any open store.
    async fn close_if_idle(&mut self, age: f64);

    /// Flush and close whatever is open. Idempotent.
    async fn close(&mut self);
}

#[async_trait]
impl RecordSink for SessionStoreManager {
    async fn write_batch(&mut self, records: Vec<SessionRecord>) -> Result<()> {
        SessionStoreManager::write_batch(self, &records)
    }

    async fn close_if_idle(&mut self, age: f64) {
        SessionStoreManager::close_if_idle(self, age);
    }

    async fn close(&mut self) {
        SessionStoreManager::close(self);
    }
}

/// The periodic drain/decode/persist loop.
pub struct RecordStage<S> {
    queue: Arc<HandoffQueue>,
    sink: S,
    interval: Duration,
    cancel: CancellationToken,
    tap: watch::Sender<Option<Arc<TelemetryPacket>>>,
}

impl<S: RecordSink> RecordStage<S> {
    pub fn new(
        queue: Arc<HandoffQueue>,
        sink: S,
        interval: Duration,
        cancel: CancellationToken,
        tap: watch::Sender<Option<Arc<TelemetryPacket>>>,
    ) -> Self {
        Self { queue, sink, interval, cancel, tap }
    }

    /// Run until cancelled. Cancellation still drains and flushes the pending
    /// batch once, then closes the sink, so shutdown never strands records.
    pub async fn run(mut self) {
        info!("Record stage started");
        let mut inactivity_timer = posix_now();
        let mut quit = false;

        while !quit {
            let timeout = next_wake_timeout(posix_now(), self.interval);
            tokio::select! {
                _ = self.cancel.cancelled() => quit = true,
                _ = tokio::time::sleep(timeout) => {}
            }

            // Swap first so the capture side is released immediately; the
            // batch is processed outside the critical section.
            let batch = self.queue.swap();
            if batch.is_empty() {
                let now = posix_now();
                self.sink.close_if_idle(now - inactivity_timer).await;
                inactivity_timer = now;
            } else {
                if let Some(last) = batch.last() {
                    inactivity_timer = last.timestamp;
                }
                self.process_batch(batch).await;
            }
        }

        self.sink.close().await;
        info!("Record stage stopped");
    }

    async fn process_batch(&mut self, batch: Vec<TimestampedDatagram>) {
        let started = Instant::now();
        let total = batch.len();
        if total > BACKLOG_WARN_THRESHOLD {
            warn!("Drained {total} datagrams in one batch; persist stage is falling behind");
        }

        // Invariant: every record in `run` has the same session UID.
        let mut run: Vec<SessionRecord> = Vec::new();

        for datagram in batch {
            let packet = match protocol::decode(&datagram.bytes) {
                Ok(packet) => packet,
                Err(e) => {
                    error!("Dropped bad datagram: {e}");
                    continue;
                }
            };

            if let TelemetryPacket::Event(event) = &packet {
                info!("Recording event packet: {}", event.event_code());
            }

            let record = SessionRecord::new(datagram.timestamp, packet.header(), datagram.bytes);

            if run.first().is_some_and(|first| first.session_uid != record.session_uid) {
                self.flush_run(&mut run).await;
            }
            run.push(record);

            let _ = self.tap.send(Some(Arc::new(packet)));
        }

        self.flush_run(&mut run).await;

        info!(
            "Recorded {} packets in {:.3} ms",
            total,
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    /// Hand the accumulated same-session run to the sink. A failed write is
    /// surfaced with the number of records lost; the batch is not retried.
    async fn flush_run(&mut self, run: &mut Vec<SessionRecord>) {
        if run.is_empty() {
            return;
        }
        let count = run.len();
        if let Err(e) = self.sink.write_batch(std::mem::take(run)).await {
            error!("Failed to persist a run of {count} records (records lost): {e}");
        }
    }
}

/// Timeout that lands the next wake on a wall-clock multiple of the period.
///
/// If the remaining slice of the current period is under half a period, it is
/// skipped so two wakes never land back to back.
fn next_wake_timeout(now: f64, interval: Duration) -> Duration {
    let period = interval.as_secs_f64();
    if period <= 0.0 {
        return Duration::ZERO;
    }
    let mut timeout = (-now).rem_euclid(period);
    if timeout < 0.5 * period {
        timeout += period;
    }
    Duration::from_secs_f64(timeout)
}
