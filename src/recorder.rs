//! Recorder facade: wires the capture and record stages together.
//!
//! Owns the spawned tasks and their cancellation tokens, and enforces the
//! shutdown order that keeps data intact: capture stops first so nothing new
//! enters the queue, then the record stage drains, flushes, and closes the
//! open store.

use futures::StreamExt;
use futures::stream::BoxStream;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::capture::CaptureStage;
use crate::config::RecorderConfig;
use crate::error::Result;
use crate::protocol::TelemetryPacket;
use crate::queue::HandoffQueue;
use crate::record::{RecordStage, SessionStoreManager};

/// A running capture-and-record pipeline.
///
/// Dropping a `Recorder` cancels both stages; calling [`Recorder::shutdown`]
/// additionally waits for the record stage to flush and close its store,
/// which is what you want on a clean exit.
pub struct Recorder {
    local_addr: SocketAddr,
    packets: watch::Receiver<Option<Arc<TelemetryPacket>>>,
    capture_cancel: CancellationToken,
    record_cancel: CancellationToken,
    capture_task: Option<JoinHandle<()>>,
    record_task: Option<JoinHandle<()>>,
}

impl Recorder {
    /// Bind the telemetry socket and start both pipeline stages.
    ///
    /// Fails only on socket setup; from then on all per-datagram problems are
    /// handled inside the record stage.
    pub async fn start(config: RecorderConfig) -> Result<Self> {
        info!("Starting telemetry recorder on UDP port {}", config.capture.port);

        let queue = Arc::new(HandoffQueue::new());
        let (tap_tx, tap_rx) = watch::channel(None);
        let capture_cancel = CancellationToken::new();
        let record_cancel = CancellationToken::new();

        let capture = CaptureStage::bind(
            &config.capture,
            Arc::clone(&queue),
            capture_cancel.clone(),
        )?;
        let local_addr = capture.local_addr();

        let sink = SessionStoreManager::new(&config.record.storage_dir);
        let record = RecordStage::new(
            queue,
            sink,
            config.record.interval(),
            record_cancel.clone(),
            tap_tx,
        );

        // Record first, then capture: the reverse of the shutdown order.
        let record_task = tokio::spawn(record.run());
        let capture_task = tokio::spawn(capture.run());

        Ok(Self {
            local_addr,
            packets: tap_rx,
            capture_cancel,
            record_cancel,
            capture_task: Some(capture_task),
            record_task: Some(record_task),
        })
    }

    /// The address the capture socket is bound to (resolves an ephemeral
    /// port when the configured port was 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Subscribe to decoded packets as they are recorded.
    ///
    /// Latest-wins: a slow consumer sees the most recent packet, not a
    /// backlog. Recording itself is never throttled by subscribers.
    pub fn subscribe(&self) -> BoxStream<'static, Arc<TelemetryPacket>> {
        WatchStream::new(self.packets.clone()).filter_map(|opt| async move { opt }).boxed()
    }

    /// Stop the pipeline in data-safe order: capture first, so nothing new
    /// enters the queue, then the record stage, which drains the remainder
    /// and closes its store before exiting.
    pub async fn shutdown(mut self) {
        info!("Stopping telemetry recorder");

        self.capture_cancel.cancel();
        if let Some(task) = self.capture_task.take() {
            if let Err(e) = task.await {
                warn!("Capture task ended abnormally: {e}");
            }
        }

        self.record_cancel.cancel();
        if let Some(task) = self.record_task.take() {
            if let Err(e) = task.await {
                warn!("Record task ended abnormally: {e}");
            }
        }

        info!("Telemetry recorder stopped");
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        debug!("Dropping recorder");
        self.capture_cancel.cancel();
        self.record_cancel.cancel();
    }
}
