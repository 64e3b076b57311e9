//! Capture, record, and replay F1 2019 UDP telemetry.
//!
//! Paddock listens to the fixed-layout binary UDP stream the simulator
//! emits, decodes it against a versioned packet catalogue, and records each
//! session into its own SQLite file with minimal risk of dropped datagrams.
//! A companion playback engine reads recorded sessions back and re-emits
//! them over UDP with the original timing, so any consumer of the live
//! stream can be driven from a recording.
//!
//! # Architecture
//!
//! - **Capture stage**: owns the UDP socket; timestamps datagrams and hands
//!   them off without decoding, as fast as possible.
//! - **Record stage**: wakes on a fixed period, drains the handoff queue,
//!   decodes and validates against the [`protocol`] catalogue, groups
//!   records by session, and persists them.
//! - **Playback engine**: reads a session store in capture order and
//!   re-emits the raw bytes with reconstructed pacing.
//!
//! # Recording
//!
//! ```rust,no_run
//! use paddock::{Recorder, RecorderConfig};
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> paddock::Result<()> {
//!     let recorder = Recorder::start(RecorderConfig::default()).await?;
//!     tokio::time::sleep(std::time::Duration::from_secs(600)).await;
//!     recorder.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Replay
//!
//! ```rust,no_run
//! use paddock::{PlaybackConfig, Player};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> paddock::Result<()> {
//!     let mut player = Player::open(
//!         "F1_2019_06e635c9c0bbc724.sqlite3",
//!         PlaybackConfig::default(),
//!     )?;
//!     let summary = player.play(CancellationToken::new()).await?;
//!     println!("replayed {} packets", summary.packets_sent);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(test)]
pub(crate) mod test_utils;
mod types;

pub mod config;
pub mod protocol;

// Pipeline stages
pub mod capture;
pub mod playback;
pub mod queue;
pub mod record;
pub mod recorder;

// Core exports
pub use config::{
    CaptureConfig, PlaybackConfig, RecordConfig, RecorderConfig, ReplayDestination,
    TELEMETRY_PORT,
};
pub use error::{DecodeError, PaddockError, Result};
pub use types::{SessionRecord, TimestampedDatagram};

// Protocol exports
pub use protocol::{PacketHeader, PacketKind, TelemetryPacket, decode, decode_header};

// Pipeline exports
pub use capture::MAX_DATAGRAM_SIZE;
pub use playback::{PlaybackSummary, Player};
pub use queue::HandoffQueue;
pub use record::{RecordSink, SessionStoreManager};
pub use recorder::Recorder;

/// Unified entry point for the two halves of the crate.
///
/// # Examples
///
/// ## Record live telemetry
/// ```rust,no_run
/// use paddock::{Paddock, RecorderConfig};
///
/// #[tokio::main(flavor = "multi_thread")]
/// async fn main() -> paddock::Result<()> {
///     let recorder = Paddock::record(RecorderConfig::default()).await?;
///     // ... later
///     recorder.shutdown().await;
///     Ok(())
/// }
/// ```
///
/// ## Replay a recorded session
/// ```rust,no_run
/// use paddock::{Paddock, PlaybackConfig};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> paddock::Result<()> {
///     let mut player = Paddock::replay("session.sqlite3", PlaybackConfig::default())?;
///     player.play(CancellationToken::new()).await?;
///     Ok(())
/// }
/// ```
pub struct Paddock;

impl Paddock {
    /// Start a capture-and-record pipeline.
    ///
    /// Binds the telemetry port and spawns the capture and record stages.
    /// Returns an error if the socket cannot be set up.
    pub async fn record(config: RecorderConfig) -> Result<Recorder> {
        Recorder::start(config).await
    }

    /// Open a recorded session store for replay.
    ///
    /// Returns an error if the file is missing, unreadable, or does not have
    /// the session store schema.
    pub fn replay<P: AsRef<std::path::Path>>(
        path: P,
        config: PlaybackConfig,
    ) -> Result<Player> {
        Player::open(path, config)
    }
}
