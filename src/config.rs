//! Configuration for the capture, record, and playback flows.
//!
//! All configs are plain serde-derived structs with sensible defaults, so a
//! consumer can build them in code, deserialize them from YAML, or mix both.
//! Command-line parsing is left to the consumer.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PaddockError, Result};

/// The simulator's documented telemetry port.
pub const TELEMETRY_PORT: u16 = 20777;

/// Capture stage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// UDP port to listen on. Port 0 asks the OS for an ephemeral port.
    pub port: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { port: TELEMETRY_PORT }
    }
}

/// Record stage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Wake period for draining the handoff queue, in seconds.
    ///
    /// Wakes are phase-aligned to wall-clock multiples of this period.
    pub interval_secs: f64,
    /// Directory where session store files are created.
    pub storage_dir: PathBuf,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self { interval_secs: 1.0, storage_dir: PathBuf::from(".") }
    }
}

impl RecordConfig {
    /// The wake period as a [`Duration`], clamped to a 10 ms floor so a
    /// zero or negative setting cannot spin the record loop.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs.max(0.01))
    }
}

/// Combined configuration for [`crate::Recorder`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub capture: CaptureConfig,
    pub record: RecordConfig,
}

impl RecorderConfig {
    /// Load a recorder configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_yaml(path.as_ref())
    }
}

/// Where replayed datagrams are sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReplayDestination {
    /// Broadcast to the local network, like the simulator itself.
    Broadcast,
    /// Unicast to a single consumer.
    Unicast(IpAddr),
}

/// Playback engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub destination: ReplayDestination,
    /// Destination UDP port.
    pub port: u16,
    /// Playback speed: 1.0 replays at original pace, 2.0 at double speed.
    pub realtime_factor: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            destination: ReplayDestination::Broadcast,
            port: TELEMETRY_PORT,
            realtime_factor: 1.0,
        }
    }
}

impl PlaybackConfig {
    /// Load a playback configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_yaml(path.as_ref())
    }
}

fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PaddockError::config_error(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_yaml_ng::from_str(&raw).map_err(|e| {
        PaddockError::config_error(format!("cannot parse {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_simulator_conventions() {
        let config = RecorderConfig::default();
        assert_eq!(config.capture.port, 20777);
        assert_eq!(config.record.interval_secs, 1.0);
        assert_eq!(config.record.interval(), Duration::from_secs(1));

        let playback = PlaybackConfig::default();
        assert_eq!(playback.destination, ReplayDestination::Broadcast);
        assert_eq!(playback.port, 20777);
        assert_eq!(playback.realtime_factor, 1.0);
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: RecorderConfig = serde_yaml_ng::from_str(
            "record:\n  interval_secs: 0.25\n",
        )
        .expect("valid YAML");
        assert_eq!(config.capture.port, 20777);
        assert_eq!(config.record.interval_secs, 0.25);
    }

    #[test]
    fn playback_destination_round_trips_through_yaml() {
        let config = PlaybackConfig {
            destination: ReplayDestination::Unicast("192.168.1.7".parse().unwrap()),
            port: 21000,
            realtime_factor: 2.0,
        };
        let yaml = serde_yaml_ng::to_string(&config).expect("serialize");
        let parsed: PlaybackConfig = serde_yaml_ng::from_str(&yaml).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn from_yaml_file_reports_missing_files_as_config_errors() {
        let err = RecorderConfig::from_yaml_file("/nonexistent/paddock.yaml").unwrap_err();
        assert!(matches!(err, PaddockError::Config { .. }));
    }
}
