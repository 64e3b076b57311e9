//! Error types for telemetry capture, recording, and replay.
//!
//! Two layers mirror the two failure domains:
//!
//! - [`DecodeError`] covers per-datagram protocol failures (too short, unknown
//!   type triple, wrong size). These are recoverable: the record stage drops
//!   the offending datagram with a diagnostic and continues.
//! - [`PaddockError`] covers everything that can stop a flow: socket setup,
//!   session store I/O, incompatible store schemas, configuration problems.
//!
//! All errors implement `std::error::Error` and carry structured context.

use std::path::PathBuf;
use thiserror::Error;

use crate::protocol::PacketKind;

/// Result type alias for paddock operations.
pub type Result<T, E = PaddockError> = std::result::Result<T, E>;

/// Per-datagram decode failure.
///
/// Returned by [`crate::protocol::decode`]; never fatal for the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram of {actual} bytes is too short for the packet header")]
    TooShort { actual: usize },

    #[error(
        "no catalogue entry for (format, version, id) = ({packet_format}, {packet_version}, {packet_id})"
    )]
    UnknownType { packet_format: u16, packet_version: u8, packet_id: u8 },

    #[error("bad size for {kind:?} packet; expected {expected} bytes but received {actual} bytes")]
    SizeMismatch { kind: PacketKind, expected: usize, actual: usize },
}

/// Main error type for paddock operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PaddockError {
    #[error("bad telemetry datagram")]
    Decode {
        #[from]
        source: DecodeError,
    },

    #[error("UDP socket error: {context}")]
    Socket {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session store error: {path}")]
    Store {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("session store {path} has an incompatible schema: {details}")]
    StoreSchema { path: PathBuf, details: String },

    #[error("configuration error: {details}")]
    Config { details: String },
}

impl PaddockError {
    /// Helper constructor for socket errors with operation context.
    pub fn socket_error(context: impl Into<String>, source: std::io::Error) -> Self {
        PaddockError::Socket { context: context.into(), source }
    }

    /// Helper constructor for session store errors with path context.
    pub fn store_error(path: impl Into<PathBuf>, source: rusqlite::Error) -> Self {
        PaddockError::Store { path: path.into(), source }
    }

    /// Helper constructor for store schema conflicts.
    pub fn store_schema_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        PaddockError::StoreSchema { path: path.into(), details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(details: impl Into<String>) -> Self {
        PaddockError::Config { details: details.into() }
    }

    /// Returns whether this error leaves the pipeline in a usable state.
    ///
    /// Decode failures are always per-datagram; store failures are fatal for
    /// one session's file but not for the process.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PaddockError::Decode { .. } => true,
            PaddockError::Store { .. } => true,
            PaddockError::StoreSchema { .. } => true,
            PaddockError::Socket { .. } => false,
            PaddockError::Config { .. } => false,
        }
    }
}
