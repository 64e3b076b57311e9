//! Core data types flowing through the capture pipeline.

use crate::protocol::PacketHeader;
use std::time::{SystemTime, UNIX_EPOCH};

/// A raw datagram stamped with its reception time.
///
/// Produced once by the capture stage; ownership then moves through the
/// handoff queue to the record stage. Never shared mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedDatagram {
    /// POSIX time in seconds, stamped right after the socket read.
    pub timestamp: f64,
    /// The raw datagram bytes, exactly as received.
    pub bytes: Vec<u8>,
}

/// A decoded, storage-ready record: capture time, flattened header fields,
/// and the untouched raw bytes.
///
/// Only datagrams that passed catalogue validation become session records,
/// so a record's `(packet_format, packet_version, packet_id)` always resolves
/// in the catalogue and its byte length always equals the registered size.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub timestamp: f64,
    pub packet_format: u16,
    pub game_major_version: u8,
    pub game_minor_version: u8,
    pub packet_version: u8,
    pub packet_id: u8,
    /// Session UID as a 16-digit lowercase hex string (see
    /// [`PacketHeader::session_uid_hex`]).
    pub session_uid: String,
    pub session_time: f32,
    pub frame_identifier: u32,
    pub player_car_index: u8,
    pub bytes: Vec<u8>,
}

impl SessionRecord {
    /// Build a record from a validated datagram and its parsed header.
    pub fn new(timestamp: f64, header: &PacketHeader, bytes: Vec<u8>) -> Self {
        Self {
            timestamp,
            packet_format: header.packet_format,
            game_major_version: header.game_major_version,
            game_minor_version: header.game_minor_version,
            packet_version: header.packet_version,
            packet_id: header.packet_id,
            session_uid: header.session_uid_hex(),
            session_time: header.session_time,
            frame_identifier: header.frame_identifier,
            player_car_index: header.player_car_index,
            bytes,
        }
    }
}

/// Current POSIX time in seconds, as stored with every captured datagram.
pub(crate) fn posix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
