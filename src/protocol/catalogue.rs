//! Static packet catalogue.
//!
//! Maps the `(packet_format, packet_version, packet_id)` header triple to the
//! packet kind and its exact wire size. The table is immutable data built into
//! the binary, shared freely across threads without locking. Lookups are
//! exact-match only: an unregistered triple is an unknown packet, never a
//! near-miss.

use super::header::HEADER_SIZE;
use super::packets::NUM_CARS;

/// Packet type discriminants for the 2019 format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Physics data for all cars (id 0).
    Motion,
    /// General data about the session (id 1).
    Session,
    /// Lap timing for all cars (id 2).
    LapData,
    /// Session events such as start and fastest lap (id 3).
    Event,
    /// Participant list (id 4).
    Participants,
    /// Car setups (id 5).
    CarSetups,
    /// Car telemetry such as speed, gear, temperatures (id 6).
    CarTelemetry,
    /// Car status such as fuel, damage, ERS (id 7).
    CarStatus,
}

/// One registered wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub packet_format: u16,
    pub packet_version: u8,
    pub packet_id: u8,
    pub kind: PacketKind,
    /// Exact datagram size in bytes, header included.
    pub exact_size: usize,
}

/// Every `(format, version, id)` triple the decoder understands.
///
/// Sizes follow the F1 2019 UDP specification and include the 23-byte header.
pub const CATALOGUE: &[CatalogueEntry] = &[
    entry(0, PacketKind::Motion, HEADER_SIZE + NUM_CARS * 60 + 120),
    entry(1, PacketKind::Session, HEADER_SIZE + 19 + 21 * 5 + 2),
    entry(2, PacketKind::LapData, HEADER_SIZE + NUM_CARS * 41),
    entry(3, PacketKind::Event, HEADER_SIZE + 9),
    entry(4, PacketKind::Participants, HEADER_SIZE + 1 + NUM_CARS * 54),
    entry(5, PacketKind::CarSetups, HEADER_SIZE + NUM_CARS * 41),
    entry(6, PacketKind::CarTelemetry, HEADER_SIZE + NUM_CARS * 66 + 4),
    entry(7, PacketKind::CarStatus, HEADER_SIZE + NUM_CARS * 56),
];

const fn entry(packet_id: u8, kind: PacketKind, exact_size: usize) -> CatalogueEntry {
    CatalogueEntry { packet_format: 2019, packet_version: 1, packet_id, kind, exact_size }
}

/// Resolve a header triple to its catalogue entry, if registered.
pub fn lookup(
    packet_format: u16,
    packet_version: u8,
    packet_id: u8,
) -> Option<&'static CatalogueEntry> {
    CATALOGUE.iter().find(|e| {
        e.packet_format == packet_format
            && e.packet_version == packet_version
            && e.packet_id == packet_id
    })
}
