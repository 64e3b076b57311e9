//! Shared helpers for constructing synthetic telemetry datagrams in tests.

use crate::protocol::{CATALOGUE, HEADER_SIZE, PacketHeader, PacketKind};

/// Encode a header into its 23-byte wire form.
pub(crate) fn encode_header(header: &PacketHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(&header.packet_format.to_le_bytes());
    buf.push(header.game_major_version);
    buf.push(header.game_minor_version);
    buf.push(header.packet_version);
    buf.push(header.packet_id);
    buf.extend_from_slice(&header.session_uid.to_le_bytes());
    buf.extend_from_slice(&header.session_time.to_le_bytes());
    buf.extend_from_slice(&header.frame_identifier.to_le_bytes());
    buf.push(header.player_car_index);
    buf
}

/// A catalogue-valid datagram of the given kind with a zeroed body.
pub(crate) fn datagram_for(kind: PacketKind, session_uid: u64) -> Vec<u8> {
    let entry = CATALOGUE
        .iter()
        .find(|e| e.kind == kind)
        .unwrap_or_else(|| panic!("kind {kind:?} not registered"));
    let header = PacketHeader {
        packet_format: entry.packet_format,
        packet_version: entry.packet_version,
        packet_id: entry.packet_id,
        session_uid,
        ..Default::default()
    };
    let mut datagram = vec![0u8; entry.exact_size];
    datagram[..HEADER_SIZE].copy_from_slice(&encode_header(&header));
    datagram
}

/// An Event datagram carrying the given four-character code.
pub(crate) fn event_datagram(session_uid: u64, code: &[u8; 4]) -> Vec<u8> {
    let mut datagram = datagram_for(PacketKind::Event, session_uid);
    datagram[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(code);
    datagram
}
