//! F1 2019 UDP telemetry protocol: header framing, packet catalogue, decoding.
//!
//! The protocol layer is pure data plus validation: no I/O, no shared mutable
//! state, safe to call from any thread. [`decode`] is the single entry point
//! that turns a raw datagram into a typed packet or rejects it.
//!
//! ## Wire format
//!
//! Datagrams are little-endian, unpadded, fixed-size binary records. Every
//! datagram starts with the same 23-byte [`PacketHeader`]; the
//! `(packet_format, packet_version, packet_id)` triple resolves through the
//! static [`catalogue`] to the packet's kind and exact size. Size validation
//! is strict: a datagram one byte longer or shorter than its registered size
//! is rejected, never partially decoded.

mod bytes;
pub mod catalogue;
pub mod header;
pub mod packets;

pub use catalogue::{CATALOGUE, CatalogueEntry, PacketKind, lookup};
pub use header::{HEADER_SIZE, PacketHeader};
pub use packets::{
    CarMotionData, CarSetupData, CarStatusData, CarTelemetryData, LapData, MarshalZone, NUM_CARS,
    PacketCarSetupData, PacketCarStatusData, PacketCarTelemetryData, PacketEventData,
    PacketLapData, PacketMotionData, PacketParticipantsData, PacketSessionData, ParticipantData,
    TelemetryPacket,
};

use crate::error::DecodeError;
use bytes::ByteReader;

/// Parse only the header of a datagram.
///
/// Fails with [`DecodeError::TooShort`] for anything under [`HEADER_SIZE`]
/// bytes; performs no catalogue or size validation beyond that.
pub fn decode_header(datagram: &[u8]) -> Result<PacketHeader, DecodeError> {
    PacketHeader::parse(datagram)
}

/// Convert a raw UDP datagram into a typed telemetry packet.
///
/// Validation order matches the framing contract:
///
/// 1. [`DecodeError::TooShort`] if the datagram cannot hold a header.
/// 2. [`DecodeError::UnknownType`] if the header triple is not in the
///    catalogue.
/// 3. [`DecodeError::SizeMismatch`] if the datagram length differs from the
///    catalogue's exact size for that kind.
///
/// On success the full body is decoded into the matching
/// [`TelemetryPacket`] variant.
pub fn decode(datagram: &[u8]) -> Result<TelemetryPacket, DecodeError> {
    let header = PacketHeader::parse(datagram)?;

    let entry = lookup(header.packet_format, header.packet_version, header.packet_id).ok_or(
        DecodeError::UnknownType {
            packet_format: header.packet_format,
            packet_version: header.packet_version,
            packet_id: header.packet_id,
        },
    )?;

    if datagram.len() != entry.exact_size {
        return Err(DecodeError::SizeMismatch {
            kind: entry.kind,
            expected: entry.exact_size,
            actual: datagram.len(),
        });
    }

    let mut r = ByteReader::at(datagram, HEADER_SIZE);
    Ok(match entry.kind {
        PacketKind::Motion => {
            TelemetryPacket::Motion(packets::PacketMotionData::parse(header, &mut r)?)
        }
        PacketKind::Session => {
            TelemetryPacket::Session(packets::PacketSessionData::parse(header, &mut r)?)
        }
        PacketKind::LapData => {
            TelemetryPacket::LapData(packets::PacketLapData::parse(header, &mut r)?)
        }
        PacketKind::Event => {
            TelemetryPacket::Event(packets::PacketEventData::parse(header, &mut r)?)
        }
        PacketKind::Participants => {
            TelemetryPacket::Participants(packets::PacketParticipantsData::parse(header, &mut r)?)
        }
        PacketKind::CarSetups => {
            TelemetryPacket::CarSetups(packets::PacketCarSetupData::parse(header, &mut r)?)
        }
        PacketKind::CarTelemetry => {
            TelemetryPacket::CarTelemetry(packets::PacketCarTelemetryData::parse(header, &mut r)?)
        }
        PacketKind::CarStatus => {
            TelemetryPacket::CarStatus(packets::PacketCarStatusData::parse(header, &mut r)?)
        }
    })
}
