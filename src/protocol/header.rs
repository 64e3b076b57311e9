//! Packet header parsing.
//!
//! Every F1 2019 telemetry datagram starts with the same 23-byte header,
//! little-endian with no padding between fields. The header's size and layout
//! are fixed independent of packet type, which is what lets the record stage
//! classify datagrams without decoding their bodies.

use super::bytes::ByteReader;
use crate::error::DecodeError;

/// Size in bytes of the header common to every telemetry datagram.
pub const HEADER_SIZE: usize = 23;

/// Header present at the start of every telemetry datagram.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PacketHeader {
    /// Packet format year (2019).
    pub packet_format: u16,
    /// Game major version - "X.00".
    pub game_major_version: u8,
    /// Game minor version - "1.XX".
    pub game_minor_version: u8,
    /// Version of this packet type, all start from 1.
    pub packet_version: u8,
    /// Identifier for the packet type.
    pub packet_id: u8,
    /// Unique identifier for the session.
    pub session_uid: u64,
    /// Session timestamp in seconds.
    pub session_time: f32,
    /// Identifier for the frame the data was retrieved on.
    pub frame_identifier: u32,
    /// Index of the player's car in the packet arrays.
    pub player_car_index: u8,
}

impl PacketHeader {
    /// Parse a header from the start of a datagram.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::TooShort { actual: data.len() });
        }
        let mut r = ByteReader::new(data);
        Ok(Self {
            packet_format: r.u16_le()?,
            game_major_version: r.u8()?,
            game_minor_version: r.u8()?,
            packet_version: r.u8()?,
            packet_id: r.u8()?,
            session_uid: r.u64_le()?,
            session_time: r.f32_le()?,
            frame_identifier: r.u32_le()?,
            player_car_index: r.u8()?,
        })
    }

    /// Session UID rendered as a fixed-width, lowercase hex string.
    ///
    /// SQLite stores 64-bit integers signed only; the hex rendering avoids
    /// any sign-representation ambiguity in stored session identifiers.
    pub fn session_uid_hex(&self) -> String {
        format!("{:016x}", self.session_uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::encode_header;

    #[test]
    fn parses_all_fields_at_their_offsets() {
        let header = PacketHeader {
            packet_format: 2019,
            game_major_version: 1,
            game_minor_version: 22,
            packet_version: 1,
            packet_id: 6,
            session_uid: 0xdead_beef_cafe_f00d,
            session_time: 123.5,
            frame_identifier: 7_777,
            player_car_index: 19,
        };
        let bytes = encode_header(&header);
        assert_eq!(bytes.len(), HEADER_SIZE);

        let parsed = PacketHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_short_buffers() {
        for len in 0..HEADER_SIZE {
            let result = PacketHeader::parse(&vec![0u8; len]);
            assert_eq!(result, Err(DecodeError::TooShort { actual: len }));
        }
    }

    #[test]
    fn session_uid_renders_as_fixed_width_lowercase_hex() {
        let header = PacketHeader { session_uid: 0xABC, ..Default::default() };
        assert_eq!(header.session_uid_hex(), "0000000000000abc");

        let header = PacketHeader { session_uid: u64::MAX, ..Default::default() };
        assert_eq!(header.session_uid_hex(), "ffffffffffffffff");
    }
}
