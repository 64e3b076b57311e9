//! Typed packet bodies for the 2019 format.
//!
//! Each packet is a flat, fixed-layout struct matching the wire layout
//! field-for-field: little-endian, unpadded, fixed widths. Variants are
//! grouped under the [`TelemetryPacket`] tagged union keyed by the
//! catalogue-resolved kind; there is no type hierarchy and no dynamic
//! dispatch.
//!
//! Field layouts follow the F1 2019 UDP specification (CodeMasters forum
//! post, packet format 2019, all packet versions 1).

use super::bytes::ByteReader;
use super::catalogue::PacketKind;
use super::header::PacketHeader;
use crate::error::DecodeError;

/// Number of car slots in every per-car array (fixed for the 2019 format).
pub const NUM_CARS: usize = 20;

fn parse_array<T: Copy + Default, const N: usize>(
    r: &mut ByteReader<'_>,
    parse: impl Fn(&mut ByteReader<'_>) -> Result<T, DecodeError>,
) -> Result<[T; N], DecodeError> {
    let mut items = [T::default(); N];
    for item in items.iter_mut() {
        *item = parse(r)?;
    }
    Ok(items)
}

fn null_terminated_utf8(bytes: &[u8]) -> String {
    let null_pos = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..null_pos]).to_string()
}

/// Physics data for a single car.
///
/// Normalised direction components are 16-bit signed values; divide by
/// 32767.0 to recover the unit-range float.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarMotionData {
    pub world_position_x: f32,
    pub world_position_y: f32,
    pub world_position_z: f32,
    pub world_velocity_x: f32,
    pub world_velocity_y: f32,
    pub world_velocity_z: f32,
    pub world_forward_dir_x: i16,
    pub world_forward_dir_y: i16,
    pub world_forward_dir_z: i16,
    pub world_right_dir_x: i16,
    pub world_right_dir_y: i16,
    pub world_right_dir_z: i16,
    pub g_force_lateral: f32,
    pub g_force_longitudinal: f32,
    pub g_force_vertical: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl CarMotionData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            world_position_x: r.f32_le()?,
            world_position_y: r.f32_le()?,
            world_position_z: r.f32_le()?,
            world_velocity_x: r.f32_le()?,
            world_velocity_y: r.f32_le()?,
            world_velocity_z: r.f32_le()?,
            world_forward_dir_x: r.i16_le()?,
            world_forward_dir_y: r.i16_le()?,
            world_forward_dir_z: r.i16_le()?,
            world_right_dir_x: r.i16_le()?,
            world_right_dir_y: r.i16_le()?,
            world_right_dir_z: r.i16_le()?,
            g_force_lateral: r.f32_le()?,
            g_force_longitudinal: r.f32_le()?,
            g_force_vertical: r.f32_le()?,
            yaw: r.f32_le()?,
            pitch: r.f32_le()?,
            roll: r.f32_le()?,
        })
    }
}

/// Motion packet (id 0): physics for all cars plus player-only extras.
///
/// All wheel arrays are ordered RL, RR, FL, FR.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketMotionData {
    pub header: PacketHeader,
    pub car_motion_data: [CarMotionData; NUM_CARS],
    pub suspension_position: [f32; 4],
    pub suspension_velocity: [f32; 4],
    pub suspension_acceleration: [f32; 4],
    pub wheel_speed: [f32; 4],
    pub wheel_slip: [f32; 4],
    pub local_velocity_x: f32,
    pub local_velocity_y: f32,
    pub local_velocity_z: f32,
    pub angular_velocity_x: f32,
    pub angular_velocity_y: f32,
    pub angular_velocity_z: f32,
    pub angular_acceleration_x: f32,
    pub angular_acceleration_y: f32,
    pub angular_acceleration_z: f32,
    pub front_wheels_angle: f32,
}

impl PacketMotionData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            header,
            car_motion_data: parse_array(r, CarMotionData::parse)?,
            suspension_position: r.f32_le_array()?,
            suspension_velocity: r.f32_le_array()?,
            suspension_acceleration: r.f32_le_array()?,
            wheel_speed: r.f32_le_array()?,
            wheel_slip: r.f32_le_array()?,
            local_velocity_x: r.f32_le()?,
            local_velocity_y: r.f32_le()?,
            local_velocity_z: r.f32_le()?,
            angular_velocity_x: r.f32_le()?,
            angular_velocity_y: r.f32_le()?,
            angular_velocity_z: r.f32_le()?,
            angular_acceleration_x: r.f32_le()?,
            angular_acceleration_y: r.f32_le()?,
            angular_acceleration_z: r.f32_le()?,
            front_wheels_angle: r.f32_le()?,
        })
    }
}

/// One marshal zone: where it starts and which flag it is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarshalZone {
    /// Fraction (0..1) of the way through the lap the zone starts.
    pub zone_start: f32,
    /// -1 = invalid/unknown, 0 = none, 1 = green, 2 = blue, 3 = yellow, 4 = red.
    pub zone_flag: i8,
}

impl MarshalZone {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { zone_start: r.f32_le()?, zone_flag: r.i8()? })
    }
}

/// Session packet (id 1): details about the session in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketSessionData {
    pub header: PacketHeader,
    /// 0 = clear, 1 = light cloud, 2 = overcast, 3 = light rain,
    /// 4 = heavy rain, 5 = storm.
    pub weather: u8,
    pub track_temperature: i8,
    pub air_temperature: i8,
    pub total_laps: u8,
    /// Track length in metres.
    pub track_length: u16,
    /// 0 = unknown, 1-4 = practice, 5-9 = qualifying, 10-11 = race,
    /// 12 = time trial.
    pub session_type: u8,
    pub track_id: i8,
    /// 0 = F1 Modern, 1 = F1 Classic, 2 = F2, 3 = F1 Generic.
    pub formula: u8,
    pub session_time_left: u16,
    pub session_duration: u16,
    pub pit_speed_limit: u8,
    pub game_paused: u8,
    pub is_spectating: u8,
    pub spectator_car_index: u8,
    pub sli_pro_native_support: u8,
    pub num_marshal_zones: u8,
    pub marshal_zones: [MarshalZone; 21],
    /// 0 = no safety car, 1 = full safety car, 2 = virtual safety car.
    pub safety_car_status: u8,
    /// 0 = offline, 1 = online.
    pub network_game: u8,
}

impl PacketSessionData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            header,
            weather: r.u8()?,
            track_temperature: r.i8()?,
            air_temperature: r.i8()?,
            total_laps: r.u8()?,
            track_length: r.u16_le()?,
            session_type: r.u8()?,
            track_id: r.i8()?,
            formula: r.u8()?,
            session_time_left: r.u16_le()?,
            session_duration: r.u16_le()?,
            pit_speed_limit: r.u8()?,
            game_paused: r.u8()?,
            is_spectating: r.u8()?,
            spectator_car_index: r.u8()?,
            sli_pro_native_support: r.u8()?,
            num_marshal_zones: r.u8()?,
            marshal_zones: parse_array(r, MarshalZone::parse)?,
            safety_car_status: r.u8()?,
            network_game: r.u8()?,
        })
    }
}

/// Lap timing for a single car.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LapData {
    pub last_lap_time: f32,
    pub current_lap_time: f32,
    pub best_lap_time: f32,
    pub sector1_time: f32,
    pub sector2_time: f32,
    /// Metres around the current lap; negative before the line is crossed.
    pub lap_distance: f32,
    pub total_distance: f32,
    pub safety_car_delta: f32,
    pub car_position: u8,
    pub current_lap_num: u8,
    /// 0 = none, 1 = pitting, 2 = in pit area.
    pub pit_status: u8,
    pub sector: u8,
    pub current_lap_invalid: u8,
    pub penalties: u8,
    pub grid_position: u8,
    /// 0 = in garage, 1 = flying lap, 2 = in lap, 3 = out lap, 4 = on track.
    pub driver_status: u8,
    /// 0 = invalid, 1 = inactive, 2 = active, 3 = finished,
    /// 4 = disqualified, 5 = not classified, 6 = retired.
    pub result_status: u8,
}

impl LapData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            last_lap_time: r.f32_le()?,
            current_lap_time: r.f32_le()?,
            best_lap_time: r.f32_le()?,
            sector1_time: r.f32_le()?,
            sector2_time: r.f32_le()?,
            lap_distance: r.f32_le()?,
            total_distance: r.f32_le()?,
            safety_car_delta: r.f32_le()?,
            car_position: r.u8()?,
            current_lap_num: r.u8()?,
            pit_status: r.u8()?,
            sector: r.u8()?,
            current_lap_invalid: r.u8()?,
            penalties: r.u8()?,
            grid_position: r.u8()?,
            driver_status: r.u8()?,
            result_status: r.u8()?,
        })
    }
}

/// Lap data packet (id 2): timing for all cars in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketLapData {
    pub header: PacketHeader,
    pub lap_data: [LapData; NUM_CARS],
}

impl PacketLapData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self { header, lap_data: parse_array(r, LapData::parse)? })
    }
}

/// Event packet (id 3): sent when a session event occurs.
///
/// Known event string codes: `SSTA` session started, `SEND` session ended,
/// `FTLP` fastest lap, `RTMT` retirement, `DRSE`/`DRSD` DRS enabled/disabled,
/// `TMPT` team mate in pits, `CHQF` chequered flag, `RCWN` race winner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketEventData {
    pub header: PacketHeader,
    pub event_string_code: [u8; 4],
    /// Vehicle index; valid for FTLP, RTMT, TMPT, RCWN.
    pub vehicle_idx: u8,
    /// Lap time in seconds; valid for FTLP.
    pub lap_time: f32,
}

impl PacketEventData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            header,
            event_string_code: r.u8_array()?,
            vehicle_idx: r.u8()?,
            lap_time: r.f32_le()?,
        })
    }

    /// The four-character event code as a string.
    pub fn event_code(&self) -> String {
        String::from_utf8_lossy(&self.event_string_code).to_string()
    }
}

/// One participant in the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticipantData {
    /// 1 = AI controlled, 0 = human.
    pub ai_controlled: u8,
    pub driver_id: u8,
    pub team_id: u8,
    pub race_number: u8,
    pub nationality: u8,
    /// UTF-8, null terminated, truncated with U+2026 if too long.
    pub name: [u8; 48],
    /// The player's UDP setting: 0 = restricted, 1 = public.
    pub your_telemetry: u8,
}

impl Default for ParticipantData {
    fn default() -> Self {
        Self {
            ai_controlled: 0,
            driver_id: 0,
            team_id: 0,
            race_number: 0,
            nationality: 0,
            name: [0; 48],
            your_telemetry: 0,
        }
    }
}

impl ParticipantData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ai_controlled: r.u8()?,
            driver_id: r.u8()?,
            team_id: r.u8()?,
            race_number: r.u8()?,
            nationality: r.u8()?,
            name: r.u8_array()?,
            your_telemetry: r.u8()?,
        })
    }

    /// The participant name up to the null terminator.
    pub fn name(&self) -> String {
        null_terminated_utf8(&self.name)
    }
}

/// Participants packet (id 4): the list of cars in the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketParticipantsData {
    pub header: PacketHeader,
    pub num_active_cars: u8,
    pub participants: [ParticipantData; NUM_CARS],
}

impl PacketParticipantsData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            header,
            num_active_cars: r.u8()?,
            participants: parse_array(r, ParticipantData::parse)?,
        })
    }
}

/// Setup for a single car.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarSetupData {
    pub front_wing: u8,
    pub rear_wing: u8,
    pub on_throttle: u8,
    pub off_throttle: u8,
    pub front_camber: f32,
    pub rear_camber: f32,
    pub front_toe: f32,
    pub rear_toe: f32,
    pub front_suspension: u8,
    pub rear_suspension: u8,
    pub front_anti_roll_bar: u8,
    pub rear_anti_roll_bar: u8,
    pub front_suspension_height: u8,
    pub rear_suspension_height: u8,
    pub brake_pressure: u8,
    pub brake_bias: u8,
    pub front_tyre_pressure: f32,
    pub rear_tyre_pressure: f32,
    pub ballast: u8,
    pub fuel_load: f32,
}

impl CarSetupData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            front_wing: r.u8()?,
            rear_wing: r.u8()?,
            on_throttle: r.u8()?,
            off_throttle: r.u8()?,
            front_camber: r.f32_le()?,
            rear_camber: r.f32_le()?,
            front_toe: r.f32_le()?,
            rear_toe: r.f32_le()?,
            front_suspension: r.u8()?,
            rear_suspension: r.u8()?,
            front_anti_roll_bar: r.u8()?,
            rear_anti_roll_bar: r.u8()?,
            front_suspension_height: r.u8()?,
            rear_suspension_height: r.u8()?,
            brake_pressure: r.u8()?,
            brake_bias: r.u8()?,
            front_tyre_pressure: r.f32_le()?,
            rear_tyre_pressure: r.f32_le()?,
            ballast: r.u8()?,
            fuel_load: r.f32_le()?,
        })
    }
}

/// Car setups packet (id 5).
#[derive(Debug, Clone, PartialEq)]
pub struct PacketCarSetupData {
    pub header: PacketHeader,
    pub car_setups: [CarSetupData; NUM_CARS],
}

impl PacketCarSetupData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self { header, car_setups: parse_array(r, CarSetupData::parse)? })
    }
}

/// Telemetry for a single car.
///
/// All wheel arrays are ordered RL, RR, FL, FR.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarTelemetryData {
    /// Speed in km/h.
    pub speed: u16,
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
    pub clutch: u8,
    /// Gear selected: 1-8, N = 0, R = -1.
    pub gear: i8,
    pub engine_rpm: u16,
    pub drs: u8,
    pub rev_lights_percent: u8,
    pub brakes_temperature: [u16; 4],
    pub tyres_surface_temperature: [u16; 4],
    pub tyres_inner_temperature: [u16; 4],
    pub engine_temperature: u16,
    pub tyres_pressure: [f32; 4],
    pub surface_type: [u8; 4],
}

impl CarTelemetryData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            speed: r.u16_le()?,
            throttle: r.f32_le()?,
            steer: r.f32_le()?,
            brake: r.f32_le()?,
            clutch: r.u8()?,
            gear: r.i8()?,
            engine_rpm: r.u16_le()?,
            drs: r.u8()?,
            rev_lights_percent: r.u8()?,
            brakes_temperature: r.u16_le_array()?,
            tyres_surface_temperature: r.u16_le_array()?,
            tyres_inner_temperature: r.u16_le_array()?,
            engine_temperature: r.u16_le()?,
            tyres_pressure: r.f32_le_array()?,
            surface_type: r.u8_array()?,
        })
    }
}

/// Car telemetry packet (id 6).
#[derive(Debug, Clone, PartialEq)]
pub struct PacketCarTelemetryData {
    pub header: PacketHeader,
    pub car_telemetry_data: [CarTelemetryData; NUM_CARS],
    /// Bit flags for currently pressed buttons.
    pub button_status: u32,
}

impl PacketCarTelemetryData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self {
            header,
            car_telemetry_data: parse_array(r, CarTelemetryData::parse)?,
            button_status: r.u32_le()?,
        })
    }
}

/// Status for a single car.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarStatusData {
    pub traction_control: u8,
    pub anti_lock_brakes: u8,
    /// 0 = lean, 1 = standard, 2 = rich, 3 = max.
    pub fuel_mix: u8,
    pub front_brake_bias: u8,
    pub pit_limiter_status: u8,
    pub fuel_in_tank: f32,
    pub fuel_capacity: f32,
    pub fuel_remaining_laps: f32,
    pub max_rpm: u16,
    pub idle_rpm: u16,
    pub max_gears: u8,
    pub drs_allowed: u8,
    pub tyres_wear: [u8; 4],
    pub actual_tyre_compound: u8,
    pub tyre_visual_compound: u8,
    pub tyres_damage: [u8; 4],
    pub front_left_wing_damage: u8,
    pub front_right_wing_damage: u8,
    pub rear_wing_damage: u8,
    pub engine_damage: u8,
    pub gear_box_damage: u8,
    /// -1 = invalid/unknown, 0 = none, 1 = green, 2 = blue, 3 = yellow, 4 = red.
    pub vehicle_fia_flags: i8,
    pub ers_store_energy: f32,
    /// 0 = none, 1 = low, 2 = medium, 3 = high, 4 = overtake, 5 = hotlap.
    pub ers_deploy_mode: u8,
    pub ers_harvested_this_lap_mguk: f32,
    pub ers_harvested_this_lap_mguh: f32,
    pub ers_deployed_this_lap: f32,
}

impl CarStatusData {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            traction_control: r.u8()?,
            anti_lock_brakes: r.u8()?,
            fuel_mix: r.u8()?,
            front_brake_bias: r.u8()?,
            pit_limiter_status: r.u8()?,
            fuel_in_tank: r.f32_le()?,
            fuel_capacity: r.f32_le()?,
            fuel_remaining_laps: r.f32_le()?,
            max_rpm: r.u16_le()?,
            idle_rpm: r.u16_le()?,
            max_gears: r.u8()?,
            drs_allowed: r.u8()?,
            tyres_wear: r.u8_array()?,
            actual_tyre_compound: r.u8()?,
            tyre_visual_compound: r.u8()?,
            tyres_damage: r.u8_array()?,
            front_left_wing_damage: r.u8()?,
            front_right_wing_damage: r.u8()?,
            rear_wing_damage: r.u8()?,
            engine_damage: r.u8()?,
            gear_box_damage: r.u8()?,
            vehicle_fia_flags: r.i8()?,
            ers_store_energy: r.f32_le()?,
            ers_deploy_mode: r.u8()?,
            ers_harvested_this_lap_mguk: r.f32_le()?,
            ers_harvested_this_lap_mguh: r.f32_le()?,
            ers_deployed_this_lap: r.f32_le()?,
        })
    }
}

/// Car status packet (id 7).
#[derive(Debug, Clone, PartialEq)]
pub struct PacketCarStatusData {
    pub header: PacketHeader,
    pub car_status_data: [CarStatusData; NUM_CARS],
}

impl PacketCarStatusData {
    pub(super) fn parse(
        header: PacketHeader,
        r: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(Self { header, car_status_data: parse_array(r, CarStatusData::parse)? })
    }
}

/// A fully decoded telemetry packet, tagged by its catalogue kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryPacket {
    Motion(PacketMotionData),
    Session(PacketSessionData),
    LapData(PacketLapData),
    Event(PacketEventData),
    Participants(PacketParticipantsData),
    CarSetups(PacketCarSetupData),
    CarTelemetry(PacketCarTelemetryData),
    CarStatus(PacketCarStatusData),
}

impl TelemetryPacket {
    /// The header shared by every packet variant.
    pub fn header(&self) -> &PacketHeader {
        match self {
            TelemetryPacket::Motion(p) => &p.header,
            TelemetryPacket::Session(p) => &p.header,
            TelemetryPacket::LapData(p) => &p.header,
            TelemetryPacket::Event(p) => &p.header,
            TelemetryPacket::Participants(p) => &p.header,
            TelemetryPacket::CarSetups(p) => &p.header,
            TelemetryPacket::CarTelemetry(p) => &p.header,
            TelemetryPacket::CarStatus(p) => &p.header,
        }
    }

    /// The catalogue kind of this packet.
    pub fn kind(&self) -> PacketKind {
        match self {
            TelemetryPacket::Motion(_) => PacketKind::Motion,
            TelemetryPacket::Session(_) => PacketKind::Session,
            TelemetryPacket::LapData(_) => PacketKind::LapData,
            TelemetryPacket::Event(_) => PacketKind::Event,
            TelemetryPacket::Participants(_) => PacketKind::Participants,
            TelemetryPacket::CarSetups(_) => PacketKind::CarSetups,
            TelemetryPacket::CarTelemetry(_) => PacketKind::CarTelemetry,
            TelemetryPacket::CarStatus(_) => PacketKind::CarStatus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HEADER_SIZE, decode};
    use crate::test_utils::{datagram_for, encode_header};

    #[test]
    fn car_telemetry_fields_land_at_their_offsets() {
        let mut datagram = datagram_for(PacketKind::CarTelemetry, 0xabc);

        // Car 0 starts right after the header: speed u16, throttle f32,
        // steer f32, brake f32, clutch u8, gear i8, engine_rpm u16.
        let base = HEADER_SIZE;
        datagram[base..base + 2].copy_from_slice(&301u16.to_le_bytes());
        datagram[base + 2..base + 6].copy_from_slice(&0.75f32.to_le_bytes());
        datagram[base + 15] = 7; // gear (i8 at offset 15 within the entry)
        datagram[base + 16..base + 18].copy_from_slice(&11_900u16.to_le_bytes());

        // Car 1 speed, one 66-byte entry later.
        let car1 = base + 66;
        datagram[car1..car1 + 2].copy_from_slice(&250u16.to_le_bytes());

        // button_status trails the car array.
        let buttons = base + NUM_CARS * 66;
        datagram[buttons..buttons + 4].copy_from_slice(&0x0000_0101u32.to_le_bytes());

        let packet = match decode(&datagram).unwrap() {
            TelemetryPacket::CarTelemetry(p) => p,
            other => panic!("expected CarTelemetry, got {:?}", other.kind()),
        };
        assert_eq!(packet.car_telemetry_data[0].speed, 301);
        assert_eq!(packet.car_telemetry_data[0].throttle, 0.75);
        assert_eq!(packet.car_telemetry_data[0].gear, 7);
        assert_eq!(packet.car_telemetry_data[0].engine_rpm, 11_900);
        assert_eq!(packet.car_telemetry_data[1].speed, 250);
        assert_eq!(packet.button_status, 0x0000_0101);
    }

    #[test]
    fn session_packet_marshal_zones_follow_scalar_fields() {
        let mut datagram = datagram_for(PacketKind::Session, 1);

        let base = HEADER_SIZE;
        datagram[base] = 4; // weather: heavy rain
        datagram[base + 1] = 0x24; // track temperature 36
        datagram[base + 4..base + 6].copy_from_slice(&5_891u16.to_le_bytes()); // track length
        datagram[base + 18] = 3; // num marshal zones

        // First marshal zone: start fraction f32 + flag i8.
        let zones = base + 19;
        datagram[zones..zones + 4].copy_from_slice(&0.25f32.to_le_bytes());
        datagram[zones + 4] = 3; // yellow

        let packet = match decode(&datagram).unwrap() {
            TelemetryPacket::Session(p) => p,
            other => panic!("expected Session, got {:?}", other.kind()),
        };
        assert_eq!(packet.weather, 4);
        assert_eq!(packet.track_temperature, 36);
        assert_eq!(packet.track_length, 5_891);
        assert_eq!(packet.num_marshal_zones, 3);
        assert_eq!(packet.marshal_zones[0].zone_start, 0.25);
        assert_eq!(packet.marshal_zones[0].zone_flag, 3);
        assert_eq!(packet.marshal_zones[1].zone_flag, 0);
    }

    #[test]
    fn event_packet_exposes_its_code() {
        let mut datagram = datagram_for(PacketKind::Event, 9);
        datagram[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(b"FTLP");
        datagram[HEADER_SIZE + 4] = 14; // vehicle index
        datagram[HEADER_SIZE + 5..HEADER_SIZE + 9].copy_from_slice(&71.204f32.to_le_bytes());

        let packet = match decode(&datagram).unwrap() {
            TelemetryPacket::Event(p) => p,
            other => panic!("expected Event, got {:?}", other.kind()),
        };
        assert_eq!(packet.event_code(), "FTLP");
        assert_eq!(packet.vehicle_idx, 14);
        assert_eq!(packet.lap_time, 71.204);
    }

    #[test]
    fn participant_names_stop_at_the_null_terminator() {
        let mut datagram = datagram_for(PacketKind::Participants, 2);
        datagram[HEADER_SIZE] = 1; // num active cars

        // First participant entry: 5 scalar bytes, then the 48-byte name.
        let name_offset = HEADER_SIZE + 1 + 5;
        datagram[name_offset..name_offset + 9].copy_from_slice(b"VERSTAPPE");

        let packet = match decode(&datagram).unwrap() {
            TelemetryPacket::Participants(p) => p,
            other => panic!("expected Participants, got {:?}", other.kind()),
        };
        assert_eq!(packet.num_active_cars, 1);
        assert_eq!(packet.participants[0].name(), "VERSTAPPE");
        assert_eq!(packet.participants[1].name(), "");
    }

    #[test]
    fn motion_packet_player_extras_follow_the_car_array() {
        let mut datagram = datagram_for(PacketKind::Motion, 3);

        // Car 0 world position.
        let base = HEADER_SIZE;
        datagram[base..base + 4].copy_from_slice(&(-51.25f32).to_le_bytes());

        // front_wheels_angle is the very last field of the packet.
        let last = datagram.len() - 4;
        datagram[last..].copy_from_slice(&0.125f32.to_le_bytes());

        let packet = match decode(&datagram).unwrap() {
            TelemetryPacket::Motion(p) => p,
            other => panic!("expected Motion, got {:?}", other.kind()),
        };
        assert_eq!(packet.car_motion_data[0].world_position_x, -51.25);
        assert_eq!(packet.front_wheels_angle, 0.125);
    }

    #[test]
    fn packet_header_is_preserved_in_every_variant() {
        let header = crate::protocol::PacketHeader {
            packet_format: 2019,
            packet_version: 1,
            packet_id: 7,
            session_uid: 0x1122_3344_5566_7788,
            session_time: 62.5,
            frame_identifier: 990,
            player_car_index: 2,
            ..Default::default()
        };
        let mut datagram = vec![0u8; 1143];
        datagram[..HEADER_SIZE].copy_from_slice(&encode_header(&header));

        let packet = decode(&datagram).unwrap();
        assert_eq!(packet.kind(), PacketKind::CarStatus);
        assert_eq!(packet.header(), &header);
        assert_eq!(packet.header().session_uid_hex(), "1122334455667788");
    }
}
