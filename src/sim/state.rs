//! Flat value snapshots of the match, and their exact wire encoding.
//!
//! Snapshots are created on demand for replays and network resync; nothing
//! retains them. Each struct documents its codec field order; changing the
//! order is a wire-format break.

use std::io::{self, Read, Write};

use glam::Vec2;

use crate::codec::{
    StreamCodec, read_bool, read_f32, read_side, read_u32, read_u8, read_vec2, write_bool,
    write_f32, write_side, write_u32, write_u8, write_vec2,
};
use crate::consts::*;
use super::input::{PlayerInput, PlayerSide};

/// Full kinematic snapshot of the court.
///
/// Codec order: left blob position/velocity, right blob position/velocity,
/// both animation phases, ball position, ball velocity, ball rotation, ball
/// angular velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicState {
    pub blob_position: [Vec2; 2],
    pub blob_velocity: [Vec2; 2],
    pub blob_state: [f32; 2],
    pub ball_position: Vec2,
    pub ball_velocity: Vec2,
    pub ball_rotation: f32,
    pub ball_angular_velocity: f32,
}

impl Default for PhysicState {
    fn default() -> Self {
        Self {
            blob_position: [
                Vec2::new(LEFT_SPAWN_X, GROUND_PLANE_HEIGHT),
                Vec2::new(RIGHT_SPAWN_X, GROUND_PLANE_HEIGHT),
            ],
            blob_velocity: [Vec2::ZERO; 2],
            blob_state: [0.0; 2],
            ball_position: Vec2::new(NET_POSITION_X, 450.0),
            ball_velocity: Vec2::ZERO,
            ball_rotation: 0.0,
            ball_angular_velocity: STANDARD_BALL_ANGULAR_VELOCITY,
        }
    }
}

impl PhysicState {
    /// Mirror the court: blobs trade places, horizontal motion flips.
    pub fn swap_sides(&mut self) {
        for position in &mut self.blob_position {
            position.x = RIGHT_PLANE - position.x;
        }
        self.blob_position.swap(0, 1);
        for velocity in &mut self.blob_velocity {
            velocity.x = -velocity.x;
        }
        self.blob_velocity.swap(0, 1);
        self.blob_state.swap(0, 1);

        self.ball_position.x = RIGHT_PLANE - self.ball_position.x;
        self.ball_velocity.x = -self.ball_velocity.x;
        self.ball_angular_velocity = -self.ball_angular_velocity;
    }
}

impl StreamCodec for PhysicState {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_vec2(writer, self.blob_position[0])?;
        write_vec2(writer, self.blob_velocity[0])?;
        write_vec2(writer, self.blob_position[1])?;
        write_vec2(writer, self.blob_velocity[1])?;
        write_f32(writer, self.blob_state[0])?;
        write_f32(writer, self.blob_state[1])?;
        write_vec2(writer, self.ball_position)?;
        write_vec2(writer, self.ball_velocity)?;
        write_f32(writer, self.ball_rotation)?;
        write_f32(writer, self.ball_angular_velocity)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let blob_position_left = read_vec2(reader)?;
        let blob_velocity_left = read_vec2(reader)?;
        let blob_position_right = read_vec2(reader)?;
        let blob_velocity_right = read_vec2(reader)?;
        let blob_state_left = read_f32(reader)?;
        let blob_state_right = read_f32(reader)?;
        Ok(Self {
            blob_position: [blob_position_left, blob_position_right],
            blob_velocity: [blob_velocity_left, blob_velocity_right],
            blob_state: [blob_state_left, blob_state_right],
            ball_position: read_vec2(reader)?,
            ball_velocity: read_vec2(reader)?,
            ball_rotation: read_f32(reader)?,
            ball_angular_velocity: read_f32(reader)?,
        })
    }
}

/// Rule-layer snapshot.
///
/// Codec order: scores, touches, squish counters, wall/ground squish,
/// serving side, winning side, score to win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLogicState {
    pub scores: [u32; 2],
    pub touches: [u32; 2],
    pub squish: [u32; 2],
    pub squish_wall: u32,
    pub squish_ground: u32,
    pub serving_player: Option<PlayerSide>,
    pub winning_player: Option<PlayerSide>,
    pub score_to_win: u32,
}

impl Default for GameLogicState {
    fn default() -> Self {
        Self {
            scores: [0, 0],
            touches: [0, 0],
            squish: [0, 0],
            squish_wall: 0,
            squish_ground: 0,
            serving_player: None,
            winning_player: None,
            score_to_win: DEFAULT_SCORE_TO_WIN,
        }
    }
}

impl GameLogicState {
    pub fn swap_sides(&mut self) {
        self.scores.swap(0, 1);
        self.touches.swap(0, 1);
        self.squish.swap(0, 1);
        self.serving_player = self.serving_player.map(PlayerSide::other);
        self.winning_player = self.winning_player.map(PlayerSide::other);
    }
}

impl StreamCodec for GameLogicState {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u32(writer, self.scores[0])?;
        write_u32(writer, self.scores[1])?;
        write_u32(writer, self.touches[0])?;
        write_u32(writer, self.touches[1])?;
        write_u32(writer, self.squish[0])?;
        write_u32(writer, self.squish[1])?;
        write_u32(writer, self.squish_wall)?;
        write_u32(writer, self.squish_ground)?;
        write_side(writer, self.serving_player)?;
        write_side(writer, self.winning_player)?;
        write_u32(writer, self.score_to_win)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            scores: [read_u32(reader)?, read_u32(reader)?],
            touches: [read_u32(reader)?, read_u32(reader)?],
            squish: [read_u32(reader)?, read_u32(reader)?],
            squish_wall: read_u32(reader)?,
            squish_ground: read_u32(reader)?,
            serving_player: read_side(reader)?,
            winning_player: read_side(reader)?,
            score_to_win: read_u32(reader)?,
        })
    }
}

impl StreamCodec for PlayerInput {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u8(writer, self.pack_bits())
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        let bits = read_u8(reader)?;
        if bits & !0b111 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid input byte {bits:#04x}"),
            ));
        }
        Ok(Self::from_bits(bits))
    }
}

/// The complete match: physics, rules, last inputs, pending fault and the
/// two orchestrator flags. This is the unit of network resynchronization.
///
/// Codec order: physic state, logic state, left input, right input, pending
/// error side, ball-valid flag, game-running flag, ball-down flag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DuelMatchState {
    pub world_state: PhysicState,
    pub logic_state: GameLogicState,
    pub player_input: [PlayerInput; 2],
    pub error_side: Option<PlayerSide>,
    pub is_ball_valid: bool,
    pub is_game_running: bool,
    pub is_ball_down: bool,
}

impl DuelMatchState {
    pub fn swap_sides(&mut self) {
        self.world_state.swap_sides();
        self.logic_state.swap_sides();
        self.player_input = [
            self.player_input[1].swapped(),
            self.player_input[0].swapped(),
        ];
        self.error_side = self.error_side.map(PlayerSide::other);
    }
}

impl StreamCodec for DuelMatchState {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.world_state.encode(writer)?;
        self.logic_state.encode(writer)?;
        self.player_input[0].encode(writer)?;
        self.player_input[1].encode(writer)?;
        write_side(writer, self.error_side)?;
        write_bool(writer, self.is_ball_valid)?;
        write_bool(writer, self.is_game_running)?;
        write_bool(writer, self.is_ball_down)
    }

    fn decode<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            world_state: PhysicState::decode(reader)?,
            logic_state: GameLogicState::decode(reader)?,
            player_input: [PlayerInput::decode(reader)?, PlayerInput::decode(reader)?],
            error_side: read_side(reader)?,
            is_ball_valid: read_bool(reader)?,
            is_game_running: read_bool(reader)?,
            is_ball_down: read_bool(reader)?,
        })
    }
}

/// Encode into a fresh byte buffer; convenience for network senders.
pub fn to_bytes<T: StreamCodec>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value
        .encode(&mut buf)
        .expect("writing to a Vec cannot fail");
    buf
}

/// Decode from a byte slice, requiring every byte to be consumed.
pub fn from_bytes<T: StreamCodec>(bytes: &[u8]) -> io::Result<T> {
    let mut cursor = io::Cursor::new(bytes);
    let value = T::decode(&mut cursor)?;
    if cursor.position() != bytes.len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "trailing bytes after state",
        ));
    }
    Ok(value)
}
