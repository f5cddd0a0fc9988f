//! Player sides, per-tick inputs and input sources.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One side of the court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSide {
    Left,
    Right,
}

impl PlayerSide {
    pub const BOTH: [PlayerSide; 2] = [PlayerSide::Left, PlayerSide::Right];

    /// The opposing side.
    pub fn other(self) -> Self {
        match self {
            PlayerSide::Left => PlayerSide::Right,
            PlayerSide::Right => PlayerSide::Left,
        }
    }

    /// Array index for per-side storage (left = 0, right = 1).
    pub fn index(self) -> usize {
        match self {
            PlayerSide::Left => 0,
            PlayerSide::Right => 1,
        }
    }
}

/// One side's intended action for a single tick.
///
/// The flags are not mutually exclusive; callers conventionally suppress
/// simultaneous left+right before handing inputs to the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

impl PlayerInput {
    pub const fn new(left: bool, right: bool, up: bool) -> Self {
        Self { left, right, up }
    }

    /// Pack into the low three bits: left at bit 2, right at bit 1, up at
    /// bit 0. This layout is shared by the state codec and the replay
    /// input stream.
    pub fn pack_bits(self) -> u8 {
        ((self.left as u8) << 2) | ((self.right as u8) << 1) | (self.up as u8)
    }

    /// Inverse of [`pack_bits`](Self::pack_bits); ignores the high bits.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & 0b100 != 0,
            right: bits & 0b010 != 0,
            up: bits & 0b001 != 0,
        }
    }

    /// Mirror left/right, used when swapping court sides.
    pub fn swapped(self) -> Self {
        Self {
            left: self.right,
            right: self.left,
            up: self.up,
        }
    }
}

/// Read-only view of public match state, handed to input sources each tick.
///
/// Bots and lag-compensation heuristics read everything they need from here;
/// the match never exposes itself through a global.
#[derive(Debug, Clone, Copy)]
pub struct MatchView {
    pub ball_position: Vec2,
    pub ball_velocity: Vec2,
    pub blob_position: [Vec2; 2],
    pub blob_velocity: [Vec2; 2],
    pub serving_player: Option<PlayerSide>,
    pub is_ball_valid: bool,
    pub is_game_running: bool,
}

/// Source of one side's input, polled exactly once per tick by the match.
pub trait InputSource {
    fn next_input(&mut self, view: &MatchView) -> PlayerInput;
}

/// Input source that repeats whatever was last stored into it.
///
/// Used for remote matches (the transport stores received inputs between
/// ticks) and as a manual stand-in in tests.
#[derive(Debug, Default)]
pub struct FixedInputSource {
    input: PlayerInput,
}

impl FixedInputSource {
    pub fn new(input: PlayerInput) -> Self {
        Self { input }
    }

    pub fn set_input(&mut self, input: PlayerInput) {
        self.input = input;
    }
}

impl InputSource for FixedInputSource {
    fn next_input(&mut self, _view: &MatchView) -> PlayerInput {
        self.input
    }
}
