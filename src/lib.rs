//! Blob Volley - deterministic two-player volleyball match core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, rules, match orchestration)
//! - `codec`: Exact little-endian state codec over generic byte streams
//! - `replay`: Replay container format (record, playback, seeking)
//! - `config`: Match configuration
//!
//! The simulation is single-threaded and runs at a fixed 60 Hz tick. Every
//! quantity is `f32`, so two machines stepping the same inputs from the same
//! state stay bit-identical.

pub mod codec;
pub mod config;
pub mod replay;
pub mod sim;

pub use config::MatchConfig;
pub use sim::{DuelMatch, GameLogic, PhysicWorld};

/// Game constants, in per-tick units.
///
/// The coordinate system is screen-like: x grows to the right, y grows
/// downward, so gravity is positive and jumps are negative velocities.
/// Velocities and accelerations are per tick at the fixed 60 Hz step.
pub mod consts {
    /// Fixed simulation rate; one tick is 1/60 s.
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Court boundaries
    pub const LEFT_PLANE: f32 = 0.0;
    pub const RIGHT_PLANE: f32 = 800.0;

    /// Blob geometry: two stacked collision circles per blob, offset
    /// above/below the blob center.
    pub const BLOBBY_HEIGHT: f32 = 89.0;
    pub const BLOBBY_UPPER_SPHERE: f32 = 19.0;
    pub const BLOBBY_UPPER_RADIUS: f32 = 25.0;
    pub const BLOBBY_LOWER_SPHERE: f32 = 13.0;
    pub const BLOBBY_LOWER_RADIUS: f32 = 33.0;

    /// Blob movement
    pub const BLOBBY_SPEED: f32 = 4.5;
    pub const BLOBBY_JUMP_ACCELERATION: f32 = 15.1;
    /// Holding jump reduces the effective gravity by this much (half of it)
    pub const BLOBBY_JUMP_BUFFER: f32 = 0.44;
    pub const GRAVITATION: f32 = 0.88;
    /// Animation phase advance per tick; the phase cycles within [0, 5)
    pub const BLOBBY_ANIMATION_SPEED: f32 = 0.5;

    /// Ball
    pub const BALL_RADIUS: f32 = 31.5;
    pub const BALL_GRAVITATION: f32 = 0.28;
    /// Ball speed after any blob contact
    pub const BALL_COLLISION_VELOCITY: f32 = 13.125;
    /// Serve rest height of the ball center
    pub const STANDARD_BALL_HEIGHT: f32 = 269.0 + BALL_RADIUS;
    pub const STANDARD_BALL_ANGULAR_VELOCITY: f32 = 0.1;
    /// Vertical velocity retained after a ground bounce
    pub const BALL_GROUND_DAMPING: f32 = 0.5;
    /// Horizontal velocity retained after a ground bounce
    pub const BALL_GROUND_FRICTION: f32 = 0.55;
    /// Speed damping of the velocity component normal to the net top
    pub const NET_TOP_NORMAL_DAMPING: f32 = 0.7;
    /// Speed damping of the velocity component parallel to the net top
    pub const NET_TOP_PARALLEL_DAMPING: f32 = 0.9;
    /// Full-turn wrap of the cosmetic ball rotation
    pub const BALL_ROTATION_WRAP: f32 = 6.25;

    /// Net: a vertical band capped by a sphere
    pub const NET_POSITION_X: f32 = RIGHT_PLANE / 2.0;
    pub const NET_RADIUS: f32 = 7.0;
    /// y coordinate of the net's top sphere center
    pub const NET_SPHERE_POSITION: f32 = 284.0;

    /// Ground
    pub const GROUND_PLANE_HEIGHT_MAX: f32 = 500.0;
    /// Resting height of a blob center
    pub const GROUND_PLANE_HEIGHT: f32 = GROUND_PLANE_HEIGHT_MAX - BLOBBY_HEIGHT / 2.0;

    /// Spawn x positions after a reset
    pub const LEFT_SPAWN_X: f32 = 200.0;
    pub const RIGHT_SPAWN_X: f32 = 600.0;

    /// Ticks during which repeated blob contacts are not counted again
    pub const SQUISH_TOLERANCE: u32 = 10;
    /// Debounce windows for wall/net and dead-ball ground events
    pub const SQUISH_TOLERANCE_WALL: u32 = 10;
    pub const SQUISH_TOLERANCE_GROUND: u32 = 10;

    /// Touches per side before the next contact is a fault
    pub const DEFAULT_TOUCH_LIMIT: u32 = 3;
    pub const DEFAULT_SCORE_TO_WIN: u32 = 25;
}
