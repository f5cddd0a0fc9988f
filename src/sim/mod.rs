//! Deterministic match simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one call, one tick)
//! - `f32` arithmetic end to end, no platform-dependent promotion
//! - No I/O, no globals, no allocation in the per-tick path
//!
//! `PhysicWorld` produces raw physical events, `GameLogic` turns them into
//! score and serve decisions, and `DuelMatch` orchestrates both and is the
//! only type external callers normally hold.

pub mod duel;
pub mod events;
pub mod input;
pub mod logic;
pub mod state;
pub mod world;

pub use duel::DuelMatch;
pub use events::{MatchEvent, PhysicEvents};
pub use input::{FixedInputSource, InputSource, MatchView, PlayerInput, PlayerSide};
pub use logic::{GameLogic, Ruleset};
pub use state::{DuelMatchState, GameLogicState, PhysicState};
pub use world::PhysicWorld;
