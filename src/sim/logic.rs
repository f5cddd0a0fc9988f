//! Scoring rules: touch counting, faults, serve rotation, win detection.
//!
//! The logic is driven exclusively by events surfaced from the physics; it
//! never inspects court geometry itself.

use serde::{Deserialize, Serialize};

use super::input::PlayerSide;
use super::state::GameLogicState;
use crate::consts::*;

/// The two supported rule variants.
///
/// A closed enum rather than a trait object: the set is fixed, the match
/// statements stay exhaustively checkable, and the per-tick path stays free
/// of dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Ruleset {
    /// Side-out scoring: only the serving side can score, and winning takes
    /// a two-point margin.
    Classic,
    /// Rally scoring: every fault scores for the opponent; first to the
    /// target score wins outright.
    #[default]
    Rally,
}

/// Rule state machine for one match.
///
/// Faults are reported through [`take_last_error`](GameLogic::take_last_error),
/// which is read-and-clear: the orchestrator polls it exactly once per tick,
/// and nothing else may.
#[derive(Debug, Clone)]
pub struct GameLogic {
    ruleset: Ruleset,
    score_to_win: u32,
    touch_limit: u32,
    scores: [u32; 2],
    touches: [u32; 2],
    /// Per-side countdown suppressing re-counted blob contacts
    squish: [u32; 2],
    /// Debounce countdowns for wall/net and dead-ball ground events
    squish_wall: u32,
    squish_ground: u32,
    serving_player: Option<PlayerSide>,
    winning_player: Option<PlayerSide>,
    last_error: Option<PlayerSide>,
}

impl GameLogic {
    /// A fresh logic instance. `score_to_win` must be positive; validating
    /// configuration is the caller's job (see [`crate::config`]).
    pub fn new(ruleset: Ruleset, score_to_win: u32) -> Self {
        Self {
            ruleset,
            score_to_win,
            touch_limit: DEFAULT_TOUCH_LIMIT,
            scores: [0, 0],
            touches: [0, 0],
            squish: [0, 0],
            squish_wall: 0,
            squish_ground: 0,
            serving_player: None,
            winning_player: None,
            last_error: None,
        }
    }

    /// Override the touch limit (rule-variant experiments and tests).
    pub fn with_touch_limit(mut self, touch_limit: u32) -> Self {
        self.touch_limit = touch_limit;
        self
    }

    /// Advance the per-tick timers. Must be called once per simulated tick.
    pub fn step(&mut self) {
        for squish in &mut self.squish {
            *squish = squish.saturating_sub(1);
        }
        self.squish_wall = self.squish_wall.saturating_sub(1);
        self.squish_ground = self.squish_ground.saturating_sub(1);
    }

    /// A blob touched the ball. Returns whether the contact was counted;
    /// contacts inside the squish window are duplicates of the previous one
    /// and are ignored.
    pub fn on_ball_hits_blob(&mut self, side: PlayerSide) -> bool {
        if self.winning_player.is_some() {
            return false;
        }
        let i = side.index();
        if self.squish[i] > 0 {
            return false;
        }
        self.squish[i] = SQUISH_TOLERANCE;

        self.touches[side.other().index()] = 0;
        self.touches[i] += 1;
        if self.touches[i] > self.touch_limit {
            self.on_error(side);
        }
        true
    }

    /// The ball touched the ground on the given half while in play.
    pub fn on_ball_hits_ground(&mut self, side: PlayerSide) {
        if self.winning_player.is_some() {
            return;
        }
        self.on_error(side);
    }

    /// Whether a wall/net contact should surface as a presentation event.
    /// Debounced so a ball scraping along the net does not fire every tick.
    pub fn register_wall_hit(&mut self) -> bool {
        if self.squish_wall > 0 {
            return false;
        }
        self.squish_wall = SQUISH_TOLERANCE_WALL;
        true
    }

    /// Whether a dead-ball ground bounce should surface as an event.
    pub fn register_ground_bounce(&mut self) -> bool {
        if self.squish_ground > 0 {
            return false;
        }
        self.squish_ground = SQUISH_TOLERANCE_GROUND;
        true
    }

    fn on_error(&mut self, side: PlayerSide) {
        self.last_error = Some(side);

        self.touches = [0, 0];
        self.squish = [0, 0];
        self.squish_wall = 0;
        self.squish_ground = 0;

        let winner = side.other();
        let scored = match self.ruleset {
            Ruleset::Classic => self.serving_player == Some(winner),
            Ruleset::Rally => true,
        };
        if scored {
            self.scores[winner.index()] += 1;
        }
        self.serving_player = Some(winner);
        self.check_win(winner);
    }

    fn check_win(&mut self, side: PlayerSide) {
        if self.winning_player.is_some() {
            return;
        }
        let own = self.scores[side.index()];
        let other = self.scores[side.other().index()];
        let won = match self.ruleset {
            Ruleset::Classic => own >= self.score_to_win && own >= other + 2,
            Ruleset::Rally => own >= self.score_to_win,
        };
        if won {
            self.winning_player = Some(side);
        }
    }

    pub fn score(&self, side: PlayerSide) -> u32 {
        self.scores[side.index()]
    }

    /// Externally injected score (network authority). Re-evaluates the win
    /// condition for the given side.
    pub fn set_score(&mut self, side: PlayerSide, score: u32) {
        self.scores[side.index()] = score;
        self.check_win(side);
    }

    /// Touches by this side since the last serve or opposing touch.
    pub fn hits(&self, side: PlayerSide) -> u32 {
        self.touches[side.index()]
    }

    pub fn serving_player(&self) -> Option<PlayerSide> {
        self.serving_player
    }

    pub fn set_serving_player(&mut self, side: Option<PlayerSide>) {
        self.serving_player = side;
    }

    /// The winner, if the match has ended. Stable once set.
    pub fn winning_player(&self) -> Option<PlayerSide> {
        self.winning_player
    }

    pub fn score_to_win(&self) -> u32 {
        self.score_to_win
    }

    pub fn ruleset(&self) -> Ruleset {
        self.ruleset
    }

    /// The side that committed the most recent fault, clearing it.
    ///
    /// Single-consumer: the orchestrator polls this once per tick; anything
    /// else reading it would swallow error notifications.
    pub fn take_last_error(&mut self) -> Option<PlayerSide> {
        self.last_error.take()
    }

    /// The pending fault without consuming it (snapshots only).
    pub(crate) fn pending_error(&self) -> Option<PlayerSide> {
        self.last_error
    }

    pub(crate) fn set_pending_error(&mut self, error: Option<PlayerSide>) {
        self.last_error = error;
    }

    /// Snapshot the rule state.
    pub fn state(&self) -> GameLogicState {
        GameLogicState {
            scores: self.scores,
            touches: self.touches,
            squish: self.squish,
            squish_wall: self.squish_wall,
            squish_ground: self.squish_ground,
            serving_player: self.serving_player,
            winning_player: self.winning_player,
            score_to_win: self.score_to_win,
        }
    }

    /// Restore a snapshot, including open squish windows and touch counts.
    pub fn set_state(&mut self, state: &GameLogicState) {
        self.scores = state.scores;
        self.touches = state.touches;
        self.squish = state.squish;
        self.squish_wall = state.squish_wall;
        self.squish_ground = state.squish_ground;
        self.serving_player = state.serving_player;
        self.winning_player = state.winning_player;
        self.score_to_win = state.score_to_win;
    }
}
