//! Match orchestration: one `PhysicWorld`, one `GameLogic`, one tick per call.
//!
//! `DuelMatch` is the only type external callers normally hold. It owns the
//! ball-validity and game-running flags, converts input-source values into
//! physics inputs, routes physics events into the rules, and aggregates the
//! tick's `MatchEvent` list for consumers (rendering, network, replays).

use glam::Vec2;

use super::events::{MatchEvent, PhysicEvents};
use super::input::{InputSource, MatchView, PlayerInput, PlayerSide};
use super::logic::GameLogic;
use super::state::DuelMatchState;
use super::world::PhysicWorld;
use crate::config::MatchConfig;
use crate::consts::SQUISH_TOLERANCE;

/// A single match between two players.
///
/// In the default local mode the match is authoritative: faults and scores
/// are computed from local physics. In remote mode physics still runs (for
/// client-side prediction) but scoring, serving and resets are applied only
/// from injected events; the authority lives with the peer.
pub struct DuelMatch {
    world: PhysicWorld,
    logic: GameLogic,
    input_sources: [Option<Box<dyn InputSource>>; 2],
    last_input: [PlayerInput; 2],
    is_ball_valid: bool,
    is_game_running: bool,
    is_ball_down: bool,
    remote: bool,
    paused: bool,
    events: Vec<MatchEvent>,
    injected: Vec<MatchEvent>,
    /// Presentation debounce for blob contacts in remote mode, where the
    /// rules layer is not consulted.
    remote_blob_squish: [u32; 2],
}

impl DuelMatch {
    /// A local, authoritative match pulling inputs from the two sources.
    pub fn new(
        config: &MatchConfig,
        left_source: Box<dyn InputSource>,
        right_source: Box<dyn InputSource>,
    ) -> Self {
        let mut duel = Self::empty(config, [Some(left_source), Some(right_source)], false);
        log::info!(
            "starting match: {:?} to {} points, {:?} serves",
            config.ruleset,
            config.score_to_win,
            config.starting_side
        );
        duel.world.reset(Some(config.starting_side));
        duel
    }

    /// A prediction-only match for networked clients. Inputs arrive through
    /// [`set_input`](Self::set_input); authority through
    /// [`inject_event`](Self::inject_event), [`set_score`](Self::set_score)
    /// and [`set_state`](Self::set_state).
    pub fn new_remote(config: &MatchConfig) -> Self {
        let mut duel = Self::empty(config, [None, None], true);
        duel.world.reset(Some(config.starting_side));
        duel
    }

    fn empty(
        config: &MatchConfig,
        input_sources: [Option<Box<dyn InputSource>>; 2],
        remote: bool,
    ) -> Self {
        let mut logic = GameLogic::new(config.ruleset, config.score_to_win);
        logic.set_serving_player(Some(config.starting_side));
        Self {
            world: PhysicWorld::new(),
            logic,
            input_sources,
            last_input: [PlayerInput::default(); 2],
            is_ball_valid: true,
            is_game_running: false,
            is_ball_down: false,
            remote,
            paused: false,
            events: Vec::new(),
            injected: Vec::new(),
            remote_blob_squish: [0; 2],
        }
    }

    /// Advance the match by one tick.
    ///
    /// While paused this does nothing; the previous tick's events remain
    /// queryable. Never fails.
    pub fn step(&mut self) {
        if self.paused {
            return;
        }
        self.events.clear();

        // Wind down the previous rally before anything else moves. A remote
        // match waits for the authority's reset instead.
        if self.is_ball_down && !self.remote {
            self.is_ball_down = false;
            let serving = self.logic.serving_player().unwrap_or(PlayerSide::Left);
            self.world.reset(Some(serving));
            self.is_ball_valid = true;
            self.is_game_running = false;
            self.events.push(MatchEvent::BallReset(serving));
        }

        let view = self.view();
        for i in 0..2 {
            if let Some(source) = self.input_sources[i].as_mut() {
                self.last_input[i] = source.next_input(&view);
            }
        }

        self.logic.step();
        for squish in &mut self.remote_blob_squish {
            *squish = squish.saturating_sub(1);
        }

        let physic_events = self.world.step(
            self.last_input[0],
            self.last_input[1],
            self.is_ball_valid,
            self.is_game_running,
        );

        for side in PlayerSide::BOTH {
            if physic_events.contains(PhysicEvents::blob_hit(side)) {
                // The first touch of a serve puts the ball in play.
                self.is_game_running = true;
                if self.remote {
                    let i = side.index();
                    if self.remote_blob_squish[i] == 0 {
                        self.remote_blob_squish[i] = SQUISH_TOLERANCE;
                        self.events.push(MatchEvent::BallHitBlob(side));
                    }
                } else if self.logic.on_ball_hits_blob(side) {
                    self.events.push(MatchEvent::BallHitBlob(side));
                }
            }
        }

        for side in PlayerSide::BOTH {
            if physic_events.contains(PhysicEvents::ground_hit(side)) {
                if !self.remote && self.is_ball_valid {
                    self.logic.on_ball_hits_ground(side);
                    self.events.push(MatchEvent::BallHitGround(side));
                } else if self.logic.register_ground_bounce() {
                    // Dead ball bouncing out; debounced presentation only.
                    self.events.push(MatchEvent::BallHitGround(side));
                }
            }
        }

        for side in PlayerSide::BOTH {
            if physic_events.contains(PhysicEvents::wall_hit(side)) && self.logic.register_wall_hit()
            {
                self.events.push(MatchEvent::BallHitWall(side));
            }
            if physic_events.contains(PhysicEvents::net_side_hit(side))
                && self.logic.register_wall_hit()
            {
                self.events.push(MatchEvent::BallHitNetSide(side));
            }
        }
        if physic_events.contains(PhysicEvents::BALL_HIT_NET_TOP) && self.logic.register_wall_hit()
        {
            self.events.push(MatchEvent::BallHitNetTop);
        }

        if !self.remote {
            // The single permitted poll of the read-and-clear error flag.
            if let Some(side) = self.logic.take_last_error() {
                log::debug!("fault by {side:?}, score {}:{}",
                    self.logic.score(PlayerSide::Left),
                    self.logic.score(PlayerSide::Right));
                self.events.push(MatchEvent::PlayerError(side));
                self.is_ball_valid = false;
                self.is_ball_down = true;
            }
        } else {
            let injected: Vec<MatchEvent> = self.injected.drain(..).collect();
            for event in injected {
                self.apply_injected(event);
            }
        }
    }

    fn apply_injected(&mut self, event: MatchEvent) {
        match event {
            MatchEvent::PlayerError(_) => {
                self.is_ball_valid = false;
                self.is_ball_down = true;
            }
            MatchEvent::BallReset(serving) => {
                self.world.reset(Some(serving));
                self.logic.set_serving_player(Some(serving));
                self.is_ball_valid = true;
                self.is_game_running = false;
                self.is_ball_down = false;
            }
            _ => {}
        }
        self.events.push(event);
    }

    /// The current tick's events, in arrival order. Consumers poll this once
    /// per tick; events never persist to the next one.
    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    /// Queue an authoritative event for the next tick (remote mode). The
    /// transport must call this only between ticks.
    pub fn inject_event(&mut self, event: MatchEvent) {
        self.injected.push(event);
    }

    /// Store an input directly, bypassing the input sources (remote mode or
    /// replay-driven matches).
    pub fn set_input(&mut self, side: PlayerSide, input: PlayerInput) {
        self.last_input[side.index()] = input;
    }

    /// The inputs that drove the most recent tick; what a replay records.
    pub fn last_inputs(&self) -> [PlayerInput; 2] {
        self.last_input
    }

    pub fn score(&self, side: PlayerSide) -> u32 {
        self.logic.score(side)
    }

    /// Externally injected score (network authority).
    pub fn set_score(&mut self, left: u32, right: u32) {
        self.logic.set_score(PlayerSide::Left, left);
        self.logic.set_score(PlayerSide::Right, right);
    }

    pub fn hit_count(&self, side: PlayerSide) -> u32 {
        self.logic.hits(side)
    }

    pub fn serving_player(&self) -> Option<PlayerSide> {
        self.logic.serving_player()
    }

    pub fn set_serving_player(&mut self, side: PlayerSide) {
        self.logic.set_serving_player(Some(side));
    }

    /// The winner, or `None` while the match is running.
    pub fn winning_player(&self) -> Option<PlayerSide> {
        self.logic.winning_player()
    }

    pub fn ball_position(&self) -> Vec2 {
        self.world.ball_position()
    }

    pub fn ball_velocity(&self) -> Vec2 {
        self.world.ball_velocity()
    }

    pub fn blob_position(&self, side: PlayerSide) -> Vec2 {
        self.world.blob_position(side)
    }

    pub fn world(&self) -> &PhysicWorld {
        &self.world
    }

    pub fn is_ball_valid(&self) -> bool {
        self.is_ball_valid
    }

    pub fn is_game_running(&self) -> bool {
        self.is_game_running
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Read-only view handed to input sources; also useful for bots driven
    /// from outside the match.
    pub fn view(&self) -> MatchView {
        MatchView {
            ball_position: self.world.ball_position(),
            ball_velocity: self.world.ball_velocity(),
            blob_position: [
                self.world.blob_position(PlayerSide::Left),
                self.world.blob_position(PlayerSide::Right),
            ],
            blob_velocity: [
                self.world.blob_velocity(PlayerSide::Left),
                self.world.blob_velocity(PlayerSide::Right),
            ],
            serving_player: self.logic.serving_player(),
            is_ball_valid: self.is_ball_valid,
            is_game_running: self.is_game_running,
        }
    }

    /// Snapshot the entire match for replays or network resync.
    pub fn state(&self) -> DuelMatchState {
        DuelMatchState {
            world_state: self.world.state(),
            logic_state: self.logic.state(),
            player_input: self.last_input,
            error_side: self.logic.pending_error(),
            is_ball_valid: self.is_ball_valid,
            is_game_running: self.is_game_running,
            is_ball_down: self.is_ball_down,
        }
    }

    /// Restore a snapshot, replacing every piece of match state.
    pub fn set_state(&mut self, state: &DuelMatchState) {
        self.world.set_state(&state.world_state);
        self.logic.set_state(&state.logic_state);
        self.logic.set_pending_error(state.error_side);
        self.last_input = state.player_input;
        self.is_ball_valid = state.is_ball_valid;
        self.is_game_running = state.is_game_running;
        self.is_ball_down = state.is_ball_down;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::input::FixedInputSource;
    use crate::sim::logic::Ruleset;

    /// Plays back a fixed frame list, then releases all keys.
    struct ScriptSource {
        frames: Vec<PlayerInput>,
        cursor: usize,
    }

    impl ScriptSource {
        fn new(frames: Vec<PlayerInput>) -> Self {
            Self { frames, cursor: 0 }
        }
    }

    impl InputSource for ScriptSource {
        fn next_input(&mut self, _view: &MatchView) -> PlayerInput {
            let input = self.frames.get(self.cursor).copied().unwrap_or_default();
            self.cursor += 1;
            input
        }
    }

    fn test_config() -> MatchConfig {
        MatchConfig {
            ruleset: Ruleset::Rally,
            score_to_win: 5,
            starting_side: PlayerSide::Left,
            player_names: ["left".into(), "right".into()],
        }
    }

    fn idle_sources() -> (Box<dyn InputSource>, Box<dyn InputSource>) {
        (
            Box::new(FixedInputSource::default()),
            Box::new(FixedInputSource::default()),
        )
    }

    #[test]
    fn serve_waits_until_first_touch() {
        let (left, right) = idle_sources();
        let mut duel = DuelMatch::new(&test_config(), left, right);

        let rest = duel.ball_position();
        for _ in 0..120 {
            duel.step();
        }
        // Nobody touched the ball: it is still waiting for the serve.
        assert_eq!(duel.ball_position(), rest);
        assert!(!duel.is_game_running());
        assert_eq!(duel.score(PlayerSide::Left), 0);
        assert_eq!(duel.score(PlayerSide::Right), 0);
    }

    #[test]
    fn jump_serve_starts_rally_and_rally_ends_in_reset() {
        // Left jumps into the resting ball, then everyone stands still; the
        // launched ball must eventually produce a fault and a court reset.
        let jump = PlayerInput::new(false, false, true);
        let script: Vec<PlayerInput> = vec![jump; 30];
        let mut duel = DuelMatch::new(
            &test_config(),
            Box::new(ScriptSource::new(script)),
            Box::new(FixedInputSource::default()),
        );

        let mut saw_hit = false;
        let mut error_side = None;
        let mut saw_reset = false;
        for _ in 0..2000 {
            duel.step();
            for event in duel.events() {
                match *event {
                    MatchEvent::BallHitBlob(PlayerSide::Left) => saw_hit = true,
                    MatchEvent::PlayerError(side) if error_side.is_none() => {
                        error_side = Some(side);
                    }
                    MatchEvent::BallReset(_) => saw_reset = true,
                    _ => {}
                }
            }
            if saw_reset {
                break;
            }
        }

        assert!(saw_hit, "serve touch never happened");
        let faulted = error_side.expect("rally never ended in a fault");
        assert!(saw_reset, "no reset followed the fault");
        // Rally scoring: the non-faulting side scored and serves next.
        assert_eq!(duel.score(faulted.other()), 1);
        assert_eq!(duel.score(faulted), 0);
        assert_eq!(duel.serving_player(), Some(faulted.other()));
        assert!(duel.is_ball_valid());
        assert!(!duel.is_game_running());
    }

    #[test]
    fn events_do_not_persist_across_ticks() {
        let jump = PlayerInput::new(false, false, true);
        let mut duel = DuelMatch::new(
            &test_config(),
            Box::new(ScriptSource::new(vec![jump; 30])),
            Box::new(FixedInputSource::default()),
        );

        let mut seen_events = false;
        for _ in 0..60 {
            duel.step();
            if !duel.events().is_empty() {
                seen_events = true;
                break;
            }
        }
        assert!(seen_events, "expected at least the serve touch");

        // A later quiet tick has an empty event list again.
        let mut saw_empty = false;
        for _ in 0..30 {
            duel.step();
            if duel.events().is_empty() {
                saw_empty = true;
                break;
            }
        }
        assert!(saw_empty);
    }

    #[test]
    fn paused_match_does_not_advance() {
        let (left, right) = idle_sources();
        let mut duel = DuelMatch::new(&test_config(), left, right);
        duel.step();
        let before = duel.state();

        duel.pause();
        assert!(duel.is_paused());
        for _ in 0..10 {
            duel.step();
        }
        assert_eq!(duel.state(), before);

        duel.unpause();
        duel.step();
        // Ball is still serve-waiting, but logic timers advanced: the match
        // is live again (rotation keeps the state changing).
        assert_ne!(duel.state().world_state.ball_rotation, before.world_state.ball_rotation);
    }

    #[test]
    fn state_round_trips_through_set_state() {
        let jump = PlayerInput::new(false, false, true);
        let mut duel = DuelMatch::new(
            &test_config(),
            Box::new(ScriptSource::new(vec![jump; 30])),
            Box::new(FixedInputSource::default()),
        );
        for _ in 0..200 {
            duel.step();
        }
        let snapshot = duel.state();

        let (left, right) = idle_sources();
        let mut restored = DuelMatch::new(&test_config(), left, right);
        restored.set_state(&snapshot);
        assert_eq!(restored.state(), snapshot);
        assert_eq!(restored.score(PlayerSide::Left), duel.score(PlayerSide::Left));
        assert_eq!(restored.serving_player(), duel.serving_player());
    }

    #[test]
    fn restored_matches_stay_in_lockstep() {
        let (left, right) = idle_sources();
        let mut original = DuelMatch::new(&test_config(), left, right);
        for _ in 0..50 {
            original.step();
        }

        let snapshot = original.state();
        let (left2, right2) = idle_sources();
        let mut copy = DuelMatch::new(&test_config(), left2, right2);
        copy.set_state(&snapshot);

        for _ in 0..100 {
            original.step();
            copy.step();
            assert_eq!(original.state(), copy.state());
        }
    }

    #[test]
    fn remote_match_never_scores_locally() {
        let mut duel = DuelMatch::new_remote(&test_config());
        // Force the ball into play so it falls to the ground.
        duel.inject_event(MatchEvent::BallReset(PlayerSide::Left));
        duel.step();
        let mut state = duel.state();
        state.is_game_running = true;
        state.is_ball_valid = true;
        duel.set_state(&state);

        for _ in 0..600 {
            duel.step();
        }
        // Contacts happened, but no fault and no score without the
        // authority saying so.
        assert_eq!(duel.score(PlayerSide::Left), 0);
        assert_eq!(duel.score(PlayerSide::Right), 0);
        assert!(duel.is_ball_valid());
    }

    #[test]
    fn remote_match_applies_injected_authority() {
        let mut duel = DuelMatch::new_remote(&test_config());

        duel.inject_event(MatchEvent::PlayerError(PlayerSide::Left));
        duel.step();
        assert!(duel.events().contains(&MatchEvent::PlayerError(PlayerSide::Left)));
        assert!(!duel.is_ball_valid());

        duel.set_score(0, 1);
        duel.inject_event(MatchEvent::BallReset(PlayerSide::Right));
        duel.step();
        assert!(duel.events().contains(&MatchEvent::BallReset(PlayerSide::Right)));
        assert!(duel.is_ball_valid());
        assert_eq!(duel.serving_player(), Some(PlayerSide::Right));
        assert_eq!(duel.score(PlayerSide::Right), 1);
    }
}
