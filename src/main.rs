//! Headless match runner.
//!
//! Plays a bot-vs-bot match to completion, records it, saves the replay and
//! loads it back as an integrity check. Everything is deterministic in the
//! seed, so the same invocation always produces the same match and the same
//! replay bytes.
//!
//! Usage: `blob-volley [seed] [replay-path]`

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use blob_volley::consts::*;
use blob_volley::replay::{ReplayPlayer, ReplayRecorder};
use blob_volley::sim::{
    DuelMatch, InputSource, MatchEvent, MatchView, PlayerInput, PlayerSide,
};
use blob_volley::MatchConfig;

/// Simple deterministic bot: chase the ball's landing x with a little lead,
/// jump when the ball is overhead, hold position otherwise.
struct BallChaser {
    side: PlayerSide,
    rng: Pcg32,
}

impl BallChaser {
    fn new(side: PlayerSide, seed: u64) -> Self {
        Self {
            side,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn home_x(&self) -> f32 {
        match self.side {
            PlayerSide::Left => LEFT_SPAWN_X,
            PlayerSide::Right => RIGHT_SPAWN_X,
        }
    }

    fn ball_on_my_half(&self, view: &MatchView) -> bool {
        match self.side {
            PlayerSide::Left => view.ball_position.x <= NET_POSITION_X,
            PlayerSide::Right => view.ball_position.x > NET_POSITION_X,
        }
    }
}

impl InputSource for BallChaser {
    fn next_input(&mut self, view: &MatchView) -> PlayerInput {
        let me = view.blob_position[self.side.index()];
        let ball = view.ball_position;

        // A small per-tick wobble keeps the two bots from mirroring each
        // other forever; seeded, so still fully deterministic.
        let jitter: f32 = self.rng.random_range(-6.0..6.0);

        let target_x = if self.ball_on_my_half(view) {
            // Lead the ball a little in its direction of travel.
            let lead = (view.ball_velocity.x * 6.0).clamp(-50.0, 50.0);
            ball.x + lead + jitter
        } else {
            self.home_x() + jitter
        };

        let dead_zone = BLOBBY_SPEED;
        let left = me.x > target_x + dead_zone;
        let right = me.x < target_x - dead_zone;

        // Jump when the ball is close overhead (this is also how the serve
        // is struck), with a bit of hesitation.
        let overhead = (ball.x - me.x).abs() < 90.0 && ball.y < me.y;
        let close = (ball - me).length() < 220.0;
        let up = self.ball_on_my_half(view) && overhead && close && self.rng.random_bool(0.85);

        PlayerInput::new(left, right, up)
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0x0B10_B5EED);
    let replay_path = args.next().unwrap_or_else(|| "match.bvr".to_owned());

    let config = MatchConfig {
        score_to_win: 5,
        player_names: ["Left Bot".to_owned(), "Right Bot".to_owned()],
        ..MatchConfig::default()
    };
    config.validate().expect("invalid match configuration");

    let left = BallChaser::new(PlayerSide::Left, seed);
    let right = BallChaser::new(PlayerSide::Right, seed.wrapping_mul(0x9E37_79B9).wrapping_add(1));
    let mut duel = DuelMatch::new(&config, Box::new(left), Box::new(right));
    let mut recorder = ReplayRecorder::new(
        config.starting_side,
        &config.player_names[0],
        &config.player_names[1],
    );

    // Twenty minutes of play is far more than two faulty bots ever need.
    let max_ticks = 20 * 60 * TICKS_PER_SECOND;
    let mut ticks = 0u32;
    while duel.winning_player().is_none() && ticks < max_ticks {
        duel.step();
        recorder.record(&duel.last_inputs());
        ticks += 1;

        for event in duel.events() {
            if let MatchEvent::PlayerError(side) = event {
                log::info!(
                    "tick {ticks}: fault by {side:?}, score {}:{}",
                    duel.score(PlayerSide::Left),
                    duel.score(PlayerSide::Right)
                );
            }
        }
    }

    let left_score = duel.score(PlayerSide::Left);
    let right_score = duel.score(PlayerSide::Right);
    recorder.finalize(left_score, right_score);

    match duel.winning_player() {
        Some(side) => println!(
            "{} wins {left_score}:{right_score} after {ticks} ticks",
            config.player_names[side.index()]
        ),
        None => println!("no winner within {max_ticks} ticks ({left_score}:{right_score})"),
    }

    if let Err(error) = recorder.save_file(&replay_path) {
        log::error!("failed to save replay: {error}");
        std::process::exit(1);
    }

    // Read the file straight back: checksum, names and scores must survive.
    match ReplayPlayer::load_file(&replay_path) {
        Ok(mut player) => {
            assert_eq!(player.final_scores(), (left_score, right_score));
            let mut replayed = 0u32;
            while player.next_input().is_some() {
                replayed += 1;
            }
            assert_eq!(replayed, ticks);
            println!("replay verified: {replay_path} ({replayed} ticks)");
        }
        Err(error) => {
            log::error!("saved replay failed verification: {error}");
            std::process::exit(1);
        }
    }
}
