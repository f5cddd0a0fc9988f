//! Fixed timestep physics for two blobs and one ball.
//!
//! Collision handling is corrective, not predictive: penetration is resolved
//! after integration by pushing the ball out and reflecting its velocity.
//! The step runs entirely in `f32` with no wider intermediates, which is
//! what keeps trajectories bit-identical across machines.

use glam::Vec2;

use super::events::PhysicEvents;
use super::input::{PlayerInput, PlayerSide};
use super::state::PhysicState;
use crate::consts::*;

/// Deterministic per-tick simulation of the court.
///
/// The world knows nothing about scores or rallies; the two flags passed to
/// [`step`](Self::step) are owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct PhysicWorld {
    blob_position: [Vec2; 2],
    blob_velocity: [Vec2; 2],
    /// Animation phase per blob, cycling within [0, 5)
    blob_state: [f32; 2],
    /// Current per-tick phase delta, +-BLOBBY_ANIMATION_SPEED or 0
    blob_animation_speed: [f32; 2],
    ball_position: Vec2,
    ball_velocity: Vec2,
    ball_rotation: f32,
    ball_angular_velocity: f32,
    last_hit_intensity: f32,
}

impl Default for PhysicWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicWorld {
    /// A freshly reset court with the ball resting over the net.
    pub fn new() -> Self {
        let mut world = Self {
            blob_position: [Vec2::ZERO; 2],
            blob_velocity: [Vec2::ZERO; 2],
            blob_state: [0.0; 2],
            blob_animation_speed: [0.0; 2],
            ball_position: Vec2::ZERO,
            ball_velocity: Vec2::ZERO,
            ball_rotation: 0.0,
            ball_angular_velocity: STANDARD_BALL_ANGULAR_VELOCITY,
            last_hit_intensity: 0.0,
        };
        world.reset(None);
        world
    }

    /// Reposition everything for a new rally. The ball is placed at rest
    /// height above the serving side, or over the net if no side is given
    /// (match start before the first serve is decided).
    pub fn reset(&mut self, serving: Option<PlayerSide>) {
        self.blob_position[0] = Vec2::new(LEFT_SPAWN_X, GROUND_PLANE_HEIGHT);
        self.blob_position[1] = Vec2::new(RIGHT_SPAWN_X, GROUND_PLANE_HEIGHT);
        self.blob_velocity = [Vec2::ZERO; 2];

        self.ball_position = match serving {
            Some(PlayerSide::Left) => Vec2::new(LEFT_SPAWN_X, STANDARD_BALL_HEIGHT),
            Some(PlayerSide::Right) => Vec2::new(RIGHT_SPAWN_X, STANDARD_BALL_HEIGHT),
            None => Vec2::new(NET_POSITION_X, 450.0),
        };
        self.ball_velocity = Vec2::ZERO;
        self.ball_rotation = 0.0;
        self.ball_angular_velocity = STANDARD_BALL_ANGULAR_VELOCITY;
        self.last_hit_intensity = 0.0;
    }

    /// Advance the world by exactly one tick.
    ///
    /// `is_ball_valid` enables blob-ball contact (a dead ball falls through
    /// blobs); `is_game_running` enables ball translation (a serve-wait ball
    /// only spins in place). Returns the tick's physical events.
    pub fn step(
        &mut self,
        left_input: PlayerInput,
        right_input: PlayerInput,
        is_ball_valid: bool,
        is_game_running: bool,
    ) -> PhysicEvents {
        let mut events = PhysicEvents::NONE;

        self.step_blob(PlayerSide::Left, left_input);
        self.step_blob(PlayerSide::Right, right_input);

        if is_game_running {
            self.ball_velocity.y += BALL_GRAVITATION;
            self.ball_position += self.ball_velocity;
        }

        if is_ball_valid {
            for side in PlayerSide::BOTH {
                if self.blob_ball_collision(side) {
                    events.insert(PhysicEvents::blob_hit(side));
                }
            }
        }

        // Ground contact: damped vertical bounce, ground friction on x.
        if self.ball_position.y + BALL_RADIUS > GROUND_PLANE_HEIGHT_MAX {
            self.ball_velocity.y = -self.ball_velocity.y * BALL_GROUND_DAMPING;
            self.ball_velocity.x *= BALL_GROUND_FRICTION;
            self.ball_position.y = GROUND_PLANE_HEIGHT_MAX - BALL_RADIUS;
            let half = if self.ball_position.x > NET_POSITION_X {
                PlayerSide::Right
            } else {
                PlayerSide::Left
            };
            events.insert(PhysicEvents::ground_hit(half));
        }

        // Side walls and net; the ball cannot touch more than one per tick.
        if self.ball_position.x - BALL_RADIUS <= LEFT_PLANE && self.ball_velocity.x < 0.0 {
            self.ball_velocity.x = -self.ball_velocity.x;
            self.ball_position.x = LEFT_PLANE + BALL_RADIUS;
            events.insert(PhysicEvents::BALL_HIT_LEFT_WALL);
        } else if self.ball_position.x + BALL_RADIUS >= RIGHT_PLANE && self.ball_velocity.x > 0.0 {
            self.ball_velocity.x = -self.ball_velocity.x;
            self.ball_position.x = RIGHT_PLANE - BALL_RADIUS;
            events.insert(PhysicEvents::BALL_HIT_RIGHT_WALL);
        } else if self.ball_position.y > NET_SPHERE_POSITION
            && (self.ball_position.x - NET_POSITION_X).abs() < BALL_RADIUS + NET_RADIUS
        {
            // Vertical net faces below the top sphere.
            let right_face = self.ball_position.x - NET_POSITION_X > 0.0;
            self.ball_velocity.x = -self.ball_velocity.x;
            self.ball_position.x = if right_face {
                NET_POSITION_X + (BALL_RADIUS + NET_RADIUS)
            } else {
                NET_POSITION_X - (BALL_RADIUS + NET_RADIUS)
            };
            let half = if right_face {
                PlayerSide::Right
            } else {
                PlayerSide::Left
            };
            events.insert(PhysicEvents::net_side_hit(half));
        } else {
            // Rounded net top.
            let top_center = Vec2::new(NET_POSITION_X, NET_SPHERE_POSITION);
            let to_ball = self.ball_position - top_center;
            let distance = to_ball.length();
            if distance < NET_RADIUS + BALL_RADIUS && distance > 0.0 {
                let normal = to_ball / distance;

                // Split the squared speed into normal/parallel parts and damp
                // the normal part harder, then rebuild the reflected velocity
                // at the damped speed.
                let perp = normal.dot(self.ball_velocity);
                let perp_ekin = perp * perp * NET_TOP_NORMAL_DAMPING;
                let para_ekin = (self.ball_velocity.length_squared() - perp * perp)
                    * NET_TOP_PARALLEL_DAMPING;
                let speed = (perp_ekin + para_ekin).sqrt();

                // Standard reflection: v' = v - 2(v.n)n, rescaled to the
                // damped speed.
                let reflected =
                    self.ball_velocity - 2.0 * self.ball_velocity.dot(normal) * normal;
                self.ball_velocity = reflected.normalize_or_zero() * speed;
                self.ball_position = top_center + normal * (NET_RADIUS + BALL_RADIUS);
                events.insert(PhysicEvents::BALL_HIT_NET_TOP);
            }
        }

        // Push blobs back out of the net and the court boundaries. These
        // clamps never produce events.
        if self.blob_position[0].x + BLOBBY_LOWER_RADIUS > NET_POSITION_X - NET_RADIUS {
            self.blob_position[0].x = NET_POSITION_X - NET_RADIUS - BLOBBY_LOWER_RADIUS;
        }
        if self.blob_position[1].x - BLOBBY_LOWER_RADIUS < NET_POSITION_X + NET_RADIUS {
            self.blob_position[1].x = NET_POSITION_X + NET_RADIUS + BLOBBY_LOWER_RADIUS;
        }
        if self.blob_position[0].x < LEFT_PLANE {
            self.blob_position[0].x = LEFT_PLANE;
        }
        if self.blob_position[1].x > RIGHT_PLANE {
            self.blob_position[1].x = RIGHT_PLANE;
        }

        // Cosmetic spin, scaled by ball speed and keeping the sign of the
        // horizontal motion; the ball keeps spinning while waiting for serve.
        let spin = self.ball_angular_velocity * (self.ball_velocity.length() / 6.0);
        if self.ball_velocity.x > 0.0 {
            self.ball_rotation += spin;
        } else if self.ball_velocity.x < 0.0 {
            self.ball_rotation -= spin;
        } else {
            self.ball_rotation -= self.ball_angular_velocity;
        }
        if self.ball_rotation <= 0.0 {
            self.ball_rotation += BALL_ROTATION_WRAP;
        } else if self.ball_rotation >= BALL_ROTATION_WRAP {
            self.ball_rotation -= BALL_ROTATION_WRAP;
        }

        events
    }

    /// Blob kinematics: exact +-speed horizontal motion, impulse jump with a
    /// reduced-gravity buffer while the key is held, ground clamp, walk/jump
    /// animation.
    fn step_blob(&mut self, side: PlayerSide, input: PlayerInput) {
        let i = side.index();
        let mut gravity = GRAVITATION;

        if input.up {
            if self.blob_on_ground(side) {
                self.blob_velocity[i].y = -BLOBBY_JUMP_ACCELERATION;
                self.start_blob_animation(side);
            }
            gravity -= BLOBBY_JUMP_BUFFER;
        }

        if (input.left || input.right) && self.blob_on_ground(side) {
            self.start_blob_animation(side);
        }

        self.blob_velocity[i].x = (if input.right { BLOBBY_SPEED } else { 0.0 })
            - (if input.left { BLOBBY_SPEED } else { 0.0 });

        self.blob_velocity[i].y += gravity;
        self.blob_position[i] += self.blob_velocity[i];

        if self.blob_position[i].y > GROUND_PLANE_HEIGHT {
            if self.blob_velocity[i].y > 3.5 {
                self.start_blob_animation(side);
            }
            self.blob_position[i].y = GROUND_PLANE_HEIGHT;
            self.blob_velocity[i].y = 0.0;
        }

        self.step_blob_animation(side);
    }

    /// Test the ball against the blob's two collision circles, lower first,
    /// and resolve a contact by relaunching the ball away from the circle
    /// center at the fixed post-collision speed.
    fn blob_ball_collision(&mut self, side: PlayerSide) -> bool {
        let i = side.index();
        let blob = self.blob_position[i];
        let lower = Vec2::new(blob.x, blob.y + BLOBBY_LOWER_SPHERE);
        let upper = Vec2::new(blob.x, blob.y - BLOBBY_UPPER_SPHERE);

        let center = if (self.ball_position - lower).length() <= BALL_RADIUS + BLOBBY_LOWER_RADIUS
        {
            lower
        } else if (self.ball_position - upper).length() <= BALL_RADIUS + BLOBBY_UPPER_RADIUS {
            upper
        } else {
            return false;
        };

        self.last_hit_intensity = (self.ball_velocity - self.blob_velocity[i]).length();

        self.ball_velocity =
            (self.ball_position - center).normalize_or_zero() * BALL_COLLISION_VELOCITY;
        self.ball_position += self.ball_velocity;
        true
    }

    fn start_blob_animation(&mut self, side: PlayerSide) {
        let i = side.index();
        if self.blob_animation_speed[i] == 0.0 {
            self.blob_animation_speed[i] = BLOBBY_ANIMATION_SPEED;
        }
    }

    fn step_blob_animation(&mut self, side: PlayerSide) {
        let i = side.index();
        if self.blob_state[i] < 0.0 {
            self.blob_animation_speed[i] = 0.0;
            self.blob_state[i] = 0.0;
        }
        if self.blob_state[i] >= 4.5 {
            self.blob_animation_speed[i] = -BLOBBY_ANIMATION_SPEED;
        }
        self.blob_state[i] += self.blob_animation_speed[i];
        if self.blob_state[i] >= 5.0 {
            self.blob_state[i] = 4.99;
        }
    }

    pub fn ball_position(&self) -> Vec2 {
        self.ball_position
    }

    pub fn ball_velocity(&self) -> Vec2 {
        self.ball_velocity
    }

    pub fn ball_rotation(&self) -> f32 {
        self.ball_rotation
    }

    pub fn blob_position(&self, side: PlayerSide) -> Vec2 {
        self.blob_position[side.index()]
    }

    pub fn blob_velocity(&self, side: PlayerSide) -> Vec2 {
        self.blob_velocity[side.index()]
    }

    /// Animation phase of the blob, in [0, 5).
    pub fn blob_state(&self, side: PlayerSide) -> f32 {
        self.blob_state[side.index()]
    }

    pub fn blob_on_ground(&self, side: PlayerSide) -> bool {
        self.blob_position[side.index()].y >= GROUND_PLANE_HEIGHT
    }

    /// Relative ball/blob speed at the most recent blob contact. Presentation
    /// only (impact sound volume, particles).
    pub fn last_hit_intensity(&self) -> f32 {
        self.last_hit_intensity
    }

    /// Snapshot the kinematic state.
    pub fn state(&self) -> PhysicState {
        PhysicState {
            blob_position: self.blob_position,
            blob_velocity: self.blob_velocity,
            blob_state: self.blob_state,
            ball_position: self.ball_position,
            ball_velocity: self.ball_velocity,
            ball_rotation: self.ball_rotation,
            ball_angular_velocity: self.ball_angular_velocity,
        }
    }

    /// Restore a snapshot. The transient animation direction is not part of
    /// the snapshot; it restarts on the next walk/jump.
    pub fn set_state(&mut self, state: &PhysicState) {
        self.blob_position = state.blob_position;
        self.blob_velocity = state.blob_velocity;
        self.blob_state = state.blob_state;
        self.blob_animation_speed = [0.0; 2];
        self.ball_position = state.ball_position;
        self.ball_velocity = state.ball_velocity;
        self.ball_rotation = state.ball_rotation;
        self.ball_angular_velocity = state.ball_angular_velocity;
        self.last_hit_intensity = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NO_INPUT: PlayerInput = PlayerInput::new(false, false, false);

    fn world_with_ball(position: Vec2, velocity: Vec2) -> PhysicWorld {
        let mut world = PhysicWorld::new();
        let mut state = world.state();
        state.ball_position = position;
        state.ball_velocity = velocity;
        world.set_state(&state);
        world
    }

    /// Anchor regression: a ball dropped from rest straight onto the net top
    /// must first touch it on tick 32 exactly, stay centered, and bounce
    /// straight back up. The trajectory is additionally required to be
    /// bit-identical across two independent runs.
    #[test]
    fn ball_drop_onto_net_top_golden() {
        let run = || {
            let mut world = world_with_ball(Vec2::new(NET_POSITION_X, 100.0), Vec2::ZERO);
            let mut trajectory = Vec::new();
            let mut masks = Vec::new();
            for _ in 0..60 {
                let events = world.step(NO_INPUT, NO_INPUT, true, true);
                trajectory.push(world.state());
                masks.push(events);
            }
            (trajectory, masks)
        };

        let (trajectory, masks) = run();

        // Pure vertical drop: x never moves off the net line.
        for state in &trajectory {
            assert_eq!(state.ball_position.x, NET_POSITION_X);
        }

        // First contact on tick 32 (1-indexed), and it is the net top.
        for (i, mask) in masks.iter().enumerate() {
            if i < 31 {
                assert!(mask.is_empty(), "unexpected event on tick {}", i + 1);
            }
        }
        assert!(masks[31].contains(PhysicEvents::BALL_HIT_NET_TOP));

        // The bounce pushes the ball to the sphere surface and upward.
        let bounce = &trajectory[31];
        assert!((bounce.ball_position.y - (NET_SPHERE_POSITION - NET_RADIUS - BALL_RADIUS)).abs() < 1e-3);
        assert!(bounce.ball_velocity.y < 0.0);

        // No second contact within the window.
        assert_eq!(
            masks.iter().filter(|m| !m.is_empty()).count(),
            1,
            "exactly one contact expected in 60 ticks"
        );

        // Bit-identical repeat run.
        let (trajectory2, masks2) = run();
        assert_eq!(trajectory, trajectory2);
        assert_eq!(masks, masks2);
    }

    /// Anchor regression: a dead ball released at the left serve position
    /// falls through the (ignored) blob and first touches the ground on tick
    /// 35 exactly, on the left half.
    #[test]
    fn dead_ball_falls_to_ground_golden() {
        let mut world = PhysicWorld::new();
        world.reset(Some(PlayerSide::Left));

        let mut first_ground = None;
        for tick in 1..=60u32 {
            let events = world.step(NO_INPUT, NO_INPUT, false, true);
            assert_eq!(world.ball_position().x, LEFT_SPAWN_X);
            if events.contains(PhysicEvents::BALL_HIT_LEFT_GROUND) && first_ground.is_none() {
                first_ground = Some(tick);
            }
            assert!(!events.contains(PhysicEvents::BALL_HIT_RIGHT_GROUND));
        }

        assert_eq!(first_ground, Some(35));
    }

    #[test]
    fn serve_wait_ball_spins_in_place() {
        let mut world = PhysicWorld::new();
        world.reset(Some(PlayerSide::Right));
        let rest = world.ball_position();

        let events = world.step(NO_INPUT, NO_INPUT, true, false);

        assert!(events.is_empty());
        assert_eq!(world.ball_position(), rest);
        // Rotation still advances, wrapped into [0, BALL_ROTATION_WRAP).
        let rotation = world.ball_rotation();
        assert!((rotation - (BALL_ROTATION_WRAP - STANDARD_BALL_ANGULAR_VELOCITY)).abs() < 1e-4);
        assert!((0.0..BALL_ROTATION_WRAP).contains(&rotation));
    }

    #[test]
    fn left_wall_reflects_outward_motion() {
        let mut world = world_with_ball(Vec2::new(BALL_RADIUS + 0.1, 200.0), Vec2::new(-5.0, 0.0));

        let events = world.step(NO_INPUT, NO_INPUT, false, true);

        assert!(events.contains(PhysicEvents::BALL_HIT_LEFT_WALL));
        assert_eq!(world.ball_position().x, LEFT_PLANE + BALL_RADIUS);
        assert!(world.ball_velocity().x > 0.0);
    }

    #[test]
    fn blob_contact_relaunches_ball_at_fixed_speed() {
        // Ball falling straight onto the left blob's head.
        let head_y = GROUND_PLANE_HEIGHT - BLOBBY_UPPER_SPHERE;
        let start = Vec2::new(LEFT_SPAWN_X, head_y - (BALL_RADIUS + BLOBBY_UPPER_RADIUS) + 1.0);
        let mut world = world_with_ball(start, Vec2::new(0.0, 5.0));

        let events = world.step(NO_INPUT, NO_INPUT, true, false);

        assert!(events.contains(PhysicEvents::BALL_HIT_LEFT_BLOB));
        assert!((world.ball_velocity().length() - BALL_COLLISION_VELOCITY).abs() < 1e-3);
        assert!(world.ball_velocity().y < 0.0, "ball should bounce upward");
        assert!((world.last_hit_intensity() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn grounded_blob_jumps_and_lands_exactly() {
        let mut world = PhysicWorld::new();
        let up = PlayerInput::new(false, false, true);

        assert!(world.blob_on_ground(PlayerSide::Left));
        world.step(up, NO_INPUT, true, false);
        assert!(!world.blob_on_ground(PlayerSide::Left));
        assert!(world.blob_velocity(PlayerSide::Left).y < 0.0);

        // Release the key and wait for the landing clamp.
        for _ in 0..120 {
            world.step(NO_INPUT, NO_INPUT, true, false);
        }
        assert!(world.blob_on_ground(PlayerSide::Left));
        assert_eq!(world.blob_position(PlayerSide::Left).y, GROUND_PLANE_HEIGHT);
        assert_eq!(world.blob_velocity(PlayerSide::Left).y, 0.0);
    }

    #[test]
    fn blobs_stay_clamped_outside_net_and_walls() {
        let mut world = PhysicWorld::new();
        let toward_net_left = PlayerInput::new(false, true, false);
        let toward_net_right = PlayerInput::new(true, false, false);

        for _ in 0..600 {
            world.step(toward_net_left, toward_net_right, false, false);
        }
        assert!(
            world.blob_position(PlayerSide::Left).x + BLOBBY_LOWER_RADIUS
                <= NET_POSITION_X - NET_RADIUS + 1e-3
        );
        assert!(
            world.blob_position(PlayerSide::Right).x - BLOBBY_LOWER_RADIUS
                >= NET_POSITION_X + NET_RADIUS - 1e-3
        );

        let away_left = PlayerInput::new(true, false, false);
        let away_right = PlayerInput::new(false, true, false);
        for _ in 0..600 {
            world.step(away_left, away_right, false, false);
        }
        assert!(world.blob_position(PlayerSide::Left).x >= LEFT_PLANE);
        assert!(world.blob_position(PlayerSide::Right).x <= RIGHT_PLANE);
    }

    /// The ball must never end a tick inside the court geometry.
    #[test]
    fn ball_containment_over_long_rally() {
        let mut world = PhysicWorld::new();
        world.reset(Some(PlayerSide::Left));

        for tick in 0..3000u32 {
            // Both blobs crowd the net and jump periodically; enough to keep
            // the ball ricocheting between blobs, net and walls.
            let jump = tick % 37 < 4;
            let left = PlayerInput::new(false, true, jump);
            let right = PlayerInput::new(true, false, tick % 53 < 4);
            world.step(left, right, true, true);

            let ball = world.ball_position();
            assert!(ball.x >= LEFT_PLANE + BALL_RADIUS - 1e-3, "tick {tick}: in left wall");
            assert!(ball.x <= RIGHT_PLANE - BALL_RADIUS + 1e-3, "tick {tick}: in right wall");
            assert!(
                ball.y <= GROUND_PLANE_HEIGHT_MAX - BALL_RADIUS + 1e-3,
                "tick {tick}: below ground"
            );
            // Net cross-section: below the top sphere the ball center must
            // stay clear of the band.
            if ball.y > NET_SPHERE_POSITION {
                assert!(
                    (ball.x - NET_POSITION_X).abs() >= BALL_RADIUS + NET_RADIUS - 1e-3,
                    "tick {tick}: inside net band"
                );
            }
            // The ball center may graze a blob's collision circles while a
            // contact resolves, but must never reach their centers' circles.
            for side in PlayerSide::BOTH {
                let blob = world.blob_position(side);
                let lower = Vec2::new(blob.x, blob.y + BLOBBY_LOWER_SPHERE);
                let upper = Vec2::new(blob.x, blob.y - BLOBBY_UPPER_SPHERE);
                assert!((ball - lower).length() >= BLOBBY_LOWER_RADIUS - 1e-3);
                assert!((ball - upper).length() >= BLOBBY_UPPER_RADIUS - 1e-3);
            }
        }
    }

    proptest! {
        /// Any input sequence replayed from the same state yields the same
        /// trajectory, bit for bit.
        #[test]
        fn step_is_deterministic(inputs in prop::collection::vec((0u8..8, 0u8..8), 1..200)) {
            let run = |inputs: &[(u8, u8)]| {
                let mut world = PhysicWorld::new();
                world.reset(Some(PlayerSide::Left));
                let mut states = Vec::with_capacity(inputs.len());
                let mut masks = Vec::with_capacity(inputs.len());
                for &(l, r) in inputs {
                    let events = world.step(
                        PlayerInput::from_bits(l),
                        PlayerInput::from_bits(r),
                        true,
                        true,
                    );
                    states.push(world.state());
                    masks.push(events);
                }
                (states, masks)
            };

            let a = run(&inputs);
            let b = run(&inputs);
            prop_assert_eq!(a.0, b.0);
            prop_assert_eq!(a.1, b.1);
        }
    }
}
