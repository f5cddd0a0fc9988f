//! Events surfaced by the physics step and aggregated per tick by the match.

use super::input::PlayerSide;

/// Bitmask of physical events produced by a single [`PhysicWorld::step`].
///
/// The mask only reports what touched what; interpreting the contacts
/// (touch counting, faults, scoring) is [`GameLogic`]'s job.
///
/// [`PhysicWorld::step`]: super::world::PhysicWorld::step
/// [`GameLogic`]: super::logic::GameLogic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicEvents(u16);

impl PhysicEvents {
    pub const NONE: Self = Self(0);
    pub const BALL_HIT_LEFT_BLOB: Self = Self(1 << 0);
    pub const BALL_HIT_RIGHT_BLOB: Self = Self(1 << 1);
    pub const BALL_HIT_LEFT_GROUND: Self = Self(1 << 2);
    pub const BALL_HIT_RIGHT_GROUND: Self = Self(1 << 3);
    pub const BALL_HIT_LEFT_WALL: Self = Self(1 << 4);
    pub const BALL_HIT_RIGHT_WALL: Self = Self(1 << 5);
    pub const BALL_HIT_NET_LEFT: Self = Self(1 << 6);
    pub const BALL_HIT_NET_RIGHT: Self = Self(1 << 7);
    pub const BALL_HIT_NET_TOP: Self = Self(1 << 8);

    /// Blob contact bit for the given side.
    pub fn blob_hit(side: PlayerSide) -> Self {
        match side {
            PlayerSide::Left => Self::BALL_HIT_LEFT_BLOB,
            PlayerSide::Right => Self::BALL_HIT_RIGHT_BLOB,
        }
    }

    /// Ground contact bit for the given court half.
    pub fn ground_hit(side: PlayerSide) -> Self {
        match side {
            PlayerSide::Left => Self::BALL_HIT_LEFT_GROUND,
            PlayerSide::Right => Self::BALL_HIT_RIGHT_GROUND,
        }
    }

    /// Side-wall contact bit for the given boundary.
    pub fn wall_hit(side: PlayerSide) -> Self {
        match side {
            PlayerSide::Left => Self::BALL_HIT_LEFT_WALL,
            PlayerSide::Right => Self::BALL_HIT_RIGHT_WALL,
        }
    }

    /// Net side-face contact bit for the given court half.
    pub fn net_side_hit(side: PlayerSide) -> Self {
        match side {
            PlayerSide::Left => Self::BALL_HIT_NET_LEFT,
            PlayerSide::Right => Self::BALL_HIT_NET_RIGHT,
        }
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

/// A semantic occurrence within one tick of a match.
///
/// Events are accumulated in arrival order and valid only for the tick that
/// produced them; consumers must not assume they persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// A blob touched the ball (squish-debounced).
    BallHitBlob(PlayerSide),
    /// The ball touched the ground on the given court half.
    BallHitGround(PlayerSide),
    /// The ball bounced off the given side wall.
    BallHitWall(PlayerSide),
    /// The ball bounced off the net face on the given court half.
    BallHitNetSide(PlayerSide),
    /// The ball bounced off the net's rounded top.
    BallHitNetTop,
    /// The given side committed a fault.
    PlayerError(PlayerSide),
    /// The court was reset for a new rally; the given side serves.
    BallReset(PlayerSide),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_insert_and_contains() {
        let mut events = PhysicEvents::NONE;
        assert!(events.is_empty());

        events.insert(PhysicEvents::BALL_HIT_LEFT_BLOB);
        events.insert(PhysicEvents::BALL_HIT_NET_TOP);

        assert!(events.contains(PhysicEvents::BALL_HIT_LEFT_BLOB));
        assert!(events.contains(PhysicEvents::BALL_HIT_NET_TOP));
        assert!(!events.contains(PhysicEvents::BALL_HIT_RIGHT_BLOB));
        assert!(!events.is_empty());
    }

    #[test]
    fn side_constructors_are_distinct() {
        assert_ne!(
            PhysicEvents::blob_hit(PlayerSide::Left),
            PhysicEvents::blob_hit(PlayerSide::Right)
        );
        assert_eq!(
            PhysicEvents::ground_hit(PlayerSide::Right),
            PhysicEvents::BALL_HIT_RIGHT_GROUND
        );
        assert_eq!(
            PhysicEvents::wall_hit(PlayerSide::Left),
            PhysicEvents::BALL_HIT_LEFT_WALL
        );
    }
}
