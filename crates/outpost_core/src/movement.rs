//! Progressive movement toward a destination.
//!
//! Each tick a moving unit advances `speed · elapsed` along the straight
//! bearing to its destination. The candidate point is checked against the
//! [`TileService`]; a blocked step stops the unit where it stands. There is
//! no pathfinding and no rerouting.

use serde::{Deserialize, Serialize};

use crate::components::{Position, STOP_DIST};
use crate::math::Fixed;
use crate::services::TileService;

/// What a single movement step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Not moving; nothing happened.
    Idle,
    /// Close enough to the destination; movement stopped.
    Arrived,
    /// The next point was not free; movement stopped.
    Blocked,
    /// Position advanced and the unit is still en route.
    Moved,
}

/// Destination-seeking capability of a mobile unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mover {
    destination: Position,
    moving: bool,
}

impl Mover {
    /// A stationary mover whose destination is its own position.
    #[must_use]
    pub const fn new(position: Position) -> Self {
        Self {
            destination: position,
            moving: false,
        }
    }

    /// Current destination.
    #[must_use]
    pub const fn destination(&self) -> Position {
        self.destination
    }

    /// Whether the unit is en route.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Head for `destination`.
    pub fn set_destination(&mut self, destination: Position) {
        self.destination = destination;
        self.moving = true;
    }

    /// Halt in place. The destination is kept.
    pub fn stop(&mut self) {
        self.moving = false;
    }

    /// Advance `position` one tick.
    ///
    /// The step is `speed · elapsed_ms` but never longer than the remaining
    /// distance. After the step, a unit within [`STOP_DIST`] of its
    /// destination stops.
    pub fn step(
        &mut self,
        position: &mut Position,
        speed: Fixed,
        elapsed_ms: u32,
        tiles: &dyn TileService,
    ) -> MoveOutcome {
        if !self.moving {
            return MoveOutcome::Idle;
        }

        if position.within(self.destination, STOP_DIST) {
            self.moving = false;
            return MoveOutcome::Arrived;
        }

        let delta = speed.saturating_mul(Fixed::from_num(elapsed_ms));
        let candidate = position
            .as_vec()
            .step_toward(self.destination.as_vec(), delta);

        if !tiles.is_position_free(candidate.x, candidate.y) {
            self.moving = false;
            return MoveOutcome::Blocked;
        }

        position.set(candidate.x, candidate.y);

        if position.within(self.destination, STOP_DIST) {
            self.moving = false;
            return MoveOutcome::Arrived;
        }
        MoveOutcome::Moved
    }
}
