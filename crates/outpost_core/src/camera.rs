//! Viewport controller.
//!
//! The camera either tracks one entity or roams freely under WASD. In both
//! modes it computes a target top-left corner, clamps it to the map, and
//! eases toward it when the jump is large so the view never snaps.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Position, TOLERANCE};
use crate::input::{InputSnapshot, Key};
use crate::math::{fixed_serde, ratio, Fixed, Vec2Fixed};

/// What the camera is following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraMode {
    /// Centre on an entity.
    Tracking(EntityId),
    /// Pan with the keyboard.
    FreeRoam,
}

/// Camera state. Coordinates are the world position of the view's top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    position: Vec2Fixed,
    last_position: Vec2Fixed,
    target: Vec2Fixed,
    mode: CameraMode,
    view: (u32, u32),
    #[serde(with = "fixed_serde")]
    max_x: Fixed,
    #[serde(with = "fixed_serde")]
    max_y: Fixed,
}

impl Camera {
    /// A free-roaming camera at the origin.
    #[must_use]
    pub fn new(view: (u32, u32), map: (u32, u32)) -> Self {
        let max_x = Fixed::from_num(map.0.saturating_sub(view.0));
        let max_y = Fixed::from_num(map.1.saturating_sub(view.1));
        Self {
            position: Vec2Fixed::ZERO,
            last_position: Vec2Fixed::ZERO,
            target: Vec2Fixed::ZERO,
            mode: CameraMode::FreeRoam,
            view,
            max_x,
            max_y,
        }
    }

    /// Speed of the keyboard pan, per millisecond.
    #[must_use]
    pub fn pan_speed() -> Fixed {
        ratio(2, 5)
    }

    /// Follow `entity`.
    pub fn track(&mut self, entity: EntityId) {
        self.mode = CameraMode::Tracking(entity);
    }

    /// Switch to keyboard panning.
    pub fn free_roam(&mut self) {
        self.mode = CameraMode::FreeRoam;
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> CameraMode {
        self.mode
    }

    /// The tracked entity, if any.
    #[must_use]
    pub const fn tracked(&self) -> Option<EntityId> {
        match self.mode {
            CameraMode::Tracking(id) => Some(id),
            CameraMode::FreeRoam => None,
        }
    }

    /// Top-left of the view in world space.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Position before the last update.
    #[must_use]
    pub const fn last_position(&self) -> Vec2Fixed {
        self.last_position
    }

    /// Where the camera is heading, already clamped.
    #[must_use]
    pub const fn target(&self) -> Vec2Fixed {
        self.target
    }

    /// Largest valid top-left corner.
    #[must_use]
    pub const fn max_position(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.max_x, self.max_y)
    }

    /// Per-millisecond easing speed for a jump of `distance`, or `None` to snap.
    #[must_use]
    pub fn easing_speed(distance: Fixed) -> Option<Fixed> {
        let bands = [
            (50, ratio(2, 5)),
            (35, ratio(7, 20)),
            (28, ratio(1, 4)),
            (18, ratio(3, 20)),
            (5, ratio(1, 10)),
        ];
        bands
            .into_iter()
            .find(|(floor, _)| distance >= Fixed::from_num(*floor))
            .map(|(_, speed)| speed)
    }

    /// Advance one tick.
    ///
    /// `tracked_position` is the current position of the tracked entity, or
    /// `None` if it no longer exists, in which case the last target is held.
    pub fn update(
        &mut self,
        tracked_position: Option<Position>,
        input: &InputSnapshot,
        elapsed_ms: u32,
    ) {
        match self.mode {
            CameraMode::Tracking(_) => {
                if let Some(pos) = tracked_position {
                    let half_w = Fixed::from_num(self.view.0 / 2);
                    let half_h = Fixed::from_num(self.view.1 / 2);
                    self.target = Vec2Fixed::new(pos.x() - half_w, pos.y() - half_h);
                }
            }
            CameraMode::FreeRoam => {
                let nudge = Self::pan_speed().saturating_mul(Fixed::from_num(elapsed_ms));
                match input.pan_key() {
                    Some(Key::W) => self.target.y = self.position.y - nudge,
                    Some(Key::S) => self.target.y = self.position.y + nudge,
                    Some(Key::D) => self.target.x = self.position.x + nudge,
                    Some(Key::A) => self.target.x = self.position.x - nudge,
                    _ => {}
                }
            }
        }

        self.target = self.clamp(self.target);
        self.last_position = self.position;

        let half_tolerance = TOLERANCE / 2;
        let gap_x = (self.target.x - self.last_position.x).abs();
        let gap_y = (self.target.y - self.last_position.y).abs();

        self.position = if gap_x > half_tolerance || gap_y > half_tolerance {
            let distance = self.last_position.distance(self.target);
            match Self::easing_speed(distance) {
                Some(speed) => {
                    let step = speed.saturating_mul(Fixed::from_num(elapsed_ms));
                    self.last_position.step_toward(self.target, step)
                }
                None => self.target,
            }
        } else {
            self.target
        };
        self.position = self.clamp(self.position);
    }

    fn clamp(&self, v: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(
            v.x.clamp(Fixed::ZERO, self.max_x),
            v.y.clamp(Fixed::ZERO, self.max_y),
        )
    }

    /// Convert a screen point to world space.
    #[must_use]
    pub fn screen_to_world(&self, screen: Vec2Fixed) -> Vec2Fixed {
        screen + self.position
    }

    /// Convert a world point to screen space.
    #[must_use]
    pub fn world_to_screen(&self, world: Vec2Fixed) -> Vec2Fixed {
        world - self.position
    }
}
