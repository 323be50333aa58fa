//! Point-in-time input snapshot.
//!
//! The core never polls a device. The host samples its keyboard and mouse
//! once per frame and hands the result to [`crate::world::World::tick`].

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Keys the simulation reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// First production slot.
    Num1,
    /// Second production slot.
    Num2,
    /// Third production slot.
    Num3,
    /// Pan camera up.
    W,
    /// Pan camera left.
    A,
    /// Pan camera down.
    S,
    /// Pan camera right.
    D,
    /// Request to quit.
    Escape,
}

const KEY_COUNT: usize = 8;

impl Key {
    /// Free-roam keys in priority order: up, down, right, left.
    pub const PAN_PRIORITY: [Self; 4] = [Self::W, Self::S, Self::D, Self::A];

    /// Production keys in priority order.
    pub const PRODUCTION: [Self; 3] = [Self::Num1, Self::Num2, Self::Num3];

    const fn index(self) -> usize {
        match self {
            Self::Num1 => 0,
            Self::Num2 => 1,
            Self::Num3 => 2,
            Self::W => 3,
            Self::A => 4,
            Self::S => 5,
            Self::D => 6,
            Self::Escape => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct KeyStates {
    bits: [bool; KEY_COUNT],
}

impl KeyStates {
    fn set(&mut self, key: Key, value: bool) {
        self.bits[key.index()] = value;
    }

    const fn get(&self, key: Key) -> bool {
        self.bits[key.index()]
    }
}

/// Everything the simulation needs to know about player input for one tick.
///
/// `pressed` means "went down this frame"; `down` means "is held".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    down: KeyStates,
    pressed: KeyStates,
    left_click: bool,
    right_click: bool,
    cursor: Vec2Fixed,
}

impl InputSnapshot {
    /// A snapshot with nothing held or pressed.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Mark `key` as held.
    #[must_use]
    pub fn with_key_down(mut self, key: Key) -> Self {
        self.down.set(key, true);
        self
    }

    /// Mark `key` as pressed this frame. A pressed key is also held.
    #[must_use]
    pub fn with_key_pressed(mut self, key: Key) -> Self {
        self.pressed.set(key, true);
        self.down.set(key, true);
        self
    }

    /// Set the cursor position in screen pixels.
    #[must_use]
    pub fn with_cursor(mut self, x: Fixed, y: Fixed) -> Self {
        self.cursor = Vec2Fixed::new(x, y);
        self
    }

    /// Left click this frame at screen position `(x, y)`.
    #[must_use]
    pub fn with_left_click(mut self, x: i32, y: i32) -> Self {
        self.left_click = true;
        self.cursor = Vec2Fixed::from_ints(x, y);
        self
    }

    /// Right click this frame at screen position `(x, y)`.
    #[must_use]
    pub fn with_right_click(mut self, x: i32, y: i32) -> Self {
        self.right_click = true;
        self.cursor = Vec2Fixed::from_ints(x, y);
        self
    }

    /// Whether `key` is held.
    #[must_use]
    pub const fn is_key_down(&self, key: Key) -> bool {
        self.down.get(key)
    }

    /// Whether `key` went down this frame.
    #[must_use]
    pub const fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed.get(key)
    }

    /// Whether the left mouse button went down this frame.
    #[must_use]
    pub const fn left_click(&self) -> bool {
        self.left_click
    }

    /// Whether the right mouse button went down this frame.
    #[must_use]
    pub const fn right_click(&self) -> bool {
        self.right_click
    }

    /// Cursor position in screen pixels.
    #[must_use]
    pub const fn cursor(&self) -> Vec2Fixed {
        self.cursor
    }

    /// First held pan key in priority order, if any.
    #[must_use]
    pub fn pan_key(&self) -> Option<Key> {
        Key::PAN_PRIORITY
            .into_iter()
            .find(|key| self.is_key_down(*key))
    }

    /// Whether any pan key went down this frame.
    #[must_use]
    pub fn pan_pressed(&self) -> bool {
        Key::PAN_PRIORITY
            .into_iter()
            .any(|key| self.is_key_pressed(key))
    }
}
