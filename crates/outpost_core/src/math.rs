//! Fixed-point math utilities for deterministic simulation.
//!
//! All game simulation uses fixed-point arithmetic so that the same input
//! sequence reproduces the same world on every machine. Distances, bearings
//! and per-tick steps are all computed on [`Fixed`] values.

use fixed::types::{I32F32, I64F64};
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Wide fixed-point type for squared lengths.
///
/// The square of any [`Fixed`] coordinate difference fits without overflow
/// or loss, so distance comparisons stay exact across the whole map.
pub type WideFixed = I64F64;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Build a [`Fixed`] from a ratio of integers, e.g. `ratio(1, 10)` for 0.1.
///
/// Speeds and tuning constants are written this way so that no float ever
/// enters the simulation.
#[must_use]
pub fn ratio(numerator: i32, denominator: i32) -> Fixed {
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> WideFixed {
        let dx = widen(self.x) - widen(other.x);
        let dy = widen(self.y) - widen(other.y);
        dx * dx + dy * dy
    }

    /// Straight-line distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        wide_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> WideFixed {
        widen(self.x) * widen(other.x) + widen(self.y) * widen(other.y)
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        wide_sqrt(self.dot(self))
    }

    /// Scale both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize vector using fixed-point math.
    ///
    /// This is the bearing from the origin toward `self` expressed as
    /// `(cos θ, sin θ)`; the zero vector has no bearing and stays zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Unit bearing from `self` toward `other`.
    #[must_use]
    pub fn direction_to(self, other: Self) -> Self {
        (other - self).normalize()
    }

    /// Advance from `self` toward `target` by at most `step` units.
    ///
    /// Never overshoots: if the remaining distance is shorter than the
    /// step, the result is exactly `target`.
    #[must_use]
    pub fn step_toward(self, target: Self, step: Fixed) -> Self {
        let remaining = self.distance(target);
        if remaining <= step {
            return target;
        }
        self + self.direction_to(target).scale(step)
    }
}

fn widen(value: Fixed) -> WideFixed {
    WideFixed::from_num(value)
}

/// Square root of a fixed-point number, rounded to the nearest step.
///
/// Pure integer arithmetic, so the result is bit-identical on every
/// platform. Perfect squares come back exact.
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    wide_sqrt(widen(value))
}

/// Square root of a wide value, rounded to the nearest [`Fixed`] step.
///
/// The bits of an `I64F64` are `v · 2⁶⁴`, so the integer square root of
/// those bits is `√v · 2³²`: exactly the bits of the `I32F32` result.
/// Results beyond the [`Fixed`] range saturate.
pub fn wide_sqrt(value: WideFixed) -> Fixed {
    if value <= WideFixed::ZERO {
        return Fixed::ZERO;
    }
    let bits = value.to_bits().unsigned_abs();
    let mut root = isqrt(bits);
    if bits - root * root > root {
        root += 1;
    }
    i64::try_from(root).map_or(Fixed::MAX, Fixed::from_bits)
}

/// Integer square root, rounded down (digit-by-digit method).
fn isqrt(n: u128) -> u128 {
    let mut remainder = n;
    let mut root = 0u128;
    let mut bit = 1u128 << 126;
    while bit > n {
        bit >>= 2;
    }
    while bit != 0 {
        if remainder >= root + bit {
            remainder -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
