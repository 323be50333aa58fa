//! Component definitions.
//!
//! Components are plain data. Entities are composed of a shared sprite
//! record plus whichever capabilities their kind carries (see [`crate::entity`]).

use serde::{Deserialize, Serialize};

use crate::economy::ResourceKind;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

/// Interaction radius shared by selection, mining, depositing and activation.
pub const TOLERANCE: Fixed = Fixed::from_bits(32 << 32);

/// Distance at which a mover counts as arrived.
pub const STOP_DIST: Fixed = Fixed::from_bits(1 << 30);

// ============================================================================
// Position
// ============================================================================

/// World-space position of an entity.
///
/// Coordinates are never negative: the setter floors negative values to zero.
/// `Position` is `Copy`, so every getter hands out an independent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(with = "fixed_serde")]
    x: Fixed,
    #[serde(with = "fixed_serde")]
    y: Fixed,
}

impl Position {
    /// Create a position, flooring negative coordinates to zero.
    #[must_use]
    pub fn new(x: Fixed, y: Fixed) -> Self {
        let mut position = Self::default();
        position.set(x, y);
        position
    }

    /// Create a position from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// X coordinate.
    #[must_use]
    pub const fn x(&self) -> Fixed {
        self.x
    }

    /// Y coordinate.
    #[must_use]
    pub const fn y(&self) -> Fixed {
        self.y
    }

    /// Move to `(x, y)`, flooring negative coordinates to zero.
    pub fn set(&mut self, x: Fixed, y: Fixed) {
        self.x = x.max(Fixed::ZERO);
        self.y = y.max(Fixed::ZERO);
    }

    /// The position as a plain vector.
    #[must_use]
    pub const fn as_vec(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.x, self.y)
    }

    /// Straight-line distance to another position.
    #[must_use]
    pub fn distance(&self, other: Self) -> Fixed {
        self.as_vec().distance(other.as_vec())
    }

    /// Whether `other` is within `radius`, boundary included.
    #[must_use]
    pub fn within(&self, other: Self, radius: Fixed) -> bool {
        self.distance(other) <= radius
    }

    /// Whether `other` is strictly closer than `radius`.
    #[must_use]
    pub fn strictly_within(&self, other: Self, radius: Fixed) -> bool {
        self.distance(other) < radius
    }
}

impl From<Vec2Fixed> for Position {
    fn from(value: Vec2Fixed) -> Self {
        Self::new(value.x, value.y)
    }
}

// ============================================================================
// Renderables
// ============================================================================

/// Opaque handle to an entity's visual resource.
///
/// Issued once by the [`crate::services::AssetLoader`] when the entity is
/// constructed; the core never looks inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderHandle(pub u32);

// ============================================================================
// Entity kinds
// ============================================================================

/// Mobile entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Fast explorer, activates pylons.
    Scout,
    /// Constructs factories.
    Builder,
    /// Mines resource nodes.
    Engineer,
    /// Converts itself into a command centre.
    Truck,
}

impl UnitKind {
    /// Movement speed in world units per millisecond.
    #[must_use]
    pub fn speed(self) -> Fixed {
        use crate::math::ratio;

        match self {
            Self::Scout => ratio(3, 10),
            Self::Truck => ratio(1, 4),
            Self::Builder | Self::Engineer => ratio(1, 10),
        }
    }
}

/// Stationary entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingKind {
    /// Trains scouts, builders and engineers; accepts deposits.
    CommandCentre,
    /// Trains trucks.
    Factory,
    /// Raises the carry allowance once a unit reaches it.
    Pylon,
}

/// Tagged union over every entity type the world can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A mobile unit.
    Unit(UnitKind),
    /// A stationary building.
    Building(BuildingKind),
    /// A resource node.
    Resource(ResourceKind),
}

impl EntityKind {
    /// Every kind, in a stable order.
    pub const ALL: [Self; 9] = [
        Self::Building(BuildingKind::CommandCentre),
        Self::Building(BuildingKind::Factory),
        Self::Building(BuildingKind::Pylon),
        Self::Resource(ResourceKind::Metal),
        Self::Resource(ResourceKind::Unobtainium),
        Self::Unit(UnitKind::Scout),
        Self::Unit(UnitKind::Builder),
        Self::Unit(UnitKind::Engineer),
        Self::Unit(UnitKind::Truck),
    ];

    /// Name used in initial-state files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Building(BuildingKind::CommandCentre) => "command_centre",
            Self::Building(BuildingKind::Factory) => "factory",
            Self::Building(BuildingKind::Pylon) => "pylon",
            Self::Resource(ResourceKind::Metal) => "metal_mine",
            Self::Resource(ResourceKind::Unobtainium) => "unobtainium_mine",
            Self::Unit(UnitKind::Scout) => "scout",
            Self::Unit(UnitKind::Builder) => "builder",
            Self::Unit(UnitKind::Engineer) => "engineer",
            Self::Unit(UnitKind::Truck) => "truck",
        }
    }

    /// Parse a name from an initial-state file.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Key handed to the asset loader for this kind's image.
    #[must_use]
    pub const fn asset_key(self) -> &'static str {
        match self {
            Self::Building(BuildingKind::CommandCentre) => "buildings/command_centre.png",
            Self::Building(BuildingKind::Factory) => "buildings/factory.png",
            Self::Building(BuildingKind::Pylon) => "buildings/pylon.png",
            Self::Resource(ResourceKind::Metal) => "resources/metal_mine.png",
            Self::Resource(ResourceKind::Unobtainium) => "resources/unobtainium_mine.png",
            Self::Unit(UnitKind::Scout) => "units/scout.png",
            Self::Unit(UnitKind::Builder) => "units/builder.png",
            Self::Unit(UnitKind::Engineer) => "units/engineer.png",
            Self::Unit(UnitKind::Truck) => "units/truck.png",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
