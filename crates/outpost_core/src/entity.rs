//! Entity records.
//!
//! Every entity shares a [`Sprite`] (identity, position, render handle).
//! Behaviour is attached by capability rather than by type hierarchy: a
//! [`Unit`] always has a [`Mover`], and carries a [`Trainer`] or a
//! [`MinerState`] only when its kind needs one. Buildings likewise.

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::components::{BuildingKind, EntityId, EntityKind, Position, RenderHandle, UnitKind};
use crate::economy::{MinerState, ResourceKind, ResourceNode};
use crate::movement::Mover;
use crate::production::Trainer;

/// State shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    /// Identity, unique for the session.
    pub id: EntityId,
    /// World position.
    pub position: Position,
    /// Visual resource, opaque to the core.
    pub renderable: RenderHandle,
}

/// Single-active-selection protocol.
pub trait Selectable {
    /// Mark selected and ask the camera to follow.
    fn select(&mut self, camera: &mut Camera);

    /// Clear the selected flag.
    fn deselect(&mut self);

    /// Whether currently selected.
    fn is_selected(&self) -> bool;

    /// Where the entity stands, used for picking.
    fn position(&self) -> Position;
}

/// A mobile entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Shared state.
    pub sprite: Sprite,
    /// Unit type.
    pub kind: UnitKind,
    /// Movement capability.
    pub mover: Mover,
    /// Selection flag.
    pub selected: bool,
    /// Present on Builders and Trucks.
    pub trainer: Option<Trainer>,
    /// Present on Engineers.
    pub miner: Option<MinerState>,
}

impl Unit {
    /// A stationary, unselected unit of `kind`.
    #[must_use]
    pub fn new(sprite: Sprite, kind: UnitKind) -> Self {
        let trainer = matches!(kind, UnitKind::Builder | UnitKind::Truck).then(Trainer::new);
        let miner = matches!(kind, UnitKind::Engineer).then(MinerState::default);
        Self {
            mover: Mover::new(sprite.position),
            sprite,
            kind,
            selected: false,
            trainer,
            miner,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.sprite.id
    }

    /// Tagged kind.
    #[must_use]
    pub const fn entity_kind(&self) -> EntityKind {
        EntityKind::Unit(self.kind)
    }

    /// Whether a trainer is mid-production.
    #[must_use]
    pub fn is_training(&self) -> bool {
        self.trainer.is_some_and(|t| t.is_busy())
    }
}

impl Selectable for Unit {
    fn select(&mut self, camera: &mut Camera) {
        self.selected = true;
        camera.track(self.sprite.id);
    }

    fn deselect(&mut self) {
        self.selected = false;
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn position(&self) -> Position {
        self.sprite.position
    }
}

/// A stationary structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Shared state.
    pub sprite: Sprite,
    /// Building type.
    pub kind: BuildingKind,
    /// Selection flag.
    pub selected: bool,
    /// Present on Command Centres and Factories.
    pub trainer: Option<Trainer>,
    /// Pylons only: set once a unit has reached it.
    pub activated: bool,
}

impl Building {
    /// An unselected building of `kind`.
    #[must_use]
    pub fn new(sprite: Sprite, kind: BuildingKind) -> Self {
        let trainer = matches!(kind, BuildingKind::CommandCentre | BuildingKind::Factory)
            .then(Trainer::new);
        Self {
            sprite,
            kind,
            selected: false,
            trainer,
            activated: false,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.sprite.id
    }

    /// Tagged kind.
    #[must_use]
    pub const fn entity_kind(&self) -> EntityKind {
        EntityKind::Building(self.kind)
    }

    /// Whether this building accepts deposits.
    #[must_use]
    pub const fn is_depot(&self) -> bool {
        matches!(self.kind, BuildingKind::CommandCentre)
    }
}

impl Selectable for Building {
    fn select(&mut self, camera: &mut Camera) {
        self.selected = true;
        camera.track(self.sprite.id);
    }

    fn deselect(&mut self) {
        self.selected = false;
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn position(&self) -> Position {
        self.sprite.position
    }
}

/// A resource node placed in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mine {
    /// Shared state.
    pub sprite: Sprite,
    /// Remaining resource.
    pub node: ResourceNode,
    /// Set once the node has been queued for removal.
    pub doomed: bool,
}

impl Mine {
    /// A full node of `kind`.
    #[must_use]
    pub const fn new(sprite: Sprite, kind: ResourceKind) -> Self {
        Self {
            sprite,
            node: ResourceNode::new(kind),
            doomed: false,
        }
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.sprite.id
    }

    /// Tagged kind.
    #[must_use]
    pub const fn entity_kind(&self) -> EntityKind {
        EntityKind::Resource(self.node.kind())
    }
}
