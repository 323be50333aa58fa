//! Timed production of new entities.
//!
//! Command Centres, Factories, Builders and Trucks each carry a [`Trainer`].
//! A trainer makes one product at a time: a request debits the ledger up
//! front, the trainer counts elapsed time, and on completion it hands the
//! product back to the world to spawn. There is no queue and no refund.

use serde::{Deserialize, Serialize};

use crate::components::{BuildingKind, EntityId, EntityKind, Position, UnitKind};
use crate::economy::Ledger;
use crate::input::Key;
use crate::services::TileService;

/// Everything a trainer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    /// Trained by Command Centres.
    Scout,
    /// Trained by Command Centres.
    Builder,
    /// Trained by Command Centres.
    Engineer,
    /// Trained by Factories.
    Truck,
    /// Raised by Builders.
    Factory,
    /// Raised by Trucks, which are consumed.
    CommandCentre,
}

impl ProductType {
    /// Metal debited when the request is accepted.
    #[must_use]
    pub const fn cost(self) -> u32 {
        match self {
            Self::Scout => 5,
            Self::Builder => 10,
            Self::Engineer => 20,
            Self::Truck => 150,
            Self::Factory => 100,
            Self::CommandCentre => 0,
        }
    }

    /// Training time in milliseconds.
    #[must_use]
    pub const fn duration_ms(self) -> u32 {
        match self {
            Self::Scout | Self::Builder | Self::Engineer | Self::Truck => 5000,
            Self::Factory => 10_000,
            Self::CommandCentre => 15_000,
        }
    }

    /// Entity spawned on completion.
    #[must_use]
    pub const fn entity_kind(self) -> EntityKind {
        match self {
            Self::Scout => EntityKind::Unit(UnitKind::Scout),
            Self::Builder => EntityKind::Unit(UnitKind::Builder),
            Self::Engineer => EntityKind::Unit(UnitKind::Engineer),
            Self::Truck => EntityKind::Unit(UnitKind::Truck),
            Self::Factory => EntityKind::Building(BuildingKind::Factory),
            Self::CommandCentre => EntityKind::Building(BuildingKind::CommandCentre),
        }
    }

    /// Structures need a buildable tile under the producer.
    #[must_use]
    pub const fn needs_site(self) -> bool {
        matches!(self, Self::Factory | Self::CommandCentre)
    }

    /// What `producer` makes when `key` is pressed, if anything.
    #[must_use]
    pub const fn offered_by(producer: EntityKind, key: Key) -> Option<Self> {
        match (producer, key) {
            (EntityKind::Building(BuildingKind::CommandCentre), Key::Num1) => Some(Self::Scout),
            (EntityKind::Building(BuildingKind::CommandCentre), Key::Num2) => Some(Self::Builder),
            (EntityKind::Building(BuildingKind::CommandCentre), Key::Num3) => Some(Self::Engineer),
            (EntityKind::Building(BuildingKind::Factory), Key::Num1) => Some(Self::Truck),
            (EntityKind::Unit(UnitKind::Builder), Key::Num1) => Some(Self::Factory),
            (EntityKind::Unit(UnitKind::Truck), Key::Num1) => Some(Self::CommandCentre),
            _ => None,
        }
    }
}

/// Trainer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrainerState {
    /// Ready to accept a request.
    #[default]
    Idle,
    /// Making `product`; `elapsed_ms` accrued so far.
    Training {
        /// What is being made.
        product: ProductType,
        /// Time accrued.
        elapsed_ms: u32,
    },
}

/// Production capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trainer {
    state: TrainerState,
}

impl Trainer {
    /// An idle trainer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TrainerState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TrainerState {
        self.state
    }

    /// Whether a product is in progress.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self.state, TrainerState::Training { .. })
    }

    /// Start making `product` at `site`.
    ///
    /// Rejected while busy, when a structure's site is not buildable, or when
    /// the ledger cannot cover the cost. Only an accepted request touches the
    /// ledger.
    pub fn request(
        &mut self,
        product: ProductType,
        site: Position,
        ledger: &mut Ledger,
        tiles: &dyn TileService,
    ) -> Result<(), ProductionError> {
        if self.is_busy() {
            return Err(ProductionError::Busy);
        }
        if product.needs_site() && !tiles.can_build_here(site) {
            return Err(ProductionError::CannotBuildHere);
        }
        if !ledger.spend(product.cost()) {
            return Err(ProductionError::InsufficientResources {
                required: product.cost(),
                available: ledger.metal(),
            });
        }
        self.state = TrainerState::Training {
            product,
            elapsed_ms: 0,
        };
        Ok(())
    }

    /// Accrue `elapsed_ms`. Returns the product once its duration is reached,
    /// leaving the trainer idle.
    pub fn advance(&mut self, elapsed_ms: u32) -> Option<ProductType> {
        let TrainerState::Training {
            product,
            elapsed_ms: accrued,
        } = self.state
        else {
            return None;
        };

        let accrued = accrued.saturating_add(elapsed_ms);
        if accrued >= product.duration_ms() {
            self.state = TrainerState::Idle;
            Some(product)
        } else {
            self.state = TrainerState::Training {
                product,
                elapsed_ms: accrued,
            };
            None
        }
    }
}

/// Why a production request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionError {
    /// Already making something.
    Busy,
    /// Not enough metal.
    InsufficientResources {
        /// Cost of the product.
        required: u32,
        /// Metal on hand.
        available: u32,
    },
    /// Structures cannot be raised on this tile.
    CannotBuildHere,
}

impl std::fmt::Display for ProductionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "Producer is busy"),
            Self::InsufficientResources {
                required,
                available,
            } => write!(f, "Insufficient metal: need {required}, have {available}"),
            Self::CannotBuildHere => write!(f, "Cannot build here"),
        }
    }
}

impl std::error::Error for ProductionError {}

/// Events generated by production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionEvent {
    /// A request was accepted and paid for.
    Started {
        /// The producer.
        producer: EntityId,
        /// What it is making.
        product: ProductType,
    },
    /// A request was turned down.
    Rejected {
        /// The producer.
        producer: EntityId,
        /// What was asked for.
        product: ProductType,
        /// Why.
        reason: ProductionError,
    },
    /// A product was spawned.
    Completed {
        /// The producer.
        producer: EntityId,
        /// What was made.
        product: ProductType,
        /// The new entity.
        spawned: EntityId,
    },
    /// The product finished but could not be created.
    SpawnFailed {
        /// The producer.
        producer: EntityId,
        /// What was lost.
        product: ProductType,
    },
}
