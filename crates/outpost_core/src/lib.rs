//! # Outpost Core
//!
//! Deterministic simulation core for the Outpost strategy game.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No device polling
//! - No floating-point math (uses fixed-point)
//!
//! The host samples input, supplies elapsed milliseconds, and provides the
//! tile map and asset loader through the traits in [`services`].
//!
//! ## Crate Structure
//!
//! - [`components`] - Positions, kinds and shared constants
//! - [`entity`] - Units, buildings and resource nodes
//! - [`movement`] - Destination seeking
//! - [`production`] - Timed training
//! - [`economy`] - Ledger, nodes and mining
//! - [`camera`] - Follow and free-roam viewport
//! - [`world`] - Entity ownership and the tick loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod camera;
pub mod components;
pub mod config;
pub mod economy;
pub mod entity;
pub mod error;
pub mod hud;
pub mod input;
pub mod loader;
pub mod math;
pub mod movement;
pub mod production;
pub mod services;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::camera::{Camera, CameraMode};
    pub use crate::components::*;
    pub use crate::config::WorldConfig;
    pub use crate::economy::{Cargo, EconomyEvent, Ledger, MinerState, ResourceKind, ResourceNode};
    pub use crate::entity::{Building, Mine, Selectable, Sprite, Unit};
    pub use crate::error::{GameError, Result};
    pub use crate::hud::HudText;
    pub use crate::input::{InputSnapshot, Key};
    pub use crate::loader::{load_objects_file, parse_objects, Placement};
    pub use crate::math::{Fixed, Vec2Fixed, WideFixed};
    pub use crate::movement::{MoveOutcome, Mover};
    pub use crate::production::{ProductType, ProductionError, ProductionEvent, Trainer};
    pub use crate::services::{AssetLoader, OpenField, SequentialAssets, TileGrid, TileService};
    pub use crate::world::{TickEvents, World, WorldServices};
}
