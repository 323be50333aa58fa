//! Test fixtures and helpers.
//!
//! Pre-built worlds and a [`Session`] that bundles a world with its tile
//! service and asset loader so tests can drive ticks in one call.

use outpost_core::components::{EntityId, EntityKind, Position, RenderHandle};
use outpost_core::config::WorldConfig;
use outpost_core::economy::Ledger;
use outpost_core::error::{GameError, Result};
use outpost_core::input::{InputSnapshot, Key};
use outpost_core::loader::Placement;
use outpost_core::services::{AssetLoader, OpenField, SequentialAssets, TileService};
use outpost_core::world::{TickEvents, World, WorldServices};

/// Shorthand for a placement at integer coordinates.
#[must_use]
pub fn place(kind: EntityKind, x: i32, y: i32) -> Placement {
    Placement {
        kind,
        position: Position::from_ints(x, y),
    }
}

/// A 50 × 40 tile open map (3200 × 2560 pixels).
#[must_use]
pub const fn open_field() -> OpenField {
    OpenField {
        width: 3200,
        height: 2560,
    }
}

/// Asset loader that succeeds a fixed number of times, then fails.
#[derive(Debug, Clone)]
pub struct FailingAssets {
    remaining: usize,
    inner: SequentialAssets,
}

impl FailingAssets {
    /// Fail on every load.
    #[must_use]
    pub fn always() -> Self {
        Self::after(0)
    }

    /// Succeed `successes` times, then fail.
    #[must_use]
    pub fn after(successes: usize) -> Self {
        Self {
            remaining: successes,
            inner: SequentialAssets::default(),
        }
    }
}

impl AssetLoader for FailingAssets {
    fn load(&mut self, key: &str) -> Result<RenderHandle> {
        if self.remaining == 0 {
            return Err(GameError::AssetLoad {
                key: key.to_string(),
                message: "fixture loader exhausted".to_string(),
            });
        }
        self.remaining -= 1;
        self.inner.load(key)
    }
}

/// A world plus the collaborators needed to tick it.
pub struct Session<T: TileService, A: AssetLoader = SequentialAssets> {
    /// The world under test.
    pub world: World,
    /// Tile service handed to every tick.
    pub tiles: T,
    /// Asset loader handed to every tick.
    pub assets: A,
}

impl<T: TileService> Session<T> {
    /// Build a session from placements with default config and a loader
    /// that never fails.
    ///
    /// # Panics
    ///
    /// Panics if the world cannot be populated.
    pub fn new(tiles: T, placements: &[Placement]) -> Self {
        Self::with_assets(tiles, SequentialAssets::default(), placements)
    }
}

impl<T: TileService, A: AssetLoader> Session<T, A> {
    /// Build a session with a specific asset loader.
    ///
    /// # Panics
    ///
    /// Panics if the world cannot be populated.
    pub fn with_assets(tiles: T, mut assets: A, placements: &[Placement]) -> Self {
        let world = World::from_placements(WorldConfig::default(), placements, &tiles, &mut assets)
            .expect("fixture world should populate");
        Self {
            world,
            tiles,
            assets,
        }
    }

    /// Replace the ledger with one holding `metal`.
    #[must_use]
    pub fn with_metal(mut self, metal: u32) -> Self {
        self.world = self.world.with_ledger(Ledger::new(metal, 0));
        self
    }

    /// Run one tick.
    pub fn step(&mut self, input: &InputSnapshot, elapsed_ms: u32) -> TickEvents {
        let mut services = WorldServices {
            tiles: &self.tiles,
            assets: &mut self.assets,
        };
        self.world.tick(input, elapsed_ms, &mut services)
    }

    /// Run `ticks` ticks with no input, collecting every report.
    pub fn idle(&mut self, ticks: usize, elapsed_ms: u32) -> Vec<TickEvents> {
        (0..ticks)
            .map(|_| self.step(&InputSnapshot::empty(), elapsed_ms))
            .collect()
    }

    /// Left click on a world position.
    pub fn click_world(&mut self, at: Position, elapsed_ms: u32) -> TickEvents {
        let screen = self.world.camera().world_to_screen(at.as_vec());
        let input = InputSnapshot::empty()
            .with_left_click(0, 0)
            .with_cursor(screen.x, screen.y);
        self.step(&input, elapsed_ms)
    }

    /// Left click on an entity.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not alive.
    pub fn select(&mut self, id: EntityId) -> TickEvents {
        let at = self.world.position_of(id).expect("entity to select");
        self.click_world(at, 1)
    }

    /// Right click on a world position.
    pub fn order_to(&mut self, at: Position, elapsed_ms: u32) -> TickEvents {
        let screen = self.world.camera().world_to_screen(at.as_vec());
        let input = InputSnapshot::empty()
            .with_right_click(0, 0)
            .with_cursor(screen.x, screen.y);
        self.step(&input, elapsed_ms)
    }

    /// Press a key for one tick.
    pub fn press(&mut self, key: Key, elapsed_ms: u32) -> TickEvents {
        self.step(&InputSnapshot::empty().with_key_pressed(key), elapsed_ms)
    }
}
