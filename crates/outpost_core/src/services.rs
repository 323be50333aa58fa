//! Narrow interfaces to the collaborators the core does not own.
//!
//! - [`TileService`]: per-tile movement and construction flags.
//! - [`AssetLoader`]: hands out opaque render handles for new entities.
//!
//! Two ready-made tile services are provided: [`TileGrid`], loaded from RON,
//! and [`OpenField`], where everything is passable and buildable.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::{Position, RenderHandle};
use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Default tile edge length in pixels.
pub const TILE_SIZE: u32 = 64;

/// Spatial queries backed by an external tile map.
pub trait TileService {
    /// Whether a mover may occupy the point `(x, y)`.
    fn is_position_free(&self, x: Fixed, y: Fixed) -> bool;

    /// Whether a structure may be raised at `position`.
    fn can_build_here(&self, position: Position) -> bool;

    /// Map size in pixels as `(width, height)`.
    fn map_size(&self) -> (u32, u32);
}

/// Source of renderable handles.
///
/// Failing here is how the entity factory reports an error.
pub trait AssetLoader {
    /// Load (or look up) the visual resource for `key`.
    fn load(&mut self, key: &str) -> Result<RenderHandle>;
}

/// Loader that never fails and numbers handles sequentially.
#[derive(Debug, Default, Clone)]
pub struct SequentialAssets {
    next: u32,
}

impl AssetLoader for SequentialAssets {
    fn load(&mut self, _key: &str) -> Result<RenderHandle> {
        let handle = RenderHandle(self.next);
        self.next = self.next.wrapping_add(1);
        Ok(handle)
    }
}

/// A map with no solid or occupied tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenField {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TileService for OpenField {
    fn is_position_free(&self, x: Fixed, y: Fixed) -> bool {
        x >= Fixed::ZERO && y >= Fixed::ZERO
    }

    fn can_build_here(&self, _position: Position) -> bool {
        true
    }

    fn map_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Tile map described by the tiles that carry a flag.
///
/// ```ron
/// TileGrid(
///     tile_size: 64,
///     width: 50,
///     height: 40,
///     solid: [(3, 4), (3, 5)],
///     occupied: [(10, 10)],
/// )
/// ```
///
/// Points outside the grid are neither free nor buildable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Tile edge length in pixels.
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tiles that block movement, as `(column, row)`.
    #[serde(default)]
    pub solid: BTreeSet<(u32, u32)>,
    /// Tiles that refuse construction, as `(column, row)`.
    #[serde(default)]
    pub occupied: BTreeSet<(u32, u32)>,
}

const fn default_tile_size() -> u32 {
    TILE_SIZE
}

impl TileGrid {
    /// An unflagged grid of `width × height` tiles.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tile_size: TILE_SIZE,
            width,
            height,
            solid: BTreeSet::new(),
            occupied: BTreeSet::new(),
        }
    }

    /// Mark a tile solid.
    #[must_use]
    pub fn with_solid(mut self, column: u32, row: u32) -> Self {
        self.solid.insert((column, row));
        self
    }

    /// Mark a tile occupied.
    #[must_use]
    pub fn with_occupied(mut self, column: u32, row: u32) -> Self {
        self.occupied.insert((column, row));
        self
    }

    /// Load a grid from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        ron::from_str(&contents).map_err(|e| GameError::DataParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Parse a grid from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Tile containing the pixel `(x, y)`, if it lies on the map.
    #[must_use]
    pub fn tile_at(&self, x: Fixed, y: Fixed) -> Option<(u32, u32)> {
        if x < Fixed::ZERO || y < Fixed::ZERO || self.tile_size == 0 {
            return None;
        }
        let size = Fixed::from_num(self.tile_size);
        let column: u32 = (x / size).floor().checked_to_num()?;
        let row: u32 = (y / size).floor().checked_to_num()?;
        (column < self.width && row < self.height).then_some((column, row))
    }
}

impl TileService for TileGrid {
    fn is_position_free(&self, x: Fixed, y: Fixed) -> bool {
        self.tile_at(x, y)
            .is_some_and(|tile| !self.solid.contains(&tile))
    }

    fn can_build_here(&self, position: Position) -> bool {
        self.tile_at(position.x(), position.y())
            .is_some_and(|tile| !self.occupied.contains(&tile))
    }

    fn map_size(&self) -> (u32, u32) {
        (
            self.width.saturating_mul(self.tile_size),
            self.height.saturating_mul(self.tile_size),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_lookup() {
        let grid = TileGrid::new(4, 3);
        assert_eq!(
            grid.tile_at(Fixed::from_num(65), Fixed::from_num(10)),
            Some((1, 0))
        );
        assert_eq!(grid.tile_at(Fixed::from_num(256), Fixed::ZERO), None);
        assert_eq!(grid.tile_at(Fixed::from_num(-1), Fixed::ZERO), None);
    }

    #[test]
    fn test_solid_tiles_block_movement() {
        let grid = TileGrid::new(4, 4).with_solid(1, 1);
        assert!(grid.is_position_free(Fixed::from_num(10), Fixed::from_num(10)));
        assert!(!grid.is_position_free(Fixed::from_num(70), Fixed::from_num(70)));
        assert!(!grid.is_position_free(Fixed::from_num(300), Fixed::from_num(10)));
    }

    #[test]
    fn test_occupied_tiles_refuse_construction() {
        let grid = TileGrid::new(4, 4).with_occupied(0, 0);
        assert!(!grid.can_build_here(Position::from_ints(5, 5)));
        assert!(grid.can_build_here(Position::from_ints(100, 5)));
        // occupied does not imply solid
        assert!(grid.is_position_free(Fixed::from_num(5), Fixed::from_num(5)));
    }

    #[test]
    fn test_grid_from_ron() {
        let grid = TileGrid::from_ron_str(
            "(width: 10, height: 8, solid: [(2, 3)], occupied: [(4, 4)])",
        )
        .expect("valid grid");
        assert_eq!(grid.tile_size, TILE_SIZE);
        assert_eq!(grid.map_size(), (640, 512));
        assert!(grid.solid.contains(&(2, 3)));
    }

    #[test]
    fn test_sequential_assets_hand_out_distinct_handles() {
        let mut assets = SequentialAssets::default();
        let a = assets.load("units/scout.png").expect("load");
        let b = assets.load("units/scout.png").expect("load");
        assert_ne!(a, b);
    }
}
