//! Scenario loading and configuration.
//!
//! A scenario bundles everything needed to play a session without a
//! window: the world config, the tile map, the starting entities and a
//! script of input frames.
//!
//! ```ron
//! Scenario(
//!     name: "First deposit",
//!     map: Open(width: 3200, height: 2560),
//!     entities: [
//!         (kind: "command_centre", x: 400, y: 400),
//!         (kind: "metal_mine", x: 600, y: 400),
//!         (kind: "engineer", x: 600, y: 410),
//!     ],
//!     idle_ticks: 200,
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use outpost_core::components::{EntityKind, Position};
use outpost_core::config::WorldConfig;
use outpost_core::error::GameError;
use outpost_core::input::{InputSnapshot, Key};
use outpost_core::loader::{load_objects_file, Placement};
use outpost_core::math::Fixed;
use outpost_core::services::{OpenField, TileGrid, TileService};

/// Frame time used when a scenario does not give one (about 60 fps).
pub const DEFAULT_FRAME_MS: u32 = 16;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// An entity row names a kind that does not exist.
    #[error("Unknown entity kind '{0}'")]
    UnknownKind(String),
    /// The world rejected the scenario.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Tile map for a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapSetup {
    /// Everything passable and buildable.
    Open {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A tile grid written inline.
    Grid(TileGrid),
    /// A tile grid in its own RON file, relative to the scenario.
    GridFile(PathBuf),
}

impl Default for MapSetup {
    fn default() -> Self {
        Self::Open {
            width: 3200,
            height: 2560,
        }
    }
}

/// Resolved tile service for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tiles {
    /// See [`OpenField`].
    Open(OpenField),
    /// See [`TileGrid`].
    Grid(TileGrid),
}

impl TileService for Tiles {
    fn is_position_free(&self, x: Fixed, y: Fixed) -> bool {
        match self {
            Self::Open(field) => field.is_position_free(x, y),
            Self::Grid(grid) => grid.is_position_free(x, y),
        }
    }

    fn can_build_here(&self, position: Position) -> bool {
        match self {
            Self::Open(field) => field.can_build_here(position),
            Self::Grid(grid) => grid.can_build_here(position),
        }
    }

    fn map_size(&self) -> (u32, u32) {
        match self {
            Self::Open(field) => field.map_size(),
            Self::Grid(grid) => grid.map_size(),
        }
    }
}

/// A starting entity, by file name and pixel coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRow {
    /// Kind name as used in initial-state files (`engineer`, `pylon`, ...).
    pub kind: String,
    /// X in pixels.
    pub x: i32,
    /// Y in pixels.
    pub y: i32,
}

impl EntityRow {
    /// Create a new entity row.
    #[must_use]
    pub fn new(kind: &str, x: i32, y: i32) -> Self {
        Self {
            kind: kind.to_string(),
            x,
            y,
        }
    }

    fn to_placement(&self) -> Result<Placement, ScenarioError> {
        let kind = EntityKind::from_name(&self.kind)
            .ok_or_else(|| ScenarioError::UnknownKind(self.kind.clone()))?;
        Ok(Placement {
            kind,
            position: Position::from_ints(self.x, self.y),
        })
    }
}

/// One scripted input frame.
///
/// The frame is played `repeat` times. Presses and clicks happen on the
/// first repetition only; held keys stay down for all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    /// Milliseconds since the previous frame.
    pub elapsed_ms: u32,
    /// How many ticks this frame lasts.
    pub repeat: u32,
    /// Keys that went down this frame.
    pub pressed: Vec<Key>,
    /// Keys held for the whole frame.
    pub held: Vec<Key>,
    /// Left click at screen pixels.
    pub left_click: Option<(i32, i32)>,
    /// Right click at screen pixels.
    pub right_click: Option<(i32, i32)>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            elapsed_ms: DEFAULT_FRAME_MS,
            repeat: 1,
            pressed: Vec::new(),
            held: Vec::new(),
            left_click: None,
            right_click: None,
        }
    }
}

impl Frame {
    /// Expand into `(input, elapsed)` pairs, one per tick.
    #[must_use]
    pub fn expand(&self) -> Vec<(InputSnapshot, u32)> {
        let held = self
            .held
            .iter()
            .fold(InputSnapshot::empty(), |input, key| input.with_key_down(*key));

        let mut first = self
            .pressed
            .iter()
            .fold(held, |input, key| input.with_key_pressed(*key));
        if let Some((x, y)) = self.left_click {
            first = first.with_left_click(x, y);
        }
        if let Some((x, y)) = self.right_click {
            first = first.with_right_click(x, y);
        }

        let mut ticks = Vec::with_capacity(self.repeat as usize);
        for n in 0..self.repeat {
            let input = if n == 0 { first } else { held };
            ticks.push((input, self.elapsed_ms));
        }
        ticks
    }
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// World tunables.
    #[serde(default)]
    pub config: WorldConfig,
    /// Tile map.
    #[serde(default)]
    pub map: MapSetup,
    /// Starting entities, created after any `objects_file` rows.
    #[serde(default)]
    pub entities: Vec<EntityRow>,
    /// Optional initial-state file (`type,x,y` rows), relative to the scenario.
    #[serde(default)]
    pub objects_file: Option<PathBuf>,
    /// Scripted input.
    #[serde(default)]
    pub script: Vec<Frame>,
    /// Ticks with no input after the script.
    #[serde(default)]
    pub idle_ticks: u32,
    /// Frame time for the idle ticks.
    #[serde(default = "default_frame_ms")]
    pub idle_elapsed_ms: u32,
}

fn default_frame_ms() -> u32 {
    DEFAULT_FRAME_MS
}

impl Default for Scenario {
    fn default() -> Self {
        Self::first_deposit()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// An Engineer beside a metal node and a Command Centre, left to mine.
    #[must_use]
    pub fn first_deposit() -> Self {
        Self {
            name: "First deposit".to_string(),
            description: "One engineer mines metal and hauls it home".to_string(),
            config: WorldConfig::default(),
            map: MapSetup::default(),
            entities: vec![
                EntityRow::new("command_centre", 400, 400),
                EntityRow::new("metal_mine", 600, 400),
                EntityRow::new("engineer", 600, 410),
                EntityRow::new("pylon", 900, 900),
            ],
            objects_file: None,
            script: Vec::new(),
            idle_ticks: 600,
            idle_elapsed_ms: DEFAULT_FRAME_MS,
        }
    }

    /// Resolve the tile map. Relative paths are taken from `base_dir`.
    pub fn tiles(&self, base_dir: Option<&Path>) -> Result<Tiles, ScenarioError> {
        Ok(match &self.map {
            MapSetup::Open { width, height } => Tiles::Open(OpenField {
                width: *width,
                height: *height,
            }),
            MapSetup::Grid(grid) => Tiles::Grid(grid.clone()),
            MapSetup::GridFile(path) => Tiles::Grid(TileGrid::load(resolve(base_dir, path))?),
        })
    }

    /// Resolve every starting placement: file rows first, then inline rows.
    pub fn placements(&self, base_dir: Option<&Path>) -> Result<Vec<Placement>, ScenarioError> {
        let mut placements = match &self.objects_file {
            Some(path) => load_objects_file(resolve(base_dir, path))?,
            None => Vec::new(),
        };
        for row in &self.entities {
            placements.push(row.to_placement()?);
        }
        Ok(placements)
    }

    /// The whole script flattened to one entry per tick, idle ticks included.
    #[must_use]
    pub fn ticks(&self) -> Vec<(InputSnapshot, u32)> {
        let mut ticks: Vec<_> = self.script.iter().flat_map(Frame::expand).collect();
        ticks.extend(
            (0..self.idle_ticks).map(|_| (InputSnapshot::empty(), self.idle_elapsed_ms)),
        );
        ticks
    }
}

fn resolve(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scenario_uses_defaults() {
        let scenario = Scenario::from_ron_str(r#"(name: "Empty")"#).unwrap();
        assert_eq!(scenario.name, "Empty");
        assert_eq!(scenario.map, MapSetup::default());
        assert_eq!(scenario.config, WorldConfig::default());
        assert!(scenario.ticks().is_empty());
    }

    #[test]
    fn test_scenario_from_ron() {
        let ron = r#"
            Scenario(
                name: "Train",
                config: (starting_metal: 20),
                map: Open(width: 640, height: 640),
                entities: [(kind: "command_centre", x: 100, y: 100)],
                script: [
                    (left_click: Some((100, 100))),
                    (pressed: [Num1], elapsed_ms: 100, repeat: 50),
                ],
                idle_ticks: 3,
                idle_elapsed_ms: 10,
            )
        "#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.config.starting_metal, 20);
        assert_eq!(scenario.config.view_width, 1024);

        let ticks = scenario.ticks();
        assert_eq!(ticks.len(), 1 + 50 + 3);
        assert!(ticks[0].0.left_click());
        assert!(ticks[1].0.is_key_pressed(Key::Num1));
        assert!(!ticks[2].0.is_key_pressed(Key::Num1));
        assert_eq!(ticks[2].1, 100);
        assert_eq!(ticks[53].1, 10);
    }

    #[test]
    fn test_frame_holds_keys_on_every_repeat() {
        let frame = Frame {
            repeat: 3,
            held: vec![Key::D],
            pressed: vec![Key::D],
            ..Frame::default()
        };
        let ticks = frame.expand();
        assert_eq!(ticks.len(), 3);
        assert!(ticks[0].0.is_key_pressed(Key::D));
        assert!(ticks.iter().all(|(input, _)| input.is_key_down(Key::D)));
        assert!(!ticks[1].0.is_key_pressed(Key::D));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let scenario = Scenario {
            entities: vec![EntityRow::new("dreadnought", 0, 0)],
            ..Scenario::first_deposit()
        };
        assert!(matches!(
            scenario.placements(None),
            Err(ScenarioError::UnknownKind(kind)) if kind == "dreadnought"
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Scenario::load("/nonexistent/outpost.ron");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_objects_file_rows_come_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("start.txt"), "pylon,10,20\nbogus\n").unwrap();

        let scenario = Scenario {
            objects_file: Some(PathBuf::from("start.txt")),
            entities: vec![EntityRow::new("scout", 5, 5)],
            ..Scenario::first_deposit()
        };
        let placements = scenario.placements(Some(dir.path())).unwrap();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].kind.name(), "pylon");
        assert_eq!(placements[1].kind.name(), "scout");
    }

    #[test]
    fn test_grid_file_resolves_relative_to_scenario() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("map.ron"),
            "(width: 10, height: 8, solid: [(1, 1)])",
        )
        .unwrap();

        let scenario = Scenario {
            map: MapSetup::GridFile(PathBuf::from("map.ron")),
            ..Scenario::first_deposit()
        };
        let tiles = scenario.tiles(Some(dir.path())).unwrap();
        assert_eq!(tiles.map_size(), (640, 512));
        assert!(!tiles.is_position_free(Fixed::from_num(70), Fixed::from_num(70)));
    }
}
