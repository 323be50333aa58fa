//! World configuration.
//!
//! Loaded from RON:
//!
//! ```ron
//! WorldConfig(
//!     view_width: 1024,
//!     view_height: 768,
//!     starting_metal: 0,
//!     starting_unobtainium: 0,
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Tunables supplied by the host when a world is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Viewport width in pixels.
    pub view_width: u32,
    /// Viewport height in pixels.
    pub view_height: u32,
    /// Metal in the ledger at start.
    pub starting_metal: u32,
    /// Unobtainium in the ledger at start.
    pub starting_unobtainium: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            view_width: 1024,
            view_height: 768,
            starting_metal: 0,
            starting_unobtainium: 0,
        }
    }
}

impl WorldConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parse a config from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Self::parse(source, "<inline>")
    }

    fn parse(source: &str, origin: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }
}
