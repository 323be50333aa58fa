//! Initial-state loader.
//!
//! One entity per line, `type,x,y`:
//!
//! ```text
//! command_centre,1200,900
//! metal_mine,1400,860
//! engineer,1250,950
//! ```
//!
//! Blank lines and `#` comments are ignored. Anything else that does not
//! parse is skipped with a warning and loading carries on.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::components::{EntityKind, Position};
use crate::error::{GameError, Result};

/// An entity to create at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// What to create.
    pub kind: EntityKind,
    /// Where.
    pub position: Position,
}

/// Parse placements from file contents, skipping malformed rows.
pub fn parse_objects(source: &str) -> Vec<Placement> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match parse_row(line) {
                Ok(placement) => Some(placement),
                Err(reason) => {
                    warn!(line = index + 1, row = line, reason, "Skipping initial-state row");
                    None
                }
            }
        })
        .collect()
}

fn parse_row(line: &str) -> std::result::Result<Placement, &'static str> {
    let mut fields = line.split(',').map(str::trim);
    let (Some(name), Some(x), Some(y), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err("expected three fields");
    };

    let kind = EntityKind::from_name(name).ok_or("unknown entity type")?;
    let x: i32 = x.parse().map_err(|_| "bad x coordinate")?;
    let y: i32 = y.parse().map_err(|_| "bad y coordinate")?;

    Ok(Placement {
        kind,
        position: Position::from_ints(x, y),
    })
}

/// Read and parse an initial-state file.
pub fn load_objects_file<P: AsRef<Path>>(path: P) -> Result<Vec<Placement>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| GameError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_objects(&contents))
}
