//! HUD text. Layout and drawing belong to the host.

use serde::Serialize;

use crate::components::{BuildingKind, EntityKind, UnitKind};
use crate::economy::Ledger;

const COMMAND_CENTRE_HINT: &str = "1- Create Scout\n2- Create Builder\n3- Create Engineer\n";
const FACTORY_HINT: &str = "1- Create Truck\n";
const BUILDER_HINT: &str = "1- Create Factory\n";
const TRUCK_HINT: &str = "1- Create Command Centre\n";
const PYLON_ACTIVE: &str = "Active\n";
const PYLON_INACTIVE: &str = "Inactive\n";

/// Text blocks for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudText {
    /// Resource totals.
    pub status: String,
    /// Hint for the current selection, if it has one.
    pub hint: Option<&'static str>,
}

/// `Metal: N\nUnobtainium: N`.
#[must_use]
pub fn status_text(ledger: &Ledger) -> String {
    format!(
        "Metal: {}\nUnobtainium: {}",
        ledger.metal(),
        ledger.unobtainium()
    )
}

/// Hint for a selected entity. `pylon_active` is only read for Pylons.
#[must_use]
pub const fn selection_hint(kind: EntityKind, pylon_active: bool) -> Option<&'static str> {
    match kind {
        EntityKind::Building(BuildingKind::CommandCentre) => Some(COMMAND_CENTRE_HINT),
        EntityKind::Building(BuildingKind::Factory) => Some(FACTORY_HINT),
        EntityKind::Building(BuildingKind::Pylon) => {
            if pylon_active {
                Some(PYLON_ACTIVE)
            } else {
                Some(PYLON_INACTIVE)
            }
        }
        EntityKind::Unit(UnitKind::Builder) => Some(BUILDER_HINT),
        EntityKind::Unit(UnitKind::Truck) => Some(TRUCK_HINT),
        _ => None,
    }
}
