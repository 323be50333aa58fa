//! Headless scenario runner for scripted play and CI verification.
//!
//! A scenario (RON) describes a map, starting entities and a script of
//! input frames. The runner drives the world through the script with no
//! window and reports the outcome as JSON. This enables:
//!
//! - **Scripted play**: exercise production and mining end to end
//! - **CI verification**: replay a scenario and compare state hashes
//! - **Data checks**: validate initial-state files before shipping them
//!
//! # Example
//!
//! ```bash
//! # Run the built-in scenario
//! cargo run -p outpost_headless -- run
//!
//! # Run a scenario file
//! cargo run -p outpost_headless -- run --scenario scenarios/mining.ron
//!
//! # Verify determinism
//! cargo run -p outpost_headless -- verify --scenario scenarios/mining.ron --runs 5
//! ```

pub mod runner;
pub mod scenario;

pub use runner::{
    run_scenario, validate_objects, verify_scenario, EventTally, ObjectsReport, RunSummary,
    ScenarioRunner, VerifyReport,
};
pub use scenario::{EntityRow, Frame, MapSetup, Scenario, ScenarioError, Tiles};
