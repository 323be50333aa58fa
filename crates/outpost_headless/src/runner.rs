//! Scenario runner: builds a world from a [`Scenario`], plays its script and
//! summarises the result.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use outpost_core::economy::EconomyEvent;
use outpost_core::hud::HudText;
use outpost_core::input::InputSnapshot;
use outpost_core::loader::parse_objects;
use outpost_core::production::ProductionEvent;
use outpost_core::services::SequentialAssets;
use outpost_core::world::{TickEvents, World, WorldServices};

use crate::scenario::{Scenario, ScenarioError, Tiles};

/// Running totals of everything a run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventTally {
    /// Production requests accepted.
    pub production_started: u32,
    /// Production requests refused.
    pub production_rejected: u32,
    /// Products spawned.
    pub production_completed: u32,
    /// Products lost to an asset failure.
    pub spawn_failed: u32,
    /// Loads taken from nodes.
    pub gathered: u32,
    /// Loads credited at a Command Centre.
    pub deposited: u32,
    /// Nodes run dry.
    pub nodes_depleted: u32,
    /// Pylons activated.
    pub allowance_raised: u32,
    /// Entities created during play.
    pub spawned: u32,
    /// Entities removed during play.
    pub destroyed: u32,
    /// Movement steps refused by the map.
    pub blocked: u32,
}

impl EventTally {
    /// Add one tick's events.
    pub fn record(&mut self, events: &TickEvents) {
        for event in &events.production {
            match event {
                ProductionEvent::Started { .. } => self.production_started += 1,
                ProductionEvent::Rejected { .. } => self.production_rejected += 1,
                ProductionEvent::Completed { .. } => self.production_completed += 1,
                ProductionEvent::SpawnFailed { .. } => self.spawn_failed += 1,
            }
        }
        for event in &events.economy {
            match event {
                EconomyEvent::ResourceGathered { .. } => self.gathered += 1,
                EconomyEvent::ResourceDeposited { .. } => self.deposited += 1,
                EconomyEvent::NodeDepleted { .. } => self.nodes_depleted += 1,
                EconomyEvent::AllowanceRaised { .. } => self.allowance_raised += 1,
            }
        }
        self.spawned += count(&events.spawned);
        self.destroyed += count(&events.destroyed);
        self.blocked += count(&events.blocked);
    }
}

fn count<T>(items: &[T]) -> u32 {
    u32::try_from(items.len()).unwrap_or(u32::MAX)
}

/// What a finished run looks like, printed as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks played.
    pub ticks: u64,
    /// Whether the script held Escape before the end.
    pub quit_requested: bool,
    /// Metal on hand.
    pub metal: u32,
    /// Unobtainium on hand.
    pub unobtainium: u32,
    /// Amount an Engineer carries per trip.
    pub carry_allowance: u32,
    /// Units alive.
    pub units: usize,
    /// Buildings alive.
    pub buildings: usize,
    /// Resource nodes left.
    pub mines: usize,
    /// Currently selected entity.
    pub selected: Option<u64>,
    /// Event totals.
    pub events: EventTally,
    /// Final state hash.
    pub state_hash: u64,
    /// HUD text on the last frame.
    pub hud: HudText,
}

/// A world together with the collaborators it needs to tick.
pub struct ScenarioRunner {
    name: String,
    world: World,
    tiles: Tiles,
    assets: SequentialAssets,
    tally: EventTally,
    quit_requested: bool,
}

impl ScenarioRunner {
    /// Build the world described by `scenario`.
    ///
    /// Relative file paths in the scenario are resolved against `base_dir`.
    pub fn new(scenario: &Scenario, base_dir: Option<&Path>) -> Result<Self, ScenarioError> {
        let tiles = scenario.tiles(base_dir)?;
        let placements = scenario.placements(base_dir)?;
        let mut assets = SequentialAssets::default();
        let world = World::from_placements(scenario.config, &placements, &tiles, &mut assets)?;

        tracing::info!(
            scenario = %scenario.name,
            entities = world.entity_count(),
            "Scenario loaded"
        );

        Ok(Self {
            name: scenario.name.clone(),
            world,
            tiles,
            assets,
            tally: EventTally::default(),
            quit_requested: false,
        })
    }

    /// Run one tick.
    pub fn step(&mut self, input: &InputSnapshot, elapsed_ms: u32) -> TickEvents {
        let mut services = WorldServices {
            tiles: &self.tiles,
            assets: &mut self.assets,
        };
        let events = self.world.tick(input, elapsed_ms, &mut services);
        self.tally.record(&events);
        if events.quit_requested {
            self.quit_requested = true;
        }
        events
    }

    /// Play every tick of the script. Stops early once Escape is held.
    pub fn play(&mut self, script: &[(InputSnapshot, u32)]) {
        for (input, elapsed_ms) in script {
            self.step(input, *elapsed_ms);
            if self.quit_requested {
                tracing::info!(tick = self.world.get_tick(), "Quit requested, stopping");
                break;
            }
        }
    }

    /// The world being driven.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Summarise the current state.
    pub fn summary(&self) -> Result<RunSummary, ScenarioError> {
        let ledger = self.world.ledger();
        Ok(RunSummary {
            scenario: self.name.clone(),
            ticks: self.world.get_tick(),
            quit_requested: self.quit_requested,
            metal: ledger.metal(),
            unobtainium: ledger.unobtainium(),
            carry_allowance: ledger.carry_allowance(),
            units: self.world.units().len(),
            buildings: self.world.buildings().len(),
            mines: self.world.mines().len(),
            selected: self.world.selected(),
            events: self.tally,
            state_hash: self.world.state_hash()?,
            hud: self.world.hud_text(),
        })
    }
}

/// Load, play and summarise a scenario.
pub fn run_scenario(
    scenario: &Scenario,
    base_dir: Option<&Path>,
) -> Result<RunSummary, ScenarioError> {
    let mut runner = ScenarioRunner::new(scenario, base_dir)?;
    runner.play(&scenario.ticks());
    runner.summary()
}

/// Outcome of replaying one scenario several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Scenario name.
    pub scenario: String,
    /// Final hash of each run.
    pub hashes: Vec<u64>,
    /// Whether every run ended in the same state.
    pub deterministic: bool,
}

/// Play a scenario `runs` times and compare the final hashes.
pub fn verify_scenario(
    scenario: &Scenario,
    base_dir: Option<&Path>,
    runs: u32,
) -> Result<VerifyReport, ScenarioError> {
    let script = scenario.ticks();
    let mut hashes = Vec::with_capacity(runs as usize);
    for run in 0..runs {
        let mut runner = ScenarioRunner::new(scenario, base_dir)?;
        runner.play(&script);
        let hash = runner.world().state_hash()?;
        tracing::debug!(run, hash, "Verification run finished");
        hashes.push(hash);
    }

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    Ok(VerifyReport {
        scenario: scenario.name.clone(),
        hashes,
        deterministic,
    })
}

/// What an initial-state file contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectsReport {
    /// Non-blank, non-comment rows.
    pub rows: usize,
    /// Rows that produced a placement.
    pub placements: usize,
    /// Rows that were skipped.
    pub skipped: usize,
    /// Placements per kind name.
    pub by_kind: BTreeMap<String, usize>,
}

/// Check an initial-state file. Malformed rows are logged and counted.
pub fn validate_objects(path: &Path) -> Result<ObjectsReport, ScenarioError> {
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let rows = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .count();

    let placements = parse_objects(&contents);
    let mut by_kind = BTreeMap::new();
    for placement in &placements {
        *by_kind.entry(placement.kind.name().to_string()).or_insert(0) += 1;
    }

    Ok(ObjectsReport {
        rows,
        placements: placements.len(),
        skipped: rows - placements.len(),
        by_kind,
    })
}
