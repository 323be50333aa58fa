//! The world: owner of every entity and driver of the per-tick pass.
//!
//! # Tick order
//!
//! 1. Quit check (Escape held)
//! 2. Selection from a left click
//! 3. Camera mode switch (just-pressed WASD) and camera update
//! 4. Units: orders, movement, training, mining
//! 5. Buildings: orders, training, pylon activation
//! 6. Resource nodes: queue empty nodes for removal
//! 7. Apply queued spawns, then queued destruction
//!
//! No collection grows or shrinks during steps 4 to 6. Entities spawned in
//! a tick are first updated on the next one.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use serde::Serialize;

use crate::camera::Camera;
use crate::components::{BuildingKind, EntityId, EntityKind, Position, TOLERANCE};
use crate::config::WorldConfig;
use crate::economy::{nearest_depot, Cargo, EconomyEvent, Ledger};
use crate::entity::{Building, Mine, Selectable, Sprite, Unit};
use crate::error::{GameError, Result};
use crate::hud::{selection_hint, status_text, HudText};
use crate::input::{InputSnapshot, Key};
use crate::loader::Placement;
use crate::movement::MoveOutcome;
use crate::production::{ProductType, ProductionEvent, Trainer};
use crate::services::{AssetLoader, TileService};

/// External collaborators for one tick.
pub struct WorldServices<'a> {
    /// Tile flags.
    pub tiles: &'a dyn TileService,
    /// Render handles for spawned entities.
    pub assets: &'a mut dyn AssetLoader,
}

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickEvents {
    /// Production requests, completions and failures.
    pub production: Vec<ProductionEvent>,
    /// Mining, deposits, depletion and pylon activation.
    pub economy: Vec<EconomyEvent>,
    /// Entities created this tick.
    pub spawned: Vec<EntityId>,
    /// Entities removed this tick.
    pub destroyed: Vec<EntityId>,
    /// Units whose step was refused by the tile service.
    pub blocked: Vec<EntityId>,
    /// Escape was held.
    pub quit_requested: bool,
}

/// A product waiting to be created once the pass is over.
#[derive(Debug, Clone, Copy)]
struct PendingSpawn {
    producer: EntityId,
    product: ProductType,
    position: Position,
}

/// Borrowed state shared by the unit and building passes.
struct PassContext<'a> {
    input: &'a InputSnapshot,
    cursor: Position,
    elapsed_ms: u32,
    tiles: &'a dyn TileService,
    ledger: &'a mut Ledger,
    camera: &'a mut Camera,
    spawns: &'a mut Vec<PendingSpawn>,
    events: &'a mut TickEvents,
}

/// Complete session state.
#[derive(Debug, Clone, Serialize)]
pub struct World {
    tick: u64,
    next_id: EntityId,
    units: Vec<Unit>,
    buildings: Vec<Building>,
    mines: Vec<Mine>,
    ledger: Ledger,
    camera: Camera,
    selected: Option<EntityId>,
    doomed: Vec<EntityId>,
}

impl World {
    /// An empty world for a map of `map_size` pixels.
    #[must_use]
    pub fn new(config: WorldConfig, map_size: (u32, u32)) -> Self {
        Self {
            tick: 0,
            next_id: 1,
            units: Vec::new(),
            buildings: Vec::new(),
            mines: Vec::new(),
            ledger: Ledger::new(config.starting_metal, config.starting_unobtainium),
            camera: Camera::new((config.view_width, config.view_height), map_size),
            selected: None,
            doomed: Vec::new(),
        }
    }

    /// Replace the ledger. Used to seed a session with funds.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Build a world from initial placements.
    ///
    /// The camera starts on the first unit placed. Nothing is selected.
    /// An asset failure aborts the whole load.
    pub fn from_placements(
        config: WorldConfig,
        placements: &[Placement],
        tiles: &dyn TileService,
        assets: &mut dyn AssetLoader,
    ) -> Result<Self> {
        let mut world = Self::new(config, tiles.map_size());
        world.populate(placements, assets)?;
        Ok(world)
    }

    /// Create every placement in order.
    pub fn populate(
        &mut self,
        placements: &[Placement],
        assets: &mut dyn AssetLoader,
    ) -> Result<()> {
        for placement in placements {
            self.create_entity(placement.kind, placement.position, assets)?;
        }
        if self.camera.tracked().is_none() {
            if let Some(first) = self.units.first() {
                self.camera.track(first.id());
            }
        }
        tracing::info!(
            units = self.units.len(),
            buildings = self.buildings.len(),
            mines = self.mines.len(),
            "World populated"
        );
        Ok(())
    }

    /// Create an entity of `kind` at `position`.
    ///
    /// The render handle is fetched first; if that fails nothing is created.
    pub fn create_entity(
        &mut self,
        kind: EntityKind,
        position: Position,
        assets: &mut dyn AssetLoader,
    ) -> Result<EntityId> {
        let renderable = assets.load(kind.asset_key())?;
        let id = self.next_id;
        self.next_id += 1;

        let sprite = Sprite {
            id,
            position,
            renderable,
        };
        match kind {
            EntityKind::Unit(unit) => self.units.push(Unit::new(sprite, unit)),
            EntityKind::Building(building) => self.buildings.push(Building::new(sprite, building)),
            EntityKind::Resource(resource) => self.mines.push(Mine::new(sprite, resource)),
        }

        tracing::debug!(id, %kind, x = %position.x(), y = %position.y(), "Entity created");
        Ok(id)
    }

    /// Queue an entity for removal at the end of the current (or next) tick.
    pub fn queue_destruction(&mut self, id: EntityId) {
        if !self.doomed.contains(&id) {
            self.doomed.push(id);
        }
    }

    /// Advance the world by one tick.
    pub fn tick(
        &mut self,
        input: &InputSnapshot,
        elapsed_ms: u32,
        services: &mut WorldServices<'_>,
    ) -> TickEvents {
        let mut events = TickEvents::default();
        self.tick += 1;

        if input.is_key_down(Key::Escape) {
            events.quit_requested = true;
        }

        // Both clicks are read against the view the player last saw.
        let cursor = Position::from(self.camera.screen_to_world(input.cursor()));
        if input.left_click() {
            self.resolve_click(cursor);
        }

        if input.pan_pressed() {
            self.camera.free_roam();
        }
        let tracked = self.camera.tracked().and_then(|id| self.position_of(id));
        self.camera.update(tracked, input, elapsed_ms);

        let mut spawns = Vec::new();
        {
            let Self {
                units,
                buildings,
                mines,
                ledger,
                camera,
                ..
            } = self;
            let mut cx = PassContext {
                input,
                cursor,
                elapsed_ms,
                tiles: services.tiles,
                ledger,
                camera,
                spawns: &mut spawns,
                events: &mut events,
            };

            for unit in units.iter_mut() {
                update_unit(unit, buildings.as_slice(), mines.as_mut_slice(), &mut cx);
            }
            for building in buildings.iter_mut() {
                update_building(building, units.as_slice(), &mut cx);
            }
        }
        self.update_mines(&mut events);

        self.apply_spawns(spawns, services.assets, &mut events);
        self.apply_destruction(&mut events);

        #[cfg(feature = "debug-validation")]
        if let Err(err) = self.validate() {
            tracing::error!(tick = self.tick, %err, "World failed validation");
        }

        events
    }

    /// Left click: buildings are tested first, then units.
    ///
    /// Within each collection the first entity in range wins and ends that
    /// scan; everything tested before it is deselected. A unit hit overrides
    /// a building hit. A click on nothing clears the selection.
    fn resolve_click(&mut self, click: Position) {
        let mut hit = false;

        if let Some(index) = pick(&mut self.buildings, click) {
            self.clear_selection();
            let building = &mut self.buildings[index];
            building.select(&mut self.camera);
            self.selected = Some(building.id());
            hit = true;
        }
        if let Some(index) = pick(&mut self.units, click) {
            self.clear_selection();
            let unit = &mut self.units[index];
            unit.select(&mut self.camera);
            self.selected = Some(unit.id());
            hit = true;
        }

        if !hit {
            self.selected = None;
        }
        tracing::debug!(selected = ?self.selected, "Selection resolved");
    }

    fn clear_selection(&mut self) {
        let Some(id) = self.selected.take() else {
            return;
        };
        if let Some(unit) = self.units.iter_mut().find(|u| u.id() == id) {
            unit.deselect();
        } else if let Some(building) = self.buildings.iter_mut().find(|b| b.id() == id) {
            building.deselect();
        }
    }

    fn update_mines(&mut self, events: &mut TickEvents) {
        let mut newly_empty = Vec::new();
        for mine in &mut self.mines {
            if mine.node.is_empty() && !mine.doomed {
                mine.doomed = true;
                newly_empty.push(mine.id());
            }
        }
        for node in newly_empty {
            tracing::debug!(node, "Resource node depleted");
            events.economy.push(EconomyEvent::NodeDepleted { node });
            self.queue_destruction(node);
        }
    }

    fn apply_spawns(
        &mut self,
        spawns: Vec<PendingSpawn>,
        assets: &mut dyn AssetLoader,
        events: &mut TickEvents,
    ) {
        for spawn in spawns {
            let kind = spawn.product.entity_kind();
            match self.create_entity(kind, spawn.position, assets) {
                Ok(spawned) => {
                    tracing::info!(
                        producer = spawn.producer,
                        spawned,
                        %kind,
                        "Production complete"
                    );
                    events.production.push(ProductionEvent::Completed {
                        producer: spawn.producer,
                        product: spawn.product,
                        spawned,
                    });
                    events.spawned.push(spawned);
                    if spawn.product == ProductType::CommandCentre {
                        self.queue_destruction(spawn.producer);
                    }
                }
                Err(err) => {
                    tracing::warn!(producer = spawn.producer, %kind, %err, "Spawn failed");
                    events.production.push(ProductionEvent::SpawnFailed {
                        producer: spawn.producer,
                        product: spawn.product,
                    });
                }
            }
        }
    }

    fn apply_destruction(&mut self, events: &mut TickEvents) {
        for id in std::mem::take(&mut self.doomed) {
            let before = self.entity_count();
            self.units.retain(|u| u.id() != id);
            self.buildings.retain(|b| b.id() != id);
            self.mines.retain(|m| m.id() != id);
            if self.entity_count() == before {
                continue;
            }
            if self.selected == Some(id) {
                self.selected = None;
            }
            tracing::debug!(id, "Entity destroyed");
            events.destroyed.push(id);
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<()> {
        let flagged: Vec<EntityId> = self
            .units
            .iter()
            .filter(|u| u.selected)
            .map(Unit::id)
            .chain(self.buildings.iter().filter(|b| b.selected).map(Building::id))
            .collect();
        if flagged.len() > 1 {
            return Err(GameError::InvalidState(format!(
                "multiple entities selected: {flagged:?}"
            )));
        }
        if flagged.first().copied() != self.selected {
            return Err(GameError::InvalidState(format!(
                "selection flag {flagged:?} disagrees with {:?}",
                self.selected
            )));
        }
        if self.ledger.carry_allowance() == 0 {
            return Err(GameError::InvalidState("carry allowance is zero".into()));
        }

        let mut ids: Vec<EntityId> = self
            .units
            .iter()
            .map(Unit::id)
            .chain(self.buildings.iter().map(Building::id))
            .chain(self.mines.iter().map(Mine::id))
            .collect();
        ids.sort_unstable();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(GameError::InvalidState("duplicate entity id".into()));
        }
        Ok(())
    }

    /// Hash of the full state, for determinism checks.
    pub fn state_hash(&self) -> Result<u64> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize world: {e}")))?;
        let mut hasher = DefaultHasher::new();
        hasher.write(&bytes);
        Ok(hasher.finish())
    }

    /// HUD text for the current frame.
    #[must_use]
    pub fn hud_text(&self) -> HudText {
        let hint = self.selected.and_then(|id| {
            if let Some(unit) = self.unit(id) {
                selection_hint(unit.entity_kind(), false)
            } else {
                self.building(id)
                    .and_then(|b| selection_hint(b.entity_kind(), b.activated))
            }
        });
        HudText {
            status: status_text(&self.ledger),
            hint,
        }
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Units in update order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Buildings in update order.
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Resource nodes in update order.
    #[must_use]
    pub fn mines(&self) -> &[Mine] {
        &self.mines
    }

    /// Look up a unit.
    #[must_use]
    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    /// Look up a building.
    #[must_use]
    pub fn building(&self, id: EntityId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id() == id)
    }

    /// Look up a resource node.
    #[must_use]
    pub fn mine(&self, id: EntityId) -> Option<&Mine> {
        self.mines.iter().find(|m| m.id() == id)
    }

    /// Position of any live entity.
    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.unit(id)
            .map(|u| u.sprite.position)
            .or_else(|| self.building(id).map(|b| b.sprite.position))
            .or_else(|| self.mine(id).map(|m| m.sprite.position))
    }

    /// Total live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.units.len() + self.buildings.len() + self.mines.len()
    }

    /// The shared ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The camera.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The selected entity, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<EntityId> {
        self.selected
    }
}

/// Scan `items` for the first one within pick range of `click`,
/// deselecting each miss on the way.
fn pick<T: Selectable>(items: &mut [T], click: Position) -> Option<usize> {
    for (index, item) in items.iter_mut().enumerate() {
        if item.position().within(click, TOLERANCE) {
            return Some(index);
        }
        item.deselect();
    }
    None
}

/// What `producer` would make for the first production key pressed this
/// tick. Later keys are ignored even if the first one offers nothing.
fn offered_product(producer: EntityKind, input: &InputSnapshot) -> Option<ProductType> {
    Key::PRODUCTION
        .into_iter()
        .find(|key| input.is_key_pressed(*key))
        .and_then(|key| ProductType::offered_by(producer, key))
}

fn update_unit(
    unit: &mut Unit,
    buildings: &[Building],
    mines: &mut [Mine],
    cx: &mut PassContext<'_>,
) {
    let id = unit.id();

    if unit.selected && !unit.is_training() {
        if cx.input.right_click() {
            let target = cx.cursor;
            unit.mover.set_destination(target);
            cx.camera.track(id);
            tracing::debug!(id, x = %target.x(), y = %target.y(), "Move order");
        } else if let Some(product) = offered_product(unit.entity_kind(), cx.input) {
            if let Some(trainer) = unit.trainer.as_mut() {
                if request_production(id, product, unit.sprite.position, trainer, cx) {
                    unit.mover.stop();
                }
            }
            cx.camera.track(id);
        }
    }

    if unit.mover.is_moving() {
        let outcome = unit
            .mover
            .step(&mut unit.sprite.position, unit.kind.speed(), cx.elapsed_ms, cx.tiles);
        if outcome == MoveOutcome::Blocked {
            tracing::debug!(id, "Movement blocked");
            cx.events.blocked.push(id);
        }
    }

    advance_training(id, unit.sprite.position, &mut unit.trainer, cx);

    if unit.miner.is_some() {
        update_miner(unit, buildings, mines, cx);
    }
}

fn update_miner(
    unit: &mut Unit,
    buildings: &[Building],
    mines: &mut [Mine],
    cx: &mut PassContext<'_>,
) {
    let id = unit.id();
    let position = unit.sprite.position;
    let Some(miner) = unit.miner.as_mut() else {
        return;
    };
    let allowance = cx.ledger.carry_allowance();
    let depots = || {
        buildings
            .iter()
            .filter(|b| b.is_depot())
            .map(|b| (b.id(), b.sprite.position))
    };

    if miner.is_carrying() {
        let depot = depots().find(|(_, at)| position.strictly_within(*at, TOLERANCE));
        if let Some((depot, _)) = depot {
            if let Some(cargo) = miner.drop_off() {
                cx.ledger.credit(cargo.kind, allowance);
                unit.mover.set_destination(cargo.mine);
                tracing::info!(
                    miner = id,
                    depot,
                    kind = ?cargo.kind,
                    amount = allowance,
                    "Resources deposited"
                );
                cx.events.economy.push(EconomyEvent::ResourceDeposited {
                    miner: id,
                    depot,
                    kind: cargo.kind,
                    amount: allowance,
                });
            }
        } else if !unit.mover.is_moving() {
            if let Some((_, at)) = nearest_depot(position, depots()) {
                unit.mover.set_destination(at);
            }
        }
        return;
    }

    if unit.selected && unit.mover.is_moving() {
        return;
    }

    let Some(mine) = mines
        .iter_mut()
        .find(|m| !m.node.is_empty() && position.strictly_within(m.sprite.position, TOLERANCE))
    else {
        return;
    };

    if miner.accrue(cx.elapsed_ms) {
        let kind = mine.node.kind();
        let amount = mine.node.deplete(allowance);
        miner.pick_up(Cargo {
            kind,
            mine: mine.sprite.position,
        });
        tracing::debug!(miner = id, node = mine.id(), ?kind, amount, "Resources gathered");
        cx.events.economy.push(EconomyEvent::ResourceGathered {
            miner: id,
            node: mine.id(),
            kind,
            amount,
        });
        if let Some((_, at)) = nearest_depot(position, depots()) {
            unit.mover.set_destination(at);
        }
    }
}

fn update_building(building: &mut Building, units: &[Unit], cx: &mut PassContext<'_>) {
    let id = building.id();

    if building.selected {
        let offered = offered_product(building.entity_kind(), cx.input);
        if let (Some(trainer), Some(product)) = (building.trainer.as_mut(), offered) {
            if !trainer.is_busy() {
                request_production(id, product, building.sprite.position, trainer, cx);
            }
        }
    }

    advance_training(id, building.sprite.position, &mut building.trainer, cx);

    if building.kind == BuildingKind::Pylon && !building.activated {
        let reached = units
            .iter()
            .any(|u| u.sprite.position.strictly_within(building.sprite.position, TOLERANCE));
        if reached {
            building.activated = true;
            cx.ledger.raise_allowance();
            let allowance = cx.ledger.carry_allowance();
            tracing::info!(pylon = id, allowance, "Pylon activated");
            cx.events.economy.push(EconomyEvent::AllowanceRaised { pylon: id, allowance });
        }
    }
}

/// Returns true if the request was accepted.
fn request_production(
    producer: EntityId,
    product: ProductType,
    site: Position,
    trainer: &mut Trainer,
    cx: &mut PassContext<'_>,
) -> bool {
    match trainer.request(product, site, cx.ledger, cx.tiles) {
        Ok(()) => {
            tracing::debug!(producer, ?product, "Production started");
            cx.events
                .production
                .push(ProductionEvent::Started { producer, product });
            true
        }
        Err(reason) => {
            tracing::debug!(producer, ?product, %reason, "Production rejected");
            cx.events.production.push(ProductionEvent::Rejected {
                producer,
                product,
                reason,
            });
            false
        }
    }
}

fn advance_training(
    producer: EntityId,
    position: Position,
    trainer: &mut Option<Trainer>,
    cx: &mut PassContext<'_>,
) {
    if let Some(product) = trainer.as_mut().and_then(|t| t.advance(cx.elapsed_ms)) {
        cx.spawns.push(PendingSpawn {
            producer,
            product,
            position,
        });
    }
}
