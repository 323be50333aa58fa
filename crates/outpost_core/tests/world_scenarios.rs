//! End-to-end world scenarios.
//!
//! Each test builds a small world through the fixture session and drives it
//! with scripted input, checking the ledger, entity collections and events.

use outpost_core::components::{BuildingKind, EntityKind, Position, UnitKind, STOP_DIST};
use outpost_core::economy::{EconomyEvent, ResourceKind};
use outpost_core::input::{InputSnapshot, Key};
use outpost_core::production::{ProductType, ProductionError, ProductionEvent};
use outpost_core::services::{OpenField, TileGrid};
use outpost_test_utils::fixtures::{open_field, place, FailingAssets, Session};

const FACTORY: EntityKind = EntityKind::Building(BuildingKind::Factory);
const COMMAND_CENTRE: EntityKind = EntityKind::Building(BuildingKind::CommandCentre);
const PYLON: EntityKind = EntityKind::Building(BuildingKind::Pylon);
const METAL_MINE: EntityKind = EntityKind::Resource(ResourceKind::Metal);
const UNOBTAINIUM_MINE: EntityKind = EntityKind::Resource(ResourceKind::Unobtainium);
const SCOUT: EntityKind = EntityKind::Unit(UnitKind::Scout);
const BUILDER: EntityKind = EntityKind::Unit(UnitKind::Builder);
const ENGINEER: EntityKind = EntityKind::Unit(UnitKind::Engineer);
const TRUCK: EntityKind = EntityKind::Unit(UnitKind::Truck);

// =============================================================================
// Production
// =============================================================================

#[test]
fn test_scout_request_debits_exactly_once() {
    let mut session =
        Session::new(open_field(), &[place(COMMAND_CENTRE, 600, 500)]).with_metal(5);
    let cc = session.world.buildings()[0].id();
    session.select(cc);

    let events = session.press(Key::Num1, 1000);
    assert_eq!(session.world.ledger().metal(), 0);
    assert_eq!(
        events.production,
        vec![ProductionEvent::Started {
            producer: cc,
            product: ProductType::Scout
        }]
    );

    // busy: the second press is ignored and nothing is debited
    let events = session.press(Key::Num1, 1000);
    assert!(events.production.is_empty());
    assert_eq!(session.world.ledger().metal(), 0);

    session.idle(2, 1000);
    let events = session.step(&InputSnapshot::empty(), 999);
    assert!(events.spawned.is_empty(), "spawned before 5000ms");

    let events = session.step(&InputSnapshot::empty(), 1);
    assert_eq!(events.spawned.len(), 1);
    let scout = session.world.unit(events.spawned[0]).expect("scout spawned");
    assert_eq!(scout.kind, UnitKind::Scout);
    assert_eq!(scout.sprite.position, Position::from_ints(600, 500));
    assert_eq!(session.world.units().len(), 1);
}

#[test]
fn test_unaffordable_request_is_rejected() {
    let mut session =
        Session::new(open_field(), &[place(COMMAND_CENTRE, 600, 500)]).with_metal(15);
    let cc = session.world.buildings()[0].id();
    session.select(cc);

    let events = session.press(Key::Num3, 16);
    assert_eq!(
        events.production,
        vec![ProductionEvent::Rejected {
            producer: cc,
            product: ProductType::Engineer,
            reason: ProductionError::InsufficientResources {
                required: 20,
                available: 15
            },
        }]
    );
    assert_eq!(session.world.ledger().metal(), 15);

    // an affordable product still goes through
    session.press(Key::Num2, 16);
    assert_eq!(session.world.ledger().metal(), 5);
}

#[test]
fn test_unselected_producer_ignores_keys() {
    let mut session =
        Session::new(open_field(), &[place(COMMAND_CENTRE, 600, 500)]).with_metal(50);
    let events = session.press(Key::Num1, 16);
    assert!(events.production.is_empty());
    assert_eq!(session.world.ledger().metal(), 50);
}

#[test]
fn test_truck_becomes_command_centre() {
    let mut session = Session::new(open_field(), &[place(TRUCK, 500, 500)]);
    let truck = session.world.units()[0].id();
    session.select(truck);
    session.press(Key::Num1, 1000);
    assert!(session.world.unit(truck).expect("truck").is_training());

    let mut completed = None;
    for _ in 0..20 {
        let events = session.step(&InputSnapshot::empty(), 1000);
        if !events.spawned.is_empty() {
            assert_eq!(events.destroyed, vec![truck]);
            completed = Some(events.spawned[0]);
            break;
        }
    }

    let cc = completed.expect("command centre should be raised");
    let building = session.world.building(cc).expect("new building");
    assert_eq!(building.kind, BuildingKind::CommandCentre);
    assert_eq!(building.sprite.position, Position::from_ints(500, 500));
    assert!(session.world.unit(truck).is_none());
    assert_eq!(session.world.selected(), None);
    // 1000ms on the request tick plus 14 more ticks
    assert_eq!(session.world.get_tick(), 16);
}

#[test]
fn test_builder_needs_buildable_ground() {
    let grid = TileGrid::new(50, 40).with_occupied(9, 7);
    // (600, 500) is tile (9, 7)
    let mut session = Session::new(grid, &[place(BUILDER, 600, 500)]).with_metal(150);
    let builder = session.world.units()[0].id();
    session.select(builder);

    let events = session.press(Key::Num1, 16);
    assert!(matches!(
        events.production.as_slice(),
        [ProductionEvent::Rejected {
            reason: ProductionError::CannotBuildHere,
            ..
        }]
    ));
    assert_eq!(session.world.ledger().metal(), 150);

    session.order_to(Position::from_ints(700, 500), 1000);
    session.idle(5, 1000);
    let events = session.press(Key::Num1, 16);
    assert!(matches!(
        events.production.as_slice(),
        [ProductionEvent::Started {
            product: ProductType::Factory,
            ..
        }]
    ));
    assert_eq!(session.world.ledger().metal(), 50);
}

#[test]
fn test_training_unit_ignores_move_orders() {
    let mut session = Session::new(open_field(), &[place(BUILDER, 600, 500)]).with_metal(100);
    let builder = session.world.units()[0].id();
    session.select(builder);
    session.press(Key::Num1, 16);

    session.order_to(Position::from_ints(900, 900), 16);
    let unit = session.world.unit(builder).expect("builder");
    assert!(!unit.mover.is_moving());
    assert_eq!(unit.sprite.position, Position::from_ints(600, 500));
}

#[test]
fn test_spawn_failure_is_not_refunded() {
    // one successful load for the command centre, then every load fails
    let mut session = Session::with_assets(
        open_field(),
        FailingAssets::after(1),
        &[place(COMMAND_CENTRE, 600, 500)],
    )
    .with_metal(5);
    let cc = session.world.buildings()[0].id();
    session.select(cc);
    session.press(Key::Num1, 4999);

    let events = session.step(&InputSnapshot::empty(), 1);
    assert_eq!(
        events.production,
        vec![ProductionEvent::SpawnFailed {
            producer: cc,
            product: ProductType::Scout
        }]
    );
    assert!(events.spawned.is_empty());
    assert_eq!(session.world.ledger().metal(), 0);
    assert!(!session.world.building(cc).expect("cc").trainer.expect("trainer").is_busy());
}

#[test]
fn test_factory_trains_one_truck() {
    let mut session = Session::new(open_field(), &[place(FACTORY, 600, 500)]).with_metal(150);
    let factory = session.world.buildings()[0].id();
    session.select(factory);

    let events = session.press(Key::Num1, 1000);
    assert_eq!(
        events.production,
        vec![ProductionEvent::Started {
            producer: factory,
            product: ProductType::Truck
        }]
    );
    assert_eq!(session.world.ledger().metal(), 0);

    session.idle(3, 1000);
    let events = session.step(&InputSnapshot::empty(), 999);
    assert!(events.spawned.is_empty(), "spawned before 5000ms");

    let events = session.step(&InputSnapshot::empty(), 1);
    assert_eq!(events.spawned.len(), 1);
    let truck = session.world.unit(events.spawned[0]).expect("truck spawned");
    assert_eq!(truck.kind, UnitKind::Truck);
    assert_eq!(truck.sprite.position, Position::from_ints(600, 500));
    assert_eq!(session.world.units().len(), 1);
    assert!(session.idle(3, 1000).iter().all(|e| e.spawned.is_empty()));
}

// =============================================================================
// Movement
// =============================================================================

#[test]
fn test_blocked_move_stops_in_place() {
    let grid = TileGrid::new(50, 40).with_solid(1, 0);
    let mut session = Session::new(grid, &[place(SCOUT, 60, 10)]);
    let scout = session.world.units()[0].id();
    session.select(scout);

    let events = session.order_to(Position::from_ints(200, 10), 16);
    assert_eq!(events.blocked, vec![scout]);
    let unit = session.world.unit(scout).expect("scout");
    assert_eq!(unit.sprite.position, Position::from_ints(60, 10));
    assert!(!unit.mover.is_moving());
}

#[test]
fn test_move_order_arrives() {
    let mut session = Session::new(open_field(), &[place(SCOUT, 100, 100)]);
    let scout = session.world.units()[0].id();
    session.select(scout);
    session.order_to(Position::from_ints(400, 100), 100);
    session.idle(20, 100);

    let unit = session.world.unit(scout).expect("scout");
    assert!(!unit.mover.is_moving());
    assert!(unit
        .sprite
        .position
        .within(Position::from_ints(400, 100), STOP_DIST));
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_unit_hit_overrides_building_hit() {
    let mut session = Session::new(
        open_field(),
        &[place(COMMAND_CENTRE, 300, 300), place(SCOUT, 310, 300)],
    );
    let cc = session.world.buildings()[0].id();
    let scout = session.world.units()[0].id();

    session.click_world(Position::from_ints(305, 300), 16);
    assert_eq!(session.world.selected(), Some(scout));
    assert!(session.world.unit(scout).expect("scout").selected);
    assert!(!session.world.building(cc).expect("cc").selected);
    session.world.validate().expect("singleton selection");
}

#[test]
fn test_click_on_nothing_clears_selection() {
    let mut session = Session::new(open_field(), &[place(SCOUT, 310, 300)]);
    let scout = session.world.units()[0].id();
    session.select(scout);
    assert_eq!(session.world.selected(), Some(scout));

    session.click_world(Position::from_ints(900, 900), 16);
    assert_eq!(session.world.selected(), None);
    assert!(!session.world.unit(scout).expect("scout").selected);
}

#[test]
fn test_pick_radius_is_inclusive() {
    let mut session = Session::new(open_field(), &[place(SCOUT, 300, 300)]);
    session.click_world(Position::from_ints(332, 300), 16);
    assert!(session.world.selected().is_some());
}

#[test]
fn test_hud_follows_selection() {
    let mut session = Session::new(
        open_field(),
        &[place(COMMAND_CENTRE, 300, 300), place(PYLON, 900, 900)],
    )
    .with_metal(7);
    assert_eq!(session.world.hud_text().status, "Metal: 7\nUnobtainium: 0");
    assert_eq!(session.world.hud_text().hint, None);

    let cc = session.world.buildings()[0].id();
    session.select(cc);
    assert_eq!(
        session.world.hud_text().hint,
        Some("1- Create Scout\n2- Create Builder\n3- Create Engineer\n")
    );

    let pylon = session.world.buildings()[1].id();
    session.select(pylon);
    assert_eq!(session.world.hud_text().hint, Some("Inactive\n"));
}

// =============================================================================
// Mining and economy
// =============================================================================

#[test]
fn test_mining_round_trip() {
    let mut session = Session::new(
        open_field(),
        &[
            place(COMMAND_CENTRE, 400, 400),
            place(METAL_MINE, 600, 400),
            place(ENGINEER, 600, 410),
        ],
    );
    let engineer = session.world.units()[0].id();
    let mine = session.world.mines()[0].id();

    let mut gathered_on = None;
    for tick in 1..=10 {
        let events = session.step(&InputSnapshot::empty(), 1000);
        if !events.economy.is_empty() {
            assert_eq!(
                events.economy,
                vec![EconomyEvent::ResourceGathered {
                    miner: engineer,
                    node: mine,
                    kind: ResourceKind::Metal,
                    amount: 2,
                }]
            );
            gathered_on = Some(tick);
            break;
        }
    }
    assert_eq!(gathered_on, Some(5));
    assert_eq!(session.world.mine(mine).expect("mine").node.capacity(), 498);

    let unit = session.world.unit(engineer).expect("engineer");
    assert!(unit.miner.expect("miner").is_carrying());
    assert_eq!(unit.mover.destination(), Position::from_ints(400, 400));
    assert_eq!(session.world.ledger().metal(), 0);

    let mut deposited = false;
    for _ in 0..100 {
        let events = session.step(&InputSnapshot::empty(), 100);
        if events
            .economy
            .iter()
            .any(|e| matches!(e, EconomyEvent::ResourceDeposited { amount: 2, .. }))
        {
            deposited = true;
            break;
        }
    }
    assert!(deposited, "engineer never reached the command centre");
    assert_eq!(session.world.ledger().metal(), 2);

    let unit = session.world.unit(engineer).expect("engineer");
    assert!(!unit.miner.expect("miner").is_carrying());
    assert_eq!(unit.mover.destination(), Position::from_ints(600, 400));
    assert!(unit.mover.is_moving());
}

#[test]
fn test_ordered_engineer_does_not_mine_in_passing() {
    let mut session = Session::new(
        open_field(),
        &[
            place(COMMAND_CENTRE, 100, 100),
            place(METAL_MINE, 600, 400),
            place(ENGINEER, 560, 400),
        ],
    );
    let engineer = session.world.units()[0].id();
    let mine = session.world.mines()[0].id();
    session.select(engineer);
    session.order_to(Position::from_ints(700, 400), 100);

    for _ in 0..20 {
        let events = session.step(&InputSnapshot::empty(), 100);
        assert!(events.economy.is_empty());
        let miner = session.world.unit(engineer).expect("engineer").miner.expect("miner");
        assert_eq!(miner.mine_elapsed_ms(), 0);
        assert!(!miner.is_carrying());
    }

    let unit = session.world.unit(engineer).expect("engineer");
    assert!(!unit.mover.is_moving());
    assert!(unit.sprite.position.within(Position::from_ints(700, 400), STOP_DIST));
    assert_eq!(session.world.mine(mine).expect("mine").node.capacity(), 500);
}

#[test]
fn test_nearest_command_centre_receives_cargo() {
    let mut session = Session::new(
        open_field(),
        &[
            place(COMMAND_CENTRE, 1500, 400),
            place(COMMAND_CENTRE, 500, 400),
            place(METAL_MINE, 600, 400),
            place(ENGINEER, 600, 400),
        ],
    );
    session.idle(5, 1000);
    let engineer = &session.world.units()[0];
    assert_eq!(engineer.mover.destination(), Position::from_ints(500, 400));
}

#[test]
fn test_carrying_without_depot_waits_for_one() {
    let mut session = Session::new(
        open_field(),
        &[place(METAL_MINE, 600, 400), place(ENGINEER, 600, 400)],
    );
    session.idle(5, 1000);
    let engineer = session.world.units()[0].clone();
    assert!(engineer.miner.expect("miner").is_carrying());
    assert!(!engineer.mover.is_moving());

    // a command centre appears later; the idle carrier heads for it
    let mut assets = outpost_core::services::SequentialAssets::default();
    session
        .world
        .create_entity(COMMAND_CENTRE, Position::from_ints(300, 400), &mut assets)
        .expect("create");
    session.idle(1, 16);
    let engineer = &session.world.units()[0];
    assert!(engineer.mover.is_moving());
    assert_eq!(engineer.mover.destination(), Position::from_ints(300, 400));
}

#[test]
fn test_node_depletes_and_is_removed_once() {
    let mut session = Session::new(
        open_field(),
        &[
            place(COMMAND_CENTRE, 400, 400),
            place(UNOBTAINIUM_MINE, 420, 400),
            place(ENGINEER, 420, 400),
        ],
    );
    let mine = session.world.mines()[0].id();

    let mut last_capacity = 50;
    let mut depleted = 0;
    for _ in 0..400 {
        let events = session.step(&InputSnapshot::empty(), 1000);
        depleted += events
            .economy
            .iter()
            .filter(|e| matches!(e, EconomyEvent::NodeDepleted { .. }))
            .count();
        if let Some(node) = session.world.mine(mine) {
            assert!(node.node.capacity() <= last_capacity);
            last_capacity = node.node.capacity();
        } else {
            assert!(events.destroyed.contains(&mine) || depleted == 1);
        }
    }

    assert_eq!(depleted, 1);
    assert!(session.world.mine(mine).is_none());
    assert_eq!(session.world.ledger().unobtainium(), 50);
    assert_eq!(session.world.ledger().metal(), 0);
}

#[test]
fn test_pylon_raises_allowance_once() {
    let mut session = Session::new(
        open_field(),
        &[place(PYLON, 800, 800), place(SCOUT, 700, 800)],
    );
    let scout = session.world.units()[0].id();
    session.select(scout);
    session.order_to(Position::from_ints(820, 800), 100);

    let mut raised = 0;
    for _ in 0..20 {
        let events = session.step(&InputSnapshot::empty(), 100);
        raised += events
            .economy
            .iter()
            .filter(|e| matches!(e, EconomyEvent::AllowanceRaised { allowance: 3, .. }))
            .count();
    }
    assert_eq!(raised, 1);
    assert_eq!(session.world.ledger().carry_allowance(), 3);
    assert!(session.world.buildings()[0].activated);
}

// =============================================================================
// Camera and input
// =============================================================================

#[test]
fn test_camera_follows_first_unit_at_load() {
    let session = Session::new(
        open_field(),
        &[place(COMMAND_CENTRE, 300, 300), place(SCOUT, 2000, 1500)],
    );
    let scout = session.world.units()[0].id();
    assert_eq!(session.world.camera().tracked(), Some(scout));
    assert_eq!(session.world.selected(), None);
}

#[test]
fn test_pan_key_switches_to_free_roam() {
    let mut session = Session::new(open_field(), &[place(SCOUT, 2000, 1500)]);
    session.press(Key::D, 16);
    assert_eq!(session.world.camera().tracked(), None);

    let scout = session.world.units()[0].id();
    session.select(scout);
    assert_eq!(session.world.camera().tracked(), Some(scout));
}

#[test]
fn test_escape_requests_quit() {
    let mut session = Session::new(open_field(), &[place(SCOUT, 100, 100)]);
    let events = session.step(&InputSnapshot::empty().with_key_down(Key::Escape), 16);
    assert!(events.quit_requested);
    let events = session.step(&InputSnapshot::empty(), 16);
    assert!(!events.quit_requested);
}

#[test]
fn test_wide_map_tick_does_not_overflow() {
    let field = OpenField {
        width: 100_000,
        height: 4_000,
    };
    let mut session = Session::new(
        field,
        &[
            place(SCOUT, 60_000, 500),
            place(COMMAND_CENTRE, 90_000, 0),
            place(COMMAND_CENTRE, 50_000, 0),
        ],
    );
    session.idle(3, 16);
    let camera = session.world.camera();
    assert!(camera.position().x > camera.last_position().x);
    assert!(camera.position().x <= camera.max_position().x);
}
