//! Property tests for ledger, node, trainer, selection and camera invariants.

use outpost_core::components::{BuildingKind, EntityKind, Position, UnitKind};
use outpost_core::economy::{Ledger, ResourceKind, ResourceNode};
use outpost_core::input::InputSnapshot;
use outpost_core::math::Fixed;
use outpost_core::production::{ProductType, Trainer};
use outpost_core::services::OpenField;
use outpost_test_utils::determinism::strategies::{arb_elapsed, arb_script};
use outpost_test_utils::fixtures::{open_field, place, Session};
use proptest::prelude::*;

fn crowded_session() -> Session<OpenField> {
    Session::new(
        open_field(),
        &[
            place(EntityKind::Building(BuildingKind::CommandCentre), 300, 300),
            place(EntityKind::Building(BuildingKind::Factory), 320, 310),
            place(EntityKind::Building(BuildingKind::Pylon), 500, 500),
            place(EntityKind::Resource(ResourceKind::Metal), 600, 300),
            place(EntityKind::Unit(UnitKind::Scout), 310, 300),
            place(EntityKind::Unit(UnitKind::Builder), 330, 320),
            place(EntityKind::Unit(UnitKind::Engineer), 600, 310),
            place(EntityKind::Unit(UnitKind::Truck), 700, 400),
        ],
    )
    .with_metal(400)
}

proptest! {
    #[test]
    fn prop_ledger_debits_are_exact(
        start in 0u32..1000,
        debits in proptest::collection::vec(0u32..200, 0..50),
    ) {
        let mut ledger = Ledger::new(start, 0);
        for amount in debits {
            let before = ledger.metal();
            let ok = ledger.spend(amount);
            prop_assert_eq!(ok, before >= amount);
            if ok {
                prop_assert_eq!(ledger.metal(), before - amount);
            } else {
                prop_assert_eq!(ledger.metal(), before);
            }
        }
    }

    #[test]
    fn prop_node_capacity_never_increases(takes in proptest::collection::vec(0u32..20, 0..100)) {
        let mut node = ResourceNode::new(ResourceKind::Unobtainium);
        let mut last = node.capacity();
        for take in takes {
            let removed = node.deplete(take);
            prop_assert!(removed <= take);
            prop_assert_eq!(node.capacity(), last - removed);
            prop_assert!(node.capacity() <= last);
            last = node.capacity();
        }
    }

    #[test]
    fn prop_trainer_completes_at_first_threshold(
        frames in proptest::collection::vec(arb_elapsed(), 1..300),
    ) {
        let mut ledger = Ledger::new(10, 0);
        let mut trainer = Trainer::new();
        trainer
            .request(ProductType::Builder, Position::default(), &mut ledger, &open_field())
            .expect("affordable");

        let mut total = 0u32;
        let mut completions = 0;
        for elapsed in frames {
            let before = total;
            total += elapsed;
            if let Some(product) = trainer.advance(elapsed) {
                prop_assert_eq!(product, ProductType::Builder);
                prop_assert!(before < 5000 && total >= 5000);
                completions += 1;
            }
        }
        prop_assert!(completions <= 1);
        prop_assert_eq!(completions == 1, total >= 5000);
    }

    #[test]
    fn prop_selection_is_singleton(script in arb_script(60)) {
        let mut session = crowded_session();
        for (input, elapsed) in &script {
            session.step(input, *elapsed);
            let flagged = session.world.units().iter().filter(|u| u.selected).count()
                + session.world.buildings().iter().filter(|b| b.selected).count();
            prop_assert!(flagged <= 1);
            prop_assert!(session.world.validate().is_ok());
        }
    }

    #[test]
    fn prop_camera_stays_in_bounds(script in arb_script(80)) {
        let mut session = crowded_session();
        let max = session.world.camera().max_position();
        for (input, elapsed) in &script {
            session.step(input, *elapsed);
            let pos = session.world.camera().position();
            prop_assert!(pos.x >= Fixed::ZERO && pos.x <= max.x);
            prop_assert!(pos.y >= Fixed::ZERO && pos.y <= max.y);
        }
    }

    #[test]
    fn prop_idle_world_keeps_entities(ticks in 1usize..50, elapsed in arb_elapsed()) {
        let mut session = crowded_session();
        let before = session.world.entity_count();
        for _ in 0..ticks {
            session.step(&InputSnapshot::empty(), elapsed);
        }
        prop_assert_eq!(session.world.entity_count(), before);
    }
}
