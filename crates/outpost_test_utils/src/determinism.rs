//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the world produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! The same placements, inputs and elapsed times must always produce the
//! same world. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`outpost_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entity collections are plain vectors updated in insertion order.
//!
//! - **Wall-clock time**: The world never reads a clock; the host supplies
//!   elapsed milliseconds every tick.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use outpost_core::input::InputSnapshot;
use outpost_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic world).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the world was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "World is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick; receives the tick index
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for tick in 0..ticks {
            step(&mut state, tick);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Hash a world, panicking if it cannot be encoded.
///
/// # Panics
///
/// Panics if the world fails to serialize.
#[must_use]
pub fn world_hash(world: &World) -> u64 {
    world.state_hash().expect("world should serialize")
}

/// Drive two worlds through the same script, finding first divergence.
///
/// `advance` is called with each world and the scripted input for that
/// tick.
///
/// # Returns
///
/// `None` if the worlds stay identical, `Some(tick)` (1-based) otherwise.
pub fn find_first_divergence<Setup, Advance>(
    setup: Setup,
    script: &[(InputSnapshot, u32)],
    advance: Advance,
) -> Option<u64>
where
    Setup: Fn() -> World,
    Advance: Fn(&mut World, &InputSnapshot, u32),
{
    let mut first = setup();
    let mut second = setup();

    if world_hash(&first) != world_hash(&second) {
        return Some(0);
    }

    for (tick, (input, elapsed_ms)) in (1..).zip(script) {
        advance(&mut first, input, *elapsed_ms);
        advance(&mut second, input, *elapsed_ms);

        if world_hash(&first) != world_hash(&second) {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for world testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use proptest::prelude::*;

    use outpost_core::components::{BuildingKind, EntityKind, Position, UnitKind};
    use outpost_core::economy::ResourceKind;
    use outpost_core::input::{InputSnapshot, Key};
    use outpost_core::loader::Placement;

    /// Generate an on-map position (map is 3200 × 2560).
    pub fn arb_position() -> impl Strategy<Value = Position> {
        (0i32..3200i32, 0i32..2560i32).prop_map(|(x, y)| Position::from_ints(x, y))
    }

    /// Generate a frame time in milliseconds.
    pub fn arb_elapsed() -> impl Strategy<Value = u32> {
        1u32..100u32
    }

    /// Generate any entity kind.
    pub fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Building(BuildingKind::CommandCentre)),
            Just(EntityKind::Building(BuildingKind::Factory)),
            Just(EntityKind::Building(BuildingKind::Pylon)),
            Just(EntityKind::Resource(ResourceKind::Metal)),
            Just(EntityKind::Resource(ResourceKind::Unobtainium)),
            Just(EntityKind::Unit(UnitKind::Scout)),
            Just(EntityKind::Unit(UnitKind::Builder)),
            Just(EntityKind::Unit(UnitKind::Engineer)),
            Just(EntityKind::Unit(UnitKind::Truck)),
        ]
    }

    /// Generate one placement.
    pub fn arb_placement() -> impl Strategy<Value = Placement> {
        (arb_entity_kind(), arb_position())
            .prop_map(|(kind, position)| Placement { kind, position })
    }

    /// Generate a set of initial placements.
    pub fn arb_placements(max: usize) -> impl Strategy<Value = Vec<Placement>> {
        proptest::collection::vec(arb_placement(), 1..max)
    }

    /// Generate a key the world reacts to.
    pub fn arb_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            Just(Key::Num1),
            Just(Key::Num2),
            Just(Key::Num3),
            Just(Key::W),
            Just(Key::A),
            Just(Key::S),
            Just(Key::D),
        ]
    }

    /// Generate a frame of player input: maybe a click, maybe a key.
    pub fn arb_input() -> impl Strategy<Value = InputSnapshot> {
        (
            0u8..4u8,
            0i32..1024i32,
            0i32..768i32,
            proptest::option::of(arb_key()),
        )
            .prop_map(|(click, x, y, key)| {
                let mut input = match click {
                    0 => InputSnapshot::empty().with_left_click(x, y),
                    1 => InputSnapshot::empty().with_right_click(x, y),
                    _ => InputSnapshot::empty(),
                };
                if let Some(key) = key {
                    input = input.with_key_pressed(key);
                }
                input
            })
    }

    /// Generate a script of inputs with frame times.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<(InputSnapshot, u32)>> {
        proptest::collection::vec((arb_input(), arb_elapsed()), 0..max_len)
    }
}
