//! Economy and resource management.
//!
//! Engineers mine resource nodes, carry the take to the nearest Command
//! Centre and credit it to the shared [`Ledger`]. The amount moved per trip
//! is the ledger's carry allowance, which Pylons raise.
//!
//! All quantities are integers; nothing here touches floating point.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Position};
use crate::math::WideFixed;

/// Time an Engineer must spend at a node before it picks up a load.
pub const MINE_TIME_MS: u32 = 5000;

/// Carry allowance at the start of a session.
pub const STARTING_ALLOWANCE: u32 = 2;

/// Resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Common construction material; pays for all production.
    Metal,
    /// Rare material. Collected and tallied only.
    Unobtainium,
}

impl ResourceKind {
    /// Capacity of a freshly placed node of this kind.
    #[must_use]
    pub const fn initial_capacity(self) -> u32 {
        match self {
            Self::Metal => 500,
            Self::Unobtainium => 50,
        }
    }
}

/// A resource node Engineers can mine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    kind: ResourceKind,
    capacity: u32,
}

impl ResourceNode {
    /// A full node of `kind`.
    #[must_use]
    pub const fn new(kind: ResourceKind) -> Self {
        Self::with_capacity(kind, kind.initial_capacity())
    }

    /// A node holding exactly `capacity`.
    #[must_use]
    pub const fn with_capacity(kind: ResourceKind, capacity: u32) -> Self {
        Self { kind, capacity }
    }

    /// What this node yields.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Units left in the node.
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Check if this node is depleted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.capacity == 0
    }

    /// Remove up to `amount` from the node, flooring at zero.
    ///
    /// Returns the amount actually removed.
    pub fn deplete(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.capacity);
        self.capacity -= removed;
        removed
    }
}

/// Global resource ledger shared by every producer and miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    metal: u32,
    unobtainium: u32,
    carry_allowance: u32,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl Ledger {
    /// A ledger with the given balances and the starting allowance.
    #[must_use]
    pub const fn new(metal: u32, unobtainium: u32) -> Self {
        Self {
            metal,
            unobtainium,
            carry_allowance: STARTING_ALLOWANCE,
        }
    }

    /// Metal on hand.
    #[must_use]
    pub const fn metal(&self) -> u32 {
        self.metal
    }

    /// Unobtainium on hand.
    #[must_use]
    pub const fn unobtainium(&self) -> u32 {
        self.unobtainium
    }

    /// Units an Engineer moves per trip.
    #[must_use]
    pub const fn carry_allowance(&self) -> u32 {
        self.carry_allowance
    }

    /// Check if the ledger covers a metal cost.
    #[must_use]
    pub const fn can_afford(&self, metal: u32) -> bool {
        self.metal >= metal
    }

    /// Debit `metal` if the balance covers it.
    ///
    /// Returns true if the debit happened. A failed debit changes nothing.
    pub fn spend(&mut self, metal: u32) -> bool {
        if self.can_afford(metal) {
            self.metal -= metal;
            true
        } else {
            false
        }
    }

    /// Credit `amount` of `kind`.
    pub fn credit(&mut self, kind: ResourceKind, amount: u32) {
        match kind {
            ResourceKind::Metal => self.metal = self.metal.saturating_add(amount),
            ResourceKind::Unobtainium => {
                self.unobtainium = self.unobtainium.saturating_add(amount);
            }
        }
    }

    /// Raise the carry allowance by one.
    pub fn raise_allowance(&mut self) {
        self.carry_allowance = self.carry_allowance.saturating_add(1);
    }
}

/// A load in transit: what it is and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cargo {
    /// Kind being carried.
    pub kind: ResourceKind,
    /// Node the load came from; the Engineer returns here after depositing.
    pub mine: Position,
}

/// Mining capability of an Engineer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinerState {
    cargo: Option<Cargo>,
    mine_elapsed_ms: u32,
}

impl MinerState {
    /// Whether a load is being carried.
    #[must_use]
    pub const fn is_carrying(&self) -> bool {
        self.cargo.is_some()
    }

    /// The current load, if any.
    #[must_use]
    pub const fn cargo(&self) -> Option<Cargo> {
        self.cargo
    }

    /// Time accrued toward the next load.
    #[must_use]
    pub const fn mine_elapsed_ms(&self) -> u32 {
        self.mine_elapsed_ms
    }

    /// Add mining time. Returns true once enough has accrued for a load.
    pub fn accrue(&mut self, elapsed_ms: u32) -> bool {
        self.mine_elapsed_ms = self.mine_elapsed_ms.saturating_add(elapsed_ms);
        self.mine_elapsed_ms >= MINE_TIME_MS
    }

    /// Take on a load and reset the mining timer.
    pub fn pick_up(&mut self, cargo: Cargo) {
        self.cargo = Some(cargo);
        self.mine_elapsed_ms = 0;
    }

    /// Drop the current load, returning it.
    pub fn drop_off(&mut self) -> Option<Cargo> {
        self.cargo.take()
    }
}

/// Closest depot to `from`.
///
/// Strict `<` comparison: among equally distant depots the first one seen wins.
pub fn nearest_depot<I>(from: Position, depots: I) -> Option<(EntityId, Position)>
where
    I: IntoIterator<Item = (EntityId, Position)>,
{
    let mut best: Option<(EntityId, Position, WideFixed)> = None;
    for (id, position) in depots {
        let distance = from.as_vec().distance_squared(position.as_vec());
        match best {
            Some((_, _, best_distance)) if distance >= best_distance => {}
            _ => best = Some((id, position, distance)),
        }
    }
    best.map(|(id, position, _)| (id, position))
}

/// Events generated by the economy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EconomyEvent {
    /// An Engineer took a load from a node.
    ResourceGathered {
        /// The Engineer.
        miner: EntityId,
        /// The node mined.
        node: EntityId,
        /// Kind taken.
        kind: ResourceKind,
        /// Amount removed from the node.
        amount: u32,
    },
    /// An Engineer credited its load at a Command Centre.
    ResourceDeposited {
        /// The Engineer.
        miner: EntityId,
        /// The Command Centre.
        depot: EntityId,
        /// Kind credited.
        kind: ResourceKind,
        /// Amount credited.
        amount: u32,
    },
    /// A node ran dry and was queued for removal.
    NodeDepleted {
        /// The node.
        node: EntityId,
    },
    /// A Pylon raised the carry allowance.
    AllowanceRaised {
        /// The Pylon.
        pylon: EntityId,
        /// Allowance after the raise.
        allowance: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_depletion_floors_at_zero() {
        let mut node = ResourceNode::with_capacity(ResourceKind::Metal, 3);
        assert_eq!(node.deplete(2), 2);
        assert_eq!(node.capacity(), 1);
        assert_eq!(node.deplete(2), 1);
        assert_eq!(node.capacity(), 0);
        assert!(node.is_empty());
        assert_eq!(node.deplete(2), 0);
    }

    #[test]
    fn test_initial_capacities() {
        assert_eq!(ResourceNode::new(ResourceKind::Metal).capacity(), 500);
        assert_eq!(ResourceNode::new(ResourceKind::Unobtainium).capacity(), 50);
    }

    #[test]
    fn test_ledger_spend() {
        let mut ledger = Ledger::new(10, 0);
        assert!(ledger.spend(5));
        assert_eq!(ledger.metal(), 5);
        assert!(!ledger.spend(6));
        assert_eq!(ledger.metal(), 5);
        assert!(ledger.spend(5));
        assert_eq!(ledger.metal(), 0);
    }

    #[test]
    fn test_ledger_credit_by_kind() {
        let mut ledger = Ledger::default();
        ledger.credit(ResourceKind::Metal, 2);
        ledger.credit(ResourceKind::Unobtainium, 3);
        assert_eq!(ledger.metal(), 2);
        assert_eq!(ledger.unobtainium(), 3);
    }

    #[test]
    fn test_allowance_starts_at_two_and_rises() {
        let mut ledger = Ledger::default();
        assert_eq!(ledger.carry_allowance(), 2);
        ledger.raise_allowance();
        assert_eq!(ledger.carry_allowance(), 3);
    }

    #[test]
    fn test_miner_accrues_then_carries() {
        let mut miner = MinerState::default();
        assert!(!miner.accrue(4999));
        assert!(miner.accrue(1));
        miner.pick_up(Cargo {
            kind: ResourceKind::Metal,
            mine: Position::from_ints(5, 5),
        });
        assert!(miner.is_carrying());
        assert_eq!(miner.mine_elapsed_ms(), 0);
        let cargo = miner.drop_off().expect("carrying");
        assert_eq!(cargo.mine, Position::from_ints(5, 5));
        assert!(!miner.is_carrying());
    }

    #[test]
    fn test_nearest_depot_first_seen_wins_ties() {
        let from = Position::from_ints(100, 100);
        let depots = [
            (1, Position::from_ints(300, 100)),
            (2, Position::from_ints(0, 100)),
            (3, Position::from_ints(200, 100)),
        ];
        // 2 and 3 are both 100 away; 2 was seen first
        assert_eq!(
            nearest_depot(from, depots),
            Some((2, Position::from_ints(0, 100)))
        );
        assert_eq!(nearest_depot(from, []), None);
    }

    #[test]
    fn test_nearest_depot_across_a_wide_map() {
        let from = Position::from_ints(0, 0);
        let depots = [
            (1, Position::from_ints(90_000, 0)),
            (2, Position::from_ints(50_000, 0)),
        ];
        assert_eq!(
            nearest_depot(from, depots),
            Some((2, Position::from_ints(50_000, 0)))
        );
    }
}
