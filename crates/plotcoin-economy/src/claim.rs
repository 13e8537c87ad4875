//! Land claims and their economic counters.
//!
//! A [`Claim`] pairs the spatial [`ClaimFootprint`] with the money and energy
//! the claim has accumulated and the equipment installed on it. All
//! mutations check their preconditions first; on error nothing changes.
//!
//! The [`ClaimRegistry`] keeps every claim in creation order, which the
//! allocator relies on for its tie-break.

use plotcoin_types::{AgentId, ClaimId, EquipmentId};
use plotcoin_world::ClaimFootprint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::equipment::{Equipment, MinerState, PanelState};
use crate::error::EconomyError;
use crate::report::{PlotReport, ReportInputs, ReportParams};

/// One land claim with its counters and equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    footprint: ClaimFootprint,
    /// USD on hand. Never negative.
    cash: Decimal,
    /// Spendable energy in Wh.
    energy_reserve: u64,
    /// Cumulative energy from the claim's own panels, in Wh.
    self_produced_energy: u64,
    /// Cumulative energy received through contracts, in Wh.
    imported_energy: u64,
    /// Cumulative bitcoin mined.
    bitcoin_produced: Decimal,
    /// Installed equipment in purchase order.
    equipment: Vec<Equipment>,
}

impl Claim {
    /// Create a claim with starting cash and nothing installed.
    pub const fn new(footprint: ClaimFootprint, starting_cash: Decimal) -> Self {
        Self {
            footprint,
            cash: starting_cash,
            energy_reserve: 0,
            self_produced_energy: 0,
            imported_energy: 0,
            bitcoin_produced: Decimal::ZERO,
            equipment: Vec::new(),
        }
    }

    /// The claim's identifier.
    pub const fn id(&self) -> ClaimId {
        self.footprint.id()
    }

    /// The owning agent.
    pub const fn owner(&self) -> AgentId {
        self.footprint.owner()
    }

    /// Tiles, origin, and adjacency.
    pub const fn footprint(&self) -> &ClaimFootprint {
        &self.footprint
    }

    /// Mutable footprint, for growth and adjacency updates.
    pub const fn footprint_mut(&mut self) -> &mut ClaimFootprint {
        &mut self.footprint
    }

    // -------------------------------------------------------------------
    // Cash and bitcoin
    // -------------------------------------------------------------------

    /// USD on hand.
    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    /// Cumulative bitcoin mined.
    pub const fn bitcoin_produced(&self) -> Decimal {
        self.bitcoin_produced
    }

    /// Apply a signed change to the cash balance and return the new balance.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::NegativeCash`] if the balance would drop
    /// below zero. The balance is unchanged on error.
    pub fn change_cash_reserves(&mut self, delta: Decimal) -> Result<Decimal, EconomyError> {
        let updated = self
            .cash
            .checked_add(delta)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        if updated < Decimal::ZERO {
            return Err(EconomyError::NegativeCash {
                balance: self.cash,
                delta,
            });
        }
        self.cash = updated;
        Ok(updated)
    }

    /// Whether the claim can pay `amount` right now.
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.cash >= amount
    }

    /// Credit a won block: `usd` to cash, `btc` to the bitcoin counter and
    /// to the winning miner's lifetime rewards.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::NegativeBitcoinDelta`] for a negative reward,
    /// [`EconomyError::EquipmentNotFound`] if `miner` is not a miner on this
    /// claim, and [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn credit_block_reward(
        &mut self,
        miner: EquipmentId,
        btc: Decimal,
        usd: Decimal,
    ) -> Result<(), EconomyError> {
        if btc < Decimal::ZERO {
            return Err(EconomyError::NegativeBitcoinDelta { delta: btc });
        }
        let claim = self.id();
        let cash = self.cash.checked_add(usd).ok_or(EconomyError::ArithmeticOverflow)?;
        if cash < Decimal::ZERO {
            return Err(EconomyError::NegativeCash {
                balance: self.cash,
                delta: usd,
            });
        }
        let bitcoin = self
            .bitcoin_produced
            .checked_add(btc)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let state = self
            .miner_mut(miner)
            .ok_or(EconomyError::EquipmentNotFound {
                claim,
                equipment: miner,
            })?;
        let lifetime = state
            .lifetime_rewards
            .checked_add(btc)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        state.lifetime_rewards = lifetime;
        self.cash = cash;
        self.bitcoin_produced = bitcoin;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Energy
    // -------------------------------------------------------------------

    /// Spendable energy in Wh.
    pub const fn energy_reserve(&self) -> u64 {
        self.energy_reserve
    }

    /// Cumulative self-produced energy in Wh.
    pub const fn self_produced_energy(&self) -> u64 {
        self.self_produced_energy
    }

    /// Cumulative imported energy in Wh.
    pub const fn imported_energy(&self) -> u64 {
        self.imported_energy
    }

    /// Self-produced plus imported energy in Wh.
    pub const fn total_energy_produced(&self) -> u64 {
        self.self_produced_energy.saturating_add(self.imported_energy)
    }

    /// Add energy generated by the claim's own panels.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn record_self_produced(&mut self, wh: u64) -> Result<(), EconomyError> {
        let reserve = self
            .energy_reserve
            .checked_add(wh)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let produced = self
            .self_produced_energy
            .checked_add(wh)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.energy_reserve = reserve;
        self.self_produced_energy = produced;
        Ok(())
    }

    /// Add energy delivered by a contract.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn record_imported(&mut self, wh: u64) -> Result<(), EconomyError> {
        let reserve = self
            .energy_reserve
            .checked_add(wh)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let imported = self
            .imported_energy
            .checked_add(wh)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.energy_reserve = reserve;
        self.imported_energy = imported;
        Ok(())
    }

    /// Spend `wh` from the reserve if enough is stored. Returns whether the
    /// debit happened.
    pub fn try_debit_energy(&mut self, wh: u64) -> bool {
        match self.energy_reserve.checked_sub(wh) {
            Some(remaining) => {
                self.energy_reserve = remaining;
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------
    // Equipment
    // -------------------------------------------------------------------

    /// Every installed item in purchase order.
    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    /// Installed miners in purchase order.
    pub fn miners(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment.iter().filter(|e| e.as_miner().is_some())
    }

    /// Installed panels in purchase order.
    pub fn panels(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment.iter().filter(|e| e.as_panel().is_some())
    }

    /// Number of installed miners.
    pub fn miner_count(&self) -> usize {
        self.miners().count()
    }

    /// Look up an installed item.
    pub fn equipment_by_id(&self, id: EquipmentId) -> Option<&Equipment> {
        self.equipment.iter().find(|e| e.id() == id)
    }

    /// Miner payload of an installed miner.
    pub fn miner(&self, id: EquipmentId) -> Option<&MinerState> {
        self.equipment_by_id(id).and_then(Equipment::as_miner)
    }

    fn miner_mut(&mut self, id: EquipmentId) -> Option<&mut MinerState> {
        self.equipment
            .iter_mut()
            .find(|e| e.id() == id)
            .and_then(Equipment::as_miner_mut)
    }

    fn panel_mut(&mut self, id: EquipmentId) -> Option<&mut PanelState> {
        self.equipment
            .iter_mut()
            .find(|e| e.id() == id)
            .and_then(Equipment::as_panel_mut)
    }

    /// Pay for `item` and install it.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::NegativeCash`] if the claim cannot afford it;
    /// nothing is installed or spent in that case.
    pub fn install(&mut self, item: Equipment) -> Result<EquipmentId, EconomyError> {
        let cost = Decimal::ZERO
            .checked_sub(item.price())
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.change_cash_reserves(cost)?;
        let id = item.id();
        debug!(claim = %self.id(), equipment = %id, kind = %item.kind(), price = %item.price(), "equipment installed");
        self.equipment.push(item);
        Ok(id)
    }

    /// Power a miner up or down. Returns whether its state changed.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::EquipmentNotFound`] if `id` is not a miner on
    /// this claim.
    pub fn set_miner_powered(&mut self, id: EquipmentId, powered: bool) -> Result<bool, EconomyError> {
        let claim = self.id();
        self.miner_mut(id)
            .map(|miner| miner.set_powered(powered))
            .ok_or(EconomyError::EquipmentNotFound {
                claim,
                equipment: id,
            })
    }

    /// Shade or unshade a panel. Returns whether its state changed.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::EquipmentNotFound`] if `id` is not a panel on
    /// this claim.
    pub fn set_panel_shaded(&mut self, id: EquipmentId, shaded: bool) -> Result<bool, EconomyError> {
        let claim = self.id();
        self.panel_mut(id)
            .map(|panel| panel.set_shaded(shaded))
            .ok_or(EconomyError::EquipmentNotFound {
                claim,
                equipment: id,
            })
    }

    /// Sum of every installed item's price.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn equipment_value(&self) -> Result<Decimal, EconomyError> {
        self.equipment.iter().try_fold(Decimal::ZERO, |total, item| {
            total
                .checked_add(item.price())
                .ok_or(EconomyError::ArithmeticOverflow)
        })
    }

    /// Sum of every miner's hourly energy usage, in Wh.
    pub fn miner_energy_usage(&self) -> u64 {
        self.equipment
            .iter()
            .filter_map(Equipment::as_miner)
            .fold(0_u64, |total, miner| total.saturating_add(miner.energy_usage))
    }

    /// Snapshot the claim's counters into a report.
    ///
    /// # Errors
    ///
    /// See [`PlotReport::compute`].
    pub fn report(
        &self,
        previous: Option<&PlotReport>,
        params: &ReportParams,
    ) -> Result<PlotReport, EconomyError> {
        let inputs = ReportInputs {
            cash: self.cash,
            self_produced_energy: self.self_produced_energy,
            imported_energy: self.imported_energy,
            bitcoin_produced: self.bitcoin_produced,
            equipment_value: self.equipment_value()?,
            miner_energy_usage: self.miner_energy_usage(),
        };
        PlotReport::compute(&inputs, previous, params)
    }
}

/// Every claim in creation order.
#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    claims: Vec<Claim>,
}

impl ClaimRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self { claims: Vec::new() }
    }

    /// Append a newly created claim.
    pub fn push(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// Number of claims.
    pub const fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether no claim exists yet.
    pub const fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Look up a claim.
    pub fn get(&self, id: ClaimId) -> Option<&Claim> {
        self.claims.iter().find(|claim| claim.id() == id)
    }

    /// Look up a claim mutably.
    pub fn get_mut(&mut self, id: ClaimId) -> Option<&mut Claim> {
        self.claims.iter_mut().find(|claim| claim.id() == id)
    }

    /// Claims in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter()
    }

    /// Footprints in creation order.
    pub fn footprints(&self) -> impl Iterator<Item = &ClaimFootprint> {
        self.claims.iter().map(Claim::footprint)
    }

    /// Claims owned by `agent`, in creation order.
    pub fn owned_by(&self, agent: AgentId) -> impl Iterator<Item = &Claim> {
        self.claims.iter().filter(move |claim| claim.owner() == agent)
    }

    /// Current hashing power of a miner anywhere on the map.
    pub fn active_hash_power(&self, claim: ClaimId, miner: EquipmentId) -> u64 {
        self.get(claim)
            .and_then(|c| c.miner(miner))
            .map_or(0, |m| m.active_hash_power)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use plotcoin_types::{EquipmentKind, GridCoord};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::EquipmentCatalog;

    fn claim_with_cash(cash: Decimal) -> Claim {
        let footprint = ClaimFootprint::new(ClaimId::new(), AgentId::new(), GridCoord::ORIGIN, None, 1);
        Claim::new(footprint, cash)
    }

    #[test]
    fn cash_changes_apply() {
        let mut claim = claim_with_cash(dec!(100));
        assert_eq!(claim.change_cash_reserves(dec!(-40)).unwrap(), dec!(60));
        assert_eq!(claim.change_cash_reserves(dec!(15.5)).unwrap(), dec!(75.5));
    }

    #[test]
    fn negative_cash_is_rejected_without_mutation() {
        let mut claim = claim_with_cash(dec!(100));
        let before = claim.clone();
        let err = claim.change_cash_reserves(dec!(-100.01)).unwrap_err();
        assert!(matches!(err, EconomyError::NegativeCash { .. }));
        assert_eq!(claim, before);
        // Draining to exactly zero is fine.
        assert_eq!(claim.change_cash_reserves(dec!(-100)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn install_debits_price() {
        let catalog = EquipmentCatalog::default();
        let mut claim = claim_with_cash(dec!(5000));
        let miner = catalog.default_for(EquipmentKind::Miner).build(claim.id(), GridCoord::ORIGIN);
        claim.install(miner).unwrap();
        assert_eq!(claim.cash(), dec!(3000));
        assert_eq!(claim.miner_count(), 1);
        assert_eq!(claim.equipment_value().unwrap(), dec!(2000));
        assert_eq!(claim.miner_energy_usage(), 1372);
    }

    #[test]
    fn unaffordable_install_changes_nothing() {
        let catalog = EquipmentCatalog::default();
        let mut claim = claim_with_cash(dec!(100));
        let before = claim.clone();
        let panel = catalog.default_for(EquipmentKind::Panel).build(claim.id(), GridCoord::ORIGIN);
        assert!(matches!(claim.install(panel), Err(EconomyError::NegativeCash { .. })));
        assert_eq!(claim, before);
    }

    #[test]
    fn energy_reserve_is_checked_before_debit() {
        let mut claim = claim_with_cash(dec!(0));
        claim.record_self_produced(300).unwrap();
        claim.record_imported(100).unwrap();
        assert_eq!(claim.energy_reserve(), 400);
        assert_eq!(claim.total_energy_produced(), 400);
        assert!(claim.try_debit_energy(350));
        assert!(!claim.try_debit_energy(51));
        assert_eq!(claim.energy_reserve(), 50);
        // Cumulative counters never go down.
        assert_eq!(claim.self_produced_energy(), 300);
        assert_eq!(claim.imported_energy(), 100);
    }

    #[test]
    fn block_reward_credits_cash_bitcoin_and_miner() {
        let catalog = EquipmentCatalog::default();
        let mut claim = claim_with_cash(dec!(2000));
        let miner = catalog.default_for(EquipmentKind::Miner).build(claim.id(), GridCoord::ORIGIN);
        let id = claim.install(miner).unwrap();
        claim.credit_block_reward(id, dec!(6.5), dec!(149500)).unwrap();
        assert_eq!(claim.cash(), dec!(149500));
        assert_eq!(claim.bitcoin_produced(), dec!(6.5));
        assert_eq!(claim.miner(id).unwrap().lifetime_rewards, dec!(6.5));

        let before = claim.clone();
        assert!(claim.credit_block_reward(id, dec!(-1), dec!(0)).is_err());
        assert!(claim.credit_block_reward(EquipmentId::new(), dec!(1), dec!(1)).is_err());
        assert_eq!(claim, before);
    }

    #[test]
    fn power_and_shade_toggles() {
        let catalog = EquipmentCatalog::default();
        let mut claim = claim_with_cash(dec!(5000));
        let miner = claim
            .install(catalog.default_for(EquipmentKind::Miner).build(claim.id(), GridCoord::ORIGIN))
            .unwrap();
        let panel = claim
            .install(catalog.default_for(EquipmentKind::Panel).build(claim.id(), GridCoord::new(1, 0)))
            .unwrap();
        assert!(claim.set_miner_powered(miner, false).unwrap());
        assert_eq!(claim.miner(miner).unwrap().active_hash_power, 0);
        assert!(claim.set_panel_shaded(panel, true).unwrap());
        assert!(claim.set_miner_powered(panel, true).is_err());
        assert!(claim.set_panel_shaded(miner, true).is_err());
    }

    #[test]
    fn claim_roundtrip_preserves_counters_and_equipment() {
        let catalog = EquipmentCatalog::default();
        let mut claim = claim_with_cash(dec!(5000));
        let id = claim
            .install(catalog.default_for(EquipmentKind::Miner).build(claim.id(), GridCoord::ORIGIN))
            .unwrap();
        claim
            .install(catalog.default_for(EquipmentKind::Panel).build(claim.id(), GridCoord::new(0, 1)))
            .unwrap();
        claim.record_self_produced(1234).unwrap();
        claim.record_imported(56).unwrap();
        claim.credit_block_reward(id, dec!(6.5), dec!(149500)).unwrap();

        let json = serde_json::to_string(&claim).unwrap();
        let restored: Claim = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, claim);
        assert_eq!(restored.self_produced_energy(), 1234);
        assert_eq!(restored.imported_energy(), 56);
        assert_eq!(restored.bitcoin_produced(), dec!(6.5));
        assert_eq!(restored.cash(), claim.cash());
        assert_eq!(restored.equipment().len(), 2);
    }

    #[test]
    fn registry_keeps_creation_order() {
        let mut registry = ClaimRegistry::new();
        let a = claim_with_cash(dec!(1));
        let b = claim_with_cash(dec!(2));
        let (a_id, b_id) = (a.id(), b.id());
        registry.push(a);
        registry.push(b);
        let order: Vec<ClaimId> = registry.footprints().map(ClaimFootprint::id).collect();
        assert_eq!(order, vec![a_id, b_id]);
        assert_eq!(registry.get(b_id).map(Claim::cash), Some(dec!(2)));
        assert_eq!(registry.active_hash_power(a_id, EquipmentId::new()), 0);
    }
}
