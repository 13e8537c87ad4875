//! The bot decision rule.
//!
//! At the end of every analysis window a bot turns its fresh
//! [`PlotReport`] into exactly one [`BotAction`]:
//!
//! 1. If the claim owns equipment and `cash / equipment_value` exceeds the
//!    cash ratio, buy equipment (which kind depends on the investment policy
//!    and self-sustainability). If the chosen item is unaffordable, save.
//! 2. Otherwise, if the claim is self-sustainable, offer its surplus in a
//!    contract.
//! 3. Otherwise, save.
//!
//! A claim with no equipment never invests: its ratio is undefined.

use plotcoin_economy::PlotReport;
use plotcoin_types::{BotAction, EquipmentKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::profile::{BotProfile, InvestmentPolicy};

/// Prices of the default items, as the decision rule needs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPrices {
    /// Price of the default miner.
    pub miner: Decimal,
    /// Price of the default panel.
    pub panel: Decimal,
}

impl DefaultPrices {
    const fn for_kind(self, kind: EquipmentKind) -> Decimal {
        match kind {
            EquipmentKind::Miner => self.miner,
            EquipmentKind::Panel => self.panel,
        }
    }
}

/// Choose this period's action.
pub fn decide(report: &PlotReport, profile: &BotProfile, prices: DefaultPrices) -> BotAction {
    if should_invest(report.cash, report.equipment_value, profile.cash_ratio) {
        let kind = investment_kind(profile.policy, report.self_sustainable);
        if report.cash >= prices.for_kind(kind) {
            return match kind {
                EquipmentKind::Miner => BotAction::BuyMiner,
                EquipmentKind::Panel => BotAction::BuyPanel,
            };
        }
        return BotAction::Save;
    }
    if report.self_sustainable {
        BotAction::CreateContract
    } else {
        BotAction::Save
    }
}

/// `cash / equipment_value > cash_ratio`, false when there is no equipment.
fn should_invest(cash: Decimal, equipment_value: Decimal, cash_ratio: Decimal) -> bool {
    if equipment_value <= Decimal::ZERO {
        return false;
    }
    cash.checked_div(equipment_value)
        .is_some_and(|ratio| ratio > cash_ratio)
}

const fn investment_kind(policy: InvestmentPolicy, self_sustainable: bool) -> EquipmentKind {
    match (policy, self_sustainable) {
        (InvestmentPolicy::MinersWhenSelfSustaining, true)
        | (InvestmentPolicy::PanelsWhenSelfSustaining, false) => EquipmentKind::Miner,
        (InvestmentPolicy::MinersWhenSelfSustaining, false)
        | (InvestmentPolicy::PanelsWhenSelfSustaining, true) => EquipmentKind::Panel,
    }
}

/// Every action a bot has taken, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionHistory {
    actions: Vec<BotAction>,
}

impl ActionHistory {
    /// An empty history.
    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Append an action.
    pub fn record(&mut self, action: BotAction) {
        self.actions.push(action);
    }

    /// The most recent action, if any.
    pub fn last(&self) -> Option<BotAction> {
        self.actions.last().copied()
    }

    /// All actions, oldest first.
    pub fn actions(&self) -> &[BotAction] {
        &self.actions
    }

    /// Number of recorded actions.
    pub const fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing has been recorded.
    pub const fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const PRICES: DefaultPrices = DefaultPrices {
        miner: dec!(2000),
        panel: dec!(250),
    };

    fn profile(cash_ratio: Decimal, policy: InvestmentPolicy) -> BotProfile {
        BotProfile {
            window_mins: 5,
            cash_ratio,
            self_sustain_ratio: dec!(0.5),
            policy,
        }
    }

    fn report(cash: Decimal, equipment_value: Decimal, self_sustainable: bool) -> PlotReport {
        PlotReport {
            cash,
            cumulative_self_produced: 0,
            cumulative_total_energy: 0,
            cumulative_bitcoin: Decimal::ZERO,
            self_generated: 0,
            total_energy: 0,
            bitcoin_mined: Decimal::ZERO,
            miner_capacity: 0,
            target_self_generated: 0,
            self_sustainable,
            surplus_energy: 0,
            avg_watt_cost: Decimal::ZERO,
            equipment_value,
        }
    }

    #[test]
    fn invests_in_miner_when_sustainable_by_default() {
        let p = profile(dec!(0.5), InvestmentPolicy::MinersWhenSelfSustaining);
        assert_eq!(decide(&report(dec!(3000), dec!(2250), true), &p, PRICES), BotAction::BuyMiner);
        assert_eq!(decide(&report(dec!(3000), dec!(2250), false), &p, PRICES), BotAction::BuyPanel);
    }

    #[test]
    fn inverted_policy_swaps_the_kind() {
        let p = profile(dec!(0.5), InvestmentPolicy::PanelsWhenSelfSustaining);
        assert_eq!(decide(&report(dec!(3000), dec!(2250), true), &p, PRICES), BotAction::BuyPanel);
        assert_eq!(decide(&report(dec!(3000), dec!(2250), false), &p, PRICES), BotAction::BuyMiner);
    }

    #[test]
    fn unaffordable_investment_degrades_to_save() {
        // Ratio 1500 / 250 = 6 clears the threshold, but a miner costs 2000.
        let p = profile(dec!(0.5), InvestmentPolicy::MinersWhenSelfSustaining);
        assert_eq!(decide(&report(dec!(1500), dec!(250), true), &p, PRICES), BotAction::Save);
    }

    #[test]
    fn cautious_bot_exports_surplus() {
        let p = profile(dec!(10), InvestmentPolicy::MinersWhenSelfSustaining);
        assert_eq!(decide(&report(dec!(3000), dec!(2250), true), &p, PRICES), BotAction::CreateContract);
        assert_eq!(decide(&report(dec!(3000), dec!(2250), false), &p, PRICES), BotAction::Save);
    }

    #[test]
    fn no_equipment_never_invests() {
        let p = profile(dec!(0), InvestmentPolicy::MinersWhenSelfSustaining);
        assert_eq!(decide(&report(dec!(5000), dec!(0), true), &p, PRICES), BotAction::CreateContract);
        assert_eq!(decide(&report(dec!(5000), dec!(0), false), &p, PRICES), BotAction::Save);
    }

    #[test]
    fn ratio_must_strictly_exceed_threshold() {
        let p = profile(dec!(1), InvestmentPolicy::MinersWhenSelfSustaining);
        assert_eq!(decide(&report(dec!(2250), dec!(2250), false), &p, PRICES), BotAction::Save);
    }

    #[test]
    fn history_records_in_order() {
        let mut history = ActionHistory::new();
        assert!(history.last().is_none());
        history.record(BotAction::Save);
        history.record(BotAction::BuyPanel);
        assert_eq!(history.len(), 2);
        assert_eq!(history.last(), Some(BotAction::BuyPanel));
        assert_eq!(history.actions(), &[BotAction::Save, BotAction::BuyPanel]);
    }
}
