//! Running counts of session events for end-of-run logging.

use plotcoin_types::{BotAction, EventDetail, SessionEvent};
use tracing::info;

/// Event counts accumulated across the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    /// Claims placed.
    pub claims: u64,
    /// Equipment bought.
    pub purchases: u64,
    /// Purchases refused for placement.
    pub dropped_purchases: u64,
    /// Bot analyses that ended in `Save`.
    pub bot_saves: u64,
    /// Bot analyses that bought something or drafted a contract.
    pub bot_moves: u64,
    /// Contracts accepted by a counterparty.
    pub contracts_accepted: u64,
    /// Contracts turned down.
    pub contracts_rejected: u64,
    /// Contract periods delivered.
    pub settlements: u64,
    /// Contract periods skipped.
    pub skipped_settlements: u64,
    /// Miner power toggles.
    pub power_changes: u64,
    /// Panel shading toggles.
    pub shading_changes: u64,
}

impl EventTally {
    /// Fold a batch of drained events into the counts.
    pub fn record(&mut self, events: &[SessionEvent]) {
        for event in events {
            let counter = match &event.detail {
                EventDetail::ClaimCreated { .. } => &mut self.claims,
                EventDetail::EquipmentPurchased { .. } => &mut self.purchases,
                EventDetail::PurchaseDropped { .. } => &mut self.dropped_purchases,
                EventDetail::BotActed {
                    action: BotAction::Save,
                    ..
                } => &mut self.bot_saves,
                EventDetail::BotActed { .. } => &mut self.bot_moves,
                EventDetail::ContractAccepted { .. } => &mut self.contracts_accepted,
                EventDetail::ContractRejected { .. } => &mut self.contracts_rejected,
                EventDetail::ContractSettled { .. } => &mut self.settlements,
                EventDetail::ContractSettlementSkipped { .. } => &mut self.skipped_settlements,
                EventDetail::MinerPower { .. } => &mut self.power_changes,
                EventDetail::PanelShading { .. } => &mut self.shading_changes,
                // Block outcomes are counted by the session itself.
                EventDetail::BlockMined { .. }
                | EventDetail::BlockUnclaimed
                | EventDetail::ContractOffered { .. }
                | EventDetail::ContractClosed { .. } => continue,
            };
            *counter = counter.saturating_add(1);
        }
    }

    /// Emit the counts as one structured log line.
    pub fn log(&self) {
        info!(
            claims = self.claims,
            purchases = self.purchases,
            dropped_purchases = self.dropped_purchases,
            bot_saves = self.bot_saves,
            bot_moves = self.bot_moves,
            contracts_accepted = self.contracts_accepted,
            contracts_rejected = self.contracts_rejected,
            settlements = self.settlements,
            skipped_settlements = self.skipped_settlements,
            power_changes = self.power_changes,
            shading_changes = self.shading_changes,
            "event totals"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use plotcoin_types::{AgentId, ClaimId, ContractId};

    use super::*;

    fn at(detail: EventDetail) -> SessionEvent {
        SessionEvent { at_secs: 0, detail }
    }

    #[test]
    fn bot_actions_split_into_saves_and_moves() {
        let agent = AgentId::new();
        let claim = ClaimId::new();
        let mut tally = EventTally::default();
        tally.record(&[
            at(EventDetail::BotActed {
                agent,
                claim,
                action: BotAction::Save,
            }),
            at(EventDetail::BotActed {
                agent,
                claim,
                action: BotAction::BuyMiner,
            }),
            at(EventDetail::BotActed {
                agent,
                claim,
                action: BotAction::CreateContract,
            }),
        ]);
        assert_eq!(tally.bot_saves, 1);
        assert_eq!(tally.bot_moves, 2);
    }

    #[test]
    fn batches_accumulate() {
        let contract = ContractId::new();
        let mut tally = EventTally::default();
        tally.record(&[at(EventDetail::ContractSettlementSkipped { contract })]);
        tally.record(&[
            at(EventDetail::ContractSettlementSkipped { contract }),
            at(EventDetail::BlockUnclaimed),
        ]);
        assert_eq!(tally.skipped_settlements, 2);
        assert_eq!(
            tally,
            EventTally {
                skipped_settlements: 2,
                ..EventTally::default()
            }
        );
    }
}
