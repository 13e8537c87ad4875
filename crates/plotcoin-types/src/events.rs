//! Outbound messages from the simulation core.
//!
//! Two streams leave the core:
//!
//! - [`PresentationCommand`] -- fire-and-forget drawing commands for the
//!   tile renderer. The core never consumes a return value.
//! - [`SessionEvent`] -- a record of every decision and economic event, for
//!   dashboards, logs, and tests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::coord::GridCoord;
use crate::enums::{BotAction, DropReason, EquipmentKind, WeatherKind};
use crate::ids::{AgentId, ClaimId, ContractId, EquipmentId};

/// A drawing command for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PresentationCommand {
    /// Draw a land tile carrying a piece of equipment.
    DrawClaimTile {
        /// Where to draw.
        coord: GridCoord,
        /// The claim owning the tile.
        claim: ClaimId,
        /// The agent owning the claim.
        owner: AgentId,
        /// The equipment standing on the tile.
        kind: EquipmentKind,
    },
    /// Draw (or redraw) a weather tile.
    DrawWeatherTile {
        /// Where to draw.
        coord: GridCoord,
        /// The severity to show.
        weather: WeatherKind,
    },
    /// Overlay a highlight on the given tiles.
    HighlightTiles {
        /// Tiles to highlight.
        coords: Vec<GridCoord>,
    },
    /// Remove overlays (highlights or weather) from the given tiles.
    RemoveTiles {
        /// Tiles to clear.
        coords: Vec<GridCoord>,
    },
}

/// A timestamped event emitted by the simulation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionEvent {
    /// Simulation time in seconds when the event happened.
    pub at_secs: u64,
    /// What happened.
    pub detail: EventDetail,
}

/// The payload of a [`SessionEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventDetail {
    /// A new claim was placed on the map.
    ClaimCreated {
        /// The new claim.
        claim: ClaimId,
        /// Its owner.
        owner: AgentId,
        /// Its starting tile.
        start: GridCoord,
        /// The claim it was placed next to, if any.
        reference: Option<ClaimId>,
    },
    /// Equipment was bought and placed.
    EquipmentPurchased {
        /// The buying claim.
        claim: ClaimId,
        /// The new equipment instance.
        equipment: EquipmentId,
        /// Miner or panel.
        kind: EquipmentKind,
        /// The tile it was placed on.
        coord: GridCoord,
        /// Price paid in USD.
        #[ts(as = "String")]
        price: Decimal,
    },
    /// A purchase was dropped without spending anything.
    PurchaseDropped {
        /// The claim that attempted the purchase.
        claim: ClaimId,
        /// What it tried to buy.
        kind: EquipmentKind,
        /// Why it was dropped.
        reason: DropReason,
    },
    /// The lottery paid out a block reward.
    BlockMined {
        /// The winning miner's claim.
        claim: ClaimId,
        /// The winning miner.
        miner: EquipmentId,
        /// Reward in bitcoin.
        #[ts(as = "String")]
        reward_btc: Decimal,
        /// Reward credited to cash, in USD.
        #[ts(as = "String")]
        reward_usd: Decimal,
    },
    /// A lottery period passed without any eligible guess.
    BlockUnclaimed,
    /// A bot finished an analysis period.
    BotActed {
        /// The bot.
        agent: AgentId,
        /// The analysed claim.
        claim: ClaimId,
        /// The chosen action.
        action: BotAction,
    },
    /// A contract was offered to another agent.
    ContractOffered {
        /// The contract.
        contract: ContractId,
        /// The exporting agent.
        owner: AgentId,
        /// The agent the offer was sent to.
        counterparty: AgentId,
    },
    /// The counterparty accepted.
    ContractAccepted {
        /// The contract.
        contract: ContractId,
        /// The importing claim.
        counterparty_claim: ClaimId,
    },
    /// The counterparty declined.
    ContractRejected {
        /// The contract.
        contract: ContractId,
        /// The agent who declined.
        counterparty: AgentId,
    },
    /// One period of an accepted contract was delivered and paid.
    ContractSettled {
        /// The contract.
        contract: ContractId,
        /// Energy delivered, in watt-hours.
        watts: u64,
        /// Payment in USD.
        #[ts(as = "String")]
        payment: Decimal,
    },
    /// One period could not be delivered or paid and was skipped.
    ContractSettlementSkipped {
        /// The contract.
        contract: ContractId,
    },
    /// Both parties cancelled; the contract is inactive.
    ContractClosed {
        /// The contract.
        contract: ContractId,
    },
    /// A panel changed shading state.
    PanelShading {
        /// The panel.
        equipment: EquipmentId,
        /// Whether it is now shaded.
        shaded: bool,
    },
    /// A miner changed power state.
    MinerPower {
        /// The miner.
        equipment: EquipmentId,
        /// Whether it is now powered.
        powered: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_command_is_tagged() {
        let cmd = PresentationCommand::HighlightTiles {
            coords: vec![GridCoord::new(1, 2)],
        };
        let json = serde_json::to_value(&cmd).ok();
        assert_eq!(
            json.as_ref().and_then(|v| v.get("type")).and_then(|t| t.as_str()),
            Some("highlight_tiles")
        );
    }

    #[test]
    fn session_event_roundtrip() {
        let event = SessionEvent {
            at_secs: 600,
            detail: EventDetail::BlockMined {
                claim: ClaimId::new(),
                miner: EquipmentId::new(),
                reward_btc: Decimal::new(65, 1),
                reward_usd: Decimal::new(149_500, 0),
            },
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        let back: Result<SessionEvent, _> = serde_json::from_str(&json);
        assert_eq!(back.ok(), Some(event));
    }
}
