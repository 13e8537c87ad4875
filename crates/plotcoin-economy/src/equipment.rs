//! Installed equipment: miners and solar panels.
//!
//! [`Equipment`] carries the fields every piece shares (id, owning claim,
//! catalog item, price, tile) plus an [`EquipmentState`] payload with the
//! variant-specific ratings and live values.

use plotcoin_types::{ClaimId, EquipmentId, EquipmentKind, GridCoord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Live state of a miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerState {
    /// Hashing power when powered, in TH/s.
    pub rated_hash_power: u64,
    /// Hashing power right now: rated, or 0 when unpowered.
    pub active_hash_power: u64,
    /// Energy drawn per hour of operation, in Wh.
    pub energy_usage: u64,
    /// Bitcoin won by this miner over its lifetime.
    pub lifetime_rewards: Decimal,
}

/// Live state of a solar panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelState {
    /// Output in full sun, in Wh per hour.
    pub rated_output: u64,
    /// Output right now: rated, or 0 when shaded.
    pub active_output: u64,
}

/// Variant-specific payload of a piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EquipmentState {
    /// A miner.
    Miner(MinerState),
    /// A solar panel.
    Panel(PanelState),
}

/// One installed piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    id: EquipmentId,
    claim: ClaimId,
    catalog_id: String,
    price: Decimal,
    coord: GridCoord,
    state: EquipmentState,
}

impl Equipment {
    /// Build a powered miner.
    pub fn miner(
        claim: ClaimId,
        catalog_id: impl Into<String>,
        price: Decimal,
        coord: GridCoord,
        hash_power: u64,
        energy_usage: u64,
    ) -> Self {
        Self {
            id: EquipmentId::new(),
            claim,
            catalog_id: catalog_id.into(),
            price,
            coord,
            state: EquipmentState::Miner(MinerState {
                rated_hash_power: hash_power,
                active_hash_power: hash_power,
                energy_usage,
                lifetime_rewards: Decimal::ZERO,
            }),
        }
    }

    /// Build an unshaded panel.
    pub fn panel(
        claim: ClaimId,
        catalog_id: impl Into<String>,
        price: Decimal,
        coord: GridCoord,
        output: u64,
    ) -> Self {
        Self {
            id: EquipmentId::new(),
            claim,
            catalog_id: catalog_id.into(),
            price,
            coord,
            state: EquipmentState::Panel(PanelState {
                rated_output: output,
                active_output: output,
            }),
        }
    }

    /// Instance id.
    pub const fn id(&self) -> EquipmentId {
        self.id
    }

    /// The claim this equipment belongs to. Fixed at construction.
    pub const fn claim(&self) -> ClaimId {
        self.claim
    }

    /// The catalog item it was built from.
    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    /// Purchase price in USD.
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// The tile it stands on.
    pub const fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Miner or panel.
    pub const fn kind(&self) -> EquipmentKind {
        match self.state {
            EquipmentState::Miner(_) => EquipmentKind::Miner,
            EquipmentState::Panel(_) => EquipmentKind::Panel,
        }
    }

    /// The variant payload.
    pub const fn state(&self) -> &EquipmentState {
        &self.state
    }

    /// The miner payload, if this is a miner.
    pub const fn as_miner(&self) -> Option<&MinerState> {
        match &self.state {
            EquipmentState::Miner(miner) => Some(miner),
            EquipmentState::Panel(_) => None,
        }
    }

    /// Mutable miner payload, if this is a miner.
    pub const fn as_miner_mut(&mut self) -> Option<&mut MinerState> {
        match &mut self.state {
            EquipmentState::Miner(miner) => Some(miner),
            EquipmentState::Panel(_) => None,
        }
    }

    /// The panel payload, if this is a panel.
    pub const fn as_panel(&self) -> Option<&PanelState> {
        match &self.state {
            EquipmentState::Panel(panel) => Some(panel),
            EquipmentState::Miner(_) => None,
        }
    }

    /// Mutable panel payload, if this is a panel.
    pub const fn as_panel_mut(&mut self) -> Option<&mut PanelState> {
        match &mut self.state {
            EquipmentState::Panel(panel) => Some(panel),
            EquipmentState::Miner(_) => None,
        }
    }
}

impl MinerState {
    /// Switch the miner on or off. Returns `true` if the state changed.
    pub const fn set_powered(&mut self, powered: bool) -> bool {
        let target = if powered { self.rated_hash_power } else { 0 };
        let changed = self.active_hash_power != target;
        self.active_hash_power = target;
        changed
    }

    /// Whether the miner is currently hashing.
    pub const fn is_powered(&self) -> bool {
        self.active_hash_power > 0
    }
}

impl PanelState {
    /// Shade or unshade the panel. Returns `true` if the state changed.
    pub const fn set_shaded(&mut self, shaded: bool) -> bool {
        let target = if shaded { 0 } else { self.rated_output };
        let changed = self.active_output != target;
        self.active_output = target;
        changed
    }
}
