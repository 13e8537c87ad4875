//! Enumeration types shared across the Plotcoin workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// The two kinds of equipment a claim can install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EquipmentKind {
    /// Converts energy into lottery guesses (hashing power).
    Miner,
    /// Converts sunlight into energy.
    Panel,
}

impl core::fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Miner => write!(f, "miner"),
            Self::Panel => write!(f, "panel"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bot actions
// ---------------------------------------------------------------------------

/// The single action a bot takes at the end of an analysis period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BotAction {
    /// Offer surplus energy to another agent.
    CreateContract,
    /// Purchase the default miner.
    BuyMiner,
    /// Purchase the default panel.
    BuyPanel,
    /// Do nothing this period.
    Save,
}

impl BotAction {
    /// The equipment this action purchases, if any.
    pub const fn purchase_kind(self) -> Option<EquipmentKind> {
        match self {
            Self::BuyMiner => Some(EquipmentKind::Miner),
            Self::BuyPanel => Some(EquipmentKind::Panel),
            Self::CreateContract | Self::Save => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Severity of a weather tile, derived from how many clouds overlap on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum WeatherKind {
    /// A single cloud.
    Cloud,
    /// Two overlapping clouds.
    Storm,
    /// Three or more overlapping clouds.
    HellRain,
}

impl WeatherKind {
    /// Classify a tile by its cloud count. Returns `None` for an empty tile.
    pub const fn from_cloud_count(count: u32) -> Option<Self> {
        match count {
            0 => None,
            1 => Some(Self::Cloud),
            2 => Some(Self::Storm),
            _ => Some(Self::HellRain),
        }
    }
}

// ---------------------------------------------------------------------------
// Purchase rejections
// ---------------------------------------------------------------------------

/// Why a purchase or placement was silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DropReason {
    /// The requested coordinate was the sentinel.
    InvalidLocation,
    /// Another tile already stands at the coordinate.
    Occupied,
    /// The coordinate lies inside another claim's buffer zone.
    InBufferZone,
    /// No free tile borders the claim.
    NoAdjacentTile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_from_cloud_count() {
        assert_eq!(WeatherKind::from_cloud_count(0), None);
        assert_eq!(WeatherKind::from_cloud_count(1), Some(WeatherKind::Cloud));
        assert_eq!(WeatherKind::from_cloud_count(2), Some(WeatherKind::Storm));
        assert_eq!(WeatherKind::from_cloud_count(7), Some(WeatherKind::HellRain));
    }

    #[test]
    fn only_buy_actions_purchase() {
        assert_eq!(BotAction::BuyMiner.purchase_kind(), Some(EquipmentKind::Miner));
        assert_eq!(BotAction::BuyPanel.purchase_kind(), Some(EquipmentKind::Panel));
        assert_eq!(BotAction::Save.purchase_kind(), None);
        assert_eq!(BotAction::CreateContract.purchase_kind(), None);
    }

    #[test]
    fn enums_serialize_snake_case() {
        let json = serde_json::to_string(&BotAction::CreateContract).ok();
        assert_eq!(json.as_deref(), Some("\"create_contract\""));
        let json = serde_json::to_string(&WeatherKind::HellRain).ok();
        assert_eq!(json.as_deref(), Some("\"hell_rain\""));
    }
}
