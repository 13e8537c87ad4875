//! The equipment catalog: what can be bought, and at what price.
//!
//! A [`CatalogItem`] describes a purchasable model. The catalog also names
//! one default miner and one default panel; bots and claim initialization
//! always buy the defaults.

use plotcoin_types::{ClaimId, EquipmentKind, GridCoord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::equipment::Equipment;
use crate::error::EconomyError;

/// Catalog id of the stock miner.
pub const ANTMINER_S9: &str = "antminer-s9";

/// Catalog id of the stock panel.
pub const HIA_375: &str = "hia-375";

/// One purchasable equipment model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique catalog id.
    pub id: String,
    /// Miner or panel.
    pub kind: EquipmentKind,
    /// Price in USD.
    pub price: Decimal,
    /// Rated hashing power in TH/s (miners only).
    #[serde(default)]
    pub hash_power: u64,
    /// Energy drawn per hour in Wh (miners only).
    #[serde(default)]
    pub energy_usage: u64,
    /// Energy produced per hour in Wh (panels only).
    #[serde(default)]
    pub output: u64,
}

impl CatalogItem {
    /// Build a fresh instance of this model for `claim` at `coord`.
    pub fn build(&self, claim: ClaimId, coord: GridCoord) -> Equipment {
        match self.kind {
            EquipmentKind::Miner => Equipment::miner(
                claim,
                self.id.as_str(),
                self.price,
                coord,
                self.hash_power,
                self.energy_usage,
            ),
            EquipmentKind::Panel => {
                Equipment::panel(claim, self.id.as_str(), self.price, coord, self.output)
            }
        }
    }
}

/// All purchasable models plus the two defaults.
#[derive(Debug, Clone)]
pub struct EquipmentCatalog {
    items: Vec<CatalogItem>,
    default_miner: CatalogItem,
    default_panel: CatalogItem,
}

impl EquipmentCatalog {
    /// Build a catalog and resolve its defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownEquipment`] if a default id is not in
    /// `items`, or [`EconomyError::CatalogKindMismatch`] if it names an item
    /// of the wrong kind.
    pub fn new(
        items: Vec<CatalogItem>,
        default_miner: &str,
        default_panel: &str,
    ) -> Result<Self, EconomyError> {
        let default_miner = resolve(&items, default_miner, EquipmentKind::Miner)?;
        let default_panel = resolve(&items, default_panel, EquipmentKind::Panel)?;
        Ok(Self {
            items,
            default_miner,
            default_panel,
        })
    }

    /// The two stock models.
    pub fn standard_items() -> Vec<CatalogItem> {
        vec![stock_miner(), stock_panel()]
    }

    /// Every item, in declaration order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Look up an item by id.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownEquipment`] on a miss.
    pub fn lookup(&self, id: &str) -> Result<&CatalogItem, EconomyError> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| EconomyError::UnknownEquipment(id.to_owned()))
    }

    /// The default item for a kind.
    pub const fn default_for(&self, kind: EquipmentKind) -> &CatalogItem {
        match kind {
            EquipmentKind::Miner => &self.default_miner,
            EquipmentKind::Panel => &self.default_panel,
        }
    }
}

impl Default for EquipmentCatalog {
    fn default() -> Self {
        Self {
            items: Self::standard_items(),
            default_miner: stock_miner(),
            default_panel: stock_panel(),
        }
    }
}

fn stock_miner() -> CatalogItem {
    CatalogItem {
        id: ANTMINER_S9.to_owned(),
        kind: EquipmentKind::Miner,
        price: Decimal::new(2000, 0),
        hash_power: 14,
        energy_usage: 1372,
        output: 0,
    }
}

fn stock_panel() -> CatalogItem {
    CatalogItem {
        id: HIA_375.to_owned(),
        kind: EquipmentKind::Panel,
        price: Decimal::new(250, 0),
        hash_power: 0,
        energy_usage: 0,
        output: 375,
    }
}

/// Find `id` in `items` and check it is of the `expected` kind.
fn resolve(
    items: &[CatalogItem],
    id: &str,
    expected: EquipmentKind,
) -> Result<CatalogItem, EconomyError> {
    let item = items
        .iter()
        .find(|item| item.id == id)
        .ok_or_else(|| EconomyError::UnknownEquipment(id.to_owned()))?;
    if item.kind != expected {
        return Err(EconomyError::CatalogKindMismatch {
            id: id.to_owned(),
            expected,
            found: item.kind,
        });
    }
    Ok(item.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn default_catalog_has_stock_models() {
        let catalog = EquipmentCatalog::default();
        let miner = catalog.default_for(EquipmentKind::Miner);
        assert_eq!(miner.id, ANTMINER_S9);
        assert_eq!(miner.hash_power, 14);
        assert_eq!(miner.energy_usage, 1372);
        assert_eq!(miner.price, dec!(2000));
        let panel = catalog.default_for(EquipmentKind::Panel);
        assert_eq!(panel.id, HIA_375);
        assert_eq!(panel.output, 375);
        assert_eq!(panel.price, dec!(250));
    }

    #[test]
    fn lookup_miss_is_unknown_equipment() {
        let catalog = EquipmentCatalog::default();
        assert!(catalog.lookup(HIA_375).is_ok());
        let err = catalog.lookup("flux-capacitor").unwrap_err();
        assert!(matches!(err, EconomyError::UnknownEquipment(id) if id == "flux-capacitor"));
    }

    #[test]
    fn defaults_must_exist_and_match_kind() {
        let items = EquipmentCatalog::standard_items();
        assert!(EquipmentCatalog::new(items.clone(), ANTMINER_S9, HIA_375).is_ok());
        assert!(matches!(
            EquipmentCatalog::new(items.clone(), "nope", HIA_375),
            Err(EconomyError::UnknownEquipment(_))
        ));
        assert!(matches!(
            EquipmentCatalog::new(items, HIA_375, HIA_375),
            Err(EconomyError::CatalogKindMismatch {
                expected: EquipmentKind::Miner,
                ..
            })
        ));
    }

    #[test]
    fn build_produces_matching_equipment() {
        let catalog = EquipmentCatalog::default();
        let claim = ClaimId::new();
        let coord = GridCoord::new(2, 2);
        let miner = catalog.default_for(EquipmentKind::Miner).build(claim, coord);
        assert_eq!(miner.kind(), EquipmentKind::Miner);
        assert_eq!(miner.claim(), claim);
        assert_eq!(miner.coord(), coord);
        assert_eq!(miner.catalog_id(), ANTMINER_S9);
        assert_eq!(miner.as_miner().unwrap().rated_hash_power, 14);
    }

    #[test]
    fn items_deserialize_from_yaml_like_json() {
        let json = r#"{"id":"tiny","kind":"panel","price":"10.5","output":40}"#;
        let item: CatalogItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, EquipmentKind::Panel);
        assert_eq!(item.price, dec!(10.5));
        assert_eq!(item.hash_power, 0);
    }
}
