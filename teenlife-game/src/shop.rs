//! Money-for-stats shop.
use serde::{Deserialize, Serialize};

use crate::data::{CatalogData, ShopItem};
use crate::error::ValidationError;
use crate::inventory::Inventory;
use crate::stats::{StatBoard, StatDelta, StatId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub name: String,
    pub price: i32,
    pub deltas: Vec<StatDelta>,
    /// Inventory item added by the purchase.
    pub granted: Option<String>,
}

/// Whether the player can afford `entry` right now.
#[must_use]
pub fn can_afford(entry: &ShopItem, stats: &StatBoard) -> bool {
    stats.money >= entry.price
}

/// Buy `entry`. Costs money, never actions.
///
/// # Errors
///
/// Returns `grounded` while grounded and `insufficient_funds` when money is
/// below the price; nothing is mutated in either case.
pub fn buy(
    entry: &ShopItem,
    catalog: &CatalogData,
    grounded: bool,
    stats: &mut StatBoard,
    inventory: &mut Inventory,
) -> Result<Purchase, ValidationError> {
    if grounded {
        return Err(ValidationError::Grounded {
            id: entry.id.clone(),
        });
    }
    if !can_afford(entry, stats) {
        return Err(ValidationError::InsufficientFunds {
            price: entry.price,
            money: stats.money,
        });
    }

    stats.modify(StatId::Money, -entry.price);
    let deltas = entry.effects.apply(stats, None);
    let granted = entry
        .grants_item
        .as_ref()
        .filter(|item_id| catalog.item(item_id).is_some())
        .map(|item_id| {
            inventory.add(item_id, 1);
            item_id.clone()
        });
    log::debug!("bought '{}' for ${}", entry.id, entry.price);

    Ok(Purchase {
        id: entry.id.clone(),
        name: entry.name.clone(),
        price: entry.price,
        deltas,
        granted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> &'static ShopItem {
        CatalogData::default_catalog().shop_item(id).unwrap()
    }

    #[test]
    fn purchase_deducts_money_and_grants_items() {
        let catalog = CatalogData::default_catalog();
        let mut stats = StatBoard::default();
        stats.money = 100;
        stats.happiness = 50;
        let mut inventory = Inventory::default();
        let purchase =
            buy(entry("video_game"), catalog, false, &mut stats, &mut inventory).unwrap();
        assert_eq!(stats.money, 40);
        assert_eq!(stats.happiness, 65);
        assert_eq!(purchase.granted.as_deref(), Some("video_game"));
        assert_eq!(inventory.count("video_game"), 1);

        buy(entry("snacks"), catalog, false, &mut stats, &mut inventory).unwrap();
        assert_eq!(stats.money, 35);
        assert_eq!(inventory.iter().count(), 1, "snacks are eaten on the spot");
    }

    #[test]
    fn insufficient_funds_mutates_nothing() {
        let catalog = CatalogData::default_catalog();
        let mut stats = StatBoard::default();
        stats.money = 15;
        let before = stats.clone();
        let mut inventory = Inventory::default();
        let err = buy(entry("video_game"), catalog, false, &mut stats, &mut inventory).unwrap_err();
        assert_eq!(err.code(), "insufficient_funds");
        assert_eq!(stats, before);
        assert!(inventory.is_empty());
    }

    #[test]
    fn shopping_is_blocked_while_grounded() {
        let catalog = CatalogData::default_catalog();
        let mut stats = StatBoard::default();
        stats.money = 500;
        let mut inventory = Inventory::default();
        let err = buy(entry("book"), catalog, true, &mut stats, &mut inventory).unwrap_err();
        assert_eq!(err.code(), "grounded");
        assert_eq!(stats.money, 500);
    }
}
