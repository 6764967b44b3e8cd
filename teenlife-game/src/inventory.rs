//! Owned items and their use rules.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::data::ItemDef;
use crate::error::ValidationError;
use crate::stats::{StatBoard, StatDelta, StatId};

/// Item counts keyed by item id, plus the durables already used today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Inventory {
    items: BTreeMap<String, u32>,
    #[serde(default)]
    used_today: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUse {
    pub id: String,
    pub consumed: bool,
    pub remaining: u32,
    pub deltas: Vec<StatDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSale {
    pub price: i32,
    pub remaining: u32,
}

impl Inventory {
    #[must_use]
    pub fn count(&self, id: &str) -> u32 {
        self.items.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.count(id) > 0
    }

    pub fn add(&mut self, id: &str, quantity: u32) -> u32 {
        let count = self.items.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(quantity);
        *count
    }

    /// Remove one unit; empty entries are dropped. Returns `false` when the
    /// item is not owned.
    pub fn remove_one(&mut self, id: &str) -> bool {
        let Some(count) = self.items.get_mut(id) else {
            return false;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.items.remove(id);
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(id, count)| (id.as_str(), *count))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn used_today(&self, id: &str) -> bool {
        self.used_today.contains(id)
    }

    /// Durables become usable again on a new day.
    pub fn reset_day(&mut self) {
        self.used_today.clear();
    }

    /// Apply an item's effects. Consumables are removed; durables stay but
    /// only work once per day.
    ///
    /// # Errors
    ///
    /// Returns `item_not_owned` or `item_used_today`.
    pub fn use_item(
        &mut self,
        def: &ItemDef,
        stats: &mut StatBoard,
    ) -> Result<ItemUse, ValidationError> {
        if !self.has(&def.id) {
            return Err(ValidationError::ItemNotOwned { id: def.id.clone() });
        }
        if !def.consumable && self.used_today(&def.id) {
            return Err(ValidationError::ItemUsedToday { id: def.id.clone() });
        }
        let deltas = def.effects.apply(stats, None);
        if def.consumable {
            self.remove_one(&def.id);
        } else {
            self.used_today.insert(def.id.clone());
        }
        Ok(ItemUse {
            id: def.id.clone(),
            consumed: def.consumable,
            remaining: self.count(&def.id),
            deltas,
        })
    }

    /// Sell one unit back for half its value, rounded down.
    ///
    /// # Errors
    ///
    /// Returns `item_not_owned` when none are held.
    pub fn sell(
        &mut self,
        def: &ItemDef,
        stats: &mut StatBoard,
    ) -> Result<ItemSale, ValidationError> {
        if !self.remove_one(&def.id) {
            return Err(ValidationError::ItemNotOwned { id: def.id.clone() });
        }
        let price = def.value.max(0) / 2;
        stats.modify(StatId::Money, price);
        Ok(ItemSale {
            price,
            remaining: self.count(&def.id),
        })
    }
}
