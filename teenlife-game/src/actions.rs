//! Discrete per-day action budget.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEconomy {
    pub available: u8,
    pub max: u8,
}

impl ActionEconomy {
    #[must_use]
    pub const fn full(max: u8) -> Self {
        Self {
            available: max,
            max,
        }
    }

    /// Zero-cost actions are always affordable.
    #[must_use]
    pub const fn can_afford(&self, cost: u8) -> bool {
        cost == 0 || cost <= self.available
    }

    /// Spend `cost` actions. Leaves the balance untouched and returns `false`
    /// when the budget is insufficient.
    pub const fn spend(&mut self, cost: u8) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.available -= cost;
        true
    }

    /// Refill for a new day. Attended school days use the tier-derived cap;
    /// skipped school days and weekends use the flat free-day budget.
    pub fn reset_for_day(&mut self, went_to_school: bool, tier_cap: u8, free_day_budget: u8) {
        let max = if went_to_school {
            tier_cap
        } else {
            free_day_budget
        };
        *self = Self::full(max);
    }

    /// Force both balance and ceiling to `cap` or lower.
    pub fn cap(&mut self, cap: u8) {
        self.max = self.max.min(cap);
        self.available = self.available.min(self.max);
    }

    /// Drop the remaining balance to zero until the next reset.
    pub const fn block(&mut self) {
        self.available = 0;
    }
}

impl Default for ActionEconomy {
    fn default() -> Self {
        Self::full(8)
    }
}
