//! Bounded stat register set.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{STAT_MAX, STAT_MIN};

/// Closed set of stat identifiers referenced by catalogs and effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatId {
    Health,
    Happiness,
    Intelligence,
    #[serde(alias = "popularity")]
    Social,
    Fitness,
    Energy,
    Money,
}

impl StatId {
    pub const ALL: &'static [Self] = &[
        Self::Health,
        Self::Happiness,
        Self::Intelligence,
        Self::Social,
        Self::Fitness,
        Self::Energy,
        Self::Money,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Happiness => "happiness",
            Self::Intelligence => "intelligence",
            Self::Social => "social",
            Self::Fitness => "fitness",
            Self::Energy => "energy",
            Self::Money => "money",
        }
    }

    /// Money has no upper bound; every other stat lives in `0..=100`.
    #[must_use]
    pub const fn is_bounded(self) -> bool {
        !matches!(self, Self::Money)
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "health" => Ok(Self::Health),
            "happiness" => Ok(Self::Happiness),
            "intelligence" => Ok(Self::Intelligence),
            "social" | "popularity" => Ok(Self::Social),
            "fitness" => Ok(Self::Fitness),
            "energy" => Ok(Self::Energy),
            "money" => Ok(Self::Money),
            _ => Err(()),
        }
    }
}

/// Applied change to a single stat, reported back to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDelta {
    pub stat: StatId,
    /// Requested delta before clamping.
    pub requested: i32,
    /// Value after clamping.
    pub value: i32,
}

impl StatDelta {
    /// Delta that actually landed once clamping was applied.
    #[must_use]
    pub const fn applied(&self, before: i32) -> i32 {
        self.value - before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBoard {
    pub health: i32,
    pub happiness: i32,
    pub intelligence: i32,
    pub social: i32,
    pub fitness: i32,
    pub energy: i32,
    pub money: i32,
}

impl Default for StatBoard {
    fn default() -> Self {
        Self {
            health: 100,
            happiness: 100,
            intelligence: 50,
            social: 50,
            fitness: 50,
            energy: 100,
            money: 0,
        }
    }
}

impl StatBoard {
    #[must_use]
    pub const fn get(&self, stat: StatId) -> i32 {
        match stat {
            StatId::Health => self.health,
            StatId::Happiness => self.happiness,
            StatId::Intelligence => self.intelligence,
            StatId::Social => self.social,
            StatId::Fitness => self.fitness,
            StatId::Energy => self.energy,
            StatId::Money => self.money,
        }
    }

    const fn slot_mut(&mut self, stat: StatId) -> &mut i32 {
        match stat {
            StatId::Health => &mut self.health,
            StatId::Happiness => &mut self.happiness,
            StatId::Intelligence => &mut self.intelligence,
            StatId::Social => &mut self.social,
            StatId::Fitness => &mut self.fitness,
            StatId::Energy => &mut self.energy,
            StatId::Money => &mut self.money,
        }
    }

    /// Apply `delta` to `stat` and clamp. Returns the new value.
    pub fn modify(&mut self, stat: StatId, delta: i32) -> i32 {
        let slot = self.slot_mut(stat);
        let raw = slot.saturating_add(delta);
        *slot = if stat.is_bounded() {
            raw.clamp(STAT_MIN, STAT_MAX)
        } else {
            raw.max(STAT_MIN)
        };
        *slot
    }

    /// Overwrite a stat, clamping into its legal range.
    pub fn set(&mut self, stat: StatId, value: i32) -> i32 {
        let current = self.get(stat);
        self.modify(stat, value.saturating_sub(current))
    }

    /// Modify a stat referenced by name. Unknown names are ignored and yield `None`.
    pub fn modify_named(&mut self, stat: &str, delta: i32) -> Option<i32> {
        if let Ok(id) = stat.parse::<StatId>() {
            Some(self.modify(id, delta))
        } else {
            log::warn!("ignoring modification of unknown stat '{stat}'");
            None
        }
    }

    /// Read a stat referenced by name, defaulting to 0 for unknown names.
    #[must_use]
    pub fn get_named(&self, stat: &str) -> i32 {
        stat.parse::<StatId>().map_or(0, |id| self.get(id))
    }

    /// Force every stat back into its legal range.
    pub fn clamp(&mut self) {
        for &stat in StatId::ALL {
            self.modify(stat, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_stats_clamp_both_directions() {
        let mut board = StatBoard::default();
        assert_eq!(board.modify(StatId::Health, 500), 100);
        assert_eq!(board.modify(StatId::Happiness, -1_000), 0);
        assert_eq!(board.modify(StatId::Fitness, i32::MAX), 100);
        assert_eq!(board.modify(StatId::Energy, i32::MIN), 0);
    }

    #[test]
    fn money_is_floored_but_unbounded_above() {
        let mut board = StatBoard::default();
        assert_eq!(board.modify(StatId::Money, -25), 0);
        assert_eq!(board.modify(StatId::Money, 250), 250);
        assert_eq!(board.modify(StatId::Money, 250), 500);
    }

    #[test]
    fn unknown_stat_names_are_ignored() {
        let mut board = StatBoard::default();
        let before = board.clone();
        assert_eq!(board.modify_named("charisma", 10), None);
        assert_eq!(board.get_named("charisma"), 0);
        assert_eq!(board, before);
        assert_eq!(board.modify_named("popularity", 5), Some(55));
    }

    #[test]
    fn set_clamps_into_range() {
        let mut board = StatBoard::default();
        assert_eq!(board.set(StatId::Intelligence, 140), 100);
        assert_eq!(board.set(StatId::Money, -3), 0);
    }

    #[test]
    fn every_stat_stays_in_range_for_extreme_deltas() {
        let mut board = StatBoard::default();
        for &stat in StatId::ALL {
            for delta in [i32::MIN, -101, -1, 0, 1, 101, i32::MAX] {
                let value = board.modify(stat, delta);
                assert!(value >= 0, "{stat} fell below zero");
                if stat.is_bounded() {
                    assert!(value <= 100, "{stat} exceeded 100");
                }
            }
        }
    }
}
