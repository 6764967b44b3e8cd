//! Designer-tunable simulation configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{ClockStart, days_in_month};
use crate::constants::CATEGORY_WEIGHT_TOLERANCE;
use crate::data::EventCategory;
use crate::education::{TierBasis, TierPolicy, TierTable};
use crate::school::SkipOdds;
use crate::stats::{StatBoard, StatId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("start date {year}-{month:02}-{day:02} is not a calendar date")]
    InvalidStartDate { year: u16, month: u8, day: u8 },
    #[error(
        "skip odds must sum to 1 (safe {safe:.2}, detention {detention:.2}, grounded {grounded:.2})"
    )]
    SkipOdds {
        safe: f64,
        detention: f64,
        grounded: f64,
    },
    #[error("event category weights must be non-negative and sum to 1 (got {total:.4})")]
    CategoryWeights { total: f64 },
    #[error("tier table must not grant fewer actions to a better tier")]
    TierTableOrder,
}

/// How random events are selected each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventStrategy {
    /// One gated roll, then a weighted category draw and a uniform event pick.
    #[default]
    CategoryDraw,
    /// Every eligible event rolls its own trigger chance independently.
    PeriodRolls,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub category: EventCategory,
    pub weight: f64,
    #[serde(default)]
    pub requires_school_day: bool,
}

/// Stat floor that unconditionally queues a coping event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedTrigger {
    pub stat: StatId,
    /// Fires while the stat is strictly below this value.
    pub below: i32,
    pub event_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub start: ClockStart,
    #[serde(default = "SimConfig::default_max_age")]
    pub max_age: u8,
    #[serde(default)]
    pub initial_stats: StatBoard,
    #[serde(default = "SimConfig::default_starting_grade")]
    pub starting_subject_grade: f64,
    #[serde(default = "SimConfig::default_free_day_actions")]
    pub free_day_actions: u8,
    #[serde(default)]
    pub tier_basis: TierBasis,
    #[serde(default)]
    pub tier_table: TierTable,
    #[serde(default)]
    pub skip_odds: SkipOdds,
    #[serde(default = "SimConfig::default_grounded_days")]
    pub grounded_days: u8,
    #[serde(default = "SimConfig::default_allowance_weekday")]
    pub allowance_weekday: u8,
    #[serde(default)]
    pub event_strategy: EventStrategy,
    #[serde(default = "SimConfig::default_category_event_chance")]
    pub category_event_chance: f64,
    #[serde(default = "SimConfig::default_category_weights")]
    pub category_weights: Vec<CategoryWeight>,
    #[serde(default = "SimConfig::default_forced_triggers")]
    pub forced_triggers: Vec<ForcedTrigger>,
    #[serde(default = "SimConfig::default_log_capacity")]
    pub log_capacity: usize,
}

impl SimConfig {
    const fn default_max_age() -> u8 {
        18
    }

    const fn default_starting_grade() -> f64 {
        70.0
    }

    const fn default_free_day_actions() -> u8 {
        8
    }

    const fn default_grounded_days() -> u8 {
        7
    }

    const fn default_allowance_weekday() -> u8 {
        7
    }

    const fn default_category_event_chance() -> f64 {
        0.35
    }

    const fn default_log_capacity() -> usize {
        50
    }

    fn default_category_weights() -> Vec<CategoryWeight> {
        vec![
            CategoryWeight {
                category: EventCategory::School,
                weight: 0.30,
                requires_school_day: true,
            },
            CategoryWeight {
                category: EventCategory::Social,
                weight: 0.25,
                requires_school_day: false,
            },
            CategoryWeight {
                category: EventCategory::Family,
                weight: 0.15,
                requires_school_day: false,
            },
            CategoryWeight {
                category: EventCategory::Personal,
                weight: 0.20,
                requires_school_day: false,
            },
            CategoryWeight {
                category: EventCategory::Random,
                weight: 0.10,
                requires_school_day: false,
            },
        ]
    }

    fn default_forced_triggers() -> Vec<ForcedTrigger> {
        vec![
            ForcedTrigger {
                stat: StatId::Happiness,
                below: 25,
                event_id: "personal_stress".to_string(),
            },
            ForcedTrigger {
                stat: StatId::Energy,
                below: 15,
                event_id: "exhausted".to_string(),
            },
        ]
    }

    #[must_use]
    pub const fn tier_policy(&self) -> TierPolicy {
        TierPolicy {
            basis: self.tier_basis,
            table: self.tier_table,
        }
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_start()?;
        self.validate_skip_odds()?;
        self.validate_events()?;
        range("free_day_actions", f64::from(self.free_day_actions), 1.0, 24.0)?;
        range("grounded_days", f64::from(self.grounded_days), 1.0, 60.0)?;
        range("allowance_weekday", f64::from(self.allowance_weekday), 1.0, 7.0)?;
        range("starting_subject_grade", self.starting_subject_grade, 0.0, 100.0)?;
        range("log_capacity", crate::numbers::usize_to_f64(self.log_capacity), 1.0, 1_000.0)?;

        let table = &self.tier_table;
        let ordered = [table.a, table.b, table.c, table.d, table.f]
            .windows(2)
            .all(|pair| pair[0].actions >= pair[1].actions);
        if !ordered {
            return Err(ConfigError::TierTableOrder);
        }
        Ok(())
    }

    fn validate_start(&self) -> Result<(), ConfigError> {
        let start = &self.start;
        if !(1..=12).contains(&start.month)
            || start.day == 0
            || start.day > days_in_month(start.month, start.year)
        {
            return Err(ConfigError::InvalidStartDate {
                year: start.year,
                month: start.month,
                day: start.day,
            });
        }
        range("start.weekday", f64::from(start.weekday), 1.0, 7.0)?;
        range(
            "max_age",
            f64::from(self.max_age),
            f64::from(start.age),
            f64::from(u8::MAX - 1),
        )?;
        Ok(())
    }

    fn validate_skip_odds(&self) -> Result<(), ConfigError> {
        let odds = &self.skip_odds;
        let parts = [odds.safe, odds.detention, odds.grounded];
        if parts.iter().any(|p| !(0.0..=1.0).contains(p))
            || (odds.total() - 1.0).abs() > CATEGORY_WEIGHT_TOLERANCE
        {
            return Err(ConfigError::SkipOdds {
                safe: odds.safe,
                detention: odds.detention,
                grounded: odds.grounded,
            });
        }
        Ok(())
    }

    fn validate_events(&self) -> Result<(), ConfigError> {
        range("category_event_chance", self.category_event_chance, 0.0, 1.0)?;
        let total: f64 = self.category_weights.iter().map(|w| w.weight).sum();
        if self.category_weights.iter().any(|w| w.weight < 0.0)
            || (total - 1.0).abs() > CATEGORY_WEIGHT_TOLERANCE
        {
            return Err(ConfigError::CategoryWeights { total });
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start: ClockStart::default(),
            max_age: Self::default_max_age(),
            initial_stats: StatBoard::default(),
            starting_subject_grade: Self::default_starting_grade(),
            free_day_actions: Self::default_free_day_actions(),
            tier_basis: TierBasis::default(),
            tier_table: TierTable::default(),
            skip_odds: SkipOdds::default(),
            grounded_days: Self::default_grounded_days(),
            allowance_weekday: Self::default_allowance_weekday(),
            event_strategy: EventStrategy::default(),
            category_event_chance: Self::default_category_event_chance(),
            category_weights: Self::default_category_weights(),
            forced_triggers: Self::default_forced_triggers(),
            log_capacity: Self::default_log_capacity(),
        }
    }
}

fn range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}
