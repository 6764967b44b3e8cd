//! Static catalog definitions: activities, events, shop entries and items.
//!
//! Catalogs are embedded JSON assets parsed once per process and validated at
//! load time, so effect maps only ever reference known stats.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::clock::Period;
use crate::education::{AssignmentEffort, SubjectId};
use crate::stats::{StatBoard, StatDelta, StatId};

const DEFAULT_ACTIVITY_DATA: &str = include_str!("../assets/data/activities.json");
const DEFAULT_EVENT_DATA: &str = include_str!("../assets/data/events.json");
const DEFAULT_SHOP_DATA: &str = include_str!("../assets/data/shop.json");
const DEFAULT_ITEM_DATA: &str = include_str!("../assets/data/items.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse {asset} catalog: {source}")]
    Parse {
        asset: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },
    #[error("event '{id}' needs at least two choices (found {found})")]
    TooFewChoices { id: String, found: usize },
    #[error("{kind} '{id}' is missing text")]
    MissingText { kind: &'static str, id: String },
    #[error("event '{id}' trigger chance {chance} is outside [0, 1]")]
    InvalidChance { id: String, chance: f64 },
    #[error("shop entry '{shop_id}' grants unknown item '{item_id}'")]
    UnknownItem { shop_id: String, item_id: String },
    #[error("shop entry '{id}' has negative price {price}")]
    NegativePrice { id: String, price: i32 },
}

/// Signed stat deltas keyed by the closed stat enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Effects(BTreeMap<StatId, i32>);

impl Effects {
    #[must_use]
    pub fn get(&self, stat: StatId) -> i32 {
        self.0.get(&stat).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatId, i32)> + '_ {
        self.0.iter().map(|(stat, delta)| (*stat, *delta))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|delta| *delta == 0)
    }

    /// Apply every delta, optionally skipping one stat.
    pub fn apply(&self, board: &mut StatBoard, skip: Option<StatId>) -> Vec<StatDelta> {
        self.iter()
            .filter(|(stat, delta)| *delta != 0 && Some(*stat) != skip)
            .map(|(stat, delta)| StatDelta {
                stat,
                requested: delta,
                value: board.modify(stat, delta),
            })
            .collect()
    }
}

impl FromIterator<(StatId, i32)> for Effects {
    fn from_iter<T: IntoIterator<Item = (StatId, i32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Effects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (stat, delta) in self.iter().filter(|(_, delta)| *delta != 0) {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{delta:+} {stat}")?;
        }
        Ok(())
    }
}

/// Stat floors a player must meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Requirements(BTreeMap<StatId, i32>);

impl Requirements {
    /// First stat whose floor is not met, if any.
    #[must_use]
    pub fn first_unmet(&self, board: &StatBoard) -> Option<(StatId, i32)> {
        self.0
            .iter()
            .find(|(stat, floor)| board.get(**stat) < **floor)
            .map(|(stat, floor)| (*stat, *floor))
    }

    #[must_use]
    pub fn is_met(&self, board: &StatBoard) -> bool {
        self.first_unmet(board).is_none()
    }
}

impl FromIterator<(StatId, i32)> for Requirements {
    fn from_iter<T: IntoIterator<Item = (StatId, i32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Special handling attached to an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    #[default]
    Standard,
    /// Forwards the intelligence delta into a study session.
    Study(SubjectId),
    /// Satisfies the grounded chores requirement.
    Chore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: u8,
    #[serde(default)]
    pub effects: Effects,
    #[serde(default)]
    pub relationship_effects: BTreeMap<String, i32>,
    /// Periods the activity is offered in; empty means every period.
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub weekend_only: bool,
    #[serde(default)]
    pub min_age: u8,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub kind: ActivityKind,
    /// Study and chore activities are always allowed while grounded.
    #[serde(default)]
    pub allowed_while_grounded: bool,
}

impl ActivityDef {
    #[must_use]
    pub fn offered_in(&self, period: Period) -> bool {
        self.periods.is_empty() || self.periods.contains(&period)
    }

    #[must_use]
    pub const fn blocked_when_grounded(&self) -> bool {
        !self.allowed_while_grounded
            && !matches!(self.kind, ActivityKind::Study(_) | ActivityKind::Chore)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    School,
    Social,
    Family,
    Personal,
    Random,
}

impl EventCategory {
    pub const ALL: &'static [Self] = &[
        Self::School,
        Self::Social,
        Self::Family,
        Self::Personal,
        Self::Random,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Social => "social",
            Self::Family => "family",
            Self::Personal => "personal",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Academic consequence attached to an event choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AcademicHook {
    TakeExam,
    SkipExam,
    Assignment { effort: AssignmentEffort },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub effects: Effects,
    #[serde(default)]
    pub result_text: String,
    #[serde(default)]
    pub relationship_effects: BTreeMap<String, i32>,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub cost: u8,
    #[serde(default)]
    pub academic: Option<AcademicHook>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: EventCategory,
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Per-period trigger probability for the independent-roll strategy.
    #[serde(default = "default_trigger_chance")]
    pub trigger_chance: f64,
    /// Stat floors gating whether the event may be selected at all.
    #[serde(default)]
    pub requirements: Requirements,
    /// Only ever queued by stat triggers, never by random draws.
    #[serde(default)]
    pub forced_only: bool,
}

const fn default_trigger_chance() -> f64 {
    0.05
}

impl EventDef {
    /// Whether any choice needs a subject bound at queue time.
    #[must_use]
    pub fn needs_subject(&self) -> bool {
        self.choices.iter().any(|choice| choice.academic.is_some())
    }

    /// Structural checks shared by catalog loading and generated events.
    ///
    /// # Errors
    ///
    /// Returns an error when the title or any choice text is empty, fewer
    /// than two choices exist, or the trigger chance is outside `[0, 1]`.
    pub fn validate_shape(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::MissingText {
                kind: "event",
                id: self.id.clone(),
            });
        }
        if self.choices.len() < 2 {
            return Err(CatalogError::TooFewChoices {
                id: self.id.clone(),
                found: self.choices.len(),
            });
        }
        if self
            .choices
            .iter()
            .any(|choice| choice.text.trim().is_empty() || choice.result_text.trim().is_empty())
        {
            return Err(CatalogError::MissingText {
                kind: "event choice",
                id: self.id.clone(),
            });
        }
        if !(0.0..=1.0).contains(&self.trigger_chance) {
            return Err(CatalogError::InvalidChance {
                id: self.id.clone(),
                chance: self.trigger_chance,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i32,
    #[serde(default)]
    pub effects: Effects,
    /// Inventory item granted on purchase.
    #[serde(default)]
    pub grants_item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Effects,
    /// Consumables disappear on use; durables stay but work once per day.
    #[serde(default)]
    pub consumable: bool,
    /// Resale baseline; items sell back for half.
    #[serde(default)]
    pub value: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ActivityFile {
    activities: Vec<ActivityDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EventFile {
    events: Vec<EventDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ShopFile {
    items: Vec<ShopItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ItemFile {
    items: Vec<ItemDef>,
}

/// Immutable process-wide catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogData {
    pub activities: Vec<ActivityDef>,
    pub events: Vec<EventDef>,
    pub shop: Vec<ShopItem>,
    pub items: Vec<ItemDef>,
}

impl CatalogData {
    /// Empty catalog (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate the four catalog documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any document fails to parse or the combined
    /// catalog fails validation.
    pub fn from_json(
        activities: &str,
        events: &str,
        shop: &str,
        items: &str,
    ) -> Result<Self, CatalogError> {
        let activities: ActivityFile = parse("activities", activities)?;
        let events: EventFile = parse("events", events)?;
        let shop: ShopFile = parse("shop", shop)?;
        let items: ItemFile = parse("items", items)?;
        let catalog = Self {
            activities: activities.activities,
            events: events.events,
            shop: shop.items,
            items: items.items,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse the embedded assets.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded assets are malformed.
    pub fn load_from_static() -> Result<Self, CatalogError> {
        Self::from_json(
            DEFAULT_ACTIVITY_DATA,
            DEFAULT_EVENT_DATA,
            DEFAULT_SHOP_DATA,
            DEFAULT_ITEM_DATA,
        )
    }

    /// Shared embedded catalog, parsed on first use.
    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<CatalogData> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Self::load_from_static().unwrap_or_else(|err| {
                log::error!("embedded catalog rejected: {err}");
                Self::empty()
            })
        })
    }

    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        check_unique("activity", self.activities.iter().map(|a| a.id.as_str()))?;
        check_unique("event", self.events.iter().map(|e| e.id.as_str()))?;
        check_unique("shop", self.shop.iter().map(|s| s.id.as_str()))?;
        check_unique("item", self.items.iter().map(|i| i.id.as_str()))?;

        for activity in &self.activities {
            if activity.name.trim().is_empty() {
                return Err(CatalogError::MissingText {
                    kind: "activity",
                    id: activity.id.clone(),
                });
            }
        }
        for event in &self.events {
            event.validate_shape()?;
        }
        for entry in &self.shop {
            if entry.price < 0 {
                return Err(CatalogError::NegativePrice {
                    id: entry.id.clone(),
                    price: entry.price,
                });
            }
            if let Some(item_id) = &entry.grants_item
                && self.item(item_id).is_none()
            {
                return Err(CatalogError::UnknownItem {
                    shop_id: entry.id.clone(),
                    item_id: item_id.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn activity(&self, id: &str) -> Option<&ActivityDef> {
        self.activities.iter().find(|activity| activity.id == id)
    }

    #[must_use]
    pub fn event(&self, id: &str) -> Option<&EventDef> {
        self.events.iter().find(|event| event.id == id)
    }

    #[must_use]
    pub fn shop_item(&self, id: &str) -> Option<&ShopItem> {
        self.shop.iter().find(|entry| entry.id == id)
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|item| item.id == id)
    }
}

fn parse<T: serde::de::DeserializeOwned>(
    asset: &'static str,
    json: &str,
) -> Result<T, CatalogError> {
    serde_json::from_str(json).map_err(|source| CatalogError::Parse { asset, source })
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
