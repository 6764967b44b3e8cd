//! NPC relationship strengths with threshold-driven reclassification.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{DEMOTE_TO_ACQUAINTANCE_AT, PROMOTE_TO_FRIEND_AT, STAT_MAX, STAT_MIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipCategory {
    Family,
    Friend,
    Romantic,
    Rival,
    Acquaintance,
}

impl RelationshipCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Friend => "friend",
            Self::Romantic => "romantic",
            Self::Rival => "rival",
            Self::Acquaintance => "acquaintance",
        }
    }
}

impl fmt::Display for RelationshipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub display_name: String,
    pub category: RelationshipCategory,
    pub strength: i32,
    pub interaction_count: u32,
}

impl Relationship {
    #[must_use]
    pub fn new(
        display_name: impl Into<String>,
        category: RelationshipCategory,
        strength: i32,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            category,
            strength: strength.clamp(STAT_MIN, STAT_MAX),
            interaction_count: 0,
        }
    }

    #[must_use]
    pub const fn status(&self) -> &'static str {
        status_label(self.strength)
    }
}

/// Human-readable label for a relationship strength.
#[must_use]
pub const fn status_label(strength: i32) -> &'static str {
    if strength >= 90 {
        "Best Friends"
    } else if strength >= 70 {
        "Close"
    } else if strength >= 50 {
        "Friendly"
    } else if strength >= 30 {
        "Acquaintance"
    } else if strength >= 10 {
        "Distant"
    } else {
        "Hostile"
    }
}

/// Result of a successful strength modification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipChange {
    pub id: String,
    pub strength: i32,
    pub reclassified: Option<RelationshipCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RelationshipLedger {
    entries: BTreeMap<String, Relationship>,
}

impl RelationshipLedger {
    /// Starting cast of a new game.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut ledger = Self::default();
        ledger.add("mom", Relationship::new("Mom", RelationshipCategory::Family, 70));
        ledger.add("dad", Relationship::new("Dad", RelationshipCategory::Family, 70));
        ledger.add(
            "bestfriend",
            Relationship::new("Best Friend", RelationshipCategory::Friend, 80),
        );
        ledger.add("crush", Relationship::new("Crush", RelationshipCategory::Romantic, 30));
        ledger.add("rival", Relationship::new("Rival", RelationshipCategory::Rival, 20));
        ledger.add(
            "study_buddy",
            Relationship::new("Study Buddy", RelationshipCategory::Acquaintance, 50),
        );
        ledger.add(
            "teammate",
            Relationship::new("Teammate", RelationshipCategory::Acquaintance, 40),
        );
        ledger
    }

    /// Explicitly register an NPC. Effects never create entries.
    pub fn add(&mut self, id: impl Into<String>, relationship: Relationship) {
        self.entries.insert(id.into(), relationship);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Strength of an NPC relationship, 0 for unknown ids.
    #[must_use]
    pub fn strength(&self, id: &str) -> i32 {
        self.entries.get(id).map_or(0, |rel| rel.strength)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relationship)> {
        self.entries.iter().map(|(id, rel)| (id.as_str(), rel))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shift an NPC's strength and reclassify if a threshold was crossed.
    /// Returns `None` for unknown ids without creating them.
    pub fn modify(&mut self, id: &str, delta: i32) -> Option<RelationshipChange> {
        let Some(rel) = self.entries.get_mut(id) else {
            log::warn!("ignoring relationship change for unknown npc '{id}'");
            return None;
        };
        rel.strength = rel.strength.saturating_add(delta).clamp(STAT_MIN, STAT_MAX);
        rel.interaction_count = rel.interaction_count.saturating_add(1);

        let reclassified = match rel.category {
            RelationshipCategory::Acquaintance if rel.strength >= PROMOTE_TO_FRIEND_AT => {
                Some(RelationshipCategory::Friend)
            }
            RelationshipCategory::Friend if rel.strength <= DEMOTE_TO_ACQUAINTANCE_AT => {
                Some(RelationshipCategory::Acquaintance)
            }
            _ => None,
        };
        if let Some(category) = reclassified {
            log::debug!("{id} reclassified {} -> {category}", rel.category);
            rel.category = category;
        }
        Some(RelationshipChange {
            id: id.to_string(),
            strength: rel.strength,
            reclassified,
        })
    }
}
