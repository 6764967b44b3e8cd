//! Full simulation snapshot owned by the controller and persisted by saves.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::actions::ActionEconomy;
use crate::clock::{Clock, Period};
use crate::config::SimConfig;
use crate::education::EducationTracker;
use crate::endings::Ending;
use crate::events::EventQueue;
use crate::inventory::Inventory;
use crate::relationships::RelationshipLedger;
use crate::school::SchoolAttendanceResolver;
use crate::stats::StatBoard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            "other" | "nonbinary" | "non-binary" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub days_played: u32,
    pub period: Period,
    pub message: String,
}

/// Bounded activity log, newest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

impl ActivityLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, clock: &Clock, message: impl Into<String>) {
        self.entries.push_front(LogEntry {
            days_played: clock.days_played,
            period: clock.period,
            message: message.into(),
        });
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Up to `n` most recent messages, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<String> {
        self.entries
            .iter()
            .take(n)
            .map(|entry| entry.message.clone())
            .collect()
    }
}

/// Everything needed to resume a game. The catalog is static and not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub player: Player,
    pub seed: u64,
    pub stats: StatBoard,
    pub clock: Clock,
    pub education: EducationTracker,
    pub actions: ActionEconomy,
    pub school: SchoolAttendanceResolver,
    pub relationships: RelationshipLedger,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub events: EventQueue,
    #[serde(default)]
    pub log: ActivityLog,
    #[serde(default)]
    pub ending: Option<Ending>,
}

impl GameState {
    /// Fresh state for a new game.
    #[must_use]
    pub fn new(config: &SimConfig, name: &str, gender: Gender, seed: u64) -> Self {
        let clock = Clock::new(config.start, config.max_age);
        let mut school = SchoolAttendanceResolver::default();
        school.begin_day(clock.is_school_day());
        Self {
            player: Player {
                name: name.trim().to_string(),
                gender,
            },
            seed,
            stats: config.initial_stats.clone(),
            clock,
            education: EducationTracker::new(config.starting_subject_grade, config.tier_policy()),
            actions: ActionEconomy::full(config.free_day_actions),
            school,
            relationships: RelationshipLedger::with_defaults(),
            inventory: Inventory::default(),
            events: EventQueue::default(),
            log: ActivityLog::with_capacity(config.log_capacity),
            ending: None,
        }
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.ending.is_some()
    }

    /// Seed for the RNG bundle when resuming at the current point in time.
    ///
    /// Mixing in elapsed time keeps a resumed game from replaying the rolls
    /// of day one.
    #[must_use]
    pub fn resume_seed(&self) -> u64 {
        let period = u64::try_from(
            Period::ALL
                .iter()
                .position(|p| *p == self.clock.period)
                .unwrap_or(0),
        )
        .unwrap_or(0);
        let elapsed = u64::from(self.clock.days_played) * 4 + period;
        self.seed ^ elapsed.wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }
}
