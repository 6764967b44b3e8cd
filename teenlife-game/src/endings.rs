//! Terminal conditions.
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::stats::StatBoard;

/// Why a life simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// The player grew past the configured maximum age.
    AgedOut,
    /// Health reached 0.
    HealthCollapse,
    /// Happiness reached 0.
    HappinessCollapse,
}

impl Ending {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AgedOut => "aged_out",
            Self::HealthCollapse => "health_collapse",
            Self::HappinessCollapse => "happiness_collapse",
        }
    }

    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::AgedOut => "You graduated into adulthood.",
            Self::HealthCollapse => "Your health gave out.",
            Self::HappinessCollapse => "You lost all joy in life.",
        }
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check for a terminal condition. Age takes precedence over stat collapse.
#[must_use]
pub const fn detect_ending(clock: &Clock, stats: &StatBoard) -> Option<Ending> {
    if clock.is_aged_out() {
        Some(Ending::AgedOut)
    } else if stats.health <= 0 {
        Some(Ending::HealthCollapse)
    } else if stats.happiness <= 0 {
        Some(Ending::HappinessCollapse)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_teen_keeps_playing() {
        assert_eq!(detect_ending(&Clock::default(), &StatBoard::default()), None);
    }

    #[test]
    fn collapse_and_age_endings() {
        let clock = Clock::default();
        let mut stats = StatBoard::default();
        stats.happiness = 0;
        assert_eq!(detect_ending(&clock, &stats), Some(Ending::HappinessCollapse));
        stats.health = 0;
        assert_eq!(detect_ending(&clock, &stats), Some(Ending::HealthCollapse));

        let mut old = Clock::default();
        old.age = old.max_age + 1;
        assert_eq!(detect_ending(&old, &stats), Some(Ending::AgedOut));
        assert_eq!(Ending::AgedOut.to_string(), "aged_out");
    }
}
