//! Daily attend/skip decision and its punishment state machine.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rng::{RandomSource, RollStream};

/// Probability split for the consequences of skipping school.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkipOdds {
    pub safe: f64,
    pub detention: f64,
    pub grounded: f64,
}

impl Default for SkipOdds {
    fn default() -> Self {
        Self {
            safe: 0.50,
            detention: 0.25,
            grounded: 0.25,
        }
    }
}

impl SkipOdds {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.safe + self.detention + self.grounded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipOutcome {
    Safe,
    Detention,
    Grounded,
}

impl SkipOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Detention => "detention",
            Self::Grounded => "grounded",
        }
    }
}

impl fmt::Display for SkipOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a uniform roll onto a skip consequence.
#[must_use]
pub fn classify_skip_roll(roll: f64, odds: &SkipOdds) -> SkipOutcome {
    if roll < odds.safe {
        SkipOutcome::Safe
    } else if roll < odds.safe + odds.detention {
        SkipOutcome::Detention
    } else {
        SkipOutcome::Grounded
    }
}

/// Where today stands with respect to school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchoolDay {
    #[default]
    NoSchool,
    AwaitingDecision,
    Attended,
    Skipped,
}

/// Coarse status used for display and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchoolStatus {
    Free,
    AttendedToday,
    SkippedToday,
    Grounded,
    DetentionPending,
}

/// Signals produced when the calendar day changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchoolRollover {
    pub grounding_lifted: bool,
    pub detention_day: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SchoolAttendanceResolver {
    pub grounded: bool,
    pub grounded_days_remaining: u8,
    pub chores_done_today: bool,
    pub saturday_detention_pending: bool,
    #[serde(default)]
    pub today: SchoolDay,
    #[serde(default)]
    pub days_skipped: u32,
    #[serde(default)]
    pub days_attended: u32,
}

impl SchoolAttendanceResolver {
    #[must_use]
    pub const fn status(&self) -> SchoolStatus {
        if self.grounded {
            return SchoolStatus::Grounded;
        }
        match self.today {
            SchoolDay::Attended => SchoolStatus::AttendedToday,
            SchoolDay::Skipped => SchoolStatus::SkippedToday,
            SchoolDay::NoSchool | SchoolDay::AwaitingDecision => {
                if self.saturday_detention_pending {
                    SchoolStatus::DetentionPending
                } else {
                    SchoolStatus::Free
                }
            }
        }
    }

    #[must_use]
    pub const fn decision_pending(&self) -> bool {
        matches!(self.today, SchoolDay::AwaitingDecision)
    }

    /// Grounded players must finish chores before the day may end.
    #[must_use]
    pub const fn chores_required(&self) -> bool {
        self.grounded && !self.chores_done_today
    }

    pub const fn complete_chores(&mut self) {
        self.chores_done_today = true;
    }

    /// Prepare the resolver for a fresh day.
    pub const fn begin_day(&mut self, is_school_day: bool) {
        self.chores_done_today = false;
        self.today = if is_school_day {
            SchoolDay::AwaitingDecision
        } else {
            SchoolDay::NoSchool
        };
    }

    pub fn attend(&mut self) {
        self.today = SchoolDay::Attended;
        self.days_attended = self.days_attended.saturating_add(1);
        log::debug!("school attended");
    }

    /// Skip school and roll the consequence.
    pub fn skip<R: RandomSource + ?Sized>(
        &mut self,
        odds: &SkipOdds,
        grounded_days: u8,
        rng: &mut R,
    ) -> SkipOutcome {
        self.today = SchoolDay::Skipped;
        self.days_skipped = self.days_skipped.saturating_add(1);
        let roll = rng.roll(RollStream::School);
        let outcome = classify_skip_roll(roll, odds);
        match outcome {
            SkipOutcome::Safe => {}
            SkipOutcome::Detention => self.saturday_detention_pending = true,
            SkipOutcome::Grounded => self.ground(grounded_days),
        }
        log::debug!("school skipped: roll {roll:.4} -> {outcome}");
        outcome
    }

    /// Ground for `days` days. A fresh grounding never shortens an existing one.
    pub fn ground(&mut self, days: u8) {
        if days == 0 {
            return;
        }
        self.grounded = true;
        self.grounded_days_remaining = self.grounded_days_remaining.max(days);
    }

    /// Step into the next calendar day. `weekday` is the new day's weekday.
    pub fn advance_day(&mut self, weekday: u8, is_school_day: bool) -> SchoolRollover {
        let mut rollover = SchoolRollover::default();
        if self.grounded {
            self.grounded_days_remaining = self.grounded_days_remaining.saturating_sub(1);
            if self.grounded_days_remaining == 0 {
                self.grounded = false;
                rollover.grounding_lifted = true;
                log::debug!("grounding lifted");
            }
        }
        if weekday == 6 && self.saturday_detention_pending {
            self.saturday_detention_pending = false;
            rollover.detention_day = true;
            log::debug!("serving saturday detention");
        }
        self.begin_day(is_school_day);
        rollover
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;

    #[test]
    fn skip_roll_boundaries() {
        let odds = SkipOdds::default();
        assert_eq!(classify_skip_roll(0.0, &odds), SkipOutcome::Safe);
        assert_eq!(classify_skip_roll(0.499, &odds), SkipOutcome::Safe);
        assert_eq!(classify_skip_roll(0.5, &odds), SkipOutcome::Detention);
        assert_eq!(classify_skip_roll(0.749, &odds), SkipOutcome::Detention);
        assert_eq!(classify_skip_roll(0.75, &odds), SkipOutcome::Grounded);
        assert_eq!(classify_skip_roll(0.999, &odds), SkipOutcome::Grounded);
    }

    #[test]
    fn grounded_clears_after_exactly_seven_days() {
        let mut resolver = SchoolAttendanceResolver::default();
        resolver.begin_day(true);
        let mut rng = ScriptedRolls::new([0.9]);
        assert_eq!(
            resolver.skip(&SkipOdds::default(), 7, &mut rng),
            SkipOutcome::Grounded
        );
        assert!(resolver.grounded);
        assert_eq!(resolver.grounded_days_remaining, 7);
        assert_eq!(resolver.status(), SchoolStatus::Grounded);

        for day in 1..=6 {
            let rollover = resolver.advance_day(day, day <= 5);
            assert!(!rollover.grounding_lifted);
            assert!(resolver.grounded);
        }
        let rollover = resolver.advance_day(7, false);
        assert!(rollover.grounding_lifted);
        assert!(!resolver.grounded);
        assert_eq!(resolver.grounded_days_remaining, 0);
    }

    #[test]
    fn detention_is_served_on_next_saturday_only() {
        let mut resolver = SchoolAttendanceResolver::default();
        resolver.begin_day(true);
        let mut rng = ScriptedRolls::new([0.6]);
        assert_eq!(
            resolver.skip(&SkipOdds::default(), 7, &mut rng),
            SkipOutcome::Detention
        );
        assert_eq!(resolver.status(), SchoolStatus::SkippedToday);
        assert!(!resolver.advance_day(4, true).detention_day);
        assert_eq!(resolver.status(), SchoolStatus::DetentionPending);
        assert!(!resolver.advance_day(5, true).detention_day);
        assert!(resolver.advance_day(6, false).detention_day);
        assert!(!resolver.saturday_detention_pending);
        assert!(!resolver.advance_day(7, false).detention_day);
    }

    #[test]
    fn chores_requirement_resets_daily() {
        let mut resolver = SchoolAttendanceResolver::default();
        resolver.ground(7);
        resolver.begin_day(false);
        assert!(resolver.chores_required());
        resolver.complete_chores();
        assert!(!resolver.chores_required());
        resolver.advance_day(1, true);
        assert!(resolver.chores_required());
        assert!(resolver.decision_pending());
    }

    #[test]
    fn regrounding_keeps_longer_sentence() {
        let mut resolver = SchoolAttendanceResolver::default();
        resolver.ground(7);
        resolver.advance_day(1, true);
        resolver.advance_day(2, true);
        resolver.ground(3);
        assert_eq!(resolver.grounded_days_remaining, 5);
        resolver.ground(7);
        assert_eq!(resolver.grounded_days_remaining, 7);
    }
}
