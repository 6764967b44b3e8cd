//! Calendar, period and age tracking.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four fixed daily time slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Period {
    pub const ALL: &'static [Self] = &[Self::Morning, Self::Afternoon, Self::Evening, Self::Night];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }

    /// Next period in the cycle and whether the cycle wrapped to a new day.
    #[must_use]
    pub const fn next(self) -> (Self, bool) {
        match self {
            Self::Morning => (Self::Afternoon, false),
            Self::Afternoon => (Self::Evening, false),
            Self::Evening => (Self::Night, false),
            Self::Night => (Self::Morning, true),
        }
    }

    #[must_use]
    pub const fn is_last(self) -> bool {
        matches!(self, Self::Night)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    #[must_use]
    pub const fn from_month(month: u8) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Fall,
            _ => Self::Winter,
        }
    }
}

/// Month/day pair used for birthdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u8,
    pub day: u8,
}

impl MonthDay {
    #[must_use]
    pub const fn new(month: u8, day: u8) -> Self {
        Self { month, day }
    }
}

/// Starting point for a fresh clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockStart {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    /// 1 = Monday .. 7 = Sunday.
    pub weekday: u8,
    pub age: u8,
    pub birthday: MonthDay,
}

impl Default for ClockStart {
    fn default() -> Self {
        // 2024-09-01 fell on a Sunday.
        Self {
            year: 2024,
            month: 9,
            day: 1,
            weekday: 7,
            age: 13,
            birthday: MonthDay::new(9, 1),
        }
    }
}

/// Signals raised by crossing into a new calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRollover {
    pub days_played: u32,
    pub weekday: u8,
    pub birthday: bool,
    pub age: u8,
    pub aged_out: bool,
}

/// Result of a single period advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAdvance {
    pub period: Period,
    pub rollover: Option<DayRollover>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub weekday: u8,
    pub period: Period,
    pub days_played: u32,
    pub age: u8,
    pub birthday: MonthDay,
    pub max_age: u8,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(ClockStart::default(), 18)
    }
}

impl Clock {
    #[must_use]
    pub fn new(start: ClockStart, max_age: u8) -> Self {
        Self {
            year: start.year,
            month: start.month.clamp(1, 12),
            day: start.day.clamp(1, days_in_month(start.month.clamp(1, 12), start.year)),
            weekday: start.weekday.clamp(1, 7),
            period: Period::Morning,
            days_played: 0,
            age: start.age,
            birthday: start.birthday,
            max_age,
        }
    }

    /// Move to the next period, rolling into a new day after night.
    pub fn advance_period(&mut self) -> PeriodAdvance {
        let (next, wrapped) = self.period.next();
        if wrapped {
            let rollover = self.advance_day();
            PeriodAdvance {
                period: self.period,
                rollover: Some(rollover),
            }
        } else {
            self.period = next;
            PeriodAdvance {
                period: next,
                rollover: None,
            }
        }
    }

    /// Advance exactly one calendar day and reset to morning.
    pub fn advance_day(&mut self) -> DayRollover {
        self.period = Period::Morning;
        self.days_played = self.days_played.saturating_add(1);
        self.weekday = self.weekday % 7 + 1;

        self.day += 1;
        if self.day > days_in_month(self.month, self.year) {
            self.day = 1;
            self.month += 1;
            if self.month > 12 {
                self.month = 1;
                self.year = self.year.saturating_add(1);
            }
        }

        let birthday = self.month == self.birthday.month && self.day == self.birthday.day;
        if birthday {
            self.age = self.age.saturating_add(1);
        }

        DayRollover {
            days_played: self.days_played,
            weekday: self.weekday,
            birthday,
            age: self.age,
            aged_out: self.is_aged_out(),
        }
    }

    #[must_use]
    pub const fn is_aged_out(&self) -> bool {
        self.age > self.max_age
    }

    #[must_use]
    pub const fn is_school_day(&self) -> bool {
        matches!(self.weekday, 1..=5)
    }

    #[must_use]
    pub const fn is_weekend(&self) -> bool {
        !self.is_school_day()
    }

    #[must_use]
    pub const fn season(&self) -> Season {
        Season::from_month(self.month)
    }

    #[must_use]
    pub const fn weekday_name(&self) -> &'static str {
        match self.weekday {
            1 => "Monday",
            2 => "Tuesday",
            3 => "Wednesday",
            4 => "Thursday",
            5 => "Friday",
            6 => "Saturday",
            _ => "Sunday",
        }
    }
}

#[must_use]
pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[must_use]
pub const fn days_in_month(month: u8, year: u16) -> u8 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_advances_roll_exactly_one_day() {
        let mut clock = Clock::default();
        let start_days = clock.days_played;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(clock.advance_period());
        }
        assert_eq!(clock.days_played, start_days + 1);
        assert_eq!(clock.period, Period::Morning);
        let periods: Vec<Period> = seen.iter().map(|advance| advance.period).collect();
        assert_eq!(
            periods,
            vec![
                Period::Afternoon,
                Period::Evening,
                Period::Night,
                Period::Morning
            ]
        );
        assert_eq!(seen.iter().filter(|a| a.rollover.is_some()).count(), 1);
    }

    #[test]
    fn weekday_cycles_one_through_seven() {
        let mut clock = Clock::default();
        assert_eq!(clock.weekday, 7);
        assert!(clock.is_weekend());
        clock.advance_day();
        assert_eq!(clock.weekday, 1);
        assert!(clock.is_school_day());
        for _ in 0..5 {
            clock.advance_day();
        }
        assert_eq!(clock.weekday, 6);
        assert!(clock.is_weekend());
    }

    #[test]
    fn month_and_year_roll_over() {
        let start = ClockStart {
            year: 2024,
            month: 12,
            day: 31,
            weekday: 2,
            age: 13,
            birthday: MonthDay::new(6, 1),
        };
        let mut clock = Clock::new(start, 18);
        clock.advance_day();
        assert_eq!((clock.year, clock.month, clock.day), (2025, 1, 1));
    }

    #[test]
    fn leap_years_follow_gregorian_rules() {
        assert_eq!(days_in_month(2, 2024), 29);
        assert_eq!(days_in_month(2, 2023), 28);
        assert_eq!(days_in_month(2, 1900), 28);
        assert_eq!(days_in_month(2, 2000), 29);

        let start = ClockStart {
            year: 2028,
            month: 2,
            day: 28,
            weekday: 1,
            age: 14,
            birthday: MonthDay::new(1, 1),
        };
        let mut clock = Clock::new(start, 18);
        clock.advance_day();
        assert_eq!((clock.month, clock.day), (2, 29));
        clock.advance_day();
        assert_eq!((clock.month, clock.day), (3, 1));
    }

    #[test]
    fn birthday_increments_age_once_and_flags_aged_out() {
        let start = ClockStart {
            year: 2029,
            month: 8,
            day: 31,
            weekday: 5,
            age: 18,
            birthday: MonthDay::new(9, 1),
        };
        let mut clock = Clock::new(start, 18);
        let rollover = clock.advance_day();
        assert!(rollover.birthday);
        assert_eq!(rollover.age, 19);
        assert!(rollover.aged_out);

        let next = clock.advance_day();
        assert!(!next.birthday);
        assert_eq!(clock.age, 19);
    }

    #[test]
    fn season_tracks_month() {
        let clock = Clock::default();
        assert_eq!(clock.season(), Season::Fall);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Spring);
        assert_eq!(Season::from_month(7), Season::Summer);
    }
}
