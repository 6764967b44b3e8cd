//! Per-subject grades, study/exam/assignment mechanics and the grade-tier
//! feedback loop that sizes daily action budgets and weekly allowance.
//!
//! Grades are stored as integer hundredths of a point (`0..=10_000`) so that
//! repeated small increments never drift and persisted snapshots round-trip
//! exactly.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    ACADEMIC_HISTORY_WINDOW, ATTEND_BONUS_POINTS, ATTENDANCE_MISS_PENALTY, EXAM_GRADE_WEIGHT,
    EXAM_JITTER, EXAM_SCORE_WEIGHT, GRADE_MAX_POINTS, GRADE_SCALE, MISS_PENALTY_POINTS,
    SKIP_EXAM_PENALTY_POINTS, STUDY_BASE_POINTS, STUDY_DIMINISHING_THRESHOLD,
};
use crate::numbers::{f64_to_points, points_to_f64, round_f64_to_percent};
use crate::rng::{RandomSource, RollStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectId {
    Math,
    Science,
    English,
    History,
    Art,
    PhysicalEducation,
}

impl SubjectId {
    pub const ALL: &'static [Self] = &[
        Self::Math,
        Self::Science,
        Self::English,
        Self::History,
        Self::Art,
        Self::PhysicalEducation,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Science => "science",
            Self::English => "english",
            Self::History => "history",
            Self::Art => "art",
            Self::PhysicalEducation => "physical_education",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Math => "Mathematics",
            Self::Science => "Science",
            Self::English => "English",
            Self::History => "History",
            Self::Art => "Art",
            Self::PhysicalEducation => "Physical Education",
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|subject| subject.as_str() == s)
            .ok_or(())
    }
}

/// Letter grade tier derived from academic performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    A,
    B,
    C,
    D,
    F,
}

impl Tier {
    /// Map a grade (in hundredths) onto a tier using inclusive thresholds.
    #[must_use]
    pub const fn from_points(points: i32) -> Self {
        if points >= 90 * GRADE_SCALE {
            Self::A
        } else if points >= 80 * GRADE_SCALE {
            Self::B
        } else if points >= 70 * GRADE_SCALE {
            Self::C
        } else if points >= 60 * GRADE_SCALE {
            Self::D
        } else {
            Self::F
        }
    }

    /// Higher is better.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::A => 4,
            Self::B => 3,
            Self::C => 2,
            Self::D => 1,
            Self::F => 0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource budget granted by a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBudget {
    pub actions: u8,
    pub allowance: i32,
}

impl TierBudget {
    #[must_use]
    pub const fn new(actions: u8, allowance: i32) -> Self {
        Self { actions, allowance }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(rename = "A")]
    pub a: TierBudget,
    #[serde(rename = "B")]
    pub b: TierBudget,
    #[serde(rename = "C")]
    pub c: TierBudget,
    #[serde(rename = "D")]
    pub d: TierBudget,
    #[serde(rename = "F")]
    pub f: TierBudget,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            a: TierBudget::new(7, 25),
            b: TierBudget::new(6, 20),
            c: TierBudget::new(5, 15),
            d: TierBudget::new(4, 10),
            f: TierBudget::new(3, 5),
        }
    }
}

impl TierTable {
    #[must_use]
    pub const fn budget(&self, tier: Tier) -> TierBudget {
        match tier {
            Tier::A => self.a,
            Tier::B => self.b,
            Tier::C => self.c,
            Tier::D => self.d,
            Tier::F => self.f,
        }
    }
}

/// Which aggregate of the subject grades drives the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TierBasis {
    #[default]
    Lowest,
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TierPolicy {
    #[serde(default)]
    pub basis: TierBasis,
    #[serde(default)]
    pub table: TierTable,
}

/// Notification emitted when the academic tier crosses a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierChange {
    pub tier: Tier,
    pub previous: Tier,
    /// Grade the tier was derived from (lowest or average, per policy).
    pub lowest_grade: f64,
    pub actions: u8,
    pub allowance: i32,
    pub improved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentEffort {
    High,
    Medium,
    #[serde(alias = "none")]
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub name: String,
    /// Grade in hundredths of a point.
    pub grade: i32,
    pub study_count: u32,
    pub last_studied_day: Option<u32>,
}

impl SubjectRecord {
    #[must_use]
    pub fn grade_value(&self) -> f64 {
        points_to_f64(self.grade)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub subject: SubjectId,
    pub score: u8,
    pub day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub subject: SubjectId,
    pub score: u8,
    pub effort: AssignmentEffort,
    pub day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub subject: SubjectId,
    pub score: u8,
    pub tier_change: Option<TierChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub subject: SubjectId,
    pub score: u8,
    pub tier_change: Option<TierChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationTracker {
    pub subjects: BTreeMap<SubjectId, SubjectRecord>,
    pub attendance: u8,
    pub recorded_tier: Tier,
    pub policy: TierPolicy,
    #[serde(default)]
    pub exams: VecDeque<ExamRecord>,
    #[serde(default)]
    pub assignments: VecDeque<AssignmentRecord>,
}

impl Default for EducationTracker {
    fn default() -> Self {
        Self::new(70.0, TierPolicy::default())
    }
}

impl EducationTracker {
    #[must_use]
    pub fn new(starting_grade: f64, policy: TierPolicy) -> Self {
        let grade = f64_to_points(starting_grade).clamp(0, GRADE_MAX_POINTS);
        let subjects = SubjectId::ALL
            .iter()
            .map(|&subject| {
                (
                    subject,
                    SubjectRecord {
                        name: subject.display_name().to_string(),
                        grade,
                        study_count: 0,
                        last_studied_day: None,
                    },
                )
            })
            .collect();
        let mut tracker = Self {
            subjects,
            attendance: 100,
            recorded_tier: Tier::F,
            policy,
            exams: VecDeque::new(),
            assignments: VecDeque::new(),
        };
        tracker.recorded_tier = tracker.current_tier();
        tracker
    }

    #[must_use]
    pub fn grade(&self, subject: SubjectId) -> f64 {
        self.subjects
            .get(&subject)
            .map_or(0.0, SubjectRecord::grade_value)
    }

    #[must_use]
    pub fn grade_points(&self, subject: SubjectId) -> i32 {
        self.subjects.get(&subject).map_or(0, |record| record.grade)
    }

    /// Mean of all subject grades.
    #[must_use]
    pub fn grade_average(&self) -> f64 {
        points_to_f64(self.average_points())
    }

    /// Lowest subject grade.
    #[must_use]
    pub fn lowest_grade(&self) -> f64 {
        points_to_f64(self.lowest_points())
    }

    fn average_points(&self) -> i32 {
        let count = i32::try_from(self.subjects.len()).unwrap_or(i32::MAX);
        if count == 0 {
            return 0;
        }
        let total: i32 = self.subjects.values().map(|record| record.grade).sum();
        (total + count / 2) / count
    }

    fn lowest_points(&self) -> i32 {
        self.subjects
            .values()
            .map(|record| record.grade)
            .min()
            .unwrap_or(0)
    }

    fn basis_points(&self) -> i32 {
        match self.policy.basis {
            TierBasis::Lowest => self.lowest_points(),
            TierBasis::Average => self.average_points(),
        }
    }

    /// Tier implied by the current grades (may differ from the recorded tier
    /// until the next recomputation).
    #[must_use]
    pub fn current_tier(&self) -> Tier {
        Tier::from_points(self.basis_points())
    }

    /// Budget for the last recorded tier.
    #[must_use]
    pub const fn budget(&self) -> TierBudget {
        self.policy.table.budget(self.recorded_tier)
    }

    /// Re-derive the tier; reports a change only when it differs from the
    /// previously recorded tier.
    pub fn recompute(&mut self) -> Option<TierChange> {
        let basis = self.basis_points();
        let tier = Tier::from_points(basis);
        let previous = self.recorded_tier;
        if tier == previous {
            return None;
        }
        self.recorded_tier = tier;
        let budget = self.policy.table.budget(tier);
        log::debug!("academic tier {previous} -> {tier} (basis {basis})");
        Some(TierChange {
            tier,
            previous,
            lowest_grade: points_to_f64(basis),
            actions: budget.actions,
            allowance: budget.allowance,
            improved: tier.rank() > previous.rank(),
        })
    }

    /// Study a subject. `intelligence_bonus` scales the base improvement.
    pub fn study(
        &mut self,
        subject: SubjectId,
        intelligence_bonus: i32,
        day: u32,
    ) -> Option<TierChange> {
        let record = self.subjects.get_mut(&subject)?;
        record.study_count = record.study_count.saturating_add(1);
        record.last_studied_day = Some(day);

        // 2 * (1 + bonus / 100) points == 200 + 2 * bonus hundredths.
        let mut improvement =
            (STUDY_BASE_POINTS + intelligence_bonus.saturating_mul(2)).max(0);
        if record.grade >= STUDY_DIMINISHING_THRESHOLD {
            improvement /= 2;
        }
        record.grade = (record.grade + improvement).min(GRADE_MAX_POINTS);
        self.recompute()
    }

    /// Attending class nudges every subject up by half a point.
    pub fn attend_school(&mut self) -> Option<TierChange> {
        for record in self.subjects.values_mut() {
            record.grade = (record.grade + ATTEND_BONUS_POINTS).min(GRADE_MAX_POINTS);
        }
        self.recompute()
    }

    /// Missing class costs attendance and a point in every subject.
    pub fn miss_school(&mut self) -> Option<TierChange> {
        self.attendance = self.attendance.saturating_sub(ATTENDANCE_MISS_PENALTY);
        for record in self.subjects.values_mut() {
            record.grade = (record.grade - MISS_PENALTY_POINTS).max(0);
        }
        self.recompute()
    }

    /// Sit an exam. Score blends the current grade, intelligence and jitter;
    /// the exam counts for 30% of the new subject grade.
    pub fn take_exam<R: RandomSource + ?Sized>(
        &mut self,
        subject: SubjectId,
        intelligence: i32,
        day: u32,
        rng: &mut R,
    ) -> ExamResult {
        let grade = self.grade(subject);
        let intelligence_factor = f64::from(intelligence.clamp(0, 100)) / 100.0;
        let jitter = rng.roll_range(RollStream::Exam, -EXAM_JITTER, EXAM_JITTER);
        let score = (grade * (0.7 + intelligence_factor * 0.3) + jitter).clamp(0.0, 100.0);

        if let Some(record) = self.subjects.get_mut(&subject) {
            let blended = grade * EXAM_GRADE_WEIGHT + score * EXAM_SCORE_WEIGHT;
            record.grade = f64_to_points(blended).clamp(0, GRADE_MAX_POINTS);
        }
        let score = round_f64_to_percent(score);
        push_bounded(
            &mut self.exams,
            ExamRecord {
                subject,
                score,
                day,
            },
        );
        ExamResult {
            subject,
            score,
            tier_change: self.recompute(),
        }
    }

    /// Skipping an exam costs ten points in that subject.
    pub fn skip_exam(&mut self, subject: SubjectId) -> Option<TierChange> {
        if let Some(record) = self.subjects.get_mut(&subject) {
            record.grade = (record.grade - SKIP_EXAM_PENALTY_POINTS).max(0);
        }
        self.recompute()
    }

    pub fn complete_assignment<R: RandomSource + ?Sized>(
        &mut self,
        subject: SubjectId,
        effort: AssignmentEffort,
        day: u32,
        rng: &mut R,
    ) -> AssignmentResult {
        let (grade_delta, score) = match effort {
            AssignmentEffort::High => (
                3 * GRADE_SCALE,
                rng.roll_range(RollStream::Assignment, 90.0, 100.0),
            ),
            AssignmentEffort::Medium => (
                GRADE_SCALE,
                rng.roll_range(RollStream::Assignment, 70.0, 90.0),
            ),
            AssignmentEffort::Low => (-5 * GRADE_SCALE, 0.0),
        };
        if let Some(record) = self.subjects.get_mut(&subject) {
            record.grade = (record.grade + grade_delta).clamp(0, GRADE_MAX_POINTS);
        }
        let score = round_f64_to_percent(score);
        push_bounded(
            &mut self.assignments,
            AssignmentRecord {
                subject,
                score,
                effort,
                day,
            },
        );
        AssignmentResult {
            subject,
            score,
            tier_change: self.recompute(),
        }
    }

    /// Overwrite a subject grade without recomputing the tier. The next
    /// grade-affecting call reports any resulting tier change.
    pub fn set_grade(&mut self, subject: SubjectId, grade: f64) {
        if let Some(record) = self.subjects.get_mut(&subject) {
            record.grade = f64_to_points(grade).clamp(0, GRADE_MAX_POINTS);
        }
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, entry: T) {
    history.push_back(entry);
    while history.len() > ACADEMIC_HISTORY_WINDOW {
        history.pop_front();
    }
}
