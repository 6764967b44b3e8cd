//! Centralized balance and tuning constants for Teen Life simulation logic.
//!
//! These values define the deterministic math for the core simulation.
//! Tunables that designers are expected to adjust live in [`crate::config::SimConfig`];
//! the numbers here are structural and only change through reviewed code.

// Stat bounds --------------------------------------------------------------
pub(crate) const STAT_MIN: i32 = 0;
pub(crate) const STAT_MAX: i32 = 100;

// Grades (hundredths of a point) -------------------------------------------
pub(crate) const GRADE_SCALE: i32 = 100;
pub(crate) const GRADE_MAX_POINTS: i32 = 100 * GRADE_SCALE;
pub(crate) const STUDY_BASE_POINTS: i32 = 2 * GRADE_SCALE;
pub(crate) const STUDY_DIMINISHING_THRESHOLD: i32 = 90 * GRADE_SCALE;
pub(crate) const ATTEND_BONUS_POINTS: i32 = GRADE_SCALE / 2;
pub(crate) const MISS_PENALTY_POINTS: i32 = GRADE_SCALE;
pub(crate) const SKIP_EXAM_PENALTY_POINTS: i32 = 10 * GRADE_SCALE;
pub(crate) const ATTENDANCE_MISS_PENALTY: u8 = 2;
pub(crate) const EXAM_GRADE_WEIGHT: f64 = 0.7;
pub(crate) const EXAM_SCORE_WEIGHT: f64 = 0.3;
pub(crate) const EXAM_JITTER: f64 = 10.0;
pub(crate) const ACADEMIC_HISTORY_WINDOW: usize = 20;

// Passive drift ------------------------------------------------------------
pub(crate) const DRIFT_ENERGY_PER_PERIOD: i32 = -5;
pub(crate) const DRIFT_HAPPINESS_DECAY: i32 = -1;
pub(crate) const DRIFT_HAPPINESS_DECAY_ABOVE: i32 = 60;
pub(crate) const DRIFT_HEALTH_REGEN: i32 = 1;
pub(crate) const DRIFT_LOW_ENERGY_THRESHOLD: i32 = 20;
pub(crate) const DRIFT_LOW_ENERGY_HEALTH_COST: i32 = -2;
pub(crate) const BIRTHDAY_HAPPINESS_BONUS: i32 = 10;

// Events -------------------------------------------------------------------
pub(crate) const MAX_PENDING_EVENTS: usize = 3;
pub(crate) const CATEGORY_WEIGHT_TOLERANCE: f64 = 1e-6;

// Relationships ------------------------------------------------------------
pub(crate) const PROMOTE_TO_FRIEND_AT: i32 = 80;
pub(crate) const DEMOTE_TO_ACQUAINTANCE_AT: i32 = 20;

// Chores minigame ----------------------------------------------------------
pub(crate) const EARNING_CHORE_STEPS: u32 = 25;
pub(crate) const PUNISHMENT_CHORE_STEPS: u32 = 50;

// Persistence --------------------------------------------------------------
pub(crate) const SAVE_VERSION: u32 = 3;
pub(crate) const SAVE_CHECKSUM_SEED: u64 = 0x7EE1_11FE;
