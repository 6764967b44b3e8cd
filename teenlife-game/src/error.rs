//! Command rejection taxonomy.
use thiserror::Error;

use crate::clock::Period;
use crate::endings::Ending;
use crate::stats::StatId;

/// Recoverable rejection of a command. No state is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("not enough actions (need {needed}, have {available})")]
    InsufficientActions { needed: u8, available: u8 },
    #[error("'{id}' is not available in the {period}")]
    WrongPeriod { id: String, period: Period },
    #[error("'{id}' is only available on weekends")]
    WeekendOnly { id: String },
    #[error("'{id}' requires age {min_age}")]
    TooYoung { id: String, min_age: u8 },
    #[error("'{id}' requires {stat} of at least {needed}")]
    RequirementUnmet {
        id: String,
        stat: StatId,
        needed: i32,
    },
    #[error("you're grounded and can't do '{id}'")]
    Grounded { id: String },
    #[error("decide whether to go to school first")]
    SchoolDecisionRequired,
    #[error("there is no school decision to make right now")]
    NoSchoolDecisionPending,
    #[error("finish your chores before the day ends")]
    ChoresRequired,
    #[error("chores are not finished ({current}/{required})")]
    ChoresIncomplete { current: u32, required: u32 },
    #[error("that choice requires {stat} of at least {needed}")]
    ChoiceRequirementUnmet { stat: StatId, needed: i32 },
    #[error("event '{event_id}' has no choice {index}")]
    InvalidChoice { event_id: String, index: usize },
    #[error("not enough money (need ${price}, have ${money})")]
    InsufficientFunds { price: i32, money: i32 },
    #[error("you don't have any '{id}'")]
    ItemNotOwned { id: String },
    #[error("'{id}' was already used today")]
    ItemUsedToday { id: String },
}

impl ValidationError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientActions { .. } => "insufficient_actions",
            Self::WrongPeriod { .. } => "wrong_period",
            Self::WeekendOnly { .. } => "weekend_only",
            Self::TooYoung { .. } => "too_young",
            Self::RequirementUnmet { .. } => "requirement_unmet",
            Self::Grounded { .. } => "grounded",
            Self::SchoolDecisionRequired => "school_decision_required",
            Self::NoSchoolDecisionPending => "no_school_decision_pending",
            Self::ChoresRequired => "chores_required",
            Self::ChoresIncomplete { .. } => "chores_incomplete",
            Self::ChoiceRequirementUnmet { .. } => "choice_requirement_unmet",
            Self::InvalidChoice { .. } => "invalid_choice",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::ItemNotOwned { .. } => "item_not_owned",
            Self::ItemUsedToday { .. } => "item_used_today",
        }
    }
}

/// Failure of a controller command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown {kind} '{id}'")]
    UnknownId { kind: &'static str, id: String },
    #[error("the game is over ({0})")]
    GameOver(Ending),
}

impl CommandError {
    /// Stable code for UI collaborators.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::UnknownId { .. } => "unknown_id",
            Self::GameOver(_) => "game_over",
        }
    }

    pub(crate) fn unknown(kind: &'static str, id: &str) -> Self {
        log::warn!("unknown {kind} id '{id}'");
        Self::UnknownId {
            kind,
            id: id.to_string(),
        }
    }
}
