//! Narrative event selection, queuing and choice resolution.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::{CategoryWeight, EventStrategy, ForcedTrigger, SimConfig};
use crate::constants::MAX_PENDING_EVENTS;
use crate::data::{AcademicHook, CatalogData, EventCategory, EventDef};
use crate::education::{AssignmentResult, EducationTracker, ExamResult, SubjectId, TierChange};
use crate::error::ValidationError;
use crate::relationships::{RelationshipChange, RelationshipLedger};
use crate::rng::{RandomSource, RollStream};
use crate::stats::{StatBoard, StatDelta};

/// Where a queued event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    Random,
    Forced,
    Generated,
}

/// An event waiting for the player's choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub event: EventDef,
    /// Subject bound when the event carries an academic hook.
    pub subject: Option<SubjectId>,
    pub origin: EventOrigin,
    pub queued_day: u32,
}

impl PendingEvent {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.event.id
    }

    /// Description with the bound subject substituted in.
    #[must_use]
    pub fn description(&self) -> String {
        let subject = self
            .subject
            .map_or("class", SubjectId::display_name);
        self.event.description.replace("{subject}", subject)
    }
}

/// Bounded FIFO of unresolved events. Never blocks the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventQueue {
    pending: VecDeque<PendingEvent>,
}

impl EventQueue {
    /// Enqueue an event, skipping ids already pending and dropping the oldest
    /// entry when full. Returns whether the event was added.
    pub fn push(&mut self, event: PendingEvent) -> bool {
        if self.contains(event.id()) {
            return false;
        }
        self.pending.push_back(event);
        while self.pending.len() > MAX_PENDING_EVENTS {
            if let Some(dropped) = self.pending.pop_front() {
                log::debug!("dropping unresolved event '{}'", dropped.id());
            }
        }
        true
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.pending.iter().any(|pending| pending.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PendingEvent> {
        self.pending.iter().find(|pending| pending.id() == id)
    }

    /// Remove and return a pending event.
    pub fn take(&mut self, id: &str) -> Option<PendingEvent> {
        let idx = self.pending.iter().position(|pending| pending.id() == id)?;
        self.pending.remove(idx)
    }

    #[must_use]
    pub fn front(&self) -> Option<&PendingEvent> {
        self.pending.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEvent> {
        self.pending.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Snapshot consulted when deciding which events may fire.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub stats: &'a StatBoard,
    pub is_school_day: bool,
}

fn eligible(event: &EventDef, ctx: &EventContext<'_>) -> bool {
    !event.forced_only
        && (ctx.is_school_day || event.category != EventCategory::School)
        && event.requirements.is_met(ctx.stats)
}

/// Weighted category pick over the categories open today.
pub fn pick_category<R: RandomSource + ?Sized>(
    weights: &[CategoryWeight],
    is_school_day: bool,
    rng: &mut R,
) -> Option<EventCategory> {
    let open: Vec<&CategoryWeight> = weights
        .iter()
        .filter(|w| w.weight > 0.0 && (is_school_day || !w.requires_school_day))
        .collect();
    let total: f64 = open.iter().map(|w| w.weight).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = rng.roll(RollStream::Event) * total;
    for weight in &open {
        if target < weight.weight {
            return Some(weight.category);
        }
        target -= weight.weight;
    }
    open.last().map(|w| w.category)
}

/// Random events that fire on this period advance.
pub fn draw_events<'c, R: RandomSource + ?Sized>(
    catalog: &'c CatalogData,
    config: &SimConfig,
    ctx: &EventContext<'_>,
    rng: &mut R,
) -> Vec<&'c EventDef> {
    match config.event_strategy {
        EventStrategy::CategoryDraw => {
            if rng.roll(RollStream::Event) >= config.category_event_chance {
                return Vec::new();
            }
            let Some(category) = pick_category(&config.category_weights, ctx.is_school_day, rng)
            else {
                return Vec::new();
            };
            let candidates: Vec<&EventDef> = catalog
                .events
                .iter()
                .filter(|event| event.category == category && eligible(event, ctx))
                .collect();
            if candidates.is_empty() {
                return Vec::new();
            }
            let idx = rng.roll_index(RollStream::Event, candidates.len());
            candidates.get(idx).copied().into_iter().collect()
        }
        EventStrategy::PeriodRolls => catalog
            .events
            .iter()
            .filter(|event| eligible(event, ctx))
            .filter(|event| rng.roll(RollStream::Event) < event.trigger_chance)
            .collect(),
    }
}

/// Coping events whose stat trigger is currently active.
#[must_use]
pub fn forced_events<'c>(
    catalog: &'c CatalogData,
    triggers: &[ForcedTrigger],
    stats: &StatBoard,
) -> Vec<&'c EventDef> {
    triggers
        .iter()
        .filter(|trigger| stats.get(trigger.stat) < trigger.below)
        .filter_map(|trigger| {
            let event = catalog.event(&trigger.event_id);
            if event.is_none() {
                log::warn!("forced trigger references unknown event '{}'", trigger.event_id);
            }
            event
        })
        .collect()
}

/// Bind a random subject to academic events.
pub fn prepare_pending<R: RandomSource + ?Sized>(
    event: EventDef,
    origin: EventOrigin,
    day: u32,
    rng: &mut R,
) -> PendingEvent {
    let subject = event.needs_subject().then(|| random_subject(rng));
    PendingEvent {
        event,
        subject,
        origin,
        queued_day: day,
    }
}

fn random_subject<R: RandomSource + ?Sized>(rng: &mut R) -> SubjectId {
    let idx = rng.roll_index(RollStream::Assignment, SubjectId::ALL.len());
    SubjectId::ALL.get(idx).copied().unwrap_or(SubjectId::Math)
}

/// Grade mechanics triggered by a choice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcademicOutcome {
    Exam(ExamResult),
    SkippedExam {
        subject: SubjectId,
        tier_change: Option<TierChange>,
    },
    Assignment(AssignmentResult),
}

impl AcademicOutcome {
    #[must_use]
    pub const fn tier_change(&self) -> Option<TierChange> {
        match self {
            Self::Exam(result) => result.tier_change,
            Self::SkippedExam { tier_change, .. } => *tier_change,
            Self::Assignment(result) => result.tier_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOutcome {
    pub event_id: String,
    pub choice_text: String,
    pub result_text: String,
    pub deltas: Vec<StatDelta>,
    pub relationships: Vec<RelationshipChange>,
    pub academic: Option<AcademicOutcome>,
}

/// Mutable state a choice may touch.
pub struct ChoiceTargets<'a> {
    pub stats: &'a mut StatBoard,
    pub relationships: &'a mut RelationshipLedger,
    pub education: &'a mut EducationTracker,
    pub day: u32,
}

/// Check that `index` names a choice the player may pick.
///
/// # Errors
///
/// Returns a validation error for out-of-range indices or unmet requirements.
pub fn check_choice(
    pending: &PendingEvent,
    index: usize,
    stats: &StatBoard,
) -> Result<(), ValidationError> {
    let choice = pending
        .event
        .choices
        .get(index)
        .ok_or_else(|| ValidationError::InvalidChoice {
            event_id: pending.id().to_string(),
            index,
        })?;
    if let Some((stat, needed)) = choice.requirements.first_unmet(stats) {
        return Err(ValidationError::ChoiceRequirementUnmet { stat, needed });
    }
    Ok(())
}

/// Apply a validated choice: stat effects, relationship effects, then any
/// academic hook.
///
/// # Errors
///
/// Returns the same errors as [`check_choice`]; nothing is mutated on error.
pub fn choose_option<R: RandomSource + ?Sized>(
    pending: &PendingEvent,
    index: usize,
    targets: ChoiceTargets<'_>,
    rng: &mut R,
) -> Result<ChoiceOutcome, ValidationError> {
    check_choice(pending, index, targets.stats)?;
    let Some(choice) = pending.event.choices.get(index) else {
        return Err(ValidationError::InvalidChoice {
            event_id: pending.id().to_string(),
            index,
        });
    };

    let deltas = choice.effects.apply(targets.stats, None);
    let relationships = choice
        .relationship_effects
        .iter()
        .filter_map(|(id, delta)| targets.relationships.modify(id, *delta))
        .collect();

    let academic = choice.academic.map(|hook| {
        let subject = pending.subject.unwrap_or_else(|| random_subject(rng));
        match hook {
            AcademicHook::TakeExam => AcademicOutcome::Exam(targets.education.take_exam(
                subject,
                targets.stats.intelligence,
                targets.day,
                rng,
            )),
            AcademicHook::SkipExam => AcademicOutcome::SkippedExam {
                subject,
                tier_change: targets.education.skip_exam(subject),
            },
            AcademicHook::Assignment { effort } => AcademicOutcome::Assignment(
                targets
                    .education
                    .complete_assignment(subject, effort, targets.day, rng),
            ),
        }
    });

    Ok(ChoiceOutcome {
        event_id: pending.id().to_string(),
        choice_text: choice.text.clone(),
        result_text: choice.result_text.clone(),
        deltas,
        relationships,
        academic,
    })
}
