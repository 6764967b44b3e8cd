//! Turn orchestration: the single owner of a running game.
//!
//! Every command validates first and mutates second, so a rejected command
//! leaves the state untouched. Commands return an [`Outcome`] describing all
//! changes instead of notifying observers.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::activities::{self, ActivityContext, ActivityTargets};
use crate::chores::{ChoreKind, ChoreProgress};
use crate::clock::{DayRollover, Period};
use crate::config::SimConfig;
use crate::constants::{
    BIRTHDAY_HAPPINESS_BONUS, DRIFT_ENERGY_PER_PERIOD, DRIFT_HAPPINESS_DECAY,
    DRIFT_HAPPINESS_DECAY_ABOVE, DRIFT_HEALTH_REGEN, DRIFT_LOW_ENERGY_HEALTH_COST,
    DRIFT_LOW_ENERGY_THRESHOLD, STAT_MAX,
};
use crate::data::{ActivityDef, ActivityKind, CatalogData, EventDef};
use crate::education::{Tier, TierChange};
use crate::endings::{Ending, detect_ending};
use crate::error::{CommandError, ValidationError};
use crate::events::{
    self, AcademicOutcome, ChoiceTargets, EventContext, EventOrigin, PendingEvent,
};
use crate::generator::{EventSource, GenerationContext, generate_or_fallback};
use crate::inventory::{ItemSale, ItemUse};
use crate::relationships::RelationshipChange;
use crate::rng::{RandomSource, RngBundle};
use crate::save::{self, PersistenceError};
use crate::school::SkipOutcome;
use crate::shop::{self, Purchase};
use crate::state::{GameState, Gender};
use crate::stats::{StatBoard, StatDelta, StatId};

/// Notable things that happened while executing a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    NewDay { days_played: u32, weekday: u8 },
    Birthday { age: u8 },
    GroundingLifted,
    DetentionServed { actions: u8 },
    AllowancePaid { amount: i32 },
    AllowanceWithheld,
    EventQueued { id: String, origin: EventOrigin },
    ChoresCompleted,
}

/// Command-specific payload carried alongside the generic outcome fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Consequence {
    School { attended: bool, skip: Option<SkipOutcome> },
    Academic(AcademicOutcome),
    Purchase(Purchase),
    ItemUsed(ItemUse),
    ItemSold(ItemSale),
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outcome {
    pub message: String,
    pub deltas: Vec<StatDelta>,
    pub relationships: Vec<RelationshipChange>,
    pub tier_change: Option<TierChange>,
    pub consequence: Option<Consequence>,
    pub milestones: SmallVec<[Milestone; 4]>,
    /// Set when this command ended the game.
    pub ending: Option<Ending>,
}

impl Outcome {
    fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

/// Owns the game state, the static catalog and the random source.
#[derive(Debug, Clone)]
pub struct SimulationController<R = RngBundle> {
    config: SimConfig,
    catalog: CatalogData,
    state: GameState,
    rng: R,
}

impl SimulationController<RngBundle> {
    /// Controller with a seeded RNG bundle and a fresh unnamed game.
    #[must_use]
    pub fn new(config: SimConfig, catalog: CatalogData, seed: u64) -> Self {
        Self::with_rng(config, catalog, seed, RngBundle::from_user_seed(seed))
    }
}

impl<R: RandomSource> SimulationController<R> {
    /// Controller with an injected random source.
    #[must_use]
    pub fn with_rng(config: SimConfig, catalog: CatalogData, seed: u64, rng: R) -> Self {
        let state = GameState::new(&config, "", Gender::default(), seed);
        Self {
            config,
            catalog,
            state,
            rng,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply a closure to the mutable game state (tests and tooling).
    pub fn with_state_mut<T>(&mut self, f: impl FnOnce(&mut GameState) -> T) -> T {
        f(&mut self.state)
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogData {
        &self.catalog
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.state.is_over()
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.state.education.recorded_tier
    }

    #[must_use]
    pub fn pending_events(&self) -> Vec<&PendingEvent> {
        self.state.events.iter().collect()
    }

    fn activity_context(&self) -> ActivityContext<'_> {
        ActivityContext {
            clock: &self.state.clock,
            stats: &self.state.stats,
            actions: &self.state.actions,
            school: &self.state.school,
        }
    }

    /// Activities that can be performed right now.
    #[must_use]
    pub fn available_activities(&self) -> Vec<&ActivityDef> {
        activities::list_available(&self.catalog, &self.activity_context())
    }

    /// Context snapshot for an external event generator.
    #[must_use]
    pub fn generation_context(&self) -> GenerationContext {
        let clock = &self.state.clock;
        GenerationContext {
            stats: self.state.stats.clone(),
            days_played: clock.days_played,
            weekday: clock.weekday,
            period: clock.period,
            age: clock.age,
            is_school_day: clock.is_school_day(),
            relationships: self
                .state
                .relationships
                .iter()
                .map(|(id, rel)| (id.to_string(), rel.strength))
                .collect(),
            recent_history: self.state.log.recent(5),
        }
    }

    fn ensure_running(&self) -> Result<(), CommandError> {
        match self.state.ending {
            Some(ending) => Err(CommandError::GameOver(ending)),
            None => Ok(()),
        }
    }

    fn note(&mut self, message: &str) {
        self.state.log.push(&self.state.clock, message);
    }

    fn note_tier_change(&mut self, change: Option<TierChange>) {
        if let Some(change) = change {
            self.note(&format!(
                "Academic tier {} -> {} ({} actions per school day, ${} allowance)",
                change.previous, change.tier, change.actions, change.allowance
            ));
        }
    }

    /// Record a terminal condition if one was reached.
    fn settle(&mut self, outcome: &mut Outcome) {
        if self.state.ending.is_some() {
            return;
        }
        if let Some(ending) = detect_ending(&self.state.clock, &self.state.stats) {
            log::debug!("game over: {ending}");
            self.state.ending = Some(ending);
            outcome.ending = Some(ending);
            self.note(ending.headline());
        }
    }

    /// Start over. Always allowed, including after game over.
    pub fn new_game(&mut self, name: &str, gender: Gender, seed: u64) -> Outcome {
        let name = if name.trim().is_empty() {
            "Player"
        } else {
            name
        };
        self.state = GameState::new(&self.config, name, gender, seed);
        self.rng.reseed(seed);
        let message = format!("Welcome, {}! Your teen years begin.", self.state.player.name);
        self.note(&message);
        Outcome::with_message(message)
    }

    /// Perform a catalog activity.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the activity is unavailable or
    /// unaffordable, `unknown_id` for unknown ids and `game_over` after the end.
    pub fn perform_activity(&mut self, id: &str) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        let activity = self
            .catalog
            .activity(id)
            .ok_or_else(|| CommandError::unknown("activity", id))?;
        let state = &mut self.state;
        let result = activities::perform(
            activity,
            ActivityTargets {
                clock: &state.clock,
                stats: &mut state.stats,
                actions: &mut state.actions,
                school: &mut state.school,
                relationships: &mut state.relationships,
                education: &mut state.education,
            },
        )?;

        self.note(&result.summary);
        self.note_tier_change(result.tier_change);
        let mut outcome = Outcome {
            message: result.summary,
            deltas: result.deltas,
            relationships: result.relationships,
            tier_change: result.tier_change,
            ..Outcome::default()
        };
        if result.chores_completed {
            outcome.milestones.push(Milestone::ChoresCompleted);
        }
        self.settle(&mut outcome);
        Ok(outcome)
    }

    /// Answer the school-day morning question.
    ///
    /// # Errors
    ///
    /// Returns `no_school_decision_pending` when no decision is due.
    pub fn decide_school(&mut self, attend: bool) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        if !self.state.school.decision_pending() {
            return Err(ValidationError::NoSchoolDecisionPending.into());
        }
        let free = self.config.free_day_actions;
        let (message, skip, tier_change) = if attend {
            self.state.school.attend();
            let change = self.state.education.attend_school();
            let cap = self.state.education.budget().actions;
            self.state.actions.reset_for_day(true, cap, free);
            ("You went to school.".to_string(), None, change)
        } else {
            let result = self.state.school.skip(
                &self.config.skip_odds,
                self.config.grounded_days,
                &mut self.rng,
            );
            let change = self.state.education.miss_school();
            let cap = self.state.education.budget().actions;
            self.state.actions.reset_for_day(false, cap, free);
            let message = match result {
                SkipOutcome::Safe => "You skipped school and got away with it.".to_string(),
                SkipOutcome::Detention => {
                    "You skipped school and got caught. Saturday detention!".to_string()
                }
                SkipOutcome::Grounded => format!(
                    "You skipped school and got caught. Grounded for {} days!",
                    self.config.grounded_days
                ),
            };
            (message, Some(result), change)
        };

        self.note(&message);
        self.note_tier_change(tier_change);
        let mut outcome = Outcome {
            message,
            tier_change,
            consequence: Some(Consequence::School { attended: attend, skip }),
            ..Outcome::default()
        };
        self.settle(&mut outcome);
        Ok(outcome)
    }

    /// Pick a choice on a pending event.
    ///
    /// # Errors
    ///
    /// Returns `unknown_id` when the event is not pending, and validation
    /// errors for bad indices, unmet requirements or unaffordable choices.
    pub fn resolve_event(
        &mut self,
        event_id: &str,
        choice: usize,
    ) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        let pending = self
            .state
            .events
            .get(event_id)
            .ok_or_else(|| CommandError::unknown("pending event", event_id))?;
        events::check_choice(pending, choice, &self.state.stats)?;
        let cost = pending.event.choices.get(choice).map_or(0, |c| c.cost);
        if !self.state.actions.can_afford(cost) {
            return Err(ValidationError::InsufficientActions {
                needed: cost,
                available: self.state.actions.available,
            }
            .into());
        }

        let pending = self
            .state
            .events
            .take(event_id)
            .ok_or_else(|| CommandError::unknown("pending event", event_id))?;
        self.state.actions.spend(cost);
        let state = &mut self.state;
        let result = events::choose_option(
            &pending,
            choice,
            ChoiceTargets {
                stats: &mut state.stats,
                relationships: &mut state.relationships,
                education: &mut state.education,
                day: state.clock.days_played,
            },
            &mut self.rng,
        )?;

        let tier_change = result.academic.as_ref().and_then(AcademicOutcome::tier_change);
        let message = format!("{}: {}", pending.event.title, result.result_text);
        self.note(&message);
        self.note_tier_change(tier_change);
        let mut outcome = Outcome {
            message,
            deltas: result.deltas,
            relationships: result.relationships,
            tier_change,
            consequence: result.academic.map(Consequence::Academic),
            ..Outcome::default()
        };
        self.settle(&mut outcome);
        Ok(outcome)
    }

    fn check_can_advance(&self) -> Result<(), CommandError> {
        self.ensure_running()?;
        if self.state.school.decision_pending() {
            return Err(ValidationError::SchoolDecisionRequired.into());
        }
        if self.state.clock.period.is_last() && self.state.school.chores_required() {
            return Err(ValidationError::ChoresRequired.into());
        }
        Ok(())
    }

    /// Move to the next period using the static event engine.
    ///
    /// # Errors
    ///
    /// Returns `school_decision_required` on a school-day morning before the
    /// attend/skip decision, `chores_required` when a grounded player tries to
    /// end the day without doing chores, and `game_over` after the end.
    pub fn advance_period(&mut self) -> Result<Outcome, CommandError> {
        self.check_can_advance()?;
        Ok(self.advance(None))
    }

    /// Move to the next period, letting `source` propose the period's event.
    /// Failed or malformed proposals fall back to the static engine.
    ///
    /// # Errors
    ///
    /// Same as [`Self::advance_period`]; the source is not consulted when the
    /// advance would be rejected.
    pub fn advance_period_with_source<S: EventSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<Outcome, CommandError> {
        self.check_can_advance()?;
        let ctx = self.generation_context();
        let generated = generate_or_fallback(source, &ctx);
        Ok(self.advance(generated))
    }

    /// Async variant of [`Self::advance_period_with_source`]. The source is
    /// awaited for at most `limit`; state only changes after it resolves.
    ///
    /// # Errors
    ///
    /// Same as [`Self::advance_period`].
    #[cfg(feature = "async")]
    pub async fn advance_period_async<S>(
        &mut self,
        source: &S,
        limit: std::time::Duration,
    ) -> Result<Outcome, CommandError>
    where
        S: crate::generator::AsyncEventSource + ?Sized,
    {
        self.check_can_advance()?;
        let ctx = self.generation_context();
        let generated = crate::generator::generate_with_timeout(source, &ctx, limit).await;
        Ok(self.advance(generated))
    }

    fn advance(&mut self, generated: Option<EventDef>) -> Outcome {
        let step = self.state.clock.advance_period();
        let mut outcome = Outcome {
            deltas: apply_passive_drift(&mut self.state.stats),
            ..Outcome::default()
        };
        if let Some(rollover) = step.rollover {
            self.roll_over_day(rollover, &mut outcome);
        }

        self.settle(&mut outcome);
        if outcome.ending.is_none() {
            self.queue_events(generated, &mut outcome);
        }

        let clock = &self.state.clock;
        outcome.message = format!("It's now {} {}.", clock.weekday_name(), clock.period);
        if self.state.school.decision_pending() && clock.period == Period::Morning {
            outcome.message.push_str(" Time to decide about school.");
        }
        outcome
    }

    fn roll_over_day(&mut self, rollover: DayRollover, outcome: &mut Outcome) {
        let free = self.config.free_day_actions;
        let state = &mut self.state;
        state.stats.set(StatId::Energy, STAT_MAX);
        state.inventory.reset_day();
        let is_school_day = state.clock.is_school_day();
        let school = state.school.advance_day(rollover.weekday, is_school_day);
        outcome.milestones.push(Milestone::NewDay {
            days_played: rollover.days_played,
            weekday: rollover.weekday,
        });

        let tier_cap = state.education.budget().actions;
        if is_school_day {
            // Budget is set once the school decision is made.
            state.actions.block();
        } else {
            state.actions.reset_for_day(false, tier_cap, free);
        }

        if school.grounding_lifted {
            outcome.milestones.push(Milestone::GroundingLifted);
            self.note("Your grounding is over.");
        }
        if school.detention_day {
            let actions = tier_cap.min(free);
            self.state.actions.cap(actions);
            outcome.milestones.push(Milestone::DetentionServed { actions });
            self.note("You spent the morning in Saturday detention.");
        }

        if rollover.weekday == self.config.allowance_weekday {
            if self.state.school.grounded {
                log::debug!("allowance withheld while grounded");
                outcome.milestones.push(Milestone::AllowanceWithheld);
                self.note("No allowance this week. You're grounded.");
            } else {
                let amount = self.state.education.budget().allowance;
                self.state.stats.modify(StatId::Money, amount);
                log::debug!("allowance paid: ${amount}");
                outcome.milestones.push(Milestone::AllowancePaid { amount });
                self.note(&format!("You received ${amount} allowance."));
            }
        }

        if rollover.birthday {
            self.state
                .stats
                .modify(StatId::Happiness, BIRTHDAY_HAPPINESS_BONUS);
            outcome.milestones.push(Milestone::Birthday { age: rollover.age });
            self.note(&format!("Happy birthday! You're now {}.", rollover.age));
        }
    }

    fn queue_events(&mut self, generated: Option<EventDef>, outcome: &mut Outcome) {
        let mut candidates: Vec<(EventDef, EventOrigin)> =
            events::forced_events(&self.catalog, &self.config.forced_triggers, &self.state.stats)
                .into_iter()
                .map(|event| (event.clone(), EventOrigin::Forced))
                .collect();

        if let Some(event) = generated {
            candidates.push((event, EventOrigin::Generated));
        } else {
            let ctx = EventContext {
                stats: &self.state.stats,
                is_school_day: self.state.clock.is_school_day(),
            };
            candidates.extend(
                events::draw_events(&self.catalog, &self.config, &ctx, &mut self.rng)
                    .into_iter()
                    .map(|event| (event.clone(), EventOrigin::Random)),
            );
        }

        let day = self.state.clock.days_played;
        for (event, origin) in candidates {
            let pending = events::prepare_pending(event, origin, day, &mut self.rng);
            let id = pending.id().to_string();
            if self.state.events.push(pending) {
                log::debug!("queued event '{id}' ({origin:?})");
                outcome.milestones.push(Milestone::EventQueued { id, origin });
            }
        }
    }

    /// Buy a shop entry.
    ///
    /// # Errors
    ///
    /// Returns `insufficient_funds`, `grounded`, `unknown_id` or `game_over`.
    pub fn buy_item(&mut self, shop_id: &str) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        let entry = self
            .catalog
            .shop_item(shop_id)
            .ok_or_else(|| CommandError::unknown("shop item", shop_id))?;
        let state = &mut self.state;
        let purchase = shop::buy(
            entry,
            &self.catalog,
            state.school.grounded,
            &mut state.stats,
            &mut state.inventory,
        )?;
        let message = format!("Bought {} for ${}.", purchase.name, purchase.price);
        self.note(&message);
        let mut outcome = Outcome {
            message,
            deltas: purchase.deltas.clone(),
            consequence: Some(Consequence::Purchase(purchase)),
            ..Outcome::default()
        };
        self.settle(&mut outcome);
        Ok(outcome)
    }

    /// Use an owned inventory item.
    ///
    /// # Errors
    ///
    /// Returns `item_not_owned`, `item_used_today`, `unknown_id` or `game_over`.
    pub fn use_item(&mut self, item_id: &str) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        let def = self
            .catalog
            .item(item_id)
            .ok_or_else(|| CommandError::unknown("item", item_id))?;
        let used = self.state.inventory.use_item(def, &mut self.state.stats)?;
        let message = format!("Used {}.", def.name);
        self.note(&message);
        let mut outcome = Outcome {
            message,
            deltas: used.deltas.clone(),
            consequence: Some(Consequence::ItemUsed(used)),
            ..Outcome::default()
        };
        self.settle(&mut outcome);
        Ok(outcome)
    }

    /// Sell one owned item back for half its value.
    ///
    /// # Errors
    ///
    /// Returns `item_not_owned`, `unknown_id` or `game_over`.
    pub fn sell_item(&mut self, item_id: &str) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        let def = self
            .catalog
            .item(item_id)
            .ok_or_else(|| CommandError::unknown("item", item_id))?;
        let sale = self.state.inventory.sell(def, &mut self.state.stats)?;
        let message = format!("Sold {} for ${}.", def.name, sale.price);
        self.note(&message);
        Ok(Outcome {
            message,
            consequence: Some(Consequence::ItemSold(sale)),
            ..Outcome::default()
        })
    }

    /// Progress counter for the chore minigame appropriate right now.
    #[must_use]
    pub const fn start_chores(&self) -> ChoreProgress {
        ChoreProgress::new(ChoreKind::for_grounding(self.state.school.grounded))
    }

    /// Finish a chore minigame. While grounded this settles the day's
    /// mandatory chores without spending actions; otherwise it runs the
    /// catalog chore activity, which costs actions and pays.
    ///
    /// # Errors
    ///
    /// Returns `chores_incomplete` when the counter is short (grounded players
    /// owe the longer punishment chore) plus any activity error.
    pub fn complete_chores_minigame(
        &mut self,
        progress: &ChoreProgress,
    ) -> Result<Outcome, CommandError> {
        self.ensure_running()?;
        let grounded = self.state.school.grounded;
        let required = if grounded {
            ChoreKind::Punishment.required_steps().max(progress.required)
        } else {
            progress.required
        };
        if progress.current < required {
            return Err(ValidationError::ChoresIncomplete {
                current: progress.current,
                required,
            }
            .into());
        }

        if grounded {
            self.state.school.complete_chores();
            let message = "You finished your punishment chores.".to_string();
            self.note(&message);
            let mut outcome = Outcome::with_message(message);
            outcome.milestones.push(Milestone::ChoresCompleted);
            return Ok(outcome);
        }

        let chore_id = self
            .catalog
            .activities
            .iter()
            .find(|activity| activity.kind == ActivityKind::Chore)
            .map(|activity| activity.id.clone())
            .ok_or_else(|| CommandError::unknown("activity", "chore"))?;
        self.perform_activity(&chore_id)
    }

    /// Serialize the current game.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Encode`] if serialization fails.
    pub fn save(&self) -> Result<String, PersistenceError> {
        let blob = save::encode(&self.state)?;
        log::debug!("saved game on day {}", self.state.clock.days_played);
        Ok(blob)
    }

    /// Replace the current game with a saved one. Returns `false` when the
    /// blob is from another save version; the current game is kept intact on
    /// any failure.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] for corrupt or unreadable blobs.
    pub fn load(&mut self, blob: &str) -> Result<bool, PersistenceError> {
        let Some(state) = save::decode(blob)? else {
            return Ok(false);
        };
        self.rng.reseed(state.resume_seed());
        self.state = state;
        Ok(true)
    }
}

/// Per-period passive stat drift.
fn apply_passive_drift(stats: &mut StatBoard) -> Vec<StatDelta> {
    let mut deltas = Vec::new();
    let mut shift = |stats: &mut StatBoard, stat: StatId, delta: i32| {
        deltas.push(StatDelta {
            stat,
            requested: delta,
            value: stats.modify(stat, delta),
        });
    };
    shift(stats, StatId::Energy, DRIFT_ENERGY_PER_PERIOD);
    if stats.happiness > DRIFT_HAPPINESS_DECAY_ABOVE {
        shift(stats, StatId::Happiness, DRIFT_HAPPINESS_DECAY);
    }
    if stats.health < STAT_MAX {
        shift(stats, StatId::Health, DRIFT_HEALTH_REGEN);
    }
    if stats.energy < DRIFT_LOW_ENERGY_THRESHOLD {
        shift(stats, StatId::Health, DRIFT_LOW_ENERGY_HEALTH_COST);
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedRolls;

    fn quiet_config() -> SimConfig {
        SimConfig {
            category_event_chance: 0.0,
            ..SimConfig::default()
        }
    }

    fn controller() -> SimulationController {
        let mut controller =
            SimulationController::new(quiet_config(), CatalogData::default_catalog().clone(), 1);
        controller.new_game("Jordan", Gender::Other, 1);
        controller
    }

    #[test]
    fn drift_follows_thresholds() {
        let mut stats = StatBoard::default();
        apply_passive_drift(&mut stats);
        assert_eq!((stats.energy, stats.happiness, stats.health), (95, 99, 100));

        stats.energy = 22;
        stats.happiness = 60;
        stats.health = 50;
        apply_passive_drift(&mut stats);
        assert_eq!((stats.energy, stats.happiness, stats.health), (17, 60, 49));
    }

    #[test]
    fn four_advances_roll_the_day_and_reset_energy() {
        let mut controller = controller();
        for _ in 0..3 {
            controller.advance_period().unwrap();
        }
        let outcome = controller.advance_period().unwrap();
        let state = controller.state();
        assert_eq!(state.clock.days_played, 1);
        assert_eq!(state.clock.weekday, 1);
        assert_eq!(state.stats.energy, 100);
        assert!(outcome.milestones.contains(&Milestone::NewDay {
            days_played: 1,
            weekday: 1
        }));
        assert!(state.school.decision_pending());
        assert_eq!(state.actions.available, 0);
    }

    #[test]
    fn undecided_school_mornings_hold_the_clock() {
        let mut controller = controller();
        for _ in 0..4 {
            controller.advance_period().unwrap();
        }
        let before = controller.state().clone();
        let mut source = crate::generator::CannedEventSource::new([Err("unused".to_string())]);
        for err in [
            controller.advance_period().unwrap_err(),
            controller.advance_period_with_source(&mut source).unwrap_err(),
        ] {
            assert_eq!(err.code(), "school_decision_required");
        }
        assert_eq!(controller.state(), &before);

        controller.decide_school(false).unwrap();
        controller.advance_period().unwrap();
        assert_eq!(controller.state().clock.period, Period::Afternoon);
        assert_eq!(controller.state().school.days_skipped, 1);
    }

    #[test]
    fn attending_school_sets_tier_budget() {
        let mut controller = controller();
        for _ in 0..4 {
            controller.advance_period().unwrap();
        }
        assert_eq!(
            controller.perform_activity("study_math").unwrap_err().code(),
            "school_decision_required"
        );
        let outcome = controller.decide_school(true).unwrap();
        assert_eq!(
            outcome.consequence,
            Some(Consequence::School {
                attended: true,
                skip: None
            })
        );
        // Every subject is 70.50: tier C.
        assert_eq!(controller.state().actions.available, 5);
        assert_eq!(
            controller.decide_school(true).unwrap_err().code(),
            "no_school_decision_pending"
        );
    }

    #[test]
    fn skipping_into_grounding_gates_the_night() {
        let catalog = CatalogData::default_catalog().clone();
        let rolls = ScriptedRolls::default().with_fallback(0.9);
        let mut controller = SimulationController::with_rng(quiet_config(), catalog, 5, rolls);
        for _ in 0..4 {
            controller.advance_period().unwrap();
        }
        let outcome = controller.decide_school(false).unwrap();
        assert_eq!(
            outcome.consequence,
            Some(Consequence::School {
                attended: false,
                skip: Some(SkipOutcome::Grounded)
            })
        );
        assert_eq!(controller.state().actions.available, 8);

        for _ in 0..3 {
            controller.advance_period().unwrap();
        }
        let before = controller.state().clock.clone();
        let err = controller.advance_period().unwrap_err();
        assert_eq!(err.code(), "chores_required");
        assert_eq!(controller.state().clock, before);

        controller.perform_activity("do_chores").unwrap();
        controller.advance_period().unwrap();
        assert_eq!(controller.state().school.grounded_days_remaining, 6);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut controller = controller();
        let err = controller.perform_activity("teleport").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnknownId {
                kind: "activity",
                id: "teleport".to_string()
            }
        );
        assert_eq!(controller.buy_item("yacht").unwrap_err().code(), "unknown_id");
    }

    #[test]
    fn game_over_freezes_commands_until_restart() {
        let mut controller = controller();
        controller.with_state_mut(|state| state.stats.happiness = 1);
        let outcome = controller.perform_activity("study_math").unwrap();
        assert_eq!(outcome.ending, Some(Ending::HappinessCollapse));
        assert!(controller.is_over());
        assert_eq!(
            controller.advance_period().unwrap_err(),
            CommandError::GameOver(Ending::HappinessCollapse)
        );
        controller.new_game("Jordan", Gender::Other, 2);
        assert!(!controller.is_over());
        assert!(controller.perform_activity("study_math").is_ok());
    }

    #[test]
    fn low_stats_queue_forced_events_without_blocking() {
        let mut controller = controller();
        controller.with_state_mut(|state| state.stats.happiness = 20);
        let outcome = controller.advance_period().unwrap();
        assert!(outcome.milestones.contains(&Milestone::EventQueued {
            id: "personal_stress".to_string(),
            origin: EventOrigin::Forced
        }));
        // Still pending; the clock keeps moving.
        controller.advance_period().unwrap();
        assert_eq!(controller.pending_events().len(), 1);

        let resolved = controller.resolve_event("personal_stress", 0).unwrap();
        assert_eq!(
            resolved.message,
            "Feeling Overwhelmed: Rest and self-care work wonders!"
        );
        assert!(controller.pending_events().is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut controller = controller();
        controller.perform_activity("study_math").unwrap();
        controller.advance_period().unwrap();
        let blob = controller.save().unwrap();
        let snapshot = controller.state().clone();

        controller.perform_activity("video_games").unwrap();
        assert!(controller.load(&blob).unwrap());
        assert_eq!(controller.state(), &snapshot);

        assert!(controller.load("{\"version\": 1}").is_ok_and(|loaded| !loaded));
        assert!(controller.load("garbage").is_err());
        assert_eq!(controller.state(), &snapshot);
    }

    #[test]
    fn shop_and_inventory_commands() {
        let mut controller = controller();
        let err = controller.buy_item("video_game").unwrap_err();
        assert_eq!(err.to_string(), "not enough money (need $60, have $0)");

        controller.with_state_mut(|state| state.stats.money = 100);
        let outcome = controller.buy_item("energy_drink").unwrap();
        assert!(matches!(outcome.consequence, Some(Consequence::Purchase(_))));
        assert_eq!(controller.state().actions.available, 8, "shopping is free");
        controller.use_item("energy_drink").unwrap();
        assert_eq!(
            controller.use_item("energy_drink").unwrap_err().code(),
            "item_not_owned"
        );
    }

    #[test]
    fn chores_minigame_requires_full_progress() {
        let mut controller = controller();
        let mut progress = controller.start_chores();
        assert_eq!(progress.kind, ChoreKind::Earning);
        progress.step();
        assert_eq!(
            controller.complete_chores_minigame(&progress).unwrap_err().code(),
            "chores_incomplete"
        );
        while !progress.step() {}
        controller.complete_chores_minigame(&progress).unwrap();
        assert_eq!(controller.state().stats.money, 10);
    }

    #[test]
    fn generated_events_replace_random_draws() {
        let mut controller = controller();
        let mut source = crate::generator::CannedEventSource::new([
            Ok(r#"{"title": "Surprise Visit", "category": "family", "choices": [
                {"text": "Hug", "result_text": "Aw."},
                {"text": "Hide", "result_text": "Awkward."}]}"#
                .to_string()),
            Err("offline".to_string()),
        ]);
        let outcome = controller.advance_period_with_source(&mut source).unwrap();
        assert!(outcome.milestones.iter().any(|m| matches!(
            m,
            Milestone::EventQueued {
                origin: EventOrigin::Generated,
                ..
            }
        )));
        let outcome = controller.advance_period_with_source(&mut source).unwrap();
        assert!(
            !outcome
                .milestones
                .iter()
                .any(|m| matches!(m, Milestone::EventQueued { .. }))
        );
    }
}
