use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use teenlife_game::{
    CommandError, Consequence, Ending, EventOrigin, GameEngine, GameState, Gender, Milestone,
    Outcome, PendingEvent, SimulationController, SkipOutcome, StaticDataLoader, Tier,
};

use super::generated::{FlakyEventSource, GENERATION_TIMEOUT};
use super::policy::{GameplayStrategy, PlayerPolicy};
use crate::storage::FileStorage;

pub const DEFAULT_MAX_DAYS: u32 = 30;
/// Enough days to age out from the default starting age.
pub const FULL_LIFE_DAY_CAP: u32 = 2_600;
/// Guard against zero-cost activities being chained forever.
const MAX_ACTIVITIES_PER_PERIOD: usize = 4;
const ROUND_TRIP_EVERY_DAYS: u32 = 7;

#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_days: Option<u32>,
    pub setup: Option<fn(&mut GameState)>,
    /// Ask the flaky generator for each night's event.
    pub generated_events: bool,
    /// Save, reload and compare the game every week.
    pub persistence: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_days: None,
            setup: None,
            generated_events: false,
            persistence: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_max_days(mut self, max_days: u32) -> Self {
        self.max_days = Some(max_days);
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: fn(&mut GameState)) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub const fn with_generated_events(mut self, enabled: bool) -> Self {
        self.generated_events = enabled;
        self
    }

    #[must_use]
    pub const fn with_persistence(mut self) -> Self {
        self.persistence = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// One resolved event, kept for failure reports.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub day: u32,
    pub event_id: String,
    pub event_title: String,
    pub choice_index: usize,
    pub choice_text: String,
    pub policy_name: &'static str,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationMetrics {
    pub days_played: u32,
    pub activities: u32,
    pub rejected_commands: u32,
    pub school_attended: u32,
    pub school_skipped: u32,
    pub times_grounded: u32,
    pub detentions_served: u32,
    pub chores_completed: u32,
    pub events_resolved: u32,
    pub generated_events: u32,
    pub allowance_total: i32,
    pub tier_changes: u32,
    pub birthdays: u32,
    pub save_round_trips: u32,
    pub save_mismatches: u32,
    pub decision_log: Vec<DecisionRecord>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub metrics: SimulationMetrics,
    pub final_state: GameState,
    pub final_tier: Tier,
    pub ending: Option<Ending>,
    pub generation_requests: u32,
}

impl SimulationSummary {
    #[must_use]
    pub fn ending_label(&self) -> &'static str {
        self.ending.map_or("in progress", Ending::as_str)
    }
}

/// Headless deterministic runner driving a controller with a policy.
#[derive(Debug, Clone)]
pub struct GameTester {
    verbose: bool,
    save_root: Option<PathBuf>,
}

impl GameTester {
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self {
            verbose,
            save_root: None,
        }
    }

    #[must_use]
    pub fn with_save_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_root = Some(dir.into());
        self
    }

    fn storage_for(&self, seed: u64) -> FileStorage {
        match &self.save_root {
            Some(dir) => FileStorage::new(dir.join(seed.to_string())),
            None => FileStorage::in_temp_dir(&format!("{}-{seed}", std::process::id())),
        }
    }

    /// Play `plan` from a fresh game until it ends or hits its day cap.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot start a game, a save cannot be
    /// written, or the run gets stuck on a rejected period advance.
    pub async fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let engine = GameEngine::new(StaticDataLoader, self.storage_for(seed));
        let mut game = engine.create_game(&format!("Tester {seed}"), Gender::Other, seed)?;
        if let Some(setup) = plan.setup {
            game.with_state_mut(setup);
        }

        let mut session = Session {
            game,
            policy: plan.strategy.create_policy(seed),
            source: plan.generated_events.then(|| FlakyEventSource::new(seed)),
            metrics: SimulationMetrics::default(),
            verbose: self.verbose,
        };

        let max_days = plan.max_days.unwrap_or(DEFAULT_MAX_DAYS);
        while !session.game.is_over() && session.game.state().clock.days_played < max_days {
            let new_day = session.play_period().await?;
            let day = session.game.state().clock.days_played;
            if plan.persistence && new_day && day % ROUND_TRIP_EVERY_DAYS == 0 {
                check_round_trip(&engine, &session.game, seed, &mut session.metrics)?;
            }
        }

        let Session {
            game,
            source,
            mut metrics,
            ..
        } = session;
        metrics.days_played = game.state().clock.days_played;
        if self.verbose {
            println!(
                "🏁 {} seed {seed}: {} days, tier {}, {}",
                plan.strategy,
                metrics.days_played,
                game.tier(),
                game.state().ending.map_or("still playing", Ending::headline)
            );
        }
        Ok(SimulationSummary {
            seed,
            strategy: plan.strategy,
            final_tier: game.tier(),
            ending: game.state().ending,
            generation_requests: source.as_ref().map_or(0, FlakyEventSource::issued),
            final_state: game.state().clone(),
            metrics,
        })
    }
}

/// Save `game`, load it into a fresh controller and compare.
fn check_round_trip(
    engine: &GameEngine<StaticDataLoader, FileStorage>,
    game: &SimulationController,
    seed: u64,
    metrics: &mut SimulationMetrics,
) -> Result<()> {
    let slot = format!("seed-{seed}-day-{}", game.state().clock.days_played);
    engine.save_game(&slot, game)?;
    let mut restored = engine.create_game("Restore", Gender::Other, seed)?;
    let loaded = engine.load_game(&slot, &mut restored)?;
    engine
        .delete_save(&slot)
        .with_context(|| format!("removing save slot '{slot}'"))?;

    if loaded && restored.state() == game.state() {
        metrics.save_round_trips += 1;
    } else {
        log::warn!("save slot '{slot}' did not restore the same game (loaded: {loaded})");
        metrics.save_mismatches += 1;
    }
    Ok(())
}

struct Session {
    game: SimulationController,
    policy: Box<dyn PlayerPolicy + Send>,
    source: Option<FlakyEventSource>,
    metrics: SimulationMetrics,
    verbose: bool,
}

impl Session {
    /// Play out the current period and advance. Returns whether a new day began.
    async fn play_period(&mut self) -> Result<bool> {
        self.decide_school();
        self.resolve_events();
        self.pick_activities();
        if self.game.is_over() {
            return Ok(false);
        }
        self.settle_chores();

        let last_period = self.game.state().clock.period.is_last();
        let advanced = match &self.source {
            Some(source) if last_period => {
                self.game
                    .advance_period_async(source, GENERATION_TIMEOUT)
                    .await
            }
            _ => self.game.advance_period(),
        };
        match advanced {
            Ok(outcome) => {
                self.record(&outcome);
                Ok(outcome
                    .milestones
                    .iter()
                    .any(|m| matches!(m, Milestone::NewDay { .. })))
            }
            Err(err) => {
                self.metrics.rejected_commands += 1;
                let clock = &self.game.state().clock;
                bail!(
                    "advance rejected on day {} ({}): {err}",
                    clock.days_played,
                    clock.period
                )
            }
        }
    }

    fn decide_school(&mut self) {
        if self.game.is_over() || !self.game.state().school.decision_pending() {
            return;
        }
        let attend = self.policy.attend_school(self.game.state());
        match self.game.decide_school(attend) {
            Ok(outcome) => self.record(&outcome),
            Err(err) => self.reject("school", &err),
        }
    }

    fn resolve_events(&mut self) {
        let pending: Vec<PendingEvent> = self.game.pending_events().into_iter().cloned().collect();
        for event in pending {
            if self.game.is_over() {
                return;
            }
            let decision = self.policy.pick_choice(self.game.state(), &event);
            // The preferred choice first, then anything that is affordable.
            let order = std::iter::once(decision.choice_index).chain(
                (0..event.event.choices.len()).filter(|index| *index != decision.choice_index),
            );
            for index in order {
                match self.game.resolve_event(event.id(), index) {
                    Ok(outcome) => {
                        self.metrics.events_resolved += 1;
                        self.metrics.decision_log.push(DecisionRecord {
                            day: self.game.state().clock.days_played,
                            event_id: event.id().to_string(),
                            event_title: event.event.title.clone(),
                            choice_index: index,
                            choice_text: event
                                .event
                                .choices
                                .get(index)
                                .map(|choice| choice.text.clone())
                                .unwrap_or_default(),
                            policy_name: self.policy.name(),
                            rationale: decision.rationale.clone(),
                        });
                        self.record(&outcome);
                        break;
                    }
                    Err(err) => self.reject(event.id(), &err),
                }
            }
        }
    }

    fn pick_activities(&mut self) {
        for _ in 0..MAX_ACTIVITIES_PER_PERIOD {
            if self.game.is_over() {
                return;
            }
            let picked = {
                let available = self.game.available_activities();
                self.policy
                    .pick_activity(self.game.state(), &available)
                    .map(|activity| activity.id.clone())
            };
            let Some(id) = picked else {
                return;
            };
            match self.game.perform_activity(&id) {
                Ok(outcome) => {
                    self.metrics.activities += 1;
                    self.record(&outcome);
                }
                Err(err) => {
                    self.reject(&id, &err);
                    return;
                }
            }
        }
    }

    /// Grounded nights require the punishment chores before the day ends.
    fn settle_chores(&mut self) {
        let state = self.game.state();
        if !(state.clock.period.is_last() && state.school.chores_required()) {
            return;
        }
        let mut progress = self.game.start_chores();
        while !progress.step() {}
        match self.game.complete_chores_minigame(&progress) {
            Ok(outcome) => self.record(&outcome),
            Err(err) => self.reject("chores", &err),
        }
    }

    fn reject(&mut self, what: &str, err: &CommandError) {
        self.metrics.rejected_commands += 1;
        log::debug!("{what} rejected: {} ({err})", err.code());
    }

    fn record(&mut self, outcome: &Outcome) {
        let metrics = &mut self.metrics;
        if outcome.tier_change.is_some() {
            metrics.tier_changes += 1;
        }
        if let Some(Consequence::School { attended, skip }) = &outcome.consequence {
            if *attended {
                metrics.school_attended += 1;
            } else {
                metrics.school_skipped += 1;
            }
            if *skip == Some(SkipOutcome::Grounded) {
                metrics.times_grounded += 1;
            }
        }
        for milestone in &outcome.milestones {
            match milestone {
                Milestone::Birthday { age } => {
                    metrics.birthdays += 1;
                    if self.verbose {
                        println!("  🎂 turned {age}");
                    }
                }
                Milestone::DetentionServed { .. } => metrics.detentions_served += 1,
                Milestone::AllowancePaid { amount } => metrics.allowance_total += amount,
                Milestone::ChoresCompleted => metrics.chores_completed += 1,
                Milestone::EventQueued {
                    origin: EventOrigin::Generated,
                    ..
                } => metrics.generated_events += 1,
                _ => {}
            }
        }
        if let Some(ending) = outcome.ending {
            log::info!("game ended: {ending}");
        }
    }
}
