use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use teenlife_game::{ActivityDef, ActivityKind, Choice, GameState, PendingEvent, StatId};

/// Decision returned by a [`PlayerPolicy`] for a pending event.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub choice_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(choice_index: usize, rationale: Option<String>) -> Self {
        Self {
            choice_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Answer the school-day morning question.
    fn attend_school(&mut self, state: &GameState) -> bool;

    /// Pick the next activity, or `None` to let the period pass.
    fn pick_activity<'a>(
        &mut self,
        state: &GameState,
        available: &[&'a ActivityDef],
    ) -> Option<&'a ActivityDef>;

    /// Select a choice for a pending event.
    fn pick_choice(&mut self, state: &GameState, event: &PendingEvent) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Studious,
    Truant,
    Balanced,
    Random,
}

impl GameplayStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Studious => "studious",
            Self::Truant => "truant",
            Self::Balanced => "balanced",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Studious => Box::new(StudiousPolicy),
            Self::Truant => Box::new(TruantPolicy),
            Self::Balanced => Box::new(BalancedPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct StudiousPolicy;
struct TruantPolicy;
struct BalancedPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5EED_0F_7EE7),
        }
    }
}

fn is_study(activity: &ActivityDef) -> bool {
    matches!(activity.kind, ActivityKind::Study(_))
}

/// Sum of the stats a policy cares about, weighted.
fn weighted_gain(effects: impl Iterator<Item = (StatId, i32)>, weights: &[(StatId, i32)]) -> i32 {
    effects
        .map(|(stat, delta)| {
            weights
                .iter()
                .find(|(weighted, _)| *weighted == stat)
                .map_or(0, |(_, weight)| weight * delta)
        })
        .sum()
}

fn best_activity<'a>(
    available: &[&'a ActivityDef],
    weights: &[(StatId, i32)],
    filter: impl Fn(&ActivityDef) -> bool,
) -> Option<&'a ActivityDef> {
    available
        .iter()
        .copied()
        .filter(|activity| filter(activity))
        .max_by_key(|activity| weighted_gain(activity.effects.iter(), weights))
}

/// The choice with the highest weighted payoff among those whose
/// requirements are met.
fn best_choice(state: &GameState, event: &PendingEvent, weights: &[(StatId, i32)]) -> usize {
    event
        .event
        .choices
        .iter()
        .enumerate()
        .filter(|(_, choice)| choice.requirements.is_met(&state.stats))
        .max_by_key(|(_, choice)| weighted_gain(choice.effects.iter(), weights))
        .map_or(0, |(index, _)| index)
}

/// Recovery activity when a run is close to collapsing.
fn recover<'a>(state: &GameState, available: &[&'a ActivityDef]) -> Option<&'a ActivityDef> {
    let stats = &state.stats;
    if stats.energy < 35 || stats.health < 50 {
        return best_activity(
            available,
            &[(StatId::Energy, 2), (StatId::Health, 3)],
            |a| a.effects.get(StatId::Energy) >= 0 && a.effects.get(StatId::Health) >= 0,
        );
    }
    if stats.happiness < 50 {
        return best_activity(
            available,
            &[(StatId::Happiness, 3), (StatId::Energy, 1)],
            |a| a.effects.get(StatId::Happiness) > 0 && a.effects.get(StatId::Money) >= 0,
        );
    }
    None
}

const WELLBEING: &[(StatId, i32)] = &[
    (StatId::Happiness, 3),
    (StatId::Health, 3),
    (StatId::Energy, 1),
];

impl PlayerPolicy for StudiousPolicy {
    fn name(&self) -> &'static str {
        "studious"
    }

    fn attend_school(&mut self, _state: &GameState) -> bool {
        true
    }

    fn pick_activity<'a>(
        &mut self,
        state: &GameState,
        available: &[&'a ActivityDef],
    ) -> Option<&'a ActivityDef> {
        if let Some(activity) = recover(state, available) {
            return Some(activity);
        }
        // Study the weakest subject first.
        available
            .iter()
            .copied()
            .filter_map(|activity| match activity.kind {
                ActivityKind::Study(subject) => Some((activity, subject)),
                _ => None,
            })
            .min_by_key(|(_, subject)| state.education.grade_points(*subject))
            .map(|(activity, _)| activity)
    }

    fn pick_choice(&mut self, state: &GameState, event: &PendingEvent) -> PolicyDecision {
        let index = best_choice(
            state,
            event,
            &[(StatId::Intelligence, 3), (StatId::Happiness, 1), (StatId::Health, 1)],
        );
        PolicyDecision::new(index, Some("favours intelligence".to_string()))
    }
}

impl PlayerPolicy for TruantPolicy {
    fn name(&self) -> &'static str {
        "truant"
    }

    fn attend_school(&mut self, _state: &GameState) -> bool {
        false
    }

    fn pick_activity<'a>(
        &mut self,
        state: &GameState,
        available: &[&'a ActivityDef],
    ) -> Option<&'a ActivityDef> {
        if let Some(activity) = recover(state, available) {
            return Some(activity);
        }
        best_activity(
            available,
            &[(StatId::Happiness, 2), (StatId::Social, 1)],
            |a| !is_study(a) && a.effects.get(StatId::Happiness) > 0,
        )
    }

    fn pick_choice(&mut self, state: &GameState, event: &PendingEvent) -> PolicyDecision {
        let index = best_choice(state, event, &[(StatId::Happiness, 2), (StatId::Social, 1)]);
        PolicyDecision::new(index, Some("chases fun".to_string()))
    }
}

impl PlayerPolicy for BalancedPolicy {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn attend_school(&mut self, _state: &GameState) -> bool {
        true
    }

    fn pick_activity<'a>(
        &mut self,
        state: &GameState,
        available: &[&'a ActivityDef],
    ) -> Option<&'a ActivityDef> {
        if let Some(activity) = recover(state, available) {
            return Some(activity);
        }
        if state.stats.energy < 60 {
            return None;
        }
        let lowest = state.education.lowest_grade();
        if lowest < 85.0 {
            return available
                .iter()
                .copied()
                .filter(|activity| is_study(activity))
                .max_by_key(|activity| activity.effects.get(StatId::Happiness));
        }
        best_activity(available, WELLBEING, |a| {
            a.effects.get(StatId::Money) >= 0 && a.effects.get(StatId::Happiness) > 0
        })
    }

    fn pick_choice(&mut self, state: &GameState, event: &PendingEvent) -> PolicyDecision {
        let index = best_choice(state, event, WELLBEING);
        PolicyDecision::new(index, None)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn attend_school(&mut self, _state: &GameState) -> bool {
        self.rng.gen_bool(0.7)
    }

    fn pick_activity<'a>(
        &mut self,
        _state: &GameState,
        available: &[&'a ActivityDef],
    ) -> Option<&'a ActivityDef> {
        if available.is_empty() || self.rng.gen_bool(0.25) {
            return None;
        }
        available.get(self.rng.gen_range(0..available.len())).copied()
    }

    fn pick_choice(&mut self, state: &GameState, event: &PendingEvent) -> PolicyDecision {
        let open: Vec<(usize, &Choice)> = event
            .event
            .choices
            .iter()
            .enumerate()
            .filter(|(_, choice)| choice.requirements.is_met(&state.stats))
            .collect();
        let index = if open.is_empty() {
            0
        } else {
            open[self.rng.gen_range(0..open.len())].0
        };
        PolicyDecision::new(index, Some("coin flip".to_string()))
    }
}
