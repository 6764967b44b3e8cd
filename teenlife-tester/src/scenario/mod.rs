//! Named simulation scenarios runnable from the command line.
use anyhow::{Result, ensure};

use crate::logic::{FULL_LIFE_DAY_CAP, GameplayStrategy, SimulationPlan, SimulationSummary};
use teenlife_game::{GameState, SubjectId, Tier};

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            description: "",
            plan,
        }
    }

    #[must_use]
    pub const fn described(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

fn ran_full_days(summary: &SimulationSummary, days: u32) -> Result<()> {
    ensure!(
        summary.metrics.days_played == days,
        "expected {days} days, played {}",
        summary.metrics.days_played
    );
    Ok(())
}

fn smoke() -> TestScenario {
    TestScenario::simulation(
        "smoke",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_days(7)
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(summary.ending.is_none(), "ended early: {}", summary.ending_label());
                ran_full_days(summary, 7)
            })
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(summary.metrics.activities > 0, "no activities performed");
                ensure!(
                    summary.metrics.allowance_total > 0,
                    "no allowance paid in a full week"
                );
                Ok(())
            }),
    )
    .described("A balanced first week")
}

fn honor_roll() -> TestScenario {
    TestScenario::simulation(
        "honor-roll",
        SimulationPlan::new(GameplayStrategy::Studious)
            .with_max_days(120)
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(
                    matches!(summary.final_tier, Tier::A | Tier::B),
                    "studious play finished in tier {}",
                    summary.final_tier
                );
                Ok(())
            })
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(summary.metrics.school_skipped == 0, "studious player skipped");
                ensure!(summary.metrics.times_grounded == 0, "studious player grounded");
                Ok(())
            }),
    )
    .described("Studying every day earns a top tier")
}

fn truancy() -> TestScenario {
    TestScenario::simulation(
        "truancy",
        SimulationPlan::new(GameplayStrategy::Truant)
            .with_max_days(60)
            .with_expectation(|summary: &SimulationSummary| {
                let metrics = &summary.metrics;
                ensure!(metrics.school_skipped > 0, "truant never skipped");
                ensure!(metrics.school_attended == 0, "truant attended school");
                ensure!(metrics.times_grounded > 0, "sixty days of skipping without grounding");
                ensure!(metrics.chores_completed > 0, "grounded nights without chores");
                Ok(())
            })
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(
                    matches!(summary.final_tier, Tier::D | Tier::F),
                    "skipping school left tier {}",
                    summary.final_tier
                );
                Ok(())
            }),
    )
    .described("Skipping school leads to grounding and falling grades")
}

fn failing_grades(state: &mut GameState) {
    for subject in SubjectId::ALL {
        state.education.set_grade(*subject, 55.0);
    }
    state.education.recompute();
}

fn comeback() -> TestScenario {
    TestScenario::simulation(
        "comeback",
        SimulationPlan::new(GameplayStrategy::Studious)
            .with_max_days(60)
            .with_setup(failing_grades)
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(
                    summary.final_tier.rank() >= Tier::C.rank(),
                    "still in tier {} after two months of study",
                    summary.final_tier
                );
                ensure!(summary.metrics.tier_changes > 0, "tier never moved");
                Ok(())
            }),
    )
    .described("A failing student studies back up to passing")
}

fn full_life() -> TestScenario {
    TestScenario::simulation(
        "full-life",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_days(FULL_LIFE_DAY_CAP)
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(
                    summary.ending.is_some(),
                    "no ending after {} days",
                    summary.metrics.days_played
                );
                ensure!(summary.metrics.birthdays > 0, "no birthdays recorded");
                Ok(())
            }),
    )
    .described("Play until the life ends")
}

fn save_roundtrip() -> TestScenario {
    TestScenario::simulation(
        "save-roundtrip",
        SimulationPlan::new(GameplayStrategy::Random)
            .with_max_days(30)
            .with_persistence()
            .with_expectation(|summary: &SimulationSummary| {
                ensure!(
                    summary.metrics.save_mismatches == 0,
                    "{} saves restored a different game",
                    summary.metrics.save_mismatches
                );
                ensure!(summary.metrics.save_round_trips > 0, "no saves were checked");
                Ok(())
            }),
    )
    .described("Weekly saves reload into identical games")
}

fn generated_events() -> TestScenario {
    TestScenario::simulation(
        "generated-events",
        SimulationPlan::new(GameplayStrategy::Balanced)
            .with_max_days(30)
            .with_generated_events(true)
            .with_expectation(|summary: &SimulationSummary| {
                if summary.ending.is_none() {
                    ran_full_days(summary, 30)?;
                }
                ensure!(
                    summary.generation_requests == summary.metrics.days_played,
                    "{} generation requests over {} days",
                    summary.generation_requests,
                    summary.metrics.days_played
                );
                Ok(())
            }),
    )
    .described("An unreliable event generator never stalls play")
}

/// Every registered scenario, in run order.
#[must_use]
pub fn catalog() -> Vec<TestScenario> {
    vec![
        smoke(),
        honor_roll(),
        truancy(),
        comeback(),
        full_life(),
        save_roundtrip(),
        generated_events(),
    ]
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let wanted = name.to_lowercase();
    catalog().into_iter().find(|scenario| scenario.name == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_lookup_ignores_case() {
        let names: Vec<String> = catalog().into_iter().map(|s| s.name).collect();
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(names.len(), deduped.len());
        assert!(get_scenario("SMOKE").is_some());
        assert!(get_scenario("missing").is_none());
    }

    #[test]
    fn every_scenario_checks_something() {
        for scenario in catalog() {
            assert!(!scenario.plan.expectations.is_empty(), "{}", scenario.name);
            assert!(!scenario.description.is_empty(), "{}", scenario.name);
        }
    }
}
