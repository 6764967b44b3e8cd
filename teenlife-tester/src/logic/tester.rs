use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::seeds::SeedInfo;
use super::simulation::{GameTester, SimulationPlan, SimulationSummary};
use crate::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    runner: GameTester,
}

impl LogicTester {
    #[must_use]
    pub const fn new(runner: GameTester, verbose: bool) -> Self {
        Self { verbose, runner }
    }

    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::with_capacity(seeds.len());
        for seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    seed.label()
                );
            }
            results.push(self.run_single_scenario(scenario, seed, iterations).await);
        }
        results
    }

    async fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let verdict = match self.runner.run_plan(&scenario.plan, iteration_seed).await {
                Ok(summary) => evaluate_expectations(&scenario.plan, &summary)
                    .map(|err| (err, Some(summary))),
                Err(err) => Some((format!("{err:#}"), None)),
            };

            match verdict {
                Some((err, summary)) => {
                    let strategy = scenario.plan.strategy;
                    let detail = summary.as_ref().map_or_else(
                        || format!("{strategy}, seed {iteration_seed}, run aborted"),
                        describe_failure,
                    );
                    failures.push(format!("Iteration {}: {err} | {detail}", i + 1));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            err.red()
                        );
                    }
                }
                None => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?})",
                            i + 1,
                            iterations
                        );
                    }
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed: seed.label(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    plan.expectations
        .iter()
        .find_map(|expectation| expectation.evaluate(summary).err())
        .map(|err| err.to_string())
}

fn describe_failure(summary: &SimulationSummary) -> String {
    let stats = &summary.final_state.stats;
    let recent = summary
        .metrics
        .decision_log
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            format!(
                "day {} {} -> '{}' [{}] {}",
                entry.day,
                entry.event_id,
                entry.choice_text,
                entry.policy_name,
                entry.rationale.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>();
    let decisions = if recent.is_empty() {
        "no decisions recorded".to_string()
    } else {
        recent.join(" | ")
    };
    format!(
        "{}, seed {}, days {} tier {} ending {} | health {} happiness {} money ${} | {decisions}",
        summary.strategy,
        summary.seed,
        summary.metrics.days_played,
        summary.final_tier,
        summary.ending_label(),
        stats.health,
        stats.happiness,
        stats.money
    )
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        durations
            .iter()
            .map(Duration::as_millis)
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec::<u64>::deserialize(deserializer)?
            .into_iter()
            .map(Duration::from_millis)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameplayStrategy;
    use anyhow::bail;

    #[tokio::test]
    async fn failing_expectations_are_reported_per_iteration() {
        let scenario = TestScenario::simulation(
            "impossible",
            SimulationPlan::new(GameplayStrategy::Balanced)
                .with_max_days(2)
                .with_expectation(|_: &SimulationSummary| -> anyhow::Result<()> {
                    bail!("always fails")
                }),
        );
        let tester = LogicTester::new(GameTester::new(false), false);
        let results = tester
            .run_scenario(&scenario, &[SeedInfo::from_numeric(5)], 2)
            .await;
        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 0);
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("always fails"));
        assert!(result.failures[0].contains("seed 5"));
        assert!(result.failures[1].contains("seed 6"));
    }

    #[test]
    fn durations_serialize_as_millis() {
        let result = ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: "1".to_string(),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_millis(12),
            performance_data: vec![Duration::from_millis(12)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 12);
        assert_eq!(json["performance_data"][0], 12);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.average_duration, result.average_duration);
    }
}
