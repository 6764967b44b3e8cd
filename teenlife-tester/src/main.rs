mod logic;
mod scenario;
mod storage;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{GameTester, LogicTester, ScenarioResult, resolve_seed_inputs};
use scenario::{TestScenario, catalog, get_scenario};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "teenlife-tester", version)]
#[command(about = "Automated headless play-testing for the Teen Life simulation")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers, 0x hex, or words)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 3)]
    iterations: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Override every scenario's day cap
    #[arg(long)]
    max_days: Option<u32>,

    /// Route each night's event through the unreliable generator
    #[arg(long)]
    generated_events: bool,

    /// Directory for persistence checks (defaults to the temp dir)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        return list_scenarios(&args);
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;

    let mut runner = GameTester::new(args.verbose);
    if let Some(dir) = &args.save_dir {
        runner = runner.with_save_root(dir);
    }
    let tester = LogicTester::new(runner, args.verbose);

    let mut results = Vec::new();
    for scenario in &scenarios {
        results.extend(tester.run_scenario(scenario, &seeds, args.iterations).await);
    }

    write_report(&args, &results, start_time)?;

    if results.iter().any(|result| !result.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "🎮 Teen Life Automated Tester".bright_cyan().bold());
    println!("{}", "==============================".cyan());
}

fn list_scenarios(args: &Args) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target, "Available scenarios:")?;
    for scenario in catalog() {
        writeln!(
            output_target,
            "  {:20} - {}",
            scenario.name, scenario.description
        )?;
    }
    output_target.flush()?;
    Ok(())
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn expand_scenarios(args: &Args) -> Result<Vec<TestScenario>> {
    let names = split_csv(&args.scenarios);
    let mut scenarios = if names.iter().any(|name| name.eq_ignore_ascii_case("all")) {
        catalog()
    } else {
        let mut picked = Vec::with_capacity(names.len());
        for name in &names {
            let Some(scenario) = get_scenario(name) else {
                bail!("Unknown scenario '{name}'. Use --list-scenarios to see options.");
            };
            picked.push(scenario);
        }
        picked
    };

    for scenario in &mut scenarios {
        if let Some(days) = args.max_days {
            scenario.plan.max_days = Some(days);
        }
        if args.generated_events {
            scenario.plan.generated_events = true;
        }
    }
    Ok(scenarios)
}

fn write_report(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, results)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, results)?;
        }
        ReportFormat::Console => logic::reports::generate_console_report(
            &mut output_target,
            results,
            start_time.elapsed(),
        )?,
    }
    output_target.flush()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Stdout(writer) => writer.write(buf),
            Self::File(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(writer) => writer.flush(),
            Self::File(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("teenlife-tester").chain(extra.iter().copied()))
    }

    #[test]
    fn csv_tokens_are_trimmed() {
        assert_eq!(split_csv(" smoke, truancy ,,"), vec!["smoke", "truancy"]);
    }

    #[test]
    fn all_expands_and_overrides_apply() {
        let parsed = args(&["--scenarios", "all", "--max-days", "3", "--generated-events"]);
        let scenarios = expand_scenarios(&parsed).unwrap();
        assert_eq!(scenarios.len(), catalog().len());
        assert!(
            scenarios
                .iter()
                .all(|s| s.plan.max_days == Some(3) && s.plan.generated_events)
        );
    }

    #[test]
    fn unknown_scenarios_are_rejected() {
        let parsed = args(&["--scenarios", "smoke,prom-night"]);
        let err = expand_scenarios(&parsed).unwrap_err();
        assert!(err.to_string().contains("prom-night"));
    }
}
