//! shor-period CLI: factor N = 15 by simulated phase estimation.
//!
//! Modes:
//!   (default)                 One controller run, one line per trial
//!   --survey=<runs>           Many seeded runs per base, success statistics
//!
//! Options:
//!   --base=<a>                Base whose order is estimated (default: 13)
//!   --modulus=<N>             Composite to factor (default: 15)
//!   --precision=<n>           Phase register width in bits (default: 8)
//!   --semiclassical           Shorthand for --precision=3
//!   --max-trials=<k>          Trial budget (default: 100)
//!   --unbounded               No trial budget: retry until a factor is found
//!   --timeout-ms=<ms>         Wall-clock budget
//!   --seed=<s>                Seed the simulated oracle
//!   --readouts=<b1,b2,...>    Replay recorded register readouts instead of
//!                             simulating; precision defaults to their width
//!   --all-bases               Survey every supported base
//!   --config=<file.json>      Load a ShorConfig; flags above override it
//!   --json                    Print results as JSON

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use shor_period::stats::{self, SurveyReport};
use shor_period::{
    Outcome, PhaseOracle, QpeOracle, RetryController, RunSummary, ScriptedOracle, ShorConfig,
    TrialBudget,
};

/// CLI configuration parsed from command-line arguments.
struct CliConfig {
    config_file: Option<String>,
    base: Option<u64>,
    modulus: Option<u64>,
    precision: Option<u32>,
    max_trials: Option<u64>,
    unbounded: bool,
    timeout_ms: Option<u64>,
    seed: Option<u64>,
    readouts: Option<String>,
    survey_runs: Option<usize>,
    all_bases: bool,
    json: bool,
}

fn flag_value<T: std::str::FromStr>(args: &[String], name: &str) -> Option<T> {
    let prefix = format!("--{}=", name);
    args.iter()
        .find(|a| a.starts_with(&prefix))
        .and_then(|a| a.strip_prefix(&prefix)?.parse::<T>().ok())
}

fn parse_args(args: &[String]) -> CliConfig {
    let precision = if args.iter().any(|a| a == "--semiclassical") {
        Some(shor_period::config::SEMICLASSICAL_PRECISION)
    } else {
        flag_value(args, "precision")
    };

    CliConfig {
        config_file: flag_value(args, "config"),
        base: flag_value(args, "base"),
        modulus: flag_value(args, "modulus"),
        precision,
        max_trials: flag_value(args, "max-trials"),
        unbounded: args.iter().any(|a| a == "--unbounded"),
        timeout_ms: flag_value(args, "timeout-ms"),
        seed: flag_value(args, "seed"),
        readouts: flag_value(args, "readouts"),
        survey_runs: flag_value(args, "survey"),
        all_bases: args.iter().any(|a| a == "--all-bases"),
        json: args.iter().any(|a| a == "--json"),
    }
}

/// Start from the config file (or N = 15 defaults) and apply flag overrides.
fn build_config(cli: &CliConfig) -> Result<ShorConfig, shor_period::ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => ShorConfig::from_json_file(path)?,
        None => ShorConfig::default(),
    };

    if let Some(modulus) = cli.modulus {
        if modulus != config.modulus {
            // the N = 15 gate table no longer applies
            config = ShorConfig::for_modulus(modulus, config.base, config.precision)
                .with_budget(config.budget);
        }
    }
    if let Some(base) = cli.base {
        config.base = base;
    }
    let readout_width = cli
        .readouts
        .as_deref()
        .and_then(|list| list.split(',').next())
        .map(|first| first.trim().len() as u32);
    if let Some(precision) = cli.precision.or(readout_width) {
        config.precision = precision;
    }

    let mut budget = if cli.unbounded {
        TrialBudget::unbounded()
    } else {
        config.budget
    };
    if let Some(max_trials) = cli.max_trials {
        budget.max_trials = Some(max_trials);
    }
    if let Some(ms) = cli.timeout_ms {
        budget = budget.with_timeout(Duration::from_millis(ms));
    }
    config.budget = budget;

    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize results: {}", e),
    }
}

fn print_run(summary: &RunSummary) {
    for report in &summary.reports {
        println!("Trial {}:", report.trial);
        println!("  Register readout: {} (phase {})", report.sample, report.phase);
        println!(
            "  Fraction: {}  =>  r = {}",
            report.fraction, report.period_candidate
        );
        match &report.candidates {
            Some(c) => println!("  Candidate factors: {} and {}", c.minus, c.plus),
            None => println!("  No candidates ({:?})", report.verdict),
        }
        for factor in &report.accepted {
            println!("  *** Non-trivial factor found: {} ***", factor);
        }
    }
    println!();

    match &summary.outcome {
        Outcome::Success { factor_pairs, .. } => {
            for (f, cofactor) in factor_pairs {
                println!("{} = {} x {}", summary.modulus, f, cofactor);
            }
            println!("({} trial(s), {:.2} ms)", summary.trials, summary.elapsed_ms);
        }
        Outcome::Exhausted { limit } => {
            println!(
                "Could not determine a factor of {} within budget ({:?}, {} trial(s))",
                summary.modulus, limit, summary.trials
            );
        }
    }
}

fn print_survey_table(reports: &[SurveyReport]) {
    println!(
        "  {:>4}  {:>3}  {:>6}  {:>9}  {:>9}  {:>11}  {:>11}",
        "Base", "n", "Runs", "Factored", "Exhausted", "Mean trials", "P(success)"
    );
    println!("  {}", "-".repeat(66));
    for r in reports {
        let mean = r
            .mean_trials_to_success
            .map(|m| format!("{:.3}", m))
            .unwrap_or_else(|| "-".to_string());
        let exact = r
            .exact_success_probability
            .map(|p| format!("{:.4}", p))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>4}  {:>3}  {:>6}  {:>9}  {:>9}  {:>11}  {:>11}",
            r.base, r.precision, r.runs, r.successes, r.exhausted, mean, exact
        );
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args);
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(runs) = cli.survey_runs {
        let seed = cli.seed.unwrap_or(0);
        let bases: Vec<u64> = if cli.all_bases && !config.supported_bases.is_empty() {
            config.supported_bases.clone()
        } else {
            vec![config.base]
        };

        let mut reports = Vec::with_capacity(bases.len());
        for base in bases {
            match stats::survey(&config.clone().with_base(base), runs, seed) {
                Ok(report) => reports.push(report),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        if cli.json {
            print_json(&reports);
        } else {
            println!("=== Shor period recovery, N = {} ===\n", config.modulus);
            print_survey_table(&reports);
        }
        return;
    }

    let mut oracle: Box<dyn PhaseOracle> = match &cli.readouts {
        Some(list) => match ScriptedOracle::from_bit_strings(list.split(',')) {
            Ok(script) => Box::new(script),
            Err(e) => {
                eprintln!("Error: --readouts: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let rng = match cli.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            Box::new(QpeOracle::new(config.modulus, rng))
        }
    };

    let controller = match RetryController::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if !cli.json {
        let c = controller.config();
        println!(
            "=== Shor period recovery: N = {}, a = {}, {} phase bits ===\n",
            c.modulus, c.base, c.precision
        );
    }

    let summary = match controller.run(&mut oracle) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.json {
        print_json(&summary);
    } else {
        print_run(&summary);
    }

    if !summary.outcome.is_success() {
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shor_period::ConfigError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flag_value() {
        let a = args(&["--base=7", "--precision=x", "--json"]);
        assert_eq!(flag_value::<u64>(&a, "base"), Some(7));
        assert_eq!(flag_value::<u32>(&a, "precision"), None);
        assert_eq!(flag_value::<u64>(&a, "seed"), None);
    }

    #[test]
    fn test_defaults() {
        let config = build_config(&parse_args(&[])).unwrap();
        assert_eq!(config.modulus, 15);
        assert_eq!(config.base, 13);
        assert_eq!(config.precision, 8);
        assert_eq!(config.budget, TrialBudget::default());
    }

    #[test]
    fn test_overrides() {
        let cli = parse_args(&args(&[
            "--base=11",
            "--semiclassical",
            "--unbounded",
            "--timeout-ms=250",
        ]));
        let config = build_config(&cli).unwrap();
        assert_eq!(config.base, 11);
        assert_eq!(config.precision, 3);
        assert_eq!(config.budget.max_trials, None);
        assert_eq!(config.budget.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_other_modulus_drops_gate_table_bases() {
        let cli = parse_args(&args(&["--modulus=21", "--base=2", "--precision=9"]));
        let config = build_config(&cli).unwrap();
        assert_eq!(config.modulus, 21);
        assert!(config.supported_bases.is_empty());
    }

    #[test]
    fn test_readouts_set_precision() {
        let cli = parse_args(&args(&["--base=7", "--readouts=000,010"]));
        assert_eq!(cli.readouts.as_deref(), Some("000,010"));
        let config = build_config(&cli).unwrap();
        assert_eq!(config.precision, 3);

        // an explicit precision wins
        let cli = parse_args(&args(&["--readouts=000,010", "--precision=8"]));
        assert_eq!(build_config(&cli).unwrap().precision, 8);
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        let cli = parse_args(&args(&["--base=5"]));
        assert!(matches!(build_config(&cli), Err(ConfigError::UnsupportedBase { .. })));
    }
}
