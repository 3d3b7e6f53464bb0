//! Precision sweep for the N = 15 period-recovery loop.
//!
//! For every supported base and a range of phase-register widths, compares the
//! exact single-trial success probability with what seeded controller runs
//! actually achieve, and times the runs.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use factoring_core::{is_nontrivial_factor, trial_division};
use shor_period::circuit::{ModMulCircuit, SUPPORTED_BASES};
use shor_period::stats::{self, SurveyReport};
use shor_period::{
    Outcome, PhaseOracle, QpeOracle, RetryController, RunSummary, ShorConfig, ShorError,
    TrialBudget,
};

/// Maximum time for one survey (seconds).
const TIMEOUT_SECS: u64 = 60;

/// Runs per (base, precision) cell.
const RUNS: usize = 2_000;

const SEED: u64 = 12345;

/// Run a closure with a timeout. Returns None if timed out.
fn with_timeout<T: Send + 'static>(
    timeout: Duration,
    f: impl FnOnce() -> T + Send + 'static,
) -> Option<(T, Duration)> {
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();
    std::thread::spawn(move || {
        let result = f();
        let _ = tx.send(result);
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => Some((result, start.elapsed())),
        Err(_) => None,
    }
}

fn main() {
    println!("================================================================");
    println!("  PERIOD RECOVERY: success rate vs phase register width, N = 15");
    println!("================================================================\n");

    println!("Modular multipliers:");
    for base in SUPPORTED_BASES {
        match ModMulCircuit::for_base(base) {
            Ok(circuit) => println!(
                "  a = {:>2}: order {}, {} gate(s)",
                base,
                circuit.order(),
                circuit.instructions.len()
            ),
            Err(e) => println!("  a = {:>2}: {}", base, e),
        }
    }
    println!("  reference factorization: 15 = {:?}\n", trial_division(15));

    bench_precision_sweep();
    bench_single_trial_budget();
    bench_wider_moduli();
}

// ============================================================================
// Sweep 1: unbounded-enough budget, mean trials to success
// ============================================================================

fn bench_precision_sweep() {
    println!("================================================================");
    println!("  Sweep 1: Mean trials to success ({} runs per cell)", RUNS);
    println!("================================================================\n");
    println!(
        "  {:>4} {:>3} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "base", "n", "P(exact)", "1/P", "mean", "max", "time_ms"
    );
    println!("  {}", "-".repeat(64));

    for base in SUPPORTED_BASES {
        for precision in [2u32, 3, 4, 6, 8, 10] {
            let config = ShorConfig::fifteen(base).with_precision(precision);
            let Some((result, elapsed)) = with_timeout(Duration::from_secs(TIMEOUT_SECS), {
                let config = config.clone();
                move || stats::survey(&config, RUNS, SEED)
            }) else {
                println!("  {:>4} {:>3} {:>10}", base, precision, "TIMEOUT");
                continue;
            };

            match result {
                Ok(report) => print_sweep_row(&report, elapsed),
                Err(e) => println!("  {:>4} {:>3} error: {}", base, precision, e),
            }
        }
    }
    println!();
}

fn print_sweep_row(report: &SurveyReport, elapsed: Duration) {
    let fmt = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".into());
    let expected = report
        .exact_success_probability
        .filter(|&p| p > 0.0)
        .map(|p| 1.0 / p);
    println!(
        "  {:>4} {:>3} {:>10} {:>10} {:>10} {:>10} {:>10}",
        report.base,
        report.precision,
        fmt(report.exact_success_probability),
        fmt(expected),
        fmt(report.mean_trials_to_success),
        report
            .max_trials_to_success
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".into()),
        elapsed.as_millis()
    );
}

// ============================================================================
// Sweep 2: one trial per run, empirical vs exact success rate
// ============================================================================

fn bench_single_trial_budget() {
    println!("================================================================");
    println!("  Sweep 2: Single-trial success rate");
    println!("================================================================\n");
    println!(
        "  {:>4} {:>3} {:>10} {:>10} {:>10}",
        "base", "n", "exact", "observed", "|diff|"
    );
    println!("  {}", "-".repeat(44));

    for base in SUPPORTED_BASES {
        for precision in [3u32, 8] {
            let config = ShorConfig::fifteen(base)
                .with_precision(precision)
                .with_budget(TrialBudget::trials(1));
            let report = match stats::survey(&config, RUNS, SEED) {
                Ok(report) => report,
                Err(e) => {
                    println!("  {:>4} {:>3} error: {}", base, precision, e);
                    continue;
                }
            };
            let observed = report.successes as f64 / report.runs as f64;
            let exact = report.exact_success_probability.unwrap_or(f64::NAN);
            println!(
                "  {:>4} {:>3} {:>10.4} {:>10.4} {:>10.4}",
                base,
                precision,
                exact,
                observed,
                (exact - observed).abs()
            );
        }
    }
    println!();
}

fn run_once(config: &ShorConfig, oracle: &mut impl PhaseOracle) -> Result<RunSummary, ShorError> {
    RetryController::new(config.clone())?.run(oracle)
}

// ============================================================================
// Sweep 3: other small semiprimes through the generic oracle
// ============================================================================

fn bench_wider_moduli() {
    println!("================================================================");
    println!("  Sweep 3: Other semiprimes (order by search, 2 log2 N + 1 bits)");
    println!("================================================================\n");
    println!(
        "  {:>5} {:>4} {:>3} {:>8} {:>12} {:>10}",
        "N", "a", "n", "trials", "factors", "status"
    );
    println!("  {}", "-".repeat(50));

    for (modulus, base) in [(21u64, 2u64), (33, 5), (35, 2), (39, 7), (51, 5), (55, 2)] {
        let bits = 64 - modulus.leading_zeros();
        let config = ShorConfig::for_modulus(modulus, base, 2 * bits + 1)
            .with_budget(TrialBudget::trials(100));
        let mut oracle = QpeOracle::new(modulus, StdRng::seed_from_u64(SEED));

        let summary = match run_once(&config, &mut oracle) {
            Ok(summary) => summary,
            Err(e) => {
                println!("  {:>5} {:>4} error: {}", modulus, base, e);
                continue;
            }
        };

        match &summary.outcome {
            Outcome::Success { factors, .. } => {
                let ok = factors.iter().all(|&f| is_nontrivial_factor(modulus, f));
                println!(
                    "  {:>5} {:>4} {:>3} {:>8} {:>12} {:>10}",
                    modulus,
                    base,
                    config.precision,
                    summary.trials,
                    format!("{:?}", factors),
                    if ok { "OK" } else { "BAD" }
                );
            }
            Outcome::Exhausted { limit } => println!(
                "  {:>5} {:>4} {:>3} {:>8} {:>12} {:>10}",
                modulus,
                base,
                config.precision,
                summary.trials,
                "-",
                format!("{:?}", limit)
            ),
        }
    }
    println!();
}
