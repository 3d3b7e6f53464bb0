//! How often does a single trial succeed, and how many trials does a run take?
//!
//! The exact per-trial success probability comes from the oracle's outcome
//! distribution; the survey checks it empirically with many independent,
//! seeded controller runs executed in parallel.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ShorConfig;
use crate::controller::{Outcome, RetryController, RunSummary, TrialReport, TrialVerdict};
use crate::error::ShorError;
use crate::oracle::{QpeOracle, MAX_DISTRIBUTION_PRECISION};
use crate::phase::Sample;

/// Aggregate of many independent runs for one configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyReport {
    pub modulus: u64,
    pub base: u64,
    pub precision: u32,
    pub runs: usize,
    pub successes: usize,
    pub exhausted: usize,
    pub mean_trials_to_success: Option<f64>,
    pub max_trials_to_success: Option<u64>,
    /// Verdict counts over every trial of every run.
    pub verdicts: BTreeMap<TrialVerdict, u64>,
    /// Probability that one trial factors N, when the distribution is tabulated.
    pub exact_success_probability: Option<f64>,
}

/// Probability mass of readouts whose trial ends in [`TrialVerdict::Factored`].
pub fn exact_success_probability(config: &ShorConfig, distribution: &[f64]) -> f64 {
    distribution
        .iter()
        .enumerate()
        .filter_map(|(y, &p)| {
            let sample = Sample::new(y as u64, config.precision).ok()?;
            let report = TrialReport::evaluate(0, config.base, config.modulus, sample);
            (report.verdict == TrialVerdict::Factored).then_some(p)
        })
        .sum()
}

/// Exact per-trial success probability for `config`, if the register is
/// small enough to tabulate.
pub fn exact_for_config(config: &ShorConfig) -> Result<Option<f64>, ShorError> {
    config.validate()?;
    if config.precision > MAX_DISTRIBUTION_PRECISION {
        return Ok(None);
    }
    // The rng is unused for tabulation.
    let mut oracle = QpeOracle::new(config.modulus, StdRng::seed_from_u64(0));
    let distribution = oracle.outcome_distribution(config.base, config.precision)?;
    Ok(Some(exact_success_probability(config, &distribution)))
}

/// Run `runs` independent controllers, run i seeded with `seed + i`.
pub fn survey(config: &ShorConfig, runs: usize, seed: u64) -> Result<SurveyReport, ShorError> {
    let exact = exact_for_config(config)?;

    let summaries: Vec<RunSummary> = (0..runs)
        .into_par_iter()
        .map(|i| {
            let rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let mut oracle = QpeOracle::new(config.modulus, rng);
            RetryController::new(config.clone())?.run(&mut oracle)
        })
        .collect::<Result<_, ShorError>>()?;

    let mut verdicts = BTreeMap::new();
    let mut success_trials = Vec::new();
    for summary in &summaries {
        for report in &summary.reports {
            *verdicts.entry(report.verdict).or_insert(0) += 1;
        }
        if let Outcome::Success { .. } = summary.outcome {
            success_trials.push(summary.trials);
        }
    }

    let successes = success_trials.len();
    let mean_trials_to_success = (successes > 0)
        .then(|| success_trials.iter().sum::<u64>() as f64 / successes as f64);

    log::info!(
        "survey N={} a={} n={}: {}/{} runs factored",
        config.modulus,
        config.base,
        config.precision,
        successes,
        runs
    );

    Ok(SurveyReport {
        modulus: config.modulus,
        base: config.base,
        precision: config.precision,
        runs,
        successes,
        exhausted: runs - successes,
        mean_trials_to_success,
        max_trials_to_success: success_trials.iter().copied().max(),
        verdicts,
        exact_success_probability: exact,
    })
}
