//! The retry loop of Shor's algorithm as an explicit state machine.
//!
//! Each trial: sample the oracle, estimate the period by continued
//! fractions, drop zero phases, and try the gcd extraction. The controller
//! stops at the first trial that yields a non-trivial factor, or when the
//! trial budget runs out.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::Serialize;

use crate::cf::{limit_denominator, Fraction};
use crate::config::ShorConfig;
use crate::error::{ConfigError, OracleError, ShorError};
use crate::extract::{factor_candidates, FactorCandidates};
use crate::oracle::PhaseOracle;
use crate::phase::{PhaseEstimate, Sample};

/// How a single trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialVerdict {
    /// Phase 0 carries no period information.
    ZeroPhase,
    /// Odd period candidate; a^(r/2) is not an integer power.
    OddPeriod,
    /// Even period, but both gcds were 1 or N.
    NoFactor,
    /// At least one non-trivial factor found.
    Factored,
}

/// Which limit of the trial budget stopped the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetLimit {
    MaxTrials,
    Deadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Running,
    Success,
    Exhausted(BudgetLimit),
}

/// Everything observed in one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialReport {
    pub trial: u64,
    /// Register readout as a bit string, most significant bit first.
    pub sample: String,
    pub value: u64,
    pub precision: u32,
    pub phase: PhaseEstimate,
    pub fraction: Fraction,
    pub period_candidate: u64,
    pub candidates: Option<FactorCandidates>,
    pub accepted: BTreeSet<u64>,
    pub verdict: TrialVerdict,
}

impl TrialReport {
    /// Run the classical post-processing on one readout.
    pub fn evaluate(trial: u64, base: u64, modulus: u64, sample: Sample) -> Self {
        let phase = sample.phase();
        let fraction = limit_denominator(phase, modulus);
        let period_candidate = fraction.denominator;

        let (candidates, accepted, verdict) = if phase.is_zero() {
            (None, BTreeSet::new(), TrialVerdict::ZeroPhase)
        } else {
            match factor_candidates(base, modulus, period_candidate) {
                None => (None, BTreeSet::new(), TrialVerdict::OddPeriod),
                Some(c) => {
                    let accepted = c.accepted(modulus);
                    let verdict = if accepted.is_empty() {
                        TrialVerdict::NoFactor
                    } else {
                        TrialVerdict::Factored
                    };
                    (Some(c), accepted, verdict)
                }
            }
        };

        Self {
            trial,
            sample: sample.bits(),
            value: sample.value(),
            precision: sample.precision(),
            phase,
            fraction,
            period_candidate,
            candidates,
            accepted,
            verdict,
        }
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Factors found, each with its cofactor N / f.
    Success {
        factors: BTreeSet<u64>,
        factor_pairs: Vec<(u64, u64)>,
    },
    /// Could not determine a factor within the budget.
    Exhausted { limit: BudgetLimit },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn factors(&self) -> Option<&BTreeSet<u64>> {
        match self {
            Outcome::Success { factors, .. } => Some(factors),
            Outcome::Exhausted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub modulus: u64,
    pub base: u64,
    pub precision: u32,
    pub outcome: Outcome,
    pub trials: u64,
    pub reports: Vec<TrialReport>,
    pub elapsed_ms: f64,
}

/// Drives trials against a [`PhaseOracle`] until success or budget exhaustion.
///
/// The configuration is validated on construction, so an invalid base never
/// reaches the oracle.
#[derive(Debug)]
pub struct RetryController {
    config: ShorConfig,
    state: ControllerState,
    trials: u64,
    started: Option<Instant>,
    factors: BTreeSet<u64>,
    reports: Vec<TrialReport>,
}

impl RetryController {
    pub fn new(config: ShorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: ControllerState::Running,
            trials: 0,
            started: None,
            factors: BTreeSet::new(),
            reports: Vec::new(),
        })
    }

    pub fn config(&self) -> &ShorConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn reports(&self) -> &[TrialReport] {
        &self.reports
    }

    fn budget_limit(&self, started: Instant) -> Option<BudgetLimit> {
        let budget = &self.config.budget;
        if budget.max_trials.is_some_and(|max| self.trials >= max) {
            return Some(BudgetLimit::MaxTrials);
        }
        if budget.timeout().is_some_and(|t| started.elapsed() >= t) {
            return Some(BudgetLimit::Deadline);
        }
        None
    }

    /// Advance by at most one trial and return the resulting state.
    ///
    /// A no-op once the controller has reached a terminal state.
    pub fn step<O: PhaseOracle + ?Sized>(&mut self, oracle: &mut O) -> Result<ControllerState, ShorError> {
        if self.state != ControllerState::Running {
            return Ok(self.state);
        }
        let started = *self.started.get_or_insert_with(Instant::now);

        if let Some(limit) = self.budget_limit(started) {
            log::warn!(
                "no factor of {} after {} trials ({:?})",
                self.config.modulus,
                self.trials,
                limit
            );
            self.state = ControllerState::Exhausted(limit);
            return Ok(self.state);
        }

        self.trials += 1;
        let sample = oracle.sample_phase(self.config.base, self.config.precision)?;
        if sample.precision() != self.config.precision {
            return Err(OracleError::PrecisionMismatch {
                expected: sample.precision(),
                requested: self.config.precision,
            }
            .into());
        }

        let report = TrialReport::evaluate(self.trials, self.config.base, self.config.modulus, sample);
        log::info!(
            "trial {}: readout {} phase {} -> {} r={} {:?}",
            report.trial,
            report.sample,
            report.phase,
            report.fraction,
            report.period_candidate,
            report.verdict
        );
        if let Some(c) = &report.candidates {
            log::debug!("candidates gcd(a^(r/2)-1, N)={} gcd(a^(r/2)+1, N)={}", c.minus, c.plus);
        }

        if report.verdict == TrialVerdict::Factored {
            log::info!(
                "non-trivial factor(s) {:?} of {} after {} trial(s)",
                report.accepted,
                self.config.modulus,
                self.trials
            );
            self.factors = report.accepted.clone();
            self.state = ControllerState::Success;
        }
        self.reports.push(report);

        Ok(self.state)
    }

    /// Run trials until success or the budget is spent.
    pub fn run<O: PhaseOracle + ?Sized>(mut self, oracle: &mut O) -> Result<RunSummary, ShorError> {
        let start = Instant::now();
        while self.step(oracle)? == ControllerState::Running {}

        let modulus = self.config.modulus;
        let outcome = match self.state {
            ControllerState::Exhausted(limit) => Outcome::Exhausted { limit },
            _ => Outcome::Success {
                factor_pairs: self.factors.iter().map(|&f| (f, modulus / f)).collect(),
                factors: self.factors,
            },
        };

        Ok(RunSummary {
            modulus,
            base: self.config.base,
            precision: self.config.precision,
            outcome,
            trials: self.trials,
            reports: self.reports,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
