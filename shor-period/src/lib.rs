//! # shor-period
//!
//! Classical post-processing of Shor's algorithm for small moduli, with
//! N = 15 as the reference case.
//!
//! A phase oracle (a simulated phase-estimation circuit, or a scripted stub)
//! returns n-bit readouts y. Each readout is turned into a phase y / 2^n, the
//! phase into a period candidate r by continued fractions bounded by N, and
//! an even r into the factor candidates gcd(a^(r/2) ± 1, N). A retry
//! controller repeats this until a non-trivial factor appears or its trial
//! budget runs out.
//!
//! ## Modules
//!
//! - **phase**: register readouts and exact rational phases
//! - **cf**: continued fractions and bounded-denominator approximation
//! - **extract**: the gcd step
//! - **controller**: the retry state machine and per-trial reports
//! - **oracle**: oracle trait, scripted stub, Born-rule phase-estimation sampler
//! - **circuit**: mod-15 multiplier gate tables
//! - **stats**: exact and empirical success rates

pub mod cf;
pub mod circuit;
pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod oracle;
pub mod phase;
pub mod stats;

pub use cf::{estimate_period, limit_denominator, Fraction};
pub use config::{ShorConfig, TrialBudget};
pub use controller::{
    BudgetLimit, ControllerState, Outcome, RetryController, RunSummary, TrialReport, TrialVerdict,
};
pub use error::{ConfigError, OracleError, ShorError};
pub use extract::{factor_candidates, try_extract_factors, FactorCandidates};
pub use oracle::{PhaseOracle, QpeOracle, ScriptedOracle};
pub use phase::{PhaseEstimate, Sample};
