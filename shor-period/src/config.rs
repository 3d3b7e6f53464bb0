//! Run configuration: what to factor, with which base, how precisely, and
//! for how long.

use std::path::Path;
use std::time::Duration;

use factoring_core::{gcd_u64, is_prime};
use serde::{Deserialize, Serialize};

use crate::circuit;
use crate::error::ConfigError;
use crate::phase::MAX_PRECISION;

/// Phase bits used by the textbook circuit for N = 15.
pub const TEXTBOOK_PRECISION: u32 = 8;

/// Phase bits used by the single-control-qubit circuit for N = 15.
pub const SEMICLASSICAL_PRECISION: u32 = 3;

/// Trials allowed when no budget is given.
pub const DEFAULT_MAX_TRIALS: u64 = 100;

/// Bounds on a controller run. Both limits are checked before every trial;
/// with neither set the controller retries until it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialBudget {
    pub max_trials: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Default for TrialBudget {
    fn default() -> Self {
        Self {
            max_trials: Some(DEFAULT_MAX_TRIALS),
            timeout_ms: None,
        }
    }
}

impl TrialBudget {
    /// No limits at all: loop until a factor turns up.
    pub fn unbounded() -> Self {
        Self {
            max_trials: None,
            timeout_ms: None,
        }
    }

    pub fn trials(max_trials: u64) -> Self {
        Self {
            max_trials: Some(max_trials),
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShorConfig {
    /// The composite being factored.
    pub modulus: u64,
    /// Base whose order is estimated.
    pub base: u64,
    /// Bases the oracle can handle. Empty means any base coprime to the modulus.
    pub supported_bases: Vec<u64>,
    /// Width of the phase register, in bits.
    pub precision: u32,
    pub budget: TrialBudget,
}

impl Default for ShorConfig {
    fn default() -> Self {
        Self::fifteen(13)
    }
}

impl ShorConfig {
    /// N = 15 with the textbook 8-bit phase register.
    pub fn fifteen(base: u64) -> Self {
        Self {
            modulus: circuit::MODULUS,
            base,
            supported_bases: circuit::SUPPORTED_BASES.to_vec(),
            precision: TEXTBOOK_PRECISION,
            budget: TrialBudget::default(),
        }
    }

    /// N = 15 with the 3-bit single-control-qubit readout.
    pub fn fifteen_semiclassical(base: u64) -> Self {
        Self::fifteen(base).with_precision(SEMICLASSICAL_PRECISION)
    }

    /// Arbitrary modulus; any coprime base is accepted.
    pub fn for_modulus(modulus: u64, base: u64, precision: u32) -> Self {
        Self {
            modulus,
            base,
            supported_bases: Vec::new(),
            precision,
            budget: TrialBudget::default(),
        }
    }

    pub fn with_base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_budget(mut self, budget: TrialBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Continued fractions are cut off at denominators above the modulus.
    pub fn max_denominator(&self) -> u64 {
        self.modulus
    }

    /// Load a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modulus < 4 || is_prime(self.modulus) {
            return Err(ConfigError::InvalidModulus(self.modulus));
        }
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(ConfigError::PrecisionOutOfRange(self.precision));
        }
        if !self.supported_bases.is_empty() && !self.supported_bases.contains(&self.base) {
            return Err(ConfigError::UnsupportedBase {
                base: self.base,
                modulus: self.modulus,
                supported: self.supported_bases.clone(),
            });
        }
        if self.base < 2 || self.base >= self.modulus || gcd_u64(self.base, self.modulus) != 1 {
            return Err(ConfigError::InvalidBase {
                base: self.base,
                modulus: self.modulus,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fifteen_defaults_validate() {
        for base in circuit::SUPPORTED_BASES {
            let config = ShorConfig::fifteen(base);
            assert!(config.validate().is_ok(), "base {}", base);
            assert_eq!(config.max_denominator(), 15);
            assert_eq!(config.precision, 8);
        }
        assert_eq!(ShorConfig::fifteen_semiclassical(7).precision, 3);
        assert_eq!(ShorConfig::default().base, 13);
    }

    #[test]
    fn test_unsupported_base_rejected() {
        let err = ShorConfig::fifteen(14).validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedBase { base: 14, modulus: 15, .. }));
        let err = ShorConfig::fifteen(3).validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedBase { base: 3, .. }));
    }

    #[test]
    fn test_generic_modulus_validation() {
        assert!(ShorConfig::for_modulus(21, 2, 10).validate().is_ok());
        assert!(matches!(
            ShorConfig::for_modulus(21, 7, 10).validate(),
            Err(ConfigError::InvalidBase { base: 7, modulus: 21 })
        ));
        assert!(matches!(
            ShorConfig::for_modulus(21, 21, 10).validate(),
            Err(ConfigError::InvalidBase { .. })
        ));
        assert!(matches!(
            ShorConfig::for_modulus(13, 2, 10).validate(),
            Err(ConfigError::InvalidModulus(13))
        ));
        assert!(matches!(
            ShorConfig::for_modulus(21, 2, 0).validate(),
            Err(ConfigError::PrecisionOutOfRange(0))
        ));
        assert!(matches!(
            ShorConfig::for_modulus(21, 2, 33).validate(),
            Err(ConfigError::PrecisionOutOfRange(33))
        ));
    }

    #[test]
    fn test_budget() {
        assert_eq!(TrialBudget::default().max_trials, Some(DEFAULT_MAX_TRIALS));
        let budget = TrialBudget::trials(5).with_timeout(Duration::from_millis(250));
        assert_eq!(budget.max_trials, Some(5));
        assert_eq!(budget.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(TrialBudget::unbounded().timeout(), None);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"base": 7, "precision": 3, "budget": {{"max_trials": 12}}}}"#
        )
        .unwrap();
        let config = ShorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.modulus, 15);
        assert_eq!(config.base, 7);
        assert_eq!(config.precision, 3);
        assert_eq!(config.budget, TrialBudget::trials(12));
    }

    #[test]
    fn test_from_json_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ShorConfig::from_json_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base": 5}}"#).unwrap();
        assert!(matches!(
            ShorConfig::from_json_file(file.path()),
            Err(ConfigError::UnsupportedBase { base: 5, .. })
        ));

        assert!(matches!(
            ShorConfig::from_json_file("/nonexistent/shor.json"),
            Err(ConfigError::Read { .. })
        ));
    }
}
