//! Raw measurement samples and the phase estimates read from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Largest supported phase-register width, in bits.
pub const MAX_PRECISION: u32 = 32;

/// One readout of the phase register: an n-bit unsigned integer.
///
/// The sample carries its own precision so the phase denominator is always
/// 2^precision of the register that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    value: u64,
    precision: u32,
}

impl Sample {
    pub fn new(value: u64, precision: u32) -> Result<Self, OracleError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(OracleError::InvalidPrecision(precision));
        }
        if value >= 1u64 << precision {
            return Err(OracleError::SampleOutOfRange { value, precision });
        }
        Ok(Self { value, precision })
    }

    /// Parse a measured bit string, most significant bit first.
    pub fn from_bits(bits: &str) -> Result<Self, OracleError> {
        if bits.is_empty() || !bits.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(OracleError::InvalidBits(bits.to_string()));
        }
        let precision = bits.len() as u32;
        if precision > MAX_PRECISION {
            return Err(OracleError::InvalidPrecision(precision));
        }
        let value = bits
            .bytes()
            .fold(0u64, |acc, b| (acc << 1) | u64::from(b - b'0'));
        Self::new(value, precision)
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Number of distinct outcomes of the register, 2^precision.
    pub fn register_size(&self) -> u64 {
        1u64 << self.precision
    }

    /// The bit string as read out of the register, zero padded.
    pub fn bits(&self) -> String {
        format!("{:0width$b}", self.value, width = self.precision as usize)
    }

    /// value / 2^precision.
    pub fn phase(&self) -> PhaseEstimate {
        PhaseEstimate {
            numerator: self.value,
            denominator: self.register_size(),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (bin) = {} (dec)", self.bits(), self.value)
    }
}

/// An exact rational phase in [0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseEstimate {
    numerator: u64,
    denominator: u64,
}

impl PhaseEstimate {
    /// `numerator / denominator`, or `None` unless 0 ≤ numerator < denominator.
    pub fn new(numerator: u64, denominator: u64) -> Option<Self> {
        if denominator == 0 || numerator >= denominator {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    pub fn zero() -> Self {
        Self {
            numerator: 0,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for PhaseEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} = {:.4}", self.numerator, self.denominator, self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_bits_and_phase() {
        let sample = Sample::new(64, 8).unwrap();
        assert_eq!(sample.bits(), "01000000");
        assert_eq!(sample.register_size(), 256);
        let phase = sample.phase();
        assert_eq!((phase.numerator(), phase.denominator()), (64, 256));
        assert!((phase.as_f64() - 0.25).abs() < 1e-12);
        assert!(!phase.is_zero());
    }

    #[test]
    fn test_sample_from_bits() {
        let sample = Sample::from_bits("11000000").unwrap();
        assert_eq!(sample.value(), 192);
        assert_eq!(sample.precision(), 8);
        assert_eq!(Sample::from_bits("000").unwrap().phase(), PhaseEstimate::new(0, 8).unwrap());
        assert_eq!(Sample::from_bits("0101").unwrap().value(), 5);
    }

    #[test]
    fn test_sample_from_bits_rejects_non_binary() {
        for bad in ["", "+101", "-1", "10a1", " 01", "012", "0b10"] {
            assert_eq!(
                Sample::from_bits(bad),
                Err(OracleError::InvalidBits(bad.to_string())),
                "{:?}",
                bad
            );
        }
        assert_eq!(
            Sample::from_bits(&"1".repeat(33)),
            Err(OracleError::InvalidPrecision(33))
        );
    }

    #[test]
    fn test_sample_rejects_out_of_range() {
        assert_eq!(
            Sample::new(8, 3),
            Err(OracleError::SampleOutOfRange { value: 8, precision: 3 })
        );
        assert_eq!(Sample::new(0, 0), Err(OracleError::InvalidPrecision(0)));
        assert_eq!(Sample::new(0, 33), Err(OracleError::InvalidPrecision(33)));
        assert!(Sample::new(u32::MAX as u64, 32).is_ok());
    }

    #[test]
    fn test_phase_estimate_bounds() {
        assert!(PhaseEstimate::new(1, 1).is_none());
        assert!(PhaseEstimate::new(0, 0).is_none());
        assert!(PhaseEstimate::zero().is_zero());
        assert_eq!(format!("{}", PhaseEstimate::new(1, 4).unwrap()), "1/4 = 0.2500");
    }
}
