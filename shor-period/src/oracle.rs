//! Phase oracles: where the period-recovery loop gets its measurements.
//!
//! The loop only needs "one n-bit readout of the phase register per call".
//! [`ScriptedOracle`] replays a fixed sequence for tests and demos;
//! [`QpeOracle`] draws readouts from the Born-rule distribution of an ideal
//! phase-estimation circuit.

use std::collections::HashMap;
use std::f64::consts::PI;

use factoring_core::multiplicative_order;
use rand::Rng;

use crate::circuit::{self, ModMulCircuit};
use crate::error::OracleError;
use crate::phase::{Sample, MAX_PRECISION};

/// Largest register width for which the full outcome distribution is tabulated.
pub const MAX_DISTRIBUTION_PRECISION: u32 = 16;

/// A source of phase-register readouts.
pub trait PhaseOracle {
    /// Perform one measurement for `base` with an n-bit phase register.
    fn sample_phase(&mut self, base: u64, precision: u32) -> Result<Sample, OracleError>;
}

impl<O: PhaseOracle + ?Sized> PhaseOracle for &mut O {
    fn sample_phase(&mut self, base: u64, precision: u32) -> Result<Sample, OracleError> {
        (**self).sample_phase(base, precision)
    }
}

impl<O: PhaseOracle + ?Sized> PhaseOracle for Box<O> {
    fn sample_phase(&mut self, base: u64, precision: u32) -> Result<Sample, OracleError> {
        (**self).sample_phase(base, precision)
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
///
/// The base is ignored. Requests for a precision other than the script's
/// are refused.
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    samples: Vec<Sample>,
    cursor: usize,
}

impl ScriptedOracle {
    pub fn new(samples: Vec<Sample>) -> Result<Self, OracleError> {
        let first = samples.first().ok_or(OracleError::EmptyScript)?;
        if let Some(odd) = samples.iter().find(|s| s.precision() != first.precision()) {
            return Err(OracleError::PrecisionMismatch {
                expected: first.precision(),
                requested: odd.precision(),
            });
        }
        Ok(Self { samples, cursor: 0 })
    }

    /// Script from raw register values.
    pub fn from_values(precision: u32, values: &[u64]) -> Result<Self, OracleError> {
        let samples = values
            .iter()
            .map(|&v| Sample::new(v, precision))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(samples)
    }

    /// Script from phases in [0, 1); each must be an exact multiple of 2^-precision.
    pub fn from_phases(precision: u32, phases: &[f64]) -> Result<Self, OracleError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(OracleError::InvalidPrecision(precision));
        }
        let scale = (1u64 << precision) as f64;
        let values = phases
            .iter()
            .map(|&phase| {
                let scaled = phase * scale;
                if !(0.0..1.0).contains(&phase) || scaled.fract() != 0.0 {
                    return Err(OracleError::UnrepresentablePhase { phase, precision });
                }
                Ok(scaled as u64)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_values(precision, &values)
    }

    /// Script from recorded bit strings such as `"010"`, most significant bit first.
    pub fn from_bit_strings<'a>(
        readouts: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, OracleError> {
        let samples = readouts
            .into_iter()
            .map(|bits| Sample::from_bits(bits.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(samples)
    }

    pub fn precision(&self) -> u32 {
        self.samples[0].precision()
    }

    /// Number of samples handed out so far.
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl PhaseOracle for ScriptedOracle {
    fn sample_phase(&mut self, _base: u64, precision: u32) -> Result<Sample, OracleError> {
        if precision != self.precision() {
            return Err(OracleError::PrecisionMismatch {
                expected: self.precision(),
                requested: precision,
            });
        }
        let sample = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        Ok(sample)
    }
}

/// Born-rule sampler for an ideal phase-estimation circuit on U|y⟩ = |a·y mod N⟩.
///
/// Starting the work register in |1⟩ puts it in an equal superposition of
/// the r eigenvectors of U, with eigenphases s/r. Sampling therefore picks
/// s uniformly and then reads the phase out one bit at a time with a single
/// control qubit (least significant bit first, earlier bits fed forward as
/// phase corrections), which reproduces the textbook inverse-QFT readout
/// distribution exactly.
///
/// For N = 15 the order comes from the gate table in [`circuit`]; other
/// moduli fall back to a classical order search.
pub struct QpeOracle<R> {
    modulus: u64,
    rng: R,
    orders: HashMap<u64, u64>,
}

impl<R: Rng> QpeOracle<R> {
    pub fn new(modulus: u64, rng: R) -> Self {
        Self {
            modulus,
            rng,
            orders: HashMap::new(),
        }
    }

    /// Order of `base` modulo the oracle's modulus.
    pub fn order(&mut self, base: u64) -> Result<u64, OracleError> {
        if let Some(&order) = self.orders.get(&base) {
            return Ok(order);
        }
        let from_table = match self.modulus {
            circuit::MODULUS => ModMulCircuit::for_base(base).ok().map(|c| c.order()),
            _ => None,
        };
        let order = from_table
            .or_else(|| multiplicative_order(base, self.modulus, self.modulus))
            .ok_or(OracleError::UnknownOrder {
                base,
                modulus: self.modulus,
            })?;
        self.orders.insert(base, order);
        Ok(order)
    }

    /// Exact probability of every readout y in [0, 2^precision).
    ///
    /// P(y) = (1/r) Σ_s |2^-n Σ_k exp(2πi k (s/r - y/2^n))|²
    pub fn outcome_distribution(&mut self, base: u64, precision: u32) -> Result<Vec<f64>, OracleError> {
        if precision == 0 {
            return Err(OracleError::InvalidPrecision(precision));
        }
        if precision > MAX_DISTRIBUTION_PRECISION {
            return Err(OracleError::DistributionTooLarge(precision));
        }
        let r = self.order(base)?;
        Ok(qpe_distribution(r, precision))
    }
}

impl<R: Rng> PhaseOracle for QpeOracle<R> {
    fn sample_phase(&mut self, base: u64, precision: u32) -> Result<Sample, OracleError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(OracleError::InvalidPrecision(precision));
        }
        let r = self.order(base)?;
        let s = self.rng.gen_range(0..r);

        let mut readout = 0u64;
        for k in 0..precision {
            // Controlled-U^(2^(n-1-k)) kicks back the phase 2^(n-1-k) * s/r.
            let shift = precision - 1 - k;
            let kicked = ((s as u128) << shift) % r as u128;
            let kicked = kicked as f64 / r as f64;
            // Bits already read, fed forward as a rotation by -0.0b_{k-1}..b_0.
            let correction = readout as f64 / (1u64 << (k + 1)) as f64;
            let p_zero = (PI * (kicked - correction)).cos().powi(2);
            if self.rng.gen::<f64>() >= p_zero {
                readout |= 1 << k;
            }
        }

        let sample = Sample::new(readout, precision)?;
        log::debug!(
            "oracle: base={} order={} eigenphase={}/{} readout={}",
            base,
            r,
            s,
            r,
            sample.bits()
        );
        Ok(sample)
    }
}

/// Readout distribution of n-bit phase estimation on a uniform mixture of
/// eigenphases s/r, s = 0..r.
fn qpe_distribution(r: u64, precision: u32) -> Vec<f64> {
    let size = 1u64 << precision;
    let m = size as f64;
    let mut probs = vec![0.0; size as usize];

    for (y, p) in probs.iter_mut().enumerate() {
        let mut total = 0.0;
        for s in 0..r {
            // delta = s/r - y/2^n = (s*2^n - y*r) / (r*2^n)
            let numer = s as i128 * size as i128 - y as i128 * r as i128;
            let denom = r as i128 * size as i128;
            if numer % denom == 0 {
                total += 1.0;
                continue;
            }
            let delta = numer as f64 / denom as f64;
            let top = (PI * m * delta).sin();
            let bottom = (PI * delta).sin();
            total += (top * top) / (m * m * bottom * bottom);
        }
        *p = total / r as f64;
    }

    probs
}
