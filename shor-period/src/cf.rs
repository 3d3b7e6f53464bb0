//! Continued-fraction period estimation.
//!
//! A phase-estimation readout y / 2^n approximates s / r for the hidden order
//! r. The best rational approximation to the readout with denominator at most
//! N recovers r (or a divisor of it when s and r share a factor).

use std::fmt;

use factoring_core::gcd_u64;
use serde::{Deserialize, Serialize};

use crate::phase::PhaseEstimate;

/// A reduced fraction p / q.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Compute the continued fraction expansion of numerator / denominator,
/// returning at most `max_terms` partial quotients.
///
/// The continued fraction representation [a0; a1, a2, ...] satisfies
///   numerator/denominator = a0 + 1/(a1 + 1/(a2 + ...))
pub fn continued_fraction(mut numerator: u64, mut denominator: u64, max_terms: usize) -> Vec<u64> {
    let mut terms = Vec::new();
    while denominator != 0 && terms.len() < max_terms {
        let quotient = numerator / denominator;
        terms.push(quotient);
        let remainder = numerator % denominator;
        numerator = denominator;
        denominator = remainder;
    }
    terms
}

/// Convergents p_k/q_k of a continued fraction expansion.
///
/// Stops early if a numerator or denominator would overflow u64.
pub fn convergents(cf: &[u64]) -> Vec<Fraction> {
    let mut result = Vec::with_capacity(cf.len());

    // p_{-1} = 1, p_{-2} = 0, q_{-1} = 0, q_{-2} = 1
    let (mut p_prev2, mut p_prev1) = (0u64, 1u64);
    let (mut q_prev2, mut q_prev1) = (1u64, 0u64);

    for &a in cf {
        let p = a.checked_mul(p_prev1).and_then(|v| v.checked_add(p_prev2));
        let q = a.checked_mul(q_prev1).and_then(|v| v.checked_add(q_prev2));
        match (p, q) {
            (Some(pn), Some(qn)) => {
                result.push(Fraction {
                    numerator: pn,
                    denominator: qn,
                });
                p_prev2 = p_prev1;
                p_prev1 = pn;
                q_prev2 = q_prev1;
                q_prev1 = qn;
            }
            _ => break,
        }
    }

    result
}

/// The closest fraction to `phase` whose denominator does not exceed
/// `max_denominator`.
///
/// Walks the convergents until the next one would exceed the bound, then
/// picks between the last convergent and the largest admissible
/// semiconvergent. Ties go to the convergent. A bound of 0 is treated as 1.
pub fn limit_denominator(phase: PhaseEstimate, max_denominator: u64) -> Fraction {
    let max_den = max_denominator.max(1);

    // gcd(0, d) = d, so a zero phase reduces to 0/1.
    let g = gcd_u64(phase.numerator(), phase.denominator());
    let (num, den) = (phase.numerator() / g, phase.denominator() / g);
    if den <= max_den {
        return Fraction {
            numerator: num,
            denominator: den,
        };
    }

    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let (mut n, mut d) = (num, den);
    while d != 0 {
        let a = n / d;
        let q2 = a.saturating_mul(q1).saturating_add(q0);
        if q2 > max_den {
            break;
        }
        let p2 = a * p1 + p0;
        p0 = p1;
        q0 = q1;
        p1 = p2;
        q1 = q2;
        let rem = n - a * d;
        n = d;
        d = rem;
    }

    let k = (max_den - q0) / q1;
    let semiconvergent = Fraction {
        numerator: p0 + k * p1,
        denominator: q0 + k * q1,
    };
    let convergent = Fraction {
        numerator: p1,
        denominator: q1,
    };

    // |p/q - num/den| * den = |p*den - num*q| / q; compare cross-multiplied.
    let error = |f: &Fraction| -> u128 {
        let lhs = f.numerator as u128 * den as u128;
        let rhs = num as u128 * f.denominator as u128;
        lhs.abs_diff(rhs)
    };
    let conv_err = error(&convergent) * semiconvergent.denominator as u128;
    let semi_err = error(&semiconvergent) * convergent.denominator as u128;

    if conv_err <= semi_err {
        convergent
    } else {
        semiconvergent
    }
}

/// Period candidate for a phase readout: the denominator of its best rational
/// approximation with denominator at most `max_denominator`.
///
/// A zero phase yields 1, which callers must treat as non-informative.
pub fn estimate_period(phase: PhaseEstimate, max_denominator: u64) -> u64 {
    let fraction = limit_denominator(phase, max_denominator);
    log::trace!(
        "phase {} -> {} (bound {})",
        phase,
        fraction,
        max_denominator
    );
    fraction.denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(n: u64, d: u64) -> PhaseEstimate {
        PhaseEstimate::new(n, d).unwrap()
    }

    fn frac(numerator: u64, denominator: u64) -> Fraction {
        Fraction {
            numerator,
            denominator,
        }
    }

    #[test]
    fn test_continued_fraction() {
        // 31/13 = 2 + 5/13 → 13/5 = 2 + 3/5 → 5/3 = 1 + 2/3 → 3/2 = 1 + 1/2 → 2
        let cf = continued_fraction(31, 13, 20);
        assert_eq!(cf, vec![2, 2, 1, 1, 2]);

        let convs = convergents(&cf);
        assert_eq!(
            convs,
            vec![frac(2, 1), frac(5, 2), frac(7, 3), frac(12, 5), frac(31, 13)]
        );

        assert_eq!(continued_fraction(7, 1, 10), vec![7]);
        assert_eq!(continued_fraction(0, 5, 10), vec![0]);
        assert_eq!(continued_fraction(31, 13, 2), vec![2, 2]);
        assert!(convergents(&[]).is_empty());
    }

    #[test]
    fn test_readout_expansion() {
        // 192/256 = 3/4 = [0; 1, 3]
        let cf = continued_fraction(192, 256, 64);
        assert_eq!(cf, vec![0, 1, 3]);
        assert_eq!(convergents(&cf).last(), Some(&frac(3, 4)));
    }

    #[test]
    fn test_limit_denominator_exact() {
        assert_eq!(limit_denominator(phase(64, 256), 15), frac(1, 4));
        assert_eq!(limit_denominator(phase(1, 8), 15), frac(1, 8));
        assert_eq!(limit_denominator(phase(3, 4), 15), frac(3, 4));
        assert_eq!(limit_denominator(phase(0, 256), 15), frac(0, 1));
    }

    #[test]
    fn test_limit_denominator_bounded() {
        // 85/256 = [0; 3, 85]: convergent 1/3 beats semiconvergent 4/13
        assert_eq!(limit_denominator(phase(85, 256), 15), frac(1, 3));
        assert_eq!(limit_denominator(phase(171, 256), 15), frac(2, 3));
        // 27/100 with bound 10: semiconvergent 2/7 is closer than 1/4
        assert_eq!(limit_denominator(phase(27, 100), 10), frac(2, 7));
        assert_eq!(limit_denominator(phase(14_159_265, 100_000_000), 1000), frac(16, 113));
        assert_eq!(limit_denominator(phase(14_159_265, 100_000_000), 100), frac(14, 99));
    }

    #[test]
    fn test_limit_denominator_zero_bound() {
        // Bound 0 behaves like bound 1: only 0/1 or 1/1 are admissible.
        assert_eq!(limit_denominator(phase(1, 8), 0), frac(0, 1));
        assert_eq!(limit_denominator(phase(7, 8), 0), frac(1, 1));
    }

    #[test]
    fn test_estimate_period_zero_phase() {
        assert_eq!(estimate_period(PhaseEstimate::zero(), 15), 1);
        assert_eq!(estimate_period(phase(0, 256), 15), 1);
    }

    #[test]
    fn test_estimate_period_exact_for_coprime_fractions() {
        let n = 15;
        for r in 2..=n {
            for s in 1..r {
                if gcd_u64(s, r) != 1 {
                    continue;
                }
                assert_eq!(estimate_period(phase(s, r), n), r, "s/r = {}/{}", s, r);
            }
        }
    }

    #[test]
    fn test_estimate_period_divisor_when_not_coprime() {
        // 2/4 reduces to 1/2: the estimator recovers a divisor of the order.
        assert_eq!(estimate_period(phase(2, 4), 15), 2);
        assert_eq!(estimate_period(phase(128, 256), 15), 2);
    }
}
