//! Shor's classical step: turn an even period candidate into factors.

use std::collections::BTreeSet;

use factoring_core::{gcd, is_nontrivial_factor, mod_pow, to_u64};
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

/// The two gcds Shor's algorithm checks for a period candidate r:
/// gcd(a^(r/2) - 1, N) and gcd(a^(r/2) + 1, N).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorCandidates {
    pub minus: u64,
    pub plus: u64,
}

impl FactorCandidates {
    /// Candidates that are real factors of `modulus` other than 1 and itself.
    pub fn accepted(&self, modulus: u64) -> BTreeSet<u64> {
        [self.minus, self.plus]
            .into_iter()
            .filter(|&f| is_nontrivial_factor(modulus, f))
            .collect()
    }
}

/// Compute both factor candidates, or `None` when r is odd or zero
/// (a^(r/2) is not an integer power).
///
/// a^(r/2) is reduced mod N first; gcd(x, N) = gcd(x mod N, N) so the
/// candidates match the unreduced integer powers.
pub fn factor_candidates(base: u64, modulus: u64, period: u64) -> Option<FactorCandidates> {
    if period == 0 || period % 2 != 0 {
        return None;
    }

    let one = BigUint::one();
    let n = BigUint::from(modulus);
    let a_half = mod_pow(&BigUint::from(base), &BigUint::from(period / 2), &n);

    // a^(r/2) - 1 taken mod N; an a^(r/2) ≡ 0 wraps to N - 1.
    let minus = (&a_half + &n - &one) % &n;
    let plus = &a_half + &one;

    Some(FactorCandidates {
        minus: to_u64(&gcd(&minus, &n)),
        plus: to_u64(&gcd(&plus, &n)),
    })
}

/// Non-trivial factors of `modulus` derived from the period candidate.
///
/// Empty when the period is odd, or when both gcds are trivial.
pub fn try_extract_factors(base: u64, modulus: u64, period: u64) -> BTreeSet<u64> {
    factor_candidates(base, modulus, period)
        .map(|candidates| candidates.accepted(modulus))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoring_core::{multiplicative_order, trial_division};

    fn set(values: &[u64]) -> BTreeSet<u64> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_base_13_period_4() {
        // gcd(168, 15) = 3, gcd(170, 15) = 5
        let candidates = factor_candidates(13, 15, 4).unwrap();
        assert_eq!(candidates, FactorCandidates { minus: 3, plus: 5 });
        assert_eq!(try_extract_factors(13, 15, 4), set(&[3, 5]));
    }

    #[test]
    fn test_base_11_period_2() {
        // gcd(10, 15) = 5, gcd(12, 15) = 3
        assert_eq!(
            factor_candidates(11, 15, 2),
            Some(FactorCandidates { minus: 5, plus: 3 })
        );
        assert_eq!(try_extract_factors(11, 15, 2), set(&[3, 5]));
    }

    #[test]
    fn test_base_2_period_8_is_trivial() {
        // 2^4 = 16: gcd(15, 15) = 15 and gcd(17, 15) = 1, both rejected
        assert_eq!(
            factor_candidates(2, 15, 8),
            Some(FactorCandidates { minus: 15, plus: 1 })
        );
        assert!(try_extract_factors(2, 15, 8).is_empty());
    }

    #[test]
    fn test_odd_period_skips_extraction() {
        assert_eq!(factor_candidates(7, 15, 3), None);
        assert!(try_extract_factors(7, 15, 1).is_empty());
        assert!(try_extract_factors(7, 15, 0).is_empty());
    }

    #[test]
    fn test_single_factor_from_divisor_of_order() {
        // r = 2 for base 13 (true order 4): 13 - 1 = 12 → 3, 13 + 1 = 14 → 1
        assert_eq!(try_extract_factors(13, 15, 2), set(&[3]));
    }

    #[test]
    fn test_accepted_factors_are_prime_factors() {
        for n in [15u64, 21, 33, 35, 39, 51, 55, 77, 91] {
            let primes: BTreeSet<u64> = trial_division(n).into_iter().collect();
            for a in 2..n {
                let Some(r) = multiplicative_order(a, n, n) else {
                    continue;
                };
                for r_mult in [r, 2 * r] {
                    let found = try_extract_factors(a, n, r_mult);
                    assert!(found.is_subset(&primes), "n={} a={} r={} found {:?}", n, a, r_mult, found);
                }
            }
        }
    }
}
