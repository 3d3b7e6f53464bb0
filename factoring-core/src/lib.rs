//! Shared number theory for the Shor period-recovery experiments.
//!
//! Everything here is classical: modular exponentiation, gcd, multiplicative
//! order, and the checks used to decide whether a gcd is a real factor.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::ToPrimitive;

/// Modular exponentiation: base^exp mod modulus.
pub fn mod_pow(base: &BigUint, exp: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exp, modulus)
}

/// Greatest common divisor.
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

/// Greatest common divisor for machine words.
pub fn gcd_u64(a: u64, b: u64) -> u64 {
    a.gcd(&b)
}

/// Convert BigUint to u64 (panics if too large).
pub fn to_u64(n: &BigUint) -> u64 {
    n.to_u64().expect("number too large for u64")
}

/// Multiplicative order of `a` modulo `n`: the smallest r ≥ 1 with a^r ≡ 1 (mod n).
///
/// Classical brute force, bounded by `max_order` steps. Returns `None` when
/// `a` is not a unit mod `n` or the order exceeds the bound.
pub fn multiplicative_order(a: u64, n: u64, max_order: u64) -> Option<u64> {
    if n < 2 || gcd_u64(a % n, n) != 1 {
        return None;
    }
    let a_mod = a % n;
    let mut current = a_mod;

    for order in 1..=max_order {
        if current == 1 {
            return Some(order);
        }
        current = ((current as u128 * a_mod as u128) % n as u128) as u64;
    }

    None
}

/// A divisor of `n` that is neither 1 nor `n` itself.
pub fn is_nontrivial_factor(n: u64, factor: u64) -> bool {
    factor != 0 && factor != 1 && factor != n && n % factor == 0
}

/// Prime factorization by trial division, smallest factor first.
pub fn trial_division(n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut remaining = n;

    if remaining < 2 {
        return factors;
    }

    while remaining % 2 == 0 {
        factors.push(2);
        remaining /= 2;
    }

    let mut divisor = 3u64;
    while divisor.saturating_mul(divisor) <= remaining {
        while remaining % divisor == 0 {
            factors.push(divisor);
            remaining /= divisor;
        }
        divisor += 2;
    }

    if remaining > 1 {
        factors.push(remaining);
    }

    factors
}

/// True when `n` has no divisor other than 1 and itself.
pub fn is_prime(n: u64) -> bool {
    n >= 2 && trial_division(n).len() == 1
}
