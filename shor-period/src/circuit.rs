//! Gate tables for multiplication by a mod 15 on a 4-qubit work register.
//!
//! Each supported base maps to a short list of instructions. Applied to a
//! computational basis state |y⟩ (qubit 0 = least significant bit) the list
//! produces |a·y mod 15⟩ for every y in 1..15. Only swaps and bit flips are
//! needed because multiplication by 2^k mod 15 is a rotation of the 4 bits
//! and multiplication by -1 mod 15 is bitwise complement.

use serde::Serialize;

use crate::error::ConfigError;

/// Modulus the tables are built for.
pub const MODULUS: u64 = 15;

/// Bases with a gate table.
pub const SUPPORTED_BASES: [u64; 6] = [2, 4, 7, 8, 11, 13];

const WORK_QUBITS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Instruction {
    /// Exchange two qubits of the work register.
    Swap(usize, usize),
    /// Flip every qubit of the work register.
    NotAll,
}

use Instruction::{NotAll, Swap};

const TIMES_2: &[Instruction] = &[Swap(3, 2), Swap(2, 1), Swap(1, 0)];
const TIMES_4: &[Instruction] = &[Swap(2, 0), Swap(3, 1)];
const TIMES_8: &[Instruction] = &[Swap(1, 0), Swap(2, 1), Swap(3, 2)];
const TIMES_7: &[Instruction] = &[Swap(1, 0), Swap(2, 1), Swap(3, 2), NotAll];
const TIMES_11: &[Instruction] = &[Swap(2, 0), Swap(3, 1), NotAll];
const TIMES_13: &[Instruction] = &[Swap(3, 2), Swap(2, 1), Swap(1, 0), NotAll];

/// Controlled-U circuit body for U|y⟩ = |a·y mod 15⟩.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModMulCircuit {
    pub base: u64,
    pub instructions: &'static [Instruction],
}

impl ModMulCircuit {
    pub fn for_base(base: u64) -> Result<Self, ConfigError> {
        let instructions = match base {
            2 => TIMES_2,
            4 => TIMES_4,
            7 => TIMES_7,
            8 => TIMES_8,
            11 => TIMES_11,
            13 => TIMES_13,
            _ => {
                return Err(ConfigError::UnsupportedBase {
                    base,
                    modulus: MODULUS,
                    supported: SUPPORTED_BASES.to_vec(),
                })
            }
        };
        Ok(Self { base, instructions })
    }

    /// Apply the circuit once to a basis state of the work register.
    pub fn apply(&self, state: u8) -> u8 {
        self.instructions
            .iter()
            .fold(state & 0x0f, |y, instruction| match *instruction {
                Swap(i, j) => {
                    let bi = (y >> i) & 1;
                    let bj = (y >> j) & 1;
                    if bi == bj {
                        y
                    } else {
                        y ^ ((1 << i) | (1 << j))
                    }
                }
                NotAll => !y & ((1 << WORK_QUBITS) - 1),
            })
    }

    /// Order of the base, read off the circuit: the number of applications
    /// that take |1⟩ back to |1⟩.
    pub fn order(&self) -> u64 {
        let mut state = self.apply(1);
        let mut order = 1;
        while state != 1 {
            state = self.apply(state);
            order += 1;
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factoring_core::multiplicative_order;

    #[test]
    fn test_tables_multiply_by_base() {
        for base in SUPPORTED_BASES {
            let circuit = ModMulCircuit::for_base(base).unwrap();
            for y in 1u8..15 {
                let expected = (base * y as u64 % MODULUS) as u8;
                assert_eq!(circuit.apply(y), expected, "{} * {} mod 15", base, y);
            }
        }
    }

    #[test]
    fn test_orders_match_classical() {
        let expected = [(2, 4), (4, 2), (7, 4), (8, 4), (11, 2), (13, 4)];
        for (base, order) in expected {
            let circuit = ModMulCircuit::for_base(base).unwrap();
            assert_eq!(circuit.order(), order);
            assert_eq!(multiplicative_order(base, MODULUS, 100), Some(order));
        }
    }

    #[test]
    fn test_unsupported_base() {
        for base in [0, 1, 3, 5, 14, 16] {
            assert!(matches!(
                ModMulCircuit::for_base(base),
                Err(ConfigError::UnsupportedBase { base: b, modulus: 15, .. }) if b == base
            ));
        }
    }
}
