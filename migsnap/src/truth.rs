//! Truth tables for small Boolean functions, used for simulation and for matching cuts and windows.

use std::ops::Not;

/// The truth table of a function of `vars` variables, one bit per input assignment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TruthTable {
    vars: usize,
    words: Vec<u64>,
}

const VAR_MASKS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

impl TruthTable {
    fn word_count(vars: usize) -> usize {
        if vars <= 6 {
            1
        } else {
            1 << (vars - 6)
        }
    }

    fn mask(&self) -> u64 {
        if self.vars >= 6 {
            u64::MAX
        } else {
            (1u64 << (1u64 << self.vars)) - 1
        }
    }

    fn normalized(mut self) -> Self {
        let mask = self.mask();
        for word in &mut self.words {
            *word &= mask;
        }
        self
    }

    /// The constant-false function.
    #[must_use]
    pub fn zero(vars: usize) -> Self {
        Self {
            vars,
            words: vec![0; Self::word_count(vars)],
        }
    }

    /// The constant-true function.
    #[must_use]
    pub fn one(vars: usize) -> Self {
        !Self::zero(vars)
    }

    /// The projection onto variable `var`.
    #[must_use]
    pub fn var(vars: usize, var: usize) -> Self {
        assert!(var < vars, "variable {} out of range for {} variables", var, vars);
        let words = (0..Self::word_count(vars))
            .map(|word| {
                if var < 6 {
                    VAR_MASKS[var]
                } else if (word >> (var - 6)) & 1 == 1 {
                    u64::MAX
                } else {
                    0
                }
            })
            .collect();
        Self { vars, words }.normalized()
    }

    /// Bitwise majority of three tables over the same variables.
    #[must_use]
    pub fn maj(a: &Self, b: &Self, c: &Self) -> Self {
        debug_assert!(a.vars == b.vars && b.vars == c.vars);
        let words = a
            .words
            .iter()
            .zip(&b.words)
            .zip(&c.words)
            .map(|((x, y), z)| (x & y) | (x & z) | (y & z))
            .collect();
        Self { vars: a.vars, words }
    }

    /// Complements the table when `complement` is set.
    #[must_use]
    pub fn complement_if(self, complement: bool) -> Self {
        if complement {
            !self
        } else {
            self
        }
    }

    /// Number of variables.
    #[must_use]
    pub fn vars(&self) -> usize {
        self.vars
    }

    /// Returns true for the constant-false function.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Returns true for the constant-true function.
    #[must_use]
    pub fn is_one(&self) -> bool {
        let mask = self.mask();
        self.words.iter().all(|word| *word == mask)
    }

    /// Returns the value of the function for an input assignment.
    #[must_use]
    pub fn bit(&self, assignment: usize) -> bool {
        (self.words[assignment / 64] >> (assignment % 64)) & 1 == 1
    }
}

impl Not for TruthTable {
    type Output = Self;

    fn not(mut self) -> Self {
        for word in &mut self.words {
            *word = !*word;
        }
        self.normalized()
    }
}

impl Not for &TruthTable {
    type Output = TruthTable;

    fn not(self) -> TruthTable {
        !self.clone()
    }
}
