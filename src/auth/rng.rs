//! The oracle environment's pseudo-random generator
//!
//! The oracle host seeds a single generator once near process start and
//! draws from it for every key and challenge letter afterward. Predicting
//! its output therefore requires this exact algorithm, not a general-
//! purpose RNG: a 31-bit linear congruential generator with the classic
//! 1103515245 / 12345 parameters.

/// Challenge alphabet, in the oracle's draw order
pub const AUTH_LETTERS: [char; 4] = ['u', 'd', 'l', 'r'];

/// Keys are drawn modulo this value
pub const KEY_MODULUS: u32 = 100_000_000;

/// Deterministic replica of the oracle's generator
#[derive(Debug, Clone)]
pub struct OracleRng {
    state: u32,
}

impl OracleRng {
    pub fn seeded(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next raw 31-bit draw
    pub fn next_raw(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & 0x7fff_ffff;
        self.state
    }

    /// Next resource-key draw
    pub fn next_key(&mut self) -> u32 {
        self.next_raw() % KEY_MODULUS
    }

    /// Next challenge letter
    pub fn next_letter(&mut self) -> char {
        AUTH_LETTERS[(self.next_raw() % AUTH_LETTERS.len() as u32) as usize]
    }
}
