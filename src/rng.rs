//! Input-derived seeding and a small linear-congruential generator.
//!
//! Layouts must be reproducible, so nothing here touches thread-local or OS
//! randomness: the seed is a cheap order-dependent reduction over the input
//! vectors and the generator is the Park-Miller "minimal standard" LCG
//! (`x' = 16807·x mod 2³¹-1`).
//!
//! ```
//! use semspace::rng::{derive_seed, SeededLcg};
//!
//! let vectors = vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]];
//! let seed = derive_seed(&vectors, 12345);
//! assert_eq!(seed, derive_seed(&vectors, 12345));
//!
//! let mut a = SeededLcg::new(seed);
//! let mut b = SeededLcg::new(seed);
//! assert_eq!(a.next_f64(), b.next_f64());
//! ```

use log::trace;
use rand::RngCore;

/// Park-Miller modulus, 2³¹ - 1.
pub const LCG_MODULUS: u64 = 2_147_483_647;
/// Park-Miller multiplier.
pub const LCG_MULTIPLIER: u64 = 16_807;

/// Order-dependent seed over a vector list.
///
/// Sums `(i + 1) * ((v[0] + v[1]) * 1000 + len(v))` over the items; missing or
/// non-finite leading coordinates count as 0. The magnitude is truncated, reduced
/// modulo the LCG modulus and shifted by `offset`.
pub fn derive_seed(vectors: &[Vec<f64>], offset: u64) -> u64 {
    fn coord(v: &[f64], k: usize) -> f64 {
        v.get(k).copied().filter(|x| x.is_finite()).unwrap_or(0.0)
    }

    let acc: f64 = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let term = ((coord(v, 0) + coord(v, 1)) * 1000.0 + v.len() as f64) * (i + 1) as f64;
            if term.is_finite() {
                term
            } else {
                0.0
            }
        })
        .sum();

    let base = if acc.is_finite() {
        (acc.abs().trunc() % LCG_MODULUS as f64) as u64
    } else {
        0
    };
    let seed = base.wrapping_add(offset);
    trace!("Derived seed {} from {} vectors (acc={:.3})", seed, vectors.len(), acc);
    seed
}

/// Minimal-standard linear-congruential generator.
///
/// Implements [`RngCore`] so it composes with `rand` adaptors, but the layout
/// code only needs [`SeededLcg::next_f64`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededLcg {
    state: u64,
}

impl SeededLcg {
    /// Any seed is accepted; it is folded into `[1, 2³¹-2]` since 0 is a fixed point.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % (LCG_MODULUS - 1) + 1,
        }
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.state = self.state * LCG_MULTIPLIER % LCG_MODULUS;
        self.state
    }

    /// Uniform sample in [0, 1).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        (self.step() - 1) as f64 / (LCG_MODULUS - 1) as f64
    }

    /// Uniform sample in [lo, hi).
    #[inline]
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

impl RngCore for SeededLcg {
    fn next_u32(&mut self) -> u32 {
        // 31 bits per step; borrow the low bit of a second step
        let hi = (self.step() as u32) << 1;
        hi | (self.step() & 1) as u32
    }

    fn next_u64(&mut self) -> u64 {
        ((self.next_u32() as u64) << 32) | self.next_u32() as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
