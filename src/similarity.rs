//! Cosine similarity over embedding vectors and the pairwise similarity matrix.
//!
//! - `cosine_similarity`: clamped to [-1, 1]; zero, empty, mismatched or
//!   non-finite inputs yield the neutral similarity 0.
//! - `SimilarityMatrix`: dense symmetric N×N matrix with unit diagonal, computed
//!   once per projection call. Rows are filled in parallel; each entry is computed
//!   independently, so the result does not depend on scheduling.

use log::{debug, warn};
use rayon::prelude::*;

#[inline]
fn max_abs(a: &[f64]) -> f64 {
    a.iter().fold(0.0f64, |m, &x| m.max(x.abs()))
}

/// Cosine similarity of `a` and `b`, clamped to [-1, 1].
///
/// Each vector is rescaled by its largest absolute component before
/// accumulating, so very large magnitudes do not overflow the norms.
///
/// ```
/// use semspace::similarity::cosine_similarity;
///
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]), 0.0);
/// assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-12);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    if !a.iter().chain(b).all(|x| x.is_finite()) {
        return 0.0;
    }

    let (sa, sb) = (max_abs(a), max_abs(b));
    if sa <= 0.0 || sb <= 0.0 {
        return 0.0;
    }

    let mut num = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x / sa, y / sb);
        num += x * y;
        na += x * x;
        nb += y * y;
    }

    let denom = na.sqrt() * nb.sqrt();
    if !(denom > 0.0) {
        return 0.0;
    }
    let sim = num / denom;
    if sim.is_finite() {
        sim.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Dense symmetric matrix of pairwise cosine similarities.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Computes all pairwise similarities, O(N²·D).
    pub fn compute(vectors: &[Vec<f64>]) -> Self {
        let n = vectors.len();

        if let Some(first) = vectors.first() {
            let dim = first.len();
            if let Some(bad) = vectors.iter().position(|v| v.len() != dim) {
                warn!(
                    "Vector {} has dimension {} (expected {}); its similarities are treated as 0",
                    bad,
                    vectors[bad].len(),
                    dim
                );
            }
        }

        // upper triangle, one row per task
        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i + 1..n)
                    .map(|j| cosine_similarity(&vectors[i], &vectors[j]))
                    .collect()
            })
            .collect();

        let mut values = vec![0.0; n * n];
        for (i, row) in upper.iter().enumerate() {
            values[i * n + i] = 1.0;
            for (offset, &s) in row.iter().enumerate() {
                let j = i + 1 + offset;
                values[i * n + j] = s;
                values[j * n + i] = s;
            }
        }

        let out = Self { n, values };
        if n > 1 {
            let (min, max, mean) = out.off_diagonal_stats();
            debug!(
                "Similarity matrix {}x{}: min={:.4}, max={:.4}, mean={:.4}",
                n, n, min, max, mean
            );
        }
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Entry (i, j).
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "index ({i},{j}) out of bounds");
        self.values[i * self.n + j]
    }

    /// (min, max, mean) over the strict upper triangle.
    pub fn off_diagonal_stats(&self) -> (f64, f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut cnt = 0usize;
        for i in 0..self.n {
            for j in i + 1..self.n {
                let s = self.values[i * self.n + j];
                min = min.min(s);
                max = max.max(s);
                sum += s;
                cnt += 1;
            }
        }
        if cnt == 0 {
            return (0.0, 0.0, 0.0);
        }
        (min, max, sum / cnt as f64)
    }
}
