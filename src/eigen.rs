//! Jacobi eigendecomposition for symmetric 3×3 matrices.
//!
//! Used to orient cluster ellipsoids from a covariance matrix. Each sweep
//! zeroes the largest off-diagonal element with a plane rotation
//! `θ = ½·atan2(2·a_pq, a_qq - a_pp)` and accumulates the rotation into the
//! eigenvector matrix. The loop stops when the largest off-diagonal magnitude
//! drops below the tolerance or the iteration budget is spent; both are normal
//! terminations.
//!
//! Eigenpairs are returned sorted by eigenvalue, descending, with unit-length
//! eigenvectors.
//!
//! ```
//! use semspace::eigen::compute_eigendecomposition;
//!
//! let e = compute_eigendecomposition(&[[2.0, 1.0, 0.0], [1.0, 2.0, 0.0], [0.0, 0.0, 1.0]]);
//! assert!((e.eigenvalues[0] - 3.0).abs() < 1e-9);
//! assert!((e.eigenvalues[2] - 1.0).abs() < 1e-9);
//! ```

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::Matrix3;

pub const JACOBI_MAX_ITERATIONS: usize = 50;
pub const JACOBI_TOLERANCE: f64 = 1e-10;

/// Eigenpairs of a symmetric 3×3 matrix, dominant first.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Eigendecomposition {
    pub eigenvalues: [f64; 3],
    /// `eigenvectors[k]` belongs to `eigenvalues[k]`.
    pub eigenvectors: [[f64; 3]; 3],
    /// Jacobi rotations applied before termination.
    pub sweeps: usize,
}

impl Eigendecomposition {
    /// Matrix whose columns are the eigenvectors.
    pub fn basis(&self) -> Matrix3 {
        let v = &self.eigenvectors;
        [
            [v[0][0], v[1][0], v[2][0]],
            [v[0][1], v[1][1], v[2][1]],
            [v[0][2], v[1][2], v[2][2]],
        ]
    }

    /// `V · diag(λ) · Vᵀ`.
    pub fn reconstruct(&self) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (lambda, v) in self.eigenvalues.iter().zip(&self.eigenvectors) {
            for r in 0..3 {
                for c in 0..3 {
                    out[r][c] += lambda * v[r] * v[c];
                }
            }
        }
        out
    }
}

/// Decomposes `matrix` with the default budget and tolerance.
///
/// Only the diagonal and upper triangle are read; non-finite entries count as 0.
pub fn compute_eigendecomposition(matrix: &Matrix3) -> Eigendecomposition {
    compute_eigendecomposition_with(matrix, JACOBI_MAX_ITERATIONS, JACOBI_TOLERANCE)
}

pub fn compute_eigendecomposition_with(
    matrix: &Matrix3,
    max_iterations: usize,
    tolerance: f64,
) -> Eigendecomposition {
    let mut a = symmetrized(matrix);
    let mut v: Matrix3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    let mut sweeps = 0;
    while sweeps < max_iterations {
        let (p, q) = largest_off_diagonal(&a);
        if !(a[p][q].abs() >= tolerance) {
            break;
        }
        rotate(&mut a, &mut v, p, q);
        sweeps += 1;
    }
    let (p, q) = largest_off_diagonal(&a);
    trace!(
        "Jacobi finished after {} rotations, residual off-diagonal {:.3e}",
        sweeps,
        a[p][q].abs()
    );

    let mut pairs: Vec<(f64, [f64; 3])> = (0..3)
        .map(|k| {
            let lambda = if a[k][k].is_finite() { a[k][k] } else { 0.0 };
            (lambda, normalized_or_axis([v[0][k], v[1][k], v[2][k]], k))
        })
        .collect();
    pairs.sort_by(|x, y| y.0.partial_cmp(&x.0).unwrap_or(std::cmp::Ordering::Equal));

    Eigendecomposition {
        eigenvalues: [pairs[0].0, pairs[1].0, pairs[2].0],
        eigenvectors: [pairs[0].1, pairs[1].1, pairs[2].1],
        sweeps,
    }
}

/// Mirrors the upper triangle and zeroes non-finite entries.
fn symmetrized(m: &Matrix3) -> Matrix3 {
    let mut out = [[0.0; 3]; 3];
    let mut replaced = false;
    for r in 0..3 {
        for c in r..3 {
            let x = if m[r][c].is_finite() {
                m[r][c]
            } else {
                replaced = true;
                0.0
            };
            out[r][c] = x;
            out[c][r] = x;
        }
    }
    if replaced {
        warn!("Non-finite entries in eigendecomposition input replaced by 0");
    }
    out
}

fn largest_off_diagonal(a: &Matrix3) -> (usize, usize) {
    let mut best = (0, 1);
    for (p, q) in [(0, 2), (1, 2)] {
        if a[p][q].abs() > a[best.0][best.1].abs() {
            best = (p, q);
        }
    }
    best
}

/// Applies the rotation in the (p, q) plane that zeroes `a[p][q]`.
fn rotate(a: &mut Matrix3, v: &mut Matrix3, p: usize, q: usize) {
    let theta = 0.5 * (2.0 * a[p][q]).atan2(a[q][q] - a[p][p]);
    let (s, c) = theta.sin_cos();
    if !(s.is_finite() && c.is_finite()) {
        return;
    }

    let (app, aqq, apq) = (a[p][p], a[q][q], a[p][q]);
    a[p][p] = c * c * app - 2.0 * c * s * apq + s * s * aqq;
    a[q][q] = s * s * app + 2.0 * c * s * apq + c * c * aqq;
    a[p][q] = 0.0;
    a[q][p] = 0.0;

    // the remaining index of a 3×3 matrix
    let r = 3 - p - q;
    let (arp, arq) = (a[r][p], a[r][q]);
    a[r][p] = c * arp - s * arq;
    a[p][r] = a[r][p];
    a[r][q] = s * arp + c * arq;
    a[q][r] = a[r][q];

    for row in v.iter_mut() {
        let (vp, vq) = (row[p], row[q]);
        row[p] = c * vp - s * vq;
        row[q] = s * vp + c * vq;
    }
}

fn normalized_or_axis(x: [f64; 3], axis: usize) -> [f64; 3] {
    let n = (x[0] * x[0] + x[1] * x[1] + x[2] * x[2]).sqrt();
    if n.is_finite() && n > 1e-12 {
        x.map(|c| c / n)
    } else {
        let mut e = [0.0; 3];
        e[axis] = 1.0;
        e
    }
}
