//! Covariance matrices and principal-axis ellipsoids for groups of 3D points.
//!
//! A group's covariance (population, plus `regularization` on the diagonal) is
//! diagonalised with [`crate::eigen`]; eigenvalues become radii through
//! `max(sqrt(|λ|) * scale_factor, min_radius) * fatness` and eigenvectors become
//! the rotation basis. Singleton, colinear and coplanar groups therefore still
//! produce a visible volume.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::eigen::compute_eigendecomposition;
use crate::error::LayoutError;
use crate::{Matrix3, Position3D};

/// Radius and regularisation settings for [`Ellipsoid::fit`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EllipsoidParams {
    /// Standard deviations per radius.
    pub scale_factor: f64,
    /// Floor applied before `fatness`.
    pub min_radius: f64,
    /// Final multiplier on every radius.
    pub fatness: f64,
    /// Added to the covariance diagonal.
    pub regularization: f64,
}

impl Default for EllipsoidParams {
    fn default() -> Self {
        Self {
            scale_factor: 2.0,
            min_radius: 0.6,
            fatness: 1.15,
            regularization: 1e-6,
        }
    }
}

impl EllipsoidParams {
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (name, v) in [
            ("scale_factor", self.scale_factor),
            ("min_radius", self.min_radius),
            ("fatness", self.fatness),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(LayoutError::InvalidParameter {
                    name,
                    reason: format!("must be finite and > 0, got {v}"),
                });
            }
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(LayoutError::InvalidParameter {
                name: "regularization",
                reason: format!("must be finite and >= 0, got {}", self.regularization),
            });
        }
        Ok(())
    }

    /// `max(sqrt(|variance|) * scale_factor, min_radius) * fatness`.
    #[inline]
    pub fn radius_for(&self, variance: f64) -> f64 {
        let r = variance.abs().sqrt() * self.scale_factor;
        let r = if r.is_finite() { r } else { self.min_radius };
        r.max(self.min_radius) * self.fatness
    }
}

#[inline]
fn finite_points(points: &[Position3D]) -> impl Iterator<Item = &Position3D> {
    points.iter().filter(|p| p.iter().all(|c| c.is_finite()))
}

/// Mean of the finite points; the origin when there are none.
pub fn centroid(points: &[Position3D]) -> Position3D {
    let mut sum = [0.0; 3];
    let mut cnt = 0usize;
    for p in finite_points(points) {
        for k in 0..3 {
            sum[k] += p[k];
        }
        cnt += 1;
    }
    if cnt == 0 {
        return [0.0; 3];
    }
    let c = sum.map(|s| s / cnt as f64);
    if c.iter().all(|x| x.is_finite()) {
        c
    } else {
        [0.0; 3]
    }
}

/// Population covariance of the finite points plus `regularization · I`.
///
/// ```
/// use semspace::ellipsoid::covariance_matrix;
///
/// let cov = covariance_matrix(&[[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]], 0.0);
/// assert_eq!(cov[0][0], 1.0);
/// assert_eq!(cov[1][1], 0.0);
/// ```
pub fn covariance_matrix(points: &[Position3D], regularization: f64) -> Matrix3 {
    let c = centroid(points);
    let mut cov = [[0.0; 3]; 3];
    let mut cnt = 0usize;
    for p in finite_points(points) {
        let d = [p[0] - c[0], p[1] - c[1], p[2] - c[2]];
        for a in 0..3 {
            for b in a..3 {
                cov[a][b] += d[a] * d[b];
            }
        }
        cnt += 1;
    }

    let reg = if regularization.is_finite() {
        regularization
    } else {
        0.0
    };
    for a in 0..3 {
        for b in a..3 {
            let v = if cnt > 0 { cov[a][b] / cnt as f64 } else { 0.0 };
            let v = if v.is_finite() { v } else { 0.0 };
            cov[a][b] = v;
            cov[b][a] = v;
        }
        cov[a][a] += reg;
    }
    cov
}

/// Oriented ellipsoid enclosing a group of points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub center: Position3D,
    /// Descending.
    pub radii: [f64; 3],
    /// Column `k` is the unit axis of `radii[k]`; right-handed.
    pub rotation: Matrix3,
}

impl Ellipsoid {
    /// Fits an ellipsoid to `points`; invalid params fall back to the defaults.
    pub fn fit(points: &[Position3D], params: &EllipsoidParams) -> Self {
        let params = match params.validate() {
            Ok(()) => *params,
            Err(e) => {
                warn!("{}; falling back to default ellipsoid params", e);
                EllipsoidParams::default()
            }
        };

        let center = centroid(points);
        let cov = covariance_matrix(points, params.regularization);
        let eig = compute_eigendecomposition(&cov);

        let mut axes: Vec<(f64, [f64; 3])> = eig
            .eigenvalues
            .iter()
            .zip(eig.eigenvectors)
            .map(|(&lambda, v)| (params.radius_for(lambda), v))
            .collect();
        // |λ| can reorder tiny negative eigenvalues
        axes.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut rotation = [[0.0; 3]; 3];
        for (k, (_, v)) in axes.iter().enumerate() {
            for r in 0..3 {
                rotation[r][k] = v[r];
            }
        }
        if determinant(&rotation) < 0.0 {
            for row in rotation.iter_mut() {
                row[2] = -row[2];
            }
        }

        debug!(
            "Ellipsoid over {} points: radii=({:.3}, {:.3}, {:.3}), {} Jacobi rotations",
            points.len(),
            axes[0].0,
            axes[1].0,
            axes[2].0,
            eig.sweeps
        );

        Self {
            center,
            radii: [axes[0].0, axes[1].0, axes[2].0],
            rotation,
        }
    }

    /// Unit axis `k` (column `k` of the rotation).
    pub fn axis(&self, k: usize) -> [f64; 3] {
        [self.rotation[0][k], self.rotation[1][k], self.rotation[2][k]]
    }

    /// Rotation as a unit quaternion `[x, y, z, w]`.
    pub fn quaternion(&self) -> [f64; 4] {
        let m = &self.rotation;
        let trace = m[0][0] + m[1][1] + m[2][2];
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            [
                (m[2][1] - m[1][2]) / s,
                (m[0][2] - m[2][0]) / s,
                (m[1][0] - m[0][1]) / s,
                0.25 * s,
            ]
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
            [
                0.25 * s,
                (m[0][1] + m[1][0]) / s,
                (m[0][2] + m[2][0]) / s,
                (m[2][1] - m[1][2]) / s,
            ]
        } else if m[1][1] > m[2][2] {
            let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
            [
                (m[0][1] + m[1][0]) / s,
                0.25 * s,
                (m[1][2] + m[2][1]) / s,
                (m[0][2] - m[2][0]) / s,
            ]
        } else {
            let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
            [
                (m[0][2] + m[2][0]) / s,
                (m[1][2] + m[2][1]) / s,
                0.25 * s,
                (m[1][0] - m[0][1]) / s,
            ]
        };

        let n = q.iter().map(|c| c * c).sum::<f64>().sqrt();
        if n.is_finite() && n > 0.0 {
            q.map(|c| c / n)
        } else {
            [0.0, 0.0, 0.0, 1.0]
        }
    }
}

fn determinant(m: &Matrix3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Groups `positions` by cluster label and fits one ellipsoid per label.
///
/// Positions and labels are zipped; surplus entries on either side are ignored.
pub fn fit_cluster_ellipsoids(
    positions: &[Position3D],
    labels: &[usize],
    params: &EllipsoidParams,
) -> BTreeMap<usize, Ellipsoid> {
    if positions.len() != labels.len() {
        warn!(
            "{} positions but {} labels; extra entries ignored",
            positions.len(),
            labels.len()
        );
    }

    let mut groups: BTreeMap<usize, Vec<Position3D>> = BTreeMap::new();
    for (p, &label) in positions.iter().zip(labels) {
        groups.entry(label).or_default().push(*p);
    }
    info!("Fitting ellipsoids for {} clusters", groups.len());

    groups
        .into_iter()
        .map(|(label, pts)| (label, Ellipsoid::fit(&pts, params)))
        .collect()
}
