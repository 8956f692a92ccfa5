//! # Similarity-preserving 3D projection
//!
//! Maps N embedding vectors of any (shared) dimensionality to N positions in
//! a bounded 3D cube, so that semantically similar items end up close together
//! and dissimilar items end up apart.
//!
//! ## Algorithm
//!
//! Degenerate sizes are closed-form: no vectors give no positions, one vector
//! sits at the origin, two vectors are placed symmetrically on the x axis.
//!
//! For N ≥ 3 the layout is an annealed force simulation:
//!
//! 1. **Seeding**: an order-dependent reduction over the input feeds a
//!    Park-Miller LCG (see [`crate::rng`]); the same input always yields the same
//!    layout.
//! 2. **Initialisation**: points are scattered on a spherical shell with radius in
//!    `[init_radius_min, init_radius_max]`, so no two points start coincident.
//! 3. **Similarity**: the N×N cosine matrix is computed once and reused.
//! 4. **Relaxation**: for `iterations` passes a decay factor
//!    `1 - iter/iterations` scales both strengths. Every unordered pair
//!    contributes
//!    `(d - ideal) * attraction - repulsion / (d² + 1)` along the pair axis, with
//!    `ideal = (1 - sim) * distance_span + min_distance`. Forces are accumulated
//!    into a fresh per-iteration buffer, then each net force is clamped to
//!    `[-force_clamp, force_clamp]` and each position to
//!    `[-position_bound, position_bound]`.
//! 5. **Centering**: the centroid is subtracted and positions are re-clamped.
//!
//! Non-finite intermediates never leave a computation step: a non-finite force
//! component becomes 0 and a non-finite position keeps its previous value.
//!
//! ## Complexity
//!
//! O(N²·D) for the similarity matrix plus O(N²·iterations) for the relaxation.
//! Intended for tens of items per call.
//!
//! ```
//! use semspace::projector::ForceProjector;
//!
//! let projector = ForceProjector::new().with_iterations(80);
//! let out = projector.project(&vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]);
//! assert_eq!(out.len(), 3);
//! ```

use std::f64::consts::PI;

use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

use crate::error::LayoutError;
use crate::rng::{derive_seed, SeededLcg};
use crate::similarity::SimilarityMatrix;
use crate::Position3D;

pub const DEFAULT_ITERATIONS: usize = 150;
pub const DEFAULT_MIN_DISTANCE: f64 = 2.0;
pub const DEFAULT_DISTANCE_SPAN: f64 = 10.0;
pub const DEFAULT_ATTRACTION: f64 = 0.05;
pub const DEFAULT_REPULSION: f64 = 1.0;
pub const DEFAULT_FORCE_CLAMP: f64 = 2.0;
pub const DEFAULT_POSITION_BOUND: f64 = 15.0;
pub const DEFAULT_DISTANCE_EPSILON: f64 = 0.01;
pub const DEFAULT_SEED_OFFSET: u64 = 12345;

/// Tunable constants of the force layout.
///
/// The defaults were picked for legibility in a 3D viewer; none of them is
/// derived from an optimisation criterion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectorParams {
    /// Relaxation passes.
    pub iterations: usize,
    /// Ideal distance of a pair with similarity 1.
    pub min_distance: f64,
    /// Added to `min_distance` per unit of `1 - similarity`.
    pub distance_span: f64,
    pub attraction: f64,
    pub repulsion: f64,
    /// Per-component bound on a point's net force in one pass.
    pub force_clamp: f64,
    /// Half-width of the bounding cube.
    pub position_bound: f64,
    /// Floor for pair distances.
    pub distance_epsilon: f64,
    pub init_radius_min: f64,
    pub init_radius_max: f64,
    pub seed_offset: u64,
    /// |x| of both points when N = 2.
    pub pair_separation: f64,
}

impl Default for ProjectorParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            min_distance: DEFAULT_MIN_DISTANCE,
            distance_span: DEFAULT_DISTANCE_SPAN,
            attraction: DEFAULT_ATTRACTION,
            repulsion: DEFAULT_REPULSION,
            force_clamp: DEFAULT_FORCE_CLAMP,
            position_bound: DEFAULT_POSITION_BOUND,
            distance_epsilon: DEFAULT_DISTANCE_EPSILON,
            init_radius_min: 3.0,
            init_radius_max: 10.0,
            seed_offset: DEFAULT_SEED_OFFSET,
            pair_separation: 5.0,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> LayoutError {
    LayoutError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

impl ProjectorParams {
    pub fn validate(&self) -> Result<(), LayoutError> {
        let positive = [
            ("min_distance", self.min_distance),
            ("force_clamp", self.force_clamp),
            ("position_bound", self.position_bound),
            ("distance_epsilon", self.distance_epsilon),
            ("pair_separation", self.pair_separation),
        ];
        for (name, v) in positive {
            if !(v.is_finite() && v > 0.0) {
                return Err(invalid(name, format!("must be finite and > 0, got {v}")));
            }
        }
        let non_negative = [
            ("distance_span", self.distance_span),
            ("attraction", self.attraction),
            ("repulsion", self.repulsion),
            ("init_radius_min", self.init_radius_min),
        ];
        for (name, v) in non_negative {
            if !(v.is_finite() && v >= 0.0) {
                return Err(invalid(name, format!("must be finite and >= 0, got {v}")));
            }
        }
        if !(self.init_radius_max.is_finite() && self.init_radius_max >= self.init_radius_min) {
            return Err(invalid(
                "init_radius_max",
                format!(
                    "must be finite and >= init_radius_min ({}), got {}",
                    self.init_radius_min, self.init_radius_max
                ),
            ));
        }
        Ok(())
    }

    /// `(1 - sim) * distance_span + min_distance`, with `sim` clamped to [-1, 1]
    /// and non-finite similarity treated as 0.
    #[inline]
    pub fn ideal_distance(&self, similarity: f64) -> f64 {
        let s = if similarity.is_finite() {
            similarity.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        (1.0 - s) * self.distance_span + self.min_distance
    }
}

/// Positions plus convergence diagnostics for one projection call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionReport {
    pub positions: Vec<Position3D>,
    /// Seed derived from the input (0 for the closed-form sizes).
    pub seed: u64,
    /// Relaxation passes that ran.
    pub iterations: usize,
    /// Normalised stress of the initial scatter.
    pub initial_stress: f64,
    /// Normalised stress after centering.
    pub final_stress: f64,
}

/// Force-directed projector, configured builder-style.
#[derive(Clone, Debug, Default)]
pub struct ForceProjector {
    params: ProjectorParams,
}

impl ForceProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: ProjectorParams) -> Self {
        info!("Configuring projector with {:?}", params);
        self.params = params;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        info!("Setting relaxation iterations: {}", iterations);
        self.params.iterations = iterations;
        self
    }

    /// Ideal distances range over `[min_distance, min_distance + 2 * span]`.
    pub fn with_distance_bounds(mut self, min_distance: f64, span: f64) -> Self {
        info!("Setting distance bounds: min={}, span={}", min_distance, span);
        self.params.min_distance = min_distance;
        self.params.distance_span = span;
        self
    }

    pub fn with_strengths(mut self, attraction: f64, repulsion: f64) -> Self {
        info!(
            "Setting force strengths: attraction={}, repulsion={}",
            attraction, repulsion
        );
        self.params.attraction = attraction;
        self.params.repulsion = repulsion;
        self
    }

    pub fn with_clamps(mut self, force_clamp: f64, position_bound: f64) -> Self {
        info!(
            "Setting clamps: force=±{}, position=±{}",
            force_clamp, position_bound
        );
        self.params.force_clamp = force_clamp;
        self.params.position_bound = position_bound;
        self
    }

    pub fn with_seed_offset(mut self, offset: u64) -> Self {
        info!("Setting seed offset: {}", offset);
        self.params.seed_offset = offset;
        self
    }

    pub fn params(&self) -> &ProjectorParams {
        &self.params
    }

    /// Configured params, or the defaults if they do not validate.
    fn effective_params(&self) -> ProjectorParams {
        match self.params.validate() {
            Ok(()) => self.params,
            Err(e) => {
                warn!("{}; falling back to default projector params", e);
                ProjectorParams::default()
            }
        }
    }

    /// Projects `vectors` to 3D; `output[i]` belongs to `vectors[i]`.
    pub fn project(&self, vectors: &[Vec<f64>]) -> Vec<Position3D> {
        self.project_with_report(vectors).positions
    }

    /// Like [`ForceProjector::project`], but rejects invalid params, unequal
    /// dimensionality and non-finite entries instead of containing them.
    pub fn try_project(&self, vectors: &[Vec<f64>]) -> Result<Vec<Position3D>, LayoutError> {
        self.params.validate()?;
        check_vectors(vectors)?;
        Ok(run_layout(vectors, &self.params).positions)
    }

    pub fn project_with_report(&self, vectors: &[Vec<f64>]) -> ProjectionReport {
        let params = self.effective_params();
        run_layout(vectors, &params)
    }

    /// Dense-matrix variant: N×D rows in, N×3 positions out.
    pub fn project_matrix(
        &self,
        data: &DenseMatrix<f64>,
    ) -> Result<DenseMatrix<f64>, LayoutError> {
        let (n_rows, n_cols) = data.shape();
        debug!("Projecting {}x{} matrix to 3D", n_rows, n_cols);
        if n_cols == 0 {
            return Err(LayoutError::DimensionTooSmall {
                found: 0,
                required: 1,
            });
        }

        let rows: Vec<Vec<f64>> = (0..n_rows)
            .map(|i| data.get_row(i).iterator(0).copied().collect())
            .collect();
        let positions = self.project(&rows);

        let flat = positions.into_iter().flatten();
        Ok(DenseMatrix::from_iterator(flat, n_rows, 3, 0))
    }
}

/// Projects with the default parameters.
pub fn project_to_3d(vectors: &[Vec<f64>]) -> Vec<Position3D> {
    ForceProjector::default().project(vectors)
}

fn check_vectors(vectors: &[Vec<f64>]) -> Result<(), LayoutError> {
    let Some(first) = vectors.first() else {
        return Ok(());
    };
    let dim = first.len();
    for (index, v) in vectors.iter().enumerate() {
        if v.len() != dim {
            return Err(LayoutError::DimensionMismatch {
                index,
                expected: dim,
                found: v.len(),
            });
        }
        if let Some(position) = v.iter().position(|x| !x.is_finite()) {
            return Err(LayoutError::NonFiniteInput { index, position });
        }
    }
    Ok(())
}

fn run_layout(vectors: &[Vec<f64>], params: &ProjectorParams) -> ProjectionReport {
    let n = vectors.len();
    let closed_form = |positions: Vec<Position3D>| ProjectionReport {
        positions,
        seed: 0,
        iterations: 0,
        initial_stress: 0.0,
        final_stress: 0.0,
    };

    match n {
        0 => return closed_form(Vec::new()),
        1 => return closed_form(vec![[0.0; 3]]),
        2 => {
            let x = params.pair_separation.min(params.position_bound);
            return closed_form(vec![[-x, 0.0, 0.0], [x, 0.0, 0.0]]);
        }
        _ => {}
    }

    info!(
        "Projecting {} vectors of dimension {} to 3D ({} iterations)",
        n,
        vectors[0].len(),
        params.iterations
    );

    let seed = derive_seed(vectors, params.seed_offset);
    let mut rng = SeededLcg::new(seed);
    debug!("Layout seed: {}", seed);

    let mut positions = initial_layout(n, &mut rng, params);
    let sims = SimilarityMatrix::compute(vectors);
    let initial_stress = layout_stress(&positions, &sims, params);

    let mut forces = vec![[0.0f64; 3]; n];
    for iter in 0..params.iterations {
        let decay = 1.0 - iter as f64 / params.iterations as f64;
        let attraction = params.attraction * decay;
        let repulsion = params.repulsion * decay;

        forces.iter_mut().for_each(|f| *f = [0.0; 3]);
        accumulate_forces(&positions, &sims, params, attraction, repulsion, &mut forces);
        let max_step = apply_forces(&mut positions, &forces, params);

        trace!(
            "iter {}: decay={:.4}, max displacement={:.5}",
            iter,
            decay,
            max_step
        );
    }

    center(&mut positions, params.position_bound);
    let final_stress = layout_stress(&positions, &sims, params);

    debug!(
        "Stress: initial={:.5}, final={:.5}",
        initial_stress, final_stress
    );
    info!("Projection of {} vectors completed", n);

    ProjectionReport {
        positions,
        seed,
        iterations: params.iterations,
        initial_stress,
        final_stress,
    }
}

/// Random points on a spherical shell.
fn initial_layout(n: usize, rng: &mut SeededLcg, params: &ProjectorParams) -> Vec<Position3D> {
    (0..n)
        .map(|_| {
            let theta = 2.0 * PI * rng.next_f64();
            let phi = (2.0 * rng.next_f64() - 1.0).clamp(-1.0, 1.0).acos();
            let r = rng.uniform(params.init_radius_min, params.init_radius_max);
            let p = [
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            ];
            p.map(|c| clamp_coord(c, 0.0, params.position_bound))
        })
        .collect()
}

/// Unit axis used when two points coincide exactly and have no direction.
#[inline]
fn coincident_axis(i: usize, j: usize) -> [f64; 3] {
    let mut axis = [0.0; 3];
    axis[(i + j) % 3] = 1.0;
    axis
}

/// One synchronous pass over all unordered pairs. `forces` must be zeroed.
///
/// Distances are floored at `distance_epsilon`; the direction stays the real
/// separation unless the points coincide.
pub(crate) fn accumulate_forces(
    positions: &[Position3D],
    sims: &SimilarityMatrix,
    params: &ProjectorParams,
    attraction: f64,
    repulsion: f64,
    forces: &mut [[f64; 3]],
) {
    let n = positions.len();
    let eps = params.distance_epsilon;
    for i in 0..n {
        for j in i + 1..n {
            let delta = [
                positions[j][0] - positions[i][0],
                positions[j][1] - positions[i][1],
                positions[j][2] - positions[i][2],
            ];
            let raw = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
            if !raw.is_finite() {
                continue;
            }
            let dist = raw.max(eps);
            let dir = if raw > 0.0 {
                delta.map(|c| c / dist)
            } else {
                coincident_axis(i, j)
            };

            let ideal = params.ideal_distance(sims.get(i, j));
            let magnitude = (dist - ideal) * attraction - repulsion / (dist * dist + 1.0);
            if !magnitude.is_finite() {
                continue;
            }

            for k in 0..3 {
                let f = dir[k] * magnitude;
                forces[i][k] += f;
                forces[j][k] -= f;
            }
        }
    }
}

/// Clamps forces and positions; returns the largest applied component.
fn apply_forces(positions: &mut [Position3D], forces: &[[f64; 3]], params: &ProjectorParams) -> f64 {
    let mut max_step = 0.0f64;
    for (p, f) in positions.iter_mut().zip(forces) {
        for k in 0..3 {
            let step = if f[k].is_finite() {
                f[k].clamp(-params.force_clamp, params.force_clamp)
            } else {
                0.0
            };
            p[k] = clamp_coord(p[k] + step, p[k], params.position_bound);
            max_step = max_step.max(step.abs());
        }
    }
    max_step
}

#[inline]
fn clamp_coord(value: f64, fallback: f64, bound: f64) -> f64 {
    if value.is_finite() {
        value.clamp(-bound, bound)
    } else {
        fallback.clamp(-bound, bound)
    }
}

/// Subtracts the centroid, then re-clamps into the cube.
fn center(positions: &mut [Position3D], bound: f64) {
    if positions.is_empty() {
        return;
    }
    let inv = 1.0 / positions.len() as f64;
    let mut centroid = [0.0; 3];
    for p in positions.iter() {
        for k in 0..3 {
            centroid[k] += p[k] * inv;
        }
    }
    if !centroid.iter().all(|c| c.is_finite()) {
        warn!("Non-finite layout centroid; skipping centering");
        return;
    }
    for p in positions.iter_mut() {
        for k in 0..3 {
            p[k] = clamp_coord(p[k] - centroid[k], p[k], bound);
        }
    }
}

/// Normalised stress `Σ (d - ideal)² / Σ ideal²` over unordered pairs.
///
/// 0 means every pair sits at its ideal distance. Returns 0 for fewer than two
/// points.
pub fn layout_stress(
    positions: &[Position3D],
    sims: &SimilarityMatrix,
    params: &ProjectorParams,
) -> f64 {
    let n = positions.len().min(sims.len());
    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            let d = distance(&positions[i], &positions[j]);
            let ideal = params.ideal_distance(sims.get(i, j));
            if d.is_finite() {
                num += (d - ideal) * (d - ideal);
                den += ideal * ideal;
            }
        }
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Euclidean distance between two positions.
#[inline]
pub fn distance(a: &Position3D, b: &Position3D) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}
