//! # semspace
//!
//! Deterministic 3D layouts for semantic embedding vectors.
//!
//! The crate turns a handful (tens) of high-dimensional embeddings into stable
//! `[x, y, z]` positions where similar items sit close together, and fits
//! oriented ellipsoids around groups of positioned points so cluster volumes
//! can be rendered.
//!
//! - [`projector`]: force-directed, similarity-preserving projection to 3D.
//! - [`similarity`]: cosine similarity and the pairwise similarity matrix.
//! - [`eigen`]: Jacobi eigendecomposition of symmetric 3×3 matrices.
//! - [`ellipsoid`]: covariance builder and principal-axis ellipsoids.
//! - [`rng`]: input-derived seeds and the linear-congruential generator.
//! - [`cache`]: optional memoisation of layouts keyed by item identities.
//!
//! Every computation is pure: the same input always yields the same output and
//! non-finite intermediates are replaced by safe fallbacks instead of being
//! propagated.
//!
//! ```
//! use semspace::projector::project_to_3d;
//!
//! let vectors = vec![
//!     vec![1.0, 0.0, 0.0],
//!     vec![0.9, 0.1, 0.0],
//!     vec![0.0, 0.0, 1.0],
//! ];
//! let positions = project_to_3d(&vectors);
//! assert_eq!(positions.len(), 3);
//! assert!(positions.iter().flatten().all(|c| c.is_finite()));
//! ```

pub mod cache;
pub mod eigen;
pub mod ellipsoid;
pub mod error;
pub mod projector;
pub mod rng;
pub mod similarity;

pub use error::LayoutError;

/// A point in the rendered 3D scene.
pub type Position3D = [f64; 3];

/// Row-major 3×3 matrix.
pub type Matrix3 = [[f64; 3]; 3];

#[cfg(test)]
mod tests;
