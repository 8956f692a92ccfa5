//! Errors returned by the checked entry points.
//!
//! The core routines never fail: they contain non-finite values and degenerate
//! input by substitution. `LayoutError` is only produced by the `try_*` and
//! `validate` surfaces for callers that prefer rejecting malformed input.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    /// A vector does not share the dimensionality of the first vector.
    #[error("dimension mismatch at vector {index}: expected {expected}, got {found}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// A vector contains NaN or an infinity.
    #[error("non-finite value in vector {index} at position {position}")]
    NonFiniteInput { index: usize, position: usize },

    /// A parameter struct holds a value the algorithms cannot work with.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Input matrix has fewer columns than required.
    #[error("input dimensionality {found} is below the required {required}")]
    DimensionTooSmall { found: usize, required: usize },
}
