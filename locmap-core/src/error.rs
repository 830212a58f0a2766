//! Error types for locmap-core.

use thiserror::Error;

/// Result type alias for locmap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for locmap operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input has the wrong dimensionality or length.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// What the operation required.
        expected: String,
        /// What the caller supplied.
        got: String,
    },

    /// Unrecognized marker color literal.
    #[error("unsupported color: {0:?}")]
    UnsupportedColor(String),

    /// Mixture fitting failed to converge or received degenerate input.
    #[error("degenerate fit: {0}")]
    DegenerateFit(String),

    /// Operation invoked with insufficient accumulated data.
    #[error("{operation} requires at least {required} element(s), have {have}")]
    InsufficientData {
        /// The operation that was attempted.
        operation: &'static str,
        /// Minimum number of elements required.
        required: usize,
        /// Number of elements actually held.
        have: usize,
    },

    /// Invalid distribution or configuration parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
