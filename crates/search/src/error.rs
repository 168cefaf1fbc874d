//! Error types for fitting, searching and cumulating.
//!
//! Only [`FitError`] is expected during a normal run, and the search absorbs
//! it: a candidate that cannot be fitted is rejected, not fatal. The other
//! enums describe malformed input that the caller has to fix.

use autogpc_kernel::StructureError;
use thiserror::Error;

/// The model oracle could not fit or score a candidate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitError {
    /// Numerical optimisation did not converge.
    #[error("Fit did not converge: {reason}")]
    NonConvergence { reason: String },

    /// The oracle returned scores outside their valid range.
    #[error("Invalid score for {structure}: {reason}")]
    InvalidScore { structure: String, reason: String },

    /// The evaluation observed a cancellation request.
    #[error("Evaluation cancelled")]
    Cancelled,

    /// Any other oracle-side failure, including a panicking worker.
    #[error("Oracle failure: {message}")]
    Oracle { message: String },
}

/// Errors that prevent a search from starting.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// The search configuration is unusable.
    #[error("Invalid search configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Errors from additive cumulation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CumulateError {
    /// Cumulation needs at least one summand.
    #[error("Cannot cumulate an empty list of summands")]
    EmptySummands,

    /// Cumulation was cancelled before every summand was placed.
    #[error("Cumulation cancelled after {placed} of {total} components")]
    Cancelled { placed: usize, total: usize },

    /// A summand references a dimension the dataset does not have.
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Errors from building a labelled dataset.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    /// No data points.
    #[error("Dataset cannot be empty")]
    Empty,

    /// Input rows have different lengths.
    #[error("Row {row} has {got} columns (expected {expected})")]
    RaggedRows { row: usize, expected: usize, got: usize },

    /// A count doesn't match the number of points or dimensions.
    #[error("Expected {expected} {what}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// A class label is not binary.
    #[error("Label {value} at row {row} is not a binary class label")]
    NonBinaryLabel { row: usize, value: f64 },
}
