//! Error types for kernel structure construction and composition.

use thiserror::Error;

/// Errors raised when a kernel structure would violate its invariants.
///
/// These are structural failures: the requested composition is undefined,
/// not a numerical problem with fitting it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructureError {
    /// A structure must contain at least one term.
    #[error("Kernel structure cannot be empty")]
    EmptyStructure,

    /// A product term would reference the same dimension twice.
    #[error("Dimension {dim} appears twice in product term {term}")]
    RepeatedDimension { dim: usize, term: String },

    /// The constant kernel is not bound to an input dimension.
    #[error("Constant kernel cannot be bound to dimension {dim}")]
    ConstantWithDimension { dim: usize },

    /// An atom references a dimension the data does not have.
    #[error("Incompatible structure: dimension {dim} out of range for {ndim}-dimensional data")]
    IncompatibleStructure { dim: usize, ndim: usize },

    /// A textual kernel expression could not be parsed.
    #[error("Cannot parse kernel expression '{input}': {reason}")]
    Parse { input: String, reason: String },
}
