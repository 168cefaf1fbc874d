//! # Kernel - Compositional Covariance Structures
//!
//! This crate provides the symbolic side of compositional Gaussian-process
//! models: kernels built from per-dimension base kernels by sums and
//! products.
//!
//! - **Atoms**: a base kernel family bound to one input dimension (`LIN0`)
//! - **Terms**: products of atoms over distinct dimensions (`LIN0 * SE1`)
//! - **Structures**: sums of terms in canonical form (`LIN0 * SE1 + PER2`)
//!
//! ## Canonical Form
//!
//! Structures are kept in sum-of-products normal form with sorted,
//! deduplicated terms. Two structures built in different orders compare
//! equal, and their expression strings are identical, which makes the
//! string a stable key for caching scores.
//!
//! ```rust
//! use autogpc_kernel::KernelStructure;
//!
//! let a: KernelStructure = "PER2 + SE1 * LIN0".parse().unwrap();
//! let b: KernelStructure = "LIN0 * SE1 + PER2".parse().unwrap();
//! assert_eq!(a, b);
//! assert_eq!(a.to_string(), "LIN0 * SE1 + PER2");
//! ```

pub mod atom;
pub mod error;
pub mod structure;
pub mod term;

pub use atom::{Atom, KernelKind};
pub use error::StructureError;
pub use structure::KernelStructure;
pub use term::Term;
