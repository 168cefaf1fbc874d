//! # Kernel Structures
//!
//! A kernel structure is a covariance function written as a sum of products
//! of base kernels, e.g. `LIN0 * SE1 + PER2`. The sum-of-products form is
//! canonical: terms are deduplicated and sorted, factors inside a term are
//! sorted, so equality does not depend on how a structure was built.
//!
//! ## Operations
//!
//! | Operation | Meaning |
//! |-----------|---------|
//! | `add` | union of the two term sets |
//! | `multiply` | distribute products over sums |
//! | `to_summands` | one single-term structure per term |
//! | `active_dims` | every dimension some atom is bound to |
//!
//! Structures are values: every operation returns a new structure and
//! leaves its operands untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::atom::{Atom, KernelKind};
use crate::error::StructureError;
use crate::term::Term;

/// An immutable sum of product terms.
///
/// Serializes as its canonical expression string.
///
/// # Example
///
/// ```rust
/// use autogpc_kernel::{Atom, KernelStructure};
///
/// let lin = KernelStructure::from_atom(Atom::linear(0));
/// let per = KernelStructure::from_atom(Atom::periodic(1));
///
/// let sum = lin.add(&per);
/// assert_eq!(sum.to_string(), "LIN0 + PER1");
/// assert_eq!(sum.to_summands(), vec![lin, per]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct KernelStructure {
    terms: BTreeSet<Term>,
}

impl KernelStructure {
    /// Build a structure from its additive terms.
    ///
    /// Identical terms collapse into one.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::EmptyStructure`] if no terms are given.
    pub fn new(terms: impl IntoIterator<Item = Term>) -> Result<Self, StructureError> {
        let terms: BTreeSet<Term> = terms.into_iter().collect();
        if terms.is_empty() {
            return Err(StructureError::EmptyStructure);
        }
        Ok(Self { terms })
    }

    /// A single-atom structure.
    pub fn from_atom(atom: Atom) -> Self {
        Self::from_term(Term::atom(atom))
    }

    /// A single-term structure.
    pub fn from_term(term: Term) -> Self {
        Self {
            terms: BTreeSet::from([term]),
        }
    }

    /// Seed structure `kind(dim)`.
    pub fn seed(kind: KernelKind, dim: usize) -> Result<Self, StructureError> {
        Atom::new(kind, dim).map(Self::from_atom)
    }

    /// The constant baseline: a bias kernel with no active dimensions.
    pub fn constant() -> Self {
        Self::from_atom(Atom::constant())
    }

    /// Whether this structure depends on no input dimension.
    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|t| t.dims().is_empty())
    }

    /// Additive composition: the union of both term sets.
    pub fn add(&self, other: &KernelStructure) -> KernelStructure {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self { terms }
    }

    /// Multiplicative composition, distributed into sum-of-products form.
    ///
    /// `(a + b) * (c + d) = a*c + a*d + b*c + b*d`
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::RepeatedDimension`] if any resulting product
    /// would bind two atoms to the same dimension.
    pub fn multiply(&self, other: &KernelStructure) -> Result<KernelStructure, StructureError> {
        let mut terms = BTreeSet::new();
        for left in &self.terms {
            for right in &other.terms {
                terms.insert(left.product(right)?);
            }
        }
        Ok(Self { terms })
    }

    /// Replace one term by another, keeping the rest.
    ///
    /// Returns `None` if `old` is not a term of this structure.
    pub fn replace_term(&self, old: &Term, new: Term) -> Option<KernelStructure> {
        if !self.terms.contains(old) {
            return None;
        }
        let mut terms = self.terms.clone();
        terms.remove(old);
        terms.insert(new);
        Some(Self { terms })
    }

    /// Split into single-term structures.
    ///
    /// The order is canonical term order: arbitrary but stable for a given
    /// structure.
    pub fn to_summands(&self) -> Vec<KernelStructure> {
        self.terms.iter().cloned().map(Self::from_term).collect()
    }

    /// Terms in canonical order.
    pub fn terms(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    /// Every dimension some atom is bound to.
    pub fn active_dims(&self) -> BTreeSet<usize> {
        self.terms.iter().flat_map(|t| t.dims()).collect()
    }

    /// The only active dimension, if there is exactly one.
    pub fn single_dim(&self) -> Option<usize> {
        let dims = self.active_dims();
        if dims.len() == 1 {
            dims.into_iter().next()
        } else {
            None
        }
    }

    /// The atom, if this structure is exactly one atom.
    pub fn as_atom(&self) -> Option<Atom> {
        match self.terms.iter().next() {
            Some(term) if self.terms.len() == 1 && term.len() == 1 => term.atoms().next().copied(),
            _ => None,
        }
    }

    /// Check every atom against the dimensionality of a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::IncompatibleStructure`] for the first
    /// dimension that is out of range.
    pub fn check_dims(&self, ndim: usize) -> Result<(), StructureError> {
        match self.active_dims().into_iter().find(|&d| d >= ndim) {
            Some(dim) => Err(StructureError::IncompatibleStructure { dim, ndim }),
            None => Ok(()),
        }
    }

    /// Canonical expression string, used as the identity of a candidate.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KernelStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", terms.join(" + "))
    }
}

impl FromStr for KernelStructure {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(StructureError::EmptyStructure);
        }
        let terms = s
            .split('+')
            .map(str::parse::<Term>)
            .collect::<Result<Vec<_>, _>>()?;
        KernelStructure::new(terms)
    }
}

impl From<KernelStructure> for String {
    fn from(structure: KernelStructure) -> Self {
        structure.to_string()
    }
}

impl TryFrom<String> for KernelStructure {
    type Error = StructureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &str) -> KernelStructure {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_is_term_union() {
        let a = k("LIN0 + SE1");
        let b = k("SE1 + PER2");
        let sum = a.add(&b);
        assert_eq!(sum, k("LIN0 + SE1 + PER2"));
        assert_eq!(sum.num_terms(), 3);
        // operands unchanged
        assert_eq!(a.num_terms(), 2);
    }

    #[test]
    fn test_summand_counts_add_for_disjoint_terms() {
        let a = k("LIN0 * SE1 + PER2");
        let b = k("SE0");
        assert_eq!(
            a.add(&b).to_summands().len(),
            a.to_summands().len() + b.to_summands().len()
        );
    }

    #[test]
    fn test_construction_order_does_not_matter() {
        let a = k("PER2 + SE1 * LIN0");
        let b = k("LIN0 * SE1 + PER2");
        let c = KernelStructure::from_atom(Atom::periodic(2)).add(&KernelStructure::from_term(
            Term::new([Atom::squared_exp(1), Atom::linear(0)]).unwrap(),
        ));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.canonical(), "LIN0 * SE1 + PER2");
    }

    #[test]
    fn test_multiply_distributes() {
        let a = k("LIN0 + PER1");
        let b = k("SE2");
        assert_eq!(a.multiply(&b).unwrap(), k("LIN0 * SE2 + PER1 * SE2"));
    }

    #[test]
    fn test_multiply_rejects_repeated_dimension() {
        let a = k("LIN0 + PER1");
        let b = k("SE1");
        assert!(matches!(
            a.multiply(&b),
            Err(StructureError::RepeatedDimension { dim: 1, .. })
        ));
    }

    #[test]
    fn test_active_dims_and_single_dim() {
        let s = k("LIN0 * SE3 + PER0");
        assert_eq!(s.active_dims().into_iter().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(s.single_dim(), None);
        assert_eq!(k("LIN2 + SE2").single_dim(), Some(2));
        assert!(KernelStructure::constant().active_dims().is_empty());
        assert!(KernelStructure::constant().is_constant());
    }

    #[test]
    fn test_check_dims() {
        let s = k("LIN0 + SE4");
        assert!(s.check_dims(5).is_ok());
        assert_eq!(
            s.check_dims(3),
            Err(StructureError::IncompatibleStructure { dim: 4, ndim: 3 })
        );
    }

    #[test]
    fn test_replace_term() {
        let s = k("LIN0 + PER1");
        let old: Term = "LIN0".parse().unwrap();
        let new: Term = "LIN0 * SE2".parse().unwrap();
        assert_eq!(s.replace_term(&old, new.clone()).unwrap(), k("LIN0 * SE2 + PER1"));
        assert!(s.replace_term(&new, old).is_none());
    }

    #[test]
    fn test_as_atom() {
        assert_eq!(k("SE1").as_atom(), Some(Atom::squared_exp(1)));
        assert_eq!(k("SE1 * LIN0").as_atom(), None);
        assert_eq!(k("SE1 + LIN0").as_atom(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KernelStructure>(), Err(StructureError::EmptyStructure));
        assert!("LIN0 + ".parse::<KernelStructure>().is_err());
        assert!("LIN0 * LIN0".parse::<KernelStructure>().is_err());
    }
}
