//! Product terms: the summands of a sum-of-products kernel.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::atom::Atom;
use crate::error::StructureError;

/// A product of atoms over pairwise distinct dimensions.
///
/// Atoms are kept in canonical order, so two terms built from the same
/// factors in any order are equal. Multiplying the constant into a term
/// that already holds it is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    atoms: BTreeSet<Atom>,
}

impl Term {
    /// Build a product term from its factors.
    ///
    /// # Errors
    ///
    /// - [`StructureError::EmptyStructure`] if no atoms are given
    /// - [`StructureError::RepeatedDimension`] if two atoms share a dimension
    pub fn new(atoms: impl IntoIterator<Item = Atom>) -> Result<Self, StructureError> {
        let mut term = Term {
            atoms: BTreeSet::new(),
        };
        for atom in atoms {
            term = term.times(atom)?;
        }
        if term.atoms.is_empty() {
            return Err(StructureError::EmptyStructure);
        }
        Ok(term)
    }

    /// A single-factor term.
    pub fn atom(atom: Atom) -> Self {
        Term {
            atoms: BTreeSet::from([atom]),
        }
    }

    /// Multiply one more atom into this term.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::RepeatedDimension`] if the term already has
    /// an atom on the same dimension.
    pub fn times(&self, atom: Atom) -> Result<Self, StructureError> {
        if let Some(dim) = atom.dim() {
            if self.has_dim(dim) {
                return Err(StructureError::RepeatedDimension {
                    dim,
                    term: format!("{} * {}", self, atom),
                });
            }
        }
        let mut atoms = self.atoms.clone();
        atoms.insert(atom);
        Ok(Term { atoms })
    }

    /// Multiply two terms together.
    pub fn product(&self, other: &Term) -> Result<Self, StructureError> {
        other
            .atoms
            .iter()
            .try_fold(self.clone(), |acc, atom| acc.times(*atom))
    }

    /// Factors in canonical order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Dimensions referenced by this term.
    pub fn dims(&self) -> BTreeSet<usize> {
        self.atoms.iter().filter_map(|a| a.dim()).collect()
    }

    /// Whether some factor is bound to `dim`.
    pub fn has_dim(&self, dim: usize) -> bool {
        self.atoms.iter().any(|a| a.dim() == Some(dim))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factors: Vec<String> = self.atoms.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", factors.join(" * "))
    }
}

impl FromStr for Term {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let atoms = s
            .split('*')
            .map(str::parse::<Atom>)
            .collect::<Result<Vec<_>, _>>()?;
        Term::new(atoms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_canonical_order() {
        let a = Term::new([Atom::periodic(2), Atom::linear(0)]).unwrap();
        let b = Term::new([Atom::linear(0), Atom::periodic(2)]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "LIN0 * PER2");
    }

    #[test]
    fn test_term_rejects_repeated_dimension() {
        let err = Term::new([Atom::linear(1), Atom::squared_exp(1)]).unwrap_err();
        assert!(matches!(err, StructureError::RepeatedDimension { dim: 1, .. }));
    }

    #[test]
    fn test_term_empty() {
        assert_eq!(Term::new([]).unwrap_err(), StructureError::EmptyStructure);
    }

    #[test]
    fn test_term_constant_is_idempotent() {
        let t = Term::atom(Atom::constant()).times(Atom::constant()).unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_term_product() {
        let a: Term = "SE0".parse().unwrap();
        let b: Term = "PER1 * LIN2".parse().unwrap();
        let ab = a.product(&b).unwrap();
        assert_eq!(ab.to_string(), "SE0 * PER1 * LIN2");
        assert_eq!(ab.dims().into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);

        let c: Term = "LIN0".parse().unwrap();
        assert!(a.product(&c).is_err());
    }
}
