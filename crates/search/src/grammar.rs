//! Production rules that generate the search frontier.
//!
//! From the constant baseline the only successors are the seeds `kind(dim)`.
//! From any other structure `S`, for each kind and dimension:
//!
//! - **add**: `S + kind(dim)`
//! - **multiply**: replace a term `T` of `S` by `T * kind(dim)`, for every
//!   term that has no atom on `dim` yet
//!
//! Candidates are deduplicated by canonical form and the parent itself is
//! never a successor, so re-adding an existing term is not a move.

use std::collections::BTreeSet;

use autogpc_kernel::{Atom, KernelKind, KernelStructure};

/// All distinct successors of `parent`, in canonical order.
///
/// Non-dimensional kinds in `kinds` are ignored.
pub fn expand(parent: &KernelStructure, kinds: &[KernelKind], ndim: usize) -> Vec<KernelStructure> {
    let atoms: Vec<Atom> = kinds
        .iter()
        .flat_map(|&kind| (0..ndim).filter_map(move |dim| Atom::new(kind, dim).ok()))
        .collect();

    let mut successors = BTreeSet::new();

    if parent.is_constant() {
        successors.extend(atoms.into_iter().map(KernelStructure::from_atom));
        return successors.into_iter().collect();
    }

    for atom in atoms {
        successors.insert(parent.add(&KernelStructure::from_atom(atom)));

        for term in parent.terms() {
            // a term already bound to this dimension is saturated on it
            let Ok(extended) = term.times(atom) else {
                continue;
            };
            if let Some(candidate) = parent.replace_term(term, extended) {
                successors.insert(candidate);
            }
        }
    }

    successors.remove(parent);
    successors.into_iter().collect()
}

/// Every seed structure `kind(dim)`.
pub fn seeds(kinds: &[KernelKind], ndim: usize) -> Vec<KernelStructure> {
    expand(&KernelStructure::constant(), kinds, ndim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &str) -> KernelStructure {
        s.parse().unwrap()
    }

    fn names(structures: &[KernelStructure]) -> Vec<String> {
        structures.iter().map(|s| s.canonical()).collect()
    }

    #[test]
    fn test_seeds_cover_kinds_and_dims() {
        let seeds = seeds(&KernelKind::BASE, 2);
        assert_eq!(seeds.len(), 6);
        assert_eq!(
            names(&seeds),
            vec!["LIN0", "SE0", "PER0", "LIN1", "SE1", "PER1"]
        );
    }

    #[test]
    fn test_constant_kind_is_ignored() {
        let seeds = seeds(&[KernelKind::Constant, KernelKind::Linear], 2);
        assert_eq!(names(&seeds), vec!["LIN0", "LIN1"]);
    }

    #[test]
    fn test_expand_single_atom() {
        let successors = expand(&k("LIN0"), &[KernelKind::Linear, KernelKind::SquaredExp], 2);
        assert_eq!(
            names(&successors),
            vec![
                "LIN0 + SE0",
                "LIN0 + LIN1",
                "LIN0 + SE1",
                "LIN0 * LIN1",
                "LIN0 * SE1",
            ]
        );
        // LIN0 + LIN0 is the parent itself; LIN0 * SE0 repeats dimension 0
        assert!(!successors.contains(&k("LIN0")));
    }

    #[test]
    fn test_expand_multiplies_every_unsaturated_term() {
        let successors = expand(&k("LIN0 + SE1"), &[KernelKind::Periodic], 2);
        assert!(successors.contains(&k("LIN0 + SE1 + PER0")));
        assert!(successors.contains(&k("LIN0 + SE1 + PER1")));
        assert!(successors.contains(&k("LIN0 * PER1 + SE1")));
        assert!(successors.contains(&k("LIN0 + PER0 * SE1")));
        assert_eq!(successors.len(), 4);
    }

    #[test]
    fn test_expand_has_no_duplicates() {
        let successors = expand(&k("LIN0 * SE1 + PER2"), &KernelKind::BASE, 3);
        let unique: BTreeSet<_> = successors.iter().cloned().collect();
        assert_eq!(unique.len(), successors.len());
    }
}
