//! Scored candidates, the selection order, and the score cache.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use autogpc_kernel::KernelStructure;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::oracle::Fit;

/// A structure together with the outcome of fitting it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub structure: KernelStructure,
    pub outcome: Result<Fit, FitError>,
}

impl Scored {
    pub fn new(structure: KernelStructure, outcome: Result<Fit, FitError>) -> Self {
        Self { structure, outcome }
    }

    /// The fit, if fitting succeeded.
    pub fn fit(&self) -> Option<&Fit> {
        self.outcome.as_ref().ok()
    }

    pub fn is_rejected(&self) -> bool {
        self.outcome.is_err()
    }

    /// Cross-validated error; `+∞` for a rejected candidate.
    pub fn cv_error(&self) -> f64 {
        self.fit().map_or(f64::INFINITY, |f| f.cv_error)
    }

    /// NLML; `+∞` for a rejected candidate.
    pub fn nlml(&self) -> f64 {
        self.fit().map_or(f64::INFINITY, |f| f.nlml)
    }

    /// Selection order: lower cv error, then lower NLML, then the
    /// lexicographically smaller canonical expression.
    pub fn selection_cmp(&self, other: &Scored) -> Ordering {
        self.cv_error()
            .total_cmp(&other.cv_error())
            .then_with(|| self.nlml().total_cmp(&other.nlml()))
            .then_with(|| self.structure.canonical().cmp(&other.structure.canonical()))
    }
}

/// The best successfully fitted candidate, if any.
pub fn select_best(candidates: &[Scored]) -> Option<&Scored> {
    candidates
        .iter()
        .filter(|c| !c.is_rejected())
        .min_by(|a, b| a.selection_cmp(b))
}

// ============================================================================
// Score Cache
// ============================================================================

/// Hit/miss counters for a [`ScoreCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Fit outcomes keyed by canonical structure expression.
///
/// Oracles are deterministic, so a structure is fitted at most once per
/// cache; failures are cached too. Cancelled evaluations are not, since
/// they say nothing about the structure.
#[derive(Debug, Default)]
pub struct ScoreCache {
    entries: Mutex<HashMap<String, Result<Fit, FitError>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a structure, counting the hit or miss.
    pub fn get(&self, structure: &KernelStructure) -> Option<Result<Fit, FitError>> {
        let found = self.lock().get(&structure.canonical()).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, AtomicOrdering::Relaxed);
        found
    }

    /// Store an outcome. Cancellations are ignored.
    pub fn insert(&self, structure: &KernelStructure, outcome: &Result<Fit, FitError>) {
        if matches!(outcome, Err(FitError::Cancelled)) {
            return;
        }
        self.lock().insert(structure.canonical(), outcome.clone());
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(AtomicOrdering::Relaxed),
            misses: self.misses.load(AtomicOrdering::Relaxed),
            entries: self.len(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Result<Fit, FitError>>> {
        // entries are written whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
