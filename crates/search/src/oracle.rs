//! # Model Oracle - the fit-and-score boundary
//!
//! The search engine never fits a Gaussian process itself. It hands a
//! kernel structure and the dataset to a [`ModelOracle`] and gets back a
//! [`Fit`]: cross-validated error, negative log marginal likelihood and,
//! for one-dimensional structures, shape diagnostics.
//!
//! ## Contract
//!
//! - Deterministic: identical `(structure, data)` inputs give identical
//!   results. Randomised cross-validation must use a fixed fold partition.
//! - Failures are reported as [`FitError`]; the search rejects the
//!   candidate and carries on.
//! - Long fits should poll the [`CancelToken`] and return
//!   [`FitError::Cancelled`] once it is set.
//!
//! [`TableOracle`] replays a fixed score table and is what tests and demos
//! use in place of a real GP backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use autogpc_kernel::KernelStructure;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::FitError;

/// Direction of the latent function along a single input dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Monotonicity {
    Decreasing,
    #[default]
    Flat,
    Increasing,
}

impl Monotonicity {
    /// `-1`, `0` or `+1`.
    pub fn sign(&self) -> i8 {
        match self {
            Monotonicity::Decreasing => -1,
            Monotonicity::Flat => 0,
            Monotonicity::Increasing => 1,
        }
    }

    /// Map any number to its sign class.
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Monotonicity::Increasing
        } else if value < 0.0 {
            Monotonicity::Decreasing
        } else {
            Monotonicity::Flat
        }
    }
}

/// Scores returned by a successful fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    /// Held-out classification error in `[0, 1]`.
    pub cv_error: f64,
    /// Negative log marginal likelihood (lower is better).
    pub nlml: f64,
    /// Only meaningful for structures with one active dimension.
    pub monotonicity: Monotonicity,
    /// Fitted period, for structures with a periodic component.
    pub period: Option<f64>,
}

impl Fit {
    pub fn new(cv_error: f64, nlml: f64) -> Self {
        Self {
            cv_error,
            nlml,
            monotonicity: Monotonicity::Flat,
            period: None,
        }
    }

    pub fn with_monotonicity(mut self, monotonicity: Monotonicity) -> Self {
        self.monotonicity = monotonicity;
        self
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.period = Some(period);
        self
    }

    /// Check the scores are in range.
    pub fn validate(&self, structure: &KernelStructure) -> Result<(), FitError> {
        let invalid = |reason: String| FitError::InvalidScore {
            structure: structure.canonical(),
            reason,
        };
        if !(0.0..=1.0).contains(&self.cv_error) {
            return Err(invalid(format!("cv_error {} outside [0, 1]", self.cv_error)));
        }
        if !self.nlml.is_finite() {
            return Err(invalid(format!("nlml {} is not finite", self.nlml)));
        }
        if let Some(period) = self.period {
            if !(period.is_finite() && period > 0.0) {
                return Err(invalid(format!("period {} is not positive", period)));
            }
        }
        Ok(())
    }
}

/// Fits a classification model with a given kernel structure and scores it.
///
/// `D` is the dataset type; the search passes it through untouched.
pub trait ModelOracle<D: ?Sized>: Send + Sync {
    /// Fit `structure` to `data` and score the result.
    fn fit_and_score(
        &self,
        structure: &KernelStructure,
        data: &D,
        cancel: &CancelToken,
    ) -> Result<Fit, FitError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ============================================================================
// Table Oracle
// ============================================================================

/// An oracle that looks scores up in a fixed table.
///
/// Entries are keyed by canonical form, so a structure matches its entry
/// however it was built. Structures without an entry get the default fit,
/// or fail if there is none.
///
/// # Example
///
/// ```rust
/// use autogpc_search::{CancelToken, Fit, ModelOracle, TableOracle};
///
/// let oracle = TableOracle::new()
///     .with_score("LIN0".parse().unwrap(), Fit::new(0.2, 10.0))
///     .with_default(Fit::new(0.5, 20.0));
///
/// let cancel = CancelToken::new();
/// let fit = oracle.fit_and_score(&"LIN0".parse().unwrap(), &(), &cancel).unwrap();
/// assert_eq!(fit.cv_error, 0.2);
/// ```
#[derive(Debug, Default)]
pub struct TableOracle {
    scores: HashMap<String, Fit>,
    failures: HashSet<String>,
    default: Option<Fit>,
    calls: AtomicUsize,
}

impl TableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fit for a structure.
    pub fn with_score(mut self, structure: KernelStructure, fit: Fit) -> Self {
        self.scores.insert(structure.canonical(), fit);
        self
    }

    /// Make fitting a structure fail with non-convergence.
    pub fn with_failure(mut self, structure: KernelStructure) -> Self {
        self.failures.insert(structure.canonical());
        self
    }

    /// Fit returned for structures without an entry.
    pub fn with_default(mut self, fit: Fit) -> Self {
        self.default = Some(fit);
        self
    }

    /// Number of `fit_and_score` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<D: ?Sized> ModelOracle<D> for TableOracle {
    fn fit_and_score(
        &self,
        structure: &KernelStructure,
        _data: &D,
        cancel: &CancelToken,
    ) -> Result<Fit, FitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        cancel.check()?;

        let key = structure.canonical();
        if self.failures.contains(&key) {
            return Err(FitError::NonConvergence {
                reason: format!("{} marked as failing", key),
            });
        }
        self.scores
            .get(&key)
            .or(self.default.as_ref())
            .copied()
            .ok_or(FitError::Oracle {
                message: format!("no score recorded for {}", key),
            })
    }

    fn name(&self) -> &str {
        "TableOracle"
    }
}
