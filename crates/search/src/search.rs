//! # Structure Search
//!
//! Greedy forward search over kernel structures.
//!
//! ```text
//!     ┌───────────┐  expand   ┌──────────┐  fit (pool)  ┌──────────┐
//!     │  current  │──────────▶│ frontier │─────────────▶│  scored  │
//!     └───────────┘           └──────────┘              └──────────┘
//!           ▲                                                │
//!           │ accept                                 select  │
//!           └────────────────────────────────────────────────┘
//!                              no improvement ──▶ Done
//! ```
//!
//! ## Acceptance
//!
//! Candidates are ranked by cross-validated error, then NLML, then canonical
//! expression, so the winner never depends on evaluation order. From the
//! constant baseline the best seed is always taken, giving every completed
//! search at least one real model. After that, a candidate is accepted only
//! if it beats the current error by more than `min_improvement`.
//!
//! ## Failures
//!
//! A candidate whose fit fails is rejected and the step goes on with the
//! rest. A step where every fit fails ends the search with the history
//! accepted so far. Cancellation discards the step in flight.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use autogpc_kernel::{KernelKind, KernelStructure};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::cumulate::{AdditiveCumulator, CumulationResult};
use crate::data::Dataset;
use crate::error::{CumulateError, SearchError};
use crate::evaluator::Evaluator;
use crate::grammar;
use crate::hooks::{NullHook, SearchHook};
use crate::oracle::ModelOracle;
use crate::score::{select_best, CacheStats, ScoreCache, Scored};
use crate::trace::{CandidateRecord, SearchTrace, StepRecord};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a structure search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Kernel families the grammar may introduce
    pub kinds: Vec<KernelKind>,
    /// Required error decrease to accept a step (strict)
    pub min_improvement: f64,
    /// Maximum number of fits running at once
    pub workers: usize,
    /// Stop after this many accepted steps
    pub max_depth: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            kinds: KernelKind::BASE.to_vec(),
            min_improvement: 0.0,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            max_depth: None,
        }
    }
}

impl SearchConfig {
    /// Read a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SearchError> {
        let config: Self = serde_json::from_str(json).map_err(|e| SearchError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_kinds(mut self, kinds: impl Into<Vec<KernelKind>>) -> Self {
        self.kinds = kinds.into();
        self
    }

    pub fn with_min_improvement(mut self, threshold: f64) -> Self {
        self.min_improvement = threshold;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Check the configuration can drive a search.
    pub fn validate(&self) -> Result<(), SearchError> {
        let invalid = |reason: &str| {
            Err(SearchError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.kinds.is_empty() {
            return invalid("no kernel kinds to search over");
        }
        if self.kinds.iter().any(|k| !k.is_dimensional()) {
            return invalid("the constant kernel cannot be bound to a dimension");
        }
        if self.workers == 0 {
            return invalid("at least one worker is required");
        }
        if !(self.min_improvement.is_finite() && self.min_improvement >= 0.0) {
            return invalid("min_improvement must be a non-negative number");
        }
        if self.max_depth == Some(0) {
            return invalid("max_depth must allow at least one step");
        }
        Ok(())
    }
}

// ============================================================================
// State
// ============================================================================

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The best candidate did not improve enough.
    NoImprovement,
    /// Every candidate of the last step failed to fit.
    AllCandidatesFailed,
    /// The grammar produced no successors.
    FrontierEmpty,
    /// `max_depth` steps were accepted.
    DepthLimit,
    /// Cancellation was requested.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::NoImprovement => "no improving candidate",
            StopReason::AllCandidatesFailed => "all candidates failed",
            StopReason::FrontierEmpty => "no candidates to expand",
            StopReason::DepthLimit => "depth limit reached",
            StopReason::Cancelled => "cancelled",
        };
        write!(f, "{}", text)
    }
}

/// The two states of the search loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Exploring,
    Done(StopReason),
}

// ============================================================================
// Outcome
// ============================================================================

/// Everything a completed search produces.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// The constant baseline, also `history[0]`
    pub baseline: Scored,
    /// Accepted structures in order, starting with the baseline
    pub history: Vec<Scored>,
    /// Best single-atom structure per input dimension
    pub best_1d: Vec<Option<Scored>>,
    pub stop_reason: StopReason,
    pub trace: SearchTrace,
    pub cache: CacheStats,
}

impl SearchOutcome {
    /// The last accepted structure.
    pub fn best(&self) -> &Scored {
        self.history.last().unwrap_or(&self.baseline)
    }

    pub fn state(&self) -> SearchState {
        SearchState::Done(self.stop_reason)
    }

    /// Accepted structures without scores.
    pub fn structures(&self) -> Vec<KernelStructure> {
        self.history.iter().map(|s| s.structure.clone()).collect()
    }

    /// Whether the final structure scores better than the baseline.
    ///
    /// `false` means the search found nothing better, which is a valid
    /// result, not a failure.
    pub fn improved_on_baseline(&self) -> bool {
        self.history.len() > 1 && self.best().cv_error() < self.baseline.cv_error()
    }
}

// ============================================================================
// Structure Search
// ============================================================================

/// Greedy forward search engine.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use autogpc_search::{Fit, LabelledData, SearchConfig, StructureSearch, TableOracle};
///
/// # #[tokio::main]
/// # async fn main() {
/// let data = LabelledData::new(vec![vec![0.0], vec![1.0]], vec![0, 1]).unwrap();
/// let oracle = TableOracle::new()
///     .with_score("C".parse().unwrap(), Fit::new(0.5, 10.0))
///     .with_score("LIN0".parse().unwrap(), Fit::new(0.2, 8.0))
///     .with_default(Fit::new(0.6, 12.0));
///
/// let search = StructureSearch::new(Arc::new(oracle), Arc::new(data), SearchConfig::default());
/// let outcome = search.run().await.unwrap();
/// assert_eq!(outcome.best().structure.to_string(), "LIN0");
/// # }
/// ```
pub struct StructureSearch<O, D> {
    oracle: Arc<O>,
    data: Arc<D>,
    config: SearchConfig,
    cache: Arc<ScoreCache>,
    cancel: CancelToken,
    hook: Arc<dyn SearchHook>,
}

impl<O, D> StructureSearch<O, D>
where
    O: ModelOracle<D> + 'static,
    D: Dataset + 'static,
{
    pub fn new(oracle: Arc<O>, data: Arc<D>, config: SearchConfig) -> Self {
        Self {
            oracle,
            data,
            config,
            cache: Arc::new(ScoreCache::new()),
            cancel: CancelToken::new(),
            hook: Arc::new(NullHook),
        }
    }

    /// Observe the search with a hook.
    pub fn with_hook<H: SearchHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Token that stops this search (and its cumulator) when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn evaluator(&self) -> Evaluator<O, D> {
        Evaluator::new(
            Arc::clone(&self.oracle),
            Arc::clone(&self.data),
            self.config.workers,
            self.cancel.clone(),
        )
        .with_cache(Arc::clone(&self.cache))
    }

    /// A cumulator sharing this search's oracle, cache and hook.
    pub fn cumulator(&self) -> AdditiveCumulator<O, D> {
        AdditiveCumulator::new(self.evaluator()).with_hook(Arc::clone(&self.hook))
    }

    /// Order the additive components of the outcome's final structure.
    pub async fn explain(&self, outcome: &SearchOutcome) -> Result<CumulationResult, CumulateError> {
        let summands = outcome.best().structure.to_summands();
        self.cumulator().cumulate(&summands).await
    }

    /// Run the search to completion.
    ///
    /// # Errors
    ///
    /// Only for unusable input: an invalid configuration or a dataset with
    /// no dimensions. Fit failures and cancellation end the search normally.
    pub async fn run(&self) -> Result<SearchOutcome, SearchError> {
        self.config.validate()?;
        let ndim = self.data.num_dims();
        if ndim == 0 {
            return Err(SearchError::InvalidConfig {
                reason: "dataset has no input dimensions".to_string(),
            });
        }

        let start = Instant::now();
        let evaluator = self.evaluator();
        self.hook
            .on_search_start(self.oracle.name(), ndim, &self.config.kinds);

        let baseline = evaluator.evaluate_one(KernelStructure::constant()).await;
        if let Err(e) = &baseline.outcome {
            tracing::warn!(error = %e, "baseline could not be fitted");
        }

        let mut history = vec![baseline.clone()];
        let mut best_1d: Vec<Option<Scored>> = vec![None; ndim];
        let mut trace = SearchTrace::new();
        let mut state = SearchState::Exploring;

        while state == SearchState::Exploring {
            state = self
                .step(&evaluator, ndim, &mut history, &mut best_1d, &mut trace)
                .await;
        }

        let stop_reason = match state {
            SearchState::Done(reason) => reason,
            SearchState::Exploring => StopReason::Cancelled,
        };

        trace.total_duration_ms = start.elapsed().as_millis() as u64;
        self.hook.on_search_end(&stop_reason, history.len());

        Ok(SearchOutcome {
            baseline,
            history,
            best_1d,
            stop_reason,
            trace,
            cache: evaluator.cache_stats(),
        })
    }

    /// One expand → evaluate → select round.
    async fn step(
        &self,
        evaluator: &Evaluator<O, D>,
        ndim: usize,
        history: &mut Vec<Scored>,
        best_1d: &mut [Option<Scored>],
        trace: &mut SearchTrace,
    ) -> SearchState {
        if self.cancel.is_cancelled() {
            return SearchState::Done(StopReason::Cancelled);
        }

        let depth = history.len();
        if self.config.max_depth.is_some_and(|max| depth > max) {
            return SearchState::Done(StopReason::DepthLimit);
        }

        let Some(current) = history.last().cloned() else {
            return SearchState::Done(StopReason::FrontierEmpty);
        };

        let frontier = grammar::expand(&current.structure, &self.config.kinds, ndim);
        if frontier.is_empty() {
            return SearchState::Done(StopReason::FrontierEmpty);
        }

        self.hook.on_step_start(depth, &current.structure, frontier.len());
        let step_start = Instant::now();
        let scored = evaluator.evaluate(frontier).await;

        if self.cancel.is_cancelled() {
            tracing::debug!(depth, "search cancelled; discarding frontier");
            return SearchState::Done(StopReason::Cancelled);
        }

        for candidate in &scored {
            self.hook.on_candidate(depth, candidate);
            track_best_1d(best_1d, candidate);
        }

        let selected = select_best(&scored).cloned();
        let accepted = selected.as_ref().filter(|candidate| {
            current.structure.is_constant()
                || current.cv_error() - candidate.cv_error() > self.config.min_improvement
        });

        trace.add_step(StepRecord {
            depth,
            parent: current.structure.clone(),
            candidates: scored.iter().map(CandidateRecord::from).collect(),
            accepted: accepted.map(|c| c.structure.clone()),
            duration_ms: step_start.elapsed().as_millis() as u64,
        });

        match (selected.as_ref(), accepted) {
            (None, _) => {
                tracing::warn!(
                    depth,
                    candidates = scored.len(),
                    "every candidate failed; keeping the last accepted structure"
                );
                SearchState::Done(StopReason::AllCandidatesFailed)
            }
            (Some(best), None) => {
                tracing::debug!(
                    depth,
                    best = %best.structure,
                    cv_error = best.cv_error(),
                    current_error = current.cv_error(),
                    "no improving candidate"
                );
                SearchState::Done(StopReason::NoImprovement)
            }
            (Some(_), Some(next)) => {
                self.hook.on_accept(depth, next, current.cv_error());
                history.push(next.clone());
                SearchState::Exploring
            }
        }
    }
}

/// Keep the best single-atom structure seen for each dimension.
fn track_best_1d(best_1d: &mut [Option<Scored>], candidate: &Scored) {
    if candidate.is_rejected() {
        return;
    }
    let Some(dim) = candidate.structure.as_atom().and_then(|a| a.dim()) else {
        return;
    };
    let Some(slot) = best_1d.get_mut(dim) else {
        return;
    };
    let better = match slot {
        Some(existing) => candidate.selection_cmp(existing).is_lt(),
        None => true,
    };
    if better {
        *slot = Some(candidate.clone());
    }
}
