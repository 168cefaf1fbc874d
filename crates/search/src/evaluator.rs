//! # Frontier Evaluation
//!
//! Fan-out → fit → fan-in over a worker pool.
//!
//! ```text
//!                ┌────────────────┐
//!    LIN0 ───────│ oracle (blk 1) │──────┐
//!                └────────────────┘      │
//!                ┌────────────────┐      │    ┌─────────┐
//!    SE0  ───────│ oracle (blk 2) │──────┼────│ barrier │──── Vec<Scored>
//!                └────────────────┘      │    └─────────┘
//!                ┌────────────────┐      │
//!    PER0 ───────│ oracle (blk 3) │──────┘
//!                └────────────────┘
//! ```
//!
//! Each uncached candidate is fitted on tokio's blocking pool; a semaphore
//! caps the number of fits in flight at the configured worker count. The
//! evaluator returns only after every candidate has an outcome, in input
//! order, so selection never sees a partial frontier.

use std::sync::Arc;
use std::time::Instant;

use autogpc_kernel::KernelStructure;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::cancel::CancelToken;
use crate::error::FitError;
use crate::oracle::{Fit, ModelOracle};
use crate::score::{CacheStats, ScoreCache, Scored};

/// Scores structures through an oracle, with caching and bounded parallelism.
pub struct Evaluator<O, D> {
    oracle: Arc<O>,
    data: Arc<D>,
    cache: Arc<ScoreCache>,
    permits: Arc<Semaphore>,
    cancel: CancelToken,
}

impl<O, D> Clone for Evaluator<O, D> {
    fn clone(&self) -> Self {
        Self {
            oracle: Arc::clone(&self.oracle),
            data: Arc::clone(&self.data),
            cache: Arc::clone(&self.cache),
            permits: Arc::clone(&self.permits),
            cancel: self.cancel.clone(),
        }
    }
}

enum Pending {
    Cached(Scored),
    Running(KernelStructure, JoinHandle<Result<Fit, FitError>>),
}

impl<O, D> Evaluator<O, D>
where
    O: ModelOracle<D> + 'static,
    D: Send + Sync + 'static,
{
    /// Create an evaluator running at most `workers` fits at a time.
    pub fn new(oracle: Arc<O>, data: Arc<D>, workers: usize, cancel: CancelToken) -> Self {
        Self {
            oracle,
            data,
            cache: Arc::new(ScoreCache::new()),
            permits: Arc::new(Semaphore::new(workers.max(1))),
            cancel,
        }
    }

    /// Share an existing cache instead of starting empty.
    pub fn with_cache(mut self, cache: Arc<ScoreCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// The dataset every fit is run against.
    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Score one structure.
    pub async fn evaluate_one(&self, structure: KernelStructure) -> Scored {
        let mut scored = self.evaluate(vec![structure.clone()]).await;
        scored.pop().unwrap_or_else(|| {
            Scored::new(
                structure,
                Err(FitError::Oracle {
                    message: "no outcome returned".to_string(),
                }),
            )
        })
    }

    /// Score every candidate and wait for all of them.
    ///
    /// Outcomes come back in the order of `candidates`. Failures, panics in
    /// the oracle and cancellations all become rejected candidates.
    pub async fn evaluate(&self, candidates: Vec<KernelStructure>) -> Vec<Scored> {
        let mut pending = Vec::with_capacity(candidates.len());

        for structure in candidates {
            if let Some(outcome) = self.cache.get(&structure) {
                pending.push(Pending::Cached(Scored::new(structure, outcome)));
                continue;
            }

            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    pending.push(Pending::Cached(Scored::new(
                        structure,
                        Err(FitError::Oracle {
                            message: "worker pool closed".to_string(),
                        }),
                    )));
                    continue;
                }
            };

            let oracle = Arc::clone(&self.oracle);
            let data = Arc::clone(&self.data);
            let cancel = self.cancel.clone();
            let task_structure = structure.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let start = Instant::now();
                let outcome = cancel.check().and_then(|()| {
                    let fit = oracle.fit_and_score(&task_structure, &data, &cancel)?;
                    fit.validate(&task_structure)?;
                    Ok(fit)
                });
                tracing::trace!(
                    structure = %task_structure,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    ok = outcome.is_ok(),
                    "fit finished"
                );
                outcome
            });
            pending.push(Pending::Running(structure, handle));
        }

        let mut results = Vec::with_capacity(pending.len());
        for entry in pending {
            let scored = match entry {
                Pending::Cached(scored) => scored,
                Pending::Running(structure, handle) => {
                    let outcome = handle.await.unwrap_or_else(|e| {
                        Err(FitError::Oracle {
                            message: format!("worker failed: {}", e),
                        })
                    });
                    self.cache.insert(&structure, &outcome);
                    Scored::new(structure, outcome)
                }
            };
            results.push(scored);
        }
        results
    }
}
