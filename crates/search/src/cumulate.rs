//! # Additive Cumulation
//!
//! Orders the additive components of a structure so that each prefix sum is
//! as good as it can be.
//!
//! ```text
//!   summands:   LIN0   SE1   PER2
//!                 │
//!   step 0:     best alone ─────────────▶ LIN0
//!   step 1:     LIN0 + {SE1, PER2} ─────▶ LIN0 + PER2
//!   step 2:     LIN0 + PER2 + SE1 ──────▶ LIN0 + PER2 + SE1
//! ```
//!
//! Each step evaluates `cumulative + s` for every remaining summand `s` and
//! keeps the best, with the same tie-break as the search. A step whose error
//! goes up is logged; with an oracle that respects model nesting, adding a
//! component never makes the best cumulative fit worse.

use std::sync::Arc;

use autogpc_kernel::KernelStructure;

use crate::data::Dataset;
use crate::error::CumulateError;
use crate::evaluator::Evaluator;
use crate::hooks::{NullHook, SearchHook};
use crate::oracle::ModelOracle;
use crate::score::Scored;

/// Result of cumulating a list of summands.
///
/// `components[i]` is the summand placed at step `i`, scored on its own;
/// `cumulative[i]` is the sum of `components[0..=i]`, scored as one model.
#[derive(Debug, Clone)]
pub struct CumulationResult {
    pub components: Vec<Scored>,
    pub cumulative: Vec<Scored>,
}

impl CumulationResult {
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component_structures(&self) -> Vec<KernelStructure> {
        self.components.iter().map(|s| s.structure.clone()).collect()
    }

    pub fn cumulative_structures(&self) -> Vec<KernelStructure> {
        self.cumulative.iter().map(|s| s.structure.clone()).collect()
    }

    pub fn cumulative_errors(&self) -> Vec<f64> {
        self.cumulative.iter().map(Scored::cv_error).collect()
    }

    /// Whether the cumulative error never increases.
    pub fn is_monotone(&self) -> bool {
        self.cumulative
            .windows(2)
            .all(|pair| pair[1].cv_error() <= pair[0].cv_error())
    }

    /// The full sum, scored.
    pub fn total(&self) -> Option<&Scored> {
        self.cumulative.last()
    }
}

/// Greedy additive decomposition over an evaluator.
pub struct AdditiveCumulator<O, D> {
    evaluator: Evaluator<O, D>,
    hook: Arc<dyn SearchHook>,
}

impl<O, D> AdditiveCumulator<O, D>
where
    O: ModelOracle<D> + 'static,
    D: Dataset + 'static,
{
    pub fn new(evaluator: Evaluator<O, D>) -> Self {
        Self {
            evaluator,
            hook: Arc::new(NullHook),
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn SearchHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Order `summands` greedily by cumulative fit.
    ///
    /// A failed fit ranks last but does not abort; a summand that cannot be
    /// fitted still gets placed, at the end.
    ///
    /// # Errors
    ///
    /// - [`CumulateError::EmptySummands`] for an empty input
    /// - [`CumulateError::Structure`] if a summand uses a dimension the
    ///   dataset does not have; nothing is fitted in that case
    /// - [`CumulateError::Cancelled`] if cancellation lands mid-way
    pub async fn cumulate(&self, summands: &[KernelStructure]) -> Result<CumulationResult, CumulateError> {
        if summands.is_empty() {
            return Err(CumulateError::EmptySummands);
        }
        let ndim = self.evaluator.data().num_dims();
        for summand in summands {
            summand.check_dims(ndim)?;
        }

        let total = summands.len();
        let cancel = self.evaluator.cancel_token().clone();

        let mut remaining = self.evaluator.evaluate(summands.to_vec()).await;
        if cancel.is_cancelled() {
            return Err(CumulateError::Cancelled { placed: 0, total });
        }

        let first_index = best_index(&remaining).ok_or(CumulateError::EmptySummands)?;
        let first = remaining.remove(first_index);
        self.hook.on_component(0, &first, &first);

        let mut components = vec![first.clone()];
        let mut cumulative = vec![first];

        while !remaining.is_empty() {
            let Some(current) = cumulative.last().map(|s| s.structure.clone()) else {
                break;
            };
            let extended: Vec<KernelStructure> =
                remaining.iter().map(|s| current.add(&s.structure)).collect();

            let mut scored = self.evaluator.evaluate(extended).await;
            if cancel.is_cancelled() {
                return Err(CumulateError::Cancelled {
                    placed: components.len(),
                    total,
                });
            }

            let Some(index) = best_index(&scored) else {
                break;
            };
            let component = remaining.remove(index);
            let next = scored.swap_remove(index);

            if let Some(previous) = cumulative.last() {
                if next.cv_error() > previous.cv_error() {
                    tracing::warn!(
                        component = %component.structure,
                        previous = previous.cv_error(),
                        next = next.cv_error(),
                        "cumulative error increased"
                    );
                }
            }

            self.hook.on_component(components.len(), &component, &next);
            components.push(component);
            cumulative.push(next);
        }

        Ok(CumulationResult {
            components,
            cumulative,
        })
    }
}

/// Index of the best candidate; rejected ones rank last, not out.
fn best_index(candidates: &[Scored]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.selection_cmp(b))
        .map(|(i, _)| i)
}
