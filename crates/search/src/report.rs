//! Report data for a finished search.
//!
//! [`ReportData`] gathers what a written report needs: the data summary, the
//! accepted history, the best model per dimension and the additive
//! decomposition. It serializes to JSON and renders short prose sentences;
//! typesetting is left to the consumer.

use autogpc_kernel::KernelStructure;
use serde::{Deserialize, Serialize};

use crate::cumulate::CumulationResult;
use crate::data::{DataSummary, Dataset};
use crate::oracle::Monotonicity;
use crate::score::Scored;
use crate::search::{SearchOutcome, StopReason};

/// A structure with its scores, `None` when the fit was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub structure: KernelStructure,
    pub cv_error: Option<f64>,
    pub nlml: Option<f64>,
}

impl From<&Scored> for ScoredEntry {
    fn from(scored: &Scored) -> Self {
        Self {
            structure: scored.structure.clone(),
            cv_error: scored.fit().map(|f| f.cv_error),
            nlml: scored.fit().map(|f| f.nlml),
        }
    }
}

/// Best single-variable model for one input dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionEntry {
    pub dim: usize,
    pub label: String,
    pub structure: KernelStructure,
    pub cv_error: f64,
    pub monotonicity: Monotonicity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<f64>,
}

/// One step of the additive decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    pub component: ScoredEntry,
    pub cumulative: ScoredEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DataSummary>,
    pub baseline: ScoredEntry,
    pub history: Vec<ScoredEntry>,
    pub best_1d: Vec<DimensionEntry>,
    pub components: Vec<ComponentEntry>,
    pub stop_reason: StopReason,
}

impl ReportData {
    /// Collect report data from a search outcome and its decomposition.
    pub fn new<D: Dataset + ?Sized>(
        data: &D,
        outcome: &SearchOutcome,
        cumulation: &CumulationResult,
    ) -> Self {
        let best_1d = outcome
            .best_1d
            .iter()
            .enumerate()
            .filter_map(|(dim, best)| {
                let best = best.as_ref()?;
                let fit = best.fit()?;
                Some(DimensionEntry {
                    dim,
                    label: data.label(dim),
                    structure: best.structure.clone(),
                    cv_error: fit.cv_error,
                    monotonicity: fit.monotonicity,
                    period: fit.period,
                })
            })
            .collect();

        let components = cumulation
            .components
            .iter()
            .zip(&cumulation.cumulative)
            .map(|(component, cumulative)| ComponentEntry {
                component: component.into(),
                cumulative: cumulative.into(),
            })
            .collect();

        Self {
            data: None,
            baseline: (&outcome.baseline).into(),
            history: outcome.history.iter().map(ScoredEntry::from).collect(),
            best_1d,
            components,
            stop_reason: outcome.stop_reason,
        }
    }

    pub fn with_summary(mut self, summary: DataSummary) -> Self {
        self.data = Some(summary);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One sentence per additive component, in placement order.
    pub fn describe_components(&self) -> Vec<String> {
        let mut previous: Option<f64> = None;
        self.components
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let n = i + 1;
                let structure = &entry.component.structure;
                let error = entry.cumulative.cv_error;
                let sentence = match (previous, error) {
                    (_, None) => format!(
                        "Adding component {} ({}) gave a model that could not be fitted.",
                        n, structure
                    ),
                    (None, Some(e)) => format!(
                        "Component {} ({}) alone achieves a cross-validated error of {}.",
                        n,
                        structure,
                        percent(e)
                    ),
                    (Some(p), Some(e)) if e < p => format!(
                        "Adding component {} ({}) reduces the cross-validated error from {} to {}.",
                        n,
                        structure,
                        percent(p),
                        percent(e)
                    ),
                    (Some(p), Some(e)) => format!(
                        "Adding component {} ({}) does not reduce the cross-validated error ({} to {}).",
                        n,
                        structure,
                        percent(p),
                        percent(e)
                    ),
                };
                if error.is_some() {
                    previous = error;
                }
                sentence
            })
            .collect()
    }

    /// One sentence per dimension that has a best single-variable model.
    pub fn describe_dimensions(&self) -> Vec<String> {
        self.best_1d
            .iter()
            .map(|entry| {
                let shape = match entry.monotonicity {
                    Monotonicity::Increasing => "the class probability increases with it",
                    Monotonicity::Decreasing => "the class probability decreases with it",
                    Monotonicity::Flat => "the class probability is not monotonic in it",
                };
                let period = entry
                    .period
                    .map(|p| format!(", with period {:.2}", p))
                    .unwrap_or_default();
                format!(
                    "The best model of ``{}'' alone is {}, with a cross-validated error of {}; {}{}.",
                    entry.label,
                    entry.structure,
                    percent(entry.cv_error),
                    shape,
                    period
                )
            })
            .collect()
    }
}

fn percent(error: f64) -> String {
    format!("{:.1}%", error * 100.0)
}
