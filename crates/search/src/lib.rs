//! # AutoGPC Search
//!
//! Greedy search for the kernel structure of a Gaussian-process classifier,
//! and additive decomposition of the structure it finds.
//!
//! ## Overview
//!
//! - [`ModelOracle`]: fits a structure to data and scores it
//! - [`StructureSearch`]: expand, score in parallel, accept the best
//! - [`AdditiveCumulator`]: orders the summands of a structure by cumulative fit
//! - [`SearchHook`] / [`SearchTrace`]: observe and record a run
//! - [`ReportData`]: everything a written report needs
//!
//! Fitting itself lives behind the oracle; this crate only decides which
//! structures to fit and what to make of the scores.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use autogpc_search::{Fit, LabelledData, SearchConfig, StructureSearch, TableOracle};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let data = LabelledData::new(
//!     vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![2.0, 1.0]],
//!     vec![0, 1, 1],
//! )
//! .unwrap();
//! let oracle = TableOracle::new()
//!     .with_score("LIN0".parse().unwrap(), Fit::new(0.2, 5.0))
//!     .with_score("LIN0 + SE1".parse().unwrap(), Fit::new(0.1, 4.0))
//!     .with_default(Fit::new(0.4, 9.0));
//!
//! let search = StructureSearch::new(Arc::new(oracle), Arc::new(data), SearchConfig::default());
//! let outcome = search.run().await.unwrap();
//! let parts = search.explain(&outcome).await.unwrap();
//!
//! assert_eq!(outcome.best().structure.to_string(), "LIN0 + SE1");
//! assert_eq!(parts.len(), 2);
//! # }
//! ```

pub mod cancel;
pub mod cumulate;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod grammar;
pub mod hooks;
pub mod oracle;
pub mod report;
pub mod score;
pub mod search;
pub mod trace;

pub use autogpc_kernel::{Atom, KernelKind, KernelStructure, StructureError, Term};
pub use cancel::CancelToken;
pub use cumulate::{AdditiveCumulator, CumulationResult};
pub use data::{DataSummary, Dataset, LabelledData};
pub use error::{CumulateError, DataError, FitError, SearchError};
pub use evaluator::Evaluator;
pub use hooks::{CompositeHook, LoggingHook, NullHook, SearchHook};
pub use oracle::{Fit, ModelOracle, Monotonicity, TableOracle};
pub use report::{ComponentEntry, DimensionEntry, ReportData, ScoredEntry};
pub use score::{select_best, CacheStats, ScoreCache, Scored};
pub use search::{SearchConfig, SearchOutcome, SearchState, StopReason, StructureSearch};
pub use trace::{CandidateRecord, SearchTrace, StepRecord};
