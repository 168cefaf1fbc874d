//! # Structure Search Tests
//!
//! End-to-end runs against a score table:
//! - Acceptance and stopping
//! - Tie-breaks and failed candidates
//! - Caching and cancellation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use autogpc_search::{
    CancelToken, Dataset, Fit, FitError, KernelKind, KernelStructure, LabelledData, ModelOracle,
    SearchConfig, SearchHook, Scored, StopReason, StructureSearch, TableOracle,
};

fn k(s: &str) -> KernelStructure {
    s.parse().unwrap()
}

fn toy_data(ndim: usize) -> Arc<LabelledData> {
    let x = (0..6)
        .map(|i| (0..ndim).map(|d| (i * (d + 1)) as f64).collect())
        .collect();
    Arc::new(LabelledData::new(x, vec![0, 0, 0, 1, 1, 1]).unwrap())
}

fn names(structures: &[KernelStructure]) -> Vec<String> {
    structures.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Acceptance Tests
// ============================================================================

#[tokio::test]
async fn test_stops_when_no_candidate_improves() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_score(k("LIN0"), Fit::new(0.2, 8.0))
        .with_default(Fit::new(0.5, 12.0));
    let search = StructureSearch::new(Arc::new(oracle), toy_data(1), SearchConfig::default());

    let outcome = search.run().await.unwrap();

    assert_eq!(names(&outcome.structures()), vec!["C", "LIN0"]);
    assert_eq!(outcome.stop_reason, StopReason::NoImprovement);
    assert!(outcome.improved_on_baseline());
    assert_eq!(outcome.trace.steps.len(), 2);
    assert_eq!(outcome.trace.accepted_path(), vec![k("LIN0")]);
}

#[tokio::test]
async fn test_history_errors_strictly_decrease_after_first_step() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_score(k("SE0"), Fit::new(0.3, 9.0))
        .with_score(k("SE0 + LIN1"), Fit::new(0.2, 8.0))
        .with_score(k("SE0 * PER1 + LIN1"), Fit::new(0.1, 7.0))
        .with_default(Fit::new(0.45, 11.0));
    let search = StructureSearch::new(Arc::new(oracle), toy_data(2), SearchConfig::default());

    let outcome = search.run().await.unwrap();

    assert_eq!(
        names(&outcome.structures()),
        vec!["C", "SE0", "SE0 + LIN1", "SE0 * PER1 + LIN1"]
    );
    let errors: Vec<f64> = outcome.history[1..].iter().map(Scored::cv_error).collect();
    assert!(errors.windows(2).all(|w| w[1] < w[0]));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[tokio::test]
async fn test_tie_on_error_broken_by_nlml() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_score(k("LIN0"), Fit::new(0.2, 9.0))
        .with_score(k("SE0"), Fit::new(0.2, 7.0))
        .with_default(Fit::new(0.5, 12.0));
    let search = StructureSearch::new(Arc::new(oracle), toy_data(1), SearchConfig::default());

    let outcome = search.run().await.unwrap();

    assert_eq!(outcome.history[1].structure, k("SE0"));
}

#[tokio::test]
async fn test_failed_candidate_is_skipped() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_failure(k("LIN0"))
        .with_score(k("SE0"), Fit::new(0.3, 9.0))
        .with_score(k("PER0"), Fit::new(0.4, 9.0))
        .with_default(Fit::new(0.5, 12.0));
    let search = StructureSearch::new(Arc::new(oracle), toy_data(1), SearchConfig::default());

    let outcome = search.run().await.unwrap();

    assert_eq!(outcome.history[1].structure, k("SE0"));
    assert_eq!(outcome.trace.steps[0].rejected_count(), 1);
}

#[tokio::test]
async fn test_all_candidates_failing_keeps_history() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_score(k("LIN0"), Fit::new(0.3, 9.0))
        .with_failure(k("SE0"))
        .with_failure(k("PER0"));
    // every structure beyond the seeds has no entry and no default
    let search = StructureSearch::new(Arc::new(oracle), toy_data(1), SearchConfig::default());

    let outcome = search.run().await.unwrap();

    assert_eq!(names(&outcome.structures()), vec!["C", "LIN0"]);
    assert_eq!(outcome.stop_reason, StopReason::AllCandidatesFailed);
}

#[tokio::test]
async fn test_best_1d_tracks_each_dimension() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_score(k("LIN0"), Fit::new(0.3, 9.0))
        .with_score(k("PER1"), Fit::new(0.35, 9.0))
        .with_default(Fit::new(0.45, 11.0));
    let search = StructureSearch::new(Arc::new(oracle), toy_data(2), SearchConfig::default());

    let outcome = search.run().await.unwrap();

    let best: Vec<KernelStructure> = outcome
        .best_1d
        .iter()
        .map(|b| b.as_ref().unwrap().structure.clone())
        .collect();
    assert_eq!(best, vec![k("LIN0"), k("PER1")]);
}

#[tokio::test]
async fn test_restricted_kinds() {
    let oracle = TableOracle::new().with_default(Fit::new(0.4, 1.0));
    let config = SearchConfig::default().with_kinds(vec![KernelKind::Linear]);
    let search = StructureSearch::new(Arc::new(oracle), toy_data(2), config);

    let outcome = search.run().await.unwrap();

    let seeds: Vec<String> = outcome.trace.steps[0]
        .candidates
        .iter()
        .map(|c| c.structure.to_string())
        .collect();
    assert_eq!(seeds, vec!["LIN0", "LIN1"]);
}

#[tokio::test]
async fn test_results_do_not_depend_on_worker_count() {
    let oracle = || {
        TableOracle::new()
            .with_score(k("C"), Fit::new(0.5, 10.0))
            .with_score(k("LIN0"), Fit::new(0.3, 9.0))
            .with_score(k("SE1"), Fit::new(0.3, 9.0))
            .with_score(k("LIN0 + SE1"), Fit::new(0.2, 8.0))
            .with_default(Fit::new(0.45, 11.0))
    };

    let serial = StructureSearch::new(
        Arc::new(oracle()),
        toy_data(2),
        SearchConfig::default().with_workers(1),
    );
    let parallel = StructureSearch::new(
        Arc::new(oracle()),
        toy_data(2),
        SearchConfig::default().with_workers(8),
    );

    let a = serial.run().await.unwrap();
    let b = parallel.run().await.unwrap();

    assert_eq!(a.structures(), b.structures());
    // LIN0 and SE1 tie on both scores; canonical order decides
    assert_eq!(a.history[1].structure, k("LIN0"));
}

// ============================================================================
// Cache Tests
// ============================================================================

#[tokio::test]
async fn test_repeated_candidates_hit_the_cache() {
    let oracle = Arc::new(
        TableOracle::new()
            .with_score(k("C"), Fit::new(0.5, 10.0))
            .with_score(k("LIN0"), Fit::new(0.3, 9.0))
            .with_default(Fit::new(0.45, 11.0)),
    );
    let search = StructureSearch::new(Arc::clone(&oracle), toy_data(1), SearchConfig::default());

    let outcome = search.run().await.unwrap();
    let fits = oracle.calls();
    search.explain(&outcome).await.unwrap();

    // LIN0 alone is already known
    assert_eq!(oracle.calls(), fits);
    assert_eq!(outcome.cache.misses, fits);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

struct CancelOnFirstStep(CancelToken);

impl SearchHook for CancelOnFirstStep {
    fn on_accept(&self, _depth: usize, _accepted: &Scored, _previous_error: f64) {
        self.0.cancel();
    }
}

#[tokio::test]
async fn test_cancellation_stops_search() {
    let oracle = TableOracle::new()
        .with_score(k("C"), Fit::new(0.5, 10.0))
        .with_score(k("LIN0"), Fit::new(0.3, 9.0))
        .with_default(Fit::new(0.2, 11.0));
    let cancel = CancelToken::new();
    let search = StructureSearch::new(Arc::new(oracle), toy_data(1), SearchConfig::default())
        .with_cancel(cancel.clone())
        .with_hook(CancelOnFirstStep(cancel));

    let outcome = search.run().await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(outcome.history.len(), 2);
}

struct SlowOracle {
    calls: AtomicUsize,
}

impl ModelOracle<LabelledData> for SlowOracle {
    fn fit_and_score(
        &self,
        structure: &KernelStructure,
        data: &LabelledData,
        cancel: &CancelToken,
    ) -> Result<Fit, FitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for _ in 0..20 {
            cancel.check()?;
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        let error = 0.5 / (structure.num_terms() + data.num_dims()) as f64;
        Ok(Fit::new(error, 1.0))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancellation_from_another_task() {
    let oracle = Arc::new(SlowOracle {
        calls: AtomicUsize::new(0),
    });
    let search = StructureSearch::new(Arc::clone(&oracle), toy_data(3), SearchConfig::default());
    let cancel = search.cancel_token();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        cancel.cancel();
    });

    let outcome = search.run().await.unwrap();
    canceller.await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert!(!outcome.history.is_empty());
}
