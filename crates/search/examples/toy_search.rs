//! Structure search on a small synthetic dataset.
//!
//! The oracle here is a stand-in for a GP backend: it scores a structure by
//! leave-one-out nearest-neighbour error on the structure's active
//! dimensions, with a complexity penalty as the NLML.
//!
//! Run with `cargo run --example toy_search`.

use std::sync::Arc;

use autogpc_search::{
    CancelToken, CompositeHook, DataError, Fit, FitError, KernelStructure, LabelledData, LoggingHook,
    ModelOracle, Monotonicity, ReportData, SearchConfig, StructureSearch,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

struct NearestNeighbourOracle;

impl ModelOracle<LabelledData> for NearestNeighbourOracle {
    fn fit_and_score(
        &self,
        structure: &KernelStructure,
        data: &LabelledData,
        cancel: &CancelToken,
    ) -> Result<Fit, FitError> {
        let dims: Vec<usize> = structure.active_dims().into_iter().collect();
        let x = data.inputs();
        let y = data.targets();

        let mut errors = 0;
        for i in 0..x.len() {
            cancel.check()?;
            let prediction = if dims.is_empty() {
                majority(y)
            } else {
                let nearest = (0..x.len())
                    .filter(|&j| j != i)
                    .min_by(|&a, &b| {
                        distance(&x[i], &x[a], &dims).total_cmp(&distance(&x[i], &x[b], &dims))
                    })
                    .ok_or_else(|| FitError::NonConvergence {
                        reason: "need at least two points".to_string(),
                    })?;
                y[nearest]
            };
            if prediction != y[i] {
                errors += 1;
            }
        }

        let cv_error = errors as f64 / x.len() as f64;
        let complexity: usize = structure.terms().map(|t| t.len()).sum();
        let mut fit = Fit::new(cv_error, 10.0 * cv_error + complexity as f64);

        if let Some(dim) = structure.single_dim() {
            fit = fit.with_monotonicity(trend(data, dim));
        }
        Ok(fit)
    }
}

fn majority(y: &[u8]) -> u8 {
    let ones = y.iter().filter(|&&v| v == 1).count();
    u8::from(2 * ones > y.len())
}

fn distance(a: &[f64], b: &[f64], dims: &[usize]) -> f64 {
    dims.iter().map(|&d| (a[d] - b[d]).powi(2)).sum()
}

/// Sign of the covariance between one input and the labels.
fn trend(data: &LabelledData, dim: usize) -> Monotonicity {
    let n = data.num_points() as f64;
    let xs: Vec<f64> = data.column(dim).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = data.targets().iter().map(|&v| v as f64).sum::<f64>() / n;
    let covariance: f64 = xs
        .iter()
        .zip(data.targets())
        .map(|(x, &y)| (x - x_mean) * (y as f64 - y_mean))
        .sum();
    Monotonicity::from_sign(covariance)
}

fn toy_data() -> Result<LabelledData, DataError> {
    // class depends on x1 alone; x2 is periodic noise
    let x: Vec<Vec<f64>> = (0..24)
        .map(|i| {
            let t = i as f64 / 4.0;
            vec![t, (t * 2.0).sin()]
        })
        .collect();
    let y: Vec<u8> = x.iter().map(|row| u8::from(row[0] > 3.0)).collect();
    LabelledData::new(x, y)?.with_labels(["time", "phase"])
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to set tracing subscriber: {}", e);
    }

    let data = match toy_data() {
        Ok(data) => data,
        Err(e) => {
            eprintln!("invalid toy data: {}", e);
            std::process::exit(1);
        }
    };
    let config = SearchConfig::default().with_workers(4).with_max_depth(4);
    let search = StructureSearch::new(
        Arc::new(NearestNeighbourOracle),
        Arc::new(data.clone()),
        config,
    )
    .with_hook(CompositeHook::new().with(LoggingHook::new()));

    let outcome = match search.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("search failed: {}", e);
            std::process::exit(1);
        }
    };
    println!("{}", outcome.trace.render_ascii());

    let parts = match search.explain(&outcome).await {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("cumulation failed: {}", e);
            std::process::exit(1);
        }
    };

    let report = ReportData::new(&data, &outcome, &parts).with_summary(data.summary());
    if let Some(summary) = &report.data {
        println!("{}\n", summary.describe());
    }
    for sentence in report.describe_dimensions() {
        println!("{}", sentence);
    }
    for sentence in report.describe_components() {
        println!("{}", sentence);
    }
}
