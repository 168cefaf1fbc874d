//! Search execution hooks for observability.
//!
//! Hooks observe the search and cumulation without changing them.
//!
//! ## Events
//!
//! - `on_search_start`: before the baseline is scored
//! - `on_step_start`: a frontier is about to be evaluated
//! - `on_candidate`: one candidate of the frontier has an outcome
//! - `on_accept`: a candidate was appended to the history
//! - `on_search_end`: the search reached `Done`
//! - `on_component`: cumulation placed its next component
//!
//! ## Example
//!
//! ```ignore
//! struct Progress;
//!
//! impl SearchHook for Progress {
//!     fn on_accept(&self, depth: usize, accepted: &Scored, _previous: f64) {
//!         eprintln!("step {}: {}", depth, accepted.structure);
//!     }
//! }
//! ```

use autogpc_kernel::{KernelKind, KernelStructure};

use crate::score::Scored;
use crate::search::StopReason;

// ============================================================================
// Search Hook Trait
// ============================================================================

/// Trait for observing search events.
///
/// All methods default to no-ops.
pub trait SearchHook: Send + Sync {
    /// Called once before the baseline is evaluated. `oracle` is the
    /// oracle's [`name`](crate::oracle::ModelOracle::name).
    fn on_search_start(&self, _oracle: &str, _ndim: usize, _kinds: &[KernelKind]) {}

    /// Called before a frontier of `frontier` candidates grown from
    /// `parent` is evaluated. `depth` is 1-indexed.
    fn on_step_start(&self, _depth: usize, _parent: &KernelStructure, _frontier: usize) {}

    /// Called for every candidate once the whole frontier is evaluated.
    fn on_candidate(&self, _depth: usize, _candidate: &Scored) {}

    /// Called when a candidate is accepted into the history.
    ///
    /// `previous_error` is the error of the structure it replaces.
    fn on_accept(&self, _depth: usize, _accepted: &Scored, _previous_error: f64) {}

    /// Called when the search stops.
    fn on_search_end(&self, _reason: &StopReason, _history_len: usize) {}

    /// Called when cumulation places component `index` (0-indexed).
    fn on_component(&self, _index: usize, _component: &Scored, _cumulative: &Scored) {}
}

// ============================================================================
// Null Hook (Default)
// ============================================================================

/// A no-op hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHook;

impl SearchHook for NullHook {}

// ============================================================================
// Logging Hook
// ============================================================================

/// A hook that reports events through `tracing`.
///
/// Step boundaries and acceptances log at `info`, candidates at `debug`
/// (at `info` when verbose), rejected candidates at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHook {
    /// Log every candidate at `info` level
    pub verbose: bool,
}

impl LoggingHook {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl SearchHook for LoggingHook {
    fn on_search_start(&self, oracle: &str, ndim: usize, kinds: &[KernelKind]) {
        let kinds: Vec<&str> = kinds.iter().map(|k| k.symbol()).collect();
        tracing::info!(oracle, ndim, kinds = ?kinds, "structure search starting");
    }

    fn on_step_start(&self, depth: usize, parent: &KernelStructure, frontier: usize) {
        tracing::info!(depth, parent = %parent, frontier, "evaluating frontier");
    }

    fn on_candidate(&self, depth: usize, candidate: &Scored) {
        match &candidate.outcome {
            Ok(fit) if self.verbose => tracing::info!(
                depth,
                structure = %candidate.structure,
                cv_error = fit.cv_error,
                nlml = fit.nlml,
                "candidate scored"
            ),
            Ok(fit) => tracing::debug!(
                depth,
                structure = %candidate.structure,
                cv_error = fit.cv_error,
                nlml = fit.nlml,
                "candidate scored"
            ),
            Err(e) => tracing::warn!(
                depth,
                structure = %candidate.structure,
                error = %e,
                "candidate rejected"
            ),
        }
    }

    fn on_accept(&self, depth: usize, accepted: &Scored, previous_error: f64) {
        tracing::info!(
            depth,
            structure = %accepted.structure,
            cv_error = accepted.cv_error(),
            previous_error,
            "accepted"
        );
    }

    fn on_search_end(&self, reason: &StopReason, history_len: usize) {
        tracing::info!(reason = %reason, history_len, "structure search done");
    }

    fn on_component(&self, index: usize, component: &Scored, cumulative: &Scored) {
        tracing::info!(
            component = index + 1,
            structure = %component.structure,
            cumulative_error = cumulative.cv_error(),
            "component placed"
        );
    }
}

// ============================================================================
// Composite Hook
// ============================================================================

/// A hook that delegates to multiple inner hooks.
pub struct CompositeHook {
    hooks: Vec<Box<dyn SearchHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the composite.
    pub fn with<H: SearchHook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }
}

impl Default for CompositeHook {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchHook for CompositeHook {
    fn on_search_start(&self, oracle: &str, ndim: usize, kinds: &[KernelKind]) {
        for hook in &self.hooks {
            hook.on_search_start(oracle, ndim, kinds);
        }
    }

    fn on_step_start(&self, depth: usize, parent: &KernelStructure, frontier: usize) {
        for hook in &self.hooks {
            hook.on_step_start(depth, parent, frontier);
        }
    }

    fn on_candidate(&self, depth: usize, candidate: &Scored) {
        for hook in &self.hooks {
            hook.on_candidate(depth, candidate);
        }
    }

    fn on_accept(&self, depth: usize, accepted: &Scored, previous_error: f64) {
        for hook in &self.hooks {
            hook.on_accept(depth, accepted, previous_error);
        }
    }

    fn on_search_end(&self, reason: &StopReason, history_len: usize) {
        for hook in &self.hooks {
            hook.on_search_end(reason, history_len);
        }
    }

    fn on_component(&self, index: usize, component: &Scored, cumulative: &Scored) {
        for hook in &self.hooks {
            hook.on_component(index, component, cumulative);
        }
    }
}
