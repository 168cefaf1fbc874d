//! Search execution traces.
//!
//! A [`SearchTrace`] records every frontier the search evaluated: the parent
//! structure, each candidate's scores and which candidate was accepted. The
//! trace can be serialized, rendered as text, or turned into the expansion
//! graph (parent → candidate edges) for graph-based analysis.

use std::collections::HashMap;

use autogpc_kernel::KernelStructure;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::score::Scored;

// ============================================================================
// Records
// ============================================================================

/// One evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub structure: KernelStructure,
    /// `None` when the candidate was rejected
    pub cv_error: Option<f64>,
    pub nlml: Option<f64>,
    /// Why the candidate was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Scored> for CandidateRecord {
    fn from(scored: &Scored) -> Self {
        match &scored.outcome {
            Ok(fit) => Self {
                structure: scored.structure.clone(),
                cv_error: Some(fit.cv_error),
                nlml: Some(fit.nlml),
                error: None,
            },
            Err(e) => Self {
                structure: scored.structure.clone(),
                cv_error: None,
                nlml: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// One search step: a parent, its frontier, and the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-indexed step number
    pub depth: usize,
    pub parent: KernelStructure,
    pub candidates: Vec<CandidateRecord>,
    /// The accepted candidate, if the step improved on its parent
    pub accepted: Option<KernelStructure>,
    pub duration_ms: u64,
}

impl StepRecord {
    pub fn rejected_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.error.is_some()).count()
    }
}

// ============================================================================
// Search Trace
// ============================================================================

/// Complete trace of a search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTrace {
    pub steps: Vec<StepRecord>,
    pub total_duration_ms: u64,
}

impl SearchTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    /// Candidates evaluated over all steps.
    pub fn evaluations(&self) -> usize {
        self.steps.iter().map(|s| s.candidates.len()).sum()
    }

    /// Candidates rejected over all steps.
    pub fn rejections(&self) -> usize {
        self.steps.iter().map(StepRecord::rejected_count).sum()
    }

    /// Accepted structures, in step order.
    pub fn accepted_path(&self) -> Vec<KernelStructure> {
        self.steps
            .iter()
            .filter_map(|s| s.accepted.clone())
            .collect()
    }

    /// The expansion graph: one node per distinct structure, one edge per
    /// (parent, candidate) pair weighted by step depth.
    pub fn to_graph(&self) -> DiGraph<KernelStructure, usize> {
        let mut graph = DiGraph::new();
        let mut index: HashMap<KernelStructure, NodeIndex> = HashMap::new();

        let mut node = |graph: &mut DiGraph<KernelStructure, usize>, s: &KernelStructure| {
            *index
                .entry(s.clone())
                .or_insert_with(|| graph.add_node(s.clone()))
        };

        for step in &self.steps {
            let parent = node(&mut graph, &step.parent);
            for candidate in &step.candidates {
                let child = node(&mut graph, &candidate.structure);
                graph.add_edge(parent, child, step.depth);
            }
        }
        graph
    }

    /// Render the trace as a text table.
    pub fn render_ascii(&self) -> String {
        let mut output = String::new();
        output.push_str("┌──────────────────────────────────────────────────────┐\n");
        output.push_str("│                Structure Search Trace                │\n");
        output.push_str("├──────────────────────────────────────────────────────┤\n");

        for step in &self.steps {
            let accepted = step
                .accepted
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let best = step
                .candidates
                .iter()
                .filter_map(|c| c.cv_error)
                .fold(f64::INFINITY, f64::min);

            output.push_str(&format!(
                "│ {:>2} {:3} cand {:2} rej  best {:.4}  {:>6}ms │\n",
                step.depth,
                step.candidates.len(),
                step.rejected_count(),
                best,
                step.duration_ms
            ));
            output.push_str(&format!(
                "│    ▶ {:47} │\n",
                accepted.chars().take(47).collect::<String>()
            ));
        }

        output.push_str("├──────────────────────────────────────────────────────┤\n");
        output.push_str(&format!(
            "│ Total: {}ms  Steps: {}  Fits: {}  Rejected: {}\n",
            self.total_duration_ms,
            self.steps.len(),
            self.evaluations(),
            self.rejections()
        ));
        output.push_str("└──────────────────────────────────────────────────────┘\n");
        output
    }

    /// Render the expansion graph as DOT for Graphviz.
    ///
    /// Accepted structures are filled.
    pub fn render_dot(&self) -> String {
        let graph = self.to_graph();
        let accepted = self.accepted_path();

        let mut output = String::new();
        output.push_str("digraph SearchTrace {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n\n");

        for idx in graph.node_indices() {
            let structure = &graph[idx];
            let style = if accepted.contains(structure) || structure.is_constant() {
                " style=filled fillcolor=lightblue"
            } else {
                ""
            };
            output.push_str(&format!(
                "  n{} [label=\"{}\"{}];\n",
                idx.index(),
                structure,
                style
            ));
        }

        output.push('\n');

        for edge in graph.edge_references() {
            output.push_str(&format!(
                "  n{} -> n{} [label=\"{}\"];\n",
                edge.source().index(),
                edge.target().index(),
                edge.weight()
            ));
        }

        output.push_str("}\n");
        output
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn k(s: &str) -> KernelStructure {
        s.parse().unwrap()
    }

    fn record(s: &str, cv_error: f64) -> CandidateRecord {
        CandidateRecord {
            structure: k(s),
            cv_error: Some(cv_error),
            nlml: Some(1.0),
            error: None,
        }
    }

    fn sample_trace() -> SearchTrace {
        let mut trace = SearchTrace::new();
        trace.add_step(StepRecord {
            depth: 1,
            parent: KernelStructure::constant(),
            candidates: vec![
                record("LIN0", 0.2),
                record("SE0", 0.3),
                CandidateRecord {
                    structure: k("PER0"),
                    cv_error: None,
                    nlml: None,
                    error: Some("did not converge".to_string()),
                },
            ],
            accepted: Some(k("LIN0")),
            duration_ms: 12,
        });
        trace.add_step(StepRecord {
            depth: 2,
            parent: k("LIN0"),
            candidates: vec![record("LIN0 + SE0", 0.25), record("LIN0 * SE1", 0.4)],
            accepted: None,
            duration_ms: 8,
        });
        trace.total_duration_ms = 20;
        trace
    }

    #[test]
    fn test_trace_counts() {
        let trace = sample_trace();
        assert_eq!(trace.evaluations(), 5);
        assert_eq!(trace.rejections(), 1);
        assert_eq!(trace.accepted_path(), vec![k("LIN0")]);
    }

    #[test]
    fn test_to_graph() {
        let graph = sample_trace().to_graph();
        // C, LIN0, SE0, PER0, LIN0 + SE0, LIN0 * SE1
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn test_render_ascii() {
        let ascii = sample_trace().render_ascii();
        assert!(ascii.contains("Structure Search Trace"));
        assert!(ascii.contains("LIN0"));
        assert!(ascii.contains("Fits: 5"));
    }

    #[test]
    fn test_render_dot() {
        let dot = sample_trace().render_dot();
        assert!(dot.contains("digraph SearchTrace"));
        assert!(dot.contains("n0 -> n1"));
        assert!(dot.contains("label=\"LIN0\" style=filled"));
    }

    #[test]
    fn test_trace_serializes() {
        let trace = sample_trace();
        let json = serde_json::to_string(&trace).unwrap();
        assert!(json.contains("\"parent\":\"LIN0\""));
        let back: SearchTrace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.steps.len(), 2);
        assert_eq!(back.accepted_path(), trace.accepted_path());
        assert_eq!(back.steps[0].candidates[2].error.as_deref(), Some("did not converge"));
    }
}
