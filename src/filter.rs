use std::fmt;

use indexmap::IndexSet;
use tracing::{info, warn};

use crate::graph::{NodeData, PathwayGraph};

/// Why the full pathway is shown instead of a filtered view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackReason {
    EmptySelection,
    NoMatches,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::EmptySelection => {
                write!(f, "No biomarkers selected, showing full pathway instead.")
            }
            FallbackReason::NoMatches => {
                write!(f, "No biomarker matches found, showing full pathway instead.")
            }
        }
    }
}

#[derive(Debug)]
pub enum FilterOutcome<'g> {
    Matched { graph: PathwayGraph, matched: usize },
    /// The input graph itself, not a copy.
    Fallback {
        graph: &'g PathwayGraph,
        reason: FallbackReason,
    },
}

impl FilterOutcome<'_> {
    /// The graph to render.
    pub fn graph(&self) -> &PathwayGraph {
        match self {
            FilterOutcome::Matched { graph, .. } => graph,
            FilterOutcome::Fallback { graph, .. } => *graph,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FilterOutcome::Fallback { .. })
    }

    /// Status line for the user.
    pub fn notice(&self) -> String {
        match self {
            FilterOutcome::Matched { matched, .. } => {
                format!("Found {matched} nodes related to selected biomarkers.")
            }
            FilterOutcome::Fallback { reason, .. } => reason.to_string(),
        }
    }
}

/// Case-insensitive substring test against `"{label} {name}"`.
///
/// Deliberately loose: `IL6` also matches `IL6R` or `IL6ST`. Callers rely on
/// this, so it is not tightened to token or exact matching.
pub fn matches_biomarker(label: &str, name: &str, selection: &IndexSet<String>) -> bool {
    let text = format!("{label} {name}").to_lowercase();
    selection
        .iter()
        .any(|biomarker| text.contains(&biomarker.to_lowercase()))
}

fn node_matches(node: &NodeData, selection: &IndexSet<String>) -> bool {
    matches_biomarker(&node.label, &node.name, selection)
}

/// Restrict `graph` to the nodes matching any selected biomarker, with the
/// edges induced between them. Falls back to `graph` itself when nothing is
/// selected or nothing matches.
pub fn filter<'g>(graph: &'g PathwayGraph, selection: &IndexSet<String>) -> FilterOutcome<'g> {
    if selection.is_empty() {
        warn!("{}", FallbackReason::EmptySelection);
        return FilterOutcome::Fallback {
            graph,
            reason: FallbackReason::EmptySelection,
        };
    }

    let matched = graph
        .nodes()
        .filter(|node| node_matches(node, selection))
        .count();
    if matched == 0 {
        warn!("{}", FallbackReason::NoMatches);
        return FilterOutcome::Fallback {
            graph,
            reason: FallbackReason::NoMatches,
        };
    }

    let subgraph = graph.induced_subgraph(|node| node_matches(node, selection));
    info!(
        "Found {matched} nodes related to selected biomarkers ({} edges)",
        subgraph.edge_count()
    );
    FilterOutcome::Matched {
        graph: subgraph,
        matched,
    }
}
