//! # Topology Dispatch
//!
//! Turns a committed graph into one execution request: prune, check for a
//! terminator, match against the pattern catalog, and build either the
//! pattern's request or the generic workflow payload.

pub mod patterns;
pub mod request;

pub use patterns::{PatternMatch, catalog, match_pattern, port_names_compatible};
pub use request::{DispatchRequest, FALLBACK_ENDPOINT, RequestBody};

use crate::error::DispatchError;
use crate::graph::FlowGraph;
use crate::node_types::END;

/// Builds the execution request for a snapshot of `graph`.
///
/// Dangling edges are dropped from the snapshot (and logged) before matching;
/// the caller's graph is not touched.
pub fn prepare_dispatch(graph: &FlowGraph) -> Result<DispatchRequest, DispatchError> {
    let mut snapshot = graph.clone();
    snapshot.prune_dangling_edges();

    if snapshot.is_empty() {
        return Err(DispatchError::EmptyGraph);
    }
    if !snapshot.nodes().iter().any(|n| n.kind == END) {
        return Err(DispatchError::MissingTerminator);
    }

    match match_pattern(&snapshot) {
        Some(matched) => {
            log::info!(
                "Graph matches pattern '{}' -> {}",
                matched.pattern.id,
                matched.pattern.endpoint
            );
            request::build_request(&snapshot, &matched)
        }
        None => {
            log::info!(
                "No pattern matches {} node(s) / {} edge(s); using {}",
                snapshot.nodes().len(),
                snapshot.edges().len(),
                FALLBACK_ENDPOINT
            );
            Ok(request::generic_request(&snapshot))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_types::{TEXT_AGENT, TEXT_INPUT_TOOL};
    use egui::Pos2;

    #[test]
    fn empty_graph_is_refused() {
        assert!(matches!(
            prepare_dispatch(&FlowGraph::new()),
            Err(DispatchError::EmptyGraph)
        ));
    }

    #[test]
    fn graph_without_end_is_refused() {
        let mut graph = FlowGraph::new();
        graph.add_node(TEXT_INPUT_TOOL, Pos2::ZERO);
        graph.add_node(TEXT_AGENT, Pos2::ZERO);
        let err = prepare_dispatch(&graph).unwrap_err();
        assert!(matches!(err, DispatchError::MissingTerminator));
        assert!(err.to_string().contains("terminating component"));
    }

    #[test]
    fn unconnected_graph_falls_back_to_generic() {
        let mut graph = FlowGraph::new();
        graph.add_node(TEXT_AGENT, Pos2::ZERO);
        graph.add_node(END, Pos2::ZERO);
        let request = prepare_dispatch(&graph).unwrap();
        assert!(request.is_generic());
        assert_eq!(request.endpoint, FALLBACK_ENDPOINT);
    }
}
