//! Port anchor tracking.
//!
//! Anchors are the canvas-space points where ports are drawn. They are a
//! derived cache: [`compute_anchors`] rebuilds them from measured screen
//! geometry, and the tracker refreshes either everything (node set or
//! viewport changed, a drag settled) or a single node (a drag frame).

use super::coordinate_transform::Viewport;
use super::node_layout::NodeLayout;
use crate::graph::{FlowGraph, Node, PortRef};
use egui::Pos2;
use std::collections::HashMap;

pub type AnchorMap = HashMap<PortRef, Pos2>;

/// Reads rendered port geometry in screen space.
///
/// The desktop shell measures with [`super::node_layout::BoxLayout`]; tests
/// may inject synthetic geometry.
pub trait GeometryProbe {
    /// Layout of `node` as if drawn at canvas `position`.
    fn measure_node(
        &self,
        graph: &FlowGraph,
        node: &Node,
        position: Pos2,
        viewport: &Viewport,
    ) -> NodeLayout;

    /// Layout of every node in draw order. `preview` replaces one node's
    /// committed position (a node being dragged).
    fn measure(
        &self,
        graph: &FlowGraph,
        viewport: &Viewport,
        preview: Option<(&str, Pos2)>,
    ) -> Vec<NodeLayout> {
        graph
            .nodes()
            .iter()
            .map(|node| {
                let position = match preview {
                    Some((id, pos)) if id == node.id => pos,
                    _ => node.position,
                };
                self.measure_node(graph, node, position, viewport)
            })
            .collect()
    }
}

/// Converts each measured port center back to canvas space.
pub fn compute_anchors(layouts: &[NodeLayout], viewport: &Viewport) -> AnchorMap {
    layouts
        .iter()
        .flat_map(|layout| {
            layout.ports.iter().map(move |port| {
                (
                    PortRef::new(layout.node_id.clone(), port.port_id.clone()),
                    viewport.to_canvas(port.center),
                )
            })
        })
        .collect()
}

#[derive(Clone, Debug, Default)]
pub struct PortTracker {
    anchors: AnchorMap,
}

impl PortTracker {
    pub fn anchors(&self) -> &AnchorMap {
        &self.anchors
    }

    pub fn anchor(&self, port: &PortRef) -> Option<Pos2> {
        self.anchors.get(port).copied()
    }

    /// Full recompute.
    pub fn refresh(
        &mut self,
        graph: &FlowGraph,
        viewport: &Viewport,
        probe: &dyn GeometryProbe,
        preview: Option<(&str, Pos2)>,
    ) {
        self.anchors = compute_anchors(&probe.measure(graph, viewport, preview), viewport);
    }

    /// Recomputes only `node_id`'s ports, placing the node at `position`.
    /// Every other anchor is assumed unchanged.
    pub fn refresh_node(
        &mut self,
        graph: &FlowGraph,
        node_id: &str,
        position: Pos2,
        viewport: &Viewport,
        probe: &dyn GeometryProbe,
    ) {
        self.anchors.retain(|port, _| port.node_id != node_id);
        if let Some(node) = graph.node(node_id) {
            let layout = probe.measure_node(graph, node, position, viewport);
            self.anchors
                .extend(compute_anchors(std::slice::from_ref(&layout), viewport));
        }
    }

    /// Nearest anchor within `radius` canvas units of `point`. Equal
    /// distances resolve to the smaller port reference so the pick is stable.
    pub fn nearest(&self, point: Pos2, radius: f32) -> Option<(&PortRef, Pos2)> {
        self.anchors
            .iter()
            .map(|(port, anchor)| (port, *anchor, anchor.distance(point)))
            .filter(|(_, _, distance)| *distance <= radius)
            .min_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(b.0)))
            .map(|(port, anchor, _)| (port, anchor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::node_layout::{BoxLayout, PortLayout};
    use crate::node_types::{PortDirection, TEXT_AGENT, TEXT_INPUT_TOOL};
    use egui::{Rect, Vec2};

    /// Places every port of a node at its position plus (port index, 0).
    struct Synthetic;

    impl GeometryProbe for Synthetic {
        fn measure_node(
            &self,
            _graph: &FlowGraph,
            node: &Node,
            position: Pos2,
            viewport: &Viewport,
        ) -> NodeLayout {
            let ports = node
                .ports()
                .enumerate()
                .map(|(i, p)| PortLayout {
                    port_id: p.id.clone(),
                    direction: p.direction,
                    center: viewport.to_screen(position + Vec2::new(i as f32, 0.0)),
                })
                .collect();
            NodeLayout {
                node_id: node.id.clone(),
                rect: Rect::NOTHING,
                ports,
                fields: Vec::new(),
            }
        }
    }

    #[test]
    fn anchors_are_canvas_space_regardless_of_viewport() {
        let mut graph = FlowGraph::new();
        let node = graph
            .add_node(TEXT_INPUT_TOOL, Pos2::new(30.0, 40.0))
            .unwrap()
            .clone();
        let mut tracker = PortTracker::default();
        for viewport in [Viewport::default(), Viewport::new(1.7, Vec2::new(-90.0, 12.0))] {
            tracker.refresh(&graph, &viewport, &Synthetic, None);
            let anchor = tracker
                .anchor(&PortRef::new(node.id.clone(), node.outputs[0].id.clone()))
                .unwrap();
            assert!((anchor - Pos2::new(31.0, 40.0)).length() < 1e-3);
        }
    }

    #[test]
    fn refresh_node_moves_only_that_node() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(TEXT_AGENT, Pos2::ZERO).unwrap().clone();
        let b = graph.add_node(TEXT_AGENT, Pos2::new(500.0, 0.0)).unwrap().clone();
        let viewport = Viewport::default();
        let mut tracker = PortTracker::default();
        tracker.refresh(&graph, &viewport, &BoxLayout, None);
        let b_before = tracker.anchor(&PortRef::new(b.id.clone(), b.inputs[0].id.clone()));

        tracker.refresh_node(&graph, &a.id, Pos2::new(0.0, 100.0), &viewport, &BoxLayout);
        let a_after = tracker
            .anchor(&PortRef::new(a.id.clone(), a.inputs[0].id.clone()))
            .unwrap();
        let b_after = tracker.anchor(&PortRef::new(b.id.clone(), b.inputs[0].id.clone()));
        assert!(a_after.y > 100.0);
        assert_eq!(b_before, b_after);
        assert_eq!(tracker.anchors().len(), 10);
    }

    #[test]
    fn nearest_respects_radius() {
        let mut graph = FlowGraph::new();
        graph.add_node(TEXT_INPUT_TOOL, Pos2::ZERO);
        let mut tracker = PortTracker::default();
        tracker.refresh(&graph, &Viewport::default(), &Synthetic, None);

        let (port, _) = tracker.nearest(Pos2::new(0.9, 0.0), 0.5).unwrap();
        assert!(port.port_id.starts_with("text-out-"));
        assert_eq!(graph.port_at(port).unwrap().direction, PortDirection::Output);
        assert!(tracker.nearest(Pos2::new(50.0, 50.0), 10.0).is_none());
    }
}
