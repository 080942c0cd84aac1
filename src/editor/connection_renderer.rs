//! Connection routing and rendering.
//!
//! Computes the cubic curve between two canvas-space anchors, samples it for
//! drawing and pick-testing, and paints it with egui. The same curve serves
//! committed edges and the live preview of a connection drag.

use super::coordinate_transform::Viewport;
use super::port_tracker::PortTracker;
use super::utils::distance_to_segment;
use crate::graph::{Edge, FlowGraph, PortRef};
use egui::{Color32, Pos2, Stroke};

/// Minimum horizontal control-point offset, in canvas units.
pub const MIN_CONTROL_OFFSET: f32 = 100.0;
/// Fraction of the horizontal span used as control-point offset.
pub const CONTROL_OFFSET_RATIO: f32 = 0.3;
/// Segments used when flattening a curve.
pub const CURVE_STEPS: usize = 32;

/// Cubic bezier leaving `from` and entering `to` horizontally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionCurve {
    pub from: Pos2,
    pub ctrl1: Pos2,
    pub ctrl2: Pos2,
    pub to: Pos2,
}

/// Builds the curve between two canvas points.
pub fn curve(from: Pos2, to: Pos2) -> ConnectionCurve {
    let control_offset = ((to.x - from.x).abs() * CONTROL_OFFSET_RATIO).max(MIN_CONTROL_OFFSET);
    ConnectionCurve {
        from,
        ctrl1: Pos2::new(from.x + control_offset, from.y),
        ctrl2: Pos2::new(to.x - control_offset, to.y),
        to,
    }
}

impl ConnectionCurve {
    pub fn point_at(&self, t: f32) -> Pos2 {
        let it = 1.0 - t;
        (it.powi(3) * self.from.to_vec2()
            + 3.0 * it.powi(2) * t * self.ctrl1.to_vec2()
            + 3.0 * it * t.powi(2) * self.ctrl2.to_vec2()
            + t.powi(3) * self.to.to_vec2())
        .to_pos2()
    }

    /// Flattens the curve into `steps + 1` points.
    pub fn sample(&self, steps: usize) -> Vec<Pos2> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.point_at(i as f32 / steps as f32))
            .collect()
    }

    /// Approximate distance from `p` to the curve.
    pub fn distance_to(&self, p: Pos2) -> f32 {
        self.sample(CURVE_STEPS)
            .windows(2)
            .map(|w| distance_to_segment(p, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }

    /// Whether `p` lies on an invisible stroke of `hit_width` along the curve.
    pub fn hit_test(&self, p: Pos2, hit_width: f32) -> bool {
        self.distance_to(p) <= hit_width * 0.5
    }

    /// The same curve in screen space.
    pub fn to_screen(&self, viewport: &Viewport) -> ConnectionCurve {
        ConnectionCurve {
            from: viewport.to_screen(self.from),
            ctrl1: viewport.to_screen(self.ctrl1),
            ctrl2: viewport.to_screen(self.ctrl2),
            to: viewport.to_screen(self.to),
        }
    }
}

/// A committed edge with its current curve.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutedEdge {
    pub edge_id: String,
    pub curve: ConnectionCurve,
}

fn endpoints(edge: &Edge, anchors: &PortTracker) -> Option<(Pos2, Pos2)> {
    let from = anchors.anchor(&PortRef::new(
        edge.source_node.clone(),
        edge.source_port.clone(),
    ))?;
    let to = anchors.anchor(&PortRef::new(
        edge.target_node.clone(),
        edge.target_port.clone(),
    ))?;
    Some((from, to))
}

/// Curves for every edge whose endpoints are currently anchored. Edges with a
/// missing anchor are skipped for this frame.
pub fn route_edges(graph: &FlowGraph, anchors: &PortTracker) -> Vec<RoutedEdge> {
    graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let (from, to) = endpoints(edge, anchors)?;
            Some(RoutedEdge {
                edge_id: edge.id.clone(),
                curve: curve(from, to),
            })
        })
        .collect()
}

/// The edge under canvas point `p`, if any. The closest curve wins when
/// several hit paths overlap.
pub fn pick_edge(
    graph: &FlowGraph,
    anchors: &PortTracker,
    p: Pos2,
    hit_width: f32,
) -> Option<String> {
    route_edges(graph, anchors)
        .into_iter()
        .map(|routed| {
            let distance = routed.curve.distance_to(p);
            (routed.edge_id, distance)
        })
        .filter(|(_, distance)| *distance <= hit_width * 0.5)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Draw a curve (given in screen space) with gradient coloring.
pub fn draw_curve(
    painter: &egui::Painter,
    screen_curve: &ConnectionCurve,
    c1_color: Color32,
    c2_color: Color32,
    width: f32,
) {
    let points = screen_curve.sample(CURVE_STEPS);
    for (i, segment) in points.windows(2).enumerate() {
        let t = i as f32 / (points.len() - 1) as f32;
        let color = super::utils::lerp_color(c1_color, c2_color, t);
        painter.line_segment([segment[0], segment[1]], Stroke::new(width, color));
    }
}
