//! # Canvas Editor
//!
//! Headless editing core for the node canvas. Everything that the desktop
//! shell needs to turn pointer input into graph mutations lives here, owned
//! by an explicit [`CanvasSession`] rather than ambient UI state.
//!
//! ## Submodules
//! - [`coordinate_transform`]: viewport zoom/pan and screen ↔ canvas mapping
//! - [`node_layout`]: default node geometry and pointer hit-testing
//! - [`port_tracker`]: canvas-space port anchors
//! - [`interaction`]: pointer-driven state machine
//! - [`connection_renderer`]: edge curves, picking and drawing
//! - [`node_ports`]: component-kind port catalog
//! - [`style`]: editor colors
//! - [`utils`]: geometry and color helpers

pub mod connection_renderer;
pub mod coordinate_transform;
pub mod interaction;
pub mod node_layout;
pub mod node_ports;
pub mod port_tracker;
pub mod style;
pub mod utils;

pub use coordinate_transform::{MAX_ZOOM, MIN_ZOOM, Viewport};
pub use interaction::{InteractionOutcome, InteractionState, PointerButton, PointerEvent};
pub use node_layout::{BoxLayout, HitTarget, NodeLayout};
pub use port_tracker::{GeometryProbe, PortTracker, compute_anchors};
pub use style::EditorStyle;

use crate::graph::FlowGraph;
use connection_renderer::{ConnectionCurve, curve};
use egui::{Pos2, Rect};

/// Snap radius for connection drops, in screen pixels at scale 1.
pub const SNAP_RADIUS: f32 = 40.0;
/// Width of the invisible stroke used to pick edges, in canvas units.
pub const EDGE_HIT_WIDTH: f32 = 12.0;

/// Viewport, interaction state and anchor cache of one canvas.
#[derive(Clone, Debug)]
pub struct CanvasSession {
    pub(crate) viewport: Viewport,
    pub(crate) state: InteractionState,
    pub(crate) anchors: PortTracker,
    pub(crate) snap_radius: f32,
    pub(crate) edge_hit_width: f32,
}

impl Default for CanvasSession {
    fn default() -> Self {
        Self::new(SNAP_RADIUS, EDGE_HIT_WIDTH)
    }
}

impl CanvasSession {
    pub fn new(snap_radius: f32, edge_hit_width: f32) -> Self {
        Self {
            viewport: Viewport::default(),
            state: InteractionState::Idle,
            anchors: PortTracker::default(),
            snap_radius,
            edge_hit_width,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn anchors(&self) -> &PortTracker {
        &self.anchors
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Snap radius in canvas units at the current scale.
    pub fn snap_radius_canvas(&self) -> f32 {
        self.viewport.screen_to_canvas_len(self.snap_radius)
    }

    /// Attaches to the drawable area (centering once) and refreshes anchors
    /// when the area moved.
    pub fn mount(&mut self, area: Rect, graph: &FlowGraph, probe: &dyn GeometryProbe) {
        let before = self.viewport;
        self.viewport.mount(area);
        if before != self.viewport {
            self.refresh_anchors(graph, probe);
        }
    }

    /// Resets zoom and centers the canvas origin again.
    pub fn reset_view(&mut self, area: Rect, graph: &FlowGraph, probe: &dyn GeometryProbe) {
        self.viewport.reset(area);
        self.refresh_anchors(graph, probe);
    }

    /// Full anchor recompute against the current geometry, honoring a node
    /// drag preview if one is in progress.
    pub fn refresh_anchors(&mut self, graph: &FlowGraph, probe: &dyn GeometryProbe) {
        let preview = match &self.state {
            InteractionState::DraggingNode {
                node_id, preview, ..
            } => Some((node_id.as_str(), *preview)),
            _ => None,
        };
        self.anchors.refresh(graph, &self.viewport, probe, preview);
    }

    /// Position a node should be drawn at this frame.
    pub fn display_position(&self, node_id: &str, committed: Pos2) -> Pos2 {
        match &self.state {
            InteractionState::DraggingNode {
                node_id: dragged,
                preview,
                ..
            } if dragged == node_id => *preview,
            _ => committed,
        }
    }

    /// Screen-space layouts of all nodes as drawn this frame.
    pub fn layouts(&self, graph: &FlowGraph, probe: &dyn GeometryProbe) -> Vec<NodeLayout> {
        let preview = match &self.state {
            InteractionState::DraggingNode {
                node_id, preview, ..
            } => Some((node_id.as_str(), *preview)),
            _ => None,
        };
        probe.measure(graph, &self.viewport, preview)
    }

    /// Curve from the origin port to the pointer while a connection is being
    /// dragged. The curve always runs output → input.
    pub fn preview_curve(&self) -> Option<ConnectionCurve> {
        let InteractionState::DraggingConnection {
            origin,
            origin_direction,
            pointer,
        } = &self.state
        else {
            return None;
        };
        let anchor = self.anchors.anchor(origin)?;
        Some(match origin_direction {
            crate::node_types::PortDirection::Output => curve(anchor, *pointer),
            crate::node_types::PortDirection::Input => curve(*pointer, anchor),
        })
    }

    /// Removes a node and its edges, cancelling any drag that involves it.
    pub fn remove_node(
        &mut self,
        graph: &mut FlowGraph,
        node_id: &str,
        probe: &dyn GeometryProbe,
    ) -> bool {
        if graph.remove_node(node_id).is_none() {
            return false;
        }
        if self.state.involves(node_id) {
            log::debug!("Drag cancelled: node {} was removed", node_id);
            self.state = InteractionState::Idle;
        }
        self.refresh_anchors(graph, probe);
        true
    }

    /// Called after the graph was swapped wholesale (load, undo, redo).
    pub fn graph_replaced(&mut self, graph: &FlowGraph, probe: &dyn GeometryProbe) {
        self.state = InteractionState::Idle;
        self.refresh_anchors(graph, probe);
    }
}
