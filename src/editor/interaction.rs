//! Pointer interaction state machine.
//!
//! Every gesture starts from [`InteractionState::Idle`] on a pointer-down and
//! returns there on pointer-up:
//!
//! | pointer-down on          | state                |
//! |--------------------------|----------------------|
//! | port                     | `DraggingConnection` |
//! | node body                | `DraggingNode`       |
//! | empty canvas / middle    | `Panning`            |
//! | inline field             | stays `Idle`         |
//!
//! A node drag commits its position once, on release. A connection drag snaps
//! to the nearest anchor within `SNAP_RADIUS / scale` canvas units and only
//! proposes an edge between opposite directions on different nodes.

use super::CanvasSession;
use super::connection_renderer::pick_edge;
use super::node_layout::HitTarget;
use super::port_tracker::GeometryProbe;
use crate::graph::{EdgeCandidate, FlowGraph, PortRef};
use crate::node_types::PortDirection;
use egui::{Pos2, Vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Pointer input in screen space.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerEvent {
    Down {
        pos: Pos2,
        button: PointerButton,
        target: HitTarget,
    },
    Move {
        pos: Pos2,
    },
    Up {
        pos: Pos2,
    },
    /// Multiplicative zoom around a screen pivot.
    Zoom {
        factor: f32,
        pivot: Pos2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    DraggingNode {
        node_id: String,
        /// Canvas-space pointer at pointer-down.
        start_pointer: Pos2,
        start_node_pos: Pos2,
        /// Uncommitted position drawn while dragging.
        preview: Pos2,
    },
    DraggingConnection {
        origin: PortRef,
        origin_direction: PortDirection,
        /// Canvas-space pointer, end of the preview curve.
        pointer: Pos2,
    },
    Panning {
        /// Screen-space pointer of the previous event.
        last_pointer: Pos2,
    },
}

impl InteractionState {
    /// Whether this state holds a reference to `node_id`.
    pub fn involves(&self, node_id: &str) -> bool {
        match self {
            InteractionState::DraggingNode { node_id: id, .. } => id == node_id,
            InteractionState::DraggingConnection { origin, .. } => origin.node_id == node_id,
            _ => false,
        }
    }
}

/// What a handled event changed.
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionOutcome {
    None,
    NodeMoved { node_id: String, position: Pos2 },
    EdgeCreated(String),
    EdgeRemoved(String),
    ViewportChanged,
    /// The gesture's node or port disappeared; nothing was committed.
    Aborted,
}

impl InteractionOutcome {
    /// Whether the graph (not only the view) changed.
    pub fn mutates_graph(&self) -> bool {
        matches!(
            self,
            InteractionOutcome::NodeMoved { .. }
                | InteractionOutcome::EdgeCreated(_)
                | InteractionOutcome::EdgeRemoved(_)
        )
    }
}

impl CanvasSession {
    /// Feeds one pointer event through the state machine.
    pub fn handle(
        &mut self,
        graph: &mut FlowGraph,
        probe: &dyn GeometryProbe,
        event: PointerEvent,
    ) -> InteractionOutcome {
        match event {
            PointerEvent::Down {
                pos,
                button,
                target,
            } => self.pointer_down(graph, pos, button, target),
            PointerEvent::Move { pos } => self.pointer_move(graph, probe, pos),
            PointerEvent::Up { pos } => self.pointer_up(graph, probe, pos),
            PointerEvent::Zoom { factor, pivot } => {
                self.viewport.zoom_by(factor, pivot);
                self.refresh_anchors(graph, probe);
                InteractionOutcome::ViewportChanged
            }
        }
    }

    fn pointer_down(
        &mut self,
        graph: &mut FlowGraph,
        pos: Pos2,
        button: PointerButton,
        target: HitTarget,
    ) -> InteractionOutcome {
        if !self.is_idle() {
            log::debug!("Ignoring pointer-down during {:?}", self.state);
            return InteractionOutcome::None;
        }
        let canvas = self.viewport.to_canvas(pos);

        match (button, target) {
            (PointerButton::Middle, _) => {
                self.state = InteractionState::Panning { last_pointer: pos };
                InteractionOutcome::None
            }
            (PointerButton::Secondary, HitTarget::Port(_)) => InteractionOutcome::None,
            (PointerButton::Secondary, _) => {
                match pick_edge(graph, &self.anchors, canvas, self.edge_hit_width) {
                    Some(edge_id) => {
                        graph.remove_edge(&edge_id);
                        log::debug!("Removed edge {}", edge_id);
                        InteractionOutcome::EdgeRemoved(edge_id)
                    }
                    None => InteractionOutcome::None,
                }
            }
            (PointerButton::Primary, HitTarget::Port(origin)) => {
                let Some(port) = graph.port_at(&origin) else {
                    return InteractionOutcome::None;
                };
                self.state = InteractionState::DraggingConnection {
                    origin_direction: port.direction,
                    origin,
                    pointer: canvas,
                };
                InteractionOutcome::None
            }
            (PointerButton::Primary, HitTarget::NodeBody(node_id)) => {
                let Some(node) = graph.node(&node_id) else {
                    return InteractionOutcome::None;
                };
                self.state = InteractionState::DraggingNode {
                    start_pointer: canvas,
                    start_node_pos: node.position,
                    preview: node.position,
                    node_id,
                };
                InteractionOutcome::None
            }
            // The field keeps the pointer.
            (PointerButton::Primary, HitTarget::Field { .. }) => InteractionOutcome::None,
            (PointerButton::Primary, HitTarget::Canvas) => {
                self.state = InteractionState::Panning { last_pointer: pos };
                InteractionOutcome::None
            }
        }
    }

    fn pointer_move(
        &mut self,
        graph: &FlowGraph,
        probe: &dyn GeometryProbe,
        pos: Pos2,
    ) -> InteractionOutcome {
        if self.origin_vanished(graph) {
            return self.abort();
        }
        let canvas = self.viewport.to_canvas(pos);

        match &mut self.state {
            InteractionState::Idle => InteractionOutcome::None,
            InteractionState::DraggingNode {
                node_id,
                start_pointer,
                start_node_pos,
                preview,
            } => {
                *preview = *start_node_pos + (canvas - *start_pointer);
                let (node_id, preview) = (node_id.clone(), *preview);
                self.anchors
                    .refresh_node(graph, &node_id, preview, &self.viewport, probe);
                InteractionOutcome::None
            }
            InteractionState::DraggingConnection { pointer, .. } => {
                *pointer = canvas;
                InteractionOutcome::None
            }
            InteractionState::Panning { last_pointer } => {
                let delta: Vec2 = pos - *last_pointer;
                *last_pointer = pos;
                if delta == Vec2::ZERO {
                    return InteractionOutcome::None;
                }
                self.viewport.pan_by(delta);
                self.refresh_anchors(graph, probe);
                InteractionOutcome::ViewportChanged
            }
        }
    }

    fn pointer_up(
        &mut self,
        graph: &mut FlowGraph,
        probe: &dyn GeometryProbe,
        pos: Pos2,
    ) -> InteractionOutcome {
        if self.origin_vanished(graph) {
            return self.abort();
        }
        let canvas = self.viewport.to_canvas(pos);
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);

        let outcome = match state {
            InteractionState::Idle => return InteractionOutcome::None,
            InteractionState::DraggingNode {
                node_id,
                start_pointer,
                start_node_pos,
                ..
            } => {
                let position = start_node_pos + (canvas - start_pointer);
                if position != start_node_pos && graph.move_node(&node_id, position) {
                    InteractionOutcome::NodeMoved { node_id, position }
                } else {
                    InteractionOutcome::None
                }
            }
            InteractionState::DraggingConnection {
                origin,
                origin_direction,
                ..
            } => self.finish_connection(graph, origin, origin_direction, canvas),
            InteractionState::Panning { last_pointer } => {
                // Motion since the last move still counts.
                let delta: Vec2 = pos - last_pointer;
                if delta == Vec2::ZERO {
                    InteractionOutcome::None
                } else {
                    self.viewport.pan_by(delta);
                    InteractionOutcome::ViewportChanged
                }
            }
        };
        self.refresh_anchors(graph, probe);
        outcome
    }

    /// Resolves the drop point of a connection drag into an edge, if the
    /// nearest anchor in snap range is a valid partner.
    fn finish_connection(
        &self,
        graph: &mut FlowGraph,
        origin: PortRef,
        origin_direction: PortDirection,
        drop: Pos2,
    ) -> InteractionOutcome {
        let Some((target, _)) = self.anchors.nearest(drop, self.snap_radius_canvas()) else {
            log::debug!("Connection dropped outside snap range");
            return InteractionOutcome::None;
        };
        let Some(target_port) = graph.port_at(target) else {
            return InteractionOutcome::None;
        };
        if target_port.direction != origin_direction.opposite() || target.node_id == origin.node_id
        {
            log::debug!("Connection rejected: {:?} -> {:?}", origin, target);
            return InteractionOutcome::None;
        }

        let (source, sink) = match origin_direction {
            PortDirection::Output => (origin, target.clone()),
            PortDirection::Input => (target.clone(), origin),
        };
        let candidate = EdgeCandidate {
            source_node: source.node_id,
            source_port: source.port_id,
            target_node: sink.node_id,
            target_port: sink.port_id,
        };
        match graph.add_edge(candidate) {
            Some(id) => InteractionOutcome::EdgeCreated(id),
            None => InteractionOutcome::None,
        }
    }

    fn origin_vanished(&self, graph: &FlowGraph) -> bool {
        match &self.state {
            InteractionState::DraggingNode { node_id, .. } => graph.node(node_id).is_none(),
            InteractionState::DraggingConnection { origin, .. } => graph.port_at(origin).is_none(),
            _ => false,
        }
    }

    fn abort(&mut self) -> InteractionOutcome {
        log::debug!("Aborting {:?}: its node or port is gone", self.state);
        self.state = InteractionState::Idle;
        InteractionOutcome::Aborted
    }
}
