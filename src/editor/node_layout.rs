//! Default node geometry.
//!
//! Nodes are drawn as fixed-width boxes: a header, one row per input, then one
//! row per output. Inputs anchor on the left edge, outputs on the right edge.
//! Unconnected editable inputs get an inline field inside their row.
//!
//! [`BoxLayout`] is the [`GeometryProbe`] the desktop shell renders with, so
//! anchors, hit-testing, and drawing all agree on where things are.

use super::coordinate_transform::Viewport;
use super::port_tracker::GeometryProbe;
use crate::graph::{FlowGraph, Node, PortRef};
use crate::node_types::PortDirection;
use egui::{Pos2, Rect, Vec2};

pub const NODE_WIDTH: f32 = 240.0;
pub const HEADER_HEIGHT: f32 = 32.0;
pub const ROW_HEIGHT: f32 = 30.0;
pub const BOTTOM_PADDING: f32 = 8.0;
pub const PORT_RADIUS: f32 = 6.0;
/// Extra pick slack around a port dot, in screen pixels.
pub const PORT_PICK_SLACK: f32 = 4.0;
const FIELD_LEFT: f32 = 96.0;
const FIELD_RIGHT_MARGIN: f32 = 12.0;
const FIELD_VERTICAL_INSET: f32 = 4.0;

/// Screen-space geometry of one rendered node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayout {
    pub node_id: String,
    pub rect: Rect,
    pub ports: Vec<PortLayout>,
    pub fields: Vec<FieldLayout>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortLayout {
    pub port_id: String,
    pub direction: PortDirection,
    pub center: Pos2,
}

/// Inline editor for an unconnected input.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldLayout {
    pub port_id: String,
    pub rect: Rect,
}

/// What lies under a screen point.
#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
    Port(PortRef),
    Field { node_id: String, port_id: String },
    NodeBody(String),
    Canvas,
}

/// Canvas-space height of a node box.
pub fn node_height(node: &Node) -> f32 {
    HEADER_HEIGHT + (node.inputs.len() + node.outputs.len()) as f32 * ROW_HEIGHT + BOTTOM_PADDING
}

/// Canvas-space size of a node box.
pub fn node_size(node: &Node) -> Vec2 {
    Vec2::new(NODE_WIDTH, node_height(node))
}

/// Box-and-rows geometry used by the desktop shell.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxLayout;

impl GeometryProbe for BoxLayout {
    fn measure_node(
        &self,
        graph: &FlowGraph,
        node: &Node,
        position: Pos2,
        viewport: &Viewport,
    ) -> NodeLayout {
        let row_center = |row: usize| HEADER_HEIGHT + ROW_HEIGHT * (row as f32 + 0.5);
        let to_screen = |offset: Vec2| viewport.to_screen(position + offset);

        let mut ports = Vec::with_capacity(node.inputs.len() + node.outputs.len());
        let mut fields = Vec::new();
        for (row, input) in node.inputs.iter().enumerate() {
            ports.push(PortLayout {
                port_id: input.id.clone(),
                direction: PortDirection::Input,
                center: to_screen(Vec2::new(0.0, row_center(row))),
            });
            if input.field_type.is_editable() && !graph.is_input_connected(&node.id, &input.id) {
                let top = HEADER_HEIGHT + ROW_HEIGHT * row as f32 + FIELD_VERTICAL_INSET;
                let bottom = top + ROW_HEIGHT - 2.0 * FIELD_VERTICAL_INSET;
                fields.push(FieldLayout {
                    port_id: input.id.clone(),
                    rect: Rect::from_min_max(
                        to_screen(Vec2::new(FIELD_LEFT, top)),
                        to_screen(Vec2::new(NODE_WIDTH - FIELD_RIGHT_MARGIN, bottom)),
                    ),
                });
            }
        }
        for (row, output) in node.outputs.iter().enumerate() {
            ports.push(PortLayout {
                port_id: output.id.clone(),
                direction: PortDirection::Output,
                center: to_screen(Vec2::new(NODE_WIDTH, row_center(node.inputs.len() + row))),
            });
        }

        NodeLayout {
            node_id: node.id.clone(),
            rect: Rect::from_min_max(to_screen(Vec2::ZERO), to_screen(node_size(node))),
            ports,
            fields,
        }
    }
}

/// Finds what lies under `screen`. Later layouts are drawn on top, so they
/// win; within a node, ports beat fields, which beat the body.
pub fn hit_test(layouts: &[NodeLayout], screen: Pos2, scale: f32) -> HitTarget {
    let port_radius = PORT_RADIUS * scale + PORT_PICK_SLACK;
    for layout in layouts.iter().rev() {
        if let Some(port) = layout
            .ports
            .iter()
            .find(|p| p.center.distance(screen) <= port_radius)
        {
            return HitTarget::Port(PortRef::new(layout.node_id.clone(), port.port_id.clone()));
        }
        if let Some(field) = layout.fields.iter().find(|f| f.rect.contains(screen)) {
            return HitTarget::Field {
                node_id: layout.node_id.clone(),
                port_id: field.port_id.clone(),
            };
        }
        if layout.rect.contains(screen) {
            return HitTarget::NodeBody(layout.node_id.clone());
        }
    }
    HitTarget::Canvas
}
