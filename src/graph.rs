use crate::editor::node_ports::{PortSpec, ports_for_kind};
use crate::node_types::{DataType, FieldType, PortDirection};
use egui::Pos2;
use std::collections::{BTreeSet, HashSet};
use uuid::Uuid;

/// Canonical node/edge collections edited by the canvas.
///
/// The edge set only ever references live nodes and live ports of the right
/// direction: removal prunes touching edges, and bulk replacement validates
/// every incoming edge before the graph is handed back.
#[derive(Clone, Debug, Default)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Last creation stamp handed out for port ids (milliseconds).
    last_stamp: i64,
}

impl PartialEq for FlowGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: String,
    /// Canvas-space top-left corner.
    pub position: Pos2,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

impl Node {
    pub fn port(&self, port_id: &str) -> Option<&Port> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|p| p.id == port_id)
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// First input whose name equals `name`, ignoring case.
    pub fn input_named(&self, name: &str) -> Option<&Port> {
        self.inputs
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub data_type: DataType,
    pub field_type: FieldType,
    pub direction: PortDirection,
    /// Edit-time value; only ever set on inputs.
    pub value: Option<String>,
}

impl Port {
    fn from_spec(spec: &PortSpec, direction: PortDirection, stamp: i64) -> Self {
        Self {
            id: format!("{}-{}", spec.id, stamp),
            name: spec.name.to_string(),
            data_type: spec.data_type,
            field_type: spec.field_type,
            direction,
            value: match direction {
                PortDirection::Input => spec.default_value.map(str::to_string),
                PortDirection::Output => None,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source_node: String,
    pub source_port: String,
    pub target_node: String,
    pub target_port: String,
}

impl Edge {
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }

    fn same_link(&self, other: &EdgeCandidate) -> bool {
        self.source_node == other.source_node
            && self.source_port == other.source_port
            && self.target_node == other.target_node
            && self.target_port == other.target_port
    }
}

/// Identity of one port instance: owning node plus port id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node_id: String,
    pub port_id: String,
}

impl PortRef {
    pub fn new(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
        }
    }
}

/// A proposed connection, not yet accepted by the model.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCandidate {
    pub source_node: String,
    pub source_port: String,
    pub target_node: String,
    pub target_port: String,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn port(&self, node_id: &str, port_id: &str) -> Option<&Port> {
        self.node(node_id)?.port(port_id)
    }

    pub fn port_at(&self, port: &PortRef) -> Option<&Port> {
        self.port(&port.node_id, &port.port_id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    /// Distinct component kinds present in the graph.
    pub fn kinds(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|n| n.kind.as_str()).collect()
    }

    pub fn is_input_connected(&self, node_id: &str, port_id: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.target_node == node_id && e.target_port == port_id)
    }

    fn next_stamp(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_stamp = now.max(self.last_stamp.saturating_add(1));
        self.last_stamp
    }

    /// Places a node of `kind`, copying its ports from the catalog.
    ///
    /// Unknown kinds are refused with `None`.
    pub fn add_node(&mut self, kind: &str, position: Pos2) -> Option<&Node> {
        let Some(spec) = ports_for_kind(kind) else {
            log::warn!("add_node: unknown component kind '{}'", kind);
            return None;
        };
        let stamp = self.next_stamp();
        let node = Node {
            id: Uuid::new_v4().to_string(),
            kind: spec.kind.to_string(),
            position,
            inputs: spec
                .inputs
                .iter()
                .map(|p| Port::from_spec(p, PortDirection::Input, stamp))
                .collect(),
            outputs: spec
                .outputs
                .iter()
                .map(|p| Port::from_spec(p, PortDirection::Output, stamp))
                .collect(),
        };
        log::debug!("Added node {} ({})", node.id, node.kind);
        self.nodes.push(node);
        self.nodes.last()
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        log::debug!(
            "Removed node {} and {} attached edge(s)",
            id,
            before - self.edges.len()
        );
        Some(node)
    }

    pub fn move_node(&mut self, id: &str, position: Pos2) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Binds an edit-time value on an input port. Outputs and unknown ports
    /// are left untouched.
    pub fn set_input_value(&mut self, node_id: &str, port_id: &str, value: Option<String>) -> bool {
        let Some(port) = self
            .node_mut(node_id)
            .and_then(|n| n.inputs.iter_mut().find(|p| p.id == port_id))
        else {
            return false;
        };
        port.value = value;
        true
    }

    fn accepts(&self, candidate: &EdgeCandidate) -> bool {
        let source = self.port(&candidate.source_node, &candidate.source_port);
        let target = self.port(&candidate.target_node, &candidate.target_port);
        matches!(
            (source, target),
            (Some(s), Some(t))
                if s.direction == PortDirection::Output && t.direction == PortDirection::Input
        ) && !self.edges.iter().any(|e| e.same_link(candidate))
    }

    /// Inserts the edge unless it duplicates an existing link or does not
    /// resolve to an output → input pair of live ports. Rejection is silent.
    pub fn add_edge(&mut self, candidate: EdgeCandidate) -> Option<String> {
        if !self.accepts(&candidate) {
            log::debug!("add_edge ignored: {:?}", candidate);
            return None;
        }
        let id = format!("edge-{}", Uuid::new_v4());
        self.edges.push(Edge {
            id: id.clone(),
            source_node: candidate.source_node,
            source_port: candidate.source_port,
            target_node: candidate.target_node,
            target_port: candidate.target_port,
        });
        Some(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(index))
    }

    /// Drops edges whose source or target node is no longer present and
    /// returns their ids.
    pub fn prune_dangling_edges(&mut self) -> Vec<String> {
        let live: HashSet<String> = self.nodes.iter().map(|n| n.id.clone()).collect();
        let mut dropped = Vec::new();
        self.edges.retain(|e| {
            let missing = [&e.source_node, &e.target_node]
                .into_iter()
                .find(|id| !live.contains(*id));
            match missing {
                Some(node_id) => {
                    log::warn!("Dropping edge {}: node {} does not exist", e.id, node_id);
                    dropped.push(e.id.clone());
                    false
                }
                None => true,
            }
        });
        dropped
    }

    /// Replaces the whole node set (e.g. loading a saved graph). Edges that do
    /// not resolve against the new nodes, point the wrong way, or repeat an
    /// earlier link are dropped; the count of dropped edges is returned.
    ///
    /// A node whose id repeats an earlier one is dropped as well.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> usize {
        let mut seen = HashSet::new();
        self.nodes = nodes
            .into_iter()
            .filter(|node| {
                let fresh = seen.insert(node.id.clone());
                if !fresh {
                    log::warn!("Dropping node {} on load: duplicate id", node.id);
                }
                fresh
            })
            .collect();
        self.edges.clear();
        self.last_stamp = self.last_stamp.max(max_port_stamp(&self.nodes));

        let mut dropped = 0;
        for edge in edges {
            let candidate = EdgeCandidate {
                source_node: edge.source_node.clone(),
                source_port: edge.source_port.clone(),
                target_node: edge.target_node.clone(),
                target_port: edge.target_port.clone(),
            };
            if self.accepts(&candidate) && self.edge(&edge.id).is_none() {
                self.edges.push(edge);
            } else {
                log::warn!(
                    "Dropping edge {} on load: {} / {} -> {} / {} does not resolve",
                    edge.id,
                    edge.source_node,
                    edge.source_port,
                    edge.target_node,
                    edge.target_port
                );
                dropped += 1;
            }
        }
        dropped
    }
}

/// 9999-12-31T23:59:59.999Z in milliseconds.
const MAX_STAMP_MILLIS: i64 = 253_402_300_799_999;

/// Highest numeric stamp suffix among port ids, so freshly stamped ports
/// never collide with loaded ones. Suffixes outside the millisecond clock
/// range are not stamps and are skipped.
fn max_port_stamp(nodes: &[Node]) -> i64 {
    nodes
        .iter()
        .flat_map(|n| n.ports())
        .filter_map(|p| p.id.rsplit('-').next()?.parse::<i64>().ok())
        .filter(|stamp| (0..=MAX_STAMP_MILLIS).contains(stamp))
        .max()
        .unwrap_or(0)
}
