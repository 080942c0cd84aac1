//! Serialized graph format shared with the persistence collaborator.
//!
//! ```json
//! {
//!   "nodes": [{ "id": "...", "type": "Text-Agent", "position": { "x": 0, "y": 0 },
//!               "data": { "inputs": [{ "id", "name", "type", "fieldType", "value" }],
//!                         "outputs": [...] } }],
//!   "edges": [{ "id", "source", "sourceHandle", "target", "targetHandle" }]
//! }
//! ```

use crate::error::DocumentError;
use crate::graph::{Edge, FlowGraph, Node, Port};
use crate::node_types::{DataType, FieldType, PortDirection};
use egui::Pos2;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub position: Pos2,
    #[serde(default)]
    pub data: NodeData,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub inputs: Vec<PortRecord>,
    #[serde(default)]
    pub outputs: Vec<PortRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: DataType,
    #[serde(rename = "fieldType", default)]
    pub field_type: FieldType,
    #[serde(
        default,
        deserialize_with = "lenient_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    #[serde(rename = "sourceHandle")]
    pub source_handle: String,
    pub target: String,
    #[serde(rename = "targetHandle")]
    pub target_handle: String,
}

/// Accepts numbers and booleans as field values; saved graphs written by
/// other editors do not always quote them.
fn lenient_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

impl PortRecord {
    fn from_port(port: &Port) -> Self {
        Self {
            id: port.id.clone(),
            name: port.name.clone(),
            data_type: port.data_type,
            field_type: port.field_type,
            value: port.value.clone(),
        }
    }

    fn to_port(&self, direction: PortDirection) -> Port {
        Port {
            id: self.id.clone(),
            name: self.name.clone(),
            data_type: self.data_type,
            field_type: self.field_type,
            direction,
            value: match direction {
                PortDirection::Input => self.value.clone(),
                PortDirection::Output => None,
            },
        }
    }
}

impl GraphDocument {
    pub fn from_graph(graph: &FlowGraph) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                id: node.id.clone(),
                kind: node.kind.clone(),
                position: node.position,
                data: NodeData {
                    inputs: node.inputs.iter().map(PortRecord::from_port).collect(),
                    outputs: node.outputs.iter().map(PortRecord::from_port).collect(),
                },
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|edge| EdgeRecord {
                id: edge.id.clone(),
                source: edge.source_node.clone(),
                source_handle: edge.source_port.clone(),
                target: edge.target_node.clone(),
                target_handle: edge.target_port.clone(),
            })
            .collect();
        Self { nodes, edges }
    }

    /// Replaces the contents of `graph` with this document. Edges that do not
    /// resolve are dropped and counted.
    pub fn apply_to(&self, graph: &mut FlowGraph) -> usize {
        let nodes = self
            .nodes
            .iter()
            .map(|record| {
                if crate::editor::node_ports::ports_for_kind(&record.kind).is_none() {
                    log::warn!("Node {} has unknown kind '{}'", record.id, record.kind);
                }
                Node {
                    id: record.id.clone(),
                    kind: record.kind.clone(),
                    position: record.position,
                    inputs: record
                        .data
                        .inputs
                        .iter()
                        .map(|p| p.to_port(PortDirection::Input))
                        .collect(),
                    outputs: record
                        .data
                        .outputs
                        .iter()
                        .map(|p| p.to_port(PortDirection::Output))
                        .collect(),
                }
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|record| Edge {
                id: record.id.clone(),
                source_node: record.source.clone(),
                source_port: record.source_handle.clone(),
                target_node: record.target.clone(),
                target_port: record.target_handle.clone(),
            })
            .collect();
        let dropped = graph.replace(nodes, edges);
        if dropped > 0 {
            log::warn!("Dropped {} unresolvable edge(s) while loading", dropped);
        }
        dropped
    }

    pub fn to_graph(&self) -> FlowGraph {
        let mut graph = FlowGraph::new();
        self.apply_to(&mut graph);
        graph
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let json = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Writes pretty JSON, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let io_err = |source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json()?).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeCandidate;
    use crate::node_types::{END, TEXT_AGENT, TEXT_INPUT_TOOL};

    fn sample_graph() -> FlowGraph {
        let mut graph = FlowGraph::new();
        let input = graph
            .add_node(TEXT_INPUT_TOOL, Pos2::new(-120.5, 40.25))
            .unwrap()
            .clone();
        let agent = graph
            .add_node(TEXT_AGENT, Pos2::new(200.0, 10.0))
            .unwrap()
            .clone();
        graph.set_input_value(&input.id, &input.inputs[0].id, Some("hello".into()));
        graph.add_edge(EdgeCandidate {
            source_node: input.id.clone(),
            source_port: input.outputs[0].id.clone(),
            target_node: agent.id.clone(),
            target_port: agent.inputs[0].id.clone(),
        });
        graph
    }

    #[test]
    fn save_then_load_is_the_same_graph() {
        let graph = sample_graph();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("flow.json");

        GraphDocument::from_graph(&graph).save(&path).unwrap();
        let loaded = GraphDocument::load(&path).unwrap().to_graph();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn wire_names_match_the_collaborator_format() {
        let json = GraphDocument::from_graph(&sample_graph()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let node = &value["nodes"][0];
        assert_eq!(node["type"], "Text-Input-Tool");
        assert_eq!(node["data"]["inputs"][0]["fieldType"], "textarea");
        assert_eq!(node["data"]["inputs"][0]["type"], "string");
        assert_eq!(node["data"]["inputs"][0]["value"], "hello");
        assert!(node["data"]["outputs"][0].get("value").is_none());
        assert!(value["edges"][0]["sourceHandle"].is_string());
    }

    #[test]
    fn loading_drops_edges_to_missing_nodes() {
        let json = r#"{
            "nodes": [{ "id": "a", "kind": "End", "position": { "x": 1, "y": 2 },
                        "data": { "inputs": [{ "id": "end-1", "name": "End", "type": "string", "fieldType": "none" }] } }],
            "edges": [{ "id": "e1", "source": "ghost", "sourceHandle": "output-1",
                        "target": "a", "targetHandle": "end-1" }]
        }"#;
        let doc = GraphDocument::from_json(json).unwrap();
        let mut graph = FlowGraph::new();
        assert_eq!(doc.apply_to(&mut graph), 1);
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.nodes()[0].kind, END);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn nodes_can_be_added_after_loading_a_huge_port_suffix() {
        let json = r#"{
            "nodes": [{ "id": "a", "type": "End", "position": { "x": 0, "y": 0 },
                        "data": { "inputs": [{ "id": "end-9223372036854775807", "name": "End",
                                               "type": "string", "fieldType": "none" }] } }]
        }"#;
        let mut graph = FlowGraph::new();
        GraphDocument::from_json(json).unwrap().apply_to(&mut graph);

        let first = graph.add_node(TEXT_AGENT, Pos2::ZERO).unwrap().inputs[0].id.clone();
        let second = graph.add_node(TEXT_AGENT, Pos2::ZERO).unwrap().inputs[0].id.clone();
        assert_ne!(first, second);
        assert_eq!(graph.nodes().len(), 3);
    }

    #[test]
    fn numeric_values_are_read_as_text() {
        let json = r#"{ "id": "p", "name": "Count", "type": "number", "value": 3 }"#;
        let port: PortRecord = serde_json::from_str(json).unwrap();
        assert_eq!(port.value.as_deref(), Some("3"));
        assert_eq!(port.field_type, FieldType::None);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match GraphDocument::load(&path) {
            Err(DocumentError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(
            GraphDocument::from_json("{ nodes: "),
            Err(DocumentError::Json(_))
        ));
    }
}
