//! Execution request construction.
//!
//! Matched patterns get a hand-built request whose fields are read by port
//! name from the bound nodes. Everything else is serialized whole for the
//! generic workflow route.

use super::patterns::{PatternMatch, RequestKind};
use crate::document::GraphDocument;
use crate::error::DispatchError;
use crate::graph::{FlowGraph, Node};
use crate::node_types::{FILE_INPUT_TOOL, MARKETING_EMAIL_AGENT, TEXT_INPUT_TOOL, ZOOM_AGENT};
use serde_json::json;
use std::path::PathBuf;
use uuid::Uuid;

/// Model used when an agent's model selector is empty.
pub const DEFAULT_MODEL: &str = "gemini";
pub const DEFAULT_COMPANY_NAME: &str = "Powerlook";
pub const FALLBACK_ENDPOINT: &str = "/execute_dynamic_workflow";
/// Pattern id reported for generic dispatch.
pub const GENERIC_PATTERN: &str = "generic";

#[derive(Clone, Debug, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart {
        fields: Vec<(String, String)>,
        file: Option<FilePart>,
    },
    Empty,
}

/// A fully built execution call.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchRequest {
    pub pattern_id: String,
    /// Route path, appended to the backend base URL.
    pub endpoint: String,
    pub body: RequestBody,
}

impl DispatchRequest {
    pub fn is_generic(&self) -> bool {
        self.pattern_id == GENERIC_PATTERN
    }
}

/// Reads named input values off the nodes a pattern bound.
struct Extractor<'a> {
    graph: &'a FlowGraph,
    matched: &'a PatternMatch,
}

impl<'a> Extractor<'a> {
    fn pattern(&self) -> &'static str {
        self.matched.pattern.id
    }

    fn node(&self, kind: &str) -> Result<&'a Node, DispatchError> {
        let id = self
            .matched
            .node_for(kind)
            .ok_or_else(|| DispatchError::extraction(self.pattern(), format!("no {kind} node")))?;
        // Re-resolve so a stale binding is reported instead of sent.
        self.graph.node(id).ok_or_else(|| {
            DispatchError::extraction(self.pattern(), format!("{kind} node {id} is gone"))
        })
    }

    /// Trimmed, non-empty value of the input named `name` on the bound node.
    fn value(&self, kind: &str, name: &str) -> Result<Option<String>, DispatchError> {
        let port = self.node(kind)?.input_named(name).ok_or_else(|| {
            DispatchError::extraction(self.pattern(), format!("{kind} has no '{name}' input"))
        })?;
        Ok(port
            .value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string))
    }

    fn value_or(&self, kind: &str, name: &str, default: &str) -> Result<String, DispatchError> {
        Ok(self
            .value(kind, name)?
            .unwrap_or_else(|| default.to_string()))
    }

    fn query(&self) -> Result<String, DispatchError> {
        self.value_or(TEXT_INPUT_TOOL, "Text", "")
    }

    fn model(&self, agent: &str) -> Result<String, DispatchError> {
        self.value_or(agent, "LLM", DEFAULT_MODEL)
    }

    /// Path chosen on the File-Input-Tool. Required: there is no default file.
    fn file(&self, field: &str) -> Result<FilePart, DispatchError> {
        let path = self.value(FILE_INPUT_TOOL, "File")?.ok_or_else(|| {
            DispatchError::extraction(self.pattern(), "no file selected on File-Input-Tool")
        })?;
        Ok(FilePart {
            field: field.to_string(),
            path: PathBuf::from(path),
        })
    }
}

/// Builds the request for a matched pattern.
pub fn build_request(
    graph: &FlowGraph,
    matched: &PatternMatch,
) -> Result<DispatchRequest, DispatchError> {
    let x = Extractor { graph, matched };
    let body = match matched.pattern.request {
        RequestKind::FileAgent { agent } => RequestBody::Multipart {
            fields: vec![
                ("model".into(), x.model(agent)?),
                ("query".into(), x.query()?),
            ],
            file: Some(x.file("file")?),
        },
        RequestKind::MarketingEmail => {
            let field = |name: &str| x.value_or(MARKETING_EMAIL_AGENT, name, "");
            RequestBody::Multipart {
                fields: vec![
                    ("session_id".into(), Uuid::new_v4().to_string()),
                    ("sender_email".into(), field("Sender Email")?),
                    ("sender_name".into(), field("Sender Name")?),
                    ("sender_passkey".into(), field("Sender Passkey")?),
                    (
                        "company_name".into(),
                        x.value_or(MARKETING_EMAIL_AGENT, "Company Name", DEFAULT_COMPANY_NAME)?,
                    ),
                    ("product_description".into(), field("Product Description")?),
                ],
                file: Some(x.file("file")?),
            }
        }
        RequestKind::Query { agent } => {
            // Only some agents carry an Instructions input.
            let instructions = match x.value(agent, "Instructions") {
                Ok(v) => v.unwrap_or_default(),
                Err(DispatchError::Extraction { .. }) => String::new(),
                Err(e) => return Err(e),
            };
            RequestBody::Json(json!({
                "model": x.model(agent)?,
                "query": x.query()?,
                "instructions": instructions,
            }))
        }
        RequestKind::Zoom => {
            let field = |name: &str| x.value_or(ZOOM_AGENT, name, "");
            RequestBody::Json(json!({
                "account_id": field("Account ID")?,
                "client_id": field("Client ID")?,
                "client_secret": field("Client Secret")?,
                "query": x.query()?,
            }))
        }
        RequestKind::Voice => RequestBody::Empty,
    };
    Ok(DispatchRequest {
        pattern_id: matched.pattern.id.to_string(),
        endpoint: matched.pattern.endpoint.to_string(),
        body,
    })
}

/// The generic route's payload: `{nodes: [{id, type, data}], edges: [...]}`
/// with values inlined and ids preserved.
pub fn generic_payload(graph: &FlowGraph) -> serde_json::Value {
    let doc = GraphDocument::from_graph(graph);
    let nodes: Vec<_> = doc
        .nodes
        .iter()
        .map(|node| {
            json!({
                "id": node.id,
                "type": node.kind,
                "data": node.data,
            })
        })
        .collect();
    json!({ "nodes": nodes, "edges": doc.edges })
}

pub fn generic_request(graph: &FlowGraph) -> DispatchRequest {
    DispatchRequest {
        pattern_id: GENERIC_PATTERN.to_string(),
        endpoint: FALLBACK_ENDPOINT.to_string(),
        body: RequestBody::Json(generic_payload(graph)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::patterns::match_pattern;
    use crate::graph::EdgeCandidate;
    use crate::node_types::{
        CALCULATOR, CSV_AGENT, END, RAG_AGENT, TEXT_AGENT, VOICE_AGENT, WEB_AGENT,
    };
    use egui::Pos2;

    fn add(graph: &mut FlowGraph, kind: &str) -> String {
        graph.add_node(kind, Pos2::ZERO).unwrap().id.clone()
    }

    fn connect(graph: &mut FlowGraph, from: &str, out: &str, to: &str, inp: &str) {
        let source = graph.node(from).unwrap();
        let target = graph.node(to).unwrap();
        let candidate = EdgeCandidate {
            source_node: from.to_string(),
            source_port: source.outputs.iter().find(|p| p.name == out).unwrap().id.clone(),
            target_node: to.to_string(),
            target_port: target.inputs.iter().find(|p| p.name == inp).unwrap().id.clone(),
        };
        graph.add_edge(candidate).unwrap();
    }

    fn set(graph: &mut FlowGraph, node: &str, name: &str, value: &str) {
        let port = graph.node(node).unwrap().input_named(name).unwrap().id.clone();
        graph.set_input_value(node, &port, Some(value.to_string()));
    }

    fn chain(kind: &str) -> (FlowGraph, String, String) {
        let mut graph = FlowGraph::new();
        let text = add(&mut graph, TEXT_INPUT_TOOL);
        let agent = add(&mut graph, kind);
        let end = add(&mut graph, END);
        connect(&mut graph, &text, "Text", &agent, "Query");
        connect(&mut graph, &agent, "Output", &end, "End");
        (graph, text, agent)
    }

    #[test]
    fn text_agent_payload_uses_defaults() {
        let (mut graph, text, agent) = chain(TEXT_AGENT);
        set(&mut graph, &text, "Text", "  summarize this  ");
        set(&mut graph, &agent, "LLM", "");

        let matched = match_pattern(&graph).unwrap();
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.endpoint, "/text_agent");
        assert_eq!(
            request.body,
            RequestBody::Json(json!({
                "model": "gemini",
                "query": "summarize this",
                "instructions": "",
            }))
        );
    }

    #[test]
    fn tool_component_without_instructions_input() {
        let (mut graph, text, agent) = chain(CALCULATOR);
        set(&mut graph, &text, "Text", "2+2");
        set(&mut graph, &agent, "LLM", "groq");
        let matched = match_pattern(&graph).unwrap();
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.endpoint, "/component/calculator");
        let RequestBody::Json(body) = request.body else {
            panic!("expected json body");
        };
        assert_eq!(body["model"], "groq");
        assert_eq!(body["instructions"], "");
    }

    fn csv_graph() -> (FlowGraph, String) {
        let mut graph = FlowGraph::new();
        let file = add(&mut graph, FILE_INPUT_TOOL);
        let text = add(&mut graph, TEXT_INPUT_TOOL);
        let agent = add(&mut graph, CSV_AGENT);
        let end = add(&mut graph, END);
        connect(&mut graph, &file, "File", &agent, "File");
        connect(&mut graph, &text, "Text", &agent, "Query");
        connect(&mut graph, &agent, "Output", &end, "End");
        (graph, file)
    }

    #[test]
    fn file_agent_without_file_is_an_extraction_error() {
        let (graph, _) = csv_graph();
        let matched = match_pattern(&graph).unwrap();
        match build_request(&graph, &matched) {
            Err(DispatchError::Extraction { pattern, .. }) => assert_eq!(pattern, "csv-agent"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn file_agent_is_multipart() {
        let (mut graph, file) = csv_graph();
        set(&mut graph, &file, "File", "/tmp/sales.csv");
        let matched = match_pattern(&graph).unwrap();
        let request = build_request(&graph, &matched).unwrap();
        let RequestBody::Multipart { fields, file } = request.body else {
            panic!("expected multipart body");
        };
        assert_eq!(fields[0], ("model".to_string(), "gemini".to_string()));
        assert_eq!(file.unwrap().path, PathBuf::from("/tmp/sales.csv"));
    }

    fn marketing_graph() -> (FlowGraph, String, String) {
        let mut graph = FlowGraph::new();
        let file = add(&mut graph, FILE_INPUT_TOOL);
        let agent = add(&mut graph, MARKETING_EMAIL_AGENT);
        let end = add(&mut graph, END);
        connect(&mut graph, &file, "File", &agent, "Customers");
        connect(&mut graph, &agent, "Output", &end, "End");
        (graph, file, agent)
    }

    #[test]
    fn marketing_email_fields_and_defaults() {
        let (mut graph, file, agent) = marketing_graph();
        set(&mut graph, &file, "File", "/tmp/customers.csv");
        set(&mut graph, &agent, "Sender Email", "me@example.com");
        set(&mut graph, &agent, "Sender Name", "Ada");
        set(&mut graph, &agent, "Sender Passkey", "secret");
        set(&mut graph, &agent, "Company Name", "  ");
        set(&mut graph, &agent, "Product Description", "Shirts");

        let matched = match_pattern(&graph).unwrap();
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.pattern_id, "marketing-email");
        assert_eq!(request.endpoint, "/workflow_agent");
        let RequestBody::Multipart { fields, file } = request.body else {
            panic!("expected multipart body");
        };

        let names: Vec<_> = fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            [
                "session_id",
                "sender_email",
                "sender_name",
                "sender_passkey",
                "company_name",
                "product_description",
            ]
        );
        assert!(Uuid::parse_str(&fields[0].1).is_ok());
        assert_eq!(fields[1].1, "me@example.com");
        assert_eq!(fields[3].1, "secret");
        assert_eq!(fields[4].1, DEFAULT_COMPANY_NAME);
        assert_eq!(fields[5].1, "Shirts");
        let file = file.unwrap();
        assert_eq!(file.field, "file");
        assert_eq!(file.path, PathBuf::from("/tmp/customers.csv"));
    }

    #[test]
    fn marketing_email_without_file_is_an_extraction_error() {
        let (graph, _, _) = marketing_graph();
        let matched = match_pattern(&graph).unwrap();
        match build_request(&graph, &matched) {
            Err(DispatchError::Extraction { pattern, .. }) => {
                assert_eq!(pattern, "marketing-email")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn marketing_sessions_are_fresh_per_request() {
        let (mut graph, file, _) = marketing_graph();
        set(&mut graph, &file, "File", "/tmp/customers.csv");
        let matched = match_pattern(&graph).unwrap();
        let session = |request: DispatchRequest| match request.body {
            RequestBody::Multipart { fields, .. } => fields[0].1.clone(),
            other => panic!("unexpected body {:?}", other),
        };
        let a = session(build_request(&graph, &matched).unwrap());
        let b = session(build_request(&graph, &matched).unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn zoom_agent_payload() {
        let (mut graph, text, agent) = chain(ZOOM_AGENT);
        set(&mut graph, &text, "Text", "list my meetings");
        set(&mut graph, &agent, "Account ID", "acct");
        set(&mut graph, &agent, "Client ID", "client");

        let matched = match_pattern(&graph).unwrap();
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.pattern_id, "zoom-agent");
        assert_eq!(request.endpoint, "/zoom_agent");
        assert_eq!(
            request.body,
            RequestBody::Json(json!({
                "account_id": "acct",
                "client_id": "client",
                "client_secret": "",
                "query": "list my meetings",
            }))
        );
    }

    #[test]
    fn rag_agent_matches_its_own_route() {
        let mut graph = FlowGraph::new();
        let file = add(&mut graph, FILE_INPUT_TOOL);
        let text = add(&mut graph, TEXT_INPUT_TOOL);
        let agent = add(&mut graph, RAG_AGENT);
        let end = add(&mut graph, END);
        connect(&mut graph, &file, "File", &agent, "File");
        connect(&mut graph, &text, "Text", &agent, "Query");
        connect(&mut graph, &agent, "Output", &end, "End");
        set(&mut graph, &file, "File", "/tmp/handbook.pdf");

        let matched = match_pattern(&graph).unwrap();
        assert_eq!(matched.pattern.id, "rag-agent");
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.endpoint, "/rag_agent");
        assert!(matches!(request.body, RequestBody::Multipart { .. }));
    }

    #[test]
    fn web_agent_matches_its_own_route() {
        let (mut graph, text, _) = chain(WEB_AGENT);
        set(&mut graph, &text, "Text", "rust news");
        let matched = match_pattern(&graph).unwrap();
        assert_eq!(matched.pattern.id, "web-agent");
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.endpoint, "/web_agent");
        let RequestBody::Json(body) = request.body else {
            panic!("expected json body");
        };
        assert_eq!(body["query"], "rust news");
        assert_eq!(body["instructions"], "");
    }

    #[test]
    fn voice_agent_has_no_body() {
        let mut graph = FlowGraph::new();
        let voice = add(&mut graph, VOICE_AGENT);
        let end = add(&mut graph, END);
        connect(&mut graph, &voice, "Output", &end, "End");
        let matched = match_pattern(&graph).unwrap();
        let request = build_request(&graph, &matched).unwrap();
        assert_eq!(request.body, RequestBody::Empty);
        assert_eq!(request.endpoint, "/voice_agent");
    }

    #[test]
    fn generic_payload_inlines_values() {
        let (mut graph, text, _) = chain(TEXT_AGENT);
        set(&mut graph, &text, "Text", "hi");
        let request = generic_request(&graph);
        assert!(request.is_generic());
        let RequestBody::Json(body) = request.body else {
            panic!("expected json body");
        };
        assert_eq!(body["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(body["nodes"][0]["type"], "Text-Input-Tool");
        assert_eq!(body["nodes"][0]["data"]["inputs"][0]["value"], "hi");
        assert!(body["nodes"][0].get("position").is_none());
        assert_eq!(body["edges"].as_array().unwrap().len(), 2);
        assert!(body["edges"][0]["targetHandle"].is_string());
    }
}
