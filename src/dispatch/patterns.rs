//! Workflow pattern catalog and matcher.
//!
//! A pattern names an exact set of component kinds plus the connections that
//! must exist between them. [`match_pattern`] walks the catalog in order and
//! returns the first pattern the graph satisfies, so larger and more specific
//! shapes are listed before smaller ones sharing their kinds.

use crate::graph::{Edge, FlowGraph};
use crate::node_types::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// One required `kind_a.output → kind_b.input` link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionRule {
    pub from_kind: &'static str,
    pub output: &'static str,
    pub to_kind: &'static str,
    pub input: &'static str,
}

const fn rule(
    from_kind: &'static str,
    output: &'static str,
    to_kind: &'static str,
    input: &'static str,
) -> ConnectionRule {
    ConnectionRule {
        from_kind,
        output,
        to_kind,
        input,
    }
}

/// Which request builder a matched pattern uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Multipart `model, query, file` for a file-reading agent.
    FileAgent { agent: &'static str },
    /// Multipart sender details plus the customer file.
    MarketingEmail,
    /// JSON `{model, query, instructions}` driven by an agent or tool node.
    Query { agent: &'static str },
    /// JSON Zoom credentials plus the query.
    Zoom,
    /// POST without a body.
    Voice,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    pub id: &'static str,
    pub kinds: Vec<&'static str>,
    pub connections: Vec<ConnectionRule>,
    pub endpoint: &'static str,
    pub request: RequestKind,
}

impl Pattern {
    fn kind_set(&self) -> BTreeSet<&'static str> {
        self.kinds.iter().copied().collect()
    }
}

/// Tool components and their component routes.
const TOOL_ROUTES: &[(&str, &str, &str)] = &[
    (WIKIPEDIA, "component-wikipedia", "/component/wikipedia"),
    (YOUTUBE, "component-youtube", "/component/youtube"),
    (ARXIV_SEARCH, "component-arxiv", "/component/arxiv"),
    (HACKERNEWS_SEARCH, "component-hackernews", "/component/hackernews"),
    (WEB_SCRAPING, "component-webscraping", "/component/webscraping"),
    (CALCULATOR, "component-calculator", "/component/calculator"),
    (PYTHON_CODE, "component-python", "/component/python"),
    (PANDAS_DATA, "component-pandas", "/component/pandas"),
    (DUCKDB_SQL, "component-duckdb", "/component/duckdb"),
    (FINANCIAL_ANALYSIS, "component-financial", "/component/financial"),
];

fn file_agent(id: &'static str, agent: &'static str, endpoint: &'static str) -> Pattern {
    Pattern {
        id,
        kinds: vec![FILE_INPUT_TOOL, TEXT_INPUT_TOOL, agent, END],
        connections: vec![
            rule(FILE_INPUT_TOOL, "File", agent, "File"),
            rule(TEXT_INPUT_TOOL, "Text", agent, "Query"),
            rule(agent, "Output", END, "End"),
        ],
        endpoint,
        request: RequestKind::FileAgent { agent },
    }
}

/// `Text-Input-Tool → agent → End`, the shape shared by the query agents and
/// every tool component.
fn query_chain(
    id: &'static str,
    agent: &'static str,
    endpoint: &'static str,
    request: RequestKind,
) -> Pattern {
    Pattern {
        id,
        kinds: vec![TEXT_INPUT_TOOL, agent, END],
        connections: vec![
            rule(TEXT_INPUT_TOOL, "Text", agent, "Query"),
            rule(agent, "Output", END, "End"),
        ],
        endpoint,
        request,
    }
}

fn build_catalog() -> Vec<Pattern> {
    let mut catalog = vec![
        file_agent("csv-agent", CSV_AGENT, "/csv_agent"),
        file_agent("rag-agent", RAG_AGENT, "/rag_agent"),
        Pattern {
            id: "marketing-email",
            kinds: vec![FILE_INPUT_TOOL, MARKETING_EMAIL_AGENT, END],
            connections: vec![
                rule(FILE_INPUT_TOOL, "File", MARKETING_EMAIL_AGENT, "Customers"),
                rule(MARKETING_EMAIL_AGENT, "Output", END, "End"),
            ],
            endpoint: "/workflow_agent",
            request: RequestKind::MarketingEmail,
        },
        query_chain(
            "text-agent",
            TEXT_AGENT,
            "/text_agent",
            RequestKind::Query { agent: TEXT_AGENT },
        ),
        query_chain(
            "web-agent",
            WEB_AGENT,
            "/web_agent",
            RequestKind::Query { agent: WEB_AGENT },
        ),
        query_chain("zoom-agent", ZOOM_AGENT, "/zoom_agent", RequestKind::Zoom),
        Pattern {
            id: "voice-agent",
            kinds: vec![VOICE_AGENT, END],
            connections: vec![rule(VOICE_AGENT, "Output", END, "End")],
            endpoint: "/voice_agent",
            request: RequestKind::Voice,
        },
    ];
    catalog.extend(TOOL_ROUTES.iter().map(|&(kind, id, endpoint)| {
        query_chain(id, kind, endpoint, RequestKind::Query { agent: kind })
    }));
    catalog
}

/// The pattern catalog, built once.
pub fn catalog() -> &'static [Pattern] {
    static CATALOG: OnceLock<Vec<Pattern>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Fuzzy port-name predicate: case-insensitive containment in either
/// direction. Empty names never match.
///
/// There is no scoring; among several compatible edges the first one found
/// satisfies the rule.
pub fn port_names_compatible(actual: &str, expected: &str) -> bool {
    let actual = actual.trim().to_lowercase();
    let expected = expected.trim().to_lowercase();
    if actual.is_empty() || expected.is_empty() {
        return false;
    }
    actual.contains(&expected) || expected.contains(&actual)
}

/// A pattern the graph satisfies, with the node chosen for each kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternMatch {
    pub pattern: &'static Pattern,
    /// Kind → node id, taken from the first edge satisfying each rule.
    pub bindings: HashMap<&'static str, String>,
}

impl PatternMatch {
    pub fn node_for(&self, kind: &str) -> Option<&str> {
        self.bindings.get(kind).map(String::as_str)
    }
}

/// First edge satisfying `rule`, if any.
fn find_edge<'g>(graph: &'g FlowGraph, rule: &ConnectionRule) -> Option<&'g Edge> {
    graph.edges().iter().find(|edge| {
        let (Some(source), Some(target)) = (graph.node(&edge.source_node), graph.node(&edge.target_node))
        else {
            return false;
        };
        if source.kind != rule.from_kind || target.kind != rule.to_kind {
            return false;
        }
        let output = source.outputs.iter().find(|p| p.id == edge.source_port);
        let input = target.inputs.iter().find(|p| p.id == edge.target_port);
        matches!(
            (output, input),
            (Some(o), Some(i))
                if port_names_compatible(&o.name, rule.output)
                    && port_names_compatible(&i.name, rule.input)
        )
    })
}

/// Checks one pattern against the graph.
pub fn match_one(graph: &FlowGraph, pattern: &'static Pattern) -> Option<PatternMatch> {
    // Exact kind set: an extra kind anywhere disqualifies the pattern.
    let present = graph.kinds();
    if present.len() != pattern.kinds.len()
        || !pattern.kind_set().iter().all(|k| present.contains(k))
    {
        return None;
    }
    if pattern
        .kinds
        .iter()
        .any(|kind| !graph.nodes().iter().any(|n| n.kind == *kind))
    {
        return None;
    }

    let mut bindings = HashMap::new();
    for rule in &pattern.connections {
        let edge = find_edge(graph, rule)?;
        bindings
            .entry(rule.from_kind)
            .or_insert_with(|| edge.source_node.clone());
        bindings
            .entry(rule.to_kind)
            .or_insert_with(|| edge.target_node.clone());
    }
    Some(PatternMatch { pattern, bindings })
}

/// First catalog pattern the graph satisfies.
pub fn match_pattern(graph: &FlowGraph) -> Option<PatternMatch> {
    catalog().iter().find_map(|pattern| match_one(graph, pattern))
}
