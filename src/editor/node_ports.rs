//! Node port definitions for all component kinds.
//!
//! This module contains the static catalog consulted when a node is placed:
//! [`ports_for_kind`] returns the port shape (names, types, inline field type)
//! for a component kind. The catalog is read-only; instances copy it and stamp
//! their own port ids (see [`crate::graph::FlowGraph::add_node`]).
//!
//! # Port Types
//! - **String**: text flowing between components (khaki)
//! - **Number**: numeric values (green)
//! - **File**: a local file path that is uploaded on execution (orange)
//! - **Tool**: a tool component wired into an agent (purple)
//! - **None**: terminator sink, no payload (white)

use crate::node_types::*;

/// One port in the catalog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortSpec {
    /// Catalog id, combined with a creation stamp to form the instance port id.
    pub id: &'static str,
    pub name: &'static str,
    pub data_type: DataType,
    pub field_type: FieldType,
    pub default_value: Option<&'static str>,
}

/// Port shape of a component kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindSpec {
    pub kind: &'static str,
    pub category: KindCategory,
    pub inputs: &'static [PortSpec],
    pub outputs: &'static [PortSpec],
}

const fn port(
    id: &'static str,
    name: &'static str,
    data_type: DataType,
    field_type: FieldType,
) -> PortSpec {
    PortSpec {
        id,
        name,
        data_type,
        field_type,
        default_value: None,
    }
}

const fn output(id: &'static str, name: &'static str, data_type: DataType) -> PortSpec {
    port(id, name, data_type, FieldType::None)
}

const QUERY: PortSpec = port("query", "Query", DataType::String, FieldType::None);
const LLM: PortSpec = PortSpec {
    id: "llm",
    name: "LLM",
    data_type: DataType::String,
    field_type: FieldType::Select,
    default_value: Some("gemini"),
};
const TOOLS: PortSpec = port("tools", "Tools", DataType::Tool, FieldType::None);
const AGENT_OUTPUT: PortSpec = output("output", "Output", DataType::String);

const TOOL_INPUTS: &[PortSpec] = &[QUERY, LLM];
const TOOL_OUTPUTS: &[PortSpec] = &[AGENT_OUTPUT, output("tool", "Tool", DataType::Tool)];

/// Every kind the palette offers, in palette order.
pub const ALL_KINDS: &[&str] = &[
    TEXT_INPUT_TOOL,
    FILE_INPUT_TOOL,
    TEXT_AGENT,
    WEB_AGENT,
    CSV_AGENT,
    RAG_AGENT,
    ZOOM_AGENT,
    MARKETING_EMAIL_AGENT,
    VOICE_AGENT,
    WIKIPEDIA,
    YOUTUBE,
    ARXIV_SEARCH,
    HACKERNEWS_SEARCH,
    WEB_SCRAPING,
    CALCULATOR,
    PYTHON_CODE,
    PANDAS_DATA,
    DUCKDB_SQL,
    FINANCIAL_ANALYSIS,
    END,
];

const TEXT_INPUT_PORTS: &[PortSpec] = &[port("text", "Text", DataType::String, FieldType::Textarea)];
const TEXT_OUTPUT_PORTS: &[PortSpec] = &[output("text-out", "Text", DataType::String)];
const FILE_INPUT_PORTS: &[PortSpec] = &[port("file", "File", DataType::File, FieldType::File)];
const FILE_OUTPUT_PORTS: &[PortSpec] = &[output("file-out", "File", DataType::File)];
const AGENT_OUTPUTS: &[PortSpec] = &[AGENT_OUTPUT];

const TEXT_AGENT_INPUTS: &[PortSpec] = &[
    QUERY,
    port(
        "instructions",
        "Instructions",
        DataType::String,
        FieldType::Textarea,
    ),
    LLM,
    TOOLS,
];
const WEB_AGENT_INPUTS: &[PortSpec] = &[QUERY, LLM, TOOLS];
const FILE_AGENT_INPUTS: &[PortSpec] = &[
    port("file", "File", DataType::File, FieldType::None),
    QUERY,
    LLM,
];
const ZOOM_AGENT_INPUTS: &[PortSpec] = &[
    QUERY,
    port("account-id", "Account ID", DataType::String, FieldType::Input),
    port("client-id", "Client ID", DataType::String, FieldType::Input),
    port(
        "client-secret",
        "Client Secret",
        DataType::String,
        FieldType::Input,
    ),
];
const MARKETING_EMAIL_INPUTS: &[PortSpec] = &[
    port("customers", "Customers", DataType::File, FieldType::None),
    port("sender-email", "Sender Email", DataType::String, FieldType::Input),
    port("sender-name", "Sender Name", DataType::String, FieldType::Input),
    port(
        "sender-passkey",
        "Sender Passkey",
        DataType::String,
        FieldType::Input,
    ),
    PortSpec {
        id: "company-name",
        name: "Company Name",
        data_type: DataType::String,
        field_type: FieldType::Input,
        default_value: Some("Powerlook"),
    },
    port(
        "product-description",
        "Product Description",
        DataType::String,
        FieldType::Textarea,
    ),
];
const END_INPUTS: &[PortSpec] = &[port("end", "End", DataType::String, FieldType::None)];

/// Returns the port shape for a component kind, or `None` for kinds the
/// catalog does not know.
pub fn ports_for_kind(kind: &str) -> Option<KindSpec> {
    // Resolve to the catalog's own 'static name first.
    let kind = ALL_KINDS.iter().copied().find(|k| *k == kind)?;
    let (category, inputs, outputs) = match kind {
        TEXT_INPUT_TOOL => (KindCategory::Input, TEXT_INPUT_PORTS, TEXT_OUTPUT_PORTS),
        FILE_INPUT_TOOL => (KindCategory::Input, FILE_INPUT_PORTS, FILE_OUTPUT_PORTS),
        TEXT_AGENT => (KindCategory::Agent, TEXT_AGENT_INPUTS, AGENT_OUTPUTS),
        WEB_AGENT => (KindCategory::Agent, WEB_AGENT_INPUTS, AGENT_OUTPUTS),
        CSV_AGENT | RAG_AGENT => (KindCategory::Agent, FILE_AGENT_INPUTS, AGENT_OUTPUTS),
        ZOOM_AGENT => (KindCategory::Agent, ZOOM_AGENT_INPUTS, AGENT_OUTPUTS),
        MARKETING_EMAIL_AGENT => (KindCategory::Agent, MARKETING_EMAIL_INPUTS, AGENT_OUTPUTS),
        VOICE_AGENT => (KindCategory::Agent, &[][..], AGENT_OUTPUTS),
        END => (KindCategory::Output, END_INPUTS, &[][..]),
        // Remaining palette entries are single-purpose tool components.
        _ => (KindCategory::Tool, TOOL_INPUTS, TOOL_OUTPUTS),
    };
    Some(KindSpec {
        kind,
        category,
        inputs,
        outputs,
    })
}
