use serde::{Deserialize, Serialize};

/// Value type carried by a port.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    File,
    Tool,
    #[default]
    None,
}

/// How an unconnected input is edited inline on the node body.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Input,
    Textarea,
    Select,
    File,
    #[default]
    None,
}

impl FieldType {
    pub fn is_editable(self) -> bool {
        self != FieldType::None
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

/// Palette grouping, used for header colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KindCategory {
    Input,
    Agent,
    Tool,
    Output,
}

impl KindCategory {
    pub fn label(self) -> &'static str {
        match self {
            KindCategory::Input => "Input",
            KindCategory::Agent => "Agent",
            KindCategory::Tool => "Tool",
            KindCategory::Output => "Output",
        }
    }
}

// Component kinds
pub const TEXT_INPUT_TOOL: &str = "Text-Input-Tool";
pub const FILE_INPUT_TOOL: &str = "File-Input-Tool";
pub const TEXT_AGENT: &str = "Text-Agent";
pub const WEB_AGENT: &str = "Web-Agent";
pub const CSV_AGENT: &str = "CSV-Agent";
pub const RAG_AGENT: &str = "RAG-Agent";
pub const ZOOM_AGENT: &str = "Zoom-Agent";
pub const MARKETING_EMAIL_AGENT: &str = "Marketing-Email-Agent";
pub const VOICE_AGENT: &str = "Voice-Agent";
pub const WIKIPEDIA: &str = "Wikipedia";
pub const YOUTUBE: &str = "YouTube";
pub const ARXIV_SEARCH: &str = "ArXiv-Search";
pub const HACKERNEWS_SEARCH: &str = "HackerNews-Search";
pub const WEB_SCRAPING: &str = "Web-Scraping";
pub const CALCULATOR: &str = "Calculator";
pub const PYTHON_CODE: &str = "Python-Code";
pub const PANDAS_DATA: &str = "Pandas-Data";
pub const DUCKDB_SQL: &str = "DuckDB-SQL";
pub const FINANCIAL_ANALYSIS: &str = "Financial-Analysis";
pub const END: &str = "End";
