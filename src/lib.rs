//! Node-graph workflow editor engine.
//!
//! The canvas side ([`editor`]) turns pointer input into edits of a
//! [`graph::FlowGraph`]; the dispatch side ([`dispatch`], [`executor`])
//! matches the finished graph against known workflow shapes and sends it to
//! the execution backend.

pub mod config;
pub mod dispatch;
pub mod document;
pub mod editor;
pub mod error;
pub mod executor;
pub mod graph;
pub mod history;
pub mod node_types;

pub use editor::CanvasSession;
pub use error::{DispatchError, DocumentError};
pub use graph::FlowGraph;
