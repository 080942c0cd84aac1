use super::client::ExecutionResult;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Started { pattern_id: String, endpoint: String },
    Finished(ExecutionResult),
    /// User-visible failure text.
    Failed(String),
}

impl ExecutionEvent {
    /// Whether this event ends the in-flight call.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionEvent::Finished(_) | ExecutionEvent::Failed(_))
    }
}
