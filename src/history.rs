use crate::graph::FlowGraph;

/// Snapshot-based undo history. The entry at `current_index` mirrors the
/// graph on screen.
#[derive(Clone, Debug)]
pub struct UndoStack {
    pub history: Vec<FlowGraph>,
    pub current_index: usize,
    pub max_records: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self {
            history: Vec::new(),
            current_index: 0,
            max_records: 200,
        }
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh history at `graph`.
    pub fn reset(&mut self, graph: &FlowGraph) {
        self.history.clear();
        self.history.push(graph.clone());
        self.current_index = 0;
    }

    pub fn push(&mut self, graph: &FlowGraph) {
        // Drop the redo branch
        if self.current_index + 1 < self.history.len() {
            self.history.truncate(self.current_index + 1);
        }
        if self.history.last() == Some(graph) {
            return;
        }

        self.history.push(graph.clone());
        self.current_index = self.history.len() - 1;

        if self.history.len() > self.max_records {
            self.history.remove(0);
            self.current_index = self.current_index.saturating_sub(1);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.history.len()
    }

    pub fn undo(&mut self) -> Option<FlowGraph> {
        if self.can_undo() {
            self.current_index -= 1;
            self.history.get(self.current_index).cloned()
        } else {
            None
        }
    }

    pub fn redo(&mut self) -> Option<FlowGraph> {
        if self.can_redo() {
            self.current_index += 1;
            self.history.get(self.current_index).cloned()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_types::{END, TEXT_AGENT};
    use egui::Pos2;

    #[test]
    fn undo_redo_walks_snapshots() {
        let mut graph = FlowGraph::new();
        let mut stack = UndoStack::new();
        stack.reset(&graph);
        graph.add_node(TEXT_AGENT, Pos2::ZERO);
        stack.push(&graph);
        graph.add_node(END, Pos2::new(300.0, 0.0));
        stack.push(&graph);

        assert_eq!(stack.undo().unwrap().nodes().len(), 1);
        assert_eq!(stack.undo().unwrap().nodes().len(), 0);
        assert!(stack.undo().is_none());
        assert_eq!(stack.redo().unwrap().nodes().len(), 1);
    }

    #[test]
    fn push_after_undo_drops_redo_branch() {
        let mut graph = FlowGraph::new();
        let mut stack = UndoStack::new();
        stack.reset(&graph);
        graph.add_node(TEXT_AGENT, Pos2::ZERO);
        stack.push(&graph);
        let previous = stack.undo().unwrap();

        let mut other = previous.clone();
        other.add_node(END, Pos2::ZERO);
        stack.push(&other);
        assert!(!stack.can_redo());
        assert_eq!(stack.history.len(), 2);
    }

    #[test]
    fn unchanged_graph_is_not_recorded() {
        let graph = FlowGraph::new();
        let mut stack = UndoStack::new();
        stack.reset(&graph);
        stack.push(&graph);
        assert_eq!(stack.history.len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let mut graph = FlowGraph::new();
        let mut stack = UndoStack {
            max_records: 3,
            ..UndoStack::default()
        };
        stack.reset(&graph);
        for i in 0..5 {
            graph.add_node(TEXT_AGENT, Pos2::new(i as f32, 0.0));
            stack.push(&graph);
        }
        assert_eq!(stack.history.len(), 3);
        assert_eq!(stack.current_index, 2);
    }
}
