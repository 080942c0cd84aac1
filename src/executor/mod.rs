//! # Execution
//!
//! Single-flight execution of a dispatched graph. The call runs on a worker
//! thread and reports [`ExecutionEvent`]s over a channel that the UI drains
//! once per frame. While a call is in flight further starts are refused.
//!
//! There is no cancellation: [`ExecutionController::dismiss`] hides the
//! result view and marks the in-flight result stale, and the completed call
//! is then dropped when it arrives.

pub mod client;
pub mod events;

use crate::dispatch::{DispatchRequest, prepare_dispatch};
use crate::error::DispatchError;
use crate::graph::FlowGraph;
use client::{Execute, ExecutionResult};
use events::ExecutionEvent;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::thread;

/// What the result view shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success(ExecutionResult),
    Failure(String),
}

pub struct ExecutionController {
    executor: Arc<dyn Execute>,
    receiver: Option<Receiver<ExecutionEvent>>,
    /// Result of the in-flight call is to be dropped.
    stale: bool,
    outcome: Option<ExecutionOutcome>,
}

impl ExecutionController {
    pub fn new(executor: Arc<dyn Execute>) -> Self {
        Self {
            executor,
            receiver: None,
            stale: false,
            outcome: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn outcome(&self) -> Option<&ExecutionOutcome> {
        self.outcome.as_ref()
    }

    /// Prepares and starts execution of `graph`. Structural problems (no End
    /// node, empty graph, missing file) are returned before anything is sent.
    pub fn execute_graph(&mut self, graph: &FlowGraph) -> Result<(), DispatchError> {
        if self.is_busy() {
            return Err(DispatchError::Busy);
        }
        let request = prepare_dispatch(graph)?;
        self.start(request)
    }

    pub fn start(&mut self, request: DispatchRequest) -> Result<(), DispatchError> {
        if self.is_busy() {
            return Err(DispatchError::Busy);
        }
        let (tx, rx) = channel();
        let executor = self.executor.clone();

        log::info!(
            "Dispatching '{}' to {}",
            request.pattern_id,
            request.endpoint
        );
        let _ = tx.send(ExecutionEvent::Started {
            pattern_id: request.pattern_id.clone(),
            endpoint: request.endpoint.clone(),
        });
        thread::spawn(move || {
            let event = match executor.execute(&request) {
                Ok(result) => {
                    log::info!("'{}' finished: {}", result.pattern_id, result.message);
                    ExecutionEvent::Finished(result)
                }
                Err(e) => {
                    log::error!("'{}' failed: {}", request.pattern_id, e);
                    ExecutionEvent::Failed(e.to_string())
                }
            };
            let _ = tx.send(event);
        });

        self.receiver = Some(rx);
        self.stale = false;
        self.outcome = None;
        Ok(())
    }

    /// Drains pending events. Returns the ones the UI should see; a stale
    /// completion is swallowed.
    pub fn poll(&mut self) -> Vec<ExecutionEvent> {
        let mut seen = Vec::new();
        let Some(rx) = &self.receiver else {
            return seen;
        };
        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    finished = event.is_terminal();
                    seen.push(event);
                    if finished {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    seen.push(ExecutionEvent::Failed(
                        "Execution worker stopped unexpectedly".to_string(),
                    ));
                    finished = true;
                    break;
                }
            }
        }
        if !finished {
            return seen;
        }

        self.receiver = None;
        if std::mem::take(&mut self.stale) {
            log::debug!("Dropping result of dismissed execution");
            seen.retain(|e| !e.is_terminal());
            return seen;
        }
        self.outcome = seen.iter().rev().find_map(|e| match e {
            ExecutionEvent::Finished(result) => Some(ExecutionOutcome::Success(result.clone())),
            ExecutionEvent::Failed(msg) => Some(ExecutionOutcome::Failure(msg.clone())),
            ExecutionEvent::Started { .. } => None,
        });
        seen
    }

    /// Closes the result view. An in-flight call keeps running; its result
    /// is discarded.
    pub fn dismiss(&mut self) {
        if self.is_busy() {
            self.stale = true;
        }
        self.outcome = None;
    }

    /// Shows a failure that happened before anything was sent.
    pub fn report_failure(&mut self, error: &DispatchError) {
        log::error!("Cannot execute: {}", error);
        self.outcome = Some(ExecutionOutcome::Failure(error.to_string()));
    }
}
