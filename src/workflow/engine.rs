// SPDX-License-Identifier: MIT

//! Execution engine - walks a graph from entry to termination
//!
//! The step loop: check for an interrupt point, invoke the node, merge its
//! sparse update, resolve the outgoing edge against the updated state,
//! stop at the terminal marker. A node error is caught here and converted
//! into a terminal ERROR result so every run returns a well-formed record.

use super::checkpoint::{Checkpoint, CheckpointStore};
use super::graph::{Edge, Graph, NodeId, Target};
use super::state::{StateUpdate, WorkflowState};
use super::types::{HumanFeedback, ResultRecord, RunOutcome};
use crate::error::WorkflowError;
use crate::oracle::Verdict;
use std::sync::Arc;

/// Safety limit on the step loop; the only legitimate cycle is the bounded
/// retry loop, so any graph exceeding this is stuck.
const MAX_STEPS: u32 = 100;

/// Graph walker with interrupt/resume support
pub struct Engine {
    graph: Graph,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl Engine {
    pub fn new(graph: Graph, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self { graph, checkpoints }
    }

    /// Run the graph to termination or to the first interrupt point.
    ///
    /// Never fails: engine-level problems come back as an ERROR result.
    pub async fn run(&self, state: WorkflowState, session_id: &str) -> RunOutcome {
        let entry = self.graph.entry();
        self.step_loop(state, entry, session_id).await
    }

    /// Continue an interrupted session with human-provided fields
    pub async fn resume(
        &self,
        session_id: &str,
        feedback: HumanFeedback,
    ) -> Result<ResultRecord, WorkflowError> {
        let checkpoint = self
            .checkpoints
            .load(session_id)
            .await?
            .ok_or_else(|| WorkflowError::SessionNotFound(session_id.to_string()))?;

        log::info!(
            "Resuming session '{}' from node '{}'",
            session_id,
            checkpoint.next
        );

        let mut state = checkpoint.state;
        state.apply(StateUpdate {
            human_feedback: Some(feedback),
            human_feedback_received: Some(true),
            ..Default::default()
        });

        match self.step_loop(state, checkpoint.next, session_id).await {
            RunOutcome::Complete(record) => Ok(record),
            // Feedback is marked received, so the interrupt cannot re-fire;
            // hitting this means the graph was rebuilt with new interrupt
            // points between run and resume.
            RunOutcome::Pending { session_id } => Err(WorkflowError::Checkpoint(format!(
                "session '{}' interrupted again during resume",
                session_id
            ))),
        }
    }

    async fn step_loop(
        &self,
        mut state: WorkflowState,
        entry: NodeId,
        session_id: &str,
    ) -> RunOutcome {
        let mut current = entry;
        let mut steps = 0u32;

        loop {
            steps += 1;
            if steps > MAX_STEPS {
                log::error!("Graph execution exceeded {} steps", MAX_STEPS);
                return RunOutcome::Complete(Self::error_record(
                    &state,
                    WorkflowError::StepLimit(MAX_STEPS).to_string(),
                ));
            }

            // Interrupt check happens before the node executes; a satisfied
            // interrupt (feedback already injected) falls through.
            if self.graph.is_interrupt_point(current) && !state.human_feedback_received {
                let checkpoint = Checkpoint {
                    session_id: session_id.to_string(),
                    next: current,
                    state,
                };
                if let Err(e) = self.checkpoints.save(&checkpoint).await {
                    log::error!("Failed to persist checkpoint: {}", e);
                    return RunOutcome::Complete(Self::error_record(
                        &checkpoint.state,
                        e.to_string(),
                    ));
                }
                log::info!(
                    "Interrupted before '{}'; session '{}' awaiting human input",
                    current,
                    session_id
                );
                return RunOutcome::Pending {
                    session_id: session_id.to_string(),
                };
            }

            let Some(node) = self.graph.node(current) else {
                // Unreachable with a built Graph; kept as a terminal error
                return RunOutcome::Complete(Self::error_record(
                    &state,
                    WorkflowError::UnknownTarget(current.to_string()).to_string(),
                ));
            };

            log::info!("Executing node: {}", current);
            match node.run(&state).await {
                Ok(update) => state.apply(update),
                Err(e) => {
                    log::error!("Node {} failed: {}", current, e);
                    return RunOutcome::Complete(Self::error_record(&state, e.to_string()));
                }
            }

            let target = match self.graph.edge(current) {
                Some(Edge::Fixed(target)) => *target,
                Some(Edge::Conditional { route, targets }) => {
                    let target = route(&state);
                    if !targets.contains(&target) {
                        let err = WorkflowError::UndeclaredRoute {
                            node: current.to_string(),
                            target: target.to_string(),
                        };
                        log::error!("{}", err);
                        return RunOutcome::Complete(Self::error_record(&state, err.to_string()));
                    }
                    target
                }
                None => {
                    return RunOutcome::Complete(Self::error_record(
                        &state,
                        WorkflowError::MissingEdge(current.to_string()).to_string(),
                    ));
                }
            };

            match target {
                Target::End => break,
                Target::Node(next) => current = next,
            }
        }

        let record = state.result.take().unwrap_or_else(|| {
            // The formatter did not run; synthesize a defensible record
            ResultRecord::error(
                "Graph execution finished without a formatted result",
                state
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            )
        });
        RunOutcome::Complete(record)
    }

    /// Convert an engine-boundary failure into a structured ERROR record
    fn error_record(state: &WorkflowState, message: String) -> ResultRecord {
        ResultRecord {
            verdict: Verdict::Error,
            confidence: 0,
            reasoning: state
                .reasoning
                .clone()
                .unwrap_or_else(|| format!("Processing failed: {}", message)),
            claim_type: state.claim_type,
            analyzing_agent: state.analyzing_agent.clone(),
            used_search: state.used_search,
            sources: state.sources_used.clone(),
            human_reviewed: false,
            human_review_reason: None,
            uncertainty_score: None,
            error: Some(message),
        }
    }
}
