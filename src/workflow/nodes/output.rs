// SPDX-License-Identifier: MIT

//! Output formatter - terminal node assembling the result record

use crate::error::WorkflowError;
use crate::oracle::Verdict;
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use crate::workflow::types::ResultRecord;
use async_trait::async_trait;

/// Builds the externally visible [`ResultRecord`] from whatever fields are
/// populated. `verdict` always defaults to ERROR and `confidence` to 0 so
/// callers never see an empty result. Pure: formatting the same state twice
/// yields identical records.
pub struct FormatOutputNode {
    with_review_fields: bool,
}

impl FormatOutputNode {
    /// Formatter for graph variants without the review stage
    pub fn basic() -> Self {
        Self {
            with_review_fields: false,
        }
    }

    /// Formatter for the full review-capable graph
    pub fn reviewed() -> Self {
        Self {
            with_review_fields: true,
        }
    }

    /// Pure formatting function; the node is a thin wrapper around this
    pub fn format(state: &WorkflowState, with_review_fields: bool) -> ResultRecord {
        let mut reasoning = state
            .reasoning
            .clone()
            .unwrap_or_else(|| "No analysis available".to_string());

        if !state.sources_used.is_empty() {
            reasoning.push_str(&format!(
                "\n\nSources consulted: {} web searches",
                state.sources_used.len()
            ));
        }

        ResultRecord {
            verdict: state.verdict.unwrap_or(Verdict::Error),
            confidence: state.confidence.unwrap_or(0).min(100),
            reasoning,
            claim_type: state.claim_type,
            analyzing_agent: state.analyzing_agent.clone(),
            used_search: state.used_search,
            sources: state.sources_used.clone(),
            human_reviewed: with_review_fields && state.needs_human_review,
            human_review_reason: if with_review_fields {
                state.human_review_reason.clone()
            } else {
                None
            },
            uncertainty_score: with_review_fields.then_some(state.uncertainty_score),
            error: state.error.clone(),
        }
    }
}

#[async_trait]
impl Node for FormatOutputNode {
    fn name(&self) -> &str {
        "format_output"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        Ok(StateUpdate {
            result: Some(Self::format(state, self.with_review_fields)),
            ..Default::default()
        })
    }
}
