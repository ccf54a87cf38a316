// SPDX-License-Identifier: MIT

//! Human review node
//!
//! Feedback arrives one of three ways, checked in order:
//! 1. Already injected into state by `Engine::resume` (the canonical
//!    interrupt/checkpoint design - this node only executes after resume).
//! 2. A registered synchronous [`ReviewHandler`] (the degenerate
//!    flag-based design: zero persistence, handler always available).
//! 3. Neither: documented simulated feedback so demo runs terminate.

use crate::error::WorkflowError;
use crate::oracle::Verdict;
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use crate::workflow::types::{HumanFeedback, ReviewRequest};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Synchronous source of human feedback for the flag-based design
pub trait ReviewHandler: Send + Sync {
    /// Present the request and collect feedback; `None` means the human
    /// declined, in which case simulated feedback applies.
    fn review(&self, request: &ReviewRequest) -> Option<HumanFeedback>;
}

pub struct HumanReviewNode {
    handler: Option<Arc<dyn ReviewHandler>>,
}

impl HumanReviewNode {
    pub fn new() -> Self {
        Self { handler: None }
    }

    pub fn with_handler(handler: Arc<dyn ReviewHandler>) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    /// Assemble the request shown to the reviewer
    pub fn build_request(state: &WorkflowState) -> ReviewRequest {
        ReviewRequest {
            claim: state.claim.clone(),
            ai_verdict: state.verdict,
            ai_confidence: state.confidence,
            ai_reasoning: state.reasoning.clone(),
            uncertainty_reasons: state.review_reasons.clone(),
            expert_opinions: state.expert_opinions.clone(),
            search_results: state.search_results.clone(),
            request_time: Utc::now(),
        }
    }

    fn simulated_feedback() -> HumanFeedback {
        HumanFeedback {
            verdict: Verdict::Uncertain,
            confidence: 60,
            reasoning: "This claim requires expert verification beyond automated analysis"
                .to_string(),
            additional_context: None,
        }
    }
}

impl Default for HumanReviewNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for HumanReviewNode {
    fn name(&self) -> &str {
        "human_review"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let request = Self::build_request(state);
        log::info!("{}", request.format_for_human());

        let feedback = if let Some(feedback) = &state.human_feedback {
            feedback.clone()
        } else if let Some(handler) = &self.handler {
            handler
                .review(&request)
                .unwrap_or_else(Self::simulated_feedback)
        } else {
            log::warn!("No review handler available, using simulated feedback");
            Self::simulated_feedback()
        };

        let mut reasoning = format!("Human review: {}", feedback.reasoning);
        if let Some(context) = &feedback.additional_context {
            reasoning.push_str(&format!(" Context: {}", context));
        }

        Ok(StateUpdate {
            verdict: Some(feedback.verdict),
            confidence: Some(feedback.confidence.min(100)),
            reasoning: Some(reasoning),
            human_feedback: Some(feedback),
            human_feedback_received: Some(true),
            ..Default::default()
        })
    }
}
