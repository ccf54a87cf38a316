// SPDX-License-Identifier: MIT

//! Workflow state - the record threaded through a run
//!
//! One flat struct with every field of every graph variant always present
//! (nullable where optional). Nodes never mutate state directly; they
//! return a sparse [`StateUpdate`] that the engine merges with
//! last-write-wins semantics per field - no deep merge.

use super::types::{ExpertOpinion, HumanFeedback, ResultRecord};
use crate::oracle::{ClaimType, ConfidenceLevel, SearchRecord, Verdict};
use serde::{Deserialize, Serialize};

/// State accumulated while a claim moves through the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Input claim; immutable after creation
    pub claim: String,

    // Routing decision
    pub claim_type: Option<ClaimType>,
    pub confidence_level: Option<ConfidenceLevel>,

    // Processing control
    pub retry_count: u32,
    pub max_retries: u32,

    // Output from detection / experts
    pub verdict: Option<Verdict>,
    pub confidence: Option<u8>,
    pub reasoning: Option<String>,
    pub analyzing_agent: Option<String>,
    pub expert_opinions: Vec<ExpertOpinion>,

    // Evidence-gathering substate
    pub needs_search: bool,
    pub search_queries: Vec<String>,
    pub search_results: Vec<SearchRecord>,
    pub extracted_facts: Vec<String>,
    pub sources_used: Vec<String>,
    pub evidence_summary: Option<String>,
    pub evidence_supports_claim: Option<bool>,
    pub used_search: bool,

    // Human-in-the-loop substate
    pub uncertainty_score: f32,
    pub needs_human_review: bool,
    pub human_review_reason: Option<String>,
    pub review_reasons: Vec<String>,
    pub human_feedback: Option<HumanFeedback>,
    pub human_feedback_received: bool,
    pub skip_human_review: bool,
    pub force_human_review: bool,

    // Error tracking; presence does not necessarily terminate the run
    pub error: Option<String>,

    // Written by the terminal formatter
    pub result: Option<ResultRecord>,
}

impl WorkflowState {
    /// Create a fresh state for one claim
    pub fn new(claim: impl Into<String>, max_retries: u32) -> Self {
        Self {
            claim: claim.into(),
            claim_type: None,
            confidence_level: None,
            retry_count: 0,
            max_retries,
            verdict: None,
            confidence: None,
            reasoning: None,
            analyzing_agent: None,
            expert_opinions: Vec::new(),
            needs_search: false,
            search_queries: Vec::new(),
            search_results: Vec::new(),
            extracted_facts: Vec::new(),
            sources_used: Vec::new(),
            evidence_summary: None,
            evidence_supports_claim: None,
            used_search: false,
            uncertainty_score: 0.0,
            needs_human_review: false,
            human_review_reason: None,
            review_reasons: Vec::new(),
            human_feedback: None,
            human_feedback_received: false,
            skip_human_review: false,
            force_human_review: false,
            error: None,
            result: None,
        }
    }

    /// Merge a sparse update; each set field overwrites its counterpart
    pub fn apply(&mut self, update: StateUpdate) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = update.$field {
                    self.$field = value.into();
                })*
            };
        }
        merge!(
            claim_type,
            confidence_level,
            retry_count,
            verdict,
            confidence,
            reasoning,
            analyzing_agent,
            expert_opinions,
            needs_search,
            search_queries,
            search_results,
            extracted_facts,
            sources_used,
            evidence_summary,
            used_search,
            uncertainty_score,
            needs_human_review,
            human_review_reason,
            review_reasons,
            human_feedback,
            human_feedback_received,
            error,
            result,
        );
        // Tri-state field: Some(None) means "synthesis ran, outcome unknown"
        if let Some(value) = update.evidence_supports_claim {
            self.evidence_supports_claim = value;
        }
    }
}

/// Sparse set of field assignments returned by a node.
///
/// Unset fields leave the state untouched. `Option<T>` state fields are
/// written through `Into`, so updates carry the inner type.
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub claim_type: Option<ClaimType>,
    pub confidence_level: Option<ConfidenceLevel>,
    pub retry_count: Option<u32>,
    pub verdict: Option<Verdict>,
    pub confidence: Option<u8>,
    pub reasoning: Option<String>,
    pub analyzing_agent: Option<String>,
    pub expert_opinions: Option<Vec<ExpertOpinion>>,
    pub needs_search: Option<bool>,
    pub search_queries: Option<Vec<String>>,
    pub search_results: Option<Vec<SearchRecord>>,
    pub extracted_facts: Option<Vec<String>>,
    pub sources_used: Option<Vec<String>>,
    pub evidence_summary: Option<String>,
    pub evidence_supports_claim: Option<Option<bool>>,
    pub used_search: Option<bool>,
    pub uncertainty_score: Option<f32>,
    pub needs_human_review: Option<bool>,
    pub human_review_reason: Option<String>,
    pub review_reasons: Option<Vec<String>>,
    pub human_feedback: Option<HumanFeedback>,
    pub human_feedback_received: Option<bool>,
    pub error: Option<String>,
    pub result: Option<ResultRecord>,
}
