// SPDX-License-Identifier: MIT

//! Shared workflow type definitions
//!
//! Records exchanged with callers and collaborators: expert opinions,
//! human-review plumbing, run options, and the final [`ResultRecord`].

use crate::oracle::{ClaimType, SearchRecord, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One expert's judgment, kept for the disagreement signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertOpinion {
    pub expert_name: String,
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasoning: String,
}

/// Human feedback on a claim under review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanFeedback {
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Review request presented to a human reviewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub claim: String,
    pub ai_verdict: Option<Verdict>,
    pub ai_confidence: Option<u8>,
    pub ai_reasoning: Option<String>,
    pub uncertainty_reasons: Vec<String>,
    pub expert_opinions: Vec<ExpertOpinion>,
    pub search_results: Vec<SearchRecord>,
    pub request_time: DateTime<Utc>,
}

impl ReviewRequest {
    /// Format the request for human display
    pub fn format_for_human(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "\n{}", rule);
        let _ = writeln!(out, "HUMAN REVIEW REQUESTED");
        let _ = writeln!(out, "{}\n", rule);
        let _ = writeln!(out, "Claim: {}\n", self.claim);

        if let Some(verdict) = self.ai_verdict {
            let _ = writeln!(out, "AI assessment:");
            let _ = writeln!(out, "- Verdict: {}", verdict);
            let _ = writeln!(out, "- Confidence: {}%", self.ai_confidence.unwrap_or(0));
            let _ = writeln!(
                out,
                "- Reasoning: {}\n",
                self.ai_reasoning.as_deref().unwrap_or("N/A")
            );
        }

        if !self.uncertainty_reasons.is_empty() {
            let _ = writeln!(out, "Uncertainty reasons:");
            for reason in &self.uncertainty_reasons {
                let _ = writeln!(out, "- {}", reason);
            }
        }

        for opinion in &self.expert_opinions {
            let _ = writeln!(
                out,
                "\n{}: {} ({}%)\n  {}",
                opinion.expert_name, opinion.verdict, opinion.confidence, opinion.reasoning
            );
        }

        if !self.search_results.is_empty() {
            let _ = writeln!(out, "\nSearch results: {} found", self.search_results.len());
        }

        let _ = writeln!(out, "{}", rule);
        out
    }
}

/// Options accepted by [`Detector::run`](crate::workflow::Detector::run)
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Override the configured retry budget
    pub max_retries: Option<u32>,
    /// Suppress human review even when uncertainty triggers fire
    pub skip_human_review: bool,
    /// Request human review regardless of confidence
    pub force_human_review: bool,
    /// Caller-supplied session id; generated when absent
    pub session_id: Option<String>,
}

/// Final outcome of a workflow run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The graph reached its terminal node
    Complete(ResultRecord),
    /// The graph interrupted for human review; resume with the session id
    Pending { session_id: String },
}

impl RunOutcome {
    /// Unwrap a completed result, mapping a pending interrupt to None
    pub fn into_result(self) -> Option<ResultRecord> {
        match self {
            RunOutcome::Complete(record) => Some(record),
            RunOutcome::Pending { .. } => None,
        }
    }
}

/// Externally visible result of checking one claim.
///
/// Fields beyond verdict/confidence/reasoning depend on which graph
/// variant produced the result; absence means "not applicable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<ClaimType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzing_agent: Option<String>,
    pub used_search: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    pub human_reviewed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_review_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    /// Minimal ERROR record used wherever processing cannot continue
    pub fn error(reasoning: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Error,
            confidence: 0,
            reasoning: reasoning.into(),
            claim_type: None,
            analyzing_agent: None,
            used_search: false,
            sources: Vec::new(),
            human_reviewed: false,
            human_review_reason: None,
            uncertainty_score: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_shape() {
        let record = ResultRecord::error("failed", "boom");
        assert_eq!(record.verdict, Verdict::Error);
        assert_eq!(record.confidence, 0);
        assert_eq!(record.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_result_record_optional_fields_omitted() {
        let record = ResultRecord::error("failed", "boom");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("claim_type").is_none());
        assert!(json.get("sources").is_none());
        assert!(json.get("uncertainty_score").is_none());
    }

    #[test]
    fn test_review_request_formatting() {
        let request = ReviewRequest {
            claim: "The sky is green".to_string(),
            ai_verdict: Some(Verdict::Bs),
            ai_confidence: Some(40),
            ai_reasoning: Some("Observation disagrees".to_string()),
            uncertainty_reasons: vec!["Very low confidence: 40%".to_string()],
            expert_opinions: vec![],
            search_results: vec![],
            request_time: Utc::now(),
        };
        let text = request.format_for_human();
        assert!(text.contains("The sky is green"));
        assert!(text.contains("Verdict: BS"));
        assert!(text.contains("Very low confidence"));
    }

    #[test]
    fn test_run_outcome_into_result() {
        let pending = RunOutcome::Pending {
            session_id: "s1".to_string(),
        };
        assert!(pending.into_result().is_none());
    }
}
