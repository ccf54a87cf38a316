// SPDX-License-Identifier: MIT

//! Uncertainty detector - decides when a human should look at the claim

use crate::error::WorkflowError;
use crate::oracle::{ClaimType, Verdict};
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::collections::HashSet;

/// Weighted-sum uncertainty score over independent signals, clamped to [0,1]
pub fn calculate_uncertainty(state: &WorkflowState, low: u8, moderate: u8) -> f32 {
    let mut uncertainty = 0.0f32;

    if let Some(confidence) = state.confidence {
        if confidence < low {
            uncertainty += 0.4;
        } else if confidence < moderate {
            uncertainty += 0.2;
        }
    }

    if state.expert_opinions.len() > 1 {
        let verdicts: HashSet<Verdict> =
            state.expert_opinions.iter().map(|o| o.verdict).collect();
        if verdicts.len() > 1 {
            uncertainty += 0.3;
        }
    }

    if state.search_results.len() > 1 {
        let text = state
            .search_results
            .iter()
            .flat_map(|r| r.facts.iter())
            .map(|f| f.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        if text.contains("confirm") && text.contains("deny") {
            uncertainty += 0.2;
        }
    }

    if state.claim_type == Some(ClaimType::CurrentEvent) && !state.used_search {
        uncertainty += 0.1;
    }

    uncertainty.min(1.0)
}

/// Computes the uncertainty score and sets the review flag when the score
/// crosses the threshold or a hard trigger fires.
pub struct UncertaintyDetectorNode {
    low_confidence: u8,
    moderate_confidence: u8,
    review_threshold: f32,
}

impl UncertaintyDetectorNode {
    pub fn new(low_confidence: u8, moderate_confidence: u8, review_threshold: f32) -> Self {
        Self {
            low_confidence,
            moderate_confidence,
            review_threshold,
        }
    }
}

#[async_trait]
impl Node for UncertaintyDetectorNode {
    fn name(&self) -> &str {
        "uncertainty_detector"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let score = calculate_uncertainty(state, self.low_confidence, self.moderate_confidence);

        if state.skip_human_review {
            return Ok(StateUpdate {
                uncertainty_score: Some(score),
                needs_human_review: Some(false),
                ..Default::default()
            });
        }

        let mut reasons = Vec::new();

        if state.force_human_review {
            reasons.push("Human review explicitly requested".to_string());
        } else {
            if let Some(confidence) = state.confidence {
                if confidence < self.low_confidence {
                    reasons.push(format!("Very low confidence: {}%", confidence));
                }
            }

            if state.verdict == Some(Verdict::Uncertain) {
                reasons.push("AI returned uncertain verdict".to_string());
            }

            if state.expert_opinions.len() > 1 {
                let verdicts: HashSet<Verdict> =
                    state.expert_opinions.iter().map(|o| o.verdict).collect();
                if verdicts.len() > 1 {
                    reasons.push("Experts disagree on verdict".to_string());
                }
            }

            if score > self.review_threshold {
                reasons.push(format!("High uncertainty score: {:.2}", score));
            }

            if state.claim_type == Some(ClaimType::CurrentEvent)
                && state.used_search
                && state
                    .search_results
                    .iter()
                    .all(|r| !r.success || r.facts.is_empty())
            {
                reasons.push("No evidence found for recent event".to_string());
            }
        }

        let needs_review = !reasons.is_empty() || score > self.review_threshold;
        if needs_review {
            log::info!("Human review requested: {:?}", reasons);
        }

        Ok(StateUpdate {
            uncertainty_score: Some(score),
            needs_human_review: Some(needs_review),
            human_review_reason: (!reasons.is_empty()).then(|| reasons.join("; ")),
            review_reasons: Some(reasons),
            ..Default::default()
        })
    }
}
