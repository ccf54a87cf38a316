// SPDX-License-Identifier: MIT

//! Verdict revision - deterministic policy applied after evidence synthesis
//!
//! Policy table:
//! - evidence unknown: keep the verdict, drop confidence by a fixed
//!   penalty with a floor
//! - evidence contradicts the verdict: flip it, set confidence to a fixed
//!   high value
//! - evidence confirms the verdict: boost confidence by a fixed amount,
//!   capped
//!
//! Reasoning is always appended to, never replaced wholesale.

use crate::error::WorkflowError;
use crate::oracle::Verdict;
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;

pub struct ReviseVerdictNode {
    flip_confidence: u8,
    boost: u8,
    cap: u8,
    penalty: u8,
    floor: u8,
}

impl ReviseVerdictNode {
    pub fn new(flip_confidence: u8, boost: u8, cap: u8, penalty: u8, floor: u8) -> Self {
        Self {
            flip_confidence,
            boost,
            cap,
            penalty,
            floor,
        }
    }
}

#[async_trait]
impl Node for ReviseVerdictNode {
    fn name(&self) -> &str {
        "revise_verdict"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let verdict = state.verdict.unwrap_or(Verdict::Error);
        let confidence = state.confidence.unwrap_or(0);
        let reasoning = state.reasoning.clone().unwrap_or_default();
        let summary = state
            .evidence_summary
            .clone()
            .unwrap_or_else(|| "No evidence summary available.".to_string());

        let update = match state.evidence_supports_claim {
            None => StateUpdate {
                verdict: Some(verdict),
                confidence: Some(confidence.saturating_sub(self.penalty).max(self.floor)),
                reasoning: Some(format!(
                    "{}\n\nNote: Web search was attempted but didn't provide clear evidence.",
                    reasoning
                )),
                ..Default::default()
            },
            Some(false) if verdict == Verdict::Legitimate => StateUpdate {
                verdict: Some(Verdict::Bs),
                confidence: Some(self.flip_confidence),
                reasoning: Some(format!(
                    "Initially seemed legitimate, but evidence indicates otherwise.\n\n{}",
                    summary
                )),
                ..Default::default()
            },
            Some(true) if verdict == Verdict::Bs => StateUpdate {
                verdict: Some(Verdict::Legitimate),
                confidence: Some(self.flip_confidence),
                reasoning: Some(format!(
                    "Initially seemed like BS, but evidence supports the claim.\n\n{}",
                    summary
                )),
                ..Default::default()
            },
            Some(supports) => {
                let boost = if supports { self.boost } else { 0 };
                StateUpdate {
                    verdict: Some(verdict),
                    confidence: Some(confidence.saturating_add(boost).min(self.cap)),
                    reasoning: Some(format!(
                        "{}\n\nEvidence analysis:\n{}",
                        reasoning, summary
                    )),
                    ..Default::default()
                }
            }
        };

        if update.verdict != state.verdict {
            log::info!(
                "Evidence flipped verdict: {:?} -> {:?}",
                state.verdict,
                update.verdict
            );
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> ReviseVerdictNode {
        ReviseVerdictNode::new(80, 15, 95, 10, 40)
    }

    fn state(verdict: Verdict, confidence: u8, evidence: Option<bool>) -> WorkflowState {
        let mut s = WorkflowState::new("claim", 3);
        s.verdict = Some(verdict);
        s.confidence = Some(confidence);
        s.reasoning = Some("initial reasoning".to_string());
        s.evidence_summary = Some("evidence summary".to_string());
        s.evidence_supports_claim = evidence;
        s
    }

    #[tokio::test]
    async fn test_refuting_evidence_flips_legitimate_to_bs() {
        let update = node()
            .run(&state(Verdict::Legitimate, 65, Some(false)))
            .await
            .unwrap();
        assert_eq!(update.verdict, Some(Verdict::Bs));
        assert_eq!(update.confidence, Some(80));
    }

    #[tokio::test]
    async fn test_supporting_evidence_flips_bs_to_legitimate() {
        let update = node()
            .run(&state(Verdict::Bs, 70, Some(true)))
            .await
            .unwrap();
        assert_eq!(update.verdict, Some(Verdict::Legitimate));
        assert_eq!(update.confidence, Some(80));
    }

    #[tokio::test]
    async fn test_no_evidence_keeps_verdict_with_penalty() {
        let update = node()
            .run(&state(Verdict::Legitimate, 60, None))
            .await
            .unwrap();
        assert_eq!(update.verdict, Some(Verdict::Legitimate));
        assert_eq!(update.confidence, Some(50)); // 60 - 10
        assert!(update.reasoning.unwrap().contains("initial reasoning"));
    }

    #[tokio::test]
    async fn test_penalty_respects_floor() {
        let update = node()
            .run(&state(Verdict::Bs, 45, None))
            .await
            .unwrap();
        assert_eq!(update.confidence, Some(40)); // max(45-10, 40)
    }

    #[tokio::test]
    async fn test_confirming_evidence_boosts_with_cap() {
        let update = node()
            .run(&state(Verdict::Legitimate, 85, Some(true)))
            .await
            .unwrap();
        assert_eq!(update.verdict, Some(Verdict::Legitimate));
        assert_eq!(update.confidence, Some(95)); // min(85+15, 95)
        assert!(update.reasoning.unwrap().contains("Evidence analysis"));
    }

    #[tokio::test]
    async fn test_refuting_evidence_on_bs_keeps_verdict() {
        // Evidence against the claim agrees with a BS verdict: no flip, no boost
        let update = node()
            .run(&state(Verdict::Bs, 70, Some(false)))
            .await
            .unwrap();
        assert_eq!(update.verdict, Some(Verdict::Bs));
        assert_eq!(update.confidence, Some(70));
    }
}
