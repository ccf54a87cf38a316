// SPDX-License-Identifier: MIT

//! Routing predicates - pure functions from state to the next-node label
//!
//! Each predicate returns a closed label enum; the graph maps labels to
//! node targets at construction time. Identical state always yields the
//! identical label - there is no hidden randomness here, which is what
//! makes routing unit-testable in isolation.

use super::state::WorkflowState;
use crate::oracle::{ClaimType, Verdict};

/// Outcome of the baseline detection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionRoute {
    /// Valid verdict obtained
    Success,
    /// Failed, retry budget remains
    Retry,
    /// Failed, retries exhausted
    Error,
}

/// Decide what to do after a detection attempt
pub fn route_after_detection(state: &WorkflowState) -> DetectionRoute {
    match state.verdict {
        Some(verdict) if verdict != Verdict::Error => DetectionRoute::Success,
        _ if state.retry_count < state.max_retries => DetectionRoute::Retry,
        _ => DetectionRoute::Error,
    }
}

/// Branch taken after the initial confidence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRoute {
    GenerateQueries,
    FormatOutput,
}

/// Search when confidence fell below the threshold or detection errored
pub fn route_after_initial_check(state: &WorkflowState) -> SearchRoute {
    if state.needs_search || state.error.is_some() {
        SearchRoute::GenerateQueries
    } else {
        SearchRoute::FormatOutput
    }
}

/// Route to the expert matching the routed claim type; unset means general
pub fn route_to_expert(state: &WorkflowState) -> ClaimType {
    state.claim_type.unwrap_or(ClaimType::General)
}

/// Branch taken after the uncertainty check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewRoute {
    HumanReview,
    FormatOutput,
}

/// Review when requested and human feedback has not already arrived
pub fn route_after_review_check(state: &WorkflowState) -> ReviewRoute {
    if state.needs_human_review && !state.human_feedback_received {
        ReviewRoute::HumanReview
    } else {
        ReviewRoute::FormatOutput
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WorkflowState {
        WorkflowState::new("test claim", 3)
    }

    #[test]
    fn test_route_after_detection_success() {
        let mut s = state();
        s.verdict = Some(Verdict::Legitimate);
        assert_eq!(route_after_detection(&s), DetectionRoute::Success);
    }

    #[test]
    fn test_route_after_detection_error_verdict_retries() {
        let mut s = state();
        s.verdict = Some(Verdict::Error);
        s.retry_count = 1;
        assert_eq!(route_after_detection(&s), DetectionRoute::Retry);
    }

    #[test]
    fn test_route_after_detection_exhausted() {
        let mut s = state();
        s.retry_count = 3;
        assert_eq!(route_after_detection(&s), DetectionRoute::Error);
    }

    #[test]
    fn test_route_after_detection_deterministic() {
        let mut s = state();
        s.verdict = Some(Verdict::Bs);
        s.confidence = Some(72);
        for _ in 0..10 {
            assert_eq!(route_after_detection(&s), DetectionRoute::Success);
        }
    }

    #[test]
    fn test_route_after_initial_check() {
        let mut s = state();
        assert_eq!(route_after_initial_check(&s), SearchRoute::FormatOutput);

        s.needs_search = true;
        assert_eq!(route_after_initial_check(&s), SearchRoute::GenerateQueries);

        s.needs_search = false;
        s.error = Some("oracle down".to_string());
        assert_eq!(route_after_initial_check(&s), SearchRoute::GenerateQueries);
    }

    #[test]
    fn test_route_to_expert_defaults_to_general() {
        let mut s = state();
        assert_eq!(route_to_expert(&s), ClaimType::General);

        s.claim_type = Some(ClaimType::Historical);
        assert_eq!(route_to_expert(&s), ClaimType::Historical);
    }

    #[test]
    fn test_route_after_review_check() {
        let mut s = state();
        assert_eq!(route_after_review_check(&s), ReviewRoute::FormatOutput);

        s.needs_human_review = true;
        assert_eq!(route_after_review_check(&s), ReviewRoute::HumanReview);

        // Feedback already injected: do not loop back into review
        s.human_feedback_received = true;
        assert_eq!(route_after_review_check(&s), ReviewRoute::FormatOutput);
    }
}
