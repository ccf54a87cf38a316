// SPDX-License-Identifier: MIT

//! Router node - classifies the claim for expert dispatch

use crate::error::WorkflowError;
use crate::oracle::{ClaimType, ConfidenceLevel, Oracle};
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;

const ROUTER_PROMPT: &str = "You are a routing expert that analyzes claims and determines which specialist should handle them.

Analyze the given claim and determine:
1. claim_type: One of [technical, historical, current_event, general]
2. confidence_level: One of [high, medium, low] based on how certain you are

Categories:
- technical: Claims about technology, specifications, capabilities
- historical: Claims about past events, dates, historical facts
- current_event: Claims about recent or ongoing events (use when temporal context suggests recency)
- general: Everything else";

/// Classifies `claim` into a `claim_type`. Routing must never halt the
/// pipeline: any oracle failure falls back to general/medium.
pub struct RouterNode {
    oracle: Arc<dyn Oracle>,
}

impl RouterNode {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }
}

#[async_trait]
impl Node for RouterNode {
    fn name(&self) -> &str {
        "router"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let user = format!("Route this claim: \"{}\"", state.claim);
        let classification = match self.oracle.classify(ROUTER_PROMPT, &user).await {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Router classification failed, defaulting to general: {}", e);
                return Ok(StateUpdate {
                    claim_type: Some(ClaimType::General),
                    confidence_level: Some(ConfidenceLevel::Medium),
                    ..Default::default()
                });
            }
        };

        log::info!(
            "Routed claim to {} ({:?})",
            classification.claim_type,
            classification.confidence_level
        );
        Ok(StateUpdate {
            claim_type: Some(classification.claim_type),
            confidence_level: Some(classification.confidence_level),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::oracle::{Classification, Judgment};

    struct ScriptedOracle {
        classification: Option<Classification>,
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        async fn judge(&self, _s: &str, _u: &str) -> Result<Judgment, OracleError> {
            Err(OracleError::InvalidResponse("unused".to_string()))
        }

        async fn classify(&self, _s: &str, _u: &str) -> Result<Classification, OracleError> {
            self.classification
                .clone()
                .ok_or_else(|| OracleError::InvalidResponse("down".to_string()))
        }

        async fn complete(&self, _p: &str) -> Result<String, OracleError> {
            Err(OracleError::InvalidResponse("unused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_router_sets_claim_type() {
        let node = RouterNode::new(Arc::new(ScriptedOracle {
            classification: Some(Classification {
                claim_type: ClaimType::Historical,
                confidence_level: ConfidenceLevel::High,
            }),
        }));
        let update = node.run(&WorkflowState::new("claim", 3)).await.unwrap();
        assert_eq!(update.claim_type, Some(ClaimType::Historical));
        assert_eq!(update.confidence_level, Some(ConfidenceLevel::High));
    }

    #[tokio::test]
    async fn test_router_failure_defaults_to_general() {
        let node = RouterNode::new(Arc::new(ScriptedOracle {
            classification: None,
        }));
        let update = node.run(&WorkflowState::new("claim", 3)).await.unwrap();
        assert_eq!(update.claim_type, Some(ClaimType::General));
        assert_eq!(update.confidence_level, Some(ConfidenceLevel::Medium));
        assert!(update.error.is_none()); // never propagates the failure
    }
}
