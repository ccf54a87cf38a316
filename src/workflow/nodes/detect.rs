// SPDX-License-Identifier: MIT

//! Baseline detection and the retry cycle

use crate::error::WorkflowError;
use crate::memory::MemoryStore;
use crate::oracle::Oracle;
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const DETECT_PROMPT: &str = "You are an expert fact-checker. Your job is to determine if claims are BS (false/ridiculous) or LEGITIMATE (true/reasonable).

Remember:
- BS means the claim is false, impossible, or ridiculous
- LEGITIMATE means the claim is true, possible, or reasonable
- Be specific about the relevant facts in your reasoning
- Keep reasoning to 1-2 sentences";

/// Single-call detection node.
///
/// On success it also decides whether the evidence branch should run
/// (confidence below the search threshold). On oracle failure it records
/// the error and bumps the retry counter; routing decides whether the
/// budget allows another attempt. This is the only node that increments
/// `retry_count`.
pub struct DetectNode {
    oracle: Arc<dyn Oracle>,
    memory: Option<Arc<dyn MemoryStore>>,
    search_threshold: u8,
    max_claim_len: usize,
}

impl DetectNode {
    pub fn new(oracle: Arc<dyn Oracle>, search_threshold: u8, max_claim_len: usize) -> Self {
        Self {
            oracle,
            memory: None,
            search_threshold,
            max_claim_len,
        }
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    fn truncated_claim(&self, claim: &str) -> String {
        if claim.chars().count() > self.max_claim_len {
            let head: String = claim.chars().take(self.max_claim_len).collect();
            format!("{}...", head)
        } else {
            claim.to_string()
        }
    }
}

#[async_trait]
impl Node for DetectNode {
    fn name(&self) -> &str {
        "detect"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let claim = self.truncated_claim(&state.claim);

        let mut system = DETECT_PROMPT.to_string();
        if let Some(memory) = &self.memory {
            let context = memory.retrieve_context(&state.claim);
            if let Some(text) = context.context {
                system.push_str("\n\n");
                system.push_str(&text);
            }
        }

        let user = format!("Analyze this claim: {}", claim);
        match self.oracle.judge(&system, &user).await {
            Ok(judgment) => {
                let judgment = judgment.clamped();
                let needs_search = judgment.confidence < self.search_threshold;
                Ok(StateUpdate {
                    verdict: Some(judgment.verdict),
                    confidence: Some(judgment.confidence),
                    reasoning: Some(judgment.reasoning),
                    needs_search: Some(needs_search),
                    ..Default::default()
                })
            }
            Err(e) => {
                log::warn!("Detection attempt {} failed: {}", state.retry_count + 1, e);
                Ok(StateUpdate {
                    error: Some(e.to_string()),
                    retry_count: Some(state.retry_count + 1),
                    // Evidence may still settle the claim when the oracle is flaky
                    needs_search: Some(true),
                    ..Default::default()
                })
            }
        }
    }
}

/// Backoff node for the retry cycle: 1s, 2s, 4s, ...
pub struct RetryNode;

#[async_trait]
impl Node for RetryNode {
    fn name(&self) -> &str {
        "retry"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let exponent = state.retry_count.saturating_sub(1).min(16);
        let wait = Duration::from_secs(1u64 << exponent);
        log::info!(
            "Retry {}/{} - waiting {:?}",
            state.retry_count,
            state.max_retries,
            wait
        );
        tokio::time::sleep(wait).await;
        // Detection happens again when the edge loops back
        Ok(StateUpdate::default())
    }
}
