// SPDX-License-Identifier: MIT

//! Pipeline tuning constants
//!
//! Every threshold the pipeline consults lives here as a named,
//! overridable field. The defaults are the values the system was
//! calibrated with; override individual fields rather than editing
//! call sites.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Detector`](crate::workflow::Detector) instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Retry budget for the baseline detection cycle
    pub max_retries: u32,

    /// Confidence below this triggers the evidence-search branch
    pub search_threshold: u8,

    /// Confidence assigned when evidence flatly contradicts the initial verdict
    pub evidence_flip_confidence: u8,

    /// Confidence boost when evidence confirms the initial verdict
    pub evidence_boost: u8,

    /// Upper bound on boosted confidence
    pub confidence_cap: u8,

    /// Confidence penalty when search produced no usable evidence
    pub no_evidence_penalty: u8,

    /// Lower bound on penalized confidence
    pub confidence_floor: u8,

    /// Below this confidence a verdict is considered very uncertain
    pub low_confidence: u8,

    /// Below this confidence a verdict is considered moderately uncertain
    pub moderate_confidence: u8,

    /// Uncertainty score above which human review is requested
    pub review_threshold: f32,

    /// Number of search queries generated per claim
    pub query_count: usize,

    /// Cap on extracted facts across all search results
    pub max_facts: usize,

    /// Sentence fragments shorter than this are discarded during fact extraction
    pub min_fact_len: usize,

    /// Claims longer than this are truncated before prompting
    pub max_claim_len: usize,

    /// Wall-clock bound for a whole run; expiry yields an ERROR result
    #[serde(with = "duration_secs")]
    pub run_timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            search_threshold: 70,
            evidence_flip_confidence: 80,
            evidence_boost: 15,
            confidence_cap: 95,
            no_evidence_penalty: 10,
            confidence_floor: 40,
            low_confidence: 50,
            moderate_confidence: 70,
            review_threshold: 0.6,
            query_count: 3,
            max_facts: 10,
            min_fact_len: 20,
            max_claim_len: 500,
            run_timeout: Duration::from_secs(120),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
