// SPDX-License-Identifier: MIT

//! Oracle module - capability interfaces for the LLM and search backends
//!
//! The workflow core never talks to a model or a search engine directly;
//! it consumes these traits:
//! - [`Oracle`] - structured judgment, claim classification, free-text completion
//! - [`SearchOracle`] - web search returning fact snippets
//!
//! Implementations:
//! - [http::HttpOracle] - OpenAI-compatible chat-completions endpoint
//! - [search::BraveSearch] - Brave web-search API

pub mod http;
pub mod parser;
pub mod search;

use crate::error::OracleError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical judgment on a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The claim is false, impossible, or ridiculous
    Bs,
    /// The claim is true, possible, or reasonable
    Legitimate,
    /// The evidence does not allow a call either way
    Uncertain,
    /// Processing failed; see the accompanying error text
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Bs => "BS",
            Verdict::Legitimate => "LEGITIMATE",
            Verdict::Uncertain => "UNCERTAIN",
            Verdict::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Claim category decided once by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Technical,
    Historical,
    CurrentEvent,
    General,
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClaimType::Technical => "technical",
            ClaimType::Historical => "historical",
            ClaimType::CurrentEvent => "current_event",
            ClaimType::General => "general",
        };
        f.write_str(s)
    }
}

/// Coarse router self-assessment of its classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Structured judgment the oracle is constrained to emit
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Judgment {
    /// Whether the claim is BS or legitimate
    pub verdict: Verdict,
    /// Confidence percentage from 0 to 100
    pub confidence: u8,
    /// Explanation for the verdict
    pub reasoning: String,
}

impl Judgment {
    /// Clamp confidence into 0-100; malformed payloads must not leak
    /// out-of-range values into the workflow state.
    pub fn clamped(mut self) -> Self {
        self.confidence = self.confidence.min(100);
        self
    }
}

/// Structured routing decision
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    /// Which specialist should handle the claim
    pub claim_type: ClaimType,
    /// How certain the router is about the category
    pub confidence_level: ConfidenceLevel,
}

/// Outcome of a single search query
///
/// Failure is encoded in the record (`success`/`error`), never raised:
/// one dead query must not abort a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    /// Raw fact snippets, one per result
    pub facts: Vec<String>,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SearchRecord {
    pub fn ok(query: impl Into<String>, facts: Vec<String>) -> Self {
        Self {
            query: query.into(),
            facts,
            success: true,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            facts: Vec::new(),
            success: false,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Core trait for the LLM capability.
///
/// Any call may fail (network/timeout/parse); callers convert failures into
/// documented defaults or an `error` state update - nodes never let an
/// oracle failure escape as a panic.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Obtain a structured verdict + confidence + reasoning
    async fn judge(&self, system: &str, user: &str) -> Result<Judgment, OracleError>;

    /// Classify a claim for routing
    async fn classify(&self, system: &str, user: &str) -> Result<Classification, OracleError>;

    /// Free-text completion
    async fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Web-search capability for evidence gathering
#[async_trait]
pub trait SearchOracle: Send + Sync {
    /// Search the web; failures come back inside the record
    async fn search(&self, query: &str) -> SearchRecord;
}
