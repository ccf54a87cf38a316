// SPDX-License-Identifier: MIT

//! veracity-rs - a claim-verification pipeline
//!
//! Given a natural-language factual claim, produce a verdict (BS /
//! LEGITIMATE / UNCERTAIN / ERROR), a confidence score, and supporting
//! reasoning. The core is a stateful workflow graph: classification,
//! domain-expert analysis, evidence search, uncertainty scoring, and
//! human review connected by conditional routing, with a bounded retry
//! cycle and checkpointed interrupt/resume for human input.
//!
//! The LLM and search backends are consumed through the capability
//! traits in [`oracle`]; everything in [`workflow`] is backend-agnostic.

pub mod config;
pub mod error;
pub mod memory;
pub mod oracle;
pub mod workflow;

pub use config::DetectorConfig;
pub use error::{OracleError, VeracityError, WorkflowError};
pub use oracle::{ClaimType, Oracle, SearchOracle, Verdict};
pub use workflow::{Detector, HumanFeedback, ResultRecord, RunOptions, RunOutcome};
