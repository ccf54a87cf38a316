// SPDX-License-Identifier: MIT

//! Typed error handling for veracity-rs
//!
//! Three layers: `OracleError` for LLM/search capability failures,
//! `WorkflowError` for graph construction and execution failures, and
//! `VeracityError` as the top-level wrapper.

use thiserror::Error;

/// Top-level error type for veracity-rs
#[derive(Debug, Error)]
pub enum VeracityError {
    /// Oracle capability failures (LLM call, search request)
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Workflow-specific errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper for compatibility
    #[error("{0}")]
    Other(String),
}

/// Workflow-specific errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Node execution failed in a way the node did not contain itself
    #[error("Node '{node}' failed: {message}")]
    Node { node: String, message: String },

    /// Graph construction referenced a node that was never registered
    #[error("Edge target '{0}' is not a registered node")]
    UnknownTarget(String),

    /// Graph construction named an entry node that was never registered
    #[error("Entry node '{0}' is not a registered node")]
    UnknownEntry(String),

    /// A node was registered without an outgoing edge
    #[error("Node '{0}' has no outgoing edge")]
    MissingEdge(String),

    /// A routing predicate returned a target its edge did not declare
    #[error("Routing after '{node}' returned undeclared target '{target}'")]
    UndeclaredRoute { node: String, target: String },

    /// Resume was called for a session with no stored checkpoint
    #[error("No checkpoint found for session '{0}'")]
    SessionNotFound(String),

    /// Checkpoint store failed to persist or load state
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Step-loop safety limit reached
    #[error("Execution exceeded step limit of {0}")]
    StepLimit(u32),
}

/// Oracle/LLM-specific errors
#[derive(Debug, Error)]
pub enum OracleError {
    /// API errors from the backing service
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// API key not configured
    #[error("API key not configured: {0} must be set")]
    ApiKeyMissing(String),

    /// Response did not match the expected shape
    #[error("Invalid response from oracle: {0}")]
    InvalidResponse(String),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON errors while decoding an oracle payload
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl OracleError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl WorkflowError {
    /// Create a node-failure error
    pub fn node(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Node {
            node: node.into(),
            message: message.into(),
        }
    }
}

impl From<String> for VeracityError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for VeracityError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
