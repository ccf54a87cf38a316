// SPDX-License-Identifier: MIT

//! Core node trait for workflow processing stages

use super::state::{StateUpdate, WorkflowState};
use crate::error::WorkflowError;
use async_trait::async_trait;

/// A processing stage: current state in, sparse update out.
///
/// Well-behaved nodes contain their own oracle failures and encode them in
/// the update (default values or an `error` field). Returning `Err` is the
/// last resort; the engine converts it into a terminal ERROR result.
#[async_trait]
pub trait Node: Send + Sync {
    /// Returns the node name used in logs and error messages
    fn name(&self) -> &str;

    /// Run the node against the accumulated state
    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError>;
}
