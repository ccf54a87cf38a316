// SPDX-License-Identifier: MIT

//! Checkpoint store - persisted snapshots for interrupt/resume
//!
//! When the engine pauses before a human-review node it serializes the
//! whole [`WorkflowState`] plus the next node under a session id. A
//! concurrent second write to the same key is a last-write-wins race;
//! no transactional guarantee beyond that.

use super::graph::NodeId;
use super::state::WorkflowState;
use crate::error::WorkflowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Snapshot of an interrupted run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: String,
    /// Node execution will continue from
    pub next: NodeId,
    pub state: WorkflowState,
}

/// Storage contract for checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), WorkflowError>;
    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, WorkflowError>;
}

/// In-memory checkpoint store; state lives as serialized JSON so loads
/// hand back an independent copy.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    sessions: Mutex<HashMap<String, String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<(), WorkflowError> {
        let payload = serde_json::to_string(checkpoint)
            .map_err(|e| WorkflowError::Checkpoint(e.to_string()))?;
        let mut sessions = self.sessions.lock().await;
        sessions.insert(checkpoint.session_id.clone(), payload);
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Checkpoint>, WorkflowError> {
        let sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(payload) => serde_json::from_str(payload)
                .map(Some)
                .map_err(|e| WorkflowError::Checkpoint(e.to_string())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(session_id: &str, claim: &str) -> Checkpoint {
        Checkpoint {
            session_id: session_id.to_string(),
            next: NodeId::HumanReview,
            state: WorkflowState::new(claim, 3),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryCheckpointStore::new();
        store.save(&checkpoint("s1", "claim one")).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.session_id, "s1");
        assert_eq!(loaded.next, NodeId::HumanReview);
        assert_eq!(loaded.state.claim, "claim one");
    }

    #[tokio::test]
    async fn test_load_missing_session() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = MemoryCheckpointStore::new();
        store.save(&checkpoint("s1", "first")).await.unwrap();
        store.save(&checkpoint("s1", "second")).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.state.claim, "second");
    }
}
