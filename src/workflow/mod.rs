// SPDX-License-Identifier: MIT

pub mod checkpoint;
pub mod detector;
pub mod engine;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod routing;
pub mod state;
pub mod types;

pub use checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore};
pub use detector::Detector;
pub use engine::Engine;
pub use graph::{Edge, Graph, NodeId, Target};
pub use node::Node;
pub use state::{StateUpdate, WorkflowState};
pub use types::{
    ExpertOpinion, HumanFeedback, ResultRecord, ReviewRequest, RunOptions, RunOutcome,
};
