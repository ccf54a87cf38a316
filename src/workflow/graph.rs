// SPDX-License-Identifier: MIT

//! Workflow graph - nodes, edges, and construction-time validation
//!
//! Node identity is the closed [`NodeId`] enum rather than strings, so a
//! routing predicate cannot name a node that does not exist; the builder
//! additionally verifies that every edge target (fixed or declared
//! conditional) refers to a registered node, making a dangling edge a
//! construction error instead of a runtime lookup failure.

use super::node::Node;
use super::state::WorkflowState;
use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Every node the pipeline can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    Detect,
    Retry,
    Router,
    TechnicalExpert,
    HistoricalExpert,
    CurrentEventsExpert,
    GeneralExpert,
    GenerateQueries,
    SearchWeb,
    ExtractFacts,
    AnalyzeEvidence,
    ReviseVerdict,
    UncertaintyDetector,
    HumanReview,
    FormatOutput,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeId::Detect => "detect",
            NodeId::Retry => "retry",
            NodeId::Router => "router",
            NodeId::TechnicalExpert => "technical_expert",
            NodeId::HistoricalExpert => "historical_expert",
            NodeId::CurrentEventsExpert => "current_events_expert",
            NodeId::GeneralExpert => "general_expert",
            NodeId::GenerateQueries => "generate_queries",
            NodeId::SearchWeb => "search_web",
            NodeId::ExtractFacts => "extract_facts",
            NodeId::AnalyzeEvidence => "analyze_evidence",
            NodeId::ReviseVerdict => "revise_verdict",
            NodeId::UncertaintyDetector => "uncertainty_detector",
            NodeId::HumanReview => "human_review",
            NodeId::FormatOutput => "format_output",
        };
        f.write_str(s)
    }
}

/// Where an edge leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    /// Terminal marker
    End,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Node(id) => write!(f, "{}", id),
            Target::End => f.write_str("END"),
        }
    }
}

/// Routing function evaluated against the post-node state
pub type RouteFn = Arc<dyn Fn(&WorkflowState) -> Target + Send + Sync>;

/// Outgoing edge of a node
pub enum Edge {
    /// Single unconditional successor
    Fixed(Target),
    /// Predicate-selected successor; targets must be declared up front
    Conditional { route: RouteFn, targets: Vec<Target> },
}

impl Edge {
    /// Convenience constructor for conditional edges
    pub fn conditional(
        route: impl Fn(&WorkflowState) -> Target + Send + Sync + 'static,
        targets: Vec<Target>,
    ) -> Self {
        Edge::Conditional {
            route: Arc::new(route),
            targets,
        }
    }
}

/// An assembled, validated workflow graph
pub struct Graph {
    entry: NodeId,
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    edges: HashMap<NodeId, Edge>,
    interrupt_before: HashSet<NodeId>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("entry", &self.entry)
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("edges", &self.edges.keys().collect::<Vec<_>>())
            .field("interrupt_before", &self.interrupt_before)
            .finish()
    }
}

impl Graph {
    pub fn builder(entry: NodeId) -> GraphBuilder {
        GraphBuilder {
            entry,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            interrupt_before: HashSet::new(),
        }
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<dyn Node>> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: NodeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn is_interrupt_point(&self, id: NodeId) -> bool {
        self.interrupt_before.contains(&id)
    }
}

/// Builder validating the graph shape before execution
pub struct GraphBuilder {
    entry: NodeId,
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    edges: HashMap<NodeId, Edge>,
    interrupt_before: HashSet<NodeId>,
}

impl GraphBuilder {
    /// Register a node together with its outgoing edge
    pub fn node(mut self, id: NodeId, node: Arc<dyn Node>, edge: Edge) -> Self {
        self.nodes.insert(id, node);
        self.edges.insert(id, edge);
        self
    }

    /// Pause execution before this node until human feedback arrives
    pub fn interrupt_before(mut self, id: NodeId) -> Self {
        self.interrupt_before.insert(id);
        self
    }

    /// Validate and assemble the graph
    pub fn build(self) -> Result<Graph, WorkflowError> {
        if !self.nodes.contains_key(&self.entry) {
            return Err(WorkflowError::UnknownEntry(self.entry.to_string()));
        }

        for (id, edge) in &self.edges {
            if !self.nodes.contains_key(id) {
                return Err(WorkflowError::UnknownTarget(id.to_string()));
            }
            let targets: &[Target] = match edge {
                Edge::Fixed(target) => std::slice::from_ref(target),
                Edge::Conditional { targets, .. } => targets,
            };
            for target in targets {
                if let Target::Node(next) = target {
                    if !self.nodes.contains_key(next) {
                        return Err(WorkflowError::UnknownTarget(next.to_string()));
                    }
                }
            }
        }

        for id in self.nodes.keys() {
            if !self.edges.contains_key(id) {
                return Err(WorkflowError::MissingEdge(id.to_string()));
            }
        }

        for id in &self.interrupt_before {
            if !self.nodes.contains_key(id) {
                return Err(WorkflowError::UnknownTarget(id.to_string()));
            }
        }

        Ok(Graph {
            entry: self.entry,
            nodes: self.nodes,
            edges: self.edges,
            interrupt_before: self.interrupt_before,
        })
    }
}
