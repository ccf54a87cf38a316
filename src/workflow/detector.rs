// SPDX-License-Identifier: MIT

//! Detector - high-level facade assembling graphs and running claims
//!
//! Three topologies, in increasing order of capability:
//! - baseline: detect with a bounded retry cycle
//! - evidence: detect, then a confidence-gated search/revision branch
//! - review: router, domain experts, uncertainty scoring, optional human
//!   review (the interrupt-capable variant used by [`Detector::run`])

use super::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use super::engine::Engine;
use super::graph::{Edge, Graph, NodeId, Target};
use super::nodes::{
    AnalyzeEvidenceNode, CurrentEventsExpertNode, DetectNode, ExpertNode, ExtractFactsNode,
    FormatOutputNode, GenerateQueriesNode, HumanReviewNode, RetryNode, ReviewHandler,
    ReviseVerdictNode, RouterNode, SearchWebNode, UncertaintyDetectorNode,
};
use super::routing::{
    route_after_detection, route_after_initial_check, route_after_review_check, route_to_expert,
    DetectionRoute, ReviewRoute, SearchRoute,
};
use super::state::WorkflowState;
use super::types::{HumanFeedback, ResultRecord, RunOptions, RunOutcome};
use crate::config::DetectorConfig;
use crate::error::{VeracityError, WorkflowError};
use crate::memory::MemoryStore;
use crate::oracle::{ClaimType, Oracle, SearchOracle, Verdict};
use std::sync::Arc;
use tokio::time::timeout;
use uuid::Uuid;

/// Claim-verification pipeline facade
pub struct Detector {
    oracle: Arc<dyn Oracle>,
    search: Arc<dyn SearchOracle>,
    memory: Option<Arc<dyn MemoryStore>>,
    checkpoints: Arc<dyn CheckpointStore>,
    review_handler: Option<Arc<dyn ReviewHandler>>,
    config: DetectorConfig,
}

impl Detector {
    pub fn new(oracle: Arc<dyn Oracle>, search: Arc<dyn SearchOracle>) -> Self {
        Self {
            oracle,
            search,
            memory: None,
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
            review_handler: None,
            config: DetectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    /// Register a synchronous review handler. With a handler the review
    /// node resolves in-process and the graph never interrupts - the
    /// degenerate flag-based design.
    pub fn with_review_handler(mut self, handler: Arc<dyn ReviewHandler>) -> Self {
        self.review_handler = Some(handler);
        self
    }

    /// Full pipeline: routing, expert analysis, uncertainty scoring, and
    /// human review. Returns `Pending` when the graph interrupts for a
    /// reviewer; continue with [`Detector::resume`].
    pub async fn run(&self, claim: &str, options: RunOptions) -> RunOutcome {
        if claim.trim().is_empty() {
            return RunOutcome::Complete(ResultRecord::error(
                "Empty claim provided",
                "Invalid input",
            ));
        }

        let graph = match self.review_graph() {
            Ok(graph) => graph,
            Err(e) => {
                return RunOutcome::Complete(ResultRecord::error(
                    "Failed to assemble workflow graph",
                    e.to_string(),
                ))
            }
        };

        let mut state = WorkflowState::new(
            claim,
            options.max_retries.unwrap_or(self.config.max_retries),
        );
        state.skip_human_review = options.skip_human_review;
        state.force_human_review = options.force_human_review;

        let session_id = options
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let outcome = self.execute(graph, state, &session_id).await;
        if let RunOutcome::Complete(record) = &outcome {
            self.remember(claim, record);
        }
        outcome
    }

    /// Continue an interrupted session with human-provided fields
    pub async fn resume(
        &self,
        session_id: &str,
        feedback: HumanFeedback,
    ) -> Result<ResultRecord, VeracityError> {
        let graph = self.review_graph()?;

        // The checkpointed claim is needed for the memory write-back
        let claim = self
            .checkpoints
            .load(session_id)
            .await?
            .map(|cp| cp.state.claim);

        let engine = Engine::new(graph, self.checkpoints.clone());
        let record = engine.resume(session_id, feedback).await?;

        if let Some(claim) = claim {
            self.remember(&claim, &record);
        }
        Ok(record)
    }

    /// Baseline variant: one detection call with a bounded retry cycle
    pub async fn check_baseline(&self, claim: &str, max_retries: Option<u32>) -> ResultRecord {
        if claim.trim().is_empty() {
            return ResultRecord::error("Empty claim provided", "Invalid input");
        }
        let graph = match self.baseline_graph() {
            Ok(graph) => graph,
            Err(e) => {
                return ResultRecord::error("Failed to assemble workflow graph", e.to_string())
            }
        };
        let state = WorkflowState::new(claim, max_retries.unwrap_or(self.config.max_retries));
        let record = self.complete_only(graph, state).await;
        self.remember(claim, &record);
        record
    }

    /// Evidence variant: confidence-gated search, fact extraction,
    /// synthesis, and verdict revision
    pub async fn check_with_evidence(&self, claim: &str) -> ResultRecord {
        if claim.trim().is_empty() {
            return ResultRecord::error("Empty claim provided", "Invalid input");
        }
        let graph = match self.evidence_graph() {
            Ok(graph) => graph,
            Err(e) => {
                return ResultRecord::error("Failed to assemble workflow graph", e.to_string())
            }
        };
        let state = WorkflowState::new(claim, self.config.max_retries);
        let record = self.complete_only(graph, state).await;
        self.remember(claim, &record);
        record
    }

    async fn execute(&self, graph: Graph, state: WorkflowState, session_id: &str) -> RunOutcome {
        let engine = Engine::new(graph, self.checkpoints.clone());
        match timeout(self.config.run_timeout, engine.run(state, session_id)).await {
            Ok(outcome) => outcome,
            Err(_) => RunOutcome::Complete(ResultRecord::error(
                "Run exceeded the configured deadline",
                format!("deadline of {:?} elapsed", self.config.run_timeout),
            )),
        }
    }

    /// Run a graph that has no interrupt points
    async fn complete_only(&self, graph: Graph, state: WorkflowState) -> ResultRecord {
        match self.execute(graph, state, "local").await {
            RunOutcome::Complete(record) => record,
            RunOutcome::Pending { session_id } => ResultRecord::error(
                "Workflow interrupted unexpectedly",
                format!("unexpected interrupt in session '{}'", session_id),
            ),
        }
    }

    fn remember(&self, claim: &str, record: &ResultRecord) {
        if record.verdict == Verdict::Error {
            return;
        }
        if let Some(memory) = &self.memory {
            memory.store(claim, record.verdict, record.confidence, &record.reasoning);
        }
    }

    fn detect_node(&self) -> Arc<DetectNode> {
        let mut node = DetectNode::new(
            self.oracle.clone(),
            self.config.search_threshold,
            self.config.max_claim_len,
        );
        if let Some(memory) = &self.memory {
            node = node.with_memory(memory.clone());
        }
        Arc::new(node)
    }

    fn baseline_graph(&self) -> Result<Graph, WorkflowError> {
        Graph::builder(NodeId::Detect)
            .node(
                NodeId::Detect,
                self.detect_node(),
                Edge::conditional(
                    |state| match route_after_detection(state) {
                        DetectionRoute::Retry => Target::Node(NodeId::Retry),
                        DetectionRoute::Success | DetectionRoute::Error => {
                            Target::Node(NodeId::FormatOutput)
                        }
                    },
                    vec![
                        Target::Node(NodeId::Retry),
                        Target::Node(NodeId::FormatOutput),
                    ],
                ),
            )
            .node(
                NodeId::Retry,
                Arc::new(RetryNode),
                Edge::Fixed(Target::Node(NodeId::Detect)),
            )
            .node(
                NodeId::FormatOutput,
                Arc::new(FormatOutputNode::basic()),
                Edge::Fixed(Target::End),
            )
            .build()
    }

    fn evidence_graph(&self) -> Result<Graph, WorkflowError> {
        Graph::builder(NodeId::Detect)
            .node(
                NodeId::Detect,
                self.detect_node(),
                Edge::conditional(
                    |state| match route_after_initial_check(state) {
                        SearchRoute::GenerateQueries => Target::Node(NodeId::GenerateQueries),
                        SearchRoute::FormatOutput => Target::Node(NodeId::FormatOutput),
                    },
                    vec![
                        Target::Node(NodeId::GenerateQueries),
                        Target::Node(NodeId::FormatOutput),
                    ],
                ),
            )
            .node(
                NodeId::GenerateQueries,
                Arc::new(GenerateQueriesNode::new(self.config.query_count)),
                Edge::Fixed(Target::Node(NodeId::SearchWeb)),
            )
            .node(
                NodeId::SearchWeb,
                Arc::new(SearchWebNode::new(self.search.clone())),
                Edge::Fixed(Target::Node(NodeId::ExtractFacts)),
            )
            .node(
                NodeId::ExtractFacts,
                Arc::new(ExtractFactsNode::new(
                    self.config.min_fact_len,
                    self.config.max_facts,
                )),
                Edge::Fixed(Target::Node(NodeId::AnalyzeEvidence)),
            )
            .node(
                NodeId::AnalyzeEvidence,
                Arc::new(AnalyzeEvidenceNode::new(self.oracle.clone())),
                Edge::Fixed(Target::Node(NodeId::ReviseVerdict)),
            )
            .node(
                NodeId::ReviseVerdict,
                Arc::new(ReviseVerdictNode::new(
                    self.config.evidence_flip_confidence,
                    self.config.evidence_boost,
                    self.config.confidence_cap,
                    self.config.no_evidence_penalty,
                    self.config.confidence_floor,
                )),
                Edge::Fixed(Target::Node(NodeId::FormatOutput)),
            )
            .node(
                NodeId::FormatOutput,
                Arc::new(FormatOutputNode::basic()),
                Edge::Fixed(Target::End),
            )
            .build()
    }

    fn review_graph(&self) -> Result<Graph, WorkflowError> {
        let review_node = match &self.review_handler {
            Some(handler) => HumanReviewNode::with_handler(handler.clone()),
            None => HumanReviewNode::new(),
        };

        let mut builder = Graph::builder(NodeId::Router)
            .node(
                NodeId::Router,
                Arc::new(RouterNode::new(self.oracle.clone())),
                Edge::conditional(
                    |state| match route_to_expert(state) {
                        ClaimType::Technical => Target::Node(NodeId::TechnicalExpert),
                        ClaimType::Historical => Target::Node(NodeId::HistoricalExpert),
                        ClaimType::CurrentEvent => Target::Node(NodeId::CurrentEventsExpert),
                        ClaimType::General => Target::Node(NodeId::GeneralExpert),
                    },
                    vec![
                        Target::Node(NodeId::TechnicalExpert),
                        Target::Node(NodeId::HistoricalExpert),
                        Target::Node(NodeId::CurrentEventsExpert),
                        Target::Node(NodeId::GeneralExpert),
                    ],
                ),
            )
            .node(
                NodeId::TechnicalExpert,
                Arc::new(ExpertNode::technical(self.oracle.clone())),
                Edge::Fixed(Target::Node(NodeId::UncertaintyDetector)),
            )
            .node(
                NodeId::HistoricalExpert,
                Arc::new(ExpertNode::historical(self.oracle.clone())),
                Edge::Fixed(Target::Node(NodeId::UncertaintyDetector)),
            )
            .node(
                NodeId::CurrentEventsExpert,
                Arc::new(CurrentEventsExpertNode::new(
                    self.oracle.clone(),
                    self.search.clone(),
                )),
                Edge::Fixed(Target::Node(NodeId::UncertaintyDetector)),
            )
            .node(
                NodeId::GeneralExpert,
                Arc::new(ExpertNode::general(self.oracle.clone())),
                Edge::Fixed(Target::Node(NodeId::UncertaintyDetector)),
            )
            .node(
                NodeId::UncertaintyDetector,
                Arc::new(UncertaintyDetectorNode::new(
                    self.config.low_confidence,
                    self.config.moderate_confidence,
                    self.config.review_threshold,
                )),
                Edge::conditional(
                    |state| match route_after_review_check(state) {
                        ReviewRoute::HumanReview => Target::Node(NodeId::HumanReview),
                        ReviewRoute::FormatOutput => Target::Node(NodeId::FormatOutput),
                    },
                    vec![
                        Target::Node(NodeId::HumanReview),
                        Target::Node(NodeId::FormatOutput),
                    ],
                ),
            )
            .node(
                NodeId::HumanReview,
                Arc::new(review_node),
                Edge::Fixed(Target::Node(NodeId::FormatOutput)),
            )
            .node(
                NodeId::FormatOutput,
                Arc::new(FormatOutputNode::reviewed()),
                Edge::Fixed(Target::End),
            );

        // Without a synchronous handler the engine must pause for a human
        if self.review_handler.is_none() {
            builder = builder.interrupt_before(NodeId::HumanReview);
        }

        builder.build()
    }
}
