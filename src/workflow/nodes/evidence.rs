// SPDX-License-Identifier: MIT

//! Evidence pipeline: generate queries, retrieve, extract facts, synthesize
//!
//! Query generation and fact extraction are pure transforms; retrieval
//! tolerates per-query failure (partial success is valid); synthesis asks
//! the oracle to classify the evidence as SUPPORTS/REFUTES/INCONCLUSIVE.

use crate::error::WorkflowError;
use crate::oracle::{Oracle, SearchOracle, SearchRecord};
use crate::workflow::node::Node;
use crate::workflow::state::{StateUpdate, WorkflowState};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Generate search queries from a claim: the claim itself, a fact-check
/// variant, and an entity-anchored variant when capitalized tokens exist.
pub fn generate_search_queries(claim: &str, num_queries: usize) -> Vec<String> {
    let mut queries = Vec::new();

    queries.push(claim.to_string());

    if num_queries >= 2 {
        queries.push(format!("fact check {}", claim));
    }

    if num_queries >= 3 {
        let entities: Vec<&str> = claim
            .split_whitespace()
            .filter(|w| {
                w.chars().next().is_some_and(|c| c.is_uppercase()) && w.chars().count() > 2
            })
            .collect();
        if entities.is_empty() {
            let head: String = claim.chars().take(50).collect();
            queries.push(format!("truth about {}", head));
        } else {
            queries.push(format!("{} facts verification", entities[..entities.len().min(2)].join(" ")));
        }
    }

    queries.truncate(num_queries);
    queries
}

/// Extract key facts from search records: first sentences of each
/// successful record, short fragments dropped, case-insensitive dedupe,
/// capped overall.
pub fn extract_facts(records: &[SearchRecord], min_fact_len: usize, max_facts: usize) -> Vec<String> {
    let mut facts = Vec::new();

    for record in records.iter().filter(|r| r.success) {
        let text = record.facts.join(" ");
        for sentence in text.split(". ").take(3) {
            let trimmed = sentence.trim();
            if trimmed.len() > min_fact_len {
                facts.push(trimmed.to_string());
            }
        }
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for fact in facts {
        if seen.insert(fact.to_lowercase()) {
            unique.push(fact);
        }
    }

    unique.truncate(max_facts);
    unique
}

/// Pure query-generation node
pub struct GenerateQueriesNode {
    query_count: usize,
}

impl GenerateQueriesNode {
    pub fn new(query_count: usize) -> Self {
        Self { query_count }
    }
}

#[async_trait]
impl Node for GenerateQueriesNode {
    fn name(&self) -> &str {
        "generate_queries"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let queries = generate_search_queries(&state.claim, self.query_count);
        log::debug!("Generated {} search queries", queries.len());
        Ok(StateUpdate {
            search_queries: Some(queries),
            ..Default::default()
        })
    }
}

/// Retrieval node: one search per query, failures collected per record
pub struct SearchWebNode {
    search: Arc<dyn SearchOracle>,
}

impl SearchWebNode {
    pub fn new(search: Arc<dyn SearchOracle>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Node for SearchWebNode {
    fn name(&self) -> &str {
        "search_web"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let mut records = Vec::with_capacity(state.search_queries.len());
        let mut sources = Vec::new();

        for query in &state.search_queries {
            let record = self.search.search(query).await;
            if record.success {
                sources.push(query.clone());
            } else {
                log::warn!(
                    "Query '{}' failed: {}",
                    query,
                    record.error.as_deref().unwrap_or("unknown")
                );
            }
            records.push(record);
        }

        Ok(StateUpdate {
            search_results: Some(records),
            sources_used: Some(sources),
            used_search: Some(true),
            ..Default::default()
        })
    }
}

/// Pure fact-extraction node
pub struct ExtractFactsNode {
    min_fact_len: usize,
    max_facts: usize,
}

impl ExtractFactsNode {
    pub fn new(min_fact_len: usize, max_facts: usize) -> Self {
        Self {
            min_fact_len,
            max_facts,
        }
    }
}

#[async_trait]
impl Node for ExtractFactsNode {
    fn name(&self) -> &str {
        "extract_facts"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        let facts = extract_facts(&state.search_results, self.min_fact_len, self.max_facts);
        log::debug!("Extracted {} facts", facts.len());
        Ok(StateUpdate {
            extracted_facts: Some(facts),
            ..Default::default()
        })
    }
}

/// Evidence-synthesis node: SUPPORTS/REFUTES/INCONCLUSIVE relative to the claim
pub struct AnalyzeEvidenceNode {
    oracle: Arc<dyn Oracle>,
}

impl AnalyzeEvidenceNode {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// REFUTES is checked first: both words appear when the analysis
    /// contrasts them, and refutation is the safer reading.
    fn parse_assessment(analysis: &str) -> Option<bool> {
        let upper = analysis.to_uppercase();
        if upper.contains("REFUTES") {
            Some(false)
        } else if upper.contains("SUPPORTS") {
            Some(true)
        } else {
            None
        }
    }
}

#[async_trait]
impl Node for AnalyzeEvidenceNode {
    fn name(&self) -> &str {
        "analyze_evidence"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StateUpdate, WorkflowError> {
        if state.extracted_facts.is_empty() {
            return Ok(StateUpdate {
                evidence_summary: Some("No evidence found through search.".to_string()),
                evidence_supports_claim: Some(None),
                ..Default::default()
            });
        }

        let facts_text = state
            .extracted_facts
            .iter()
            .take(5)
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Analyze this evidence in relation to the claim.

Claim: {}

Evidence found:
{}

Provide:
1. A brief summary of what the evidence shows
2. Whether the evidence SUPPORTS, REFUTES, or is INCONCLUSIVE regarding the claim
3. Key facts that influenced your assessment

Format your response as:
SUMMARY: [1-2 sentences]
ASSESSMENT: [SUPPORTS/REFUTES/INCONCLUSIVE]
KEY FACTS: [List 2-3 most relevant facts]",
            state.claim, facts_text
        );

        match self.oracle.complete(&prompt).await {
            Ok(analysis) => {
                let supports = Self::parse_assessment(&analysis);
                Ok(StateUpdate {
                    evidence_summary: Some(analysis),
                    evidence_supports_claim: Some(supports),
                    ..Default::default()
                })
            }
            Err(e) => Ok(StateUpdate {
                evidence_summary: Some(format!("Evidence analysis failed: {}", e)),
                evidence_supports_claim: Some(None),
                ..Default::default()
            }),
        }
    }
}
