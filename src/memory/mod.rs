// SPDX-License-Identifier: MIT

//! Memory store - process-wide recall of previously judged claims
//!
//! An optional collaborator, not part of the engine: completed runs are
//! appended (claim, verdict, confidence, reasoning, extracted entities),
//! and later runs retrieve related claims plus warnings about recurring
//! BS markers to enrich their prompts. All mutation goes through one
//! mutex, giving the single-writer discipline the shared store needs.

use crate::oracle::Verdict;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Phrases that keep showing up in debunked claims
const BS_MARKERS: &[&str] = &[
    "quantum",
    "perpetual",
    "anti-gravity",
    "light speed",
    "time travel",
];

/// Words that pass the capitalization heuristic but carry no signal
const COMMON_WORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "Is", "Are", "Was", "Were",
];

/// A remembered claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim: String,
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasoning: String,
    pub entities: Vec<String>,
}

/// Context retrieved for a new claim
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    /// Prompt-ready context block, absent when nothing relevant is known
    pub context: Option<String>,
    pub related_claims: Vec<ClaimRecord>,
    pub warning_patterns: Vec<String>,
    pub entities: Vec<String>,
}

/// Storage contract for the claim memory
pub trait MemoryStore: Send + Sync {
    fn store(&self, claim: &str, verdict: Verdict, confidence: u8, reasoning: &str);
    fn retrieve_context(&self, claim: &str) -> MemoryContext;
}

/// Extract candidate entities: runs of capitalized words, acronyms, and
/// alphanumeric designations like "A380".
pub fn extract_entities(text: &str) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    // A multi-word run is indexed whole and per word, so "New York" is
    // found by a later claim mentioning just "York".
    fn flush(run: &mut Vec<&str>, entities: &mut Vec<String>) {
        if run.len() > 1 {
            entities.push(run.join(" "));
        }
        for word in run.drain(..) {
            entities.push(word.to_string());
        }
    }

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            flush(&mut run, &mut entities);
            continue;
        }

        let is_acronym = word.len() >= 2 && word.chars().all(|c| c.is_ascii_uppercase());
        let has_upper = word.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = word.chars().any(|c| c.is_ascii_digit());
        let is_proper = word.len() >= 2
            && word
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
            && word.chars().skip(1).all(|c| c.is_ascii_lowercase());

        if is_proper {
            run.push(word);
        } else {
            flush(&mut run, &mut entities);
            if is_acronym || (has_upper && has_digit) {
                entities.push(word.to_string());
            }
        }
    }
    flush(&mut run, &mut entities);

    entities.sort();
    entities.dedup();
    entities.retain(|e| !COMMON_WORDS.contains(&e.as_str()));
    entities
}

#[derive(Default)]
struct MemoryInner {
    claims: Vec<ClaimRecord>,
    /// Entity -> indices into `claims`
    entities: HashMap<String, Vec<usize>>,
    /// BS-marker frequency counts
    patterns: HashMap<String, u32>,
}

/// In-memory implementation of [`MemoryStore`]
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<MemoryInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStore for InMemoryStore {
    fn store(&self, claim: &str, verdict: Verdict, confidence: u8, reasoning: &str) {
        let entities = extract_entities(claim);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let index = inner.claims.len();
        for entity in &entities {
            inner.entities.entry(entity.clone()).or_default().push(index);
        }

        if verdict == Verdict::Bs {
            let lower = claim.to_lowercase();
            for marker in BS_MARKERS {
                if lower.contains(marker) {
                    *inner.patterns.entry(marker.to_string()).or_insert(0) += 1;
                }
            }
        }

        inner.claims.push(ClaimRecord {
            claim: claim.to_string(),
            verdict,
            confidence,
            reasoning: reasoning.to_string(),
            entities,
        });
    }

    fn retrieve_context(&self, claim: &str) -> MemoryContext {
        let entities = extract_entities(claim);
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let mut indices: Vec<usize> = entities
            .iter()
            .filter_map(|e| inner.entities.get(e))
            .flatten()
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();

        let related_claims: Vec<ClaimRecord> = indices
            .into_iter()
            .filter_map(|i| inner.claims.get(i).cloned())
            .take(3)
            .collect();

        let lower = claim.to_lowercase();
        let warning_patterns: Vec<String> = inner
            .patterns
            .iter()
            .filter(|(marker, count)| **count >= 2 && lower.contains(marker.as_str()))
            .map(|(marker, _)| marker.clone())
            .collect();

        let mut parts = Vec::new();
        if !related_claims.is_empty() {
            parts.push("Related previous claims:".to_string());
            for record in &related_claims {
                parts.push(format!(
                    "- {}: {} ({}%)",
                    record.claim, record.verdict, record.confidence
                ));
            }
        }
        if !warning_patterns.is_empty() {
            parts.push(format!(
                "Warning: Contains known BS patterns: {}",
                warning_patterns.join(", ")
            ));
        }

        MemoryContext {
            context: (!parts.is_empty()).then(|| parts.join("\n")),
            related_claims,
            warning_patterns,
            entities,
        }
    }
}
