// SPDX-License-Identifier: MIT

//! Deterministic parser for free-text oracle responses
//!
//! Models that cannot be schema-constrained answer in a labeled format:
//!
//! ```text
//! VERDICT: [LEGITIMATE/BS]
//! CONFIDENCE: [0-100]
//! REASONING: [analysis]
//! ```
//!
//! The parser locates the first line carrying each label (case-insensitive)
//! and substitutes documented defaults for anything missing or malformed:
//! verdict UNCERTAIN, confidence 50, reasoning = the whole response. It
//! never fails.

use super::{Judgment, Verdict};

/// Default confidence when the CONFIDENCE field is absent or unparseable
pub const DEFAULT_CONFIDENCE: u8 = 50;

/// Parse a labeled free-text response into a [`Judgment`]
pub fn parse_judgment(content: &str) -> Judgment {
    let mut verdict = Verdict::Uncertain;
    let mut confidence = DEFAULT_CONFIDENCE;
    let mut reasoning: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(rest) = strip_label(trimmed, "VERDICT:") {
            // LEGITIMATE is checked first: "BS" is a substring-level trap
            // only if the label carries extra prose, which some models do.
            if rest.to_uppercase().contains("LEGITIMATE") {
                verdict = Verdict::Legitimate;
            } else if rest.to_uppercase().contains("BS") {
                verdict = Verdict::Bs;
            }
        } else if let Some(rest) = strip_label(trimmed, "CONFIDENCE:") {
            if let Some(value) = parse_confidence(rest) {
                confidence = value;
            }
        } else if let Some(rest) = strip_label(trimmed, "REASONING:") {
            if reasoning.is_none() {
                // Reasoning runs to the end of the response, not the line
                let tail = tail_after_label(content, "REASONING:");
                reasoning = Some(tail.unwrap_or_else(|| rest.to_string()));
            }
        }
    }

    Judgment {
        verdict,
        confidence,
        reasoning: reasoning.unwrap_or_else(|| content.trim().to_string()),
    }
}

/// Case-insensitive prefix match; returns the rest of the line
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

/// Everything after the first occurrence of the label, across lines
fn tail_after_label(content: &str, label: &str) -> Option<String> {
    for (i, _) in content.char_indices() {
        let Some(window) = content.get(i..i + label.len()) else {
            continue;
        };
        if window.eq_ignore_ascii_case(label) {
            let tail = content[i + label.len()..].trim();
            return if tail.is_empty() {
                None
            } else {
                Some(tail.to_string())
            };
        }
    }
    None
}

/// Extract the first integer from text like "85", "85%", "[85]"
fn parse_confidence(text: &str) -> Option<u8> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value: u32 = digits.parse().ok()?;
    if value > 100 {
        None
    } else {
        Some(value as u8)
    }
}
