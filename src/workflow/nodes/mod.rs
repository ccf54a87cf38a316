// SPDX-License-Identifier: MIT

//! Processing nodes - the units of work the graphs are assembled from

mod detect;
mod evidence;
mod experts;
mod output;
mod review;
mod revision;
mod router;
mod uncertainty;

pub use detect::{DetectNode, RetryNode};
pub use evidence::{
    extract_facts, generate_search_queries, AnalyzeEvidenceNode, ExtractFactsNode,
    GenerateQueriesNode, SearchWebNode,
};
pub use experts::{CurrentEventsExpertNode, ExpertNode};
pub use output::FormatOutputNode;
pub use review::{HumanReviewNode, ReviewHandler};
pub use revision::ReviseVerdictNode;
pub use router::RouterNode;
pub use uncertainty::{calculate_uncertainty, UncertaintyDetectorNode};
