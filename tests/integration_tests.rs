//! Integration tests for the claim-verification pipeline
//!
//! These drive whole graphs end-to-end with scripted mock oracles - no
//! network calls. Mocks count invocations so retry semantics can be
//! asserted exactly.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use veracity_rs::error::OracleError;
use veracity_rs::oracle::{
    Classification, ClaimType, ConfidenceLevel, Judgment, Oracle, SearchOracle, SearchRecord,
    Verdict,
};
use veracity_rs::workflow::{HumanFeedback, RunOptions, RunOutcome};
use veracity_rs::Detector;

// ============================================================================
// Mock components
// ============================================================================

/// Scripted oracle: judge responses are consumed front to back, `None`
/// entries simulate a failed call. Every method counts its invocations.
struct MockOracle {
    judgments: Mutex<VecDeque<Option<Judgment>>>,
    classification: Mutex<Option<Classification>>,
    completions: Mutex<VecDeque<String>>,
    judge_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    complete_calls: AtomicUsize,
}

impl MockOracle {
    fn new() -> Self {
        Self {
            judgments: Mutex::new(VecDeque::new()),
            classification: Mutex::new(None),
            completions: Mutex::new(VecDeque::new()),
            judge_calls: AtomicUsize::new(0),
            classify_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
        }
    }

    fn with_judgments(self, responses: Vec<Option<Judgment>>) -> Self {
        *self.judgments.lock().unwrap() = responses.into();
        self
    }

    fn with_classification(self, claim_type: ClaimType) -> Self {
        *self.classification.lock().unwrap() = Some(Classification {
            claim_type,
            confidence_level: ConfidenceLevel::High,
        });
        self
    }

    fn with_completions(self, responses: Vec<&str>) -> Self {
        *self.completions.lock().unwrap() = responses.into_iter().map(String::from).collect();
        self
    }

    fn judgment(verdict: Verdict, confidence: u8) -> Judgment {
        Judgment {
            verdict,
            confidence,
            reasoning: format!("{} at {}%", verdict, confidence),
        }
    }

    fn total_calls(&self) -> usize {
        self.judge_calls.load(Ordering::SeqCst)
            + self.classify_calls.load(Ordering::SeqCst)
            + self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn judge(&self, _system: &str, _user: &str) -> Result<Judgment, OracleError> {
        self.judge_calls.fetch_add(1, Ordering::SeqCst);
        match self.judgments.lock().unwrap().pop_front() {
            Some(Some(judgment)) => Ok(judgment),
            Some(None) => Err(OracleError::InvalidResponse("scripted failure".to_string())),
            None => Err(OracleError::InvalidResponse("script exhausted".to_string())),
        }
    }

    async fn classify(&self, _system: &str, _user: &str) -> Result<Classification, OracleError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.classification
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| OracleError::InvalidResponse("no classification".to_string()))
    }

    async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| OracleError::InvalidResponse("script exhausted".to_string()))
    }
}

/// Search oracle returning the same fact set for every query
struct MockSearch {
    facts: Vec<String>,
    calls: AtomicUsize,
}

impl MockSearch {
    fn with_facts(facts: Vec<&str>) -> Self {
        Self {
            facts: facts.into_iter().map(String::from).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn empty() -> Self {
        Self::with_facts(vec![])
    }
}

#[async_trait]
impl SearchOracle for MockSearch {
    async fn search(&self, query: &str) -> SearchRecord {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.facts.is_empty() {
            SearchRecord::failed(query, "no results")
        } else {
            SearchRecord::ok(query, self.facts.clone())
        }
    }
}

fn detector(oracle: Arc<MockOracle>, search: Arc<MockSearch>) -> Detector {
    Detector::new(oracle, search)
}

// ============================================================================
// Baseline variant: retry cycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_baseline_success_first_try() {
    let oracle = Arc::new(MockOracle::new().with_judgments(vec![Some(MockOracle::judgment(
        Verdict::Legitimate,
        90,
    ))]));
    let search = Arc::new(MockSearch::empty());

    let record = detector(oracle.clone(), search)
        .check_baseline("The Boeing 747 has four engines", None)
        .await;

    assert_eq!(record.verdict, Verdict::Legitimate);
    assert_eq!(record.confidence, 90);
    assert!(!record.reasoning.is_empty());
    assert_eq!(oracle.judge_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_baseline_retries_then_succeeds() {
    // Fails exactly twice, then succeeds: detection must run k+1 = 3 times
    let oracle = Arc::new(MockOracle::new().with_judgments(vec![
        None,
        None,
        Some(MockOracle::judgment(Verdict::Bs, 85)),
    ]));
    let search = Arc::new(MockSearch::empty());

    let record = detector(oracle.clone(), search)
        .check_baseline("Planes can fly backwards", Some(3))
        .await;

    assert_eq!(record.verdict, Verdict::Bs);
    assert_eq!(record.confidence, 85);
    assert_eq!(oracle.judge_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_baseline_retry_exhaustion_is_error_not_loop() {
    let oracle = Arc::new(MockOracle::new()); // every judge call fails
    let search = Arc::new(MockSearch::empty());

    let record = detector(oracle.clone(), search)
        .check_baseline("Unverifiable claim", Some(3))
        .await;

    assert_eq!(record.verdict, Verdict::Error);
    assert_eq!(record.confidence, 0);
    assert!(record.error.is_some());
    // One attempt per remaining budget slot, then terminal error
    assert_eq!(oracle.judge_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_empty_claim_never_touches_oracle() {
    let oracle = Arc::new(MockOracle::new());
    let search = Arc::new(MockSearch::empty());
    let d = detector(oracle.clone(), search);

    let record = d.check_baseline("   ", None).await;
    assert_eq!(record.verdict, Verdict::Error);
    assert_eq!(record.confidence, 0);
    assert!(record.error.is_some());

    let outcome = d.run("", RunOptions::default()).await;
    let record = outcome.into_result().unwrap();
    assert_eq!(record.verdict, Verdict::Error);

    assert_eq!(oracle.total_calls(), 0);
}

// ============================================================================
// Evidence variant: search, synthesis, revision
// ============================================================================

#[tokio::test]
async fn test_evidence_refutation_flips_verdict() {
    // Initial LEGITIMATE at 65 (below the 70 threshold), evidence refutes:
    // final verdict BS at exactly 80
    let oracle = Arc::new(
        MockOracle::new()
            .with_judgments(vec![Some(MockOracle::judgment(Verdict::Legitimate, 65))])
            .with_completions(vec![
                "SUMMARY: The records contradict the claim.\nASSESSMENT: REFUTES\nKEY FACTS: registry data",
            ]),
    );
    let search = Arc::new(MockSearch::with_facts(vec![
        "Registry data shows the opposite of the claim in question",
    ]));

    let record = detector(oracle, search.clone())
        .check_with_evidence("The Concorde could fly at Mach 5")
        .await;

    assert_eq!(record.verdict, Verdict::Bs);
    assert_eq!(record.confidence, 80);
    assert!(record.used_search);
    assert!(!record.sources.is_empty());
    // Three generated queries, one search each
    assert_eq!(search.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_evidence_confirmation_boosts_confidence() {
    let oracle = Arc::new(
        MockOracle::new()
            .with_judgments(vec![Some(MockOracle::judgment(Verdict::Legitimate, 60))])
            .with_completions(vec![
                "SUMMARY: Multiple sources agree.\nASSESSMENT: SUPPORTS\nKEY FACTS: consistent records",
            ]),
    );
    let search = Arc::new(MockSearch::with_facts(vec![
        "Multiple independent sources corroborate the claim directly",
    ]));

    let record = detector(oracle, search)
        .check_with_evidence("The Concorde could fly at Mach 2.04")
        .await;

    assert_eq!(record.verdict, Verdict::Legitimate);
    assert_eq!(record.confidence, 75); // 60 + 15 boost
}

#[tokio::test]
async fn test_evidence_inconclusive_applies_penalty() {
    // Search finds nothing usable: verdict kept, confidence dropped by the
    // penalty, never below the floor
    let oracle = Arc::new(
        MockOracle::new().with_judgments(vec![Some(MockOracle::judgment(Verdict::Legitimate, 65))]),
    );
    let search = Arc::new(MockSearch::empty());

    let record = detector(oracle, search)
        .check_with_evidence("An obscure and unsearchable claim")
        .await;

    assert_eq!(record.verdict, Verdict::Legitimate);
    assert_eq!(record.confidence, 55); // 65 - 10
    assert!(record.used_search);
}

#[tokio::test]
async fn test_evidence_high_confidence_skips_search() {
    let oracle = Arc::new(
        MockOracle::new().with_judgments(vec![Some(MockOracle::judgment(Verdict::Bs, 95))]),
    );
    let search = Arc::new(MockSearch::with_facts(vec!["unused"]));

    let record = detector(oracle, search.clone())
        .check_with_evidence("Commercial planes can fly to the moon")
        .await;

    assert_eq!(record.verdict, Verdict::Bs);
    assert_eq!(record.confidence, 95);
    assert!(!record.used_search);
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Review variant: routing, experts, uncertainty, interrupt/resume
// ============================================================================

#[tokio::test]
async fn test_confident_expert_completes_without_review() {
    let oracle = Arc::new(
        MockOracle::new()
            .with_classification(ClaimType::Technical)
            .with_judgments(vec![Some(MockOracle::judgment(Verdict::Legitimate, 95))]),
    );
    let search = Arc::new(MockSearch::empty());

    let outcome = detector(oracle, search)
        .run("Water boils at 100 degrees Celsius", RunOptions::default())
        .await;

    let record = outcome.into_result().expect("should complete");
    assert_eq!(record.verdict, Verdict::Legitimate);
    assert_eq!(record.claim_type, Some(ClaimType::Technical));
    assert_eq!(record.analyzing_agent.as_deref(), Some("Technical Expert"));
    assert!(!record.human_reviewed);
    assert!(record.uncertainty_score.unwrap() < 0.2);
}

#[tokio::test]
async fn test_router_failure_defaults_to_general_expert() {
    // No classification scripted: the router must fall back, not fail
    let oracle = Arc::new(
        MockOracle::new().with_judgments(vec![Some(MockOracle::judgment(Verdict::Bs, 90))]),
    );
    let search = Arc::new(MockSearch::empty());

    let outcome = detector(oracle, search)
        .run("Eating chocolate cures all diseases", RunOptions::default())
        .await;

    let record = outcome.into_result().expect("should complete");
    assert_eq!(record.claim_type, Some(ClaimType::General));
    assert_eq!(record.analyzing_agent.as_deref(), Some("General Expert"));
}

#[tokio::test]
async fn test_low_confidence_interrupts_and_resumes() {
    let oracle = Arc::new(
        MockOracle::new()
            .with_classification(ClaimType::Technical)
            .with_judgments(vec![Some(MockOracle::judgment(Verdict::Uncertain, 30))]),
    );
    let search = Arc::new(MockSearch::empty());
    let d = detector(oracle, search);

    let outcome = d
        .run(
            "A startup just invented teleportation",
            RunOptions {
                session_id: Some("review-1".to_string()),
                ..Default::default()
            },
        )
        .await;

    // Low confidence plus an uncertain verdict: graph pauses for a human
    let RunOutcome::Pending { session_id } = outcome else {
        panic!("expected a pending interrupt");
    };
    assert_eq!(session_id, "review-1");

    let record = d
        .resume(
            "review-1",
            HumanFeedback {
                verdict: Verdict::Bs,
                confidence: 95,
                reasoning: "No such device exists".to_string(),
                additional_context: None,
            },
        )
        .await
        .expect("resume should complete");

    assert_eq!(record.verdict, Verdict::Bs);
    assert_eq!(record.confidence, 95);
    assert!(record.human_reviewed);
    assert!(record.reasoning.starts_with("Human review:"));
}

#[tokio::test]
async fn test_resume_unknown_session_fails() {
    let oracle = Arc::new(MockOracle::new());
    let search = Arc::new(MockSearch::empty());

    let result = detector(oracle, search)
        .resume(
            "never-started",
            HumanFeedback {
                verdict: Verdict::Bs,
                confidence: 50,
                reasoning: "n/a".to_string(),
                additional_context: None,
            },
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_skip_review_option_suppresses_interrupt() {
    let oracle = Arc::new(
        MockOracle::new()
            .with_classification(ClaimType::Technical)
            .with_judgments(vec![Some(MockOracle::judgment(Verdict::Uncertain, 30))]),
    );
    let search = Arc::new(MockSearch::empty());

    let outcome = detector(oracle, search)
        .run(
            "A startup just invented teleportation",
            RunOptions {
                skip_human_review: true,
                ..Default::default()
            },
        )
        .await;

    let record = outcome.into_result().expect("should complete");
    assert_eq!(record.verdict, Verdict::Uncertain);
    assert!(!record.human_reviewed);
}

#[tokio::test]
async fn test_force_review_option_interrupts_confident_run() {
    let oracle = Arc::new(
        MockOracle::new()
            .with_classification(ClaimType::Technical)
            .with_judgments(vec![Some(MockOracle::judgment(Verdict::Legitimate, 95))]),
    );
    let search = Arc::new(MockSearch::empty());

    let outcome = detector(oracle, search)
        .run(
            "Water boils at 100 degrees Celsius",
            RunOptions {
                force_human_review: true,
                session_id: Some("forced".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(outcome, RunOutcome::Pending { .. }));
}

#[tokio::test]
async fn test_current_events_expert_searches_once() {
    let oracle = Arc::new(
        MockOracle::new()
            .with_classification(ClaimType::CurrentEvent)
            .with_completions(vec![
                "SEARCH: spacex launch count this week",
                "VERDICT: BS\nCONFIDENCE: 85\nREASONING: Records show only two launches this week.",
            ]),
    );
    let search = Arc::new(MockSearch::with_facts(vec![
        "SpaceX conducted two launches this week according to the manifest",
    ]));

    let outcome = detector(oracle.clone(), search.clone())
        .run(
            "SpaceX launched 50 rockets yesterday",
            RunOptions {
                skip_human_review: true,
                ..Default::default()
            },
        )
        .await;

    let record = outcome.into_result().expect("should complete");
    assert_eq!(record.verdict, Verdict::Bs);
    assert_eq!(record.confidence, 85);
    assert!(record.used_search);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    // Bounded tool loop: initial completion plus exactly one follow-up
    assert_eq!(oracle.complete_calls.load(Ordering::SeqCst), 2);
}

// ============================================================================
// Result-record contract
// ============================================================================

#[tokio::test]
async fn test_every_outcome_is_well_formed() {
    let claims = ["A plausible claim", "x", "Another claim entirely"];
    let verdicts = [
        Some(MockOracle::judgment(Verdict::Legitimate, 88)),
        Some(MockOracle::judgment(Verdict::Bs, 91)),
        Some(MockOracle::judgment(Verdict::Uncertain, 77)),
    ];

    for (claim, judgment) in claims.iter().zip(verdicts) {
        let oracle = Arc::new(
            MockOracle::new()
                .with_classification(ClaimType::General)
                .with_judgments(vec![judgment]),
        );
        let search = Arc::new(MockSearch::empty());

        let outcome = detector(oracle, search)
            .run(
                claim,
                RunOptions {
                    skip_human_review: true,
                    ..Default::default()
                },
            )
            .await;

        let record = outcome.into_result().expect("should complete");
        assert!(matches!(
            record.verdict,
            Verdict::Bs | Verdict::Legitimate | Verdict::Uncertain | Verdict::Error
        ));
        if record.verdict != Verdict::Error {
            assert!(record.confidence <= 100);
            assert!(!record.reasoning.is_empty());
        }
    }
}
