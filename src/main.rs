use anyhow::anyhow;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use veracity_rs::oracle::http::HttpOracle;
use veracity_rs::oracle::search::BraveSearch;
use veracity_rs::oracle::{SearchOracle, SearchRecord};
use veracity_rs::workflow::nodes::ReviewHandler;
use veracity_rs::workflow::ReviewRequest;
use veracity_rs::{Detector, HumanFeedback, ResultRecord, RunOptions, RunOutcome, Verdict};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a single claim
    Check {
        /// The claim to verify
        claim: String,

        /// Skip human review even when uncertainty triggers fire
        #[arg(long)]
        skip_review: bool,

        /// Force human review regardless of confidence
        #[arg(long)]
        force_review: bool,

        /// Use the baseline retry-only variant
        #[arg(long)]
        baseline: bool,

        /// Use the evidence-search variant
        #[arg(long)]
        evidence: bool,

        /// Override the retry budget
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Interactive loop checking claims until 'quit'
    Chat,
}

/// Search fallback when no BRAVE_API_KEY is configured
struct NoSearch;

#[async_trait]
impl SearchOracle for NoSearch {
    async fn search(&self, query: &str) -> SearchRecord {
        SearchRecord::failed(query, "search backend not configured")
    }
}

/// Collects reviewer input on stdin, in-process
struct StdinReviewHandler;

impl ReviewHandler for StdinReviewHandler {
    fn review(&self, request: &ReviewRequest) -> Option<HumanFeedback> {
        println!("{}", request.format_for_human());
        println!("Please provide your assessment:");

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        let verdict = loop {
            print!("Verdict (BS/LEGITIMATE/UNCERTAIN): ");
            io::stdout().flush().ok();
            let line = lines.next()?.ok()?;
            match line.trim().to_uppercase().as_str() {
                "BS" => break Verdict::Bs,
                "LEGITIMATE" => break Verdict::Legitimate,
                "UNCERTAIN" => break Verdict::Uncertain,
                _ => println!("Invalid verdict. Please enter BS, LEGITIMATE, or UNCERTAIN"),
            }
        };

        let confidence = loop {
            print!("Confidence (0-100): ");
            io::stdout().flush().ok();
            let line = lines.next()?.ok()?;
            match line.trim().parse::<u8>() {
                Ok(value) if value <= 100 => break value,
                _ => println!("Confidence must be a number between 0 and 100"),
            }
        };

        print!("Reasoning: ");
        io::stdout().flush().ok();
        let reasoning = lines.next()?.ok()?;

        print!("Additional context (optional, press Enter to skip): ");
        io::stdout().flush().ok();
        let additional = lines.next()?.ok()?;

        Some(HumanFeedback {
            verdict,
            confidence,
            reasoning: reasoning.trim().to_string(),
            additional_context: {
                let trimmed = additional.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            },
        })
    }
}

fn build_detector() -> anyhow::Result<Detector> {
    let oracle = Arc::new(HttpOracle::from_env()?);

    let search: Arc<dyn SearchOracle> = match BraveSearch::from_env() {
        Ok(search) => Arc::new(search),
        Err(e) => {
            log::warn!("Search disabled: {}", e);
            Arc::new(NoSearch)
        }
    };

    Ok(Detector::new(oracle, search).with_review_handler(Arc::new(StdinReviewHandler)))
}

fn print_result(record: &ResultRecord) {
    if record.verdict != Verdict::Error {
        println!("\nVerdict: {}", record.verdict);
        println!("Confidence: {}%", record.confidence);
        println!("Reasoning: {}", record.reasoning);
        if let Some(agent) = &record.analyzing_agent {
            println!("Analyzed by: {}", agent);
        }
        if record.used_search {
            println!("Searches performed: {}", record.sources.len());
        }
        if record.human_reviewed {
            println!("Human reviewed: yes");
        }
    } else {
        println!(
            "\nError: {}",
            record.error.as_deref().unwrap_or("unknown error")
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let detector = build_detector()?;

    match args.command {
        Commands::Check {
            claim,
            skip_review,
            force_review,
            baseline,
            evidence,
            max_retries,
        } => {
            println!("Analyzing...");

            let record = if baseline {
                detector.check_baseline(&claim, max_retries).await
            } else if evidence {
                detector.check_with_evidence(&claim).await
            } else {
                let outcome = detector
                    .run(
                        &claim,
                        RunOptions {
                            max_retries,
                            skip_human_review: skip_review,
                            force_human_review: force_review,
                            session_id: None,
                        },
                    )
                    .await;
                match outcome {
                    RunOutcome::Complete(record) => record,
                    // A stdin handler is registered, so the graph resolves
                    // review synchronously and never interrupts
                    RunOutcome::Pending { session_id } => {
                        return Err(anyhow!("unexpected interrupt in session {}", session_id))
                    }
                }
            };

            print_result(&record);
        }
        Commands::Chat => {
            println!("Claim checker (type 'quit' to exit)");
            println!("{}", "=".repeat(50));

            let stdin = io::stdin();
            loop {
                print!("\nEnter claim: ");
                io::stdout().flush().ok();

                let mut claim = String::new();
                if stdin.lock().read_line(&mut claim)? == 0 {
                    break;
                }
                let claim = claim.trim();

                if matches!(claim.to_lowercase().as_str(), "quit" | "exit" | "q") {
                    println!("Goodbye!");
                    break;
                }
                if claim.is_empty() {
                    continue;
                }

                println!("Analyzing...");
                let outcome = detector.run(claim, RunOptions::default()).await;
                if let RunOutcome::Complete(record) = outcome {
                    print_result(&record);
                }
                println!("{}", "-".repeat(50));
            }
        }
    }

    Ok(())
}
