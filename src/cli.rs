//! Command-line host for the error learning engine
//!
//! The binary owns what the engine deliberately does not: persistence (a
//! JSON snapshot store), scheduling (one operation per invocation), and
//! exposure. It loads the snapshot, runs one engine operation, and writes
//! the snapshot back.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::LearningSystem;
use crate::model::{
    Category, ErrorPattern, ErrorReport, LearningStatistics, OptimizationSuggestion,
    OptimizationType, StatsWindow, SuggestionStatus,
};
use crate::store::{snapshot, PatternFilter, SuggestionFilter};

/// errlearn - learn from recurring test and API failures
#[derive(Parser, Debug)]
#[command(name = "errlearn")]
#[command(version)]
#[command(about = "Learn recurring error patterns and generate optimization suggestions", long_about = None)]
pub struct Args {
    /// Snapshot store path (defaults to the configured location)
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Verbosity level: default (warnings), -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record one failure occurrence
    Record {
        /// Reporting subsystem, e.g. "SelfTestingFramework"
        #[arg(long)]
        source: String,

        /// Full error message
        #[arg(long)]
        message: String,

        /// Failing test case name
        #[arg(long)]
        test_case: Option<String>,

        /// API under test
        #[arg(long)]
        api: Option<String>,

        /// HTTP method
        #[arg(long)]
        method: Option<String>,

        /// API endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// HTTP status code
        #[arg(long)]
        status: Option<u16>,

        /// Stack trace
        #[arg(long)]
        stack: Option<String>,
    },

    /// Record failures from a JSON-lines file of reports
    Ingest {
        /// File with one JSON report per line
        file: PathBuf,
    },

    /// Run one pattern-analysis batch over unanalyzed entries
    Analyze {
        /// Entries to fetch in this batch
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// List error patterns
    Patterns {
        /// Filter by category (http, network, security, data, general)
        #[arg(long)]
        category: Option<Category>,

        /// Filter by API endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Minimum occurrence count
        #[arg(long)]
        min_occurrences: Option<u64>,

        /// Minimum severity level (1-5)
        #[arg(long)]
        min_severity: Option<u8>,

        /// Minimum confidence score (0.0-1.0)
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Show the most frequently observed patterns
    Top {
        /// Patterns to show
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Minimum severity level (1-5)
        #[arg(long, default_value_t = 1)]
        min_severity: u8,
    },

    /// Generate optimization suggestions for one pattern
    Suggest {
        /// Pattern id
        pattern_id: Uuid,
    },

    /// List optimization suggestions
    Suggestions {
        /// Only suggestions generated for this pattern
        #[arg(long)]
        pattern: Option<Uuid>,

        /// Filter by suggestion type
        #[arg(long = "type")]
        suggestion_type: Option<OptimizationType>,

        /// Filter by status
        #[arg(long)]
        status: Option<SuggestionStatus>,

        /// Minimum priority (1-5)
        #[arg(long)]
        min_priority: Option<u8>,

        /// Minimum confidence score (0.0-1.0)
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Update the review status of one suggestion
    Review {
        /// Suggestion id
        suggestion_id: Uuid,

        /// New status (generated, reviewed, approved, rejected, implemented)
        #[arg(long)]
        status: SuggestionStatus,

        /// Reviewer notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show learning statistics
    Stats {
        /// Window start (RFC 3339, e.g. 2026-01-01T00:00:00Z)
        #[arg(long)]
        from: Option<DateTime<Utc>>,

        /// Window end (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
    },
}

/// Execute one subcommand against the snapshot store
pub async fn run(args: Args) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let store_path = match args.store.clone().or_else(|| config.store_path.clone()) {
        Some(path) => path,
        None => Config::default_store_path()?,
    };

    let store = Arc::new(
        snapshot::load_store(&store_path)
            .with_context(|| format!("Failed to load store {}", store_path.display()))?,
    );
    let system = LearningSystem::new(
        store.clone(),
        store.clone(),
        store.clone(),
        config.engine.clone(),
    );

    match args.command {
        Commands::Record {
            source,
            message,
            test_case,
            api,
            method,
            endpoint,
            status,
            stack,
        } => {
            let mut report = ErrorReport::new(source, message);
            report.test_case_name = test_case;
            report.api_name = api;
            report.http_method = method;
            report.api_endpoint = endpoint;
            report.http_status_code = status;
            report.stack_trace = stack;

            let entry = system.record_error(report).await?;
            let verb = if entry.contributed_to_pattern {
                "matched existing pattern"
            } else {
                "created new pattern"
            };
            println!(
                "{} entry {} ({})",
                "Recorded".green().bold(),
                entry.id,
                verb
            );
        }

        Commands::Ingest { file } => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut recorded = 0usize;
            let mut skipped = 0usize;
            for (line_number, line) in contents.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let report: ErrorReport = serde_json::from_str(line).with_context(|| {
                    format!("Invalid report on line {} of {}", line_number + 1, file.display())
                })?;
                match system.record_error(report).await {
                    Ok(_) => recorded += 1,
                    Err(err) => {
                        eprintln!(
                            "{} line {}: {}",
                            "Skipped".yellow(),
                            line_number + 1,
                            err
                        );
                        skipped += 1;
                    }
                }
            }
            println!(
                "{} {} reports ({} skipped)",
                "Ingested".green().bold(),
                recorded,
                skipped
            );
        }

        Commands::Analyze { batch_size } => {
            let batch_size = batch_size.unwrap_or(system.params().default_batch_size);
            let updated = system.analyze_patterns(batch_size).await?;
            println!(
                "{} batch complete: {} pattern(s) reinforced",
                "Analysis".green().bold(),
                updated
            );
        }

        Commands::Patterns {
            category,
            endpoint,
            min_occurrences,
            min_severity,
            min_confidence,
        } => {
            let filter = PatternFilter {
                category,
                api_endpoint: endpoint,
                min_occurrence_count: min_occurrences,
                min_severity_level: min_severity,
                min_confidence_score: min_confidence,
                limit: None,
            };
            let patterns = system.error_patterns(&filter).await?;
            if patterns.is_empty() {
                println!("No matching patterns.");
            }
            for pattern in &patterns {
                print_pattern(pattern);
            }
        }

        Commands::Top {
            limit,
            min_severity,
        } => {
            let patterns = system.most_frequent_patterns(limit, min_severity).await?;
            if patterns.is_empty() {
                println!("No matching patterns.");
            }
            for pattern in &patterns {
                print_pattern(pattern);
            }
        }

        Commands::Suggest { pattern_id } => {
            let suggestions = system.generate_suggestions(pattern_id).await?;
            if suggestions.is_empty() {
                println!("No suggestions generated for {}.", pattern_id);
            }
            for suggestion in &suggestions {
                print_suggestion(suggestion);
            }
        }

        Commands::Suggestions {
            pattern,
            suggestion_type,
            status,
            min_priority,
            min_confidence,
        } => {
            let suggestions = match pattern {
                Some(pattern_id) => system.suggestions_for_pattern(pattern_id).await?,
                None => {
                    let filter = SuggestionFilter {
                        suggestion_type,
                        status,
                        min_priority,
                        min_confidence_score: min_confidence,
                        limit: None,
                    };
                    system.optimization_suggestions(&filter).await?
                }
            };
            if suggestions.is_empty() {
                println!("No matching suggestions.");
            }
            for suggestion in &suggestions {
                print_suggestion(suggestion);
            }
        }

        Commands::Review {
            suggestion_id,
            status,
            notes,
        } => {
            let updated = system
                .update_suggestion_status(suggestion_id, status, notes)
                .await?;
            println!(
                "{} {} -> {}",
                "Reviewed".green().bold(),
                updated.id,
                status_label(updated.status)
            );
        }

        Commands::Stats { from, to } => {
            let window = StatsWindow::between(from, to);
            let stats = system.learning_statistics(&window).await?;
            print_statistics(&stats);
        }
    }

    snapshot::save_store(&store, &store_path)
        .await
        .with_context(|| format!("Failed to save store {}", store_path.display()))?;

    Ok(())
}

fn severity_label(level: u8) -> colored::ColoredString {
    let label = format!("S{}", level);
    match level {
        5 => label.red().bold(),
        4 => label.red(),
        3 => label.yellow(),
        2 => label.cyan(),
        _ => label.normal(),
    }
}

fn status_label(status: SuggestionStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        SuggestionStatus::Generated => label.cyan(),
        SuggestionStatus::Reviewed => label.yellow(),
        SuggestionStatus::Approved => label.green(),
        SuggestionStatus::Implemented => label.green().bold(),
        SuggestionStatus::Rejected => label.red(),
    }
}

fn print_pattern(pattern: &ErrorPattern) {
    println!(
        "{} {} {}/{} x{} conf {:.2}",
        severity_label(pattern.severity_level),
        pattern.id,
        pattern.category,
        pattern.subcategory,
        pattern.occurrence_count,
        pattern.confidence_score
    );
    println!("    {}", pattern.description);
}

fn print_suggestion(suggestion: &OptimizationSuggestion) {
    println!(
        "{} P{} {} {} conf {:.2}",
        status_label(suggestion.status),
        suggestion.priority,
        suggestion.id,
        suggestion.suggestion_type,
        suggestion.confidence_score
    );
    println!("    {}", suggestion.title.bold());
    println!("    {}", suggestion.description);
}

fn print_statistics(stats: &LearningStatistics) {
    println!("{}", "Learning Statistics".bold());
    println!("─────────────────────────────────────");
    println!("Patterns:              {}", stats.total_error_patterns);
    println!("History entries:       {}", stats.total_learning_entries);
    println!("Suggestions:           {}", stats.total_optimization_suggestions);
    println!("Unanalyzed entries:    {}", stats.unanalyzed_entries);
    println!("Pending suggestions:   {}", stats.pending_suggestions);
    println!(
        "Avg pattern confidence: {:.3}",
        stats.average_pattern_confidence
    );

    let mut metrics: Vec<(&String, &f64)> = stats.effectiveness_metrics.iter().collect();
    metrics.sort_by(|a, b| a.0.cmp(b.0));
    println!();
    println!("{}", "Effectiveness".bold());
    for (key, value) in metrics {
        println!("  {:<28} {}", key, value);
    }

    if !stats.top_error_categories.is_empty() {
        let mut categories: Vec<(&String, &u64)> = stats.top_error_categories.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1));
        println!();
        println!("{}", "Top categories".bold());
        for (category, count) in categories {
            println!("  {:<28} {}", category, count);
        }
    }
}
