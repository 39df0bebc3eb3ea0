//! Markdown summary generation
//!
//! This module renders a human-readable markdown summary of a run report:
//! run information, per-category tallies and every source that did not end
//! in a clean success.

use crate::crawler::CrawlStatus;
use crate::output::json_store::write_atomic;
use crate::output::report::{PersistStatus, RunReport, SkipReason, SourceOutcome};
use crate::output::traits::PersistResult;
use std::path::Path;

/// Writes the markdown summary of a run to `output_path`
pub fn write_markdown_summary(report: &RunReport, output_path: &Path) -> PersistResult<()> {
    write_atomic(output_path, &format_markdown_summary(report))
}

/// Formats a run report as markdown
pub fn format_markdown_summary(report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str("# URL Harvest Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    if let Some(finished) = &report.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = report.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
            duration,
            duration / 60.0
        ));
    }
    md.push_str(&format!(
        "- **Status**: {}\n",
        if report.cancelled { "cancelled" } else { "completed" }
    ));
    if let Some(hash) = &report.categories_hash {
        md.push_str(&format!("- **Categories Hash**: {}\n", hash));
    }
    md.push('\n');

    // Per-category breakdown
    let summaries = report.summaries();
    md.push_str("## Categories\n\n");
    md.push_str("| Category | Sources | Success | Below Minimum | Errors | Skipped | URLs Collected | URLs Stored |\n");
    md.push_str("|----------|---------|---------|---------------|--------|---------|----------------|-------------|\n");
    for s in &summaries {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            s.category,
            s.sources,
            s.succeeded,
            s.below_minimum,
            s.errors,
            s.skipped,
            s.urls_collected,
            s.urls_stored.map_or("-".to_string(), |n| n.to_string())
        ));
    }
    md.push('\n');

    // Sources needing attention
    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        md.push_str("## Sources Needing Attention\n\n");
        md.push_str("| Category | Source | Problem |\n");
        md.push_str("|----------|--------|---------|\n");
        for entry in failures {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                entry.category,
                entry.source,
                describe_problem(&entry.outcome).replace('|', "\\|")
            ));
        }
        md.push('\n');
    }

    md
}

fn describe_problem(outcome: &SourceOutcome) -> String {
    match outcome {
        SourceOutcome::Skipped(SkipReason::NoCrawlerAvailable { domain }) => {
            format!("no crawler for {}", domain)
        }
        SourceOutcome::Skipped(SkipReason::DuplicateDomain { first_source }) => {
            format!("domain already crawled via {}", first_source)
        }
        SourceOutcome::Skipped(SkipReason::Cancelled) => "cancelled".to_string(),
        SourceOutcome::Skipped(SkipReason::CategoryTargetReached { target }) => {
            format!("category already holds {} URLs", target)
        }
        SourceOutcome::Skipped(SkipReason::CrawlerFiltered { crawler }) => {
            format!("crawler {} not selected", crawler)
        }
        SourceOutcome::Crawled {
            status, persist, ..
        } => {
            let mut problems = Vec::new();
            match status {
                CrawlStatus::Success => {}
                CrawlStatus::BelowMinimumYield { required } => {
                    problems.push(format!("below minimum yield of {}", required))
                }
                CrawlStatus::CrawlerError { message } => {
                    problems.push(format!("crawler error: {}", message))
                }
            }
            if let PersistStatus::Failed { message } = persist {
                problems.push(format!("persist failed: {}", message));
            }
            problems.join("; ")
        }
    }
}
