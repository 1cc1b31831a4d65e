use std::sync::Arc;

use crate::engine::batch::{BatchSummary, SubmissionStatus};
use crate::engine::orchestrator::mean_score;
use crate::model::{CheckResult, StoredCheckResult, Submission};
use crate::report::progress::{ProgressEvent, ProgressSink};

#[must_use]
pub fn format_check_line(result: &CheckResult, threshold: f64) -> String {
    let icon = if result.passed(threshold) { "✓" } else { "✗" };
    format!(
        "  {} {}: {:.2} - {}",
        icon, result.check, result.score, result.reason
    )
}

#[must_use]
pub fn format_overall_line(results: &[CheckResult]) -> String {
    format!("  Overall score: {:.2}", mean_score(results))
}

pub fn print_check_results(results: &[CheckResult], threshold: f64) {
    eprintln!("{}", format_overall_line(results));
    for r in results {
        eprintln!("{}", format_check_line(r, threshold));
    }
}

/// Sink printing the operator view of a batch to stderr.
pub fn console_progress_sink(threshold: f64) -> ProgressSink {
    Arc::new(move |event: ProgressEvent<'_>| match event {
        ProgressEvent::Started { index, total, key } => {
            eprintln!();
            eprintln!("[{}/{}] Evaluating {}", index, total, key);
        }
        ProgressEvent::Evaluated { results, .. } => print_check_results(results, threshold),
        ProgressEvent::Failed { error, .. } => eprintln!("  ✗ evaluation failed: {}", error),
    })
}

pub fn print_batch_footer(summary: &BatchSummary) {
    eprintln!();
    for report in &summary.reports {
        let status = match &report.status {
            SubmissionStatus::Evaluated { checks, mean_score } => {
                format!("{:.2} ({} checks)", mean_score, checks)
            }
            SubmissionStatus::AlreadyEvaluated => "skipped (already evaluated)".to_string(),
            SubmissionStatus::MissingTask => "skipped (no matching task)".to_string(),
            SubmissionStatus::Failed { error } => format!("FAILED: {}", error),
        };
        eprintln!("  {:<50} {}", report.key.to_string(), status);
    }
    eprintln!(
        "\nSummary: {} total, {} evaluated, {} already evaluated, {} missing task, {} failed",
        summary.total,
        summary.evaluated,
        summary.skipped_existing,
        summary.skipped_missing_task,
        summary.failed
    );
}

/// Stored results for one actor, grouped per evaluated submission, to stdout.
pub fn print_stored_results(email: &str, results: &[StoredCheckResult], threshold: f64) {
    if results.is_empty() {
        println!("No results for {}", email);
        return;
    }

    let mut start = 0;
    while start < results.len() {
        let head = &results[start];
        let end = results[start..]
            .iter()
            .position(|r| r.task != head.task || r.round != head.round)
            .map_or(results.len(), |n| start + n);
        let group: Vec<CheckResult> = results[start..end].iter().map(|r| r.result.clone()).collect();

        println!();
        println!("{} - {} (Round {})", head.email, head.task, head.round);
        println!("  Evaluated at: {}", head.evaluated_at.to_rfc3339());
        println!("  Commit: {}  Pages: {}", head.commit_sha, head.pages_url);
        println!("{}", format_overall_line(&group));
        for r in &group {
            println!("{}", format_check_line(r, threshold));
        }
        start = end;
    }
}

pub fn print_submissions(email: &str, submissions: &[Submission]) {
    if submissions.is_empty() {
        println!("No submissions for {}", email);
        return;
    }
    for s in submissions {
        println!(
            "{} (Round {})  {}  {}  commit {}  submitted {}",
            s.task,
            s.round,
            s.repo_url,
            s.pages_url,
            s.commit_sha,
            s.submitted_at.to_rfc3339()
        );
    }
}
