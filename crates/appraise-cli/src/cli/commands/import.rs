use crate::cli::args::ImportArgs;
use crate::exit_codes;
use anyhow::Context;
use appraise_core::storage::RegisterOutcome;
use appraise_core::{Store, Submission, TaskRecord};
use std::path::Path;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ImportCounts {
    pub created: usize,
    pub existing: usize,
    pub rejected: usize,
}

pub fn run(config_path: &Path, args: ImportArgs) -> anyhow::Result<i32> {
    if args.tasks.is_none() && args.submissions.is_none() {
        anyhow::bail!("nothing to import: pass --tasks and/or --submissions");
    }
    let (_cfg, store) = super::open(config_path)?;

    let mut rejected = 0;
    // tasks first so submissions in the same run can match them
    if let Some(path) = &args.tasks {
        let counts = import_tasks(&store, &read(path)?);
        eprintln!(
            "Tasks: {} created, {} already present, {} rejected",
            counts.created, counts.existing, counts.rejected
        );
        rejected += counts.rejected;
    }
    if let Some(path) = &args.submissions {
        let counts = import_submissions(&store, &read(path)?);
        eprintln!(
            "Submissions: {} created, {} rejected",
            counts.created, counts.rejected
        );
        rejected += counts.rejected;
    }

    Ok(if rejected > 0 {
        exit_codes::EVALUATION_FAILED
    } else {
        exit_codes::SUCCESS
    })
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Non-blank lines with their 1-based line numbers.
fn lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
}

pub(crate) fn import_tasks(store: &Store, text: &str) -> ImportCounts {
    let mut counts = ImportCounts::default();
    for (no, line) in lines(text) {
        let task: TaskRecord = match serde_json::from_str(line) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("  line {}: invalid task: {}", no, e);
                counts.rejected += 1;
                continue;
            }
        };
        match store.register_task(&task) {
            Ok(RegisterOutcome::Created) => counts.created += 1,
            Ok(RegisterOutcome::Exists) => counts.existing += 1,
            Err(e) => {
                eprintln!("  line {}: {:#}", no, e);
                counts.rejected += 1;
            }
        }
    }
    counts
}

pub(crate) fn import_submissions(store: &Store, text: &str) -> ImportCounts {
    let mut counts = ImportCounts::default();
    for (no, line) in lines(text) {
        let submission: Submission = match serde_json::from_str(line) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("  line {}: invalid submission: {}", no, e);
                counts.rejected += 1;
                continue;
            }
        };
        match store.register_submission(&submission) {
            Ok(()) => counts.created += 1,
            Err(e) => {
                eprintln!("  line {}: {}", no, e);
                counts.rejected += 1;
            }
        }
    }
    counts
}
