//! The checks every submission is judged against.
//!
//! Four static checks always run, in [`StaticCheck::ALL`] order. The task's
//! own checks follow, dispatched on their [`CheckSpec`] variant.

use crate::model::{CheckOutcome, CheckSpec, TaskRecord};

/// Name of the single result recorded when the page cannot be loaded.
pub const DYNAMIC_LOAD_CHECK: &str = "Dynamic checks";

pub const MANUAL_REVIEW_REASON: &str = "Manual review required";

const SCRIPTED_NAME_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticCheck {
    RepoCreatedAfterTask,
    License,
    ReadmeQuality,
    CodeQuality,
}

pub const STATIC_CHECK_COUNT: usize = StaticCheck::ALL.len();

impl StaticCheck {
    pub const ALL: [StaticCheck; 4] = [
        StaticCheck::RepoCreatedAfterTask,
        StaticCheck::License,
        StaticCheck::ReadmeQuality,
        StaticCheck::CodeQuality,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StaticCheck::RepoCreatedAfterTask => "Repo created after task",
            StaticCheck::License => "MIT LICENSE in root",
            StaticCheck::ReadmeQuality => "README.md quality",
            StaticCheck::CodeQuality => "Code quality",
        }
    }
}

impl std::fmt::Display for StaticCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighted criteria for an LLM-scored file.
#[derive(Debug, Clone, Copy)]
pub struct Rubric {
    pub check: StaticCheck,
    /// Repository path of the file being judged.
    pub file: &'static str,
    pub subject: &'static str,
    pub content_label: &'static str,
    pub criteria: &'static [(&'static str, f64)],
}

impl Rubric {
    pub fn total_weight(&self) -> f64 {
        self.criteria.iter().map(|(_, w)| w).sum()
    }
}

pub const README_RUBRIC: Rubric = Rubric {
    check: StaticCheck::ReadmeQuality,
    file: "README.md",
    subject: "README.md file",
    content_label: "README.md content",
    criteria: &[
        ("Has clear title and description", 0.2),
        ("Includes setup instructions", 0.2),
        ("Includes usage instructions", 0.2),
        ("Has code explanation", 0.2),
        ("Mentions license", 0.1),
        ("Professional formatting", 0.1),
    ],
};

pub const CODE_RUBRIC: Rubric = Rubric {
    check: StaticCheck::CodeQuality,
    file: "index.html",
    subject: "code",
    content_label: "Code content",
    criteria: &[
        ("Clean, readable code", 0.3),
        ("Proper structure and organization", 0.2),
        ("Error handling", 0.2),
        ("Comments/documentation", 0.1),
        ("Best practices followed", 0.2),
    ],
};

/// Result name for a task-specific check.
pub fn task_check_name(spec: &CheckSpec) -> String {
    match spec {
        CheckSpec::Scripted(code) => scripted_check_name(code),
        CheckSpec::Descriptive(text) => text.clone(),
    }
}

/// `JS: <first 50 chars>...`
pub fn scripted_check_name(code: &str) -> String {
    let head: String = code.chars().take(SCRIPTED_NAME_CHARS).collect();
    format!("JS: {}...", head)
}

/// Descriptive checks are never automated.
pub fn descriptive_outcome() -> CheckOutcome {
    CheckOutcome::ManualReview {
        reason: MANUAL_REVIEW_REASON.to_string(),
    }
}

/// Number of results one evaluation of `task` records.
pub fn expected_result_count(task: &TaskRecord, page_loaded: bool) -> usize {
    if page_loaded {
        STATIC_CHECK_COUNT + task.checks.len()
    } else {
        STATIC_CHECK_COUNT + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Round;
    use chrono::Utc;

    fn task(checks: &[&str]) -> TaskRecord {
        TaskRecord {
            email: "a@example.com".into(),
            task: "sum-of-sales".into(),
            round: Round::First,
            nonce: "n1".into(),
            brief: String::new(),
            checks: checks.iter().map(|c| CheckSpec::parse(c)).collect(),
            attachments: vec![],
            evaluation_url: String::new(),
            endpoint: String::new(),
            sent_at: Utc::now(),
        }
    }

    #[test]
    fn static_checks_run_in_fixed_order() {
        let names: Vec<_> = StaticCheck::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            [
                "Repo created after task",
                "MIT LICENSE in root",
                "README.md quality",
                "Code quality"
            ]
        );
        assert_eq!(STATIC_CHECK_COUNT, 4);
    }

    #[test]
    fn rubric_weights_sum_to_one() {
        for rubric in [README_RUBRIC, CODE_RUBRIC] {
            assert!(
                (rubric.total_weight() - 1.0).abs() < 1e-9,
                "{} weights sum to {}",
                rubric.check,
                rubric.total_weight()
            );
        }
    }

    #[test]
    fn scripted_name_truncates_by_chars() {
        let code = "é".repeat(60);
        let name = scripted_check_name(&code);
        assert_eq!(name, format!("JS: {}...", "é".repeat(50)));
        assert_eq!(scripted_check_name("document.title"), "JS: document.title...");
    }

    #[test]
    fn descriptive_checks_go_to_manual_review() {
        let spec = CheckSpec::parse("Page shows the total in a #total element");
        assert_eq!(task_check_name(&spec), "Page shows the total in a #total element");
        let result = descriptive_outcome().into_result(task_check_name(&spec));
        assert_eq!(result.score, 0.5);
        assert_eq!(result.reason, "Manual review required");
    }

    #[test]
    fn expected_count_depends_on_page_load() {
        let t = task(&["js: 1 + 1", "looks nice", "js: document.title"]);
        assert_eq!(expected_result_count(&t, true), 7);
        assert_eq!(expected_result_count(&t, false), 5);
        assert_eq!(expected_result_count(&task(&[]), true), 4);
    }
}
