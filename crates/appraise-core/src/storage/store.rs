use super::now_rfc3339;
use super::rows::{
    row_to_stored_result, row_to_submission, row_to_task, RESULT_COLUMNS, SUBMISSION_COLUMNS,
    TASK_COLUMNS,
};
use crate::errors::RegisterError;
use crate::model::{CheckResult, StoredCheckResult, Submission, SubmissionKey, TaskRecord};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created,
    /// Identical (email, task, round, nonce) already present.
    Exists,
}

#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .context("set journal_mode")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)
            .context("apply schema")?;
        Ok(())
    }

    // tasks

    pub fn register_task(&self, task: &TaskRecord) -> anyhow::Result<RegisterOutcome> {
        let conn = self.conn.lock().unwrap();
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM tasks WHERE email=?1 AND task=?2 AND round=?3 AND nonce=?4",
                params![task.email, task.task, task.round.number(), task.nonce],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Ok(RegisterOutcome::Exists);
        }

        conn.execute(
            "INSERT INTO tasks(sent_at, email, task, round, nonce, brief, checks_json, attachments_json, evaluation_url, endpoint)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.sent_at.to_rfc3339(),
                task.email,
                task.task,
                task.round.number(),
                task.nonce,
                task.brief,
                serde_json::to_string(&task.checks)?,
                serde_json::to_string(&task.attachments)?,
                task.evaluation_url,
                task.endpoint,
            ],
        )
        .context("insert task")?;
        Ok(RegisterOutcome::Created)
    }

    /// First task registered for the (actor, task, round) triple.
    pub fn find_task_record(&self, key: &SubmissionKey) -> anyhow::Result<Option<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM tasks WHERE email=?1 AND task=?2 AND round=?3 ORDER BY id ASC LIMIT 1",
            TASK_COLUMNS
        );
        let task = conn
            .query_row(
                &sql,
                params![key.email, key.task, key.round.number()],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    // submissions

    /// Accept a submission only if a task with the same nonce was sent and it
    /// has not been submitted before.
    pub fn register_submission(&self, submission: &Submission) -> Result<(), RegisterError> {
        let conn = self.conn.lock().unwrap();
        let task_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM tasks WHERE email=?1 AND task=?2 AND round=?3 AND nonce=?4",
                params![
                    submission.email,
                    submission.task,
                    submission.round.number(),
                    submission.nonce
                ],
                |r| r.get(0),
            )
            .optional()
            .map_err(anyhow::Error::from)?;
        if task_id.is_none() {
            return Err(RegisterError::NoMatchingTask {
                email: submission.email.clone(),
                task: submission.task.clone(),
                round: submission.round.number(),
                nonce: submission.nonce.clone(),
            });
        }

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM submissions WHERE email=?1 AND task=?2 AND round=?3 AND nonce=?4",
                params![
                    submission.email,
                    submission.task,
                    submission.round.number(),
                    submission.nonce
                ],
                |r| r.get(0),
            )
            .optional()
            .map_err(anyhow::Error::from)?;
        if existing.is_some() {
            return Err(RegisterError::DuplicateSubmission {
                email: submission.email.clone(),
                task: submission.task.clone(),
                round: submission.round.number(),
            });
        }

        conn.execute(
            "INSERT INTO submissions(submitted_at, email, task, round, nonce, repo_url, commit_sha, pages_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                submission.submitted_at.to_rfc3339(),
                submission.email,
                submission.task,
                submission.round.number(),
                submission.nonce,
                submission.repo_url,
                submission.commit_sha,
                submission.pages_url,
            ],
        )
        .map_err(anyhow::Error::from)?;
        Ok(())
    }

    /// All submissions in registration order, irrespective of round.
    pub fn find_submissions_all(&self) -> anyhow::Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("SELECT {} FROM submissions ORDER BY id ASC", SUBMISSION_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_submission)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn submissions_for_actor(&self, email: &str) -> anyhow::Result<Vec<Submission>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM submissions WHERE email=?1 ORDER BY id ASC",
            SUBMISSION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![email], row_to_submission)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // results

    pub fn count_check_results(&self, key: &SubmissionKey) -> anyhow::Result<u64> {
        let conn = self.conn.lock().unwrap();
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM results WHERE email=?1 AND task=?2 AND round=?3",
            params![key.email, key.task, key.round.number()],
            |r| r.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    /// Persist every result for one submission in a single transaction.
    pub fn append_check_results(
        &self,
        submission: &Submission,
        results: &[CheckResult],
    ) -> anyhow::Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("begin results transaction")?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO results(evaluated_at, email, task, round, repo_url, commit_sha, pages_url, check_name, score, reason, logs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            let evaluated_at = now_rfc3339();
            for r in results {
                stmt.execute(params![
                    evaluated_at,
                    submission.email,
                    submission.task,
                    submission.round.number(),
                    submission.repo_url,
                    submission.commit_sha,
                    submission.pages_url,
                    r.check,
                    r.score,
                    r.reason,
                    r.logs,
                ])?;
            }
        }
        tx.commit().context("commit results transaction")?;
        Ok(())
    }

    /// Stored results for one actor, in evaluation order.
    pub fn results_for_actor(&self, email: &str) -> anyhow::Result<Vec<StoredCheckResult>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM results WHERE email=?1 ORDER BY id ASC",
            RESULT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![email], row_to_stored_result)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckSpec, Round};
    use chrono::{TimeZone, Utc};

    fn task(nonce: &str) -> TaskRecord {
        TaskRecord {
            email: "student@example.com".into(),
            task: "sum-of-sales".into(),
            round: Round::First,
            nonce: nonce.into(),
            brief: "Publish a sales summary page".into(),
            checks: vec![
                CheckSpec::parse("js: !!document.querySelector('#total-sales')"),
                CheckSpec::parse("Uses Bootstrap"),
            ],
            attachments: vec![],
            evaluation_url: "https://example.com/notify".into(),
            endpoint: "https://student.example.com/api".into(),
            sent_at: Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap(),
        }
    }

    fn submission(nonce: &str) -> Submission {
        Submission {
            email: "student@example.com".into(),
            task: "sum-of-sales".into(),
            round: Round::First,
            nonce: nonce.into(),
            repo_url: "https://github.com/student/sum-of-sales".into(),
            commit_sha: "abc123".into(),
            pages_url: "https://student.github.io/sum-of-sales/".into(),
            submitted_at: Utc.with_ymd_and_hms(2025, 10, 1, 13, 0, 0).unwrap(),
        }
    }

    fn store() -> Store {
        let store = Store::memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[test]
    fn task_roundtrip_keeps_check_classification() {
        let store = store();
        assert_eq!(store.register_task(&task("n1")).unwrap(), RegisterOutcome::Created);
        assert_eq!(store.register_task(&task("n1")).unwrap(), RegisterOutcome::Exists);

        let found = store
            .find_task_record(&submission("n1").key())
            .unwrap()
            .expect("task present");
        assert_eq!(found, task("n1"));
        assert!(found.checks[0].is_scripted());
        assert!(!found.checks[1].is_scripted());
    }

    #[test]
    fn submission_requires_matching_nonce() {
        let store = store();
        store.register_task(&task("n1")).unwrap();

        let err = store.register_submission(&submission("other")).unwrap_err();
        assert!(matches!(err, RegisterError::NoMatchingTask { .. }));

        store.register_submission(&submission("n1")).unwrap();
        let err = store.register_submission(&submission("n1")).unwrap_err();
        assert!(matches!(err, RegisterError::DuplicateSubmission { .. }));

        let all = store.find_submissions_all().unwrap();
        assert_eq!(all, vec![submission("n1")]);
    }

    #[test]
    fn append_results_is_counted_by_key() {
        let store = store();
        let sub = submission("n1");
        assert_eq!(store.count_check_results(&sub.key()).unwrap(), 0);

        let results = vec![
            CheckResult::new("MIT LICENSE in root", 1.0, "MIT LICENSE found", ""),
            CheckResult::new("Code quality", 0.8, "tidy", "{\"score\":0.8}"),
        ];
        store.append_check_results(&sub, &results).unwrap();
        assert_eq!(store.count_check_results(&sub.key()).unwrap(), 2);

        let stored = store.results_for_actor("student@example.com").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].result, results[0]);
        assert_eq!(stored[1].commit_sha, "abc123");
        assert!(store.results_for_actor("nobody@example.com").unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_across_handles() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("db").join("appraise.db");
        {
            let store = Store::open(&path).unwrap();
            store.init_schema().unwrap();
            store.register_task(&task("n1")).unwrap();
        }
        let store = Store::open(&path).unwrap();
        store.init_schema().unwrap();
        assert!(store
            .find_task_record(&submission("n1").key())
            .unwrap()
            .is_some());
    }
}
