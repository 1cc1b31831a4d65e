//! Row mapping between SQLite and model types.

use crate::model::{CheckResult, Round, StoredCheckResult, Submission, TaskRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;

fn conversion_error(idx: usize, ty: Type, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, ty, msg.into())
}

pub(crate) fn round_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Round> {
    let raw: i64 = row.get(idx)?;
    u8::try_from(raw)
        .map_err(|e| e.to_string())
        .and_then(Round::try_from)
        .map_err(|msg| conversion_error(idx, Type::Integer, msg))
}

pub(crate) fn timestamp_at(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, Type::Text, format!("bad timestamp '{}': {}", raw, e)))
}

fn json_at<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, Type::Text, e.to_string()))
}

pub(crate) const SUBMISSION_COLUMNS: &str =
    "email, task, round, nonce, repo_url, commit_sha, pages_url, submitted_at";

pub(crate) fn row_to_submission(row: &rusqlite::Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        email: row.get(0)?,
        task: row.get(1)?,
        round: round_at(row, 2)?,
        nonce: row.get(3)?,
        repo_url: row.get(4)?,
        commit_sha: row.get(5)?,
        pages_url: row.get(6)?,
        submitted_at: timestamp_at(row, 7)?,
    })
}

pub(crate) const TASK_COLUMNS: &str =
    "email, task, round, nonce, brief, checks_json, attachments_json, evaluation_url, endpoint, sent_at";

pub(crate) fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        email: row.get(0)?,
        task: row.get(1)?,
        round: round_at(row, 2)?,
        nonce: row.get(3)?,
        brief: row.get(4)?,
        checks: json_at(row, 5)?,
        attachments: json_at(row, 6)?,
        evaluation_url: row.get(7)?,
        endpoint: row.get(8)?,
        sent_at: timestamp_at(row, 9)?,
    })
}

pub(crate) const RESULT_COLUMNS: &str =
    "email, task, round, repo_url, commit_sha, pages_url, evaluated_at, check_name, score, reason, logs";

pub(crate) fn row_to_stored_result(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredCheckResult> {
    Ok(StoredCheckResult {
        email: row.get(0)?,
        task: row.get(1)?,
        round: round_at(row, 2)?,
        repo_url: row.get(3)?,
        commit_sha: row.get(4)?,
        pages_url: row.get(5)?,
        evaluated_at: timestamp_at(row, 6)?,
        result: CheckResult {
            check: row.get(7)?,
            score: row.get(8)?,
            reason: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            logs: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        },
    })
}
