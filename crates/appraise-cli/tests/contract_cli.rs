use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

const TASKS: &str = r#"{"email":"a@example.com","task":"sum-of-sales","round":1,"nonce":"n1","brief":"Publish a sales page","checks":["js: !!document.querySelector('#total-sales')","Uses Bootstrap"],"sent_at":"2025-10-01T12:00:00Z"}
{"email":"a@example.com","task":"sum-of-sales","round":2,"nonce":"n2","brief":"Add a region filter","checks":[],"sent_at":"2025-10-02T12:00:00Z"}
"#;

const SUBMISSIONS: &str = r#"{"email":"a@example.com","task":"sum-of-sales","round":1,"nonce":"n1","repo_url":"https://github.com/a/sum-of-sales","commit_sha":"abc123","pages_url":"https://a.github.io/sum-of-sales/"}
"#;

fn appraise(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("appraise").unwrap();
    cmd.current_dir(dir)
        .env("DATABASE_PATH", dir.join("db/appraise.db"))
        .env_remove("APPRAISE_CONFIG")
        .env_remove("LLM_API_PROVIDER")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn version_prints_package_version() {
    let dir = tempdir().unwrap();
    appraise(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn init_writes_config_and_database() {
    let dir = tempdir().unwrap();
    appraise(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created appraise.yaml"));

    assert!(dir.path().join("appraise.yaml").exists());
    assert!(dir.path().join("db/appraise.db").exists());

    // second run keeps the existing file
    appraise(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));
}

#[test]
fn import_then_query_by_email() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("tasks.jsonl"), TASKS).unwrap();
    fs::write(dir.path().join("subs.jsonl"), SUBMISSIONS).unwrap();

    appraise(dir.path())
        .args(["import", "--tasks", "tasks.jsonl", "--submissions", "subs.jsonl"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Tasks: 2 created"))
        .stderr(predicate::str::contains("Submissions: 1 created, 0 rejected"));

    appraise(dir.path())
        .args(["submissions", "a@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sum-of-sales (Round 1)"))
        .stdout(predicate::str::contains("abc123"));

    let out = appraise(dir.path())
        .args(["results", "a@example.com", "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["email"], "a@example.com");
    assert_eq!(v["count"], 0);
}

#[test]
fn rejected_import_lines_exit_one() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("subs.jsonl"), SUBMISSIONS).unwrap();

    // no task registered for this submission
    appraise(dir.path())
        .args(["import", "--submissions", "subs.jsonl"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no matching task"));
}

#[test]
fn explicit_missing_config_is_config_error() {
    let dir = tempdir().unwrap();
    appraise(dir.path())
        .args(["--config", "missing.yaml", "results", "a@example.com"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn invalid_threshold_is_config_error() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("appraise.yaml"),
        "evaluation:\n  pass_threshold: 1.5\n",
    )
    .unwrap();
    appraise(dir.path())
        .args(["submissions", "a@example.com"])
        .assert()
        .code(2);
}

#[test]
fn import_without_inputs_is_rejected() {
    let dir = tempdir().unwrap();
    appraise(dir.path())
        .arg("import")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to import"));
}

#[test]
fn malformed_timeout_env_is_config_error() {
    let dir = tempdir().unwrap();
    appraise(dir.path())
        .env("APPRAISE_PAGE_LOAD_TIMEOUT_MS", "soon")
        .args(["submissions", "a@example.com"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("APPRAISE_PAGE_LOAD_TIMEOUT_MS"));
}
