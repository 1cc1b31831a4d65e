pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  sent_at TEXT NOT NULL,
  email TEXT NOT NULL,
  task TEXT NOT NULL,
  round INTEGER NOT NULL,
  nonce TEXT NOT NULL UNIQUE,
  brief TEXT NOT NULL,
  checks_json TEXT NOT NULL DEFAULT '[]',
  attachments_json TEXT NOT NULL DEFAULT '[]',
  evaluation_url TEXT NOT NULL DEFAULT '',
  endpoint TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS submissions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  submitted_at TEXT NOT NULL,
  email TEXT NOT NULL,
  task TEXT NOT NULL,
  round INTEGER NOT NULL,
  nonce TEXT NOT NULL,
  repo_url TEXT NOT NULL,
  commit_sha TEXT NOT NULL,
  pages_url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS results (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  evaluated_at TEXT NOT NULL,
  email TEXT NOT NULL,
  task TEXT NOT NULL,
  round INTEGER NOT NULL,
  repo_url TEXT NOT NULL,
  commit_sha TEXT NOT NULL,
  pages_url TEXT NOT NULL,
  check_name TEXT NOT NULL,
  score REAL NOT NULL,
  reason TEXT,
  logs TEXT
);

CREATE INDEX IF NOT EXISTS idx_tasks_key ON tasks(email, task, round);
CREATE INDEX IF NOT EXISTS idx_submissions_key ON submissions(email, task, round);
CREATE INDEX IF NOT EXISTS idx_results_key ON results(email, task, round);
"#;
