use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "appraise.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraiseConfig {
    pub database: PathBuf,
    pub evaluation: EvaluationSettings,
    pub github: GitHubSettings,
    pub llm: LlmSettings,
    pub browser: BrowserSettings,
}

impl Default for AppraiseConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".appraise/appraise.db"),
            evaluation: EvaluationSettings::default(),
            github: GitHubSettings::default(),
            llm: LlmSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Bound on page navigation, in milliseconds.
    pub page_load_timeout_ms: u64,
    /// Bound on a single in-page check script, in milliseconds.
    pub script_timeout_ms: u64,
    /// README characters fed to the rubric prompt.
    pub readme_excerpt_chars: usize,
    /// index.html characters fed to the rubric prompt.
    pub code_excerpt_chars: usize,
    /// Score at or above which a check is shown as passed.
    pub pass_threshold: f64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            page_load_timeout_ms: 15_000,
            script_timeout_ms: 15_000,
            readme_excerpt_chars: 2000,
            code_excerpt_chars: 3000,
            pass_threshold: 0.7,
        }
    }
}

impl EvaluationSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub api_url: String,
    /// Owner used when a repository URL carries only a name.
    pub owner: Option<String>,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            owner: None,
            token: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// openai | anthropic | fake
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: 800,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// chromedriver / geckodriver endpoint
    pub webdriver_url: String,
    pub headless: bool,
    /// Ceiling on any single WebDriver HTTP call.
    pub request_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            request_timeout_secs: 120,
        }
    }
}

/// Load config from YAML and overlay environment variables.
///
/// A missing file is only tolerated for the default path; an explicitly named
/// file must exist.
pub fn load_config(path: &Path) -> Result<AppraiseConfig, ConfigError> {
    let mut cfg = if path.exists() {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
        serde_yaml::from_str::<AppraiseConfig>(&raw)
            .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?
    } else if path == Path::new(DEFAULT_CONFIG_PATH) {
        AppraiseConfig::default()
    } else {
        return Err(ConfigError(format!(
            "config file not found: {}",
            path.display()
        )));
    };

    cfg.apply_env(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

impl AppraiseConfig {
    /// Overlay environment values. `lookup` is injected so tests need not touch
    /// the process environment. Fails only on values that cannot be parsed.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let non_empty = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("DATABASE_PATH") {
            self.database = PathBuf::from(v);
        }
        if let Some(v) = non_empty("GITHUB_TOKEN") {
            self.github.token = Some(v);
        }
        if let Some(v) = non_empty("GITHUB_USERNAME") {
            self.github.owner = Some(v);
        }
        if let Some(v) = non_empty("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = non_empty("LLM_API_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = non_empty("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = non_empty("LLM_API_BASE_URL") {
            self.llm.base_url = Some(v);
        }
        if let Some(v) = non_empty("APPRAISE_WEBDRIVER_URL") {
            self.browser.webdriver_url = v;
        }
        let timeout = ["APPRAISE_PAGE_LOAD_TIMEOUT_MS", "PLAYWRIGHT_TIMEOUT"]
            .into_iter()
            .find_map(|k| non_empty(k).map(|v| (k, v)));
        if let Some((key, raw)) = timeout {
            self.evaluation.page_load_timeout_ms = raw.trim().parse::<u64>().map_err(|e| {
                ConfigError(format!("{} must be milliseconds, got '{}': {}", key, raw, e))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ev = &self.evaluation;
        if ev.page_load_timeout_ms == 0 || ev.script_timeout_ms == 0 {
            return Err(ConfigError("evaluation timeouts must be > 0".into()));
        }
        if ev.readme_excerpt_chars == 0 || ev.code_excerpt_chars == 0 {
            return Err(ConfigError("excerpt budgets must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&ev.pass_threshold) {
            return Err(ConfigError(format!(
                "pass_threshold {} outside [0, 1]",
                ev.pass_threshold
            )));
        }
        if self.github.timeout_secs == 0
            || self.llm.timeout_secs == 0
            || self.browser.request_timeout_secs == 0
        {
            return Err(ConfigError("http timeouts must be > 0".into()));
        }
        Ok(())
    }
}

const SAMPLE_CONFIG: &str = r#"# appraise configuration
database: .appraise/appraise.db

evaluation:
  page_load_timeout_ms: 15000
  script_timeout_ms: 15000
  readme_excerpt_chars: 2000
  code_excerpt_chars: 3000
  pass_threshold: 0.7

github:
  api_url: https://api.github.com
  # owner: your-github-user     (or GITHUB_USERNAME)
  # token comes from GITHUB_TOKEN
  timeout_secs: 30
  max_retries: 3

llm:
  provider: openai              # openai | anthropic | fake
  model: gpt-4o-mini
  # base_url: https://aipipe.org/openai/v1
  # api key comes from LLM_API_KEY
  temperature: 0.0
  max_tokens: 800
  timeout_secs: 60

browser:
  webdriver_url: http://localhost:9515
  headless: true
  request_timeout_secs: 120
"#;

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError(format!("failed to create {}: {}", parent.display(), e)))?;
    }
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn sample_config_parses_to_defaults() {
        let cfg: AppraiseConfig = serde_yaml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(cfg.evaluation.page_load_timeout_ms, 15_000);
        assert_eq!(cfg.evaluation.readme_excerpt_chars, 2000);
        assert_eq!(cfg.evaluation.code_excerpt_chars, 3000);
        assert_eq!(cfg.llm.provider, "openai");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_overlay_wins_over_file() {
        let env: HashMap<&str, &str> = [
            ("GITHUB_TOKEN", "ghp_test"),
            ("GITHUB_USERNAME", "course-bot"),
            ("LLM_API_PROVIDER", "anthropic"),
            ("PLAYWRIGHT_TIMEOUT", "5000"),
            ("LLM_MODEL", "  "),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppraiseConfig::default();
        cfg.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(cfg.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(cfg.github.owner.as_deref(), Some("course-bot"));
        assert_eq!(cfg.llm.provider, "anthropic");
        assert_eq!(cfg.evaluation.page_load_timeout_ms, 5000);
        // blank values are ignored
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn validate_rejects_bad_threshold_and_zero_timeouts() {
        let mut cfg = AppraiseConfig::default();
        cfg.evaluation.pass_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AppraiseConfig::default();
        cfg.evaluation.page_load_timeout_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(&tmp.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut cfg: AppraiseConfig =
            serde_yaml::from_str("evaluation:\n  pass_threshold: 0.5\n").unwrap();
        cfg.apply_env(|_| None).unwrap();
        assert_eq!(cfg.evaluation.pass_threshold, 0.5);
        assert_eq!(cfg.evaluation.code_excerpt_chars, 3000);
        assert_eq!(cfg.browser.webdriver_url, "http://localhost:9515");
        assert_eq!(cfg.browser.request_timeout_secs, 120);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn malformed_timeout_env_is_rejected() {
        let mut cfg = AppraiseConfig::default();
        let err = cfg
            .apply_env(|k| (k == "PLAYWRIGHT_TIMEOUT").then(|| "15s".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PLAYWRIGHT_TIMEOUT"), "{}", err);
        assert_eq!(cfg.evaluation.page_load_timeout_ms, 15_000);

        // the specific variable wins over the legacy one
        let mut cfg = AppraiseConfig::default();
        cfg.apply_env(|k| match k {
            "APPRAISE_PAGE_LOAD_TIMEOUT_MS" => Some("800".to_string()),
            "PLAYWRIGHT_TIMEOUT" => Some("bogus".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.evaluation.page_load_timeout_ms, 800);
    }

    #[test]
    fn write_sample_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("appraise.yaml");
        write_sample_config(&path).unwrap();
        assert!(path.exists());
    }
}
