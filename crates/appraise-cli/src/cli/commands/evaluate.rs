use crate::cli::args::EvaluateArgs;
use crate::exit_codes;
use anyhow::Context;
use appraise_core::providers::browser::WebDriverClient;
use appraise_core::providers::llm::build_client;
use appraise_core::providers::repo::GitHubClient;
use appraise_core::report::console::{console_progress_sink, print_batch_footer};
use appraise_core::{BatchRunner, Evaluator};
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: &Path, args: EvaluateArgs) -> anyhow::Result<i32> {
    let (cfg, store) = super::open(config_path)?;

    let repo = Arc::new(GitHubClient::new(&cfg.github).context("github client")?);
    if !repo.is_authenticated() {
        tracing::warn!("GITHUB_TOKEN not set; GitHub API requests are unauthenticated");
    }
    let llm = build_client(&cfg.llm)?;
    let browser = Arc::new(
        WebDriverClient::new(&cfg.browser, cfg.evaluation.script_timeout())
            .context("webdriver client")?,
    );

    let evaluator = Evaluator::new(store.clone(), repo, llm, browser.clone(), &cfg.evaluation);
    let runner = BatchRunner::new(store, evaluator, browser)
        .with_progress(console_progress_sink(cfg.evaluation.pass_threshold));

    let summary = runner.run_all().await?;
    print_batch_footer(&summary);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(if summary.has_failures() {
        exit_codes::EVALUATION_FAILED
    } else {
        exit_codes::SUCCESS
    })
}
