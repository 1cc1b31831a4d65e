use crate::cli::args::{OutputFormat, ResultsArgs};
use crate::exit_codes;
use appraise_core::report::{console, json};
use std::path::Path;

pub fn run(config_path: &Path, args: ResultsArgs) -> anyhow::Result<i32> {
    let (cfg, store) = super::open(config_path)?;
    let results = store.results_for_actor(&args.email)?;

    match args.format {
        OutputFormat::Json => println!("{}", json::results_json(&args.email, &results)?),
        OutputFormat::Text => {
            console::print_stored_results(&args.email, &results, cfg.evaluation.pass_threshold)
        }
    }
    Ok(exit_codes::SUCCESS)
}
