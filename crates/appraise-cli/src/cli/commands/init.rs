use crate::cli::args::InitArgs;
use crate::exit_codes;
use appraise_core::config::write_sample_config;
use std::path::Path;

pub fn run(config_path: &Path, args: InitArgs) -> anyhow::Result<i32> {
    if config_path.exists() && !args.force {
        println!("Skipped {} (exists, use --force to overwrite)", config_path.display());
    } else {
        write_sample_config(config_path)?;
        println!("Created {}", config_path.display());
    }

    let (cfg, _store) = super::open(config_path)?;
    println!("Database ready at {}", cfg.database.display());
    println!("\nNext steps:");
    println!("  export GITHUB_TOKEN=... LLM_API_KEY=...");
    println!("  appraise import --tasks tasks.jsonl --submissions submissions.jsonl");
    println!("  appraise evaluate");
    Ok(exit_codes::SUCCESS)
}
