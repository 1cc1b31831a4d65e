use super::args::*;
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use appraise_core::config::{load_config, AppraiseConfig};
use appraise_core::Store;
use std::path::Path;

pub mod evaluate;
pub mod import;
pub mod init;
pub mod results;
pub mod submissions;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => init::run(&cli.config, args),
        Command::Import(args) => import::run(&cli.config, args),
        Command::Evaluate(args) => evaluate::run(&cli.config, args).await,
        Command::Results(args) => results::run(&cli.config, args),
        Command::Submissions(args) => submissions::run(&cli.config, args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

/// Load config and open the store with its schema applied.
pub(crate) fn open(config_path: &Path) -> anyhow::Result<(AppraiseConfig, Store)> {
    let cfg = load_config(config_path)?;
    let store = Store::open(&cfg.database)
        .with_context(|| format!("failed to open database {}", cfg.database.display()))?;
    store.init_schema()?;
    Ok((cfg, store))
}
