use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "appraise",
    version,
    about = "Evaluate deployed student web apps: repository checks, LLM rubrics and live page assertions"
)]
pub struct Cli {
    /// Config file (YAML)
    #[arg(
        long,
        global = true,
        env = "APPRAISE_CONFIG",
        default_value = appraise_core::config::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a starter config and create the database
    Init(InitArgs),
    /// Register tasks and submissions from JSON-lines files
    Import(ImportArgs),
    /// Evaluate every submission that has no results yet
    Evaluate(EvaluateArgs),
    /// Show stored results for a student
    Results(ResultsArgs),
    /// List submissions for a student
    Submissions(SubmissionsArgs),
    Version,
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// JSON-lines file of task records
    #[arg(long)]
    pub tasks: Option<PathBuf>,

    /// JSON-lines file of submissions
    #[arg(long)]
    pub submissions: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Print the batch summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
pub struct ResultsArgs {
    pub email: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct SubmissionsArgs {
    pub email: String,
}
