use crate::cli::args::SubmissionsArgs;
use crate::exit_codes;
use appraise_core::report::console::print_submissions;
use std::path::Path;

pub fn run(config_path: &Path, args: SubmissionsArgs) -> anyhow::Result<i32> {
    let (_cfg, store) = super::open(config_path)?;
    let submissions = store.submissions_for_actor(&args.email)?;
    print_submissions(&args.email, &submissions);
    Ok(exit_codes::SUCCESS)
}
