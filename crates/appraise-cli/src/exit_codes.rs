//! Process exit codes. Scripts driving batch evaluations rely on them.

pub const SUCCESS: i32 = 0;
pub const EVALUATION_FAILED: i32 = 1; // at least one submission could not be evaluated
pub const CONFIG_ERROR: i32 = 2; // bad config, unreachable store or browser, bad input files
