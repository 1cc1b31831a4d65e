pub mod checks;
pub mod config;
pub mod engine;
pub mod errors;
pub mod inspect;
pub mod model;
pub mod providers;
pub mod report;
pub mod storage;

pub use config::AppraiseConfig;
pub use engine::batch::{BatchRunner, BatchSummary};
pub use engine::orchestrator::{Evaluator, SubmissionOutcome};
pub use model::{CheckOutcome, CheckResult, CheckSpec, Round, Submission, SubmissionKey, TaskRecord};
pub use storage::Store;
