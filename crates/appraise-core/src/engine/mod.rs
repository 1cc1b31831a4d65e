pub mod batch;
pub mod orchestrator;

pub use batch::{BatchRunner, BatchSummary, SubmissionReport, SubmissionStatus};
pub use orchestrator::{mean_score, Evaluator, SubmissionOutcome};
