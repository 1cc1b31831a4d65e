//! Inspectors turn a submission into check results.
//!
//! Neither inspector returns an error: every failure becomes a
//! [`CheckOutcome`](crate::model::CheckOutcome) scored by the usual policy.

pub mod dynamic;
pub mod rubric;
pub mod static_checks;

pub use dynamic::{DynamicInspector, DynamicRun, PageState};
pub use static_checks::StaticInspector;
