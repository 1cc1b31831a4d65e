//! Batch progress events. The runner emits them; the console layer consumes
//! them via a sink.

use std::sync::Arc;

use crate::model::{CheckResult, SubmissionKey};

#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent<'a> {
    Started {
        index: usize,
        total: usize,
        key: &'a SubmissionKey,
    },
    Evaluated {
        key: &'a SubmissionKey,
        results: &'a [CheckResult],
    },
    Failed {
        key: &'a SubmissionKey,
        error: &'a str,
    },
}

pub type ProgressSink = Arc<dyn Fn(ProgressEvent<'_>) + Send + Sync>;
