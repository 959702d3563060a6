use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptStatus {
    Succeeded,
    /// `code` is `None` when the tool could not be started or was killed by
    /// a signal.
    Failed { code: Option<i32> },
}

impl AttemptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptStatus::Succeeded)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AttemptRecord {
    /// 1 for the first invocation, 2 for the retry.
    pub attempt: u8,
    /// Chunking override used for this attempt, if any.
    pub measures_per_chunk: Option<u8>,
    pub status: AttemptStatus,
    pub elapsed_ms: u64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InferenceOutcome {
    Succeeded { attempt: u8 },
    FailedAfterRetry,
}

impl InferenceOutcome {
    pub fn from_attempts(attempts: &[AttemptRecord]) -> Self {
        attempts
            .iter()
            .find(|record| record.status.is_success())
            .map(|record| InferenceOutcome::Succeeded {
                attempt: record.attempt,
            })
            .unwrap_or(InferenceOutcome::FailedAfterRetry)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InferenceOutcome::Succeeded { .. })
    }
}

/// Summary of one extraction run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub audio: String,
    pub target_dir: PathBuf,
    /// Scratch directory used for the run. It no longer exists once the
    /// report is returned.
    pub scratch_dir: PathBuf,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub attempts: Vec<AttemptRecord>,
    pub outcome: InferenceOutcome,
    pub copied: Vec<PathBuf>,
}

impl RunReport {
    pub fn retried(&self) -> bool {
        self.attempts.len() > 1
    }
}
