use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Completed,
    Crashed,
    TimedOut,
}

impl std::fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecStatus::Completed => f.write_str("completed"),
            ExecStatus::Crashed => f.write_str("crashed"),
            ExecStatus::TimedOut => f.write_str("timed_out"),
        }
    }
}

/// What one implementation did with one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecStatus,
    /// Captured stdout or rendered return value. Empty unless completed.
    pub output: String,
    /// Process exit code; `None` for in-process functions.
    pub exit_code: Option<i32>,
    /// Panic message, signal, spawn failure, truncation note or stderr excerpt.
    pub detail: Option<String>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn completed(output: String, exit_code: Option<i32>, elapsed: Duration) -> Self {
        Self {
            status: ExecStatus::Completed,
            output,
            exit_code,
            detail: None,
            duration_ms: millis(elapsed),
        }
    }

    pub fn crashed(detail: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: ExecStatus::Crashed,
            output: String::new(),
            exit_code: None,
            detail: Some(detail.into()),
            duration_ms: millis(elapsed),
        }
    }

    pub fn timed_out(timeout: Duration, elapsed: Duration) -> Self {
        Self {
            status: ExecStatus::TimedOut,
            output: String::new(),
            exit_code: None,
            detail: Some(format!("exceeded {} ms", timeout.as_millis())),
            duration_ms: millis(elapsed),
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }
}

fn millis(elapsed: Duration) -> u64 {
    elapsed.as_millis().min(u64::MAX as u128) as u64
}
