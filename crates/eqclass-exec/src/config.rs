//! Process invocation settings: input channel and output caps.

use serde::{Deserialize, Serialize};

/// How a case's values reach a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// One value per line on stdin, in declaration order.
    #[default]
    Stdin,
    /// Values appended to the argument list.
    Args,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    pub input: InputMode,
    /// Stdout kept per invocation (default: 1 MiB). The rest is drained
    /// and dropped, and the result is flagged as truncated.
    pub max_output_bytes: usize,
    /// Stderr kept for diagnostics (default: 4 KiB).
    pub max_stderr_bytes: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            input: InputMode::Stdin,
            max_output_bytes: 1024 * 1024, // 1 MiB
            max_stderr_bytes: 4 * 1024,
        }
    }
}
