use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use eqclass_explore::case::InputCase;

use crate::config::{ExecConfig, InputMode};
use crate::implementation::Implementation;
use crate::result::ExecutionResult;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("empty command line")]
    EmptyCommand,

    #[error("cannot start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("output reader for '{program}' failed: {reason}")]
    Reader { program: String, reason: String },
}

/// An external program run once per case.
///
/// Every invocation gets its own current-thread Tokio runtime. The child
/// is killed and reaped when the timeout expires, and any output it
/// produced is discarded.
#[derive(Debug, Clone)]
pub struct ProcessImplementation {
    name: String,
    program: String,
    args: Vec<String>,
    config: ExecConfig,
}

impl ProcessImplementation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        let name = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            name,
            program,
            args,
            config: ExecConfig::default(),
        }
    }

    /// Split a command line on whitespace: first word is the program.
    pub fn from_command_line(command: &str) -> Result<Self, ExecError> {
        let mut words = command.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(ExecError::EmptyCommand)?;
        Ok(Self::new(program, words.collect()))
    }

    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    async fn run(&self, case: &InputCase, timeout: Duration, start: Instant) -> ExecutionResult {
        let deadline = tokio::time::Instant::now() + timeout;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        match self.config.input {
            InputMode::Stdin => {
                command.stdin(Stdio::piped());
            }
            InputMode::Args => {
                command.args(case.rendered_values()).stdin(Stdio::null());
            }
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = ExecError::Spawn {
                    program: self.program.clone(),
                    source,
                };
                return ExecutionResult::crashed(err.to_string(), start.elapsed());
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let payload: String = case
                .rendered_values()
                .into_iter()
                .map(|v| v + "\n")
                .collect();
            tokio::spawn(async move {
                // A child that exits without reading closes the pipe early.
                let _ = stdin.write_all(payload.as_bytes()).await;
            });
        }
        let stdout = tokio::spawn(read_capped(child.stdout.take(), self.config.max_output_bytes));
        let stderr = tokio::spawn(read_capped(child.stderr.take(), self.config.max_stderr_bytes));

        let status = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                let _ = child.kill().await;
                let err = ExecError::Wait {
                    program: self.program.clone(),
                    source,
                };
                return ExecutionResult::crashed(err.to_string(), start.elapsed());
            }
            Err(_) => {
                let _ = child.kill().await;
                stdout.abort();
                stderr.abort();
                return ExecutionResult::timed_out(timeout, start.elapsed());
            }
        };

        // A grandchild may hold the pipe open past the child's exit.
        let (output, truncated) = match tokio::time::timeout_at(deadline, stdout).await {
            Ok(Ok(captured)) => captured,
            Ok(Err(join)) => {
                let err = ExecError::Reader {
                    program: self.program.clone(),
                    reason: join.to_string(),
                };
                return ExecutionResult::crashed(err.to_string(), start.elapsed());
            }
            Err(_) => return ExecutionResult::timed_out(timeout, start.elapsed()),
        };
        let (errput, _) = match tokio::time::timeout_at(deadline, stderr).await {
            Ok(Ok(captured)) => captured,
            _ => (Vec::new(), false),
        };

        let detail = describe(&output, truncated, &errput, self.config.max_output_bytes);
        let output = String::from_utf8_lossy(&output).into_owned();
        match status.code() {
            Some(code) => {
                ExecutionResult::completed(output, Some(code), start.elapsed()).with_detail(detail)
            }
            None => ExecutionResult::crashed(termination(status), start.elapsed()),
        }
    }
}

impl Implementation for ProcessImplementation {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, case: &InputCase, timeout: Duration) -> ExecutionResult {
        let start = Instant::now();
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => return ExecutionResult::crashed(ExecError::Runtime(e).to_string(), start.elapsed()),
        };
        runtime.block_on(self.run(case, timeout, start))
    }
}

/// Read to end, keeping at most `cap` bytes. Returns the kept bytes and
/// whether anything was dropped.
async fn read_capped<R>(reader: Option<R>, cap: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut truncated = false;
    let Some(mut reader) = reader else {
        return (kept, truncated);
    };
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(kept.len());
                if n > room {
                    truncated = true;
                }
                kept.extend_from_slice(&buf[..n.min(room)]);
            }
        }
    }
    (kept, truncated)
}

fn describe(output: &[u8], truncated: bool, stderr: &[u8], cap: usize) -> Option<String> {
    let mut notes = Vec::new();
    if truncated {
        notes.push(format!("stdout truncated at {cap} bytes ({} kept)", output.len()));
    }
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        notes.push(format!("stderr: {stderr}"));
    }
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}

#[cfg(unix)]
fn termination(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {signal}"),
        None => format!("terminated abnormally: {status}"),
    }
}

#[cfg(not(unix))]
fn termination(status: ExitStatus) -> String {
    format!("terminated abnormally: {status}")
}
