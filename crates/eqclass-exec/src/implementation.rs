use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, RecvTimeoutError};

use eqclass_explore::case::InputCase;

use crate::result::ExecutionResult;

/// Something that turns a case into an observable result.
///
/// Implementations must bound every call by `timeout` and release what
/// they acquired on every exit path.
pub trait Implementation: Send + Sync {
    fn name(&self) -> &str;

    fn execute(&self, case: &InputCase, timeout: Duration) -> ExecutionResult;
}

type CaseFn = dyn Fn(&InputCase) -> String + Send + Sync;

/// In-process implementation backed by a closure.
///
/// Each call runs on its own thread. A panic is reported as `crashed`.
/// On timeout the thread is abandoned; it keeps running until the
/// closure returns, but its result is never read.
#[derive(Clone)]
pub struct FnImplementation {
    name: String,
    func: Arc<CaseFn>,
}

impl FnImplementation {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&InputCase) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl std::fmt::Debug for FnImplementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnImplementation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Implementation for FnImplementation {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, case: &InputCase, timeout: Duration) -> ExecutionResult {
        let start = Instant::now();
        let (tx, rx) = bounded(1);
        let func = Arc::clone(&self.func);
        let case = case.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("eqclass-{}", self.name))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| func(&case)));
                // Receiver is gone after a timeout.
                let _ = tx.send(outcome);
            });
        if let Err(e) = spawned {
            return ExecutionResult::crashed(
                format!("cannot start worker thread: {e}"),
                start.elapsed(),
            );
        }

        match rx.recv_timeout(timeout) {
            Ok(Ok(output)) => ExecutionResult::completed(output, None, start.elapsed()),
            Ok(Err(payload)) => ExecutionResult::crashed(
                format!("panicked: {}", panic_message(payload.as_ref())),
                start.elapsed(),
            ),
            Err(RecvTimeoutError::Timeout) => ExecutionResult::timed_out(timeout, start.elapsed()),
            Err(RecvTimeoutError::Disconnected) => {
                ExecutionResult::crashed("worker exited without a result", start.elapsed())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
