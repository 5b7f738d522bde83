use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::unbounded;
use rayon::prelude::*;

use eqclass_exec::implementation::Implementation;
use eqclass_explore::case::InputCase;

use crate::error::HarnessError;
use crate::limits::RunLimits;
use crate::log::{LogEmitter, LogEntry, LogLevel};
use crate::report::RunReport;
use crate::verdict::{classify, CaseVerdict, Normalization, Verdict};

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Per-invocation bound (default: 1 s).
    pub timeout: Duration,
    /// Worker threads (default: 1, sequential).
    pub workers: usize,
    pub normalization: Normalization,
    pub limits: RunLimits,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1000),
            workers: 1,
            normalization: Normalization::Exact,
            limits: RunLimits::default(),
        }
    }
}

/// Runs a reference and a subject over the same cases and classifies
/// each pair of results.
pub struct DifferentialExecutor {
    reference: Arc<dyn Implementation>,
    subject: Arc<dyn Implementation>,
    config: RunConfig,
}

impl DifferentialExecutor {
    pub fn new(
        reference: Arc<dyn Implementation>,
        subject: Arc<dyn Implementation>,
        config: RunConfig,
    ) -> Self {
        Self {
            reference,
            subject,
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Reference first, then subject, each bounded by the timeout.
    pub fn run_case(&self, case: &InputCase) -> CaseVerdict {
        let reference = self.reference.execute(case, self.config.timeout);
        let subject = self.subject.execute(case, self.config.timeout);
        let verdict = classify(&reference, &subject, &self.config.normalization);
        CaseVerdict {
            case: case.clone(),
            verdict,
            reference,
            subject,
        }
    }

    /// Execute every case. Never stops early; the report lists every
    /// verdict in case-id order whatever order workers finished in.
    pub fn run(
        &self,
        cases: &[InputCase],
        log: Option<&LogEmitter>,
    ) -> Result<RunReport, HarnessError> {
        let limits = &self.config.limits;
        limits.check_workers(self.config.workers)?;
        limits.check_timeout(self.config.timeout)?;
        limits.check_cases(cases.len())?;

        let start = Instant::now();
        emit(
            log,
            LogEntry::new(LogLevel::Info, "run_start").with_details(serde_json::json!({
                "reference": self.reference.name(),
                "subject": self.subject.name(),
                "cases": cases.len(),
                "workers": self.config.workers,
                "timeout_ms": self.timeout_ms(),
                "normalization": self.config.normalization.name(),
            })),
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .thread_name(|i| format!("eqclass-worker-{i}"))
            .build()?;

        let (tx, rx) = unbounded();
        pool.install(|| {
            cases.par_iter().for_each_with(tx, |tx, case| {
                let verdict = self.run_case(case);
                log_case(log, &verdict);
                // The receiver outlives the pool.
                let _ = tx.send(verdict);
            });
        });
        let verdicts: Vec<CaseVerdict> = rx.iter().collect();

        let report = RunReport::new(
            self.reference.name(),
            self.subject.name(),
            self.timeout_ms(),
            self.config.workers,
            self.config.normalization.name(),
            verdicts,
        );
        emit(
            log,
            LogEntry::new(LogLevel::Info, "run_complete")
                .with_verdict(report.status.to_string())
                .with_duration_ms(start.elapsed().as_millis() as u64)
                .with_details(serde_json::json!({
                    "total": report.total,
                    "matched": report.matched,
                    "mismatched": report.mismatched,
                    "errored": report.errored,
                })),
        );
        if let Some(log) = log {
            let _ = log.flush();
        }
        Ok(report)
    }

    fn timeout_ms(&self) -> u64 {
        self.config.timeout.as_millis() as u64
    }
}

fn log_case(log: Option<&LogEmitter>, verdict: &CaseVerdict) {
    let Some(log) = log else {
        return;
    };
    let (level, event) = match verdict.verdict {
        Verdict::Match => (LogLevel::Debug, "case_verdict"),
        Verdict::Mismatch => (LogLevel::Warn, "case_mismatch"),
        Verdict::Error { .. } => (LogLevel::Warn, "case_error"),
    };
    if !log.enabled(level) {
        return;
    }
    let mut entry = LogEntry::new(level, event)
        .with_case(verdict.case.id, verdict.case.label())
        .with_verdict(verdict.verdict.label())
        .with_duration_ms(verdict.reference.duration_ms + verdict.subject.duration_ms);
    if let Some(reason) = verdict.reason() {
        entry = entry.with_details(serde_json::json!({ "reason": reason }));
    }
    emit(Some(log), entry);
}

fn emit(log: Option<&LogEmitter>, entry: LogEntry) {
    if let Some(log) = log {
        // A broken log sink never fails the run.
        let _ = log.emit_entry(entry);
    }
}
