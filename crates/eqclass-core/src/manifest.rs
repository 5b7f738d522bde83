//! Suite manifest: explicit reference/subject pairing.
//!
//! ```json
//! { "suites": [
//!     { "name": "eqClass01",
//!       "partition": "partitions/inside_outside.json",
//!       "reference": { "program": "./bin/sample01", "source": "Samples/eqClass01/main.c" },
//!       "subject": { "program": "./bin/example01", "input": "stdin" },
//!       "timeout_ms": 500 } ] }
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use eqclass_exec::config::{ExecConfig, InputMode};
use eqclass_exec::process::ProcessImplementation;
use eqclass_explore::case::InputCase;
use eqclass_explore::sampler::{RandomSampler, DEFAULT_SEED};

use crate::error::HarnessError;
use crate::executor::{DifferentialExecutor, RunConfig};
use crate::log::{LogEmitter, LogEntry, LogLevel};
use crate::pipeline::{build_cases, load_model};
use crate::report::SuiteReport;

pub const FRAGMENT_START: &str = "Start Semantic Matching";
pub const FRAGMENT_END: &str = "End Semantic Matching";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteManifest {
    pub suites: Vec<SuiteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteEntry {
    pub name: String,
    pub partition: PathBuf,
    pub reference: ImplSpec,
    pub subject: ImplSpec,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Seeded samples appended after the deterministic cases.
    #[serde(default)]
    pub sample: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// How to run one side of a suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub input: InputMode,
    /// Source file whose marked fragment is shown in the report.
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl ImplSpec {
    fn implementation(&self, base: &Path, name: &str) -> ProcessImplementation {
        let program = if self.program.contains('/') && Path::new(&self.program).is_relative() {
            base.join(&self.program).to_string_lossy().into_owned()
        } else {
            self.program.clone()
        };
        ProcessImplementation::new(program, self.args.clone())
            .with_config(ExecConfig {
                input: self.input,
                ..ExecConfig::default()
            })
            .with_name(name)
    }
}

/// Read a manifest and return it with the directory its paths are relative to.
pub fn load_manifest(path: &Path) -> Result<(SuiteManifest, PathBuf), HarnessError> {
    let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: SuiteManifest =
        serde_json::from_str(&text).map_err(|e| HarnessError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    if manifest.suites.is_empty() {
        return Err(HarnessError::Manifest {
            path: path.to_path_buf(),
            reason: "no suites listed".to_string(),
        });
    }
    let mut names = std::collections::HashSet::new();
    if let Some(dup) = manifest.suites.iter().find(|s| !names.insert(s.name.as_str())) {
        return Err(HarnessError::Manifest {
            path: path.to_path_buf(),
            reason: format!("duplicate suite name '{}'", dup.name),
        });
    }
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((manifest, base))
}

/// Text between the start and end marker lines, markers excluded.
/// `None` when either marker is missing.
pub fn extract_fragment(source: &str) -> Option<String> {
    let mut lines = source.lines();
    lines.by_ref().find(|line| line.contains(FRAGMENT_START))?;
    let mut fragment = String::new();
    for line in lines {
        if line.contains(FRAGMENT_END) {
            return Some(fragment);
        }
        fragment.push_str(line);
        fragment.push('\n');
    }
    None
}

fn read_fragment(base: &Path, source: Option<&PathBuf>) -> Result<Option<String>, HarnessError> {
    let Some(source) = source else {
        return Ok(None);
    };
    let path = base.join(source);
    let text = std::fs::read_to_string(&path).map_err(|source| HarnessError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(extract_fragment(&text))
}

/// One suite with everything resolved, ready to execute.
struct PreparedSuite {
    name: String,
    cases: Vec<InputCase>,
    executor: DifferentialExecutor,
    reference_fragment: Option<String>,
    subject_fragment: Option<String>,
}

fn prepare(
    suite: &SuiteEntry,
    base: &Path,
    base_config: &RunConfig,
) -> Result<PreparedSuite, HarnessError> {
    let limits = &base_config.limits;
    let model = load_model(&base.join(&suite.partition), limits)?;
    let sampler = suite
        .sample
        .map(|count| RandomSampler::new(suite.seed.unwrap_or(DEFAULT_SEED), count));
    let cases = build_cases(&model, sampler.as_ref(), limits)?;

    let mut config = base_config.clone();
    if let Some(ms) = suite.timeout_ms {
        config.timeout = Duration::from_millis(ms);
    }
    limits.check_workers(config.workers)?;
    limits.check_timeout(config.timeout)?;

    let reference = suite
        .reference
        .implementation(base, &format!("{}/reference", suite.name));
    let subject = suite
        .subject
        .implementation(base, &format!("{}/subject", suite.name));
    Ok(PreparedSuite {
        name: suite.name.clone(),
        cases,
        executor: DifferentialExecutor::new(Arc::new(reference), Arc::new(subject), config),
        reference_fragment: read_fragment(base, suite.reference.source.as_ref())?,
        subject_fragment: read_fragment(base, suite.subject.source.as_ref())?,
    })
}

/// Run every suite in manifest order. Every suite is loaded and checked
/// first; a configuration error in any of them aborts before any
/// implementation is invoked.
pub fn run_suite(
    manifest_path: &Path,
    base_config: &RunConfig,
    log: Option<&LogEmitter>,
) -> Result<Vec<SuiteReport>, HarnessError> {
    let (manifest, base) = load_manifest(manifest_path)?;
    let prepared = manifest
        .suites
        .iter()
        .map(|suite| prepare(suite, &base, base_config))
        .collect::<Result<Vec<_>, _>>()?;

    let mut reports = Vec::with_capacity(prepared.len());
    for suite in prepared {
        if let Some(log) = log {
            let _ = log.emit_entry(LogEntry::new(LogLevel::Info, "suite_start").with_suite(&suite.name));
        }
        let report = suite.executor.run(&suite.cases, log)?;
        reports.push(SuiteReport {
            name: suite.name,
            reference_fragment: suite.reference_fragment,
            subject_fragment: suite.subject_fragment,
            report,
        });
    }
    Ok(reports)
}
