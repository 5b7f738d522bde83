use std::path::PathBuf;

use eqclass_model::model::ModelError;

/// Anything that stops a run before or instead of producing a report.
///
/// Every variant is a configuration-level failure; per-case execution
/// problems are verdicts, not errors.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Partition config error: {0}")]
    Parse(#[from] eqclass_ir::parse::ParseError),

    #[error("Partition model error: {0}")]
    Model(#[from] ModelError),

    #[error("{}", validation_summary(.0))]
    Validation(Vec<ModelError>),

    #[error("Implementation error: {0}")]
    Exec(#[from] eqclass_exec::process::ExecError),

    #[error("Manifest error in {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl From<Vec<ModelError>> for HarnessError {
    fn from(errors: Vec<ModelError>) -> Self {
        HarnessError::Validation(errors)
    }
}

fn validation_summary(errors: &[ModelError]) -> String {
    match errors {
        [] => "Partition validation failed".to_string(),
        [only] => format!("Partition validation failed: {only}"),
        [first, rest @ ..] => format!(
            "Partition validation failed: {first} (and {} more: {})",
            rest.len(),
            rest.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}
