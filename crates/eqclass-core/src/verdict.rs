use std::sync::Arc;

use serde::{Deserialize, Serialize};

use eqclass_exec::result::{ExecStatus, ExecutionResult};
use eqclass_explore::case::InputCase;

type NormalizeFn = dyn Fn(&str) -> String + Send + Sync;

/// Output normalization applied to both sides before comparison.
#[derive(Clone, Default)]
pub enum Normalization {
    /// Byte-for-byte, whitespace included.
    #[default]
    Exact,
    /// Strip trailing whitespace on every line and at the end.
    Trim,
    /// Collapse every whitespace run to one space, then trim.
    Collapse,
    Custom(Arc<NormalizeFn>),
}

impl Normalization {
    pub fn custom<F>(func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Normalization::Custom(Arc::new(func))
    }

    pub fn apply(&self, output: &str) -> String {
        match self {
            Normalization::Exact => output.to_string(),
            Normalization::Trim => output
                .lines()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join("\n")
                .trim_end()
                .to_string(),
            Normalization::Collapse => output.split_whitespace().collect::<Vec<_>>().join(" "),
            Normalization::Custom(func) => func(output),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Normalization::Exact => "exact",
            Normalization::Trim => "trim",
            Normalization::Collapse => "collapse",
            Normalization::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Debug for Normalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which implementation failed to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Reference,
    Subject,
    Both,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Reference => f.write_str("reference"),
            Side::Subject => f.write_str("subject"),
            Side::Both => f.write_str("both"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    Match,
    Mismatch,
    Error { side: Side },
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Match => "MATCH",
            Verdict::Mismatch => "MISMATCH",
            Verdict::Error { .. } => "ERROR",
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }
}

/// Outcome of one case with both sides' results attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub case: InputCase,
    pub verdict: Verdict,
    pub reference: ExecutionResult,
    pub subject: ExecutionResult,
}

impl CaseVerdict {
    /// Why the case did not match, or `None` for a match.
    pub fn reason(&self) -> Option<String> {
        match &self.verdict {
            Verdict::Match => None,
            Verdict::Mismatch => {
                if self.reference.exit_code != self.subject.exit_code {
                    Some(format!(
                        "exit code {} vs {}",
                        fmt_code(self.reference.exit_code),
                        fmt_code(self.subject.exit_code)
                    ))
                } else {
                    Some(format!(
                        "output {:?} vs {:?}",
                        self.reference.output, self.subject.output
                    ))
                }
            }
            Verdict::Error { side } => {
                let describe = |r: &ExecutionResult| match &r.detail {
                    Some(detail) => format!("{} ({detail})", r.status),
                    None => r.status.to_string(),
                };
                Some(match side {
                    Side::Reference => format!("reference {}", describe(&self.reference)),
                    Side::Subject => format!("subject {}", describe(&self.subject)),
                    Side::Both => format!(
                        "reference {}, subject {}",
                        describe(&self.reference),
                        describe(&self.subject)
                    ),
                })
            }
        }
    }
}

fn fmt_code(code: Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Compare two results. Any incomplete side is an error; otherwise the
/// normalized outputs and the exit codes must agree.
pub fn classify(
    reference: &ExecutionResult,
    subject: &ExecutionResult,
    normalization: &Normalization,
) -> Verdict {
    let ref_failed = reference.status != ExecStatus::Completed;
    let subj_failed = subject.status != ExecStatus::Completed;
    match (ref_failed, subj_failed) {
        (true, true) => return Verdict::Error { side: Side::Both },
        (true, false) => return Verdict::Error { side: Side::Reference },
        (false, true) => return Verdict::Error { side: Side::Subject },
        (false, false) => {}
    }
    if reference.exit_code == subject.exit_code
        && normalization.apply(&reference.output) == normalization.apply(&subject.output)
    {
        Verdict::Match
    } else {
        Verdict::Mismatch
    }
}
