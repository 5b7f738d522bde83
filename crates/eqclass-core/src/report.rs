use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::verdict::{CaseVerdict, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pass => f.write_str("PASS"),
            RunStatus::Fail => f.write_str("FAIL"),
        }
    }
}

/// Aggregate of one reference/subject run. Verdicts are in case-id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub reference: String,
    pub subject: String,
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub errored: usize,
    pub timeout_ms: u64,
    pub workers: usize,
    pub normalization: String,
    pub verdicts: Vec<CaseVerdict>,
}

impl RunReport {
    pub fn new(
        reference: &str,
        subject: &str,
        timeout_ms: u64,
        workers: usize,
        normalization: &str,
        mut verdicts: Vec<CaseVerdict>,
    ) -> Self {
        verdicts.sort_by_key(|v| v.case.id);
        let matched = verdicts.iter().filter(|v| v.verdict.is_match()).count();
        let mismatched = verdicts
            .iter()
            .filter(|v| v.verdict == Verdict::Mismatch)
            .count();
        let errored = verdicts.len() - matched - mismatched;
        let status = if matched == verdicts.len() {
            RunStatus::Pass
        } else {
            RunStatus::Fail
        };
        Self {
            status,
            reference: reference.to_string(),
            subject: subject.to_string(),
            total: verdicts.len(),
            matched,
            mismatched,
            errored,
            timeout_ms,
            workers,
            normalization: normalization.to_string(),
            verdicts,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == RunStatus::Pass
    }

    /// Every case that did not match.
    pub fn failures(&self) -> Vec<&CaseVerdict> {
        self.verdicts
            .iter()
            .filter(|v| !v.verdict.is_match())
            .collect()
    }

    pub fn verdict_for(&self, case_id: usize) -> Option<&CaseVerdict> {
        self.verdicts
            .binary_search_by_key(&case_id, |v| v.case.id)
            .ok()
            .map(|i| &self.verdicts[i])
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary: header, counts, then one row per failing case.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}  reference={}  subject={}", self.status, self.reference, self.subject);
        let _ = writeln!(
            out,
            "cases={} matched={} mismatched={} errored={} timeout={}ms workers={} normalize={}",
            self.total,
            self.matched,
            self.mismatched,
            self.errored,
            self.timeout_ms,
            self.workers,
            self.normalization
        );
        let failures = self.failures();
        if failures.is_empty() {
            return out;
        }

        let rows: Vec<[String; 4]> = failures
            .iter()
            .map(|v| {
                [
                    v.case.id.to_string(),
                    v.verdict.label().to_string(),
                    v.case.label(),
                    v.reason().unwrap_or_default(),
                ]
            })
            .collect();
        let headers = ["ID", "VERDICT", "INPUTS", "DETAIL"];
        let mut widths = headers.map(str::len);
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }
        out.push('\n');
        push_row(&mut out, &headers.map(str::to_string), &widths);
        for row in &rows {
            push_row(&mut out, row, &widths);
        }
        out
    }
}

fn push_row(out: &mut String, cells: &[String; 4], widths: &[usize; 4]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

/// One manifest suite's report, with the extracted decision fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_fragment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_fragment: Option<String>,
    pub report: RunReport,
}

impl SuiteReport {
    pub fn render_table(&self) -> String {
        let mut out = format!("== {} ==\n", self.name);
        for (role, fragment) in [
            ("reference", &self.reference_fragment),
            ("subject", &self.subject_fragment),
        ] {
            if let Some(text) = fragment {
                let _ = writeln!(out, "-- {role} fragment --");
                out.push_str(text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out.push_str(&self.report.render_table());
        out
    }
}

/// PASS only if every suite passed.
pub fn overall_status(suites: &[SuiteReport]) -> RunStatus {
    if suites.iter().all(|s| s.report.passed()) {
        RunStatus::Pass
    } else {
        RunStatus::Fail
    }
}
