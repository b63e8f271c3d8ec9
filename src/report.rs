//! Per-key results and the run report.

use crate::policy::classify::Verdict;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// Outcome of checking one key. Created once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct KeyCheckResult {
    /// 1-based position of the key in the input.
    pub index: usize,

    /// The key that was checked.
    pub key: String,

    /// Whether the key passed.
    pub passed: bool,

    /// Diagnostic text: generated reply on a pass, failure reason otherwise.
    pub message: String,

    /// Remaining quota reported by the provider, when known.
    pub remaining_quota: Option<String>,

    /// Structured outcome.
    pub verdict: Verdict,

    /// When the outcome was produced.
    pub checked_at: DateTime<Utc>,
}

impl KeyCheckResult {
    /// Build a result from a verdict.
    pub fn new(
        index: usize,
        key: impl Into<String>,
        verdict: Verdict,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            key: key.into(),
            passed: verdict.passed(),
            message: verdict.message(),
            remaining_quota: verdict.remaining_quota().map(String::from),
            verdict,
            checked_at,
        }
    }

    /// "PASS" or "FAIL".
    pub fn status_label(&self) -> &'static str {
        if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

/// Aggregated results of a run, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Number of keys supplied.
    pub total: usize,
    /// Keys that passed.
    pub passed: usize,
    /// Keys that failed, including locally rejected ones.
    pub failed: usize,
    /// One result per key, sorted by input index.
    pub results: Vec<KeyCheckResult>,
}

impl Report {
    /// Build a report, sorting results back into input order.
    pub fn new(mut results: Vec<KeyCheckResult>) -> Self {
        results.sort_by_key(|r| r.index);
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    /// Results that passed, in input order.
    pub fn passing(&self) -> impl Iterator<Item = &KeyCheckResult> {
        self.results.iter().filter(|r| r.passed)
    }

    /// Results that failed, in input order.
    pub fn failing(&self) -> impl Iterator<Item = &KeyCheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Keys that passed, in input order.
    pub fn passing_keys(&self) -> Vec<&str> {
        self.passing().map(|r| r.key.as_str()).collect()
    }

    /// Closing summary: counts, then the list of active keys.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Checked {} key(s): {} passed, {} failed",
            self.total, self.passed, self.failed
        );

        if self.passed == 0 {
            out.push_str("All keys have been exhausted.\n");
            return out;
        }

        out.push_str("Active keys with remaining usage:\n");
        for result in self.passing() {
            match &result.remaining_quota {
                Some(quota) => {
                    let _ = writeln!(out, "{} (remaining: {})", result.key, quota);
                }
                None => {
                    let _ = writeln!(out, "{}", result.key);
                }
            }
        }
        out
    }

    /// Full report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Running pass/fail tally for live progress output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    /// Keys finished so far.
    pub done: usize,
    /// Passes so far.
    pub passed: usize,
    /// Failures so far.
    pub failed: usize,
    /// Total keys in the run.
    pub total: usize,
}

impl Progress {
    /// Start a tally for `total` keys.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one finished result.
    pub fn record(&mut self, result: &KeyCheckResult) {
        self.done += 1;
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Two-line progress entry for `result`.
    ///
    /// ```text
    /// [2/5] pass=1 fail=1 status=FAIL
    /// 'KEY': 'invalid key: API key not valid.'
    /// ```
    pub fn render(&self, result: &KeyCheckResult) -> String {
        format!(
            "[{}/{}] pass={} fail={} status={}\n'{}': '{}'",
            result.index,
            self.total,
            self.passed,
            self.failed,
            result.status_label(),
            result.key,
            result.message
        )
    }
}
