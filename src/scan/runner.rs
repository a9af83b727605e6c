//! Runner that executes a set of checks against a file set.

use serde::Serialize;
use tracing::{debug, info};

use crate::report::ReportOptions;

use super::{analyze, analyze_parallel, Allowlist, Classification, Rule, SourceReader, StaleEntry};

/// A rule together with its allowlist and report settings.
#[derive(Debug, Clone)]
pub struct Check {
    pub rule: Rule,
    pub allowlist: Allowlist,
    pub report: ReportOptions,
}

impl Check {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            allowlist: Allowlist::new(),
            report: ReportOptions::default(),
        }
    }

    pub fn allow(mut self, allowlist: Allowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn report(mut self, report: ReportOptions) -> Self {
        self.report = report;
        self
    }
}

/// Result of one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub rule: String,
    pub reason: String,
    #[serde(flatten)]
    pub classification: Classification,
}

/// Results of running every check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub outcomes: Vec<CheckOutcome>,
    /// Number of files scanned per check
    pub scanned: usize,
}

impl CheckReport {
    pub fn violation_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.classification.violations.len()).sum()
    }

    pub fn allowed_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.classification.allowed.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|o| o.classification.is_clean())
    }

    pub fn outcome(&self, rule: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.rule == rule)
    }
}

/// Stale allowlist entries for one rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleStaleness {
    pub rule: String,
    pub entries: Vec<StaleEntry>,
}

/// Executes checks through a source reader.
pub struct Runner<R> {
    reader: R,
    parallel: bool,
}

impl<R: SourceReader> Runner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parallel: false,
        }
    }

    /// Scan files in parallel. Output order does not change.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every check over `files` and classify the hits.
    pub fn run<S: AsRef<str> + Sync>(&self, files: &[S], checks: &[Check]) -> anyhow::Result<CheckReport> {
        let mut report = CheckReport {
            outcomes: Vec::with_capacity(checks.len()),
            scanned: files.len(),
        };

        for check in checks {
            let hits = if self.parallel {
                analyze_parallel(files, &self.reader, &check.rule)?
            } else {
                analyze(files, &self.reader, &check.rule)?
            };
            let classification = check.allowlist.classify(hits, check.rule.reason());

            debug!(
                rule = check.rule.name(),
                violations = classification.violations.len(),
                allowed = classification.allowed.len(),
                "check finished"
            );

            report.outcomes.push(CheckOutcome {
                rule: check.rule.name().to_string(),
                reason: check.rule.reason().to_string(),
                classification,
            });
        }

        info!(
            checks = checks.len(),
            files = files.len(),
            violations = report.violation_count(),
            "scan complete"
        );
        Ok(report)
    }

    /// Validate every check's allowlist, returning only rules with stale entries.
    pub fn stale(&self, checks: &[Check]) -> anyhow::Result<Vec<RuleStaleness>> {
        let mut result = Vec::new();

        for check in checks {
            let entries = check
                .allowlist
                .stale_entries(check.rule.patterns(), &self.reader)?;
            if !entries.is_empty() {
                result.push(RuleStaleness {
                    rule: check.rule.name().to_string(),
                    entries,
                });
            }
        }

        info!(
            checks = checks.len(),
            stale = result.iter().map(|r| r.entries.len()).sum::<usize>(),
            "allowlist validation complete"
        );
        Ok(result)
    }
}
