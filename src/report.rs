//! Output formatting for guardrail results.
//!
//! - [`format_violations`]: truncated plain-text report for assertion
//!   failure messages
//! - Pretty: colored terminal output for the CLI
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::scan::{AllowedHit, CheckReport, RuleStaleness, Violation};

/// Default number of violations listed before truncating.
pub const DEFAULT_MAX_SHOWN: usize = 10;

/// Settings for [`format_violations`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    /// How many violations to list before "... and K more"
    pub max_shown: usize,
    /// Singular noun, e.g. "mutable declaration"
    pub noun: String,
    /// Plural noun; defaults to the singular plus "s"
    pub noun_plural: Option<String>,
    /// Hint appended after the list
    pub fix_hint: Option<String>,
    /// Include the trimmed source line after each location
    pub show_snippet: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_shown: DEFAULT_MAX_SHOWN,
            noun: "violation".to_string(),
            noun_plural: None,
            fix_hint: None,
            show_snippet: true,
        }
    }
}

impl ReportOptions {
    pub fn noun_for(&self, count: usize) -> String {
        if count == 1 {
            self.noun.clone()
        } else {
            self.noun_plural
                .clone()
                .unwrap_or_else(|| format!("{}s", self.noun))
        }
    }
}

/// A rendered report and the true violation count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedReport {
    /// Total violations, independent of truncation
    pub count: usize,
    /// Rendered text; empty when there are no violations
    pub report: String,
}

/// Render violations for a test failure message.
///
/// Lists at most `options.max_shown` entries, followed by
/// `... and K more` when truncated.
pub fn format_violations(violations: &[Violation], options: &ReportOptions) -> FormattedReport {
    let count = violations.len();
    if count == 0 {
        return FormattedReport {
            count,
            report: String::new(),
        };
    }

    let mut lines = Vec::with_capacity(options.max_shown.min(count) + 4);
    lines.push(format!("Found {} {}:", count, options.noun_for(count)));

    for v in violations.iter().take(options.max_shown) {
        let snippet = v.hit.text.trim();
        if options.show_snippet && !snippet.is_empty() {
            lines.push(format!("  - {}: {}", v.hit.location(), snippet));
        } else {
            lines.push(format!("  - {}", v.hit.location()));
        }
    }

    if count > options.max_shown {
        lines.push(format!("  ... and {} more", count - options.max_shown));
    }

    if let Some(hint) = &options.fix_hint {
        lines.push(String::new());
        lines.push(format!("Fix: {}", hint));
    }

    FormattedReport {
        count,
        report: lines.join("\n"),
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report for `guardrail check`.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub config: String,
    pub passed: bool,
    pub files_scanned: usize,
    pub violation_count: usize,
    pub allowed_count: usize,
    pub rules: Vec<JsonRuleResult>,
}

/// Per-rule section of the JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonRuleResult {
    pub rule: String,
    pub reason: String,
    pub violations: Vec<JsonHit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<JsonHit>,
}

/// One hit in the JSON report.
#[derive(Serialize, Deserialize)]
pub struct JsonHit {
    pub file: String,
    pub line: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

fn violation_to_json(v: &Violation) -> JsonHit {
    JsonHit {
        file: v.hit.file.clone(),
        line: v.hit.line,
        text: v.hit.text.trim().to_string(),
        extracted: v.hit.extracted.clone(),
        entry: None,
    }
}

fn allowed_to_json(a: &AllowedHit) -> JsonHit {
    JsonHit {
        file: a.hit.file.clone(),
        line: a.hit.line,
        text: a.hit.text.trim().to_string(),
        extracted: a.hit.extracted.clone(),
        entry: Some(a.entry.clone()),
    }
}

/// Build the JSON report structure.
pub fn build_json(path: &str, config_path: &str, report: &CheckReport, include_allowed: bool) -> JsonReport {
    let rules = report
        .outcomes
        .iter()
        .map(|o| JsonRuleResult {
            rule: o.rule.clone(),
            reason: o.reason.clone(),
            violations: o.classification.violations.iter().map(violation_to_json).collect(),
            allowed: if include_allowed {
                o.classification.allowed.iter().map(allowed_to_json).collect()
            } else {
                Vec::new()
            },
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        config: config_path.to_string(),
        passed: report.is_clean(),
        files_scanned: report.scanned,
        violation_count: report.violation_count(),
        allowed_count: report.allowed_count(),
        rules,
    }
}

/// Write check results in JSON format.
pub fn write_json(
    path: &str,
    config_path: &str,
    report: &CheckReport,
    include_allowed: bool,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&build_json(path, config_path, report, include_allowed))?;
    println!("{}", json);
    Ok(())
}

/// Write stale allowlist entries in JSON format.
pub fn write_stale_json(stale: &[RuleStaleness]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(stale)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write check results in pretty (human-readable) format.
///
/// `options` supplies the per-rule report settings, looked up by rule name.
pub fn write_pretty<F>(path: &str, config_path: &str, report: &CheckReport, options: F, show_allowed: bool)
where
    F: Fn(&str) -> ReportOptions,
{
    write_header(path, config_path);

    if report.is_clean() {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }
    print!("  {} checks, {} files", report.outcomes.len(), report.scanned);
    if report.allowed_count() > 0 {
        print!("  {}", format!("({} allowed)", report.allowed_count()).dimmed());
    }
    println!();
    println!();

    for outcome in &report.outcomes {
        let violations = &outcome.classification.violations;
        let allowed = &outcome.classification.allowed;

        if violations.is_empty() {
            print!("    {} ", "ok  ".green());
        } else {
            print!("    {} ", "FAIL".red());
        }
        print!("{:<24}", outcome.rule.bold());
        println!("{}", format!("{} violations, {} allowed", violations.len(), allowed.len()).dimmed());

        if !violations.is_empty() {
            let formatted = format_violations(violations, &options(&outcome.rule));
            println!();
            for line in formatted.report.lines() {
                println!("        {}", line);
            }
            println!();
        }

        if show_allowed && !allowed.is_empty() {
            for a in allowed {
                print!("        {}", a.hit.location().blue());
                println!("  {}", format!("(allowed by {})", a.entry).dimmed());
            }
            println!();
        }
    }

    println!();
    print!("  {}", format!("Violations: {}", report.violation_count()).dimmed());
    print!("  ");
    if report.is_clean() {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
    println!();
}

/// Write stale allowlist entries in pretty format.
pub fn write_stale_pretty(path: &str, config_path: &str, stale: &[RuleStaleness]) {
    write_header(path, config_path);

    if stale.is_empty() {
        println!("  {}", "✓ All allowlist entries are current".green());
        println!();
        return;
    }

    let total: usize = stale.iter().map(|r| r.entries.len()).sum();
    println!("  {} ({}):", "Stale allowlist entries".bold(), total);
    println!();

    for rule in stale {
        println!("    {}", rule.rule.bold());
        for entry in &rule.entries {
            print!("      {}", entry.entry.blue());
            println!("  {}", entry.reason.to_string().yellow());
        }
        println!();
    }
}

fn write_header(path: &str, config_path: &str) {
    println!();
    print!("  ");
    print!("{}", "guardrail".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    print!("  {}", "Config:   ".dimmed());
    println!("{}", config_path);
    println!();
}
