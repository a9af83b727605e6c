//! Guardrail - line-based code-quality enforcement.
//!
//! Guardrail scans JavaScript/TypeScript sources line by line for
//! constructs a project has decided to disallow (mutable declarations,
//! object mutation, nested lookups, fallback operators, aliasing,
//! misplaced memoization), splits the hits into violations and
//! grandfathered exceptions, and renders a deterministic report.
//!
//! # Architecture
//!
//! - `scan`: the engine (normalization, matching, brace-depth tracking,
//!   file-set analysis, allowlists, runner)
//! - `rules`: built-in rule presets
//! - `config`: YAML config schema
//! - `report`: output formatting (text, JSON)
//! - `cli`: command-line front end
//!
//! # Example
//!
//! ```
//! use guardrail::{format_violations, Allowlist, ReportOptions, Rule};
//!
//! let rule = Rule::from_strs("mutable-declaration", &[r"\blet\s+\w+"]).unwrap();
//! let hits = rule.scan_source("app.js", "let a = 1;\nconst b = 2;\n");
//! let result = Allowlist::new().classify(hits, rule.reason());
//! let report = format_violations(&result.violations, &ReportOptions::default());
//! assert_eq!(report.count, 1);
//! ```

pub mod cli;
pub mod config;
pub mod report;
pub mod rules;
pub mod scan;

pub use config::Config;
pub use report::{format_violations, FormattedReport, ReportOptions};
pub use scan::{
    analyze, analyze_parallel, Allowlist, Check, CheckReport, DepthPredicate, FsReader, Hit,
    MemoryReader, Rule, Runner, ScanError, SourceReader, Violation,
};
