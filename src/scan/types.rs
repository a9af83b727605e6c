//! Core types for scan results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single pattern match on a source line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Path of the file, as given to the analyzer
    pub file: String,
    /// 1-indexed line number
    pub line: usize,
    /// Raw text of the matched line
    pub text: String,
    /// Data returned by the rule's extractor, if it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<Value>,
}

impl Hit {
    /// The `path:line` key used by allowlists.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

/// A hit that no allowlist entry covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    #[serde(flatten)]
    pub hit: Hit,
    pub reason: String,
}

/// A hit covered by an allowlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedHit {
    #[serde(flatten)]
    pub hit: Hit,
    /// The allowlist key that matched (`path` or `path:line`)
    pub entry: String,
}

/// Hits partitioned by an allowlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub violations: Vec<Violation>,
    pub allowed: Vec<AllowedHit>,
}

impl Classification {
    /// Total number of hits that went into the partition.
    pub fn total(&self) -> usize {
        self.violations.len() + self.allowed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}
