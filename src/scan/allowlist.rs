//! Allowlists of grandfathered hits.
//!
//! An entry is either a path (`src/legacy.js`), which covers every hit in
//! that file, or a path with a line number (`src/legacy.js:42`), which
//! covers exactly one line. Line-specific entries can go stale as the code
//! moves underneath them; [`Allowlist::stale_entries`] finds those.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use super::{AllowedHit, Classification, Hit, PatternSet, ScanError, SourceReader, Violation};

/// A parsed allowlist key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllowlistEntry {
    /// Suppresses every hit in the file
    File(String),
    /// Suppresses hits on one line
    Line { path: String, line: usize },
}

impl AllowlistEntry {
    /// Parse `path` or `path:line`.
    ///
    /// Only an all-digit suffix counts as a line number, so `C:\x` and
    /// `a:b` stay whole-file entries.
    pub fn parse(key: &str) -> Self {
        if let Some((path, suffix)) = key.rsplit_once(':') {
            if !path.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(line) = suffix.parse::<usize>() {
                    return AllowlistEntry::Line {
                        path: path.to_string(),
                        line,
                    };
                }
            }
        }
        AllowlistEntry::File(key.to_string())
    }

    pub fn path(&self) -> &str {
        match self {
            AllowlistEntry::File(path) => path,
            AllowlistEntry::Line { path, .. } => path,
        }
    }
}

impl fmt::Display for AllowlistEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowlistEntry::File(path) => write!(f, "{}", path),
            AllowlistEntry::Line { path, line } => write!(f, "{}:{}", path, line),
        }
    }
}

/// Why an allowlist entry no longer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    FileNotFound,
    LineMissing { line_count: usize },
    NoLongerMatches,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::FileNotFound => write!(f, "File not found"),
            StaleReason::LineMissing { .. } => write!(f, "Line doesn't exist"),
            StaleReason::NoLongerMatches => write!(f, "Line no longer matches pattern"),
        }
    }
}

/// An entry that should be removed or updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleEntry {
    /// The key exactly as written in the allowlist
    pub entry: String,
    pub reason: StaleReason,
}

impl fmt::Display for StaleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            StaleReason::LineMissing { line_count } => write!(
                f,
                "{}: {} (file has {} lines)",
                self.entry, self.reason, line_count
            ),
            _ => write!(f, "{}: {}", self.entry, self.reason),
        }
    }
}

/// Immutable set of allowlist keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allowlist {
    entries: BTreeSet<String>,
}

impl<S: Into<String>> FromIterator<S> for Allowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// The key covering `hit`, if any. Whole-file entries win.
    pub fn covering_entry(&self, hit: &Hit) -> Option<String> {
        if self.contains(&hit.file) {
            return Some(hit.file.clone());
        }
        let location = hit.location();
        self.contains(&location).then_some(location)
    }

    /// Partition hits into violations and allowed hits, keeping order.
    pub fn classify<I>(&self, hits: I, reason: &str) -> Classification
    where
        I: IntoIterator<Item = Hit>,
    {
        let mut result = Classification::default();

        for hit in hits {
            match self.covering_entry(&hit) {
                Some(entry) => result.allowed.push(AllowedHit { hit, entry }),
                None => result.violations.push(Violation {
                    hit,
                    reason: reason.to_string(),
                }),
            }
        }

        result
    }

    /// Check every line-specific entry against the current sources.
    ///
    /// Whole-file entries are never stale. A line the rule's skip patterns
    /// suppress counts as no longer matching. Read errors other than a
    /// missing file abort the check.
    pub fn stale_entries<R>(&self, patterns: &PatternSet, reader: &R) -> Result<Vec<StaleEntry>, ScanError>
    where
        R: SourceReader + ?Sized,
    {
        let mut stale = Vec::new();

        for key in &self.entries {
            let entry = AllowlistEntry::parse(key);
            let line = match entry {
                AllowlistEntry::Line { line, .. } => line,
                AllowlistEntry::File(_) => continue,
            };

            let content = match reader.read_source(entry.path()) {
                Ok(content) => content,
                Err(e) if e.is_not_found() => {
                    stale.push(StaleEntry {
                        entry: key.clone(),
                        reason: StaleReason::FileNotFound,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let lines: Vec<&str> = content.lines().collect();
            if line < 1 || line > lines.len() {
                stale.push(StaleEntry {
                    entry: key.clone(),
                    reason: StaleReason::LineMissing {
                        line_count: lines.len(),
                    },
                });
                continue;
            }

            if !patterns.matches_unskipped(lines[line - 1]) {
                stale.push(StaleEntry {
                    entry: key.clone(),
                    reason: StaleReason::NoLongerMatches,
                });
            }
        }

        debug!(entries = self.entries.len(), stale = stale.len(), "validated allowlist");
        Ok(stale)
    }
}
