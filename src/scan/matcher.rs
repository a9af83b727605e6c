//! Per-line pattern matching.
//!
//! A [`PatternSet`] bundles the match patterns of a rule with its skip
//! patterns and optional extractor. Matching runs on the string-stripped
//! line, so text inside string literals never produces a hit.

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::normalize::{raw_offset, strip_strings};
use super::{Hit, ScanError};

/// A single successful match on a line.
///
/// Text and spans refer to the string-stripped line. Use
/// [`LineMatch::raw_group`] to recover a group's text from the raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// Capture groups; index 0 is the whole match
    pub groups: Vec<Option<String>>,
    /// Byte ranges of the groups in the stripped line
    pub spans: Vec<Option<Range<usize>>>,
}

impl LineMatch {
    /// The whole matched text.
    pub fn as_str(&self) -> &str {
        self.group(0).unwrap_or("")
    }

    /// Capture group `i`, if it participated in the match.
    pub fn group(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(|g| g.as_deref())
    }

    /// Capture group `i` as written in `raw`, string contents included.
    ///
    /// `raw` must be the line the stripped text was produced from.
    pub fn raw_group<'a>(&self, raw: &'a str, i: usize) -> Option<&'a str> {
        let span = self.spans.get(i)?.as_ref()?;
        raw.get(raw_offset(raw, span.start)..raw_offset(raw, span.end))
    }
}

/// Anything that can test a line of text.
pub trait Matcher: Send + Sync + fmt::Debug {
    fn test(&self, line: &str) -> bool;

    fn first_match(&self, line: &str) -> Option<LineMatch>;

    /// Source form of the pattern, for diagnostics.
    fn source(&self) -> &str;
}

impl Matcher for Regex {
    fn test(&self, line: &str) -> bool {
        self.is_match(line)
    }

    fn first_match(&self, line: &str) -> Option<LineMatch> {
        let caps = self.captures(line)?;
        Some(LineMatch {
            groups: caps
                .iter()
                .map(|g| g.map(|m| m.as_str().to_string()))
                .collect(),
            spans: caps.iter().map(|g| g.map(|m| m.range())).collect(),
        })
    }

    fn source(&self) -> &str {
        self.as_str()
    }
}

/// Extractor callback: `(line, line_number, match, path) -> data`.
///
/// Returning `None` discards the match.
pub type Extractor = Arc<dyn Fn(&str, usize, &LineMatch, &str) -> Option<Value> + Send + Sync>;

/// Compile a list of regex sources.
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Arc<dyn Matcher>>, ScanError> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p)
                .map(|r| Arc::new(r) as Arc<dyn Matcher>)
                .map_err(|source| ScanError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
        })
        .collect()
}

/// Match patterns, skip patterns and extractor for one rule.
#[derive(Clone, Default)]
pub struct PatternSet {
    matchers: Vec<Arc<dyn Matcher>>,
    skip: Vec<Arc<dyn Matcher>>,
    extractor: Option<Extractor>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSet")
            .field("matchers", &self.sources())
            .field("skip", &self.skip.iter().map(|m| m.source()).collect::<Vec<_>>())
            .field("extractor", &self.extractor.is_some())
            .finish()
    }
}

impl PatternSet {
    pub fn new(matchers: Vec<Arc<dyn Matcher>>) -> Self {
        Self {
            matchers,
            ..Default::default()
        }
    }

    /// Build from regex sources.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ScanError> {
        Ok(Self::new(compile_patterns(patterns)?))
    }

    pub fn with_skip(mut self, skip: Vec<Arc<dyn Matcher>>) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn sources(&self) -> Vec<&str> {
        self.matchers.iter().map(|m| m.source()).collect()
    }

    /// Whether any match pattern fires on the string-stripped line.
    pub fn matches(&self, line: &str) -> bool {
        let stripped = strip_strings(line);
        self.matchers.iter().any(|m| m.test(&stripped))
    }

    /// Whether the scan could still produce a hit on this line.
    ///
    /// Like [`PatternSet::matches`], but a line caught by a skip pattern
    /// never matches.
    pub fn matches_unskipped(&self, line: &str) -> bool {
        !self.is_skipped(line) && self.matches(line)
    }

    /// Whether a skip pattern suppresses this raw line.
    pub fn is_skipped(&self, line: &str) -> bool {
        self.skip.iter().any(|m| m.test(line))
    }

    /// Match one line, producing at most one hit.
    ///
    /// Skip patterns are tested first against the raw line. Match patterns
    /// are tried in order against the stripped line; the first match the
    /// extractor accepts wins.
    pub fn match_line(&self, path: &str, line_number: usize, line: &str) -> Option<Hit> {
        if self.is_skipped(line) {
            return None;
        }

        let stripped = strip_strings(line);

        self.matchers.iter().find_map(|m| {
            let found = m.first_match(&stripped)?;
            let extracted = match &self.extractor {
                Some(extract) => Some(extract(line, line_number, &found, path)?),
                None => None,
            };
            Some(Hit {
                file: path.to_string(),
                line: line_number,
                text: line.to_string(),
                extracted,
            })
        })
    }
}
