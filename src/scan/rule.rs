//! Rule definitions.

use std::fmt;
use std::sync::Arc;

use super::depth::{DepthPredicate, DepthScanner, DEFAULT_ITERATION_PATTERNS};
use super::matcher::{Extractor, Matcher, PatternSet};
use super::normalize::is_comment_line;
use super::{Hit, ScanError};

/// Where a rule looks for matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every line, independent of nesting
    Line,
    /// Only where the depth predicate holds
    Nested(DepthPredicate),
}

/// One rule category, e.g. "mutable declaration".
#[derive(Clone)]
pub struct Rule {
    name: String,
    description: Option<String>,
    patterns: PatternSet,
    scope: Scope,
    iteration: Vec<Arc<dyn Matcher>>,
    skip_comments: bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl Rule {
    /// Create a line-scoped rule. Fails if `patterns` is empty.
    pub fn new(name: impl Into<String>, patterns: PatternSet) -> Result<Self, ScanError> {
        let name = name.into();
        if patterns.is_empty() {
            return Err(ScanError::NoPatterns { rule: name });
        }
        Ok(Self {
            name,
            description: None,
            patterns,
            scope: Scope::Line,
            iteration: DEFAULT_ITERATION_PATTERNS.clone(),
            skip_comments: true,
        })
    }

    /// Create a rule from regex sources.
    pub fn from_strs<S: AsRef<str>>(name: impl Into<String>, patterns: &[S]) -> Result<Self, ScanError> {
        Self::new(name, PatternSet::compile(patterns)?)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn skip_patterns(mut self, skip: Vec<Arc<dyn Matcher>>) -> Self {
        self.patterns = self.patterns.with_skip(skip);
        self
    }

    pub fn extractor(mut self, extractor: Extractor) -> Self {
        self.patterns = self.patterns.with_extractor(extractor);
        self
    }

    /// Restrict the rule to lines where `predicate` holds.
    pub fn within(mut self, predicate: DepthPredicate) -> Self {
        self.scope = Scope::Nested(predicate);
        self
    }

    /// Match on every line regardless of nesting.
    pub fn line_scoped(mut self) -> Self {
        self.scope = Scope::Line;
        self
    }

    /// Replace the iteration-context markers used by nested scopes.
    pub fn iteration_patterns(mut self, iteration: Vec<Arc<dyn Matcher>>) -> Self {
        self.iteration = iteration;
        self
    }

    /// Also scan comment lines (line scope only).
    pub fn keep_comments(mut self) -> Self {
        self.skip_comments = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable reason attached to violations.
    pub fn reason(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Scan in-memory content, returning hits in line order.
    pub fn scan_source(&self, path: &str, content: &str) -> Vec<Hit> {
        match self.scope {
            Scope::Line => content
                .lines()
                .enumerate()
                .filter(|(_, line)| !(self.skip_comments && is_comment_line(line)))
                .filter_map(|(idx, line)| self.patterns.match_line(path, idx + 1, line))
                .collect(),
            Scope::Nested(predicate) => {
                DepthScanner::new(&self.patterns, predicate, &self.iteration).scan(path, content)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::compile_patterns;

    #[test]
    fn test_rule_requires_patterns() {
        let empty: [&str; 0] = [];
        let err = Rule::from_strs("empty", &empty).unwrap_err();
        assert!(matches!(err, ScanError::NoPatterns { ref rule } if rule == "empty"));
    }

    #[test]
    fn test_line_scope_skips_comments() {
        let rule = Rule::from_strs("let", &[r"\blet\s+\w+"]).unwrap();
        let content = "let a = 1;\n// let b = 2;\n  let c = 3;\n";
        let hits = rule.scan_source("x.js", content);
        let lines: Vec<usize> = hits.iter().map(|h| h.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_keep_comments() {
        let rule = Rule::from_strs("let", &[r"\blet\s+\w+"]).unwrap().keep_comments();
        let hits = rule.scan_source("x.js", "// let b = 2;\n");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_reason_falls_back_to_name() {
        let rule = Rule::from_strs("let", &["let"]).unwrap();
        assert_eq!(rule.reason(), "let");
        let rule = rule.description("Use const instead of let");
        assert_eq!(rule.reason(), "Use const instead of let");
    }

    #[test]
    fn test_nested_scope_with_custom_iteration() {
        let rule = Rule::from_strs("lookup", &[r"\.find\("])
            .unwrap()
            .within(DepthPredicate::InsideIteration)
            .iteration_patterns(compile_patterns(&[r"\.forEach\("]).unwrap());
        let content = "xs.forEach((x) => {\n  ys.find(f);\n});\nzs.map((z) => {\n  ys.find(f);\n});\n";
        let hits = rule.scan_source("x.js", content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 2);
    }
}
