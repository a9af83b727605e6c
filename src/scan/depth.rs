//! Brace-depth scanning.
//!
//! Walks a file line by line carrying a [`ScanState`]: one stack entry per
//! open brace, flagged when the line that opened it looked like an
//! iteration callback (`.map(`, `.reduce(`, ...). A rule scoped with a
//! [`DepthPredicate`] only fires where the predicate holds.
//!
//! The predicate and patterns are evaluated against the state *before* the
//! current line's own braces are counted, so `items.map((x) => {` is
//! itself still outside the callback it opens.
//!
//! `for` and `for...of` loops are deliberately not iteration contexts.
//! Nested lookups inside plain loops are tolerated.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::matcher::{Matcher, PatternSet};
use super::normalize::{count_braces, is_comment_line, strip_strings};
use super::Hit;

lazy_static! {
    /// Default iteration-context markers.
    pub static ref DEFAULT_ITERATION_PATTERNS: Vec<Arc<dyn Matcher>> = [
        r"\.map\(",
        r"\.flatMap\(",
        r"\.reduce\(",
        r"\.filter\(",
        r"\.some\(",
        r"\.every\(",
    ]
    .iter()
    .map(|p| Arc::new(regex::Regex::new(p).unwrap()) as Arc<dyn Matcher>)
    .collect();
}

/// Where a depth-scoped rule is allowed to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepthPredicate {
    /// Inside any braced scope (depth > 0)
    InsideFunction,
    /// Inside a scope opened by an iteration callback
    InsideIteration,
}

impl DepthPredicate {
    pub fn holds(&self, state: &ScanState) -> bool {
        match self {
            DepthPredicate::InsideFunction => state.depth() > 0,
            DepthPredicate::InsideIteration => state.in_iteration(),
        }
    }
}

/// Nesting state for one file.
///
/// Depth is the stack length, so the two can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    stack: Vec<bool>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether any open scope was entered from an iteration callback.
    pub fn in_iteration(&self) -> bool {
        self.stack.iter().any(|&flag| flag)
    }

    /// Apply one line's braces: all opens first, then all closes.
    ///
    /// Extra closes are ignored, which clamps depth at zero.
    pub fn advance(&mut self, opens: usize, closes: usize, iteration: bool) {
        self.stack.extend(std::iter::repeat(iteration).take(opens));
        let keep = self.stack.len().saturating_sub(closes);
        self.stack.truncate(keep);
    }
}

/// Depth-aware scanner for one rule.
#[derive(Debug, Clone)]
pub struct DepthScanner<'a> {
    patterns: &'a PatternSet,
    predicate: DepthPredicate,
    iteration: &'a [Arc<dyn Matcher>],
}

impl<'a> DepthScanner<'a> {
    pub fn new(
        patterns: &'a PatternSet,
        predicate: DepthPredicate,
        iteration: &'a [Arc<dyn Matcher>],
    ) -> Self {
        Self {
            patterns,
            predicate,
            iteration,
        }
    }

    fn opens_iteration(&self, line: &str) -> bool {
        self.iteration.iter().any(|m| m.test(line))
    }

    /// Process one line, returning a hit if the pattern fires in scope.
    pub fn step(&self, state: &mut ScanState, path: &str, line_number: usize, line: &str) -> Option<Hit> {
        if is_comment_line(line) {
            return None;
        }

        let hit = if self.predicate.holds(state) {
            self.patterns.match_line(path, line_number, line)
        } else {
            None
        };

        let (opens, closes) = count_braces(line);
        let iteration = opens > 0 && self.opens_iteration(&strip_strings(line));
        state.advance(opens, closes, iteration);

        hit
    }

    /// Scan a whole file as a fold over its lines.
    pub fn scan(&self, path: &str, content: &str) -> Vec<Hit> {
        content
            .lines()
            .enumerate()
            .fold(
                (ScanState::new(), Vec::new()),
                |(mut state, mut hits), (idx, line)| {
                    if let Some(hit) = self.step(&mut state, path, idx + 1, line) {
                        hits.push(hit);
                    }
                    (state, hits)
                },
            )
            .1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_patterns() -> PatternSet {
        PatternSet::compile(&[r"\.(find|filter|some|includes|indexOf)\("]).unwrap()
    }

    fn nested_lookup(content: &str) -> Vec<Hit> {
        let patterns = lookup_patterns();
        DepthScanner::new(
            &patterns,
            DepthPredicate::InsideIteration,
            &DEFAULT_ITERATION_PATTERNS,
        )
        .scan("lookup.js", content)
    }

    #[test]
    fn test_find_inside_map_callback() {
        let content = "\
const out = items.map((item) => {
  const m = others.find((o) => o.id === item.id);
  return m;
});
";
        let hits = nested_lookup(content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 2);
        assert!(hits[0].text.contains(".find("));
    }

    #[test]
    fn test_find_inside_for_of_is_tolerated() {
        let content = "\
for (const item of items) {
  const m = others.find((o) => o.id === item.id);
  console.log(m);
}
";
        assert!(nested_lookup(content).is_empty());
    }

    #[test]
    fn test_opening_line_uses_pre_update_state() {
        // The .filter( call opens the callback but is not inside one yet.
        let content = "\
const a = xs.filter((x) => {
  return x > 1;
});
";
        assert!(nested_lookup(content).is_empty());
    }

    #[test]
    fn test_scope_closes_after_callback() {
        let content = "\
const a = xs.map((x) => {
  return x * 2;
});
const b = ys.find((y) => y.ok);
";
        assert!(nested_lookup(content).is_empty());
    }

    #[test]
    fn test_iteration_flag_survives_inner_blocks() {
        let content = "\
rows.reduce((acc, row) => {
  if (row.active) {
    acc.push(lookup.find((l) => l.id === row.id));
  }
  return acc;
}, []);
";
        let hits = nested_lookup(content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 3);
    }

    #[test]
    fn test_braces_in_strings_do_not_count() {
        let content = "\
const s = \"items.map(() => {\";
const t = others.find((o) => o.ok);
";
        assert!(nested_lookup(content).is_empty());
    }

    #[test]
    fn test_comment_lines_are_ignored() {
        let content = "\
// items.map((x) => {
const t = others.find((o) => o.ok);
";
        assert!(nested_lookup(content).is_empty());
    }

    #[test]
    fn test_inside_function_predicate() {
        let patterns = PatternSet::compile(&[r"\bmemoize\("]).unwrap();
        let scanner = DepthScanner::new(
            &patterns,
            DepthPredicate::InsideFunction,
            &DEFAULT_ITERATION_PATTERNS,
        );
        let content = "\
const top = memoize(compute);
function render(props) {
  const inner = memoize(compute);
  return inner(props);
}
";
        let hits = scanner.scan("memo.js", content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 3);
    }

    #[test]
    fn test_depth_never_negative() {
        let mut state = ScanState::new();
        state.advance(0, 5, false);
        assert_eq!(state.depth(), 0);
        state.advance(2, 0, true);
        assert_eq!(state.depth(), 2);
        state.advance(1, 7, false);
        assert_eq!(state.depth(), 0);
        assert!(!state.in_iteration());
    }

    #[test]
    fn test_balanced_line_has_no_net_change() {
        let mut state = ScanState::new();
        state.advance(1, 0, false);
        state.advance(2, 2, true);
        assert_eq!(state.depth(), 1);
        assert!(!state.in_iteration());
    }

    #[test]
    fn test_malformed_input_clamps() {
        let content = "}\n}}\nconst a = xs.map((x) => {\n  ys.find(f);\n";
        let hits = nested_lookup(content);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 4);
    }
}
