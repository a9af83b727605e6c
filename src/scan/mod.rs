//! Line-scanning engine.
//!
//! Files are read through a [`SourceReader`], each line is normalized
//! (string contents removed, comment lines skipped) and tested against a
//! [`Rule`]. Depth-scoped rules carry a [`ScanState`] across lines to know
//! whether a match sits inside a function body or an iteration callback.
//! Hits are then split by an [`Allowlist`] into violations and allowed
//! hits.

mod allowlist;
mod analyzer;
mod depth;
mod error;
mod matcher;
mod normalize;
mod rule;
mod runner;
mod source;
mod types;

pub use allowlist::{Allowlist, AllowlistEntry, StaleEntry, StaleReason};
pub use analyzer::{analyze, analyze_parallel};
pub use depth::{DepthPredicate, DepthScanner, ScanState, DEFAULT_ITERATION_PATTERNS};
pub use error::ScanError;
pub use matcher::{compile_patterns, Extractor, LineMatch, Matcher, PatternSet};
pub use normalize::{count_braces, is_comment_line, raw_offset, strip_strings};
pub use rule::{Rule, Scope};
pub use runner::{Check, CheckOutcome, CheckReport, RuleStaleness, Runner};
pub use source::{FsReader, MemoryReader, SourceReader};
pub use types::{AllowedHit, Classification, Hit, Violation};
