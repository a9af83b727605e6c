//! Built-in rule presets.
//!
//! Presets are plain configuration: patterns, skip patterns, scope and an
//! optional extractor. A config file can reference one by name and still
//! override its description, allowlist and report settings.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use crate::scan::{compile_patterns, DepthPredicate, Extractor, LineMatch, Rule, ScanError};

lazy_static! {
    /// Conditions where `||` / `??` is boolean logic, not a value fallback.
    static ref CONDITION_LINE: Regex =
        Regex::new(r"^\s*(?:\}\s*else\s+)?(?:if|while)\s*\(").unwrap();
    static ref NULL_COMPARISON: Regex = Regex::new(r"[!=]==?\s*null\b").unwrap();
    static ref LITERAL: Regex =
        Regex::new(r"^(?:true|false|null|undefined|this|NaN|Infinity|-?\d[\d_.]*)$").unwrap();
}

/// A named preset.
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub noun: &'static str,
    pub fix_hint: &'static str,
    build: fn() -> Result<Rule, ScanError>,
}

impl Preset {
    pub fn build(&self) -> Result<Rule, ScanError> {
        Ok((self.build)()?.description(self.description))
    }
}

static PRESETS: &[Preset] = &[
    Preset {
        name: "mutable-declaration",
        description: "Mutable variable declaration (let/var)",
        noun: "mutable declaration",
        fix_hint: "Use const and derive new values instead of reassigning",
        build: mutable_declaration,
    },
    Preset {
        name: "object-mutation",
        description: "Object mutation via bracket assignment",
        noun: "object mutation",
        fix_hint: "Build a new object (spread, Object.fromEntries) instead of assigning into one",
        build: object_mutation,
    },
    Preset {
        name: "nested-lookup",
        description: "Linear lookup inside an iteration callback (O(n*m))",
        noun: "nested lookup",
        fix_hint: "Index the inner collection once (Map/Set) before iterating",
        build: nested_lookup,
    },
    Preset {
        name: "fallback-operator",
        description: "Fallback operator hides a missing value",
        noun: "fallback operator",
        fix_hint: "Validate the value up front instead of silently substituting a default",
        build: fallback_operator,
    },
    Preset {
        name: "unnecessary-alias",
        description: "Variable that only aliases another name",
        noun: "unnecessary alias",
        fix_hint: "Use the original name (or destructure) instead of aliasing it",
        build: unnecessary_alias,
    },
    Preset {
        name: "memoization-misuse",
        description: "Memoized function created inside a function body",
        noun: "memoization misuse",
        fix_hint: "Create memoized functions once at module level so the cache survives calls",
        build: memoization_misuse,
    },
];

/// All presets, in catalog order.
pub fn presets() -> &'static [Preset] {
    PRESETS
}

pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.name).collect()
}

pub fn preset_info(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Build the rule for a preset by name.
pub fn preset(name: &str) -> Result<Rule, ScanError> {
    preset_info(name)
        .ok_or_else(|| ScanError::UnknownPreset(name.to_string()))?
        .build()
}

fn mutable_declaration() -> Result<Rule, ScanError> {
    Rule::from_strs(
        "mutable-declaration",
        &[r"^\s*(?:export\s+)?(let|var)\s+[\w$\[{]"],
    )
}

fn object_mutation() -> Result<Rule, ScanError> {
    let extractor: Extractor = Arc::new(|_line: &str, _n: usize, m: &LineMatch, _path: &str| {
        Some(json!({ "target": m.group(1)? }))
    });

    Ok(Rule::from_strs(
        "object-mutation",
        &[r"([\w$.]*[\w$\])])\s*\[[^\]]*\]\s*(?:[-+*/%]|\|\||\?\?|&&)?=(?:[^=>]|$)"],
    )?
    .skip_patterns(compile_patterns(&[
        // const [a, b] = arr
        r"^\s*(?:export\s+)?(?:const|let|var)\s*\[",
    ])?)
    .extractor(extractor))
}

fn nested_lookup() -> Result<Rule, ScanError> {
    let extractor: Extractor = Arc::new(|_line: &str, _n: usize, m: &LineMatch, _path: &str| {
        Some(json!({ "method": m.group(1)? }))
    });

    Ok(Rule::from_strs(
        "nested-lookup",
        &[r"\.(find|findIndex|filter|some|every|includes|indexOf)\("],
    )?
    .within(DepthPredicate::InsideIteration)
    .extractor(extractor))
}

fn fallback_operator() -> Result<Rule, ScanError> {
    let extractor: Extractor = Arc::new(|line: &str, _n: usize, m: &LineMatch, _path: &str| {
        if CONDITION_LINE.is_match(line) || NULL_COMPARISON.is_match(line) {
            return None;
        }
        Some(json!({
            "operator": m.group(1)?,
            "fallback": m.raw_group(line, 2)?.trim(),
        }))
    });

    Ok(Rule::from_strs("fallback-operator", &[r"(\?\?|\|\|)\s*([^;,)\s][^;,)]*)"])?.extractor(extractor))
}

fn unnecessary_alias() -> Result<Rule, ScanError> {
    let extractor: Extractor = Arc::new(|_line: &str, _n: usize, m: &LineMatch, _path: &str| {
        let alias = m.group(1)?;
        let target = m.group(2)?;
        if LITERAL.is_match(target) {
            return None;
        }
        Some(json!({ "alias": alias, "target": target }))
    });

    Ok(Rule::from_strs(
        "unnecessary-alias",
        &[r"^\s*const\s+([\w$]+)\s*=\s*(-?[\w$]+(?:\.[\w$]+)*)\s*;?\s*$"],
    )?
    .extractor(extractor))
}

fn memoization_misuse() -> Result<Rule, ScanError> {
    Ok(Rule::from_strs("memoization-misuse", &[r"\b(?:memoize|memoizeOne|moize)\("])?
        .within(DepthPredicate::InsideFunction))
}
