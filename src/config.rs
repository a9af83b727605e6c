//! Configuration schema for guardrail.
//!
//! A config file lists the rules to enforce, each with its own allowlist
//! and report settings, plus include/exclude globs for file discovery.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::report::{ReportOptions, DEFAULT_MAX_SHOWN};
use crate::rules;
use crate::scan::{compile_patterns, Allowlist, Check, DepthPredicate, Rule, ScanError, Scope};

/// Top-level config definition.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Glob patterns for files to scan (default: common JS/TS extensions)
    #[serde(default)]
    pub include: Vec<String>,
    /// Glob patterns for paths to skip (e.g., "**/vendor/**")
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Where a configured rule looks for matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeConfig {
    #[default]
    Line,
    FunctionBody,
    IterationCallback,
}

impl ScopeConfig {
    fn predicate(self) -> Option<DepthPredicate> {
        match self {
            ScopeConfig::Line => None,
            ScopeConfig::FunctionBody => Some(DepthPredicate::InsideFunction),
            ScopeConfig::IterationCallback => Some(DepthPredicate::InsideIteration),
        }
    }
}

/// One rule entry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RuleConfig {
    pub name: String,
    /// Built-in preset to start from
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Regexes; replace the preset's patterns when given
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Overrides the preset's scope when given
    #[serde(default)]
    pub scope: Option<ScopeConfig>,
    #[serde(default)]
    pub iteration_patterns: Vec<String>,
    /// Allowlist entries: `path` or `path:line`
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub noun: Option<String>,
    #[serde(default)]
    pub noun_plural: Option<String>,
    #[serde(default)]
    pub fix_hint: Option<String>,
    #[serde(default)]
    pub max_shown: Option<usize>,
    /// Whether comment lines are skipped (default: true)
    #[serde(default)]
    pub skip_comments: Option<bool>,
}

impl RuleConfig {
    /// Compile into a rule.
    ///
    /// Preset rules keep their extractor only when their patterns are not
    /// replaced, since extractors depend on the preset's capture groups.
    pub fn to_rule(&self) -> Result<Rule, ScanError> {
        let preset = match self.preset.as_deref() {
            Some(name) => Some(
                rules::preset_info(name).ok_or_else(|| ScanError::UnknownPreset(name.to_string()))?,
            ),
            None => None,
        };

        let mut rule = match (preset, self.patterns.is_empty()) {
            (Some(p), true) => p.build()?,
            (Some(p), false) => {
                let custom = Rule::from_strs(self.name.clone(), &self.patterns)?;
                match p.build()?.scope() {
                    Scope::Nested(predicate) => custom.within(predicate),
                    Scope::Line => custom,
                }
            }
            (None, _) => Rule::from_strs(self.name.clone(), &self.patterns)?,
        };
        rule = rule.renamed(self.name.clone());

        if let Some(description) = &self.description {
            rule = rule.description(description.clone());
        } else if let Some(p) = preset {
            rule = rule.description(p.description);
        }
        if !self.skip_patterns.is_empty() {
            rule = rule.skip_patterns(compile_patterns(&self.skip_patterns)?);
        }
        if let Some(scope) = self.scope {
            rule = match scope.predicate() {
                Some(predicate) => rule.within(predicate),
                None => rule.line_scoped(),
            };
        }
        if !self.iteration_patterns.is_empty() {
            rule = rule.iteration_patterns(compile_patterns(&self.iteration_patterns)?);
        }
        if !self.skip_comments.unwrap_or(true) {
            rule = rule.keep_comments();
        }

        Ok(rule)
    }

    /// Report settings, falling back to the preset's noun and hint.
    pub fn report_options(&self) -> ReportOptions {
        let preset = self.preset.as_deref().and_then(rules::preset_info);
        ReportOptions {
            max_shown: self.max_shown.unwrap_or(DEFAULT_MAX_SHOWN),
            noun: self
                .noun
                .clone()
                .or_else(|| preset.map(|p| p.noun.to_string()))
                .unwrap_or_else(|| "violation".to_string()),
            noun_plural: self.noun_plural.clone(),
            fix_hint: self
                .fix_hint
                .clone()
                .or_else(|| preset.map(|p| p.fix_hint.to_string())),
            show_snippet: true,
        }
    }

    pub fn allowlist(&self) -> Allowlist {
        self.allow.iter().cloned().collect()
    }

    pub fn to_check(&self) -> Result<Check, ScanError> {
        Ok(Check::new(self.to_rule()?)
            .allow(self.allowlist())
            .report(self.report_options()))
    }
}

/// Default include globs when the config lists none.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.js", "**/*.mjs", "**/*.cjs", "**/*.jsx", "**/*.ts", "**/*.tsx"];

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path.display(), e))?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Compile every rule into a check.
    pub fn checks(&self) -> Result<Vec<Check>, ScanError> {
        self.rules.iter().map(RuleConfig::to_check).collect()
    }

    pub fn include_set(&self) -> Result<GlobSet, ScanError> {
        if self.include.is_empty() {
            build_globset(DEFAULT_INCLUDE)
        } else {
            build_globset(&self.include)
        }
    }

    pub fn exclude_set(&self) -> Result<GlobSet, ScanError> {
        build_globset(&self.exclude)
    }

    pub fn rule(&self, name: &str) -> Option<&RuleConfig> {
        self.rules.iter().find(|r| r.name == name)
    }
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidGlob {
            pattern: pattern.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidGlob {
        pattern: patterns.iter().map(|p| p.as_ref()).collect::<Vec<_>>().join(", "),
        source,
    })
}

/// Validate a config.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.rules.is_empty() {
        anyhow::bail!("config defines no rules");
    }

    let mut seen = std::collections::HashSet::new();
    for rule in &config.rules {
        if rule.name.trim().is_empty() {
            anyhow::bail!("rule with empty name");
        }
        if !seen.insert(rule.name.as_str()) {
            anyhow::bail!("duplicate rule name {:?}", rule.name);
        }
        if rule.preset.is_none() && rule.patterns.is_empty() {
            anyhow::bail!("rule {:?} needs patterns or a preset", rule.name);
        }
        if rule.max_shown == Some(0) {
            anyhow::bail!("rule {:?}: max_shown must be at least 1", rule.name);
        }
        rule.to_rule()
            .map_err(|e| anyhow::anyhow!("invalid rule {:?}: {}", rule.name, e))?;
    }

    config
        .include_set()
        .map_err(|e| anyhow::anyhow!("invalid include pattern: {}", e))?;
    config
        .exclude_set()
        .map_err(|e| anyhow::anyhow!("invalid exclude pattern: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1"
name: "Frontend"
exclude:
  - "**/vendor/**"
rules:
  - name: no-let
    preset: mutable-declaration
    allow:
      - src/legacy.js
      - src/app.js:12
  - name: no-console
    patterns: ['console\.log\(']
    noun: console call
    fix_hint: Use the logger
    max_shown: 3
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "Frontend");
        assert_eq!(config.rules.len(), 2);
        validate(&config).unwrap();

        let checks = config.checks().unwrap();
        assert_eq!(checks[0].rule.name(), "no-let");
        assert_eq!(checks[0].rule.reason(), "Mutable variable declaration (let/var)");
        assert_eq!(checks[0].allowlist.len(), 2);
        assert_eq!(checks[0].report.noun, "mutable declaration");
        assert_eq!(checks[1].report.max_shown, 3);
        assert_eq!(checks[1].report.fix_hint.as_deref(), Some("Use the logger"));
        assert_eq!(checks[1].rule.reason(), "no-console");
    }

    #[test]
    fn test_scope_override() {
        let yaml = r#"
rules:
  - name: lookup
    patterns: ['\.find\(']
    scope: iteration-callback
  - name: lookups-anywhere
    preset: nested-lookup
    scope: line
  - name: custom-lookup
    preset: nested-lookup
    patterns: ['\.findLast\(']
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let checks = config.checks().unwrap();
        assert_eq!(
            checks[0].rule.scope(),
            Scope::Nested(DepthPredicate::InsideIteration)
        );
        assert_eq!(checks[1].rule.scope(), Scope::Line);
        assert_eq!(
            checks[2].rule.scope(),
            Scope::Nested(DepthPredicate::InsideIteration)
        );
        assert_eq!(checks[2].rule.patterns().sources(), vec![r"\.findLast\("]);
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let no_rules = Config::default();
        assert!(validate(&no_rules).is_err());

        let bad_regex: Config = serde_yaml::from_str("rules:\n  - name: x\n    patterns: ['(']\n").unwrap();
        let err = validate(&bad_regex).unwrap_err().to_string();
        assert!(err.contains("invalid rule"), "{}", err);

        let no_patterns: Config = serde_yaml::from_str("rules:\n  - name: x\n").unwrap();
        assert!(validate(&no_patterns).is_err());

        let unknown: Config = serde_yaml::from_str("rules:\n  - name: x\n    preset: nope\n").unwrap();
        assert!(validate(&unknown).is_err());

        let dup: Config = serde_yaml::from_str(
            "rules:\n  - name: x\n    patterns: [a]\n  - name: x\n    patterns: [b]\n",
        )
        .unwrap();
        assert!(validate(&dup).is_err());

        let bad_glob: Config =
            serde_yaml::from_str("exclude: ['[']\nrules:\n  - name: x\n    patterns: [a]\n").unwrap();
        assert!(validate(&bad_glob).is_err());
    }

    #[test]
    fn test_default_include() {
        let config = Config::default();
        let include = config.include_set().unwrap();
        assert!(include.is_match("src/app.js"));
        assert!(include.is_match("src/deep/view.tsx"));
        assert!(!include.is_match("README.md"));
    }
}
