//! Command-line interface for guardrail.

use clap::{Parser, Subcommand, ValueEnum};
use globset::GlobSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{self, Config};
use crate::report::{self, ReportOptions};
use crate::rules;
use crate::scan::{Check, FsReader, Runner};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["guardrail.yaml", ".guardrail.yaml"];

/// Directories never descended into during discovery.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target"];

/// Line-based code-quality guardrails for JavaScript and TypeScript.
///
/// Guardrail scans sources for disallowed constructs (mutable
/// declarations, object mutation, nested lookups and friends), honours
/// per-rule allowlists of grandfathered exceptions, and fails when new
/// violations appear.
#[derive(Parser)]
#[command(name = "guardrail")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check sources against the configured rules
    #[command(visible_alias = "lint")]
    Check(CheckArgs),
    /// Report allowlist entries that no longer match anything
    Stale(StaleArgs),
    /// Create a starter guardrail config
    Init(InitArgs),
    /// List built-in rule presets
    Presets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Pretty,
    Json,
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,

    /// Scan files in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Show allowlisted hits in output
    #[arg(long)]
    pub show_allowed: bool,
}

/// Arguments for the stale command.
#[derive(Parser)]
pub struct StaleArgs {
    /// Project root the allowlist paths are relative to
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: Format,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "guardrail.yaml")]
    pub output: PathBuf,
}

const DEFAULT_TEMPLATE: &str = include_str!("templates/default.yaml");

/// Discover a config file in `root`, then in the current directory.
pub fn discover_config(root: &Path) -> anyhow::Result<PathBuf> {
    let dirs = [root.to_path_buf(), PathBuf::from(".")];
    for dir in &dirs {
        for name in DEFAULT_CONFIG_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                return Ok(path);
            }
        }
    }
    anyhow::bail!(
        "no config file found (looked for {})",
        DEFAULT_CONFIG_NAMES.join(", ")
    )
}

/// Relative path with forward slashes, as used in allowlist entries.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Collect files under `root` matching `include` and not `exclude`.
///
/// Returned paths are root-relative and sorted.
pub fn collect_files(root: &Path, include: &GlobSet, exclude: &GlobSet) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIPPED_DIRS.contains(&&*name)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(key) = relative_key(root, entry.path()) else {
            continue;
        };
        if include.is_match(&key) && !exclude.is_match(&key) {
            files.push(key);
        }
    }

    files.sort();
    debug!(root = %root.display(), files = files.len(), "collected files");
    Ok(files)
}

/// Loaded and validated config plus its compiled checks.
struct Loaded {
    config_path: PathBuf,
    config: Config,
    checks: Vec<Check>,
}

fn load_config(explicit: Option<&PathBuf>, root: &Path) -> Result<Loaded, i32> {
    let config_path = match explicit {
        Some(p) => p.clone(),
        None => match discover_config(root) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Run 'guardrail init' to create a config file");
                return Err(EXIT_ERROR);
            }
        },
    };

    let config = match Config::parse_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error parsing config: {}", e);
            return Err(EXIT_ERROR);
        }
    };

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Err(EXIT_ERROR);
    }

    let checks = match config.checks() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(EXIT_ERROR);
        }
    };

    debug!(config = %config_path.display(), rules = checks.len(), "config loaded");
    Ok(Loaded {
        config_path,
        config,
        checks,
    })
}

/// Split the target into a scan root and the files under it.
///
/// A directory target is its own root. A single file is keyed relative
/// to the directory holding the config, so its keys line up with the
/// allowlist entries; a file outside that directory falls back to its
/// parent.
fn resolve_target(path: &Path, config: &Config, config_path: &Path) -> anyhow::Result<(PathBuf, Vec<String>)> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("cannot access path {:?}: {}", path, e))?;

    if metadata.is_dir() {
        let files = collect_files(path, &config.include_set()?, &config.exclude_set()?)?;
        return Ok((path.to_path_buf(), files));
    }

    let file = path.canonicalize()?;
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .canonicalize()?;

    if let Some(key) = relative_key(&config_dir, &file) {
        return Ok((config_dir, vec![key]));
    }

    let parent = file
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("not a file: {:?}", path))?;
    let key = relative_key(&parent, &file).ok_or_else(|| anyhow::anyhow!("not a file: {:?}", path))?;
    Ok((parent, vec![key]))
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    let loaded = match load_config(args.config.as_ref(), &args.path) {
        Ok(l) => l,
        Err(code) => return Ok(code),
    };

    let (root, files) = match resolve_target(&args.path, &loaded.config, &loaded.config_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if files.is_empty() {
        warn!(path = %args.path.display(), "no files to scan");
        eprintln!("Warning: no files to scan");
        return Ok(EXIT_SUCCESS);
    }

    let runner = Runner::new(FsReader::new(&root)).parallel(args.parallel);
    let result = runner.run(&files, &loaded.checks)?;

    let config_path = loaded.config_path.to_string_lossy().to_string();
    let path = args.path.to_string_lossy().to_string();

    match args.format {
        Format::Json => {
            report::write_json(&path, &config_path, &result, args.show_allowed)?;
        }
        Format::Pretty => {
            let options = |rule: &str| -> ReportOptions {
                loaded
                    .checks
                    .iter()
                    .find(|c| c.rule.name() == rule)
                    .map(|c| c.report.clone())
                    .unwrap_or_default()
            };
            report::write_pretty(&path, &config_path, &result, options, args.show_allowed);
        }
    }

    if result.is_clean() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the stale command.
pub fn run_stale(args: &StaleArgs) -> anyhow::Result<i32> {
    let loaded = match load_config(args.config.as_ref(), &args.path) {
        Ok(l) => l,
        Err(code) => return Ok(code),
    };

    if !args.path.is_dir() {
        eprintln!("Error: {} is not a directory", args.path.display());
        return Ok(EXIT_ERROR);
    }

    let runner = Runner::new(FsReader::new(&args.path));
    let stale = runner.stale(&loaded.checks)?;

    match args.format {
        Format::Json => report::write_stale_json(&stale)?,
        Format::Pretty => {
            let config_path = loaded.config_path.to_string_lossy().to_string();
            let path = args.path.to_string_lossy().to_string();
            report::write_stale_pretty(&path, &config_path, &stale);
        }
    }

    if stale.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, DEFAULT_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to pick rules and allowlist existing code", args.output.display());
    println!("  2. Run: guardrail check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// List built-in presets.
pub fn run_presets() -> anyhow::Result<i32> {
    println!("Available presets:");
    println!();

    for preset in rules::presets() {
        println!("  {:<22} {}", preset.name, preset.description);
    }

    println!();
    println!("Usage (in guardrail.yaml):");
    println!("  rules:");
    println!("    - name: my-rule");
    println!("      preset: <name>");

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/b")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("src/b/z.js"), "").unwrap();
        fs::write(root.join("src/a.ts"), "").unwrap();
        fs::write(root.join("src/readme.md"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join(".cache/x.js"), "").unwrap();
        fs::write(root.join("dist/bundle.js"), "").unwrap();

        let config: Config = serde_yaml::from_str("exclude: ['dist/**']\n").unwrap();
        let files = collect_files(
            root,
            &config.include_set().unwrap(),
            &config.exclude_set().unwrap(),
        )
        .unwrap();

        assert_eq!(files, vec!["src/a.ts".to_string(), "src/b/z.js".to_string()]);
    }

    fn project_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/project")
    }

    #[test]
    fn test_single_file_keyed_from_config_dir() {
        let project = project_path();
        let config_path = project.join("guardrail.yaml");
        let config = Config::parse_file(&config_path).unwrap();

        let (root, files) = resolve_target(&project.join("src/legacy.js"), &config, &config_path).unwrap();
        assert_eq!(root, project.canonicalize().unwrap());
        assert_eq!(files, vec!["src/legacy.js".to_string()]);
    }

    #[test]
    fn test_single_file_check_honours_allowlist() {
        let project = project_path();
        let args = CheckArgs {
            path: project.join("src/legacy.js"),
            config: Some(project.join("guardrail.yaml")),
            format: Format::Json,
            parallel: false,
            show_allowed: true,
        };
        assert_eq!(run_check(&args).unwrap(), EXIT_SUCCESS);

        let other = CheckArgs {
            path: project.join("src/app.js"),
            ..args
        };
        assert_eq!(run_check(&other).unwrap(), EXIT_FAILED);
    }

    #[test]
    fn test_file_outside_config_dir_uses_parent() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("conf/guardrail.yaml");
        fs::create_dir_all(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("elsewhere.js"), "let a = 1;\n").unwrap();

        let (_, files) =
            resolve_target(&dir.path().join("elsewhere.js"), &Config::default(), &config_path).unwrap();
        assert_eq!(files, vec!["elsewhere.js".to_string()]);
    }

    #[test]
    fn test_discover_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".guardrail.yaml"), "rules: []\n").unwrap();
        let found = discover_config(dir.path()).unwrap();
        assert!(found.ends_with(".guardrail.yaml"));
    }

    #[test]
    fn test_init_writes_valid_template() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("conf/guardrail.yaml");
        let code = run_init(&InitArgs { output: output.clone() }).unwrap();
        assert_eq!(code, EXIT_SUCCESS);

        let config = Config::parse_file(&output).unwrap();
        config::validate(&config).unwrap();
        assert_eq!(config.rules.len(), rules::presets().len());

        let again = run_init(&InitArgs { output }).unwrap();
        assert_eq!(again, EXIT_ERROR);
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from(["guardrail", "lint", "src", "-f", "json", "--parallel", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert_eq!(args.format, Format::Json);
                assert!(args.parallel);
            }
            _ => panic!("expected check"),
        }
    }
}
