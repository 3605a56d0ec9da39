//! deadsym CLI - unused import, variable and parameter detector.
//!
//! Features:
//! - Workspace-wide usage (default) or per-file analysis (`--single`)
//! - Vue and Svelte component scripts
//! - External analyzer process for Python, Go, Ruby and PHP
//! - Incremental caching in `.deadsym/cache.json`
//! - Plain or JSON output, CI-friendly exit codes

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};
use std::time::Duration;

use deadsym_core::{
    init_structured_logging, load_config, log_error, log_event, print_json, print_plain,
    AnalysisMode, Deadsym, DeadsymConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Unused symbol detector for JavaScript and TypeScript")]
pub struct Cli {
    /// Path to the project root
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Analyze each file on its own (exported symbols are never reported)
    #[arg(long)]
    single: bool,

    /// Neither read nor write the on-disk cache
    #[arg(long)]
    no_cache: bool,

    /// File extension to analyze, replacing the defaults (repeatable)
    #[arg(long = "ext", value_name = "EXT", action = ArgAction::Append)]
    extensions: Vec<String>,

    /// Folder name to skip, replacing the defaults (repeatable)
    #[arg(long, value_name = "DIR", action = ArgAction::Append)]
    exclude: Vec<String>,

    /// Path pattern to ignore: `prefix*`, `*suffix` or substring (repeatable)
    #[arg(long, value_name = "PATTERN", action = ArgAction::Append)]
    ignore: Vec<String>,

    /// External analyzer command line, e.g. "deadsym-backend --stdio"
    #[arg(long, value_name = "CMD")]
    service: Option<String>,

    /// Timeout for the external analyzer, in milliseconds
    #[arg(long, value_name = "N")]
    service_timeout_ms: Option<u64>,

    /// Print the language label for FILE and exit
    #[arg(long, value_name = "FILE")]
    detect: Option<String>,
}

/// Splits a service command line on whitespace.
fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Validates the analysis root: must be an existing directory.
fn validate_root(path: &str) -> Result<PathBuf> {
    let root = PathBuf::from(path);
    if !root.is_dir() {
        return Err(anyhow!("Not a directory: {}", path));
    }
    Ok(root)
}

/// Builds the analysis with config values first and CLI flags on top.
fn build_analysis(cli: &Cli, root: &Path, config: Option<&DeadsymConfig>) -> Deadsym {
    let mut builder = Deadsym::new(root).with_cache(!cli.no_cache);

    if let Some(config) = config {
        builder = builder.with_config(config);
    }
    if cli.single {
        builder = builder.mode(AnalysisMode::SingleFile);
    }
    if !cli.extensions.is_empty() {
        builder = builder.extensions(cli.extensions.iter().cloned());
    }
    if !cli.exclude.is_empty() {
        builder = builder.exclude_dirs(cli.exclude.iter().cloned());
    }
    if !cli.ignore.is_empty() {
        builder = builder.ignore_patterns(cli.ignore.iter().cloned());
    }
    if let Some(ref command) = cli.service {
        builder = builder.service_command(split_command(command));
    }
    if let Some(millis) = cli.service_timeout_ms {
        builder = builder.service_timeout(Duration::from_millis(millis));
    }
    builder
}

fn wants_json(cli: &Cli, config: Option<&DeadsymConfig>) -> bool {
    cli.json || config.is_some_and(DeadsymConfig::wants_json)
}

fn fatal(err: anyhow::Error) -> ! {
    let message = format!("{:#}", err);
    log_error(&message);
    eprintln!("[ERROR] {}", message);
    std::process::exit(2);
}

fn main() -> Result<()> {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] deadsym internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
        std::process::exit(2);
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    // 1. Root and config
    let root = validate_root(&cli.path).unwrap_or_else(|e| fatal(e));
    let config = load_config(&root)
        .with_context(|| format!("Failed to load config from {}", root.display()))
        .unwrap_or_else(|e| fatal(e));

    let analysis = build_analysis(&cli, &root, config.as_ref());

    // 2. Language detection mode
    if let Some(ref file) = cli.detect {
        let label = analysis.detect_language(file).unwrap_or_else(|e| fatal(e));
        println!("{}", label);
        return Ok(());
    }

    // 3. Analyze
    let report = analysis.analyze().unwrap_or_else(|e| fatal(e));

    log_event(
        "analysis_complete",
        &format!(
            "{} unused symbols in {} files",
            report.summary.total, report.files_scanned
        ),
    );

    // 4. Report results
    if wants_json(&cli, config.as_ref()) {
        print_json(&report);
    } else {
        print_plain(&report);
    }

    // 5. Exit code (CI-friendly)
    std::process::exit(if report.has_findings() { 1 } else { 0 });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("deadsym_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("deadsym").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.path, ".");
        assert!(!cli.json && !cli.single && !cli.no_cache);
        assert!(cli.extensions.is_empty());
        assert!(cli.detect.is_none());
    }

    #[test]
    fn test_repeated_flags() {
        let cli = parse(&["src", "--ext", "ts", "--ext", "vue", "--ignore", "gen/*", "--single"]);
        assert_eq!(cli.path, "src");
        assert_eq!(cli.extensions, vec!["ts", "vue"]);
        assert_eq!(cli.ignore, vec!["gen/*"]);
        assert!(cli.single);
    }

    #[test]
    fn test_path_after_list_flags() {
        let cli = parse(&["--ext", "ts", "--exclude", "dist", "--ignore", "gen/*", "src"]);
        assert_eq!(cli.path, "src");
        assert_eq!(cli.extensions, vec!["ts"]);
        assert_eq!(cli.exclude, vec!["dist"]);
        assert_eq!(cli.ignore, vec!["gen/*"]);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(
            split_command("  backend --stdio  -v "),
            vec!["backend", "--stdio", "-v"]
        );
        assert!(split_command("   ").is_empty());
    }

    #[test]
    fn test_validate_root() {
        let dir = create_temp_dir("root");
        assert!(validate_root(dir.to_str().unwrap()).is_ok());
        assert!(validate_root(dir.join("missing").to_str().unwrap()).is_err());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_flags_win_over_config() {
        let dir = create_temp_dir("merge");
        fs::write(dir.join("a.ts"), "const a = 1;").unwrap();
        fs::write(dir.join("b.js"), "const b = 1;").unwrap();

        let config: DeadsymConfig = toml::from_str("extensions = [\"js\"]").unwrap();
        let cli = parse(&["--no-cache", "--ext", "ts"]);
        let report = build_analysis(&cli, &dir, Some(&config)).analyze().unwrap();

        assert_eq!(report.files_scanned, 1);
        assert!(report.results.contains_key("a.ts"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_output_format() {
        let config: DeadsymConfig = toml::from_str("[output]\nformat = \"json\"").unwrap();
        assert!(wants_json(&parse(&[]), Some(&config)));
        assert!(wants_json(&parse(&["--json"]), None));
        assert!(!wants_json(&parse(&[]), None));
    }
}
