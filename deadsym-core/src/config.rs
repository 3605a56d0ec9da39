//! Configuration loading from deadsym.toml.
//!
//! Every field is optional. The accessors fall back to the defaults the
//! editor integration has always used, so an absent file and an empty
//! file behave the same.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

/// File extensions analyzed when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "vue", "svelte", "py", "go", "rb", "php",
];

/// Folder names skipped when none are configured.
pub const DEFAULT_EXCLUDE_FOLDERS: &[&str] =
    &["node_modules", ".next", "dist", "build", "out", ".git"];

/// Debounce window for edit-driven re-analysis.
pub const DEFAULT_AUTO_ANALYZE_DELAY_MS: u64 = 500;

/// Bound on external service initialization and calls.
pub const DEFAULT_SERVICE_TIMEOUT_MS: u64 = 30_000;

/// Main configuration structure for deadsym.toml.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DeadsymConfig {
    /// File extensions to analyze (without the dot).
    pub extensions: Option<Vec<String>>,
    /// Folder names that are never descended into.
    pub exclude_folders: Option<Vec<String>>,
    /// Debounce delay for auto-analysis, in milliseconds.
    pub auto_analyze_delay_ms: Option<u64>,
    /// Path patterns to ignore (`prefix*`, `*suffix`, or substring).
    pub ignore: Option<Vec<String>>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
    /// External analysis service configuration.
    pub service: Option<ServiceConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

/// External analysis service configuration.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ServiceConfig {
    /// Program and arguments of the analyzer process.
    pub command: Option<Vec<String>>,
    /// Initialization and call timeout, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl DeadsymConfig {
    /// Extensions to analyze, lowercased.
    pub fn extensions(&self) -> Vec<String> {
        match &self.extensions {
            Some(exts) => exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            None => DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Folder names to exclude.
    pub fn exclude_folders(&self) -> Vec<String> {
        match &self.exclude_folders {
            Some(dirs) => dirs.clone(),
            None => DEFAULT_EXCLUDE_FOLDERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Debounce window for auto-analysis.
    pub fn auto_analyze_delay(&self) -> Duration {
        Duration::from_millis(
            self.auto_analyze_delay_ms
                .unwrap_or(DEFAULT_AUTO_ANALYZE_DELAY_MS),
        )
    }

    /// Ignore patterns, empty when unset.
    pub fn ignore_patterns(&self) -> Vec<String> {
        self.ignore.clone().unwrap_or_default()
    }

    /// Service command line, if one is configured and non-empty.
    pub fn service_command(&self) -> Option<Vec<String>> {
        self.service
            .as_ref()
            .and_then(|s| s.command.clone())
            .filter(|cmd| !cmd.is_empty())
    }

    /// Service timeout.
    pub fn service_timeout(&self) -> Duration {
        Duration::from_millis(
            self.service
                .as_ref()
                .and_then(|s| s.timeout_ms)
                .unwrap_or(DEFAULT_SERVICE_TIMEOUT_MS),
        )
    }

    /// Whether JSON output was requested in the file.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from deadsym.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<DeadsymConfig>> {
    let path = root.join("deadsym.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content).context("Invalid deadsym.toml")?;
    Ok(Some(cfg))
}
