//! Engine configuration.
//!
//! One immutable [`IntegrityConfig`] value carries every pattern and toggle the
//! passes need; it is loaded once and threaded through constructors.
use crate::model::SpecType;
use anyhow::{anyhow, Context, Result};
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `contracts.config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Config file name at the workspace root.
pub const CONFIG_FILE_NAME: &str = "contracts.config.json";

const IGNORED_DIRS: [&str; 9] = [
    "node_modules",
    "dist",
    "build",
    ".git",
    ".next",
    ".turbo",
    "coverage",
    "target",
    "out",
];

const SPEC_SUFFIXES: [&str; 20] = [
    "operation",
    "operations",
    "command",
    "query",
    "event",
    "presentation",
    "capability",
    "workflow",
    "data-view",
    "form",
    "migration",
    "experiment",
    "integration",
    "knowledge",
    "telemetry",
    "app-config",
    "policy",
    "test-spec",
    "feature",
    "contracts",
];

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct IntegrityConfig {
    pub schema_version: u32,
    /// Globs selecting spec-bearing and feature documents.
    #[serde(default = "default_spec_patterns")]
    pub spec_patterns: Vec<String>,
    /// Globs excluded from every scan (build output, dependencies).
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
    /// Globs selecting source files searched during implementation discovery.
    #[serde(default = "default_source_patterns")]
    pub source_patterns: Vec<String>,
    /// Categories whose entries must have at least one test spec.
    #[serde(default)]
    pub require_tests_for: Vec<SpecType>,
    #[serde(default)]
    pub implementations: ResolverConfig,
    #[serde(default)]
    pub fix: FixConfig,
}

/// Toggles for the implementation resolver.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResolverConfig {
    #[serde(default = "enabled")]
    pub explicit: bool,
    #[serde(default = "enabled")]
    pub discovery: bool,
    #[serde(default = "enabled")]
    pub convention: bool,
    #[serde(default = "enabled")]
    pub compute_hashes: bool,
    /// Output directories convention paths are computed under.
    #[serde(default = "default_convention_dirs")]
    pub convention_dirs: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            explicit: true,
            discovery: true,
            convention: true,
            compute_hashes: true,
            convention_dirs: default_convention_dirs(),
        }
    }
}

/// Settings for the fix dispatcher.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FixConfig {
    /// Directory skeleton specs are written under; defaults to the feature's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton_dir: Option<String>,
}

fn enabled() -> bool {
    true
}

fn default_spec_patterns() -> Vec<String> {
    SPEC_SUFFIXES
        .iter()
        .map(|suffix| format!("**/*.{suffix}.ts"))
        .collect()
}

fn default_ignore() -> Vec<String> {
    IGNORED_DIRS
        .iter()
        .flat_map(|dir| [format!("**/{dir}"), format!("**/{dir}/**")])
        .collect()
}

fn default_source_patterns() -> Vec<String> {
    ["ts", "tsx", "js", "jsx"]
        .iter()
        .map(|ext| format!("**/*.{ext}"))
        .collect()
}

fn default_convention_dirs() -> Vec<String> {
    vec!["src".to_string()]
}

/// Build the default config used when a workspace has none.
pub fn default_config() -> IntegrityConfig {
    IntegrityConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        spec_patterns: default_spec_patterns(),
        ignore: default_ignore(),
        source_patterns: default_source_patterns(),
        require_tests_for: Vec::new(),
        implementations: ResolverConfig::default(),
        fix: FixConfig::default(),
    }
}

/// Render a pretty JSON config stub for new workspaces.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

/// Path of the config file for a workspace root.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load `contracts.config.json` from the workspace root.
pub fn load_config(root: &Path) -> Result<IntegrityConfig> {
    let path = config_path(root);
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: IntegrityConfig =
        serde_json::from_slice(&bytes).context("parse integrity config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load the workspace config, or the defaults when the file is absent.
pub fn load_or_default(root: &Path) -> Result<IntegrityConfig> {
    if config_path(root).is_file() {
        load_config(root)
    } else {
        tracing::debug!(root = %root.display(), "no config file; using defaults");
        Ok(default_config())
    }
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(root: &Path, config: &IntegrityConfig) -> Result<()> {
    let path = config_path(root);
    fs::create_dir_all(root).with_context(|| format!("create {}", root.display()))?;
    let text = serde_json::to_string_pretty(config).context("serialize integrity config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version, globs, and directory entries.
pub fn validate_config(config: &IntegrityConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported integrity config schema_version {}",
            config.schema_version
        ));
    }
    if config.spec_patterns.is_empty() {
        return Err(anyhow!("spec_patterns must be non-empty"));
    }
    for (label, globs) in [
        ("spec_patterns", &config.spec_patterns),
        ("ignore", &config.ignore),
        ("source_patterns", &config.source_patterns),
    ] {
        for glob in globs {
            Glob::new(glob).with_context(|| format!("{label} has invalid glob {glob:?}"))?;
        }
    }
    if let Some(kind) = config
        .require_tests_for
        .iter()
        .find(|kind| **kind == SpecType::Feature)
    {
        return Err(anyhow!("require_tests_for cannot include {kind}"));
    }
    for dir in &config.implementations.convention_dirs {
        validate_relative_path(dir, "convention_dirs")?;
    }
    if let Some(dir) = config.fix.skeleton_dir.as_deref() {
        validate_relative_path(dir, "skeleton_dir")?;
    }
    Ok(())
}

fn validate_relative_path(rel: &str, label: &str) -> Result<()> {
    let path = Path::new(rel);
    if path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} entries must be relative paths without '..' (got {rel:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, std::path::Component::ParentDir))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
