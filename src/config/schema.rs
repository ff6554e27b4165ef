//! Config schema and deserialization

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Page suffixes used when `filePatterns` is not set
pub const DEFAULT_FILE_PATTERNS: [&str; 2] = [".html", ".htm"];

/// Per-path override configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverride {
    /// Glob patterns this override applies to
    pub files: Vec<String>,

    /// Optional threshold override for matched pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,

    /// Optional base URL for matched pages (e.g. a docs subtree served elsewhere)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Root config structure for .pagescorerc.json
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config, or absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Minimum overall score (exit 1 if below). Default: 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,

    /// URL local pages are considered served from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Glob patterns for files/directories to exclude from analysis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    /// File suffixes treated as pages (default: .html, .htm)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_patterns: Vec<String>,

    /// Per-path configuration overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ConfigOverride>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(mut self, cli_threshold: Option<u8>, cli_base_url: Option<&str>) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        if let Some(url) = cli_base_url {
            self.base_url = Some(url.to_string());
        }
        self
    }

    /// Get effective config for a specific page path, applying overrides in order.
    /// Override globs match the path relative to `project_root`.
    pub fn effective_for_file(&self, file_path: &Path, project_root: &Path) -> EffectiveConfig {
        let relative = super::relative_to(file_path, project_root);
        let mut effective = EffectiveConfig {
            threshold: self.threshold,
            base_url: self.base_url.clone(),
        };

        for override_cfg in &self.overrides {
            if Self::matches_override(&relative, &override_cfg.files) {
                if let Some(threshold) = override_cfg.threshold {
                    effective.threshold = Some(threshold);
                }
                if let Some(ref base_url) = override_cfg.base_url {
                    effective.base_url = Some(base_url.clone());
                }
            }
        }

        effective
    }

    fn matches_override(file_path: &Path, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(file_path))
                .unwrap_or(false)
        })
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.base_url.is_none() {
            self.base_url = base.base_url;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }

        let mut all_ignores = base.ignore;
        all_ignores.append(&mut self.ignore);
        self.ignore = all_ignores;

        let mut all_patterns = base.file_patterns;
        all_patterns.append(&mut self.file_patterns);
        self.file_patterns = all_patterns;

        // Base overrides first so the child's win when both match
        let mut all_overrides = base.overrides;
        all_overrides.append(&mut self.overrides);
        self.overrides = all_overrides;
    }

    /// Page file suffixes, falling back to the defaults
    pub fn get_file_patterns(&self) -> Vec<&str> {
        if self.file_patterns.is_empty() {
            DEFAULT_FILE_PATTERNS.to_vec()
        } else {
            self.file_patterns.iter().map(|s| s.as_str()).collect()
        }
    }

    /// Whether a file name ends with one of the page suffixes (ASCII case-insensitive)
    pub fn is_page_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_ascii_lowercase()) else {
            return false;
        };
        self.get_file_patterns()
            .iter()
            .any(|suffix| name.ends_with(&suffix.to_ascii_lowercase()))
    }
}

/// Effective configuration for a specific page (after applying overrides)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub threshold: Option<u8>,
    pub base_url: Option<String>,
}
