//! Configuration loading for pagescore

mod schema;

pub use schema::{Config, ConfigOverride, EffectiveConfig, DEFAULT_FILE_PATTERNS};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".pagescorerc.json";

/// Threshold written by `pagescore init` when none is given
pub const DEFAULT_INIT_THRESHOLD: u8 = 70;

/// Find and load config file with extends resolution. Searches current directory then parents.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_with_extends(&path, &mut HashSet::new())
        }
        None => Ok(Config::default()),
    }
}

/// Load a config file and resolve its extends chain
fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !visited.insert(canonical) {
        anyhow::bail!(
            "Circular extends detected in config: {}",
            config_path.display()
        );
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in config: {}", config_path.display()))?;

    if let Some(extends) = config.extends.take() {
        let base_config = resolve_extends(config_path, &extends, visited)?;
        config.merge_from(base_config);
    }

    Ok(config)
}

fn resolve_extends(
    config_path: &Path,
    extends: &str,
    visited: &mut HashSet<PathBuf>,
) -> Result<Config> {
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let extends_path = Path::new(extends);
    let extends_path = if extends_path.is_absolute() {
        extends_path.to_path_buf()
    } else {
        config_dir.join(extends_path)
    };

    let extends_path = if extends_path.extension().is_none() {
        extends_path.with_extension("json")
    } else {
        extends_path
    };

    if !extends_path.exists() {
        anyhow::bail!(
            "Extended config not found: {} (referenced from {})",
            extends_path.display(),
            config_path.display()
        );
    }

    load_config_with_extends(&extends_path, visited)
}

/// Search for .pagescorerc.json in directory and its parents
fn find_config_in_parents(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.exists())
}

/// Build a GlobSet from ignore patterns for path matching
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().context("Failed to build ignore patterns")
}

/// Check if a path should be ignored based on config glob patterns
pub fn is_ignored(path: &Path, ignore_set: &GlobSet) -> bool {
    let without_cur_dir: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    ignore_set.is_match(path) || ignore_set.is_match(without_cur_dir)
}

/// Find the project root directory (containing .git or a config file)
pub fn find_project_root(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .find(|dir| dir.join(".git").exists() || dir.join(CONFIG_FILENAME).exists())
        .map(Path::to_path_buf)
}

/// URL a local page is considered served from.
///
/// With a base URL this is the base joined with the page path relative to the
/// project root; otherwise a `file://` URL, which has no hostname.
pub fn page_url(path: &Path, project_root: &Path, base_url: Option<&str>) -> String {
    let Some(base) = base_url else {
        return crate::source::file_url(path);
    };

    let relative = relative_to(path, project_root);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    format!("{}/{}", base.trim_end_matches('/'), segments.join("/"))
}

/// Path of `path` below `root`, without `.` components. Paths outside the
/// root fall back to their file name.
pub(crate) fn relative_to(path: &Path, root: &Path) -> PathBuf {
    let relative = match path.strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => {
            let canonical_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
            match canonical_path.strip_prefix(&canonical_root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => path.file_name().map(PathBuf::from).unwrap_or_default(),
            }
        }
    };
    relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Starter config written by `pagescore init`
pub fn starter_config(threshold: Option<u8>, base_url: Option<&str>) -> Config {
    Config {
        threshold: Some(threshold.unwrap_or(DEFAULT_INIT_THRESHOLD)),
        base_url: base_url.map(str::to_string),
        ignore: vec![
            "**/node_modules/**".to_string(),
            "**/dist/**".to_string(),
            "**/vendor/**".to_string(),
        ],
        file_patterns: DEFAULT_FILE_PATTERNS.iter().map(|s| s.to_string()).collect(),
        ..Config::default()
    }
}

/// Write a starter config into `dir`. Refuses to overwrite an existing file.
pub fn write_starter_config(
    dir: &Path,
    threshold: Option<u8>,
    base_url: Option<&str>,
) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists; use --dir to write elsewhere or remove it first",
            config_path.display()
        );
    }

    let config = starter_config(threshold, base_url);
    let mut json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    json.push('\n');
    fs::write(&config_path, json)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_ignored_vendor() {
        let set = build_ignore_set(&["**/vendor/**".to_string()]).unwrap();
        assert!(is_ignored(Path::new("site/vendor/lib/index.html"), &set));
        assert!(!is_ignored(Path::new("site/index.html"), &set));

        let set = build_ignore_set(&["drafts/**".to_string()]).unwrap();
        assert!(is_ignored(Path::new("./drafts/wip.html"), &set));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let err = build_ignore_set(&["a[".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid ignore pattern"));
    }

    #[test]
    fn test_config_found_in_parent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{ "threshold": 65 }"#).unwrap();
        let nested = dir.path().join("pages").join("blog");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested, None).unwrap();
        assert_eq!(config.threshold, Some(65));
    }

    #[test]
    fn test_config_extends() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("base.json"),
            r#"{
                "threshold": 70,
                "baseUrl": "https://base.example.com",
                "ignore": ["**/legacy/**"],
                "filePatterns": [".html"]
            }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{
                "extends": "./base.json",
                "threshold": 80,
                "ignore": ["**/drafts/**"],
                "filePatterns": [".xhtml"]
            }"#,
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();

        assert_eq!(config.threshold, Some(80));
        assert_eq!(config.base_url.as_deref(), Some("https://base.example.com"));
        assert_eq!(config.ignore, vec!["**/legacy/**", "**/drafts/**"]);
        assert_eq!(config.file_patterns, vec![".html", ".xhtml"]);
    }

    #[test]
    fn test_extends_without_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("shared.json"), r#"{ "threshold": 55 }"#).unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{ "extends": "shared" }"#).unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.threshold, Some(55));
    }

    #[test]
    fn test_circular_extends_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{ "extends": "./b.json" }"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"{ "extends": "./a.json" }"#).unwrap();

        let err = load_config(dir.path(), Some(Path::new("a.json"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Circular extends"));
    }

    #[test]
    fn test_missing_custom_config_is_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(dir.path(), Some(Path::new("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        let err = load_config(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_config_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "threshold": 70,
                "baseUrl": "https://example.com",
                "overrides": [
                    { "files": ["**/legacy/**"], "threshold": 50 },
                    { "files": ["docs/**"], "baseUrl": "https://docs.example.com" }
                ]
            }"#,
        )
        .unwrap();

        let root = Path::new("/srv/project");
        let effective = config.effective_for_file(&root.join("site/index.html"), root);
        assert_eq!(effective.threshold, Some(70));
        assert_eq!(effective.base_url.as_deref(), Some("https://example.com"));

        let effective = config.effective_for_file(&root.join("site/legacy/old.html"), root);
        assert_eq!(effective.threshold, Some(50));

        let effective = config.effective_for_file(&root.join("docs/guide.html"), root);
        assert_eq!(effective.threshold, Some(70));
        assert_eq!(effective.base_url.as_deref(), Some("https://docs.example.com"));
    }

    #[test]
    fn test_override_matches_dot_prefixed_walk_paths() {
        let config: Config = serde_json::from_str(
            r#"{ "overrides": [{ "files": ["docs/**"], "threshold": 50 }] }"#,
        )
        .unwrap();

        let root = Path::new(".");
        let effective = config.effective_for_file(Path::new("./docs/guide.html"), root);
        assert_eq!(effective.threshold, Some(50));

        let effective = config.effective_for_file(Path::new("./site/docs.html"), root);
        assert_eq!(effective.threshold, None);
    }

    #[test]
    fn test_relative_to_drops_cur_dir() {
        assert_eq!(
            relative_to(Path::new("./docs/./guide.html"), Path::new(".")),
            PathBuf::from("docs/guide.html")
        );
        assert_eq!(
            relative_to(Path::new("/srv/site/a/b.html"), Path::new("/srv/site")),
            PathBuf::from("a/b.html")
        );
    }

    #[test]
    fn test_cli_overrides_config() {
        let config: Config =
            serde_json::from_str(r#"{ "threshold": 70, "baseUrl": "https://a.example" }"#).unwrap();
        let merged = config.merge_with_cli(Some(90), Some("https://b.example"));
        assert_eq!(merged.threshold, Some(90));
        assert_eq!(merged.base_url.as_deref(), Some("https://b.example"));

        let config: Config = serde_json::from_str(r#"{ "threshold": 70 }"#).unwrap();
        let merged = config.merge_with_cli(None, None);
        assert_eq!(merged.threshold, Some(70));
        assert_eq!(merged.base_url, None);
    }

    #[test]
    fn test_page_file_patterns() {
        let config = Config::default();
        assert!(config.is_page_file(Path::new("index.html")));
        assert!(config.is_page_file(Path::new("LEGACY.HTM")));
        assert!(!config.is_page_file(Path::new("style.css")));

        let config: Config = serde_json::from_str(r#"{ "filePatterns": [".xhtml"] }"#).unwrap();
        assert!(config.is_page_file(Path::new("page.xhtml")));
        assert!(!config.is_page_file(Path::new("index.html")));
    }

    #[test]
    fn test_page_url_with_base() {
        let root = Path::new("/srv/site");
        assert_eq!(
            page_url(Path::new("/srv/site/blog/post.html"), root, Some("https://example.com/")),
            "https://example.com/blog/post.html"
        );
        assert_eq!(
            page_url(Path::new("/srv/site/index.html"), root, Some("https://example.com")),
            "https://example.com/index.html"
        );
    }

    #[test]
    fn test_page_url_without_base_is_file_url() {
        let url = page_url(Path::new("/srv/site/index.html"), Path::new("/srv/site"), None);
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("index.html"));
    }

    #[test]
    fn test_find_project_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("public").join("blog");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_package_json_is_not_a_root_marker() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let app = dir.path().join("app");
        fs::create_dir_all(app.join("public")).unwrap();
        fs::write(app.join("package.json"), "{}").unwrap();

        assert_eq!(find_project_root(&app.join("public")), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn test_write_starter_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = write_starter_config(dir.path(), Some(85), Some("https://example.com")).unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.threshold, Some(85));
        assert_eq!(config.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(config.file_patterns, vec![".html", ".htm"]);

        let before = fs::read_to_string(&path).unwrap();
        assert!(write_starter_config(dir.path(), Some(10), None).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_starter_config_default_threshold() {
        let config = starter_config(None, None);
        assert_eq!(config.threshold, Some(DEFAULT_INIT_THRESHOLD));
        assert!(config.base_url.is_none());
    }
}
