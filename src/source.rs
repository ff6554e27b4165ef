//! Page sources: local HTML files and, with the `fetch` feature, live URLs
//!
//! Live fetching requires the `fetch` feature:
//! ```toml
//! pagescore = { version = "0.3", features = ["fetch"] }
//! ```

use crate::PageSnapshot;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to obtain a page snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot fetch {0}: live URLs need the fetch feature (cargo build --features fetch)")]
    FetchUnavailable(String),
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// Whether the target names a live page rather than a local file
pub fn is_remote(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Whether this build can fetch live pages
pub fn is_fetch_available() -> bool {
    cfg!(feature = "fetch")
}

/// Read a local HTML file
pub fn read_html(path: &Path) -> Result<String, SnapshotError> {
    fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a local HTML file into a snapshot served from `url`
pub fn load_file(path: &Path, url: &str) -> Result<PageSnapshot, SnapshotError> {
    let html = read_html(path)?;
    Ok(PageSnapshot::parse(&html, url))
}

/// `file://` URL for a local path (absolute when the path can be resolved)
pub fn file_url(path: &Path) -> String {
    let absolute = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf());
    let display = absolute.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{}", display)
    } else {
        format!("file:///{}", display)
    }
}

/// Fetch a live page and snapshot it under its own URL
pub fn fetch_page(url: &str) -> Result<PageSnapshot, SnapshotError> {
    let html = fetch_html(url)?;
    Ok(PageSnapshot::parse(&html, url))
}

#[cfg(feature = "fetch")]
pub fn fetch_html(url: &str) -> Result<String, SnapshotError> {
    let fail = |reason: String| SnapshotError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pagescore/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let response = client.get(url).send().map_err(|e| fail(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fail(format!("HTTP {}", status)));
    }
    response.text().map_err(|e| fail(e.to_string()))
}

#[cfg(not(feature = "fetch"))]
pub fn fetch_html(url: &str) -> Result<String, SnapshotError> {
    Err(SnapshotError::FetchUnavailable(url.to_string()))
}
