//! Analysis result caching
//!
//! Caches page results keyed by the hash of the page HTML and the URL it is
//! served from, so unchanged pages are not re-analyzed. A hit returns the
//! result as first captured, timestamp included.

use crate::AnalysisResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const CACHE_VERSION: u32 = 1;
pub const CACHE_FILENAME: &str = ".pagescore-cache.json";

/// Cache entry for a single page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    /// SHA-256 of the page HTML and its URL
    content_hash: String,
    result: AnalysisResult,
    /// Seconds since the Unix epoch
    cached_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheData {
    version: u32,
    /// Page path -> entry
    entries: HashMap<String, CacheEntry>,
}

impl Default for CacheData {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// Cache manager for analysis results
pub struct AnalysisCache {
    cache_path: PathBuf,
    data: CacheData,
    dirty: bool,
    enabled: bool,
}

impl AnalysisCache {
    /// Open the cache stored at the project root. An unreadable or outdated
    /// cache file starts empty.
    pub fn new(project_root: &Path) -> Self {
        let cache_path = project_root.join(CACHE_FILENAME);
        let data = Self::load_cache(&cache_path).unwrap_or_default();
        tracing::debug!(
            path = %cache_path.display(),
            entries = data.entries.len(),
            "cache opened"
        );

        Self {
            cache_path,
            data,
            dirty: false,
            enabled: true,
        }
    }

    /// Create a disabled cache (no-op)
    pub fn disabled() -> Self {
        Self {
            cache_path: PathBuf::new(),
            data: CacheData::default(),
            dirty: false,
            enabled: false,
        }
    }

    fn load_cache(path: &Path) -> Option<CacheData> {
        let content = fs::read_to_string(path).ok()?;
        let data: CacheData = serde_json::from_str(&content).ok()?;
        if data.version != CACHE_VERSION {
            return None;
        }
        Some(data)
    }

    /// Save cache to disk if anything changed
    pub fn save(&self) -> Result<()> {
        if !self.enabled || !self.dirty {
            return Ok(());
        }

        let content =
            serde_json::to_string_pretty(&self.data).context("Failed to serialize cache")?;
        fs::write(&self.cache_path, content)
            .with_context(|| format!("Failed to write cache to {}", self.cache_path.display()))?;

        Ok(())
    }

    fn hash_content(html: &str, url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update([0u8]);
        hasher.update(html.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Entries are keyed by canonical path so runs over a directory and over
    /// a single page inside it share entries.
    fn key_for(page_path: &Path) -> String {
        page_path
            .canonicalize()
            .unwrap_or_else(|_| page_path.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }

    /// Cached result if the page HTML and URL are unchanged
    pub fn get(&self, page_path: &Path, html: &str, url: &str) -> Option<AnalysisResult> {
        if !self.enabled {
            return None;
        }

        let entry = self.data.entries.get(&Self::key_for(page_path))?;
        if entry.content_hash != Self::hash_content(html, url) {
            return None;
        }

        Some(entry.result.clone())
    }

    pub fn set(&mut self, page_path: &Path, html: &str, url: &str, result: AnalysisResult) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            content_hash: Self::hash_content(html, url),
            result,
            cached_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };

        self.data.entries.insert(Self::key_for(page_path), entry);
        self.dirty = true;
    }

    /// Remove entries for pages that no longer exist on disk. Pages outside
    /// the current run keep their entries.
    pub fn prune_missing(&mut self) {
        if !self.enabled {
            return;
        }

        let before = self.data.entries.len();
        self.data.entries.retain(|k, _| Path::new(k).exists());
        if self.data.entries.len() != before {
            self.dirty = true;
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.data.entries.len(),
            enabled: self.enabled,
        }
    }

    /// Clear all cached entries
    pub fn clear(&mut self) {
        self.data.entries.clear();
        self.dirty = true;
    }
}

#[derive(Debug)]
pub struct CacheStats {
    pub entries: usize,
    pub enabled: bool,
}
