//! File system watcher for watch mode

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

const DEBOUNCE_MS: u64 = 300;

/// Watches a page or a site directory and emits changed page paths
pub struct PageWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<notify::Event>>,
    /// Page suffixes, lowercase (".html", ".htm", ...)
    patterns: Vec<String>,
    /// Set when a single page is watched: only its file name is reported
    single_file: Option<OsString>,
}

fn is_create_or_modify(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

impl PageWatcher {
    /// Start watching the given path (page file or directory)
    pub fn watch(path: &Path, patterns: &[&str]) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(DEBOUNCE_MS)),
        )?;

        let single_file = if path.is_dir() {
            watcher.watch(path, RecursiveMode::Recursive)?;
            None
        } else {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
            path.file_name().map(|n| n.to_os_string())
        };
        tracing::debug!(path = %path.display(), "watching for changes");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            patterns: patterns.iter().map(|p| p.to_ascii_lowercase()).collect(),
            single_file,
        })
    }

    /// Whether the path is a page we care about
    pub fn is_page_file(&self, p: &Path) -> bool {
        is_page_file(p, &self.patterns, self.single_file.as_deref())
    }

    fn paths_from_event(&self, event: &notify::Event) -> Vec<PathBuf> {
        if !is_create_or_modify(&event.kind) {
            return vec![];
        }
        event
            .paths
            .iter()
            .filter(|p| self.is_page_file(p))
            .cloned()
            .collect()
    }

    /// Wait for the next batch of changes (debounced). Blocks until at least one
    /// change, then drains for DEBOUNCE_MS.
    pub fn next_changes(&self) -> Vec<PathBuf> {
        let mut all = HashSet::new();

        match self.receiver.recv_timeout(Duration::from_secs(3600)) {
            Ok(Ok(event)) => all.extend(self.paths_from_event(&event)),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "watch error");
                return vec![];
            }
            Err(_) => return vec![],
        }

        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS));
        while let Ok(ev) = self.receiver.try_recv() {
            if let Ok(event) = ev {
                all.extend(self.paths_from_event(&event));
            }
        }

        let mut paths: Vec<_> = all.into_iter().collect();
        paths.sort();
        paths
    }
}

fn is_page_file(p: &Path, patterns: &[String], single_file: Option<&std::ffi::OsStr>) -> bool {
    let Some(name) = p.file_name() else {
        return false;
    };
    if let Some(target) = single_file {
        return name == target;
    }
    if p.components().any(|c| c.as_os_str() == "node_modules") {
        return false;
    }
    let name = name.to_string_lossy().to_ascii_lowercase();
    patterns.iter().any(|suffix| name.ends_with(suffix.as_str()))
}
