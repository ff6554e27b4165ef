//! Integration tests for the watcher public API.
//! Exercises PageWatcher::is_page_file and that watch() can be created for a temp directory.

use pagescore::watcher::PageWatcher;
use std::path::Path;

const PATTERNS: [&str; 2] = [".html", ".htm"];

#[test]
fn watcher_accepts_page_suffixes() {
    let dir = tempfile::TempDir::new().unwrap();
    let watcher = PageWatcher::watch(dir.path(), &PATTERNS).unwrap();
    assert!(watcher.is_page_file(Path::new("index.html")));
    assert!(watcher.is_page_file(Path::new("docs/about.htm")));
    assert!(watcher.is_page_file(Path::new("LEGACY.HTML")));
}

#[test]
fn watcher_rejects_other_files() {
    let dir = tempfile::TempDir::new().unwrap();
    let watcher = PageWatcher::watch(dir.path(), &PATTERNS).unwrap();
    assert!(!watcher.is_page_file(Path::new("style.css")));
    assert!(!watcher.is_page_file(Path::new("index.html.bak")));
    assert!(!watcher.is_page_file(Path::new("node_modules/pkg/index.html")));
}

#[test]
fn watcher_on_single_page_only_reports_that_page() {
    let dir = tempfile::TempDir::new().unwrap();
    let page = dir.path().join("index.html");
    std::fs::write(&page, "<title>x</title>").unwrap();

    let watcher = PageWatcher::watch(&page, &PATTERNS).unwrap();
    assert!(watcher.is_page_file(&page));
    assert!(!watcher.is_page_file(&dir.path().join("other.html")));
}

#[test]
fn watcher_watch_temp_dir_succeeds() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = PageWatcher::watch(dir.path(), &PATTERNS);
    assert!(
        result.is_ok(),
        "watch on temp dir should succeed: {:?}",
        result.err()
    );
}
