//! pagescore: page quality auditor CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pagescore::analyzer::{PageTarget, QualityEngine, SystemClock};
use pagescore::cache::AnalysisCache;
use pagescore::config::{
    build_ignore_set, find_project_root, is_ignored, load_config, page_url, write_starter_config,
    Config,
};
use pagescore::reporter::{ConsoleReporter, JsonReporter};
use pagescore::source::{self, SnapshotError};
use pagescore::transport::{run_stdio_server, ServeContext};
use pagescore::watcher::PageWatcher;
use pagescore::{export, lifecycle, AnalysisResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Pages above this count are analyzed in parallel even without --parallel
const PARALLEL_THRESHOLD: usize = 10;

/// pagescore: accessibility, SEO and performance scoring for HTML pages
#[derive(Parser, Debug)]
#[command(name = "pagescore")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// HTML file, site directory or http(s) URL to analyze
    #[arg(value_name = "PATH|URL")]
    target: Option<String>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Write a quality-analysis-YYYY-MM-DD.json export (default: current directory)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// Minimum overall score (exit 1 if below)
    #[arg(long, short)]
    threshold: Option<u8>,

    /// URL local pages are considered served from
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Quiet mode (one line per page)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (debug logs, every suggestion)
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .pagescorerc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Watch for page changes and re-analyze
    #[arg(long)]
    watch: bool,

    /// Disable caching (re-analyze all pages even if unchanged)
    #[arg(long)]
    no_cache: bool,

    /// Clear the analysis cache before running
    #[arg(long)]
    clear_cache: bool,

    /// Run analysis in parallel (default for directories with many pages)
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer newline-delimited JSON analyze requests on stdin
    Serve,

    /// Create .pagescorerc.json with sensible defaults
    Init {
        /// Minimum score threshold (e.g. 70)
        #[arg(long)]
        threshold: Option<u8>,

        /// URL local pages are served from
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "pagescore=debug"
    } else {
        "pagescore=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::Serve => run_serve(),
            Commands::Init {
                threshold,
                base_url,
                dir,
            } => run_init(threshold, base_url.as_deref(), dir.as_deref()),
        };
    }

    let Some(target) = args.target.clone() else {
        anyhow::bail!("missing <PATH|URL> argument (or run `pagescore serve` / `pagescore init`)");
    };

    if source::is_remote(&target) {
        return run_remote(&args, &target);
    }

    let path = PathBuf::from(&target);
    if args.watch {
        return run_watch(&args, &path);
    }

    let work_dir = work_dir_for(&path);
    let config = load_config(work_dir, args.config.as_deref())?
        .merge_with_cli(args.threshold, args.base_url.as_deref());

    let ignore_set = if config.ignore.is_empty() {
        None
    } else {
        Some(build_ignore_set(&config.ignore)?)
    };

    let page_files = collect_page_files(&path, ignore_set.as_ref(), &config)?;
    if page_files.is_empty() {
        eprintln!("{}: No pages found", "Warning".yellow());
        return Ok(ExitCode::from(2));
    }
    tracing::info!(pages = page_files.len(), path = %path.display(), "pages collected");

    let project_root = find_project_root(work_dir).unwrap_or_else(|| work_dir.to_path_buf());
    let targets: Vec<PageTarget> = page_files
        .iter()
        .map(|file| {
            let effective = config.effective_for_file(file, &project_root);
            PageTarget::new(
                file.clone(),
                page_url(file, &project_root, effective.base_url.as_deref()),
            )
        })
        .collect();

    let mut cache = if args.no_cache {
        AnalysisCache::disabled()
    } else {
        AnalysisCache::new(&project_root)
    };

    if args.clear_cache {
        cache.clear();
        if !args.quiet {
            eprintln!("{}: Cache cleared", "Info".blue());
        }
    }

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let engine = QualityEngine::new();
    let use_parallel = args.parallel || targets.len() > PARALLEL_THRESHOLD;

    let (results, had_errors) = if use_parallel && !args.no_cache {
        analyze_pages_parallel_cached(&engine, &targets, &mut cache, args.quiet)
    } else if use_parallel {
        analyze_pages_parallel(&engine, &targets, args.quiet)
    } else {
        analyze_pages_sequential_cached(&engine, &targets, &mut cache, args.quiet)
    };

    cache.prune_missing();
    if let Err(e) = cache.save() {
        tracing::warn!(error = %e, "cache write failed");
        if !args.quiet {
            eprintln!("{}: Failed to save cache: {}", "Warning".yellow(), e);
        }
    }

    if results.is_empty() {
        eprintln!("{}: All pages failed to analyze", "Error".red());
        return Ok(ExitCode::from(2));
    }

    announce_first_run(&project_root, &args);
    report_results(&args, &results)?;

    let threshold = match results.as_slice() {
        [single] => config
            .effective_for_file(&single_page_path(&targets, single), &project_root)
            .threshold,
        _ => config.threshold,
    };
    if let Some(code) = check_threshold(&args, &results, threshold) {
        return Ok(code);
    }

    if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Analyze a live page (requires the `fetch` feature)
fn run_remote(args: &Args, url: &str) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config = load_config(&cwd, args.config.as_deref())?
        .merge_with_cli(args.threshold, args.base_url.as_deref());

    let result = QualityEngine::new()
        .analyze_url(url)
        .with_context(|| format!("Could not analyze {}", url))?;
    let results = vec![result];

    let project_root = find_project_root(&cwd).unwrap_or(cwd);
    announce_first_run(&project_root, args);
    report_results(args, &results)?;

    if let Some(code) = check_threshold(args, &results, config.threshold) {
        return Ok(code);
    }
    Ok(ExitCode::SUCCESS)
}

fn work_dir_for(path: &Path) -> &Path {
    if path.is_file() {
        match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    } else {
        path
    }
}

fn single_page_path(targets: &[PageTarget], result: &AnalysisResult) -> PathBuf {
    targets
        .iter()
        .find(|t| t.url == result.page_info.url)
        .map(|t| t.path.clone())
        .unwrap_or_default()
}

/// Record the first run in this project and greet the user once
fn announce_first_run(project_root: &Path, args: &Args) {
    match lifecycle::record_install(project_root, &SystemClock) {
        Ok(true) if !args.quiet && !args.json => {
            eprintln!(
                "{}: pagescore {} set up in {}",
                "Welcome".green().bold(),
                env!("CARGO_PKG_VERSION"),
                project_root.display()
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "could not record first run"),
    }
}

/// Print results in the requested format and write the export if asked
fn report_results(args: &Args, results: &[AnalysisResult]) -> Result<()> {
    let stats = QualityEngine::aggregate_stats(results);

    if args.json {
        let reporter = JsonReporter::new().pretty();
        match results {
            [single] => println!("{}", reporter.report(single)),
            _ => println!("{}", reporter.report_with_summary(results, &stats)),
        }
    } else if args.quiet {
        let reporter = ConsoleReporter::new();
        for result in results {
            reporter.report_quiet(result);
        }
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }
        match results {
            [single] => reporter.report(single),
            _ => reporter.report_many(results, &stats),
        }
    }

    if let Some(ref dir) = args.export {
        let dir = dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let written = export::write_export(&dir, results, &SystemClock)?;
        if !args.quiet && !args.json {
            eprintln!("{}: Exported to {}", "Info".blue(), written.display());
        }
    }

    Ok(())
}

/// Exit code 1 when the score is below the threshold. A single page is judged
/// by its own score, several by the average.
fn check_threshold(
    args: &Args,
    results: &[AnalysisResult],
    threshold: Option<u8>,
) -> Option<ExitCode> {
    let threshold = threshold?;
    let score = match results {
        [single] => single.score,
        _ => QualityEngine::aggregate_stats(results).average_score,
    };

    if score < threshold {
        if !args.quiet && !args.json {
            eprintln!(
                "\n{}: Score {} is below threshold {}",
                "Failed".red().bold(),
                score,
                threshold
            );
        }
        return Some(ExitCode::from(1));
    }
    None
}

fn run_serve() -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let ctx = ServeContext::from_work_dir(&cwd)?;
    run_stdio_server(&ctx)?;
    Ok(ExitCode::SUCCESS)
}

fn run_init(threshold: Option<u8>, base_url: Option<&str>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(pagescore::config::CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let written = write_starter_config(dir, threshold, base_url)?;
    println!(
        "{}: Created {} with threshold={}",
        "Done".green().bold(),
        written.display(),
        threshold.unwrap_or(pagescore::config::DEFAULT_INIT_THRESHOLD)
    );
    Ok(ExitCode::SUCCESS)
}

fn run_watch(args: &Args, path: &Path) -> Result<ExitCode> {
    let work_dir = work_dir_for(path);
    let config = load_config(work_dir, args.config.as_deref())?
        .merge_with_cli(args.threshold, args.base_url.as_deref());
    let ignore_set = if config.ignore.is_empty() {
        None
    } else {
        Some(build_ignore_set(&config.ignore)?)
    };
    let project_root = find_project_root(work_dir).unwrap_or_else(|| work_dir.to_path_buf());

    let engine = QualityEngine::new();
    let mut reporter = ConsoleReporter::new();
    if args.verbose {
        reporter = reporter.verbose();
    }

    let watcher = PageWatcher::watch(path, &config.get_file_patterns())
        .context("Failed to create file watcher")?;
    eprintln!("{}: Watching for changes... (Ctrl+C to stop)", "Info".blue());

    loop {
        let paths = watcher.next_changes();
        for page in paths.into_iter().filter(|p| {
            ignore_set
                .as_ref()
                .map(|set| !is_ignored(p, set))
                .unwrap_or(true)
        }) {
            let effective = config.effective_for_file(&page, &project_root);
            let url = page_url(&page, &project_root, effective.base_url.as_deref());
            match engine.analyze_file(&page, &url) {
                Ok(result) if args.quiet => reporter.report_quiet(&result),
                Ok(result) => reporter.report(&result),
                Err(e) => eprintln!("{}: {}", "Error".red(), e),
            }
        }
    }
}

fn collect_page_files(
    path: &Path,
    ignore_set: Option<&globset::GlobSet>,
    config: &Config,
) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if let Some(set) = ignore_set {
            if is_ignored(path, set) {
                return Ok(vec![]);
            }
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        if entry.file_type().is_file() && is_page_candidate(file_path, config) {
            if let Some(set) = ignore_set {
                if is_ignored(file_path, set) {
                    continue;
                }
            }
            files.push(file_path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn is_page_candidate(path: &Path, config: &Config) -> bool {
    if path.components().any(|c| c.as_os_str() == "node_modules") {
        return false;
    }
    config.is_page_file(path)
}

fn report_failure(target: &PageTarget, error: &SnapshotError, quiet: bool) {
    tracing::warn!(path = %target.path.display(), error = %error, "page skipped");
    if !quiet {
        eprintln!(
            "{}: Failed to analyze {}: {}",
            "Error".red(),
            target.path.display(),
            error
        );
    }
}

fn report_cache_hits(hits: usize, total: usize, quiet: bool) {
    if hits == 0 {
        return;
    }
    tracing::info!(hits, total, "cache hits");
    if !quiet {
        eprintln!(
            "{}: {} pages from cache, {} analyzed",
            "Cache".blue(),
            hits,
            total - hits
        );
    }
}

/// Analyze pages sequentially with caching
fn analyze_pages_sequential_cached(
    engine: &QualityEngine,
    targets: &[PageTarget],
    cache: &mut AnalysisCache,
    quiet: bool,
) -> (Vec<AnalysisResult>, bool) {
    let mut results = Vec::new();
    let mut had_errors = false;
    let mut cache_hits = 0;

    for target in targets {
        let html = match source::read_html(&target.path) {
            Ok(html) => html,
            Err(e) => {
                report_failure(target, &e, quiet);
                had_errors = true;
                continue;
            }
        };

        if let Some(cached) = cache.get(&target.path, &html, &target.url) {
            results.push(cached);
            cache_hits += 1;
            continue;
        }

        let result = engine.analyze_html(&html, &target.url);
        cache.set(&target.path, &html, &target.url, result.clone());
        results.push(result);
    }

    report_cache_hits(cache_hits, targets.len(), quiet);
    (results, had_errors)
}

/// Analyze pages in parallel without caching
fn analyze_pages_parallel(
    engine: &QualityEngine,
    targets: &[PageTarget],
    quiet: bool,
) -> (Vec<AnalysisResult>, bool) {
    let mut had_errors = false;
    let mut results = Vec::new();

    for (target, outcome) in targets.iter().zip(engine.analyze_parallel(targets)) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                report_failure(target, &e, quiet);
                had_errors = true;
            }
        }
    }

    (results, had_errors)
}

/// Analyze pages in parallel. Cache lookups happen inside the tasks; fresh
/// results are stored afterwards.
fn analyze_pages_parallel_cached(
    engine: &QualityEngine,
    targets: &[PageTarget],
    cache: &mut AnalysisCache,
    quiet: bool,
) -> (Vec<AnalysisResult>, bool) {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    enum Outcome {
        Cached(AnalysisResult),
        Fresh { html: String, result: AnalysisResult },
    }

    let had_errors = AtomicBool::new(false);
    let cache_hits = AtomicUsize::new(0);

    let outcomes: Vec<(&PageTarget, Outcome)> = {
        let cache = &*cache;
        targets
            .par_iter()
            .filter_map(|target| {
                let html = match source::read_html(&target.path) {
                    Ok(html) => html,
                    Err(e) => {
                        had_errors.store(true, Ordering::Relaxed);
                        report_failure(target, &e, quiet);
                        return None;
                    }
                };

                if let Some(cached) = cache.get(&target.path, &html, &target.url) {
                    cache_hits.fetch_add(1, Ordering::Relaxed);
                    return Some((target, Outcome::Cached(cached)));
                }

                let result = engine.analyze_html(&html, &target.url);
                Some((target, Outcome::Fresh { html, result }))
            })
            .collect()
    };

    let mut results = Vec::with_capacity(outcomes.len());
    for (target, outcome) in outcomes {
        match outcome {
            Outcome::Cached(result) => results.push(result),
            Outcome::Fresh { html, result } => {
                cache.set(&target.path, &html, &target.url, result.clone());
                results.push(result);
            }
        }
    }

    report_cache_hits(cache_hits.load(Ordering::Relaxed), targets.len(), quiet);
    (results, had_errors.load(Ordering::Relaxed))
}
