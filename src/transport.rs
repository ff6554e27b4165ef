//! Stdio transport: newline-delimited JSON requests in, JSON responses out.
//!
//! A request carries an `action`; only `"analyze"` is answered. Its payload is
//! either inline HTML (`html`, optional `url`) or a local `path`.

use crate::analyzer::QualityEngine;
use crate::config::{self, Config};
use crate::{source, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// The one action the transport answers
pub const ANALYZE_ACTION: &str = "analyze";

/// URL assumed for inline HTML sent without one
pub const INLINE_PAGE_URL: &str = "about:blank";

/// Incoming request line
#[derive(Debug, Deserialize, Serialize)]
pub struct TransportRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub action: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Outgoing response line: exactly one of `result` or `error`
#[derive(Debug, Serialize)]
pub struct TransportResponse {
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What an analyze request asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageInput {
    Inline { html: String, url: String },
    File(PathBuf),
}

impl PageInput {
    fn from_request(req: &TransportRequest) -> Result<Self, String> {
        if let Some(html) = &req.html {
            return Ok(PageInput::Inline {
                html: html.clone(),
                url: req.url.clone().unwrap_or_else(|| INLINE_PAGE_URL.to_string()),
            });
        }
        if let Some(path) = &req.path {
            return Ok(PageInput::File(PathBuf::from(path)));
        }
        Err("request has neither html nor path".to_string())
    }
}

/// Typed dispatch for a request line; the engine never sees the envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Analyze(PageInput),
}

impl Command {
    /// None for actions the transport does not answer. A known action with a
    /// bad payload is `Some(Err(reason))`.
    pub fn from_request(req: &TransportRequest) -> Option<Result<Self, String>> {
        match req.action.as_str() {
            ANALYZE_ACTION => Some(PageInput::from_request(req).map(Command::Analyze)),
            _ => None,
        }
    }
}

/// Everything a request needs besides its own payload
pub struct ServeContext {
    engine: QualityEngine,
    config: Config,
    project_root: PathBuf,
}

impl ServeContext {
    pub fn new(engine: QualityEngine, config: Config, project_root: PathBuf) -> Self {
        Self {
            engine,
            config,
            project_root,
        }
    }

    /// Context for the current directory: config searched from there
    pub fn from_work_dir(work_dir: &Path) -> anyhow::Result<Self> {
        let config = config::load_config(work_dir, None)?;
        let project_root =
            config::find_project_root(work_dir).unwrap_or_else(|| work_dir.to_path_buf());
        Ok(Self::new(QualityEngine::new(), config, project_root))
    }

    fn execute(&self, command: Command) -> Result<AnalysisResult, String> {
        match command {
            Command::Analyze(input) => self.analyze(input),
        }
    }

    fn analyze(&self, input: PageInput) -> Result<AnalysisResult, String> {
        match input {
            PageInput::Inline { html, url } => Ok(self.engine.analyze_html(&html, &url)),
            PageInput::File(path) => {
                let path = if path.is_absolute() {
                    path
                } else {
                    self.project_root.join(path)
                };
                let effective = self.config.effective_for_file(&path, &self.project_root);
                let url = config::page_url(&path, &self.project_root, effective.base_url.as_deref());
                let page = source::load_file(&path, &url).map_err(|e| e.to_string())?;
                Ok(self.engine.analyze(&page))
            }
        }
    }
}

/// Handle a single request. Returns None for actions the transport ignores.
pub fn handle_request(req: &TransportRequest, ctx: &ServeContext) -> Option<TransportResponse> {
    let Some(command) = Command::from_request(req) else {
        tracing::debug!(action = %req.action, "ignoring request");
        return None;
    };

    let id = req.id.clone();
    let outcome = command.and_then(|command| ctx.execute(command));

    Some(match outcome {
        Ok(result) => TransportResponse {
            id,
            result: Some(result),
            error: None,
        },
        Err(reason) => {
            tracing::warn!(%reason, "analyze request failed");
            TransportResponse {
                id,
                result: None,
                error: Some(format!("Could not analyze page: {}", reason)),
            }
        }
    })
}

/// Handle one raw line. Unparseable lines yield None.
pub fn handle_line(line: &str, ctx: &ServeContext) -> Option<TransportResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<TransportRequest>(line) {
        Ok(req) => handle_request(&req, ctx),
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable request line");
            None
        }
    }
}

/// Serve requests from `input`, writing responses to `output`, until EOF
pub fn serve<R: BufRead, W: Write>(input: R, mut output: W, ctx: &ServeContext) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = line?;
        if let Some(response) = handle_line(&line, ctx) {
            writeln!(output, "{}", serde_json::to_string(&response)?)?;
            output.flush()?;
        }
    }
    Ok(())
}

/// Run the transport loop on stdin / stdout
pub fn run_stdio_server(ctx: &ServeContext) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let reader = BufReader::new(stdin.lock());
    serve(reader, std::io::stdout(), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::FixedClock;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn context(root: &Path) -> ServeContext {
        let engine = QualityEngine::with_clock(FixedClock(
            Utc.with_ymd_and_hms(2024, 2, 2, 2, 2, 2).unwrap(),
        ));
        ServeContext::new(engine, Config::default(), root.to_path_buf())
    }

    fn request(json: serde_json::Value) -> TransportRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_analyze_inline_html() {
        let dir = TempDir::new().unwrap();
        let req = request(serde_json::json!({
            "id": 7,
            "action": "analyze",
            "html": "<title>Inline page title</title><h1>x</h1>",
            "url": "https://example.com/inline"
        }));
        let resp = handle_request(&req, &context(dir.path())).unwrap();

        assert_eq!(resp.id, Some(serde_json::json!(7)));
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result.page_info.url, "https://example.com/inline");
        assert_eq!(result.page_info.title, "Inline page title");
        assert_eq!(result.page_info.timestamp, "2024-02-02T02:02:02.000Z");
    }

    #[test]
    fn test_inline_html_without_url() {
        let dir = TempDir::new().unwrap();
        let req = request(serde_json::json!({ "action": "analyze", "html": "" }));
        let resp = handle_request(&req, &context(dir.path())).unwrap();
        assert!(resp.id.is_none());
        assert_eq!(resp.result.unwrap().page_info.url, INLINE_PAGE_URL);
    }

    #[test]
    fn test_analyze_path_relative_to_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("about.html"), "<title>About this site</title>").unwrap();
        let req = request(serde_json::json!({ "id": "a", "action": "analyze", "path": "about.html" }));
        let resp = handle_request(&req, &context(dir.path())).unwrap();

        let result = resp.result.unwrap();
        assert_eq!(result.page_info.title, "About this site");
        assert!(result.page_info.url.starts_with("file://"));
    }

    #[test]
    fn test_path_uses_configured_base_url() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog").join("post.html"), "<p>x</p>").unwrap();
        let config = Config {
            base_url: Some("https://example.com".to_string()),
            ..Config::default()
        };
        let ctx = ServeContext::new(QualityEngine::new(), config, dir.path().to_path_buf());

        let req = request(serde_json::json!({ "action": "analyze", "path": "blog/post.html" }));
        let result = handle_request(&req, &ctx).unwrap().result.unwrap();
        assert_eq!(result.page_info.url, "https://example.com/blog/post.html");
    }

    #[test]
    fn test_path_override_matches_relative_to_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("guide.html"), "<p>x</p>").unwrap();
        let config: Config = serde_json::from_str(
            r#"{
                "baseUrl": "https://example.com",
                "overrides": [{ "files": ["docs/**"], "baseUrl": "https://docs.example.com" }]
            }"#,
        )
        .unwrap();
        let ctx = ServeContext::new(QualityEngine::new(), config, dir.path().to_path_buf());

        let req = request(serde_json::json!({ "action": "analyze", "path": "docs/guide.html" }));
        let result = handle_request(&req, &ctx).unwrap().result.unwrap();
        assert_eq!(result.page_info.url, "https://docs.example.com/docs/guide.html");
    }

    #[test]
    fn test_unreadable_path_is_error_response() {
        let dir = TempDir::new().unwrap();
        let req = request(serde_json::json!({ "id": 1, "action": "analyze", "path": "missing.html" }));
        let resp = handle_request(&req, &context(dir.path())).unwrap();

        assert!(resp.result.is_none());
        let error = resp.error.unwrap();
        assert!(error.starts_with("Could not analyze page: "), "{}", error);
        assert!(error.contains("missing.html"));
    }

    #[test]
    fn test_missing_payload_is_error_response() {
        let dir = TempDir::new().unwrap();
        let req = request(serde_json::json!({ "id": 2, "action": "analyze" }));
        let resp = handle_request(&req, &context(dir.path())).unwrap();
        assert!(resp.error.unwrap().starts_with("Could not analyze page: "));
    }

    #[test]
    fn test_command_dispatch() {
        let analyze = request(serde_json::json!({ "action": "analyze", "path": "a.html" }));
        assert_eq!(
            Command::from_request(&analyze),
            Some(Ok(Command::Analyze(PageInput::File(PathBuf::from("a.html")))))
        );

        // inline html wins over path
        let both = request(serde_json::json!({ "action": "analyze", "html": "<p>", "path": "a.html" }));
        assert!(matches!(
            Command::from_request(&both),
            Some(Ok(Command::Analyze(PageInput::Inline { .. })))
        ));

        let empty = request(serde_json::json!({ "action": "analyze" }));
        assert!(matches!(Command::from_request(&empty), Some(Err(_))));

        let other = request(serde_json::json!({ "action": "Analyze" }));
        assert!(Command::from_request(&other).is_none());
    }

    #[test]
    fn test_other_actions_get_no_response() {
        let dir = TempDir::new().unwrap();
        let req = request(serde_json::json!({ "id": 3, "action": "ping" }));
        assert!(handle_request(&req, &context(dir.path())).is_none());
    }

    #[test]
    fn test_unparseable_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        assert!(handle_line("not json", &ctx).is_none());
        assert!(handle_line("", &ctx).is_none());
        assert!(handle_line(r#"{"id": 1}"#, &ctx).is_none());
    }

    #[test]
    fn test_serve_writes_one_line_per_answered_request() {
        let dir = TempDir::new().unwrap();
        let input = concat!(
            r#"{"id":1,"action":"analyze","html":"<h1>x</h1>"}"#,
            "\n",
            "garbage\n",
            r#"{"id":2,"action":"status"}"#,
            "\n",
            r#"{"id":3,"action":"analyze","path":"nope.html"}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve(input.as_bytes(), &mut output, &context(dir.path())).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert!(lines[0]["result"]["categories"]["seo"].is_object());
        assert_eq!(lines[1]["id"], 3);
        assert!(lines[1]["error"].is_string());
        assert!(lines[1].get("result").is_none());
    }
}
