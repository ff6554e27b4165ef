//! Export of analysis results to a dated JSON file

use crate::analyzer::clock::{iso_timestamp, Clock};
use crate::AnalysisResult;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// An analysis result plus the instant it was exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub exported_at: String,
}

impl ExportDocument {
    pub fn new(result: AnalysisResult, clock: &dyn Clock) -> Self {
        Self {
            result,
            exported_at: iso_timestamp(clock.now()),
        }
    }
}

/// `quality-analysis-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("quality-analysis-{}.json", date.format("%Y-%m-%d"))
}

/// Write one export file into `dir`: a single document for one result, an
/// array of documents for several. Returns the path written.
pub fn write_export(dir: &Path, results: &[AnalysisResult], clock: &dyn Clock) -> Result<PathBuf> {
    let now = clock.now();
    let path = dir.join(export_file_name(now.date_naive()));

    let documents: Vec<ExportDocument> = results
        .iter()
        .cloned()
        .map(|result| ExportDocument::new(result, clock))
        .collect();

    let json = match documents.as_slice() {
        [single] => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(&documents),
    }
    .context("Failed to serialize export")?;

    fs::write(&path, json)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    tracing::info!(path = %path.display(), pages = results.len(), "export written");
    Ok(path)
}
