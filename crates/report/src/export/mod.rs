pub mod delimited;
pub mod document;

use chrono::NaiveDateTime;
use gstrecon_core::ReconciliationResult;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::options::ExportOptions;

/// File name stem of full reconciliation reports.
pub const REPORT_PREFIX: &str = "Reconciliation_Report";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No records to export with current filters")]
    NothingToExport,
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    /// Printable document; save as PDF from a browser.
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Html => "text/html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "html" | "pdf" => Ok(ExportFormat::Html),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// A finished export, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its own file name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

/// `<prefix>_<YYYY>-<MM>-<DD>_<HH>-<MM>-<SS>.<extension>`
pub fn generate_timestamped_filename(prefix: &str, extension: &str, at: NaiveDateTime) -> String {
    format!("{prefix}_{}.{extension}", at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Render the selected buckets of `result` in the requested format.
pub fn export(
    result: &ReconciliationResult,
    options: &ExportOptions,
    format: ExportFormat,
    generated_at: NaiveDateTime,
) -> Result<ExportArtifact, ExportError> {
    let records = options.select(result);
    if records.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    tracing::debug!(records = records.len(), %format, "rendering export");

    let body = match format {
        ExportFormat::Csv => delimited::render(&records, options),
        ExportFormat::Html => document::render(result, &records, options, generated_at),
    };
    Ok(ExportArtifact {
        filename: generate_timestamped_filename(REPORT_PREFIX, format.extension(), generated_at),
        content_type: format.content_type(),
        bytes: body.into_bytes(),
    })
}

/// [`export`] stamped with the local clock.
pub fn export_now(
    result: &ReconciliationResult,
    options: &ExportOptions,
    format: ExportFormat,
) -> Result<ExportArtifact, ExportError> {
    export(result, options, format, chrono::Local::now().naive_local())
}
