//! Report export: pretty JSON files and an append-only JSONL log.

use profile_scout_domain::AnalysisReport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Time format error: {0}")]
    Format(#[from] time::error::Format),
}

async fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Writes one pretty-printed JSON file per report
#[derive(Debug, Clone)]
pub struct ReportExporter {
    dir: PathBuf,
}

impl ReportExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `analysis_<username>_<YYYYmmdd_HHMMSS>.json`, stamped with the analysis time
    pub fn default_filename(report: &AnalysisReport) -> Result<String, ExportError> {
        let stamp = report
            .result
            .analyzed_at
            .format(format_description!("[year][month][day]_[hour][minute][second]"))?;
        Ok(format!("analysis_{}_{}.json", report.result.username, stamp))
    }

    /// Write into the export directory under the default filename
    pub async fn export(&self, report: &AnalysisReport) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(Self::default_filename(report)?);
        self.export_to(report, &path).await?;
        Ok(path)
    }

    /// Write to an explicit path, replacing any existing file
    pub async fn export_to(&self, report: &AnalysisReport, path: &Path) -> Result<(), ExportError> {
        ensure_parent(path).await?;
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json).await?;
        tracing::info!(path = %path.display(), username = %report.result.username, "Report exported");
        Ok(())
    }
}

/// Appends one compact JSON line per report
#[derive(Debug, Clone)]
pub struct JsonlReportLog {
    path: PathBuf,
    file: Arc<Mutex<tokio::fs::File>>,
}

impl JsonlReportLog {
    pub async fn new(path: PathBuf) -> Result<Self, ExportError> {
        ensure_parent(&path).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, report: &AnalysisReport) -> Result<(), ExportError> {
        let line = serde_json::to_string(&LogEntry {
            logged_at: OffsetDateTime::now_utc(),
            report,
        })?;
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct LogEntry<'a> {
    #[serde(with = "time::serde::rfc3339")]
    logged_at: OffsetDateTime,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}
