//! Report export
//!
//! Markdown, JSON and CSV renderings plus the on-disk file layout.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use shared::{render_markdown, RecommendationSet};

use crate::error::{AppError, AppResult};
use crate::services::policy::PolicyReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(AppError::Validation {
                field: "format".to_string(),
                message: format!("Unknown export format '{}'", other),
            }),
        }
    }
}

/// One CSV row per recommendation
#[derive(Debug, Serialize)]
pub struct RecommendationRow<'a> {
    pub rank: usize,
    pub location: &'a str,
    pub observed_at: String,
    pub rule_id: &'a str,
    pub category: &'static str,
    pub severity: &'static str,
    pub priority: i32,
    pub recommendation: &'a str,
    pub rationale: String,
}

/// Render a report in the requested format
pub fn render(report: &PolicyReport, format: ExportFormat) -> AppResult<String> {
    match format {
        ExportFormat::Markdown => Ok(render_markdown(&report.document)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        ExportFormat::Csv => export_to_csv(&recommendation_rows(&report.set)),
    }
}

pub fn recommendation_rows(set: &RecommendationSet) -> Vec<RecommendationRow<'_>> {
    let observed_at = set.snapshot.observed_at.to_rfc3339();
    set.iter()
        .enumerate()
        .map(|(i, rec)| RecommendationRow {
            rank: i + 1,
            location: &set.snapshot.location,
            observed_at: observed_at.clone(),
            rule_id: &rec.rule_id,
            category: rec.category.as_str(),
            severity: rec.severity.as_str(),
            priority: rec.priority,
            recommendation: &rec.text,
            rationale: rec
                .rationale
                .iter()
                .map(|f| format!("{}={}", f.field, f.value))
                .collect::<Vec<_>>()
                .join("; "),
        })
        .collect()
}

/// Export rows to CSV format
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}

/// `policy_<location>_<YYYYMMDD_HHMM>.<ext>`
pub fn report_file_name(set: &RecommendationSet, format: ExportFormat) -> String {
    let location: String = set
        .snapshot
        .location
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "policy_{}_{}.{}",
        location,
        set.generated_at.format("%Y%m%d_%H%M"),
        format.extension()
    )
}

/// Write the report into `dir`, creating it when needed
pub async fn write_report(
    report: &PolicyReport,
    format: ExportFormat,
    dir: &Path,
) -> AppResult<PathBuf> {
    let body = render(report, format)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(report_file_name(&report.set, format));
    tokio::fs::write(&path, body).await?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("Markdown".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_export_to_csv_empty() {
        let rows: Vec<RecommendationRow<'_>> = Vec::new();
        assert_eq!(export_to_csv(&rows).unwrap(), "");
    }
}
