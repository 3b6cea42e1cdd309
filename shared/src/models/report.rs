//! Report document models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::policy::{Category, Recommendation};

/// Caller-supplied chart image. The assembler never reads or draws it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
    pub title: String,
    pub source: ChartSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    Bytes(Vec<u8>),
    Path(String),
}

impl ChartRef {
    pub fn from_bytes(title: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            source: ChartSource::Bytes(bytes),
        }
    }

    pub fn from_path(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: ChartSource::Path(path.into()),
        }
    }
}

/// Image formats the assembler can embed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Png,
    Jpeg,
    Svg,
}

impl ChartFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ChartFormat::Png => "image/png",
            ChartFormat::Jpeg => "image/jpeg",
            ChartFormat::Svg => "image/svg+xml",
        }
    }
}

/// Where an embedded chart's image lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ChartPayload {
    /// Base64 encoded image bytes
    Inline(String),
    /// Path or URL left for the renderer to resolve
    Linked(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ChartSlot {
    Embedded {
        title: String,
        format: ChartFormat,
        payload: ChartPayload,
    },
    Unavailable {
        title: String,
        reason: String,
    },
}

/// A labelled line of the snapshot summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

/// Recommendations of one category, in engine order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryGroup {
    pub category: Category,
    pub heading: String,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "section")]
pub enum ReportSection {
    Title {
        heading: String,
        location: String,
        generated_at: DateTime<Utc>,
    },
    SnapshotSummary {
        heading: String,
        lines: Vec<SummaryLine>,
    },
    Charts {
        heading: String,
        slots: Vec<ChartSlot>,
    },
    Recommendations {
        heading: String,
        groups: Vec<CategoryGroup>,
    },
}

/// Assembled report, ready for export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportDocument {
    pub sections: Vec<ReportSection>,
    pub footer: String,
}

impl ReportDocument {
    pub fn recommendation_groups(&self) -> &[CategoryGroup] {
        self.sections
            .iter()
            .find_map(|s| match s {
                ReportSection::Recommendations { groups, .. } => Some(groups.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn chart_slots(&self) -> &[ChartSlot] {
        self.sections
            .iter()
            .find_map(|s| match s {
                ReportSection::Charts { slots, .. } => Some(slots.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}
