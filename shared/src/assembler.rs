//! Report assembler
//!
//! Turns a [`RecommendationSet`] and caller-supplied chart references into a
//! structured [`ReportDocument`]. Charts are treated as opaque images: the
//! assembler only sniffs their format and never decodes or draws them.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{PolicyError, PolicyResult};
use crate::models::{
    Category, CategoryGroup, ChartFormat, ChartPayload, ChartRef, ChartSlot, ChartSource,
    ConditionCode, RecommendationSet, ReportDocument, ReportSection, SummaryLine, WeatherSnapshot,
};
use crate::types::{format_reading_with_unit, NOT_AVAILABLE};

pub const REPORT_TITLE: &str = "Climate Policy Report";
pub const SUMMARY_HEADING: &str = "Weather Summary";
pub const CHARTS_HEADING: &str = "Visual Summary";
pub const RECOMMENDATIONS_HEADING: &str = "Policy Recommendations";
pub const REPORT_FOOTER: &str = "Climate Policy Maker — Generated Report";

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Assemble the report document.
///
/// Section order is fixed: title, weather summary, visual summary (only when
/// charts were supplied), recommendations. A chart in an unknown format
/// becomes an unavailable slot; it never fails the report.
pub fn assemble(set: &RecommendationSet, charts: &[ChartRef]) -> ReportDocument {
    let mut sections = vec![
        ReportSection::Title {
            heading: REPORT_TITLE.to_string(),
            location: set.snapshot.location.clone(),
            generated_at: set.generated_at,
        },
        ReportSection::SnapshotSummary {
            heading: SUMMARY_HEADING.to_string(),
            lines: summary_lines(&set.snapshot),
        },
    ];

    if !charts.is_empty() {
        let slots = charts
            .iter()
            .map(|chart| {
                embed_chart(chart).unwrap_or_else(|err| ChartSlot::Unavailable {
                    title: chart.title.clone(),
                    reason: err.to_string(),
                })
            })
            .collect();
        sections.push(ReportSection::Charts {
            heading: CHARTS_HEADING.to_string(),
            slots,
        });
    }

    sections.push(ReportSection::Recommendations {
        heading: RECOMMENDATIONS_HEADING.to_string(),
        groups: group_by_category(set),
    });

    ReportDocument {
        sections,
        footer: REPORT_FOOTER.to_string(),
    }
}

/// Groups in category order; engine order is kept within each group
pub fn group_by_category(set: &RecommendationSet) -> Vec<CategoryGroup> {
    Category::ALL
        .iter()
        .filter_map(|&category| {
            let recommendations: Vec<_> = set.in_category(category).cloned().collect();
            if recommendations.is_empty() {
                None
            } else {
                Some(CategoryGroup {
                    category,
                    heading: category.title().to_string(),
                    recommendations,
                })
            }
        })
        .collect()
}

/// One line per snapshot field, missing values spelled out
pub fn summary_lines(snapshot: &WeatherSnapshot) -> Vec<SummaryLine> {
    let line = |label: &str, value: String| SummaryLine {
        label: label.to_string(),
        value,
    };
    let condition = match snapshot.condition {
        ConditionCode::Unknown => NOT_AVAILABLE.to_string(),
        code => code.to_string(),
    };

    vec![
        line("Location", snapshot.location.clone()),
        line(
            "Observed at",
            snapshot.observed_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        ),
        line(
            "Coordinates",
            snapshot
                .coordinates
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ),
        line("Temperature", format_reading_with_unit(snapshot.temperature_c, "°C")),
        line("Precipitation", format_reading_with_unit(snapshot.precipitation_mm, "mm")),
        line("Wind speed", format_reading_with_unit(snapshot.wind_speed_kph, "km/h")),
        line("Humidity", format_reading_with_unit(snapshot.humidity_pct, "%")),
        line("Conditions", condition),
    ]
}

/// Resolve one chart reference into an embedded slot
pub fn embed_chart(chart: &ChartRef) -> PolicyResult<ChartSlot> {
    let unsupported = |detail: &str| PolicyError::UnsupportedChartFormat {
        title: chart.title.clone(),
        detail: detail.to_string(),
    };

    match &chart.source {
        ChartSource::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(unsupported("image is empty"));
            }
            let format =
                sniff_format(bytes).ok_or_else(|| unsupported("unrecognized image signature"))?;
            Ok(ChartSlot::Embedded {
                title: chart.title.clone(),
                format,
                payload: ChartPayload::Inline(STANDARD.encode(bytes)),
            })
        }
        ChartSource::Path(path) => {
            let format = format_from_extension(path)
                .ok_or_else(|| unsupported("unrecognized file extension"))?;
            Ok(ChartSlot::Embedded {
                title: chart.title.clone(),
                format,
                payload: ChartPayload::Linked(path.clone()),
            })
        }
    }
}

/// Detect PNG, JPEG or SVG from leading bytes
pub fn sniff_format(bytes: &[u8]) -> Option<ChartFormat> {
    if bytes.starts_with(PNG_SIGNATURE) {
        return Some(ChartFormat::Png);
    }
    if bytes.starts_with(JPEG_SIGNATURE) {
        return Some(ChartFormat::Jpeg);
    }
    let head = &bytes[..bytes.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg")) {
        return Some(ChartFormat::Svg);
    }
    None
}

pub fn format_from_extension(path: &str) -> Option<ChartFormat> {
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some(ChartFormat::Png),
        "jpg" | "jpeg" => Some(ChartFormat::Jpeg),
        "svg" => Some(ChartFormat::Svg),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleCatalog;
    use crate::engine::evaluate;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn heat_set() -> RecommendationSet {
        let snapshot = WeatherSnapshot {
            temperature_c: Some(Decimal::from(38)),
            precipitation_mm: Some(Decimal::ZERO),
            humidity_pct: Some(Decimal::from(20)),
            condition: ConditionCode::Clear,
            ..WeatherSnapshot::empty("Lahore", Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap())
        };
        evaluate(&snapshot, &RuleCatalog::builtin().unwrap()).unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]
    }

    #[test]
    fn test_section_order_without_charts() {
        let doc = assemble(&heat_set(), &[]);

        assert_eq!(doc.sections.len(), 3);
        assert!(matches!(doc.sections[0], ReportSection::Title { .. }));
        assert!(matches!(doc.sections[1], ReportSection::SnapshotSummary { .. }));
        assert!(matches!(doc.sections[2], ReportSection::Recommendations { .. }));
        assert_eq!(doc.footer, REPORT_FOOTER);
    }

    #[test]
    fn test_charts_sit_between_summary_and_recommendations() {
        let charts = vec![ChartRef::from_bytes("Daily Max Temperature", png_bytes())];
        let doc = assemble(&heat_set(), &charts);

        assert_eq!(doc.sections.len(), 4);
        assert!(matches!(doc.sections[2], ReportSection::Charts { .. }));
        match &doc.chart_slots()[0] {
            ChartSlot::Embedded { format, payload, .. } => {
                assert_eq!(*format, ChartFormat::Png);
                assert!(matches!(payload, ChartPayload::Inline(_)));
            }
            other => panic!("expected embedded chart, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_chart_format_becomes_placeholder() {
        let charts = vec![
            ChartRef::from_bytes("Garbage", b"GIF89a....".to_vec()),
            ChartRef::from_path("Linked", "charts/precip.svg"),
        ];
        let doc = assemble(&heat_set(), &charts);
        let slots = doc.chart_slots();

        assert!(matches!(&slots[0], ChartSlot::Unavailable { title, .. } if title == "Garbage"));
        assert!(matches!(
            &slots[1],
            ChartSlot::Embedded { format: ChartFormat::Svg, payload: ChartPayload::Linked(_), .. }
        ));
    }

    #[test]
    fn test_groups_follow_category_order() {
        let set = heat_set();
        let doc = assemble(&set, &[]);
        let categories: Vec<Category> =
            doc.recommendation_groups().iter().map(|g| g.category).collect();

        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);

        let flattened: usize = doc
            .recommendation_groups()
            .iter()
            .map(|g| g.recommendations.len())
            .sum();
        assert_eq!(flattened, set.len());
    }

    #[test]
    fn test_empty_set_is_well_formed() {
        let snapshot =
            WeatherSnapshot::empty("Nowhere", Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let set = evaluate(&snapshot, &RuleCatalog::builtin().unwrap()).unwrap();
        let doc = assemble(&set, &[]);

        assert!(doc.recommendation_groups().is_empty());
        assert!(matches!(doc.sections.last(), Some(ReportSection::Recommendations { .. })));
    }

    #[test]
    fn test_summary_marks_missing_values() {
        let snapshot =
            WeatherSnapshot::empty("Nowhere", Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        let lines = summary_lines(&snapshot);

        assert_eq!(lines.len(), 8);
        assert!(lines[2..].iter().all(|l| l.value == NOT_AVAILABLE));
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(&png_bytes()), Some(ChartFormat::Png));
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ChartFormat::Jpeg));
        assert_eq!(sniff_format(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>"), Some(ChartFormat::Svg));
        assert_eq!(
            sniff_format(b"<?xml version=\"1.0\"?>\n<svg></svg>"),
            Some(ChartFormat::Svg)
        );
        assert_eq!(sniff_format(b"plain text"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_from_extension("a/b/chart.PNG"), Some(ChartFormat::Png));
        assert_eq!(format_from_extension("chart.jpeg"), Some(ChartFormat::Jpeg));
        assert_eq!(format_from_extension("chart.gif"), None);
        assert_eq!(format_from_extension("chart"), None);
    }

    #[test]
    fn test_embed_empty_bytes_fails() {
        let chart = ChartRef::from_bytes("Empty", Vec::new());
        assert!(matches!(
            embed_chart(&chart),
            Err(PolicyError::UnsupportedChartFormat { .. })
        ));
    }
}
