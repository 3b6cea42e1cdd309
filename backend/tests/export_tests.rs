//! Report export tests
//!
//! File naming, format renderings and writing to disk.

use std::sync::Arc;

use climate_policy_backend::config::CatalogConfig;
use climate_policy_backend::services::export::{
    recommendation_rows, render, report_file_name, write_report,
};
use climate_policy_backend::services::{CatalogStore, ExportFormat, PolicyReport, PolicyService};
use serde_json::json;

fn report() -> PolicyReport {
    let store = CatalogStore::load(&CatalogConfig {
        path: None,
        include_builtin: true,
    })
    .unwrap();
    let service = PolicyService::new(Arc::new(store), None);
    let payload = json!({
        "location": "Hyderabad",
        "observed_at": "2024-06-01T14:05:00Z",
        "temperature_c": 41,
        "precipitation_mm": 0,
        "wind_speed_kph": 9,
        "humidity_pct": 18,
        "condition": "clear"
    });
    service.build_report(&payload, &[]).unwrap()
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_report_file_name() {
        let report = report();
        assert_eq!(
            report_file_name(&report.set, ExportFormat::Markdown),
            "policy_Hyderabad_20240601_1405.md"
        );
        assert_eq!(
            report_file_name(&report.set, ExportFormat::Csv),
            "policy_Hyderabad_20240601_1405.csv"
        );
    }

    #[test]
    fn test_file_name_sanitizes_location() {
        let mut report = report();
        report.set.snapshot.location = "Dera Ghazi Khan/PK".to_string();
        assert_eq!(
            report_file_name(&report.set, ExportFormat::Json),
            "policy_Dera_Ghazi_Khan_PK_20240601_1405.json"
        );
    }

    #[test]
    fn test_csv_has_one_row_per_recommendation() {
        let report = report();
        let csv = render(&report, ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert!(lines[0].starts_with("rank,location,observed_at,rule_id"));
        assert_eq!(lines.len(), report.set.len() + 1);
        assert_eq!(recommendation_rows(&report.set)[0].rank, 1);
    }

    #[test]
    fn test_json_contains_set_and_document() {
        let report = report();
        let body = render(&report, ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["set"]["snapshot"]["location"], "Hyderabad");
        assert_eq!(value["document"]["footer"], "Climate Policy Maker — Generated Report");
        assert_eq!(
            value["set"]["recommendations"].as_array().unwrap().len(),
            report.set.len()
        );
    }

    #[test]
    fn test_markdown_rendering_is_stable() {
        let report = report();
        let first = render(&report, ExportFormat::Markdown).unwrap();
        let second = render(&report, ExportFormat::Markdown).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("# Climate Policy Report"));
    }

    #[test]
    fn test_write_report_creates_directory() {
        let report = report();
        let dir = std::env::temp_dir().join(format!("cpm-export-{}", std::process::id()));

        let path = tokio_test::block_on(write_report(&report, ExportFormat::Markdown, &dir)).unwrap();
        assert!(path.ends_with("policy_Hyderabad_20240601_1405.md"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("## Policy Recommendations"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
