//! Pipeline integration tests
//!
//! normalize -> evaluate -> assemble over realistic provider payloads:
//! - heatwave in Lahore triggers the energy rule
//! - missing precipitation never triggers precipitation rules
//! - sparse payloads still produce a well-formed report
//! - the same payload always yields the same document

use std::str::FromStr;
use std::sync::Arc;

use climate_policy_backend::config::CatalogConfig;
use climate_policy_backend::services::{CatalogStore, PolicyService};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shared::{
    assemble, evaluate, normalize, render_markdown, ChartRef, ChartSlot, ConditionCode, PolicyError,
    ReportSection, RuleCatalog,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn service() -> PolicyService {
    let store = CatalogStore::load(&CatalogConfig {
        path: None,
        include_builtin: true,
    })
    .unwrap();
    PolicyService::new(Arc::new(store), None)
}

fn lahore_payload() -> Value {
    json!({
        "city": "Lahore",
        "WeatherAPI": {
            "location": { "name": "Lahore", "lat": 31.55, "lon": 74.34 },
            "current": {
                "last_updated_epoch": 1717229700,
                "temp_c": 38.0,
                "condition": { "text": "Sunny", "code": 1000 },
                "wind_kph": 11.2,
                "precip_mm": 0.0,
                "humidity": 20
            }
        },
        "OpenMeteo": {
            "daily": {
                "time": ["2024-06-01", "2024-06-02", "2024-06-03"],
                "temperature_2m_max": [41.2, 42.0, 40.1],
                "temperature_2m_min": [29.1, 30.4, 28.0],
                "precipitation_sum": [0.0, 0.0, 0.0]
            }
        }
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_heatwave_energy_recommendation() {
        let set = service().recommend(&lahore_payload()).unwrap();

        let heat = set
            .iter()
            .find(|r| r.rule_id == "heatwave-energy")
            .expect("heatwave rule should fire");
        assert!(heat.text.contains("38"));
        assert_eq!(set.iter().filter(|r| r.rule_id == "heatwave-energy").count(), 1);
    }

    #[test]
    fn test_missing_precipitation_never_triggers_precipitation_rules() {
        let payload = json!({
            "location": "Karachi",
            "observed_at": "2024-06-01T09:00:00Z",
            "temperature_c": 31,
            "humidity_pct": 25
        });

        let set = service().recommend(&payload).unwrap();
        let catalog = RuleCatalog::builtin().unwrap();
        for rec in set.iter() {
            let rule = catalog.get(&rec.rule_id).unwrap();
            assert!(
                !rule.predicate.fields().contains(&shared::SnapshotField::PrecipitationMm),
                "{} reads precipitation but fired without it",
                rec.rule_id
            );
        }
        assert!(!set.rule_ids().contains(&"drought-agriculture"));
        assert!(!set.rule_ids().contains(&"water-conservation"));
    }

    #[test]
    fn test_full_pipeline_composes() {
        let snapshot = normalize(&lahore_payload()).unwrap();
        assert_eq!(snapshot.temperature_c, Some(dec("38")));
        assert_eq!(snapshot.condition, ConditionCode::Clear);

        let catalog = RuleCatalog::builtin().unwrap();
        let set = evaluate(&snapshot, &catalog).unwrap();
        let doc = assemble(&set, &[]);

        let flattened: Vec<&str> = doc
            .recommendation_groups()
            .iter()
            .flat_map(|g| g.recommendations.iter().map(|r| r.rule_id.as_str()))
            .collect();
        let mut expected = set.rule_ids();
        expected.sort();
        let mut actual = flattened.clone();
        actual.sort();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_report_with_charts() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let charts = vec![
            ChartRef::from_bytes("Daily Max Temperature", png),
            ChartRef::from_bytes("Bogus", b"BM not an accepted format".to_vec()),
        ];

        let report = service().build_report(&lahore_payload(), &charts).unwrap();
        assert!(matches!(report.document.sections[2], ReportSection::Charts { .. }));
        let slots = report.document.chart_slots();
        assert!(matches!(slots[0], ChartSlot::Embedded { .. }));
        assert!(matches!(slots[1], ChartSlot::Unavailable { .. }));
        assert_eq!(report.forecast.days.len(), 3);
    }

    #[test]
    fn test_same_payload_yields_identical_report() {
        let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let charts = vec![
            ChartRef::from_bytes("Daily Max Temperature", png),
            ChartRef::from_path("Daily Precipitation", "precip.svg"),
        ];
        let service = service();

        let first = service.build_report(&lahore_payload(), &charts).unwrap();
        let second = service.build_report(&lahore_payload(), &charts).unwrap();

        assert_eq!(first.set, second.set);
        assert_eq!(first.document, second.document);
        assert_eq!(render_markdown(&first.document), render_markdown(&second.document));
    }

    #[test]
    fn test_report_follows_catalog_reload() {
        let service = service();
        service
            .catalog()
            .append_toml(
                r#"
                [[rules]]
                id = "lahore-shade"
                category = "public-health"
                severity = "medium"
                text = "Open shaded rest points in {location}"
                when = { field = "temperature_c", op = ">=", value = 38 }
                "#,
            )
            .unwrap();

        let set = service.recommend(&lahore_payload()).unwrap();
        assert!(set.iter().any(|r| r.rule_id == "lahore-shade"));
    }

    #[test]
    fn test_sparse_payload_yields_well_formed_report() {
        let payload = json!({ "name": "Gilgit", "dt": 1717229700 });

        let report = service().build_report(&payload, &[]).unwrap();
        assert!(report.set.is_empty());
        assert!(report.document.recommendation_groups().is_empty());
        assert!(report.forecast.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_reported() {
        let err = service()
            .recommend(&json!({ "temperature_c": 40 }))
            .unwrap_err();
        assert_eq!(err.code(), "MALFORMED_PAYLOAD");
        assert!(matches!(
            err,
            climate_policy_backend::AppError::Policy(PolicyError::MalformedPayload { .. })
        ));
    }

    #[test]
    fn test_empty_catalog_is_reported() {
        let store = CatalogStore::load(&CatalogConfig::default()).unwrap();
        let svc = PolicyService::new(Arc::new(store), None);

        let err = svc.recommend(&lahore_payload()).unwrap_err();
        assert_eq!(err.code(), "EMPTY_CATALOG");
    }
}
