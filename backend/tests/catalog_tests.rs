//! Rule catalog and engine property tests
//!
//! - Determinism: identical snapshot and catalog give identical sets
//! - Severity monotonicity: raising a severity never lowers priority or rank
//! - Missing data safety: a snapshot with no readings triggers nothing
//! - Reload: a rejected catalog leaves the active one in place

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use climate_policy_backend::config::CatalogConfig;
use climate_policy_backend::services::CatalogStore;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    evaluate, Category, Comparison, ConditionCode, Predicate, Rule, RuleCatalog, Severity,
    SnapshotField, WeatherSnapshot,
};

fn snapshot(temp: Option<i64>, precip: Option<i64>, wind: Option<i64>, humidity: Option<i64>) -> WeatherSnapshot {
    WeatherSnapshot {
        temperature_c: temp.map(Decimal::from),
        precipitation_mm: precip.map(Decimal::from),
        wind_speed_kph: wind.map(Decimal::from),
        humidity_pct: humidity.map(Decimal::from),
        condition: ConditionCode::Clear,
        ..WeatherSnapshot::empty("Multan", Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }
}

fn severity(i: u8) -> Severity {
    match i % 4 {
        0 => Severity::Low,
        1 => Severity::Medium,
        2 => Severity::High,
        _ => Severity::Critical,
    }
}

fn always(id: &str, category: Category, severity: Severity, base: i32) -> Rule {
    Rule {
        id: id.to_string(),
        category,
        severity,
        priority_base: base,
        text: format!("{} for {{location}}", id),
        predicate: Predicate::threshold(SnapshotField::TemperatureC, Comparison::Gte, Decimal::from(-100)),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Evaluation is a pure function of its inputs
    #[test]
    fn prop_evaluation_is_deterministic(
        temp in proptest::option::of(-40i64..55),
        precip in proptest::option::of(0i64..200),
        wind in proptest::option::of(0i64..150),
        humidity in proptest::option::of(0i64..=100),
    ) {
        let catalog = RuleCatalog::builtin().unwrap();
        let snap = snapshot(temp, precip, wind, humidity);

        let first = evaluate(&snap, &catalog).unwrap();
        let second = evaluate(&snap, &catalog).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Every set is sorted by the total order and free of duplicate ids
    #[test]
    fn prop_sets_are_ordered_and_unique(
        temp in proptest::option::of(-40i64..55),
        precip in proptest::option::of(0i64..200),
        wind in proptest::option::of(0i64..150),
        humidity in proptest::option::of(0i64..=100),
    ) {
        let catalog = RuleCatalog::builtin().unwrap();
        let set = evaluate(&snapshot(temp, precip, wind, humidity), &catalog).unwrap();

        for pair in set.recommendations.windows(2) {
            prop_assert_ne!(shared::engine::rank(&pair[0], &pair[1]), std::cmp::Ordering::Greater);
        }
        let mut ids = set.rule_ids();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), set.len());
    }

    /// Raising one rule's severity never lowers its priority or its rank
    #[test]
    fn prop_severity_monotonicity(
        low in 0u8..4,
        bump in 0u8..4,
        base in 0i32..50,
        others in proptest::collection::vec((0u8..4, 0i32..50), 1..6),
    ) {
        let raised = severity(low.saturating_add(bump).min(3));
        let lowered = severity(low);

        let build = |s: Severity| {
            let mut rules = vec![always("subject", Category::Water, s, base)];
            for (i, (sev, b)) in others.iter().enumerate() {
                rules.push(always(&format!("other-{}", i), Category::Energy, severity(*sev), *b));
            }
            RuleCatalog::new(rules).unwrap()
        };
        let snap = snapshot(Some(20), None, None, None);

        let before = evaluate(&snap, &build(lowered)).unwrap();
        let after = evaluate(&snap, &build(raised)).unwrap();

        let position = |set: &shared::RecommendationSet| {
            set.iter().position(|r| r.rule_id == "subject").unwrap()
        };
        let priority = |set: &shared::RecommendationSet| {
            set.iter().find(|r| r.rule_id == "subject").unwrap().priority
        };

        prop_assert!(priority(&after) >= priority(&before));
        prop_assert!(position(&after) <= position(&before));
    }

    /// A snapshot with no readings and unknown sky triggers no rule
    #[test]
    fn prop_missing_data_never_triggers(hour in 0u32..24) {
        let catalog = RuleCatalog::builtin().unwrap();
        let snap = WeatherSnapshot::empty(
            "Nowhere",
            Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        );
        prop_assert!(evaluate(&snap, &catalog).unwrap().is_empty());
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_rejected_at_construction() {
        let rules = vec![
            always("dup", Category::Water, Severity::Low, 0),
            always("dup", Category::Energy, Severity::High, 0),
        ];
        assert_eq!(
            RuleCatalog::new(rules),
            Err(shared::PolicyError::DuplicateRuleId("dup".to_string()))
        );
    }

    #[test]
    fn test_reload_from_overlay_file() {
        let dir = std::env::temp_dir().join(format!("cpm-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("overlay.toml");
        std::fs::write(
            &path,
            r#"
            version = "local-1"

            [[rules]]
            id = "glacier-melt-water"
            category = "water"
            severity = "critical"
            priority_base = 40
            text = "Activate glacial lake outburst flood watch near {location}"
            when = { all = [
                { field = "temperature_c", op = "gt", value = 30 },
                { condition = ["clear", "cloudy"] },
            ] }
            "#,
        )
        .unwrap();

        let config = CatalogConfig {
            path: Some(path.to_string_lossy().into_owned()),
            include_builtin: true,
        };
        let store = CatalogStore::load(&config).unwrap();
        let catalog = store.current();
        assert_eq!(catalog.version(), Some("local-1"));
        assert!(catalog.get("glacier-melt-water").is_some());
        assert!(catalog.get("heatwave-energy").is_some());

        // Break the file: reload is rejected and the old catalog stays
        std::fs::write(&path, "[[rules]]\nid = 3").unwrap();
        assert!(store.reload().is_err());
        assert!(Arc::ptr_eq(&catalog, &store.current()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_replace_returns_previous() {
        let store = CatalogStore::new(RuleCatalog::builtin().unwrap(), CatalogConfig::default());
        let replacement = RuleCatalog::new(vec![always("only", Category::Emissions, Severity::Low, 0)]).unwrap();

        let previous = store.replace(replacement);
        assert!(previous.len() > 1);
        assert_eq!(store.current().ids(), vec!["only"]);
    }
}
