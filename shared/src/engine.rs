//! Recommendation engine
//!
//! Evaluates a [`RuleCatalog`] against a [`WeatherSnapshot`]. Evaluation is a
//! pure function of its inputs: the same snapshot and catalog always produce
//! the same set, in the same order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::catalog::RuleCatalog;
use crate::error::{PolicyError, PolicyResult};
use crate::models::{
    ConditionCode, Recommendation, RecommendationSet, Rule, SnapshotField, TriggerFact,
    WeatherSnapshot,
};
use crate::types::{format_reading, NOT_AVAILABLE};

/// Evaluate the catalog, stamping the set with the snapshot's observation time
pub fn evaluate(snapshot: &WeatherSnapshot, catalog: &RuleCatalog) -> PolicyResult<RecommendationSet> {
    evaluate_at(snapshot, catalog, snapshot.observed_at)
}

/// Evaluate the catalog, stamping the set with `generated_at`
pub fn evaluate_at(
    snapshot: &WeatherSnapshot,
    catalog: &RuleCatalog,
    generated_at: DateTime<Utc>,
) -> PolicyResult<RecommendationSet> {
    if catalog.is_empty() {
        return Err(PolicyError::EmptyCatalog);
    }

    // Ids are unique per catalog, so each rule contributes at most once
    let mut recommendations: Vec<Recommendation> = catalog
        .rules()
        .iter()
        .filter(|rule| rule.predicate.is_triggered(snapshot))
        .map(|rule| recommend(rule, snapshot))
        .collect();

    recommendations.sort_by(rank);

    Ok(RecommendationSet {
        snapshot: snapshot.clone(),
        generated_at,
        recommendations,
    })
}

/// Total order: priority desc, then category, then rule id
pub fn rank(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.rule_id.cmp(&b.rule_id))
}

fn recommend(rule: &Rule, snapshot: &WeatherSnapshot) -> Recommendation {
    Recommendation {
        rule_id: rule.id.clone(),
        category: rule.category,
        severity: rule.severity,
        text: render_template(&rule.text, snapshot),
        priority: rule.priority(),
        rationale: rationale(rule, snapshot),
    }
}

fn rationale(rule: &Rule, snapshot: &WeatherSnapshot) -> Vec<TriggerFact> {
    let mut facts: Vec<TriggerFact> = rule
        .predicate
        .fields()
        .into_iter()
        .filter_map(|field| {
            field.read(snapshot).map(|value| TriggerFact {
                field: field.key().to_string(),
                value: value.normalize().to_string(),
            })
        })
        .collect();

    if rule.predicate.reads_condition() {
        facts.push(TriggerFact {
            field: "condition".to_string(),
            value: snapshot.condition.to_string(),
        });
    }
    facts
}

/// Substitute `{placeholder}` slots with snapshot values.
///
/// Missing readings render as the "not available" token. Unknown names are
/// left untouched; the catalog rejects them at load time.
pub fn render_template(template: &str, snapshot: &WeatherSnapshot) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match placeholder_value(name, snapshot) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholder_value(name: &str, snapshot: &WeatherSnapshot) -> Option<String> {
    if let Some(field) = SnapshotField::parse_str(name) {
        return Some(format_reading(field.read(snapshot)));
    }
    match name {
        "location" => Some(snapshot.location.clone()),
        "observed_at" => Some(snapshot.observed_at.format("%Y-%m-%d %H:%M UTC").to_string()),
        "condition" => Some(match snapshot.condition {
            ConditionCode::Unknown => NOT_AVAILABLE.to_string(),
            code => code.to_string(),
        }),
        _ => None,
    }
}
