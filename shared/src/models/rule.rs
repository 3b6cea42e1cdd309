//! Rule and predicate models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::policy::{Category, Severity};
use super::weather::{ConditionCode, WeatherSnapshot};
use crate::types::Reading;

/// Numeric snapshot readings a predicate can compare
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotField {
    TemperatureC,
    PrecipitationMm,
    WindSpeedKph,
    HumidityPct,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 4] = [
        SnapshotField::TemperatureC,
        SnapshotField::PrecipitationMm,
        SnapshotField::WindSpeedKph,
        SnapshotField::HumidityPct,
    ];

    /// Key used in catalog files and as a text placeholder
    pub fn key(&self) -> &'static str {
        match self {
            SnapshotField::TemperatureC => "temperature_c",
            SnapshotField::PrecipitationMm => "precipitation_mm",
            SnapshotField::WindSpeedKph => "wind_speed_kph",
            SnapshotField::HumidityPct => "humidity_pct",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SnapshotField::TemperatureC => "°C",
            SnapshotField::PrecipitationMm => "mm",
            SnapshotField::WindSpeedKph => "km/h",
            SnapshotField::HumidityPct => "%",
        }
    }

    pub fn parse_str(key: &str) -> Option<Self> {
        SnapshotField::ALL.into_iter().find(|f| f.key() == key.trim())
    }

    pub fn read(&self, snapshot: &WeatherSnapshot) -> Reading {
        match self {
            SnapshotField::TemperatureC => snapshot.temperature_c,
            SnapshotField::PrecipitationMm => snapshot.precipitation_mm,
            SnapshotField::WindSpeedKph => snapshot.wind_speed_kph,
            SnapshotField::HumidityPct => snapshot.humidity_pct,
        }
    }
}

/// Comparison operator of a threshold predicate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl Comparison {
    pub fn parse_str(op: &str) -> Option<Self> {
        match op.trim() {
            "gt" | ">" => Some(Comparison::Gt),
            "gte" | ">=" => Some(Comparison::Gte),
            "lt" | "<" => Some(Comparison::Lt),
            "lte" | "<=" => Some(Comparison::Lte),
            "eq" | "==" => Some(Comparison::Eq),
            _ => None,
        }
    }

    pub fn apply(&self, reading: Decimal, threshold: Decimal) -> bool {
        match self {
            Comparison::Gt => reading > threshold,
            Comparison::Gte => reading >= threshold,
            Comparison::Lt => reading < threshold,
            Comparison::Lte => reading <= threshold,
            Comparison::Eq => reading == threshold,
        }
    }
}

/// Condition under which a rule fires.
///
/// Evaluation is three-valued: `None` means a referenced reading is missing.
/// `All`/`Any`/`Not` follow Kleene logic, so `Not` of a missing reading is
/// still `None` and can never fire a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Threshold {
        field: SnapshotField,
        op: Comparison,
        value: Decimal,
    },
    Condition { any_of: Vec<ConditionCode> },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn threshold(field: SnapshotField, op: Comparison, value: Decimal) -> Self {
        Predicate::Threshold { field, op, value }
    }

    pub fn evaluate(&self, snapshot: &WeatherSnapshot) -> Option<bool> {
        match self {
            Predicate::Threshold { field, op, value } => {
                field.read(snapshot).map(|reading| op.apply(reading, *value))
            }
            Predicate::Condition { any_of } => match snapshot.condition {
                ConditionCode::Unknown => None,
                code => Some(any_of.contains(&code)),
            },
            Predicate::All(parts) => {
                let mut indeterminate = false;
                for part in parts {
                    match part.evaluate(snapshot) {
                        Some(false) => return Some(false),
                        None => indeterminate = true,
                        Some(true) => {}
                    }
                }
                if indeterminate {
                    None
                } else {
                    Some(true)
                }
            }
            Predicate::Any(parts) => {
                let mut indeterminate = false;
                for part in parts {
                    match part.evaluate(snapshot) {
                        Some(true) => return Some(true),
                        None => indeterminate = true,
                        Some(false) => {}
                    }
                }
                if indeterminate {
                    None
                } else {
                    Some(false)
                }
            }
            Predicate::Not(inner) => inner.evaluate(snapshot).map(|b| !b),
        }
    }

    /// True only when the predicate definitely holds
    pub fn is_triggered(&self, snapshot: &WeatherSnapshot) -> bool {
        self.evaluate(snapshot) == Some(true)
    }

    /// Readings the predicate consults, in first-reference order
    pub fn fields(&self) -> Vec<SnapshotField> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    /// Whether the predicate consults the sky condition
    pub fn reads_condition(&self) -> bool {
        match self {
            Predicate::Threshold { .. } => false,
            Predicate::Condition { .. } => true,
            Predicate::All(parts) | Predicate::Any(parts) => {
                parts.iter().any(Predicate::reads_condition)
            }
            Predicate::Not(inner) => inner.reads_condition(),
        }
    }

    fn collect_fields(&self, out: &mut Vec<SnapshotField>) {
        match self {
            Predicate::Threshold { field, .. } => {
                if !out.contains(field) {
                    out.push(*field);
                }
            }
            Predicate::Condition { .. } => {}
            Predicate::All(parts) | Predicate::Any(parts) => {
                for part in parts {
                    part.collect_fields(out);
                }
            }
            Predicate::Not(inner) => inner.collect_fields(out),
        }
    }
}

/// A catalog-resident condition to recommendation mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    pub priority_base: i32,
    /// Recommendation template with `{placeholder}` slots
    pub text: String,
    pub predicate: Predicate,
}

impl Rule {
    pub fn priority(&self) -> i32 {
        self.priority_base.saturating_add(self.severity.weight())
    }
}
