//! Weather data models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{GpsCoordinates, Reading};

/// A single weather reading for one location and time.
///
/// Produced once per request by the normalizer and never mutated. Numeric
/// readings are `None` when the provider did not report them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub location: String,
    pub observed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GpsCoordinates>,
    pub temperature_c: Reading,
    pub precipitation_mm: Reading,
    pub wind_speed_kph: Reading,
    pub humidity_pct: Reading,
    pub condition: ConditionCode,
}

impl WeatherSnapshot {
    /// A snapshot with every reading missing
    pub fn empty(location: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            observed_at,
            coordinates: None,
            temperature_c: None,
            precipitation_mm: None,
            wind_speed_kph: None,
            humidity_pct: None,
            condition: ConditionCode::Unknown,
        }
    }

    /// Names of the readings the provider did not report
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.temperature_c.is_none() {
            missing.push("temperature_c");
        }
        if self.precipitation_mm.is_none() {
            missing.push("precipitation_mm");
        }
        if self.wind_speed_kph.is_none() {
            missing.push("wind_speed_kph");
        }
        if self.humidity_pct.is_none() {
            missing.push("humidity_pct");
        }
        if self.condition == ConditionCode::Unknown {
            missing.push("condition");
        }
        missing
    }
}

/// Canonical sky condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCode {
    Clear,
    Cloudy,
    Rain,
    Storm,
    Snow,
    Fog,
    Unknown,
}

impl ConditionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCode::Clear => "clear",
            ConditionCode::Cloudy => "cloudy",
            ConditionCode::Rain => "rain",
            ConditionCode::Storm => "storm",
            ConditionCode::Snow => "snow",
            ConditionCode::Fog => "fog",
            ConditionCode::Unknown => "unknown",
        }
    }

    /// Parse a canonical label (`"clear"`, `"storm"`, ...)
    pub fn parse_str(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "clear" => Some(ConditionCode::Clear),
            "cloudy" => Some(ConditionCode::Cloudy),
            "rain" => Some(ConditionCode::Rain),
            "storm" => Some(ConditionCode::Storm),
            "snow" => Some(ConditionCode::Snow),
            "fog" => Some(ConditionCode::Fog),
            "unknown" => Some(ConditionCode::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of the provider's daily outlook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyOutlook {
    pub date: NaiveDate,
    pub temperature_max_c: Reading,
    pub temperature_min_c: Reading,
    pub precipitation_mm: Reading,
}

/// Daily outlook for a location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForecastSeries {
    pub days: Vec<DailyOutlook>,
}

/// A prepared series handed to the chart renderer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub unit: String,
    pub points: Vec<(NaiveDate, Decimal)>,
}

impl ForecastSeries {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Series for max temperature, min temperature and precipitation.
    /// Days without a value are skipped; series with no points are omitted.
    pub fn chart_series(&self) -> Vec<ChartSeries> {
        let series: [(&str, &str, fn(&DailyOutlook) -> Reading); 3] = [
            ("Daily Max Temperature", "°C", |d| d.temperature_max_c),
            ("Daily Min Temperature", "°C", |d| d.temperature_min_c),
            ("Daily Precipitation", "mm", |d| d.precipitation_mm),
        ];

        series
            .iter()
            .map(|(title, unit, pick)| ChartSeries {
                title: title.to_string(),
                unit: unit.to_string(),
                points: self
                    .days
                    .iter()
                    .filter_map(|d| pick(d).map(|v| (d.date, v)))
                    .collect(),
            })
            .filter(|s| !s.points.is_empty())
            .collect()
    }

    /// Short textual outlook, one line per day
    pub fn outlook_lines(&self, days: usize) -> Vec<String> {
        self.days
            .iter()
            .take(days)
            .map(|d| {
                let mut line = format!("{}:", d.date);
                let mut parts = Vec::new();
                if let Some(max) = d.temperature_max_c {
                    parts.push(format!("Max {} °C", max.normalize()));
                }
                if let Some(min) = d.temperature_min_c {
                    parts.push(format!("Min {} °C", min.normalize()));
                }
                if let Some(precip) = d.precipitation_mm {
                    parts.push(format!("Precip {} mm", precip.normalize()));
                }
                if parts.is_empty() {
                    line.push_str(" no data");
                } else {
                    line.push(' ');
                    line.push_str(&parts.join(", "));
                }
                line
            })
            .collect()
    }
}
