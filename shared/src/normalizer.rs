//! Indicator normalizer
//!
//! Maps loosely structured provider payloads onto a [`WeatherSnapshot`].
//! Recognized shapes:
//!
//! - the composite backend payload `{"city", "WeatherAPI": {...}, "OpenMeteo": {...}}`
//! - a WeatherAPI `current.json` document `{"location": {...}, "current": {...}}`
//! - an OpenWeatherMap current-weather document `{"name", "dt", "main", "wind", ...}`
//! - a flat canonical document `{"location", "observed_at", "temperature_c", ...}`
//!
//! Only the location and the observation time are required. Every other
//! reading degrades to missing when absent, unparseable or out of range.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::{PolicyError, PolicyResult};
use crate::models::{ConditionCode, DailyOutlook, ForecastSeries, WeatherSnapshot};
use crate::types::{GpsCoordinates, Reading};
use crate::validation::{validate_humidity, validate_non_negative, validate_temperature};

/// 1 mph in km/h
pub const MPH_TO_KPH: Decimal = Decimal::from_parts(1_609_344, 0, 0, false, 6);
/// 1 m/s in km/h
pub const MPS_TO_KPH: Decimal = Decimal::from_parts(36, 0, 0, false, 1);
/// 1 knot in km/h
pub const KNOTS_TO_KPH: Decimal = Decimal::from_parts(1_852, 0, 0, false, 3);
/// 1 inch in mm
pub const INCH_TO_MM: Decimal = Decimal::from_parts(254, 0, 0, false, 1);

/// 0 °C in kelvin
pub const KELVIN_OFFSET: Decimal = Decimal::from_parts(27_315, 0, 0, false, 2);

/// Decimal places kept after unit conversion
const READING_DP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Celsius,
    Fahrenheit,
    Kelvin,
    Millimetres,
    Inches,
    Kph,
    Mps,
    Mph,
    Knots,
    Percent,
}

impl Unit {
    /// Convert to the canonical unit; `None` when the arithmetic overflows
    fn to_canonical(self, value: Decimal) -> Option<Decimal> {
        let converted = match self {
            Unit::Celsius | Unit::Millimetres | Unit::Kph | Unit::Percent => value,
            Unit::Fahrenheit => value
                .checked_sub(Decimal::from(32))?
                .checked_mul(Decimal::from(5))?
                .checked_div(Decimal::from(9))?,
            Unit::Kelvin => value.checked_sub(KELVIN_OFFSET)?,
            Unit::Inches => value.checked_mul(INCH_TO_MM)?,
            Unit::Mps => value.checked_mul(MPS_TO_KPH)?,
            Unit::Mph => value.checked_mul(MPH_TO_KPH)?,
            Unit::Knots => value.checked_mul(KNOTS_TO_KPH)?,
        };
        Some(converted.round_dp(READING_DP).normalize())
    }
}

// `main.temp` and `wind.speed` default to OpenWeatherMap's metric units; a
// top-level `units` field overrides them (see `openweathermap_units`).
const TEMPERATURE_KEYS: &[(&str, Unit)] = &[
    ("temperature_c", Unit::Celsius),
    ("temp_c", Unit::Celsius),
    ("main.temp", Unit::Celsius),
    ("temperature_2m", Unit::Celsius),
    ("temperature_f", Unit::Fahrenheit),
    ("temp_f", Unit::Fahrenheit),
];

const PRECIPITATION_KEYS: &[(&str, Unit)] = &[
    ("precipitation_mm", Unit::Millimetres),
    ("precip_mm", Unit::Millimetres),
    ("rain.1h", Unit::Millimetres),
    ("precipitation", Unit::Millimetres),
    ("precipitation_in", Unit::Inches),
    ("precip_in", Unit::Inches),
];

const WIND_KEYS: &[(&str, Unit)] = &[
    ("wind_speed_kph", Unit::Kph),
    ("wind_kph", Unit::Kph),
    ("wind_speed_10m", Unit::Kph),
    ("wind_speed_mps", Unit::Mps),
    ("wind.speed", Unit::Mps),
    ("wind_speed_mph", Unit::Mph),
    ("wind_mph", Unit::Mph),
    ("wind_speed_kn", Unit::Knots),
];

const HUMIDITY_KEYS: &[(&str, Unit)] = &[
    ("humidity_pct", Unit::Percent),
    ("humidity", Unit::Percent),
    ("main.humidity", Unit::Percent),
    ("relative_humidity_2m", Unit::Percent),
];

const LOCATION_KEYS: &[&str] = &["city", "location", "location.name", "name"];

// Epoch keys come first. `last_updated` and `time` carry no offset and are
// read as UTC, so a provider-local `last_updated` is only used when no epoch
// value is present.
const TIMESTAMP_KEYS: &[&str] = &[
    "observed_at",
    "last_updated_epoch",
    "dt",
    "last_updated",
    "time",
    "location.localtime_epoch",
];

/// Build a canonical snapshot from a provider payload
pub fn normalize(payload: &Value) -> PolicyResult<WeatherSnapshot> {
    let root = payload.as_object().ok_or_else(|| PolicyError::malformed("payload object"))?;
    let roots = observation_roots(root);

    let location = LOCATION_KEYS
        .iter()
        .find_map(|key| identity_roots(root).iter().find_map(|r| string_at(r, key)))
        .ok_or_else(|| PolicyError::malformed("location"))?;

    let observed_at = TIMESTAMP_KEYS
        .iter()
        .find_map(|key| roots.iter().find_map(|r| lookup(r, key).and_then(parse_timestamp)))
        .ok_or_else(|| PolicyError::malformed("timestamp"))?;

    let (temp_unit, wind_unit) = openweathermap_units(root);
    let temperature_keys = with_unit(TEMPERATURE_KEYS, "main.temp", temp_unit);
    let wind_keys = with_unit(WIND_KEYS, "wind.speed", wind_unit);

    let temperature_c =
        reading(&roots, &temperature_keys).filter(|v| validate_temperature(*v).is_ok());
    let precipitation_mm =
        reading(&roots, PRECIPITATION_KEYS).filter(|v| validate_non_negative(*v).is_ok());
    let wind_speed_kph = reading(&roots, &wind_keys).filter(|v| validate_non_negative(*v).is_ok());
    let humidity_pct = reading(&roots, HUMIDITY_KEYS).filter(|v| validate_humidity(*v).is_ok());

    Ok(WeatherSnapshot {
        location,
        observed_at,
        coordinates: coordinates(root),
        temperature_c,
        precipitation_mm,
        wind_speed_kph,
        humidity_pct,
        condition: condition(&roots),
    })
}

/// Extract the daily outlook. Never fails; an absent block gives an empty series.
pub fn normalize_forecast(payload: &Value) -> ForecastSeries {
    let Some(root) = payload.as_object() else {
        return ForecastSeries::default();
    };
    let meteo = root
        .get("OpenMeteo")
        .and_then(Value::as_object)
        .unwrap_or(root);
    let Some(daily) = meteo.get("daily").and_then(Value::as_object) else {
        return ForecastSeries::default();
    };
    let units = meteo.get("daily_units").and_then(Value::as_object);

    let column = |key: &str| -> Vec<Value> {
        daily
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let unit_of = |key: &str, default: Unit| -> Unit {
        match units.and_then(|u| u.get(key)).and_then(Value::as_str) {
            Some("°F") => Unit::Fahrenheit,
            Some("inch") => Unit::Inches,
            _ => default,
        }
    };

    let dates = column("time");
    let max = column("temperature_2m_max");
    let min = column("temperature_2m_min");
    let precip = column("precipitation_sum");
    let max_unit = unit_of("temperature_2m_max", Unit::Celsius);
    let min_unit = unit_of("temperature_2m_min", Unit::Celsius);
    let precip_unit = unit_of("precipitation_sum", Unit::Millimetres);

    let days = dates
        .iter()
        .enumerate()
        .filter_map(|(i, date)| {
            let date = NaiveDate::parse_from_str(date.as_str()?, "%Y-%m-%d").ok()?;
            Some(DailyOutlook {
                date,
                temperature_max_c: daily_reading(&max, i, max_unit),
                temperature_min_c: daily_reading(&min, i, min_unit),
                precipitation_mm: daily_reading(&precip, i, precip_unit)
                    .filter(|v| validate_non_negative(*v).is_ok()),
            })
        })
        .collect();

    ForecastSeries { days }
}

/// Temperature and wind units of an OpenWeatherMap document, from its
/// `units` request parameter echoed at the top level. Absent means metric.
fn openweathermap_units(root: &Map<String, Value>) -> (Unit, Unit) {
    match root.get("units").and_then(Value::as_str).map(str::trim) {
        Some(u) if u.eq_ignore_ascii_case("standard") => (Unit::Kelvin, Unit::Mps),
        Some(u) if u.eq_ignore_ascii_case("imperial") => (Unit::Fahrenheit, Unit::Mph),
        _ => (Unit::Celsius, Unit::Mps),
    }
}

fn with_unit<'a>(keys: &[(&'a str, Unit)], path: &str, unit: Unit) -> Vec<(&'a str, Unit)> {
    keys.iter()
        .map(|&(key, default)| (key, if key == path { unit } else { default }))
        .collect()
}

fn daily_reading(values: &[Value], i: usize, unit: Unit) -> Reading {
    values.get(i).and_then(parse_decimal).and_then(|v| unit.to_canonical(v))
}

/// Objects searched for readings, most specific first
fn observation_roots(root: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    let provider = root.get("WeatherAPI").and_then(Value::as_object);
    let mut roots = Vec::new();
    if let Some(current) = provider.and_then(|p| p.get("current")).and_then(Value::as_object) {
        roots.push(current);
    }
    if let Some(current) = root.get("current").and_then(Value::as_object) {
        roots.push(current);
    }
    if let Some(provider) = provider {
        roots.push(provider);
    }
    roots.push(root);
    roots
}

/// Objects searched for the location name
fn identity_roots(root: &Map<String, Value>) -> Vec<&Map<String, Value>> {
    let mut roots = vec![root];
    if let Some(provider) = root.get("WeatherAPI").and_then(Value::as_object) {
        roots.push(provider);
    }
    roots
}

/// Resolve a dotted path; numeric segments index into arrays
fn lookup<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

fn string_at(map: &Map<String, Value>, path: &str) -> Option<String> {
    lookup(map, path)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn reading(roots: &[&Map<String, Value>], keys: &[(&str, Unit)]) -> Reading {
    roots.iter().find_map(|root| {
        keys.iter().find_map(|(key, unit)| {
            lookup(root, key)
                .and_then(parse_decimal)
                .and_then(|v| unit.to_canonical(v))
        })
    })
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

fn coordinates(root: &Map<String, Value>) -> Option<GpsCoordinates> {
    let mut roots = identity_roots(root);
    if let Some(meteo) = root.get("OpenMeteo").and_then(Value::as_object) {
        roots.push(meteo);
    }
    let pairs = [
        ("location.lat", "location.lon"),
        ("coord.lat", "coord.lon"),
        ("latitude", "longitude"),
    ];
    roots.iter().find_map(|r| {
        pairs.iter().find_map(|(lat, lon)| {
            let latitude = lookup(r, lat).and_then(parse_decimal)?;
            let longitude = lookup(r, lon).and_then(parse_decimal)?;
            Some(GpsCoordinates::new(latitude, longitude))
        })
    })
}

fn condition(roots: &[&Map<String, Value>]) -> ConditionCode {
    let numeric = |path: &str, table: fn(i64) -> ConditionCode| {
        roots.iter().find_map(|r| {
            lookup(r, path)
                .and_then(Value::as_i64)
                .map(table)
                .filter(|c| *c != ConditionCode::Unknown)
        })
    };
    let textual = |path: &str| {
        roots.iter().find_map(|r| {
            lookup(r, path)
                .and_then(Value::as_str)
                .map(condition_from_text)
                .filter(|c| *c != ConditionCode::Unknown)
        })
    };

    numeric("condition.code", condition_from_weatherapi_code)
        .or_else(|| numeric("weather_code", condition_from_wmo_code))
        .or_else(|| numeric("weathercode", condition_from_wmo_code))
        .or_else(|| textual("condition"))
        .or_else(|| textual("condition.text"))
        .or_else(|| textual("weather.0.main"))
        .or_else(|| textual("weather.0.description"))
        .unwrap_or(ConditionCode::Unknown)
}

/// WeatherAPI.com condition codes
pub fn condition_from_weatherapi_code(code: i64) -> ConditionCode {
    match code {
        1000 => ConditionCode::Clear,
        1003 | 1006 | 1009 => ConditionCode::Cloudy,
        1030 | 1135 | 1147 => ConditionCode::Fog,
        1063 | 1072 | 1150 | 1153 | 1168 | 1171 | 1180 | 1183 | 1186 | 1189 | 1192 | 1195
        | 1198 | 1201 | 1240 | 1243 | 1246 => ConditionCode::Rain,
        1087 | 1273 | 1276 | 1279 | 1282 => ConditionCode::Storm,
        1066 | 1069 | 1114 | 1117 | 1204 | 1207 | 1210 | 1213 | 1216 | 1219 | 1222 | 1225
        | 1237 | 1249 | 1252 | 1255 | 1258 | 1261 | 1264 => ConditionCode::Snow,
        _ => ConditionCode::Unknown,
    }
}

/// WMO weather interpretation codes (Open-Meteo)
pub fn condition_from_wmo_code(code: i64) -> ConditionCode {
    match code {
        0 | 1 => ConditionCode::Clear,
        2 | 3 => ConditionCode::Cloudy,
        45 | 48 => ConditionCode::Fog,
        51..=67 | 80..=82 => ConditionCode::Rain,
        71..=77 | 85 | 86 => ConditionCode::Snow,
        95..=99 => ConditionCode::Storm,
        _ => ConditionCode::Unknown,
    }
}

/// Provider condition labels ("Thunderstorm", "Patchy rain possible", "Mist", ...)
pub fn condition_from_text(text: &str) -> ConditionCode {
    if let Some(code) = ConditionCode::parse_str(text) {
        return code;
    }
    let text = text.to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has(&["thunder", "storm", "tornado", "squall"]) {
        ConditionCode::Storm
    } else if has(&["snow", "sleet", "blizzard", "ice pellets"]) {
        ConditionCode::Snow
    } else if has(&["rain", "drizzle", "shower"]) {
        ConditionCode::Rain
    } else if has(&["fog", "mist", "haze", "smoke"]) {
        ConditionCode::Fog
    } else if has(&["cloud", "overcast"]) {
        ConditionCode::Cloudy
    } else if has(&["clear", "sunny"]) {
        ConditionCode::Clear
    } else {
        ConditionCode::Unknown
    }
}
