//! Common types used across the platform

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Token rendered wherever a reading is missing
pub const NOT_AVAILABLE: &str = "not available";

/// A single numeric reading. `None` is the explicit missing marker.
pub type Reading = Option<Decimal>;

/// GPS coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpsCoordinates {
    pub latitude: Decimal,
    pub longitude: Decimal,
}

impl GpsCoordinates {
    pub fn new(latitude: Decimal, longitude: Decimal) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for GpsCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude.normalize(), self.longitude.normalize())
    }
}

/// Render a reading, using the "not available" token when missing
pub fn format_reading(reading: Reading) -> String {
    match reading {
        Some(value) => value.normalize().to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Render a reading followed by its unit, or the "not available" token
pub fn format_reading_with_unit(reading: Reading, unit: &str) -> String {
    match reading {
        Some(value) => format!("{} {}", value.normalize(), unit),
        None => NOT_AVAILABLE.to_string(),
    }
}
