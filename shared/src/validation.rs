//! Validation utilities for the Climate Policy Maker
//!
//! Range checks for normalized readings and load-time checks for rule
//! definitions.

use rust_decimal::Decimal;

use crate::models::SnapshotField;

// ============================================================================
// Reading Validations
// ============================================================================

/// Validate that a relative humidity lies within 0-100%
pub fn validate_humidity(humidity: Decimal) -> Result<(), &'static str> {
    if humidity < Decimal::ZERO || humidity > Decimal::from(100) {
        return Err("Humidity must be between 0 and 100%");
    }
    Ok(())
}

/// Validate that an amount (precipitation, wind speed) is not negative
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

/// Validate that a temperature is physically plausible at the surface
pub fn validate_temperature(celsius: Decimal) -> Result<(), &'static str> {
    if celsius < Decimal::from(-90) || celsius > Decimal::from(60) {
        return Err("Temperature must be between -90 and 60 °C");
    }
    Ok(())
}

// ============================================================================
// Rule Validations
// ============================================================================

/// Placeholders every template may use besides the numeric readings
pub const CONTEXT_PLACEHOLDERS: [&str; 3] = ["location", "observed_at", "condition"];

/// Largest magnitude accepted for a rule's `priority_base`
pub const MAX_PRIORITY_BASE: i32 = 1_000_000;

/// Validate a rule's base priority
pub fn validate_priority_base(base: i32) -> Result<(), &'static str> {
    if base.unsigned_abs() > MAX_PRIORITY_BASE.unsigned_abs() {
        return Err("priority_base must be between -1000000 and 1000000");
    }
    Ok(())
}

/// Validate rule id format (lowercase alphanumeric words joined by '-' or '_')
pub fn validate_rule_id(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("Rule id cannot be empty");
    }
    if id.len() > 64 {
        return Err("Rule id must be at most 64 characters");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err("Rule id must be lowercase alphanumeric with '-' or '_'");
    }
    if id.starts_with(['-', '_']) || id.ends_with(['-', '_']) {
        return Err("Rule id cannot start or end with a separator");
    }
    Ok(())
}

/// Extract `{name}` placeholders from a template, in order of appearance
pub fn template_placeholders(template: &str) -> Result<Vec<&str>, &'static str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        if rest[..open].contains('}') {
            return Err("Unmatched '}' in template");
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or("Unclosed placeholder in template")?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') {
            return Err("Malformed placeholder in template");
        }
        names.push(name);
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err("Unmatched '}' in template");
    }
    Ok(names)
}

/// Whether a placeholder name can be substituted from a snapshot
pub fn is_known_placeholder(name: &str) -> bool {
    CONTEXT_PLACEHOLDERS.contains(&name) || SnapshotField::parse_str(name).is_some()
}

/// Validate a recommendation template
pub fn validate_template(template: &str) -> Result<(), String> {
    if template.trim().is_empty() {
        return Err("Recommendation text cannot be empty".to_string());
    }
    let names = template_placeholders(template).map_err(str::to_string)?;
    for name in names {
        if !is_known_placeholder(name) {
            return Err(format!("Unknown placeholder '{{{}}}'", name));
        }
    }
    Ok(())
}
