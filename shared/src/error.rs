//! Error types for the policy core
//!
//! Only structural and configuration problems are errors. Sparse weather data
//! is absorbed by the normalizer and the engine and never surfaces here.

use thiserror::Error;

/// Errors raised by the normalizer, the rule catalog, the engine and the
/// report assembler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The weather payload lacks a key that identifies the observation
    #[error("Malformed weather payload: missing {key}")]
    MalformedPayload { key: String },

    /// The catalog holds no rules
    #[error("Rule catalog is empty")]
    EmptyCatalog,

    /// Two rules share the same id
    #[error("Duplicate rule id: {0}")]
    DuplicateRuleId(String),

    /// A rule definition failed validation while loading
    #[error("Invalid rule '{rule_id}': {reason}")]
    InvalidRule { rule_id: String, reason: String },

    /// The catalog document could not be parsed
    #[error("Catalog parse error: {0}")]
    CatalogParse(String),

    /// A chart reference is in a format the assembler cannot embed
    #[error("Unsupported chart format for '{title}': {detail}")]
    UnsupportedChartFormat { title: String, detail: String },
}

impl PolicyError {
    pub(crate) fn invalid_rule(rule_id: &str, reason: impl Into<String>) -> Self {
        PolicyError::InvalidRule {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(key: &str) -> Self {
        PolicyError::MalformedPayload {
            key: key.to_string(),
        }
    }
}

/// Result alias for the policy core
pub type PolicyResult<T> = Result<T, PolicyError>;
