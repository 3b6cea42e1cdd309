//! Error handling for the Climate Policy Maker backend
//!
//! Every error maps to a stable machine-readable code so callers of the
//! binary can react to failures without parsing messages.

use serde::Serialize;
use shared::PolicyError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Policy core errors
    #[error(transparent)]
    Policy(#[from] PolicyError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    // Input errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Prompt rejected: {0}")]
    PromptRejected(String),

    // I/O and encoding errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(e: csv::Error) -> Self {
        AppError::Serialization(format!("CSV serialization error: {}", e))
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Stable machine code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Policy(policy) => match policy {
                PolicyError::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
                PolicyError::EmptyCatalog => "EMPTY_CATALOG",
                PolicyError::DuplicateRuleId(_) => "DUPLICATE_RULE_ID",
                PolicyError::InvalidRule { .. } => "INVALID_RULE",
                PolicyError::CatalogParse(_) => "CATALOG_PARSE_ERROR",
                PolicyError::UnsupportedChartFormat { .. } => "UNSUPPORTED_CHART_FORMAT",
            },
            AppError::Configuration(_) | AppError::ConfigLoad(_) => "CONFIGURATION_ERROR",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::PromptRejected(_) => "PROMPT_REJECTED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Serializable description of this error
    pub fn detail(&self) -> ErrorDetail {
        let field = match self {
            AppError::Policy(PolicyError::MalformedPayload { key }) => Some(key.clone()),
            AppError::Policy(PolicyError::DuplicateRuleId(id)) => Some(id.clone()),
            AppError::Policy(PolicyError::InvalidRule { rule_id, .. }) => Some(rule_id.clone()),
            AppError::Policy(PolicyError::UnsupportedChartFormat { title, .. }) => {
                Some(title.clone())
            }
            AppError::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };

        ErrorDetail {
            code: self.code().to_string(),
            message: self.to_string(),
            field,
        }
    }

    pub fn into_response(self) -> ErrorResponse {
        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        ErrorResponse {
            error: self.detail(),
        }
    }
}

/// Result type alias for backend services
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_codes() {
        let err: AppError = PolicyError::EmptyCatalog.into();
        assert_eq!(err.code(), "EMPTY_CATALOG");

        let err: AppError = PolicyError::MalformedPayload {
            key: "location".to_string(),
        }
        .into();
        let detail = err.detail();
        assert_eq!(detail.code, "MALFORMED_PAYLOAD");
        assert_eq!(detail.field.as_deref(), Some("location"));
        assert!(detail.message.contains("location"));
    }

    #[test]
    fn test_detail_serializes_without_empty_field() {
        let response = AppError::PromptRejected("off topic".to_string()).into_response();
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["error"]["code"], "PROMPT_REJECTED");
        assert!(json["error"].get("field").is_none());
    }
}
