use http::HeaderName;
use tracing_subscriber::EnvFilter;

use crate::config::models::{LoggingConfig, RouterConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid label header '{header}': {reason}")]
    InvalidLabelHeader { header: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Router configuration validator
pub struct RouterConfigValidator;

impl RouterConfigValidator {
    /// Validate the entire router configuration, reporting every problem found
    pub fn validate(config: &RouterConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if config.service.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "service".to_string(),
            });
        }

        if config.namespace.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "namespace".to_string(),
            });
        }

        if let Err(e) = Self::validate_label_header(&config.label_header) {
            errors.push(e);
        }

        if let Some(location) = &config.location {
            for (field, value) in [
                ("location.region", &location.region),
                ("location.zone", &location.zone),
            ] {
                if value.trim().is_empty() {
                    errors.push(ValidationError::InvalidField {
                        field: field.to_string(),
                        message: "Location parts must not be empty".to_string(),
                    });
                }
            }
        }

        if config.routers.nearby.enabled && config.location.is_none() {
            tracing::warn!("Nearby router is enabled but no location is configured");
        }

        if let Err(e) = Self::validate_logging(&config.logging) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate that the label header is a legal HTTP header name
    fn validate_label_header(header: &str) -> ValidationResult<()> {
        HeaderName::from_bytes(header.as_bytes())
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidLabelHeader {
                header: header.to_string(),
                reason: e.to_string(),
            })
    }

    fn validate_logging(logging: &LoggingConfig) -> ValidationResult<()> {
        EnvFilter::try_new(&logging.level)
            .map(|_| ())
            .map_err(|e| ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: e.to_string(),
            })
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .enumerate()
            .map(|(i, e)| format!("  {}. {}", i + 1, e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
