//! Error handling module
//!
//! This module provides centralized error handling for the application.
//! `AppError` covers broken route declarations and setup failures, which
//! abort route registration. Per-request failures are not errors in this
//! sense: they are `ValidationError` values returned by the validators.

use thiserror::Error;
use serde_json::Value;

/// Application error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown parameter type: {0}")]
    UnknownParameterType(String),

    #[error("Bad value for request method \"{method}\", must be one of GET,POST")]
    InvalidMethod { method: String },

    #[error("A parameter with the name \"{name}\" already exists")]
    DuplicateParameter { name: String },

    #[error("The type of the {field} for parameter \"{parameter}\" should be \"{expected}\"")]
    InvalidParameterValue {
        parameter: String,
        field: &'static str,
        expected: String,
    },

    #[error("Invalid regular expression for parameter \"{parameter}\": {reason}")]
    InvalidRegex { parameter: String, reason: String },

    #[error("Validation set is sealed, parameters can no longer be configured")]
    Sealed,

    #[error("The route \"{route}\" was not found or is not an Ajax route")]
    RouteNotFound { route: String },

    #[error("There is no pre-configuration with name \"{name}\"")]
    UnknownPreConfig { name: String },

    #[error("JSON serialization error: {0}")]
    Json(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convert to a `{message}` JSON body
    pub fn to_json(&self) -> Value {
        serde_json::json!({ "message": self.to_string() })
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> warp::http::StatusCode {
        match self {
            AppError::RouteNotFound { .. } => warp::http::StatusCode::NOT_FOUND,
            AppError::Json(_) => warp::http::StatusCode::BAD_REQUEST,
            _ => warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

impl warp::reject::Reject for AppError {}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_parameter_message_names_parameter() {
        let err = AppError::DuplicateParameter { name: "x".to_string() };
        assert_eq!(err.to_string(), "A parameter with the name \"x\" already exists");
    }

    #[test]
    fn route_not_found_maps_to_404() {
        let err = AppError::RouteNotFound { route: "missing".to_string() };
        assert_eq!(err.http_status_code(), warp::http::StatusCode::NOT_FOUND);
        assert_eq!(err.to_json()["message"], "The route \"missing\" was not found or is not an Ajax route");
    }

    #[test]
    fn setup_errors_map_to_500() {
        assert_eq!(AppError::Sealed.http_status_code(), warp::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn json_error_converts() {
        let err: AppError = serde_json::from_str::<Value>("{").unwrap_err().into();
        assert!(matches!(err, AppError::Json(_)));
    }
}
