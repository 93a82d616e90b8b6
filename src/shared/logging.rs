//! Logging utilities module
//!
//! This module provides centralized logging functionality and utilities.

use tracing::{info, warn};

use crate::domain::validation::ValidationError;

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the specified level.
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn initialize(level: &str) -> crate::shared::error::AppResult<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| crate::shared::error::AppError::Internal(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }

    /// Log a successfully validated request
    pub fn log_validated(route: &str, method: &str, parameter_count: usize) {
        info!(
            route = %route,
            method = %method,
            parameter_count = %parameter_count,
            "Request validated"
        );
    }

    /// Log a rejected request
    pub fn log_rejected(route: &str, method: &str, error: &ValidationError) {
        info!(
            route = %route,
            method = %method,
            error = %error,
            "Request rejected"
        );
    }

    /// Log an access denial
    pub fn log_access_denied(route: &str, user_roles: Option<&[String]>) {
        warn!(
            route = %route,
            user_roles = ?user_roles,
            "Access denied"
        );
    }
}
