//! Configuration validation module
//!
//! Checks the validator derives cannot express: every route must build a
//! validation set, so broken declarations fail at startup instead of on the
//! first request. Auto-validated routes cannot require uploads, since the
//! warp filter only reads url-encoded inputs.

use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::domain::route::RouteRegistry;
use crate::domain::validation::Parameter;
use crate::shared::error::AppError;

/// Configuration validator for additional validation logic
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the complete configuration
    pub fn validate_config(config: &AppConfig) -> crate::Result<()> {
        Self::validate_log_level(&config.logging.level)?;
        Self::validate_routes(config)?;
        Ok(())
    }

    fn validate_log_level(level: &str) -> crate::Result<()> {
        EnvFilter::try_new(level)
            .map(|_| ())
            .map_err(|e| AppError::Config(format!("Invalid log level \"{}\": {}", level, e)))
    }

    /// Build the validation set of every route once
    fn validate_routes(config: &AppConfig) -> crate::Result<()> {
        let registry = RouteRegistry::from_routes(config.routes.clone(), config.pre_config.clone())?
            .with_upload_ceiling(config.limits.upload_max_filesize);

        for route in &config.routes {
            if route.path.is_empty() {
                return Err(AppError::Config(format!(
                    "The route \"{}\" has no path",
                    route.name
                )));
            }
            if !route.expose {
                debug!(route = %route.name, "Route not exposed, skipped");
                continue;
            }
            let set = registry.build_validation_set(route)?;
            if route.auto_valid {
                if let Some(file) = set.required_file() {
                    return Err(AppError::Config(format!(
                        "The route \"{}\" is validated automatically but requires the file parameter \"{}\"; uploads are not extracted, make it optional or set auto_valid = false",
                        route.name,
                        file.name()
                    )));
                }
            }
        }

        if config.routes.is_empty() {
            warn!("No routes configured");
        }
        Ok(())
    }
}
