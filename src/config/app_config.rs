//! Application configuration structures
//!
//! Everything the validator needs at startup: log level, size limits, the
//! role hierarchy, reusable parameter blocks and the route declarations.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::route::{PreConfig, RouteDefinition};
use crate::domain::security::RoleHierarchy;
use crate::domain::validation::DEFAULT_UPLOAD_MAX_FILESIZE;
use crate::infrastructure::http::routes::DEFAULT_MAX_FORM_SIZE;
use crate::shared::error::AppError;

/// Environment variable prefix, e.g. `AJAX_ROUTES__LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "AJAX_ROUTES";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[validate(length(min = 1))]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Request size limits
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upload ceiling in bytes; per-parameter `maxSize` must stay below it
    #[validate(range(min = 1))]
    pub upload_max_filesize: u64,

    /// Largest url-encoded body read by POST routes
    #[validate(range(min = 1024, max = 104857600))] // 1KB to 100MB
    pub max_form_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            upload_max_filesize: DEFAULT_UPLOAD_MAX_FILESIZE,
            max_form_size: DEFAULT_MAX_FORM_SIZE,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SecurityConfig {
    /// Role to implied roles, e.g. `ROLE_ADMIN = ["ROLE_USER"]`
    pub role_hierarchy: RoleHierarchy,
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Size limits
    pub limits: LimitsConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Named parameter blocks routes can pull in with `pre_config`
    pub pre_config: BTreeMap<String, PreConfig>,

    /// Route declarations
    pub routes: Vec<RouteDefinition>,
}

impl AppConfig {
    /// Load configuration from `Conf.*` and `AJAX_ROUTES__*` variables
    pub fn load() -> crate::Result<Self> {
        Self::build(config::File::with_name("Conf").required(false))
    }

    /// Load configuration from a given file plus the environment
    pub fn load_from(path: impl AsRef<Path>) -> crate::Result<Self> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build configuration: {}", e)))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to deserialize configuration: {}", e)))?;

        config
            .validate_config()
            .map_err(|e| AppError::Config(format!("Configuration validation failed: {}", e)))?;

        Ok(config)
    }

    /// Parse a TOML document directly
    pub fn from_toml_str(source: &str) -> crate::Result<Self> {
        let config: AppConfig = toml::from_str(source)?;
        config
            .validate_config()
            .map_err(|e| AppError::Config(format!("Configuration validation failed: {}", e)))?;
        Ok(config)
    }

    /// Validate each section
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.logging.validate()?;
        self.limits.validate()?;
        self.security.validate()?;
        Ok(())
    }
}
