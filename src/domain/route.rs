//! Route declarations and the registry that builds validation sets from them

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::validation::{
    Declarations, FileParameterOptions, HttpMethod, OneOrMany, ParameterOptions, ValidationSet,
    DEFAULT_UPLOAD_MAX_FILESIZE,
};
use crate::shared::error::{AppError, AppResult};

fn default_true() -> bool {
    true
}

/// Reusable block of parameter declarations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreConfig {
    pub parameters: Declarations<ParameterOptions>,
    pub files: Declarations<FileParameterOptions>,
}

/// A route and the options describing what its requests must carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub controller: Option<String>,
    /// Only exposed routes are AJAX routes
    #[serde(default = "default_true")]
    pub expose: bool,
    #[serde(default)]
    pub roles: Option<OneOrMany<String>>,
    /// Validate before the handler runs
    #[serde(default = "default_true")]
    pub auto_valid: bool,
    #[serde(default)]
    pub pre_config: Option<String>,
    #[serde(default)]
    pub parameters: Declarations<ParameterOptions>,
    #[serde(default)]
    pub files: Declarations<FileParameterOptions>,
}

impl RouteDefinition {
    pub fn new(name: impl Into<String>, path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            method,
            controller: None,
            expose: true,
            roles: None,
            auto_valid: true,
            pre_config: None,
            parameters: Declarations::default(),
            files: Declarations::default(),
        }
    }

    /// Required roles; empty when the route is open to everyone
    pub fn required_roles(&self) -> Vec<String> {
        self.roles
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
    }
}

/// Shape of a standalone route declaration file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RouteFile {
    pre_config: BTreeMap<String, PreConfig>,
    routes: Vec<RouteDefinition>,
}

/// Named routes plus the pre-configurations they may reference
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routes: Vec<RouteDefinition>,
    index: HashMap<String, usize>,
    pre_config: BTreeMap<String, PreConfig>,
    upload_ceiling: u64,
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl RouteRegistry {
    pub fn new(pre_config: BTreeMap<String, PreConfig>) -> Self {
        Self {
            routes: Vec::new(),
            index: HashMap::new(),
            pre_config,
            upload_ceiling: DEFAULT_UPLOAD_MAX_FILESIZE,
        }
    }

    pub fn with_upload_ceiling(mut self, ceiling: u64) -> Self {
        self.upload_ceiling = ceiling;
        self
    }

    /// Registry holding `routes`, failing on a repeated route name
    pub fn from_routes(
        routes: Vec<RouteDefinition>,
        pre_config: BTreeMap<String, PreConfig>,
    ) -> AppResult<Self> {
        let mut registry = Self::new(pre_config);
        for route in routes {
            registry.register(route)?;
        }
        Ok(registry)
    }

    /// Parse a TOML document with `[pre_config.*]` tables and `[[routes]]`
    pub fn from_toml_str(source: &str) -> AppResult<Self> {
        let file: RouteFile = toml::from_str(source)?;
        Self::from_routes(file.routes, file.pre_config)
    }

    pub fn register(&mut self, route: RouteDefinition) -> AppResult<()> {
        if self.index.contains_key(&route.name) {
            return Err(AppError::Config(format!(
                "A route with the name \"{}\" already exists",
                route.name
            )));
        }
        self.index.insert(route.name.clone(), self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    /// An exposed route by name
    pub fn find(&self, name: &str) -> AppResult<&RouteDefinition> {
        self.index
            .get(name)
            .map(|&i| &self.routes[i])
            .filter(|route| route.expose)
            .ok_or_else(|| AppError::RouteNotFound {
                route: name.to_string(),
            })
    }

    /// Exposed routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter().filter(|route| route.expose)
    }

    pub fn pre_config(&self, name: &str) -> AppResult<&PreConfig> {
        self.pre_config
            .get(name)
            .ok_or_else(|| AppError::UnknownPreConfig {
                name: name.to_string(),
            })
    }

    /// Fresh, unsealed validation set for `route`: its own parameters and
    /// files first, then those of its pre-configuration.
    pub fn build_validation_set(&self, route: &RouteDefinition) -> AppResult<ValidationSet> {
        let mut set = ValidationSet::new(route.method).with_upload_ceiling(self.upload_ceiling);
        set.add_parameters(&route.parameters)?;
        set.add_file_parameters(&route.files)?;

        if let Some(name) = &route.pre_config {
            let pre_config = self.pre_config(name)?;
            set.add_parameters(&pre_config.parameters)?;
            set.add_file_parameters(&pre_config.files)?;
        }
        Ok(set)
    }
}
