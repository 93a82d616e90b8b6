//! Per-request validation of a route: protocol, parameters, then roles

use std::sync::Arc;

use crate::domain::route::RouteDefinition;
use crate::domain::security::RoleChecker;
use crate::domain::validation::{
    Declarations, FileParameter, FileParameterOptions, Parameter, ParameterOptions,
    RequestShape, ResolvedValue, ResolvedValues, ScalarParameter, ValidationError, ValidationSet,
};
use crate::shared::error::AppResult;
use crate::shared::logging::LoggingUtils;

/// Owns a fresh validation set for one request to one route.
///
/// Extra parameters may be declared until `validate` runs.
pub struct RequestGuard {
    route: RouteDefinition,
    set: ValidationSet,
    checker: Arc<RoleChecker>,
}

impl RequestGuard {
    pub fn new(route: RouteDefinition, set: ValidationSet, checker: Arc<RoleChecker>) -> Self {
        Self { route, set, checker }
    }

    pub fn route(&self) -> &RouteDefinition {
        &self.route
    }

    pub fn route_roles(&self) -> Vec<String> {
        self.route.required_roles()
    }

    pub fn validation_set(&self) -> &ValidationSet {
        &self.set
    }

    pub fn add_parameter(
        &mut self,
        name: &str,
        options: &ParameterOptions,
    ) -> AppResult<&mut ScalarParameter> {
        self.set.add_scalar_parameter(name, options)
    }

    pub fn add_parameters(&mut self, declarations: &Declarations<ParameterOptions>) -> AppResult<()> {
        self.set.add_parameters(declarations)
    }

    pub fn add_file_parameter(
        &mut self,
        name: &str,
        options: &FileParameterOptions,
    ) -> AppResult<&mut FileParameter> {
        self.set.add_file_parameter(name, options)
    }

    pub fn add_file_parameters(
        &mut self,
        declarations: &Declarations<FileParameterOptions>,
    ) -> AppResult<()> {
        self.set.add_file_parameters(declarations)
    }

    /// Validate the request. `user_roles` is `None` for anonymous callers.
    pub fn validate(
        &mut self,
        shape: &RequestShape,
        user_roles: Option<&[String]>,
    ) -> Result<(), ValidationError> {
        if let Err(err) = self.set.validate(shape) {
            LoggingUtils::log_rejected(&self.route.name, &shape.method, &err);
            return Err(err);
        }

        if let Err(err) = self.checker.check_access(&self.route_roles(), user_roles) {
            LoggingUtils::log_access_denied(&self.route.name, user_roles);
            self.set.record_error(err.clone());
            return Err(err);
        }

        LoggingUtils::log_validated(
            &self.route.name,
            &shape.method,
            self.set.scalar_parameters().len() + self.set.file_parameters().len(),
        );
        Ok(())
    }

    pub fn is_valid(&mut self, shape: &RequestShape, user_roles: Option<&[String]>) -> bool {
        self.validate(shape, user_roles).is_ok()
    }

    pub fn last_error(&self) -> Option<&ValidationError> {
        self.set.last_error()
    }

    /// Every declared parameter with its resolved value
    pub fn data(&self) -> ResolvedValues {
        self.set.resolved_values()
    }

    pub fn parameter(&self, name: &str) -> Option<&dyn Parameter> {
        self.set.find(name)
    }

    /// Resolved value of one parameter; `None` if unknown or unresolved
    pub fn parameter_value(&self, name: &str) -> Option<ResolvedValue> {
        self.set.find(name).and_then(|p| p.resolved())
    }
}
