//! AJAX route validator - declarative request-parameter validation
//!
//! Routes declare the parameters and files their requests must carry. Each
//! request is checked against a fresh validation set: protocol first, then
//! every parameter in declaration order, then the caller's roles. Values are
//! cast to their declared types and the first failure is reported as a
//! `{"message": ...}` body.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::{RequestGuard, RouteCatalog};
pub use config::AppConfig;
pub use domain::{
    ParamValue, ParameterType, RequestShape, ResolvedValues, RouteDefinition, RouteRegistry,
    ValidationError, ValidationSet,
};
pub use infrastructure::{AjaxRequest, AjaxRoutes};
pub use shared::error::{AppError, AppResult};

/// Application result type
pub type Result<T> = std::result::Result<T, shared::error::AppError>;

#[cfg(test)]
mod tests;
