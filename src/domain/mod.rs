//! Domain layer - validation engine, route declarations and role rules
//!
//! Nothing in here knows about HTTP: inputs arrive as plain key/value bags
//! and results leave as resolved values or `{message}` errors.

pub mod route;
pub mod security;
pub mod validation;

pub use route::{PreConfig, RouteDefinition, RouteRegistry};
pub use security::{RoleChecker, RoleHierarchy};
pub use validation::{
    FileParameter, HttpMethod, ParamValue, Parameter, ParameterType, RequestShape, ResolvedValue,
    ResolvedValues, ScalarParameter, UploadedFile, ValidationError, ValidationSet,
};
