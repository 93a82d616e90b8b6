//! Request parameter validation engine
//!
//! A [`ValidationSet`] holds the method requirement and the ordered scalar
//! and file parameters of a route. Each request is checked protocol first,
//! then parameter by parameter, stopping at the first failure.

pub mod file;
pub mod options;
pub mod parameter;
pub mod scalar;
pub mod type_registry;
pub mod types;
pub mod validation_set;

pub use file::{FileParameter, DEFAULT_UPLOAD_MAX_FILESIZE};
pub use options::{
    Declarations, FileParameterOptions, KindSpec, OneOrMany, ParameterOptions, ParameterSpec,
};
pub use parameter::Parameter;
pub use scalar::ScalarParameter;
pub use type_registry::{TypeRegistry, DEFAULT_DATETIME_FORMAT};
pub use types::{
    ParamValue, ParameterType, ResolvedValue, ResolvedValues, UploadedFile, ValidationError,
};
pub use validation_set::{FileInputs, HttpMethod, RequestShape, ScalarInputs, ValidationSet};
