//! Per-route collection of parameter declarations and the request check

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::file::{FileParameter, DEFAULT_UPLOAD_MAX_FILESIZE};
use super::options::{set_option, Declarations, FileParameterOptions, ParameterOptions};
use super::parameter::Parameter;
use super::scalar::ScalarParameter;
use super::types::{ParamValue, ResolvedValue, ResolvedValues, UploadedFile, ValidationError};
use crate::shared::error::{AppError, AppResult};

/// Scalar request inputs keyed by field name
pub type ScalarInputs = HashMap<String, ParamValue>;

/// Uploaded files keyed by field name
pub type FileInputs = HashMap<String, UploadedFile>;

/// Request method a validation set accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            _ => Err(AppError::InvalidMethod { method: s.to_string() }),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// What the boundary layer knows about an incoming request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestShape {
    pub method: String,
    pub is_ajax: bool,
    pub scalar: ScalarInputs,
    pub files: FileInputs,
}

impl RequestShape {
    pub fn new(method: impl Into<String>, is_ajax: bool) -> Self {
        Self {
            method: method.into(),
            is_ajax,
            ..Self::default()
        }
    }

    pub fn with_scalar(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.scalar.insert(name.into(), value.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }
}

/// Method requirement plus ordered scalar and file parameters.
///
/// Configuration calls are accepted until the first `validate`, after
/// which the set is sealed and only validation and reads remain.
#[derive(Debug, Clone)]
pub struct ValidationSet {
    method: HttpMethod,
    scalar_parameters: Vec<ScalarParameter>,
    file_parameters: Vec<FileParameter>,
    global_scalar: ParameterOptions,
    global_file: FileParameterOptions,
    upload_ceiling: u64,
    last_error: Option<ValidationError>,
    sealed: bool,
}

impl Default for ValidationSet {
    fn default() -> Self {
        Self::new(HttpMethod::Get)
    }
}

impl ValidationSet {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            scalar_parameters: Vec::new(),
            file_parameters: Vec::new(),
            global_scalar: ParameterOptions::default(),
            global_file: FileParameterOptions::default(),
            upload_ceiling: DEFAULT_UPLOAD_MAX_FILESIZE,
            last_error: None,
            sealed: false,
        }
    }

    /// Ceiling for file `maxSize` limits of parameters added afterwards
    pub fn with_upload_ceiling(mut self, ceiling: u64) -> Self {
        self.upload_ceiling = ceiling;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn set_method(&mut self, method: HttpMethod) -> AppResult<()> {
        self.ensure_open()?;
        self.method = method;
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Stop accepting configuration
    pub fn seal(&mut self) {
        if !self.sealed {
            debug!(
                method = %self.method,
                parameters = self.scalar_parameters.len(),
                files = self.file_parameters.len(),
                "Validation set sealed"
            );
            self.sealed = true;
        }
    }

    // --- global defaults ---

    pub fn set_global_parameter_options(&mut self, options: ParameterOptions) -> AppResult<()> {
        self.ensure_open()?;
        self.global_scalar = options;
        Ok(())
    }

    pub fn set_global_file_options(&mut self, options: FileParameterOptions) -> AppResult<()> {
        self.ensure_open()?;
        self.global_file = options;
        Ok(())
    }

    /// Set a single global scalar option, e.g. `("require", false)`
    pub fn add_global_parameter_option(&mut self, key: &str, value: Value) -> AppResult<()> {
        self.ensure_open()?;
        set_option(&mut self.global_scalar, key, value)
    }

    /// Set a single global file option, e.g. `("maxSize", 1000)`
    pub fn add_global_file_option(&mut self, key: &str, value: Value) -> AppResult<()> {
        self.ensure_open()?;
        set_option(&mut self.global_file, key, value)
    }

    pub fn global_parameter_options(&self) -> &ParameterOptions {
        &self.global_scalar
    }

    pub fn global_file_options(&self) -> &FileParameterOptions {
        &self.global_file
    }

    // --- declarations ---

    /// Declare a scalar parameter; global options fill whatever `options` leaves unset
    pub fn add_scalar_parameter(
        &mut self,
        name: &str,
        options: &ParameterOptions,
    ) -> AppResult<&mut ScalarParameter> {
        self.ensure_open()?;
        self.ensure_unique(name)?;

        let options = options.merged_over(&self.global_scalar);
        let mut parameter = ScalarParameter::new(name, options.resolved_kind()?, true);
        options.apply_to(&mut parameter)?;

        self.scalar_parameters.push(parameter);
        let index = self.scalar_parameters.len() - 1;
        Ok(&mut self.scalar_parameters[index])
    }

    /// Declare a file parameter; global options fill whatever `options` leaves unset
    pub fn add_file_parameter(
        &mut self,
        name: &str,
        options: &FileParameterOptions,
    ) -> AppResult<&mut FileParameter> {
        self.ensure_open()?;
        self.ensure_unique(name)?;

        let options = options.merged_over(&self.global_file);
        let mut parameter = FileParameter::new(name, true).with_upload_ceiling(self.upload_ceiling);
        options.apply_to(&mut parameter);

        self.file_parameters.push(parameter);
        let index = self.file_parameters.len() - 1;
        Ok(&mut self.file_parameters[index])
    }

    pub fn add_parameters(&mut self, declarations: &Declarations<ParameterOptions>) -> AppResult<()> {
        for spec in declarations.iter() {
            let (name, options) = spec.normalize();
            self.add_scalar_parameter(&name, &options)?;
        }
        Ok(())
    }

    pub fn add_file_parameters(
        &mut self,
        declarations: &Declarations<FileParameterOptions>,
    ) -> AppResult<()> {
        for spec in declarations.iter() {
            let (name, options) = spec.normalize();
            self.add_file_parameter(&name, &options)?;
        }
        Ok(())
    }

    // --- lookups ---

    /// Any parameter by name, scalar ones first
    pub fn find(&self, name: &str) -> Option<&dyn Parameter> {
        self.scalar(name)
            .map(|p| p as &dyn Parameter)
            .or_else(|| self.file(name).map(|p| p as &dyn Parameter))
    }

    pub fn scalar(&self, name: &str) -> Option<&ScalarParameter> {
        self.scalar_parameters.iter().find(|p| p.name() == name)
    }

    pub fn file(&self, name: &str) -> Option<&FileParameter> {
        self.file_parameters.iter().find(|p| p.name() == name)
    }

    pub fn scalar_parameters(&self) -> &[ScalarParameter] {
        &self.scalar_parameters
    }

    pub fn file_parameters(&self) -> &[FileParameter] {
        &self.file_parameters
    }

    /// First file parameter a request must carry
    pub fn required_file(&self) -> Option<&FileParameter> {
        self.file_parameters.iter().find(|p| p.is_required())
    }

    pub fn last_error(&self) -> Option<&ValidationError> {
        self.last_error.as_ref()
    }

    /// Record a failure produced outside the parameter checks
    pub fn record_error(&mut self, error: ValidationError) {
        self.last_error = Some(error);
    }

    // --- validation ---

    /// Protocol, then scalar parameters, then files. Seals the set.
    pub fn validate(&mut self, shape: &RequestShape) -> Result<(), ValidationError> {
        self.seal();
        self.last_error = None;
        self.scalar_parameters.iter_mut().for_each(ScalarParameter::reset);
        self.file_parameters.iter_mut().for_each(FileParameter::reset);

        self.validate_protocol(shape)?;
        self.validate_parameters(shape)
    }

    /// The request must be AJAX-like and use the configured method
    pub fn validate_protocol(&mut self, shape: &RequestShape) -> Result<(), ValidationError> {
        let result = self.check_protocol(shape);
        self.remember(result)
    }

    /// Scalar parameters in declaration order, then files; the first failure wins
    pub fn validate_parameters(&mut self, shape: &RequestShape) -> Result<(), ValidationError> {
        let result = self
            .scalar_parameters
            .iter_mut()
            .try_for_each(|p| p.is_valid(&shape.scalar))
            .and_then(|_| {
                self.file_parameters
                    .iter_mut()
                    .try_for_each(|p| p.is_valid(&shape.files))
            });
        self.remember(result)
    }

    /// Validate without touching the set; a sealed set can be shared this way
    pub fn evaluate(&self, shape: &RequestShape) -> Result<ResolvedValues, ValidationError> {
        self.check_protocol(shape)?;
        let mut values = ResolvedValues::new();
        for parameter in &self.scalar_parameters {
            let value = parameter.check(&shape.scalar)?;
            values.insert(parameter.name(), Some(ResolvedValue::Scalar(value)));
        }
        for parameter in &self.file_parameters {
            let file = parameter.check(&shape.files)?;
            values.insert(parameter.name(), Some(ResolvedValue::File(file)));
        }
        Ok(values)
    }

    /// Every declared parameter with the value of the last validation
    pub fn resolved_values(&self) -> ResolvedValues {
        let mut values = ResolvedValues::new();
        for parameter in &self.scalar_parameters {
            values.insert(parameter.name(), parameter.resolved());
        }
        for parameter in &self.file_parameters {
            values.insert(parameter.name(), parameter.resolved());
        }
        values
    }

    fn check_protocol(&self, shape: &RequestShape) -> Result<(), ValidationError> {
        if !shape.is_ajax {
            return Err(ValidationError::new("The request is not a Xml Http request."));
        }
        if !shape.method.eq_ignore_ascii_case(self.method.as_str()) {
            return Err(ValidationError::new(format!(
                "Bad request method, must be '{}'.",
                self.method
            )));
        }
        Ok(())
    }

    fn remember(&mut self, result: Result<(), ValidationError>) -> Result<(), ValidationError> {
        if let Err(err) = &result {
            self.last_error = Some(err.clone());
        }
        result
    }

    fn ensure_open(&self) -> AppResult<()> {
        if self.sealed {
            Err(AppError::Sealed)
        } else {
            Ok(())
        }
    }

    fn ensure_unique(&self, name: &str) -> AppResult<()> {
        if self.find(name).is_some() {
            return Err(AppError::DuplicateParameter { name: name.to_string() });
        }
        Ok(())
    }
}
