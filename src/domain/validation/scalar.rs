//! Typed request parameter: kind, bounds, pattern and value lists

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::parameter::{describe_properties, Parameter, ParameterBase};
use super::type_registry::{TypeRegistry, DEFAULT_DATETIME_FORMAT};
use super::types::{ParamValue, ParameterType, ResolvedValue, ValidationError};
use super::validation_set::ScalarInputs;
use crate::shared::error::{AppError, AppResult};

/// A query/body field declaration
#[derive(Debug, Clone)]
pub struct ScalarParameter {
    base: ParameterBase,
    kind: ParameterType,
    can_be_empty: bool,
    min: Option<i64>,
    max: Option<i64>,
    pattern: Option<(String, Regex)>,
    datetime_format: String,
    default_value: ParamValue,
    explicit_default: bool,
    disabled_value: Option<ParamValue>,
    restricted_value: Option<ParamValue>,
    value: Option<ParamValue>,
}

impl ScalarParameter {
    pub fn new(name: impl Into<String>, kind: ParameterType, required: bool) -> Self {
        Self {
            base: ParameterBase::new(name, required),
            kind,
            can_be_empty: false,
            min: None,
            max: None,
            pattern: None,
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            default_value: TypeRegistry::default_for(kind),
            explicit_default: false,
            disabled_value: None,
            restricted_value: None,
            value: None,
        }
    }

    // --- configuration ---

    pub fn set_type(&mut self, kind: ParameterType) -> &mut Self {
        self.kind = kind;
        if !self.explicit_default {
            self.default_value = self.derived_default();
        }
        self
    }

    pub fn required(&mut self, required: bool) -> &mut Self {
        self.base.required = required;
        self
    }

    /// Value used when an optional parameter is absent
    pub fn default_value(&mut self, default: impl Into<ParamValue>) -> AppResult<&mut Self> {
        let default = default.into();
        self.default_value = self.typed("default value", &default)?.unwrap_or(ParamValue::Null);
        self.explicit_default = true;
        Ok(self)
    }

    /// Value(s) the request may not carry
    pub fn disabled_value(&mut self, disabled: impl Into<ParamValue>) -> AppResult<&mut Self> {
        let disabled = disabled.into();
        self.disabled_value = self.typed("disabled value(s)", &disabled)?;
        Ok(self)
    }

    /// The only value(s) the request may carry. Unless a default was set
    /// explicitly, the first restricted value becomes the default.
    pub fn restricted_by(&mut self, restricted: impl Into<ParamValue>) -> AppResult<&mut Self> {
        let restricted = restricted.into();
        self.restricted_value = self.typed("restricted value(s)", &restricted)?;
        if !self.explicit_default {
            self.default_value = self.derived_default();
        }
        Ok(self)
    }

    /// Upper bound, INT only; ignored for other kinds or non-numeric input
    pub fn max(&mut self, max: impl Into<ParamValue>) -> &mut Self {
        if let Some(bound) = self.bound(max.into()) {
            self.max = Some(bound);
        }
        self
    }

    /// Lower bound, INT only; ignored for other kinds or non-numeric input
    pub fn min(&mut self, min: impl Into<ParamValue>) -> &mut Self {
        if let Some(bound) = self.bound(min.into()) {
            self.min = Some(bound);
        }
        self
    }

    /// Pattern checked against STRING values. Accepts `/body/flags`.
    pub fn regex(&mut self, pattern: &str) -> AppResult<&mut Self> {
        let compiled = compile_pattern(&self.base.name, pattern)?;
        self.pattern = Some((pattern.to_string(), compiled));
        Ok(self)
    }

    /// Date format for DATETIME values, `Y-m-d H:i:s` syntax
    pub fn datetime_format(&mut self, format: &str) -> &mut Self {
        self.datetime_format = format.to_string();
        self
    }

    pub fn can_be_empty(&mut self, empty: bool) -> &mut Self {
        self.can_be_empty = empty;
        self
    }

    // --- accessors ---

    pub fn kind(&self) -> ParameterType {
        self.kind
    }

    pub fn allows_empty(&self) -> bool {
        self.can_be_empty
    }

    pub fn min_bound(&self) -> Option<i64> {
        self.min
    }

    pub fn max_bound(&self) -> Option<i64> {
        self.max
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(|(source, _)| source.as_str())
    }

    pub fn date_format(&self) -> &str {
        &self.datetime_format
    }

    pub fn current_default(&self) -> &ParamValue {
        &self.default_value
    }

    pub fn disabled(&self) -> Option<&ParamValue> {
        self.disabled_value.as_ref()
    }

    pub fn restricted(&self) -> Option<&ParamValue> {
        self.restricted_value.as_ref()
    }

    pub fn value(&self) -> Option<&ParamValue> {
        self.value.as_ref()
    }

    // --- validation ---

    /// Validate against the input bag and keep the resolved value
    pub fn is_valid(&mut self, inputs: &ScalarInputs) -> Result<(), ValidationError> {
        match self.check(inputs) {
            Ok(value) => {
                self.value = Some(value);
                Ok(())
            }
            Err(err) => {
                debug!(parameter = %self.base.name, reason = %err, "Parameter rejected");
                self.value = None;
                Err(err)
            }
        }
    }

    /// Validate without storing anything; returns the resolved value
    pub fn check(&self, inputs: &ScalarInputs) -> Result<ParamValue, ValidationError> {
        let name = &self.base.name;
        let raw = match self.base.lookup(inputs) {
            Some(raw) => raw,
            None if !self.base.required => return Ok(self.default_value.clone()),
            None => {
                return Err(ValidationError::new(format!(
                    "The parameter \"{}\" is required and is not defined in request parameters.",
                    name
                )))
            }
        };

        let resolved = self.resolve_raw(raw);

        if !self.can_be_empty && resolved.is_empty_like() {
            return Err(ValidationError::new(format!(
                "The value for parameter \"{}\" can not be empty.",
                name
            )));
        }

        let empty_allowed = self.can_be_empty && resolved.is_empty_like();
        if !empty_allowed && !TypeRegistry::type_check(&resolved, self.kind, &self.datetime_format) {
            let mut message = format!(
                "The parameter type for parameter \"{}\" with value \"{}\" is not valid, must be a \"{}\"",
                name,
                resolved,
                self.kind.name()
            );
            if self.kind == ParameterType::DateTime {
                message.push_str(&format!(" with format \"{}\".", self.datetime_format));
            } else {
                message.push('.');
            }
            return Err(ValidationError::new(message));
        }

        let value = TypeRegistry::cast(&resolved, self.kind, &self.datetime_format);
        self.check_properties(&value)?;
        Ok(value)
    }

    /// Forget the value of a previous validation
    pub fn reset(&mut self) {
        self.value = None;
    }

    fn resolve_raw(&self, raw: &ParamValue) -> ParamValue {
        match raw {
            ParamValue::Text(s) => {
                let trimmed = s.trim();
                if self.can_be_empty && s.is_empty() {
                    self.default_value.clone()
                } else if trimmed == "null" {
                    ParamValue::Null
                } else {
                    ParamValue::text(trimmed)
                }
            }
            other => other.clone(),
        }
    }

    fn check_properties(&self, value: &ParamValue) -> Result<(), ValidationError> {
        self.check_regex(value)?;
        self.check_disabled(value)?;
        self.check_restricted(value)?;
        self.check_min(value)?;
        self.check_max(value)
    }

    fn check_regex(&self, value: &ParamValue) -> Result<(), ValidationError> {
        let (_, regex) = match (&self.pattern, self.kind) {
            (Some(pattern), ParameterType::String) => pattern,
            _ => return Ok(()),
        };
        if self.can_be_empty && value.is_empty_like() {
            return Ok(());
        }
        let matched = match value {
            ParamValue::Text(s) => regex.is_match(s),
            ParamValue::List(items) => items.iter().all(|item| match item {
                ParamValue::Text(s) => regex.is_match(s),
                _ => false,
            }),
            _ => false,
        };
        if matched {
            Ok(())
        } else {
            Err(ValidationError::new(format!(
                "The value \"{}\" of the parameter \"{}\" does not match to the regular expression.",
                value, self.base.name
            )))
        }
    }

    fn check_disabled(&self, value: &ParamValue) -> Result<(), ValidationError> {
        let disabled = match &self.disabled_value {
            Some(disabled) if value.matches(disabled) => disabled,
            _ => return Ok(()),
        };
        let message = match disabled {
            ParamValue::List(_) => format!(
                "The request parameter value \"{}\" is disabled for parameter \"{}\". Disabled values are {}.",
                value, self.base.name, disabled
            ),
            single => format!(
                "The request parameter value \"{}\" is disabled for parameter \"{}\". Disabled value is \"{}\".",
                value, self.base.name, single
            ),
        };
        Err(ValidationError::new(message))
    }

    fn check_restricted(&self, value: &ParamValue) -> Result<(), ValidationError> {
        let restricted = match &self.restricted_value {
            Some(restricted) if !value.matches(restricted) => restricted,
            _ => return Ok(()),
        };
        let message = match restricted {
            ParamValue::List(_) => format!(
                "The request parameter value \"{}\" is not in the restricted values for \"{}\" parameter. Restricted values are {}.",
                value, self.base.name, restricted
            ),
            single => format!(
                "The request parameter value \"{}\" is not in the restricted value for \"{}\" parameter. Restricted value is \"{}\".",
                value, self.base.name, single
            ),
        };
        Err(ValidationError::new(message))
    }

    fn check_min(&self, value: &ParamValue) -> Result<(), ValidationError> {
        match self.min {
            Some(min) if self.kind == ParameterType::Int && any_int(value, &|n: i64| n < min) => {
                Err(ValidationError::new(format!(
                    "The value for parameter \"{}\" with value {} must be greater than {}.",
                    self.base.name, value, min
                )))
            }
            _ => Ok(()),
        }
    }

    fn check_max(&self, value: &ParamValue) -> Result<(), ValidationError> {
        match self.max {
            Some(max) if self.kind == ParameterType::Int && any_int(value, &|n: i64| n > max) => {
                Err(ValidationError::new(format!(
                    "The value for parameter \"{}\" with value {} must be smaller than {}.",
                    self.base.name, value, max
                )))
            }
            _ => Ok(()),
        }
    }

    /// Type-check a configured value and store it cast. Null and empty
    /// sequences mean "not set".
    fn typed(&self, field: &'static str, value: &ParamValue) -> AppResult<Option<ParamValue>> {
        match value {
            ParamValue::Null => return Ok(None),
            ParamValue::List(items) if items.is_empty() && self.kind != ParameterType::Array => {
                return Ok(None)
            }
            _ => {}
        }
        if !TypeRegistry::type_check(value, self.kind, &self.datetime_format) {
            return Err(AppError::InvalidParameterValue {
                parameter: self.base.name.clone(),
                field,
                expected: self.kind.name().to_string(),
            });
        }
        Ok(Some(TypeRegistry::cast(value, self.kind, &self.datetime_format)))
    }

    fn derived_default(&self) -> ParamValue {
        match &self.restricted_value {
            Some(restricted) if self.kind != ParameterType::Array => restricted.first_or_self(),
            Some(restricted) => restricted.clone(),
            None => TypeRegistry::default_for(self.kind),
        }
    }

    fn bound(&self, bound: ParamValue) -> Option<i64> {
        if self.kind == ParameterType::Int && TypeRegistry::is_numeric(&bound) {
            Some(TypeRegistry::cast_int(&bound))
        } else {
            None
        }
    }
}

impl Parameter for ScalarParameter {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn is_required(&self) -> bool {
        self.base.required
    }

    fn resolved(&self) -> Option<ResolvedValue> {
        self.value.clone().map(ResolvedValue::Scalar)
    }

    fn describe(&self, full: bool) -> String {
        let mut out = format!("{} ({})", self.base.name, self.kind);
        if full {
            out.push(':');
            let or_null = |value: Option<String>| value.unwrap_or_else(|| "null".to_string());
            describe_properties(
                &mut out,
                &[
                    ("required", self.base.required.to_string()),
                    ("empty", self.can_be_empty.to_string()),
                    ("max", or_null(self.max.map(|m| m.to_string()))),
                    ("min", or_null(self.min.map(|m| m.to_string()))),
                    ("regex", or_null(self.pattern().map(str::to_string))),
                    ("datetimeFormat", self.datetime_format.clone()),
                    ("defaultValue", self.default_value.to_string()),
                    ("disabledValue", or_null(self.disabled_value.as_ref().map(ToString::to_string))),
                    ("restrictedValue", or_null(self.restricted_value.as_ref().map(ToString::to_string))),
                ],
            );
        }
        out
    }
}

fn any_int(value: &ParamValue, predicate: &dyn Fn(i64) -> bool) -> bool {
    match value {
        ParamValue::Int(n) => predicate(*n),
        ParamValue::List(items) => items.iter().any(|item| any_int(item, predicate)),
        _ => false,
    }
}

/// Compile a bare or `/delimited/flags` pattern
fn compile_pattern(parameter: &str, pattern: &str) -> AppResult<Regex> {
    let (body, flags) = split_delimited(pattern);
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'u' => {
                builder.unicode(true);
            }
            _ => {}
        }
    }
    builder.build().map_err(|e| AppError::InvalidRegex {
        parameter: parameter.to_string(),
        reason: e.to_string(),
    })
}

fn split_delimited(pattern: &str) -> (&str, &str) {
    let delimiter = match pattern.chars().next() {
        Some(c) if matches!(c, '/' | '#' | '~' | '!' | '@' | '%' | '|') => c,
        _ => return (pattern, ""),
    };
    match pattern.rfind(delimiter) {
        Some(end) if end > 0 => {
            let flags = &pattern[end + 1..];
            if flags.chars().all(|c| c.is_ascii_alphabetic()) {
                (&pattern[delimiter.len_utf8()..end], flags)
            } else {
                (pattern, "")
            }
        }
        _ => (pattern, ""),
    }
}
