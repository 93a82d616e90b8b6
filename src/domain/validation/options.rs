//! Declarative option blocks for parameters, as found in route declarations
//!
//! Parameter lists may be written as a sequence of names and single-entry
//! tables, or as a table keyed by parameter name. Both normalize into an
//! ordered list of [`ParameterSpec`] values before reaching a validation set.

use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::file::FileParameter;
use super::scalar::ScalarParameter;
use super::type_registry::TypeRegistry;
use super::types::{ParamValue, ParameterType};
use crate::shared::error::{AppError, AppResult};

/// Parameter kind as written in a declaration: legacy index or name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindSpec {
    Index(i64),
    Name(String),
}

impl KindSpec {
    pub fn resolve(&self) -> AppResult<ParameterType> {
        match self {
            KindSpec::Index(index) => ParameterType::from_index(*index),
            KindSpec::Name(name) => name.parse(),
        }
    }
}

impl From<ParameterType> for KindSpec {
    fn from(kind: ParameterType) -> Self {
        KindSpec::Name(kind.name().to_string())
    }
}

/// A single value or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// Options of a scalar parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterOptions {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<KindSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(rename = "datetimeFormat", alias = "datetimeformat", skip_serializing_if = "Option::is_none")]
    pub datetime_format: Option<String>,
    #[serde(rename = "defaultValue", alias = "defaultvalue", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(rename = "disabledValue", alias = "disabledvalue", skip_serializing_if = "Option::is_none")]
    pub disabled_value: Option<Value>,
    #[serde(rename = "restrictedValue", alias = "restrictedvalue", skip_serializing_if = "Option::is_none")]
    pub restricted_value: Option<Value>,
}

impl ParameterOptions {
    pub fn of_kind(kind: ParameterType) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Fill every unset option from `globals`
    pub fn merged_over(&self, globals: &ParameterOptions) -> ParameterOptions {
        ParameterOptions {
            kind: self.kind.clone().or_else(|| globals.kind.clone()),
            require: self.require.or(globals.require),
            empty: self.empty.or(globals.empty),
            min: self.min.clone().or_else(|| globals.min.clone()),
            max: self.max.clone().or_else(|| globals.max.clone()),
            regex: self.regex.clone().or_else(|| globals.regex.clone()),
            datetime_format: self
                .datetime_format
                .clone()
                .or_else(|| globals.datetime_format.clone()),
            default_value: self
                .default_value
                .clone()
                .or_else(|| globals.default_value.clone()),
            disabled_value: self
                .disabled_value
                .clone()
                .or_else(|| globals.disabled_value.clone()),
            restricted_value: self
                .restricted_value
                .clone()
                .or_else(|| globals.restricted_value.clone()),
        }
    }

    /// Kind of the parameter, STRING when unset
    pub fn resolved_kind(&self) -> AppResult<ParameterType> {
        self.kind
            .as_ref()
            .map(KindSpec::resolve)
            .unwrap_or(Ok(ParameterType::String))
    }

    /// Configure `parameter`. The date format is applied before any value
    /// so DATETIME defaults are checked against it.
    pub fn apply_to(&self, parameter: &mut ScalarParameter) -> AppResult<()> {
        let kind = self.resolved_kind()?;
        parameter.set_type(kind);
        if let Some(format) = &self.datetime_format {
            parameter.datetime_format(format);
        }
        parameter
            .required(self.require.unwrap_or(true))
            .can_be_empty(self.empty.unwrap_or(false));

        if let Some(default) = &self.default_value {
            let default = match ParamValue::from(default.clone()) {
                ParamValue::List(items) if kind != ParameterType::Array => items
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| TypeRegistry::default_for(kind)),
                other => other,
            };
            parameter.default_value(default)?;
        }
        if let Some(disabled) = &self.disabled_value {
            parameter.disabled_value(ParamValue::from(disabled.clone()))?;
        }
        if let Some(restricted) = &self.restricted_value {
            parameter.restricted_by(ParamValue::from(restricted.clone()))?;
        }
        if let Some(min) = &self.min {
            parameter.min(ParamValue::from(min.clone()));
        }
        if let Some(max) = &self.max {
            parameter.max(ParamValue::from(max.clone()));
        }
        if let Some(regex) = &self.regex {
            parameter.regex(regex)?;
        }
        Ok(())
    }
}

/// Options of a file parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileParameterOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<bool>,
    #[serde(rename = "mimeType", alias = "mimetype", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<OneOrMany<String>>,
    #[serde(rename = "maxSize", alias = "maxsize", skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
}

impl FileParameterOptions {
    pub fn merged_over(&self, globals: &FileParameterOptions) -> FileParameterOptions {
        FileParameterOptions {
            require: self.require.or(globals.require),
            mime_type: self.mime_type.clone().or_else(|| globals.mime_type.clone()),
            max_size: self.max_size.or(globals.max_size),
        }
    }

    pub fn apply_to(&self, parameter: &mut FileParameter) {
        parameter.required(self.require.unwrap_or(true));
        if let Some(types) = &self.mime_type {
            parameter.mime_type(types.clone().into_vec());
        }
        if let Some(size) = self.max_size {
            parameter.max_size(size);
        }
    }
}

/// A parameter named on its own or together with its options
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterSpec<O> {
    Named(String),
    Configured(String, O),
}

impl<O: Default + Clone> ParameterSpec<O> {
    pub fn name(&self) -> &str {
        match self {
            ParameterSpec::Named(name) | ParameterSpec::Configured(name, _) => name,
        }
    }

    /// Normalized `(name, options)` pair
    pub fn normalize(&self) -> (String, O) {
        match self {
            ParameterSpec::Named(name) => (name.clone(), O::default()),
            ParameterSpec::Configured(name, options) => (name.clone(), options.clone()),
        }
    }
}

/// Ordered parameter declarations of a route or pre-configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Declarations<O>(pub Vec<ParameterSpec<O>>);

impl<O> Default for Declarations<O> {
    fn default() -> Self {
        Declarations(Vec::new())
    }
}

impl<O> Declarations<O> {
    pub fn iter(&self) -> std::slice::Iter<'_, ParameterSpec<O>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<O> FromIterator<ParameterSpec<O>> for Declarations<O> {
    fn from_iter<I: IntoIterator<Item = ParameterSpec<O>>>(iter: I) -> Self {
        Declarations(iter.into_iter().collect())
    }
}

impl<O: DeserializeOwned> Declarations<O> {
    /// Accepts `null`, a table keyed by name, or a list whose entries are
    /// names or `{ name = { ..options } }` tables.
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::String(name) => Ok(Declarations(vec![ParameterSpec::Named(name)])),
            Value::Object(map) => map
                .into_iter()
                .map(|(key, options)| Self::entry(key, options))
                .collect::<Result<Vec<_>, _>>()
                .map(|specs| Declarations(specs.into_iter().flatten().collect())),
            Value::Array(items) => {
                let mut specs = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(name) => specs.push(ParameterSpec::Named(name)),
                        Value::Object(map) => {
                            for (key, options) in map {
                                specs.extend(Self::entry(key, options)?);
                            }
                        }
                        other => return Err(format!("invalid parameter declaration: {}", other)),
                    }
                }
                Ok(Declarations(specs))
            }
            other => Err(format!("invalid parameter declarations: {}", other)),
        }
    }

    fn entry(key: String, options: Value) -> Result<Option<ParameterSpec<O>>, String> {
        match options {
            Value::Object(_) => match serde_json::from_value(options) {
                Ok(options) => Ok(Some(ParameterSpec::Configured(key, options))),
                Err(e) => Err(format!("parameter \"{}\": {}", key, e)),
            },
            Value::String(name) => Ok(Some(ParameterSpec::Named(name))),
            Value::Bool(false) => Ok(None),
            _ => Ok(Some(ParameterSpec::Named(key))),
        }
    }
}

impl<'de, O: DeserializeOwned> Deserialize<'de> for Declarations<O> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Declarations::from_value(value).map_err(D::Error::custom)
    }
}

impl<O: Serialize> Serialize for Declarations<O> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for spec in &self.0 {
            match spec {
                ParameterSpec::Named(name) => map.serialize_entry(name, &Map::new())?,
                ParameterSpec::Configured(name, options) => map.serialize_entry(name, options)?,
            }
        }
        map.end()
    }
}

/// Set one global option by key, the way a route declaration spells it
pub(crate) fn set_option<O>(options: &mut O, key: &str, value: Value) -> AppResult<()>
where
    O: Serialize + DeserializeOwned,
{
    let mut raw = match serde_json::to_value(&*options)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    raw.insert(key.to_string(), value);
    *options = serde_json::from_value(Value::Object(raw))
        .map_err(|e| AppError::Config(format!("global option \"{}\": {}", key, e)))?;
    Ok(())
}
