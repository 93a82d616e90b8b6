use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::shared::error::{AppError, AppResult};

/// Format used when a date/time value is rendered back to text
pub const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parameter types
///
/// The discriminants are the historical type indexes still accepted in
/// route declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    Int = 0,
    String = 1,
    Bool = 2,
    Array = 3,
    Float = 4,
    DateTime = 5,
}

impl ParameterType {
    pub const ALL: [ParameterType; 6] = [
        ParameterType::Int,
        ParameterType::String,
        ParameterType::Bool,
        ParameterType::Array,
        ParameterType::Float,
        ParameterType::DateTime,
    ];

    /// Resolve a type index (0 to 5)
    pub fn from_index(index: i64) -> AppResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.index() == index)
            .ok_or_else(|| AppError::UnknownParameterType(index.to_string()))
    }

    pub fn index(self) -> i64 {
        self as i64
    }

    /// Display name used in error messages
    pub fn name(self) -> &'static str {
        match self {
            ParameterType::Int => "integer",
            ParameterType::String => "string",
            ParameterType::Bool => "boolean",
            ParameterType::Array => "array",
            ParameterType::Float => "float",
            ParameterType::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParameterType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Ok(ParameterType::Int),
            "string" => Ok(ParameterType::String),
            "bool" | "boolean" => Ok(ParameterType::Bool),
            "array" => Ok(ParameterType::Array),
            "float" => Ok(ParameterType::Float),
            "datetime" => Ok(ParameterType::DateTime),
            other => match other.parse::<i64>() {
                Ok(index) => Self::from_index(index),
                Err(_) => Err(AppError::UnknownParameterType(s.to_string())),
            },
        }
    }
}

impl Serialize for ParameterType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A raw or resolved parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
    DateTime(NaiveDateTime),
}

impl ParamValue {
    pub fn text(s: impl Into<String>) -> Self {
        ParamValue::Text(s.into())
    }

    pub fn list<T: Into<ParamValue>>(items: impl IntoIterator<Item = T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Null or the empty string
    pub fn is_empty_like(&self) -> bool {
        match self {
            ParamValue::Null => true,
            ParamValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Membership for set-or-scalar constraints: a list is searched, a
    /// scalar is compared for equality.
    pub fn matches(&self, constraint: &ParamValue) -> bool {
        match constraint {
            ParamValue::List(items) => items.contains(self),
            single => self == single,
        }
    }

    /// The first element of a list, or the value itself
    pub fn first_or_self(&self) -> ParamValue {
        match self {
            ParamValue::List(items) => items.first().cloned().unwrap_or(ParamValue::Null),
            other => other.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(items) => {
                let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&joined.join(","))
            }
            ParamValue::DateTime(dt) => write!(f, "{}", dt.format(DISPLAY_DATETIME_FORMAT)),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamValue::Null => serializer.serialize_unit(),
            ParamValue::Bool(b) => serializer.serialize_bool(*b),
            ParamValue::Int(i) => serializer.serialize_i64(*i),
            ParamValue::Float(x) => serializer.serialize_f64(*x),
            ParamValue::Text(s) => serializer.serialize_str(s),
            ParamValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ParamValue::DateTime(dt) => {
                serializer.collect_str(&dt.format(DISPLAY_DATETIME_FORMAT))
            }
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ParamValue::Int(i),
                None => ParamValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => ParamValue::Text(s),
            Value::Array(items) => ParamValue::List(items.into_iter().map(ParamValue::from).collect()),
            Value::Object(map) => ParamValue::List(map.into_iter().map(|(_, v)| ParamValue::from(v)).collect()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<NaiveDateTime> for ParamValue {
    fn from(dt: NaiveDateTime) -> Self {
        ParamValue::DateTime(dt)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::list(items)
    }
}

/// Uploaded file descriptor handed over by the HTTP boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Client-side file name
    pub original_name: String,

    /// MIME type declared by the client
    pub mime_type: String,

    /// Size in bytes
    pub size: u64,

    /// Where the content is stored
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            size,
            path: PathBuf::new(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

/// Per-request validation failure, rendered as `{"message": ...}`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn access_denied() -> Self {
        Self::new("Access denied.")
    }
}

/// Value held by a parameter after a successful validation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Scalar(ParamValue),
    File(Option<UploadedFile>),
}

impl ResolvedValue {
    pub fn as_scalar(&self) -> Option<&ParamValue> {
        match self {
            ResolvedValue::Scalar(value) => Some(value),
            ResolvedValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            ResolvedValue::File(file) => file.as_ref(),
            ResolvedValue::Scalar(_) => None,
        }
    }
}

/// Resolved values keyed by parameter name, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValues {
    entries: Vec<(String, Option<ResolvedValue>)>,
}

impl ResolvedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<ResolvedValue>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// `None` when the name is unknown or the parameter has not been resolved
    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ResolvedValue>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for ResolvedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
