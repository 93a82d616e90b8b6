//! Type classification, coercion and default values for parameter kinds

use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::types::{ParamValue, ParameterType};

/// Date/time format applied when a parameter declares none
pub const DEFAULT_DATETIME_FORMAT: &str = "Y-m-d H:i:s";

const FALSE_LIKE: [&str; 5] = ["false", "no", "n", "0", "off"];
const TRUE_LIKE: [&str; 5] = ["true", "yes", "y", "1", "on"];

fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").expect("numeric pattern is valid")
    })
}

fn float_shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("float pattern is valid"))
}

fn leading_int_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[+-]?\d+").expect("integer prefix pattern is valid"))
}

/// Stateless rules for the six parameter kinds
pub struct TypeRegistry;

impl TypeRegistry {
    /// True iff `index` names one of the six kinds
    pub fn is_valid_kind(index: i64) -> bool {
        ParameterType::from_index(index).is_ok()
    }

    /// Check `value` against `kind`. Sequences are checked element by
    /// element for the scalar kinds.
    pub fn type_check(value: &ParamValue, kind: ParameterType, datetime_format: &str) -> bool {
        match kind {
            ParameterType::Int => Self::each(value, Self::is_numeric),
            ParameterType::String => Self::each(value, |v| matches!(v, ParamValue::Text(_))),
            ParameterType::Bool => Self::each(value, |v| Self::bool_value(v).is_some()),
            ParameterType::Float => Self::each(value, Self::is_float_shaped),
            ParameterType::Array => Self::is_array(value),
            ParameterType::DateTime => match value {
                ParamValue::DateTime(_) => true,
                ParamValue::Text(s) => Self::parse_datetime(s, datetime_format).is_some(),
                _ => false,
            },
        }
    }

    /// Forced cast, never fails.
    ///
    /// Only meaningful after `type_check` succeeded: bad input silently
    /// becomes the zero value of the kind.
    pub fn cast(value: &ParamValue, kind: ParameterType, datetime_format: &str) -> ParamValue {
        match kind {
            ParameterType::Int => Self::map_each(value, |v| ParamValue::Int(Self::cast_int(v))),
            ParameterType::String => value.clone(),
            ParameterType::Bool => {
                Self::map_each(value, |v| ParamValue::Bool(Self::bool_value(v).unwrap_or(false)))
            }
            ParameterType::Array => match value {
                ParamValue::List(_) => value.clone(),
                ParamValue::Null => ParamValue::List(Vec::new()),
                ParamValue::Text(s) => ParamValue::List(s.split(',').map(ParamValue::text).collect()),
                other => ParamValue::List(vec![other.clone()]),
            },
            ParameterType::Float => Self::map_each(value, |v| ParamValue::Float(Self::cast_float(v))),
            ParameterType::DateTime => match value {
                ParamValue::DateTime(_) => value.clone(),
                ParamValue::Text(s) => Self::parse_datetime(s, datetime_format)
                    .map(ParamValue::DateTime)
                    .unwrap_or(ParamValue::Null),
                _ => ParamValue::Null,
            },
        }
    }

    /// Zero value per kind; DATETIME defaults to the current local time
    pub fn default_for(kind: ParameterType) -> ParamValue {
        match kind {
            ParameterType::Int => ParamValue::Int(0),
            ParameterType::String => ParamValue::Text(String::new()),
            ParameterType::Bool => ParamValue::Bool(false),
            ParameterType::Array => ParamValue::List(Vec::new()),
            ParameterType::Float => ParamValue::Float(0.0),
            ParameterType::DateTime => ParamValue::DateTime(Local::now().naive_local()),
        }
    }

    pub fn name_of(kind: ParameterType) -> &'static str {
        kind.name()
    }

    /// Numbers, and strings holding a decimal or scientific number
    pub fn is_numeric(value: &ParamValue) -> bool {
        match value {
            ParamValue::Int(_) | ParamValue::Float(_) => true,
            ParamValue::Text(s) => numeric_regex().is_match(s),
            _ => false,
        }
    }

    /// Integer coercion; non-numeric input yields 0
    pub fn cast_int(value: &ParamValue) -> i64 {
        match value {
            ParamValue::Int(i) => *i,
            ParamValue::Float(x) => *x as i64,
            ParamValue::Bool(b) => i64::from(*b),
            ParamValue::Text(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return i;
                }
                if numeric_regex().is_match(trimmed) {
                    if let Ok(x) = trimmed.parse::<f64>() {
                        return x as i64;
                    }
                }
                leading_int_regex()
                    .find(trimmed)
                    .and_then(|m| m.as_str().trim().parse::<i64>().ok())
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Float coercion; non-numeric input yields 0.0
    pub fn cast_float(value: &ParamValue) -> f64 {
        match value {
            ParamValue::Int(i) => *i as f64,
            ParamValue::Float(x) => *x,
            ParamValue::Bool(b) => f64::from(u8::from(*b)),
            ParamValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Interpret a boolean-like value; `None` when it is neither true- nor
    /// false-like
    pub fn bool_value(value: &ParamValue) -> Option<bool> {
        match value {
            ParamValue::Bool(b) => Some(*b),
            ParamValue::Null => Some(false),
            ParamValue::Int(0) => Some(false),
            ParamValue::Int(1) => Some(true),
            ParamValue::Float(x) if *x == 0.0 => Some(false),
            ParamValue::Float(x) if *x == 1.0 => Some(true),
            ParamValue::Text(s) => {
                let lowered = s.to_lowercase();
                if FALSE_LIKE.contains(&lowered.as_str()) {
                    Some(false)
                } else if TRUE_LIKE.contains(&lowered.as_str()) {
                    Some(true)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse `input` with a `Y-m-d H:i:s` style format
    pub fn parse_datetime(input: &str, format: &str) -> Option<NaiveDateTime> {
        let pattern = Self::translate_datetime_format(format);
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, &pattern) {
            return Some(dt);
        }
        if let Ok(dt) = DateTime::parse_from_str(input, &pattern) {
            return Some(dt.naive_local());
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, &pattern) {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(time) = NaiveTime::parse_from_str(input, &pattern) {
            return Some(Local::now().date_naive().and_time(time));
        }
        None
    }

    /// Translate the letter syntax (`Y-m-d H:i:s`) into a chrono pattern.
    /// A backslash escapes the next character.
    pub fn translate_datetime_format(format: &str) -> String {
        let mut out = String::with_capacity(format.len() * 2);
        let mut chars = format.chars();
        while let Some(c) = chars.next() {
            let piece = match c {
                'd' | 'j' => "%d",
                'm' | 'n' => "%m",
                'Y' => "%Y",
                'y' => "%y",
                'H' | 'G' => "%H",
                'h' | 'g' => "%I",
                'i' => "%M",
                's' => "%S",
                'A' | 'a' => "%p",
                'D' => "%a",
                'l' => "%A",
                'M' => "%b",
                'F' => "%B",
                'U' => "%s",
                'O' => "%z",
                'P' => "%:z",
                'u' => "%6f",
                'v' => "%3f",
                '%' => "%%",
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        if escaped == '%' {
                            out.push_str("%%");
                        } else {
                            out.push(escaped);
                        }
                    }
                    continue;
                }
                other => {
                    out.push(other);
                    continue;
                }
            };
            out.push_str(piece);
        }
        out
    }

    fn is_float_shaped(value: &ParamValue) -> bool {
        match value {
            ParamValue::Float(_) => true,
            ParamValue::Text(s) => float_shape_regex().is_match(s),
            _ => false,
        }
    }

    fn is_array(value: &ParamValue) -> bool {
        match value {
            ParamValue::Text(_) => true,
            ParamValue::List(items) => {
                let nested = items.iter().any(|item| matches!(item, ParamValue::List(_)));
                !nested || items.iter().all(|item| matches!(item, ParamValue::List(_)))
            }
            _ => false,
        }
    }

    fn each(value: &ParamValue, check: impl Fn(&ParamValue) -> bool) -> bool {
        match value {
            ParamValue::List(items) => items.iter().all(check),
            single => check(single),
        }
    }

    fn map_each(value: &ParamValue, cast: impl Fn(&ParamValue) -> ParamValue) -> ParamValue {
        match value {
            ParamValue::List(items) => ParamValue::List(items.iter().map(cast).collect()),
            single => cast(single),
        }
    }
}
