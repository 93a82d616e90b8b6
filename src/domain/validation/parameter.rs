//! Behaviour shared by scalar and file parameters

use std::collections::HashMap;

use super::types::ResolvedValue;

/// A declared request parameter
pub trait Parameter {
    /// Parameter name, unique within a validation set
    fn name(&self) -> &str;

    /// Whether the request must carry this parameter
    fn is_required(&self) -> bool;

    /// Value stored by the last successful validation
    fn resolved(&self) -> Option<ResolvedValue>;

    /// One-line summary, or every property when `full` is set
    fn describe(&self, full: bool) -> String;
}

/// Name and required flag common to every parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBase {
    pub name: String,
    pub required: bool,
}

impl ParameterBase {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            required,
        }
    }

    /// Look the parameter up in an input bag
    pub fn lookup<'a, T>(&self, inputs: &'a HashMap<String, T>) -> Option<&'a T> {
        inputs.get(&self.name)
    }

    /// A required parameter must be present; an optional one always passes
    pub fn check_require(&self, present: bool) -> bool {
        present || !self.required
    }
}

/// Append aligned `key  value` rows to a description
pub(crate) fn describe_properties(out: &mut String, rows: &[(&str, String)]) {
    const WIDTH: usize = 17;
    for (key, value) in rows {
        out.push_str("\n    ");
        out.push_str(key);
        out.push_str(&" ".repeat(WIDTH.saturating_sub(key.len())));
        out.push_str(value);
    }
}
