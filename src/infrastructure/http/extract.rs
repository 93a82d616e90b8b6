//! Building a `RequestShape` from what warp extracts

use warp::http::Method;

use crate::domain::validation::{ParamValue, RequestShape, ScalarInputs};

/// Header set by browsers' XHR wrappers
pub const REQUESTED_WITH_HEADER: &str = "x-requested-with";

/// True when the `X-Requested-With` value marks an AJAX request
pub fn is_xml_http_request(requested_with: Option<&str>) -> bool {
    requested_with
        .map(|value| value.eq_ignore_ascii_case("XMLHttpRequest"))
        .unwrap_or(false)
}

/// Url-encoded pairs to an input bag. Keys seen more than once become
/// lists, and a `name[]` key is always a list.
pub fn scalar_inputs(pairs: Vec<(String, String)>) -> ScalarInputs {
    let mut inputs = ScalarInputs::new();
    for (key, value) in pairs {
        let (key, forced_list) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (key, false),
        };
        let value = ParamValue::Text(value);
        match inputs.remove(&key) {
            Some(ParamValue::List(mut items)) => {
                items.push(value);
                inputs.insert(key, ParamValue::List(items));
            }
            Some(existing) => {
                inputs.insert(key, ParamValue::List(vec![existing, value]));
            }
            None if forced_list => {
                inputs.insert(key, ParamValue::List(vec![value]));
            }
            None => {
                inputs.insert(key, value);
            }
        }
    }
    inputs
}

pub fn request_shape(
    method: &Method,
    requested_with: Option<&str>,
    pairs: Vec<(String, String)>,
) -> RequestShape {
    RequestShape {
        method: method.as_str().to_string(),
        is_ajax: is_xml_http_request(requested_with),
        scalar: scalar_inputs(pairs),
        files: Default::default(),
    }
}
