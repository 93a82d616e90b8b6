//! HTTP responses module
//!
//! JSON and HTML replies for AJAX routes. Errors always carry a
//! `{"message": ...}` body.

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{Html, Json, WithStatus};

use crate::domain::validation::ValidationError;
use crate::shared::error::AppError;

/// Response formatter for HTTP responses
pub struct ResponseFormatter;

impl ResponseFormatter {
    /// JSON body with status 200
    pub fn json<T: Serialize>(data: &T) -> Json {
        warp::reply::json(data)
    }

    /// HTML body with status 200
    pub fn html(body: impl Into<String>) -> Html<String> {
        warp::reply::html(body.into())
    }

    /// `{message}` JSON body with the given status
    pub fn error_json(error: &ValidationError, status: StatusCode) -> WithStatus<Json> {
        warp::reply::with_status(warp::reply::json(error), status)
    }

    /// Validation failure, status 400
    pub fn bad_request(error: &ValidationError) -> WithStatus<Json> {
        Self::error_json(error, StatusCode::BAD_REQUEST)
    }

    /// HTML error page with the given status
    pub fn error_html(body: impl Into<String>, status: StatusCode) -> WithStatus<Html<String>> {
        warp::reply::with_status(warp::reply::html(body.into()), status)
    }

    /// Configuration-tier failure as JSON
    pub fn from_app_error(error: &AppError) -> WithStatus<Json> {
        warp::reply::with_status(warp::reply::json(&error.to_json()), error.http_status_code())
    }
}
