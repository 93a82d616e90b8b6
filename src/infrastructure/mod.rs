//! Infrastructure layer - HTTP adapters
//!
//! Warp filters that feed requests into the validation engine.

pub mod http;

pub use http::{AjaxRequest, AjaxRoutes, ResponseFormatter};
