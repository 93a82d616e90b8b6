//! HTTP infrastructure module
//!
//! Request extraction, route filters and reply formatting for warp.

pub mod extract;
pub mod responses;
pub mod routes;

pub use extract::{is_xml_http_request, request_shape, scalar_inputs, REQUESTED_WITH_HEADER};
pub use responses::ResponseFormatter;
pub use routes::{
    anonymous, handle_rejection, roles_from_header, AjaxRequest, AjaxRoutes, ValidationRejection,
};
