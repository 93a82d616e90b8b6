//! Warp filters for declared AJAX routes
//!
//! A route filter matches the declared path, collects the inputs for the
//! incoming method and, for `auto_valid` routes, validates the request
//! before the handler sees it.

use std::convert::Infallible;
use std::sync::Arc;

use warp::filters::BoxedFilter;
use warp::http::Method;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

use super::extract::{request_shape, REQUESTED_WITH_HEADER};
use super::responses::ResponseFormatter;
use crate::application::services::RouteCatalog;
use crate::application::use_cases::RequestGuard;
use crate::domain::validation::{Parameter, RequestShape, ResolvedValues, ValidationError};
use crate::shared::error::{AppError, AppResult};

/// Largest url-encoded body read when none is configured (1 MiB)
pub const DEFAULT_MAX_FORM_SIZE: u64 = 1024 * 1024;

/// Request rejected by validation or by the role check
#[derive(Debug)]
pub struct ValidationRejection(pub ValidationError);

impl warp::reject::Reject for ValidationRejection {}

/// A request matched to its route, validated when the route asks for it
pub struct AjaxRequest {
    pub guard: RequestGuard,
    pub shape: RequestShape,
    pub user_roles: Option<Vec<String>>,
    validated: bool,
}

impl AjaxRequest {
    pub fn new(guard: RequestGuard, shape: RequestShape, user_roles: Option<Vec<String>>) -> Self {
        Self {
            guard,
            shape,
            user_roles,
            validated: false,
        }
    }

    /// Run the guard; used directly by handlers of routes without `auto_valid`
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.guard.validate(&self.shape, self.user_roles.as_deref())?;
        self.validated = true;
        Ok(())
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    pub fn data(&self) -> ResolvedValues {
        self.guard.data()
    }
}

/// Filter factory for the routes of a catalog
#[derive(Clone)]
pub struct AjaxRoutes {
    catalog: Arc<RouteCatalog>,
    max_form_size: u64,
}

impl AjaxRoutes {
    pub fn new(catalog: Arc<RouteCatalog>) -> Self {
        Self {
            catalog,
            max_form_size: DEFAULT_MAX_FORM_SIZE,
        }
    }

    pub fn with_max_form_size(mut self, size: u64) -> Self {
        self.max_form_size = size;
        self
    }

    /// Filter for the named route. `user_roles` supplies the roles of the
    /// authenticated caller, `None` for anonymous ones.
    pub fn route<R>(&self, name: &str, user_roles: R) -> AppResult<BoxedFilter<(AjaxRequest,)>>
    where
        R: Filter<Extract = (Option<Vec<String>>,), Error = Rejection> + Clone + Send + Sync + 'static,
    {
        let route = self.catalog.find(name)?;
        let name = route.name.clone();
        let auto_valid = route.auto_valid;
        if auto_valid {
            if let Some(file) = self.catalog.validation_set(&name)?.required_file() {
                return Err(AppError::Config(format!(
                    "The route \"{}\" requires the file parameter \"{}\" and cannot be validated from url-encoded inputs",
                    name,
                    file.name()
                )));
            }
        }
        let catalog = self.catalog.clone();

        let filter = path_is(route.path.clone())
            .and(warp::method())
            .and(warp::header::optional::<String>(REQUESTED_WITH_HEADER))
            .and(input_pairs(self.max_form_size))
            .and(user_roles)
            .and(with_catalog(catalog))
            .and_then(
                move |method: Method,
                      requested_with: Option<String>,
                      pairs: Vec<(String, String)>,
                      roles: Option<Vec<String>>,
                      catalog: Arc<RouteCatalog>| {
                    let name = name.clone();
                    async move {
                        let guard = catalog.guard_for(&name).map_err(warp::reject::custom)?;
                        let shape = request_shape(&method, requested_with.as_deref(), pairs);
                        let mut request = AjaxRequest::new(guard, shape, roles);
                        if auto_valid {
                            request
                                .validate()
                                .map_err(|e| warp::reject::custom(ValidationRejection(e)))?;
                        }
                        Ok::<_, Rejection>(request)
                    }
                },
            )
            .boxed();
        Ok(filter)
    }
}

/// Every request is anonymous
pub fn anonymous() -> impl Filter<Extract = (Option<Vec<String>>,), Error = Rejection> + Clone {
    warp::any().and_then(|| async { Ok::<_, Rejection>(None::<Vec<String>>) })
}

/// Comma-separated roles from a header set by a trusted authenticating proxy
pub fn roles_from_header(
    header: &'static str,
) -> impl Filter<Extract = (Option<Vec<String>>,), Error = Rejection> + Clone {
    warp::header::optional::<String>(header).map(|value: Option<String>| {
        value.map(|roles| {
            roles
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect()
        })
    })
}

/// Turn validation and route errors into `{message}` JSON replies
pub async fn handle_rejection(rejection: Rejection) -> Result<warp::reply::Response, Rejection> {
    if let Some(ValidationRejection(error)) = rejection.find() {
        return Ok(ResponseFormatter::bad_request(error).into_response());
    }
    if let Some(error) = rejection.find::<AppError>() {
        return Ok(ResponseFormatter::from_app_error(error).into_response());
    }
    Err(rejection)
}

fn path_is(path: String) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and_then(move |full: FullPath| {
            let matches = full.as_str() == path;
            async move {
                if matches {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one()
}

/// Url-encoded body pairs for POST requests, query pairs otherwise. The
/// incoming method picks the source so a method mismatch still reaches the
/// protocol check.
fn input_pairs(max_form_size: u64) -> BoxedFilter<(Vec<(String, String)>,)> {
    let form = warp::post()
        .and(warp::body::content_length_limit(max_form_size))
        .and(warp::body::form::<Vec<(String, String)>>());
    let query = warp::query::<Vec<(String, String)>>();
    form.or(query)
        .unify()
        .or(warp::any().map(Vec::<(String, String)>::new))
        .unify()
        .boxed()
}

fn with_catalog(
    catalog: Arc<RouteCatalog>,
) -> impl Filter<Extract = (Arc<RouteCatalog>,), Error = Infallible> + Clone {
    warp::any().map(move || catalog.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::route::RouteRegistry;
    use crate::domain::security::{RoleChecker, RoleHierarchy};
    use serde_json::Value;
    use warp::http::StatusCode;

    const ROUTES: &str = r#"
        [[routes]]
        name = "user_update"
        path = "/ajax/user"
        method = "POST"
        roles = ["ROLE_USER"]
        parameters = { age = { type = "int", min = 0, max = 120 } }

        [[routes]]
        name = "search"
        path = "/ajax/search"
        parameters = { q = {}, page = { type = "int", require = false, defaultValue = 1 } }

        [[routes]]
        name = "manual"
        path = "/ajax/manual"
        auto_valid = false
        parameters = ["q"]

        [[routes]]
        name = "upload"
        path = "/ajax/upload"
        method = "POST"
        files = { document = { mimeType = "application/pdf" } }
    "#;

    fn routes() -> AjaxRoutes {
        let mut hierarchy = RoleHierarchy::default();
        hierarchy.insert("ROLE_ADMIN", ["ROLE_USER"]);
        let catalog = RouteCatalog::new(
            RouteRegistry::from_toml_str(ROUTES).unwrap(),
            RoleChecker::new(hierarchy),
        );
        AjaxRoutes::new(Arc::new(catalog))
    }

    fn data_reply(request: AjaxRequest) -> warp::reply::Json {
        ResponseFormatter::json(&request.data())
    }

    #[tokio::test]
    async fn test_get_route_validates_query() {
        let filter = routes()
            .route("search", anonymous())
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("GET")
            .path("/ajax/search?q=rust")
            .header("x-requested-with", "XMLHttpRequest")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["q"], "rust");
        assert_eq!(body["page"], 1);
    }

    #[tokio::test]
    async fn test_missing_xhr_header_is_rejected() {
        let filter = routes()
            .route("search", anonymous())
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("GET")
            .path("/ajax/search?q=rust")
            .reply(&filter)
            .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["message"], "The request is not a Xml Http request.");
    }

    #[tokio::test]
    async fn test_post_route_reads_form_body_and_roles() {
        let filter = routes()
            .route("user_update", roles_from_header("x-user-roles"))
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .path("/ajax/user")
            .header("x-requested-with", "XMLHttpRequest")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-user-roles", "ROLE_ADMIN")
            .body("age=30")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["age"], 30);

        let res = warp::test::request()
            .method("POST")
            .path("/ajax/user")
            .header("x-requested-with", "XMLHttpRequest")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("age=30")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["message"], "Access denied.");
    }

    #[tokio::test]
    async fn test_out_of_range_value_reports_bound() {
        let filter = routes()
            .route("user_update", roles_from_header("x-user-roles"))
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .path("/ajax/user")
            .header("x-requested-with", "XMLHttpRequest")
            .header("content-type", "application/x-www-form-urlencoded")
            .header("x-user-roles", "ROLE_USER")
            .body("age=150")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["message"].as_str().unwrap().contains("smaller than 120"));
    }

    #[tokio::test]
    async fn test_manual_route_leaves_validation_to_handler() {
        let filter = routes()
            .route("manual", anonymous())
            .unwrap()
            .map(|mut request: AjaxRequest| {
                assert!(!request.is_validated());
                match request.validate() {
                    Ok(()) => ResponseFormatter::json(&request.data()).into_response(),
                    Err(err) => ResponseFormatter::bad_request(&err).into_response(),
                }
            });

        let res = warp::test::request()
            .method("GET")
            .path("/ajax/manual")
            .header("x-requested-with", "XMLHttpRequest")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_method_mismatch_reports_expected_method() {
        let filter = routes()
            .route("user_update", roles_from_header("x-user-roles"))
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("GET")
            .path("/ajax/user?age=30")
            .header("x-requested-with", "XMLHttpRequest")
            .header("x-user-roles", "ROLE_USER")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["message"], "Bad request method, must be 'POST'.");

        let search = routes()
            .route("search", anonymous())
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);
        let res = warp::test::request()
            .method("POST")
            .path("/ajax/search")
            .header("x-requested-with", "XMLHttpRequest")
            .header("content-type", "application/x-www-form-urlencoded")
            .body("q=rust")
            .reply(&search)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["message"], "Bad request method, must be 'GET'.");
    }

    #[tokio::test]
    async fn test_post_without_form_body_still_validates() {
        let filter = routes()
            .route("user_update", roles_from_header("x-user-roles"))
            .unwrap()
            .map(data_reply)
            .recover(handle_rejection);

        let res = warp::test::request()
            .method("POST")
            .path("/ajax/user")
            .header("x-requested-with", "XMLHttpRequest")
            .header("x-user-roles", "ROLE_USER")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["message"].as_str().unwrap().contains("\"age\" is required"));
    }

    #[tokio::test]
    async fn test_other_paths_do_not_match() {
        let filter = routes().route("search", anonymous()).unwrap();
        assert!(!warp::test::request()
            .path("/ajax/other?q=x")
            .matches(&filter)
            .await);
    }

    #[test]
    fn test_required_upload_needs_manual_validation() {
        let err = routes().route("upload", anonymous()).err().unwrap();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("\"document\""));
    }

    #[test]
    fn test_unknown_route_is_config_error() {
        assert!(matches!(
            routes().route("nope", anonymous()),
            Err(AppError::RouteNotFound { .. })
        ));
    }
}
