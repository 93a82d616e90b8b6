//! Configured routes driven through the warp filters

use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::{Filter, Reply};

use super::config::init;
use super::fixtures::{ajax, ajax_routes, app_config, catalog};
use crate::config::ConfigValidator;
use crate::infrastructure::http::{anonymous, handle_rejection, roles_from_header, AjaxRequest};
use crate::infrastructure::ResponseFormatter;

const ROLES_HEADER: &str = "x-user-roles";

fn reply_with_data(request: AjaxRequest) -> warp::reply::Response {
    ResponseFormatter::json(&request.data()).into_response()
}

fn body<B: AsRef<[u8]>>(res: &warp::http::Response<B>) -> Value {
    serde_json::from_slice(res.body().as_ref()).unwrap()
}

#[tokio::test]
async fn profile_update_with_all_inputs() {
    init();
    let filter = ajax_routes()
        .route("profile_update", roles_from_header(ROLES_HEADER))
        .unwrap()
        .map(reply_with_data)
        .recover(handle_rejection);

    let res = warp::test::request()
        .method("POST")
        .path("/ajax/profile")
        .header("x-requested-with", "XMLHttpRequest")
        .header("content-type", "application/x-www-form-urlencoded")
        .header(ROLES_HEADER, "ROLE_USER")
        .body("age=30&nickname=")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body(&res),
        json!({"age": 30, "nickname": "anonymous", "avatar": null})
    );
}

#[tokio::test]
async fn profile_update_rejects_bad_nickname() {
    init();
    let filter = ajax_routes()
        .route("profile_update", roles_from_header(ROLES_HEADER))
        .unwrap()
        .map(reply_with_data)
        .recover(handle_rejection);

    let res = warp::test::request()
        .method("POST")
        .path("/ajax/profile")
        .header("x-requested-with", "XMLHttpRequest")
        .header("content-type", "application/x-www-form-urlencoded")
        .header(ROLES_HEADER, "ROLE_USER")
        .body("age=30&nickname=bad%20name")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(&res)["message"],
        "The value \"bad name\" of the parameter \"nickname\" does not match to the regular expression."
    );
}

#[tokio::test]
async fn search_merges_pre_config_and_lists() {
    init();
    let filter = ajax_routes()
        .route("article_search", anonymous())
        .unwrap()
        .map(reply_with_data)
        .recover(handle_rejection);

    let res = warp::test::request()
        .method("GET")
        .path("/ajax/articles?q=rust&sort=title")
        .header("x-requested-with", "XMLHttpRequest")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res), json!({"q": "rust", "sort": "title", "page": 1}));

    let res = warp::test::request()
        .method("GET")
        .path("/ajax/articles?q=rust&sort=views")
        .header("x-requested-with", "XMLHttpRequest")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = warp::test::request()
        .method("GET")
        .path("/ajax/articles?q=rust&page=0")
        .header("x-requested-with", "XMLHttpRequest")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body(&res)["message"]
        .as_str()
        .unwrap()
        .contains("must be greater than 1"));
}

#[tokio::test]
async fn wrong_method_reports_expected_method() {
    init();
    let filter = ajax_routes()
        .route("profile_update", roles_from_header(ROLES_HEADER))
        .unwrap()
        .map(reply_with_data)
        .recover(handle_rejection);

    let res = warp::test::request()
        .method("GET")
        .path("/ajax/profile?age=3")
        .header("x-requested-with", "XMLHttpRequest")
        .header(ROLES_HEADER, "ROLE_USER")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(&res),
        json!({"message": "Bad request method, must be 'POST'."})
    );
}

#[tokio::test]
async fn admin_route_parses_dates() {
    init();
    let filter = ajax_routes()
        .route("admin_purge", roles_from_header(ROLES_HEADER))
        .unwrap()
        .map(reply_with_data)
        .recover(handle_rejection);

    let res = warp::test::request()
        .method("POST")
        .path("/ajax/admin/purge")
        .header("x-requested-with", "XMLHttpRequest")
        .header("content-type", "application/x-www-form-urlencoded")
        .header(ROLES_HEADER, "ROLE_SUPER_ADMIN")
        .body("before=2024-01-31")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["before"], "2024-01-31 00:00:00");

    let res = warp::test::request()
        .method("POST")
        .path("/ajax/admin/purge")
        .header("x-requested-with", "XMLHttpRequest")
        .header("content-type", "application/x-www-form-urlencoded")
        .header(ROLES_HEADER, "ROLE_SUPER_ADMIN")
        .body("before=31/01/2024")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body(&res)["message"]
        .as_str()
        .unwrap()
        .ends_with("with format \"Y-m-d\"."));
}

#[test]
fn configured_routes_pass_startup_checks() {
    assert!(ConfigValidator::validate_config(&app_config()).is_ok());
}

#[test]
fn hidden_routes_are_not_ajax_routes() {
    assert!(catalog().find("internal_sync").is_err());
    assert!(ajax_routes().route("internal_sync", anonymous()).is_err());
}

#[test]
fn catalog_guard_matches_declarations() {
    let catalog = catalog();
    let mut guard = catalog.guard_for("profile_update").unwrap();
    let roles = vec!["ROLE_USER".to_string()];
    let shape = ajax("POST").with_scalar("age", "44");
    guard.validate(&shape, Some(roles.as_slice())).unwrap();
    assert_eq!(guard.data().to_json()["age"], 44);
    assert_eq!(guard.data().to_json()["nickname"], "anonymous");
}

#[test]
fn route_descriptions() {
    let catalog = catalog();
    let table = catalog.render_list(None);
    assert!(table.contains("profile_update"));
    assert!(table.contains("pre_config = paging"));
    assert!(!table.contains("internal_sync"));

    let admin_only = catalog.render_list(Some("AdminController"));
    assert_eq!(admin_only.lines().count(), 3);

    let text = catalog.describe("article_search", false).unwrap();
    assert!(text.contains("q (string)"));
    assert!(text.contains("page (integer)"));
}
