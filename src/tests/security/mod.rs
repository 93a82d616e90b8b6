//! Role requirements of configured routes

use super::fixtures::{ajax, app_config, catalog};
use crate::domain::security::RoleChecker;
use crate::domain::validation::ValidationError;

fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[test]
fn hierarchy_is_transitive() {
    let config = app_config();
    let expanded = config.security.role_hierarchy.expand(&["ROLE_SUPER_ADMIN"]);
    assert!(expanded.contains("ROLE_ADMIN"));
    assert!(expanded.contains("ROLE_USER"));
    assert!(expanded.contains("ROLE_SUPER_ADMIN"));
}

#[test]
fn anonymous_callers_are_denied_on_protected_routes() {
    let mut guard = catalog().guard_for("admin_purge").unwrap();
    let shape = ajax("POST").with_scalar("before", "2024-01-01");
    assert_eq!(guard.validate(&shape, None), Err(ValidationError::access_denied()));
}

#[test]
fn lower_roles_do_not_reach_higher_routes() {
    let mut guard = catalog().guard_for("admin_purge").unwrap();
    let shape = ajax("POST").with_scalar("before", "2024-01-01");
    let user = roles(&["ROLE_USER"]);
    let err = guard.validate(&shape, Some(user.as_slice())).unwrap_err();
    assert_eq!(err.message, "Access denied.");
}

#[test]
fn implied_roles_reach_lower_routes() {
    let mut guard = catalog().guard_for("profile_update").unwrap();
    let shape = ajax("POST").with_scalar("age", "21");
    let admin = roles(&["ROLE_ADMIN"]);
    assert!(guard.validate(&shape, Some(admin.as_slice())).is_ok());
}

#[test]
fn open_routes_accept_everyone() {
    let mut guard = catalog().guard_for("article_search").unwrap();
    let shape = ajax("GET").with_scalar("q", "x").with_scalar("sort", "date");
    assert!(guard.validate(&shape, None).is_ok());
}

#[test]
fn unknown_roles_expand_to_themselves() {
    let checker = RoleChecker::new(app_config().security.role_hierarchy);
    let guest = roles(&["ROLE_GUEST"]);
    assert!(checker
        .check_access(&roles(&["ROLE_USER"]), Some(guest.as_slice()))
        .is_err());
    assert!(checker
        .check_access(&roles(&["ROLE_GUEST"]), Some(guest.as_slice()))
        .is_ok());
}
