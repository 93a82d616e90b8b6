//! Shared route declarations and request builders

use std::sync::Arc;

use crate::application::RouteCatalog;
use crate::config::AppConfig;
use crate::domain::validation::{
    FileParameterOptions, HttpMethod, OneOrMany, ParameterOptions, ParameterType, RequestShape,
    ValidationSet,
};
use crate::infrastructure::AjaxRoutes;

pub const APP_CONFIG: &str = r#"
[logging]
level = "debug"

[security.role_hierarchy]
ROLE_SUPER_ADMIN = ["ROLE_ADMIN"]
ROLE_ADMIN = ["ROLE_USER"]

[pre_config.paging]
parameters = { page = { type = "int", require = false, defaultValue = 1, min = 1 } }

[[routes]]
name = "profile_update"
path = "/ajax/profile"
method = "POST"
controller = "ProfileController::update"
roles = ["ROLE_USER"]

[routes.parameters]
age = { type = 0, min = 0, max = 120 }
nickname = { require = false, empty = true, defaultValue = "anonymous", regex = "/^[a-z0-9_]+$/i" }

[routes.files]
avatar = { require = false, mimeType = ["image/png"], maxSize = 2000000 }

[[routes]]
name = "article_search"
path = "/ajax/articles"
controller = "ArticleController::search"
pre_config = "paging"
parameters = ["q", { sort = { restrictedValue = ["date", "title"] } }]

[[routes]]
name = "admin_purge"
path = "/ajax/admin/purge"
method = "POST"
controller = "AdminController::purge"
roles = "ROLE_ADMIN"
parameters = { before = { type = "datetime", datetimeFormat = "Y-m-d" } }

[[routes]]
name = "internal_sync"
path = "/ajax/sync"
expose = false
"#;

pub fn app_config() -> AppConfig {
    AppConfig::from_toml_str(APP_CONFIG).unwrap()
}

pub fn catalog() -> Arc<RouteCatalog> {
    Arc::new(RouteCatalog::from_config(&app_config()).unwrap())
}

pub fn ajax_routes() -> AjaxRoutes {
    AjaxRoutes::new(catalog())
}

pub fn ajax(method: &str) -> RequestShape {
    RequestShape::new(method, true)
}

/// POST set with a required `age` (0..=120) and an optional png `avatar`
pub fn age_and_avatar_set() -> ValidationSet {
    let mut set = ValidationSet::new(HttpMethod::Post);
    let age = ParameterOptions {
        min: Some(0.into()),
        max: Some(120.into()),
        ..ParameterOptions::of_kind(ParameterType::Int)
    };
    set.add_scalar_parameter("age", &age).unwrap();

    let avatar = FileParameterOptions {
        require: Some(false),
        mime_type: Some(OneOrMany::Many(vec!["image/png".to_string()])),
        max_size: Some(2_000_000),
    };
    set.add_file_parameter("avatar", &avatar).unwrap();
    set
}
