//! Route lookup, request guards and textual route descriptions

use std::sync::Arc;

use tracing::debug;

use crate::application::use_cases::request_guard::RequestGuard;
use crate::config::AppConfig;
use crate::domain::route::{RouteDefinition, RouteRegistry};
use crate::domain::security::RoleChecker;
use crate::domain::validation::{Parameter, ValidationSet};
use crate::shared::error::AppResult;

const LABEL_WIDTH: usize = 12;

/// Entry point for everything that needs a route by name
#[derive(Debug, Clone)]
pub struct RouteCatalog {
    registry: Arc<RouteRegistry>,
    checker: Arc<RoleChecker>,
}

impl RouteCatalog {
    pub fn new(registry: RouteRegistry, checker: RoleChecker) -> Self {
        Self {
            registry: Arc::new(registry),
            checker: Arc::new(checker),
        }
    }

    /// Catalog of the configured routes, role hierarchy and upload ceiling
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let registry = RouteRegistry::from_routes(config.routes.clone(), config.pre_config.clone())?
            .with_upload_ceiling(config.limits.upload_max_filesize);
        let checker = RoleChecker::new(config.security.role_hierarchy.clone());
        Ok(Self::new(registry, checker))
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn find(&self, name: &str) -> AppResult<&RouteDefinition> {
        self.registry.find(name)
    }

    /// Exposed routes, optionally only those of one controller
    pub fn list(&self, controller: Option<&str>) -> Vec<&RouteDefinition> {
        self.registry
            .routes()
            .filter(|route| match controller {
                Some(wanted) => split_controller(route).0 == wanted,
                None => true,
            })
            .collect()
    }

    /// Fresh validation set for the named route
    pub fn validation_set(&self, name: &str) -> AppResult<ValidationSet> {
        let route = self.registry.find(name)?;
        self.registry.build_validation_set(route)
    }

    /// Guard for one request to the named route
    pub fn guard_for(&self, name: &str) -> AppResult<RequestGuard> {
        let route = self.registry.find(name)?;
        let set = self.registry.build_validation_set(route)?;
        debug!(route = %name, "Request guard created");
        Ok(RequestGuard::new(route.clone(), set, self.checker.clone()))
    }

    /// Table of the exposed routes
    pub fn render_list(&self, controller: Option<&str>) -> String {
        let headers = ["Route", "Path", "Controller", "Method", "Options"];
        let rows: Vec<[String; 5]> = self
            .list(controller)
            .into_iter()
            .map(|route| {
                let (controller, function) = split_controller(route);
                let controller = if function.is_empty() {
                    controller.to_string()
                } else {
                    format!("{}::{}", controller, function)
                };
                [
                    route.name.clone(),
                    route.path.clone(),
                    controller,
                    route.method.to_string(),
                    route_options(route),
                ]
            })
            .collect();

        let mut widths = headers.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }

        let mut out = String::new();
        push_table_row(&mut out, &headers.map(str::to_string), &widths);
        push_table_row(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
        for row in &rows {
            push_table_row(&mut out, row, &widths);
        }
        out
    }

    /// Name, path, controller, method, roles and parameters of one route.
    /// With `full` every parameter property is listed.
    pub fn describe(&self, name: &str, full: bool) -> AppResult<String> {
        let route = self.registry.find(name)?;
        let set = self.registry.build_validation_set(route)?;
        let (controller, function) = split_controller(route);

        let mut out = String::new();
        push_row(&mut out, "Name", &route.name);
        push_row(&mut out, "Path", &route.path);
        push_row(&mut out, "Controller", controller);
        push_row(&mut out, "Function", function);
        push_row(&mut out, "Method", set.method().as_str());
        push_row(&mut out, "Roles", &route.required_roles().join(", "));

        if !set.scalar_parameters().is_empty() {
            let lines: Vec<String> = set
                .scalar_parameters()
                .iter()
                .map(|p| p.describe(full))
                .collect();
            push_row(&mut out, "Parameters", &lines.join("\n"));
        }
        if !set.file_parameters().is_empty() {
            let lines: Vec<String> = set
                .file_parameters()
                .iter()
                .map(|p| p.describe(full))
                .collect();
            push_row(&mut out, "Files", &lines.join("\n"));
        }
        Ok(out)
    }
}

/// `Controller::function` split in two; either part may be empty
fn split_controller(route: &RouteDefinition) -> (&str, &str) {
    match route.controller.as_deref() {
        Some(controller) => controller.split_once("::").unwrap_or((controller, "")),
        None => ("", ""),
    }
}

fn route_options(route: &RouteDefinition) -> String {
    let mut options = Vec::new();
    let roles = route.required_roles();
    if !roles.is_empty() {
        options.push(format!("roles = {}", roles.join(",")));
    }
    options.push(format!("auto_valid = {}", route.auto_valid));
    if let Some(pre_config) = &route.pre_config {
        options.push(format!("pre_config = {}", pre_config));
    }
    options.join("; ")
}

fn push_row(out: &mut String, label: &str, value: &str) {
    let mut lines = value.lines();
    let first = lines.next().unwrap_or("");
    out.push_str(&format!("{:<width$}{}\n", label, first, width = LABEL_WIDTH));
    for line in lines {
        out.push_str(&format!("{:<width$}{}\n", "", line, width = LABEL_WIDTH));
    }
}

fn push_table_row(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}
