//! Application services - Route lookup and description

pub mod route_catalog;

pub use route_catalog::RouteCatalog;
