//! Use cases - Validating a single request

pub mod request_guard;

pub use request_guard::RequestGuard;
