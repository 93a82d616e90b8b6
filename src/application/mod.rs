//! Application layer - Use cases and application services
//!
//! This module turns route declarations into per-request guards and
//! route descriptions.

pub mod services;
pub mod use_cases;

pub use services::*;
pub use use_cases::*;
