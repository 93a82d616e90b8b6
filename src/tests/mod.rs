//! Cross-layer test suite
//!
//! - `unit`: validation properties of the core engine
//! - `integration`: route declarations through warp filters
//! - `security`: role requirements and hierarchy
//! - `fixtures`: route declarations and request builders shared by the above

pub mod fixtures;
pub mod integration;
pub mod security;
pub mod unit;

/// Test configuration and utilities
pub mod config {
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Initialize tracing once for the whole test binary
    pub fn init() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("debug")
                .with_test_writer()
                .try_init();
        });
    }
}
