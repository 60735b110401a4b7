//! Tracing setup shared by the caseflow binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing at the default `info` level
///
/// `RUST_LOG` overrides the default when set.
pub fn init() {
    init_with_level("info")
}

/// Initialize tracing with an explicit fallback level
pub fn init_with_level(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Test-only init that routes output through the test writer
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
