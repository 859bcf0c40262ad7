//! Observability utilities.
//!
//! The engine emits structured `tracing` events throughout; this module
//! only wires up a subscriber for binaries and tests that want one.

use tracing_subscriber::EnvFilter;

/// Initializes a global tracing subscriber with the default filter
/// (`stepflow=info`), honoring `RUST_LOG` when set.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_tracing() {
    init_tracing_with("stepflow=info");
}

/// Initializes a global tracing subscriber with an explicit fallback
/// filter directive.
pub fn init_tracing_with(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
