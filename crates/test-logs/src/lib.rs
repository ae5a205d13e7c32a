//! Initializes a `tracing` subscriber writing to the test harness's captured
//! stdout, so `cargo test -- --nocapture` shows spans/events emitted by the
//! crate under test.

use tracing_subscriber::EnvFilter;

/// Installs a global subscriber for the current test binary. Safe to call
/// more than once per process; only the first call takes effect.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}
