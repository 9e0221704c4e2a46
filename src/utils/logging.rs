//! Logging initialization
//!
//! ClipKit itself only emits `tracing` events; hosts that want them rendered
//! call [`init`] once at startup. Level selection follows `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; subsequent calls are no-ops. Tests rely on
/// that, since each test binary shares one global subscriber slot.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
