//! Shared fixtures for the cross-crate lock tests.

pub mod fixtures;

/// Install a test-writer `fmt` subscriber once per process.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
