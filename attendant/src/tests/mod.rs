mod mock;

mod resolver_tests;

// Initialize tracing for tests that want to be read with RUST_LOG set.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
