use tracing_subscriber::EnvFilter;

/// Installs the global subscriber for the command line tools.
///
/// The level comes from `RUST_LOG`, `warn` when unset. Output goes to stderr,
/// stdout carries query results only.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}
