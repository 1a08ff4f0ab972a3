use tracing_subscriber::EnvFilter;

/// Structured logging to stderr. Stdout is reserved for the JSON result
/// objects, so nothing from the log layer may ever land there.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paperdeck=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
