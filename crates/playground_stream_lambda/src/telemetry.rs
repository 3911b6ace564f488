use tracing_subscriber::EnvFilter;

/// JSON log lines on stdout, filtered by `RUST_LOG` (default `info`).
///
/// Timestamps are left to the platform's log ingestion.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_current_span(false)
        .without_time()
        .init();
}
