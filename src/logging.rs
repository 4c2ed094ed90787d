/// Install a stderr fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns false if a global subscriber was already set.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
