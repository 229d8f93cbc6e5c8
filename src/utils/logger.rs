use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber for CLI runs. Safe to call twice; the second
/// call is a no-op so binaries and integration tests can share it.
pub fn init_cli_logger(verbose: bool) {
    let default_filter = if verbose {
        "ttscards=debug,info"
    } else {
        "ttscards=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
