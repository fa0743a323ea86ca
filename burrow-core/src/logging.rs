use tracing_subscriber::{EnvFilter, fmt};

/// russh logs every packet at debug; keep it quiet unless asked for.
const DEFAULT_FILTER: &str = "info,russh=warn";

/// Install the process-wide subscriber.
///
/// `TOKIO_CONSOLE` switches to the tokio-console layer instead of log output.
pub fn init_logging() {
    if std::env::var("TOKIO_CONSOLE").is_ok() {
        console_subscriber::init();
    } else {
        init_json_logging();
    }
}

/// JSON lines, filtered by `RUST_LOG`.
fn init_json_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .init();
}
