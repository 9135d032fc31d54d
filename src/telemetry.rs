use tracing_subscriber::{prelude::*, EnvFilter, Registry};

/// Directives for the log filter, e.g. `garage_provider=debug`
pub const LOG_ENV: &str = "GARAGE_PROVIDER_LOG";

/// Set to `json` for one JSON object per log line
pub const LOG_FORMAT_ENV: &str = "GARAGE_PROVIDER_LOG_FORMAT";

/// Initialize tracing. Logs go to stderr, stdout belongs to the host protocol.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let logger = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    };

    Registry::default().with(filter).with(logger).init();
}
