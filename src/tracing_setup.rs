use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initialize tracing from the `[logging]` section of the configuration.
///
/// Log lines go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing_with_config(logging: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&logging.level)
        .wrap_err_with(|| format!("Invalid log level: {}", logging.level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let installed = if logging.json {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.json().with_current_span(true).with_span_list(true))
            .try_init()
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
    };
    installed.wrap_err("Failed to install tracing subscriber")?;

    tracing::debug!(level = %logging.level, json = logging.json, "Logging initialized");
    Ok(())
}

/// Create a span covering one routing call
pub fn create_route_span(namespace: &str, service: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "route",
        dst.namespace = namespace,
        dst.service = service,
        request.id = request_id,
        instances.remaining = tracing::field::Empty,
    )
}
