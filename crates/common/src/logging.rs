use crate::config::Environment;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// Development gets pretty, colored output; production gets one JSON object per
/// line. `RUST_LOG` overrides the default `info` filter. An OpenTelemetry layer
/// is always attached so spans are exported once a tracer provider exists
/// (see [`crate::TelemetryGuard`]).
///
/// Calling this more than once is harmless: later calls are ignored.
pub fn setup_logging(environment: Environment) {
    let registry = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_opentelemetry::layer());

    let installed = match environment {
        Environment::Production => registry
            .with(tracing_subscriber::fmt::layer().json().with_level(true))
            .try_init(),
        Environment::Development => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }
}

pub(crate) fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
