//! Telemetry setup: structured logging and Prometheus metrics.
//!
//! - **Tracing**: `tracing-subscriber` with an `EnvFilter`, JSON or compact output
//! - **Metrics**: Prometheus recorder whose handle renders the `/metrics` endpoint
//!
//! # Features
//! - `prometheus` (default): Prometheus metrics exporter

use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "prometheus")]
pub use metrics_exporter_prometheus::PrometheusHandle;

/// Noisy dependencies capped regardless of the configured level.
const DEPENDENCY_DIRECTIVES: &[&str] = &["sqlx::query=warn", "tower=info", "h2=info", "hyper=info"];

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level: a name (TRACE, DEBUG, INFO, WARN, ERROR) or a numeric
    /// severity (-4 debug, 0 info, 4 warn, 8 error).
    pub log_level: String,
    /// Use JSON log format
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_logs: false,
        }
    }
}

/// Parse a configured log level, falling back to INFO.
#[must_use]
pub fn parse_level(raw: &str) -> Level {
    let raw = raw.trim();
    if let Ok(severity) = raw.parse::<i32>() {
        return match severity {
            i32::MIN..=-5 => Level::TRACE,
            -4..=-1 => Level::DEBUG,
            0..=3 => Level::INFO,
            4..=7 => Level::WARN,
            _ => Level::ERROR,
        };
    }

    match raw.to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Build the filter for the configured level.
fn build_filter(level: Level) -> EnvFilter {
    DEPENDENCY_DIRECTIVES.iter().fold(
        EnvFilter::from_default_env().add_directive(level.into()),
        |filter, directive| match directive.parse() {
            Ok(d) => filter.add_directive(d),
            Err(_) => filter,
        },
    )
}

/// Install the global tracing subscriber.
///
/// Does nothing if a subscriber is already installed (e.g. in tests).
pub fn setup_telemetry(config: &TelemetryConfig) {
    let env_filter = build_filter(parse_level(&config.log_level));

    let fmt_layer = if config.json_logs {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string()))
            .compact()
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Initialize Prometheus metrics recorder and return the handle for the /metrics endpoint.
///
/// Fails if a global metrics recorder is already installed.
#[cfg(feature = "prometheus")]
pub fn init_metrics() -> Result<PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()
}

/// Build a Prometheus handle without installing it globally.
#[cfg(feature = "prometheus")]
#[must_use]
pub fn detached_metrics() -> PrometheusHandle {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "INFO");
        assert!(!config.json_logs);
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level(" error "), Level::ERROR);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn parses_numeric_severities() {
        assert_eq!(parse_level("-4"), Level::DEBUG);
        assert_eq!(parse_level("0"), Level::INFO);
        assert_eq!(parse_level("4"), Level::WARN);
        assert_eq!(parse_level("8"), Level::ERROR);
        assert_eq!(parse_level("-8"), Level::TRACE);
    }
}
