//! Logging initialization with environment variable support

use crate::{GoConfig, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: standard filter directives, takes precedence over all
/// - `LOG_FORMAT`: override format (json, pretty)
///
/// ```bash
/// RUST_LOG=gorig_lsp=debug gorig tests ./parse_test.go
/// LOG_FORMAT=json gorig packages ./main.go
/// ```
pub fn initialize(config: &GoConfig) {
    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::from_default_env().add_directive(log_level.into());

    let format = format_override(std::env::var("LOG_FORMAT").ok().as_deref())
        .unwrap_or_else(|| config.logging.format.clone());

    // stdout belongs to command output; logs go to stderr
    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

fn format_override(value: Option<&str>) -> Option<LogFormat> {
    match value?.to_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" | "human" => Some(LogFormat::Pretty),
        _ => None,
    }
}

/// Span for one user-triggered editor command
///
/// Everything logged while the command runs carries its name and the
/// document it was issued on.
pub fn command_span(command: &str, document_uri: Option<&str>) -> tracing::Span {
    tracing::info_span!(
        "command",
        command = %command,
        document = document_uri.unwrap_or("")
    )
}
