use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Initialize structured logging based on configuration
///
/// Supports both JSON (production) and pretty (development) formats, written
/// to stdout or appended to `file_path`. The filter comes from the config
/// only; the process reads no environment variables.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = parse_log_level(&config.level)?;

    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let writer = match &config.file_path {
        Some(file_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };
    let ansi = config.file_path.is_none();

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.format == "json" {
        let layer = fmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_line_number(true)
            .with_file(true);
        registry.with(layer).try_init()?;
    } else {
        let layer = fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_line_number(true)
            .with_file(false);
        registry.with(layer).try_init()?;
    }

    Ok(())
}

/// Parse log level string to tracing Level
///
/// Accepts a bare level, or the leading level of a directive list such as
/// `info,webrelay_core=debug`.
pub fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    let head = level.split(',').next().unwrap_or_default().trim();
    match head.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert!(parse_log_level("trace").is_ok());
        assert!(parse_log_level("debug").is_ok());
        assert!(parse_log_level("info").is_ok());
        assert!(parse_log_level("WARN").is_ok());
        assert!(parse_log_level("error").is_ok());
        assert!(parse_log_level("invalid").is_err());
        assert!(parse_log_level("").is_err());
    }

    #[test]
    fn test_parse_directive_list() {
        assert_eq!(
            parse_log_level("debug,tower_http=warn").unwrap(),
            Level::DEBUG
        );
    }
}
