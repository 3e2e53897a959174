use std::fs::File;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

/// Initialize structured logging based on configuration
///
/// `RUST_LOG` overrides `logging.level` when set. Output goes to
/// `logging.file_path` if configured, stdout otherwise.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = parse_log_level(&config.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::registry()
        .with(output_layer(config)?.with_filter(env_filter))
        .try_init()?;

    Ok(())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn output_layer(config: &LoggingConfig) -> anyhow::Result<BoxedLayer> {
    let file = config
        .file_path
        .as_deref()
        .map(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map(Arc::new)
        })
        .transpose()?;

    Ok(match LogFormat::parse(&config.format) {
        LogFormat::Json => json_layer(file),
        LogFormat::Pretty => pretty_layer(file),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    fn parse(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// JSON format for production (structured logging)
fn json_layer(file: Option<Arc<File>>) -> BoxedLayer {
    let layer = fmt::layer()
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true)
        .with_target(true)
        .with_line_number(true)
        .with_file(true);

    match file {
        Some(file) => layer.with_writer(file).boxed(),
        None => layer.boxed(),
    }
}

/// Pretty format for development (human-readable)
fn pretty_layer(file: Option<Arc<File>>) -> BoxedLayer {
    let layer = fmt::layer()
        .pretty()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_line_number(true)
        .with_file(false);

    match file {
        Some(file) => layer.with_writer(file).boxed(),
        None => layer.boxed(),
    }
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
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
        assert!(parse_log_level("DEBUG").is_ok());
        assert!(parse_log_level("warning").is_ok());
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn test_log_format() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Pretty);
    }

    #[test]
    fn test_file_output_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authgate.log");
        let config = LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: Some(path.to_string_lossy().into_owned()),
        };
        assert!(output_layer(&config).is_ok());
        assert!(path.exists());
    }
}
