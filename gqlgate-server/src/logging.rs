//! Tracing subscriber setup

use anyhow::{Context, Result};
use gqlgate_config::{LogFormat, LoggingConfig};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Calling this again after a subscriber is installed is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    let writer = match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path))?;
            BoxMakeWriter::new(Arc::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(config.file_path.is_none())
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Text => base.boxed(),
    };

    // Use try_init to avoid panic if global subscriber already set
    if tracing_subscriber::registry().with(layer).with(filter).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_harmless() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let config = LoggingConfig {
            file_path: Some("/nonexistent-dir/gqlgate/server.log".to_string()),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
