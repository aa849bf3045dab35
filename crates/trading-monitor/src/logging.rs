//! Logging setup.

use std::path::Path;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};
use trading_core::error::{TradingError, TradingResult};

/// Console log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(TradingError::Config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Keeps the background log-file writer alive. Drop it last.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// Console output goes to stderr so that machine-readable results on stdout
/// stay clean. `RUST_LOG` takes precedence over `level`. With `file`, every
/// event is also written there through a non-blocking writer.
pub fn setup_logging(
    level: &str,
    format: LogFormat,
    file: Option<&Path>,
) -> TradingResult<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| TradingError::Config(format!("Invalid log level '{}': {}", level, e)))?;

    let console: BoxedLayer = match format {
        LogFormat::Pretty => fmt::layer().with_writer(std::io::stderr).pretty().boxed(),
        LogFormat::Json => fmt::layer().with_writer(std::io::stderr).json().boxed(),
    };
    let mut layers = vec![console];

    let mut guard = None;
    if let Some(path) = file {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| TradingError::Config(format!("Invalid log file: {}", path.display())))?;
        std::fs::create_dir_all(dir)?;

        let (writer, file_guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        layers.push(fmt::layer().with_ansi(false).with_writer(writer).boxed());
        guard = Some(file_guard);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| TradingError::Internal(format!("Logging already initialised: {}", e)))?;

    Ok(LoggingGuard { _file: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    // The only test that touches the global subscriber
    #[test]
    fn test_file_logging_and_single_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");

        let guard = setup_logging("info", LogFormat::Json, Some(&path)).unwrap();
        tracing::info!("hello");
        assert!(setup_logging("info", LogFormat::Pretty, None).is_err());
        drop(guard);

        assert!(path.exists());
    }
}
