//! Logging setup shared by binaries and tests.

use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, FmtSubscriber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Install the global subscriber.
///
/// `RUST_LOG` directives take precedence over `level`. Errors if a global
/// subscriber is already set.
pub fn configure_global_logger(
    level: Level,
    format: LogFormat,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter(level))
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}

/// Install a subscriber writing through the test harness.
///
/// Safe to call from every test, only the first call has an effect.
pub fn configure_test_logger() {
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::ERROR))
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_twice() {
        configure_test_logger();
        configure_test_logger();
        tracing::error!("still logging");
    }

    #[test]
    fn global_logger_already_set() {
        configure_test_logger();
        assert!(configure_global_logger(Level::INFO, LogFormat::Json).is_err());
    }
}
