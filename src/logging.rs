use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level for console output
    pub console_level: Level,
    /// Log level for file output
    pub file_level: Level,
    /// Directory for daily rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Whether to enable JSON formatted logs for structured output
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: Level::INFO,
            file_level: Level::DEBUG,
            log_dir: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Override log levels from environment
        if let Some(level) = lookup("AUTOLABEL_LOG_LEVEL") {
            if let Ok(parsed_level) = level.parse::<Level>() {
                config.console_level = parsed_level;
                config.file_level = parsed_level;
            }
        }

        if let Some(log_dir) = lookup("AUTOLABEL_LOG_DIR").filter(|dir| !dir.is_empty()) {
            config.log_dir = Some(PathBuf::from(log_dir));
        }

        // Enable JSON format for structured logging
        if lookup("AUTOLABEL_JSON_LOGS").is_some() {
            config.json_format = true;
        }

        config
    }
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Initialize the logging system with the given configuration.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the lifetime of the process.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let mut layers = vec![];
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "autolabel.log");
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(filter(config.file_level))
                .boxed()
        } else {
            fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter(config.file_level))
                .boxed()
        };

        layers.push(file_layer);
    }

    let console_layer = if config.json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter(config.console_level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_filter(filter(config.console_level))
            .boxed()
    };
    layers.push(console_layer);

    tracing_subscriber::registry().with(layers).try_init()?;

    Ok(guard)
}
