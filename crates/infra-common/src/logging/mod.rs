//! Logging setup for peercall applications.
//!
//! Thin configuration layer over `tracing-subscriber`: pick a level, choose
//! plain or JSON output, and call [`setup_logging`] once at startup. All
//! peercall crates emit through the `tracing` macros and inherit whatever the
//! embedding application installs here.

use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Errors from logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),
    #[error("a global subscriber is already installed")]
    AlreadyInitialized,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// The log level to use.
    pub level: Level,
    /// Whether to enable JSON formatting.
    pub json: bool,
    /// Whether to include file and line information.
    pub file_info: bool,
    /// Whether to log spans.
    pub log_spans: bool,
    /// Application name to include in logs.
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
            app_name: "peercall".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration.
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Enable JSON formatting.
    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Enable file and line information in logs.
    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    /// Enable span logging.
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }
}

/// Set up the logging system with the provided configuration.
pub fn setup_logging(config: LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let span_events = if config.log_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        subscriber
            .with_writer(std::io::stdout)
            .json()
            .try_init()
            .is_ok()
    } else {
        subscriber.try_init().is_ok()
    };

    if installed {
        tracing::info!("logging initialized for {}", config.app_name);
        Ok(())
    } else {
        Err(LoggingError::AlreadyInitialized)
    }
}

/// Parse a log level from a string.
pub fn parse_log_level(level: &str) -> Result<Level, LoggingError> {
    Level::from_str(level).map_err(|_| LoggingError::InvalidLevel(level.to_string()))
}
