//! Logging setup for the Powermis reader
//!
//! Console output (pretty or JSONL) and optional JSONL file output with
//! rotation, filtered by `RUST_LOG` or the configured default level.
//!
//! # Quick Start
//!
//! ```ignore
//! use powermis_logging::{LogConfig, ReaderSubscriberBuilder};
//!
//! // Pretty console output at info
//! ReaderSubscriberBuilder::new().init()?;
//!
//! // JSONL to ./logs, keep the guard alive until exit
//! let _guard = ReaderSubscriberBuilder::new()
//!     .with_config(LogConfig::production("./logs".into()))
//!     .init()?;
//! ```

pub mod config;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log appender error: {0}")]
    Appender(String),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

pub type LogResult<T> = Result<T, LogError>;

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync + 'static>;

/// Builder for configuring and installing the global subscriber
pub struct ReaderSubscriberBuilder {
    config: LogConfig,
}

impl ReaderSubscriberBuilder {
    /// Builder with [`LogConfig::default`]
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally.
    ///
    /// Returns the file writer guard when file output is enabled; keep it
    /// alive for the duration of the program or buffered lines are lost.
    pub fn init(self) -> LogResult<Option<WorkerGuard>> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level));

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.console.enabled {
            layers.push(self.console_layer());
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(self.jsonl_layer(writer));
        }

        Registry::default()
            .with(env_filter)
            .with(layers)
            .try_init()
            .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

        Ok(guard)
    }

    fn console_layer(&self) -> BoxedLayer {
        if self.config.console.pretty {
            tracing_subscriber::fmt::layer()
                .with_ansi(self.config.console.ansi)
                .with_target(true)
                .boxed()
        } else {
            let jsonl = &self.config.jsonl;
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(jsonl.include_spans)
                .flatten_event(jsonl.flatten_events)
                .with_file(jsonl.include_location)
                .with_line_number(jsonl.include_location)
                .boxed()
        }
    }

    fn jsonl_layer(&self, writer: NonBlocking) -> BoxedLayer {
        let jsonl = &self.config.jsonl;
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(jsonl.include_spans)
            .flatten_event(jsonl.flatten_events)
            .with_file(jsonl.include_location)
            .with_line_number(jsonl.include_location)
            .with_writer(writer)
            .boxed()
    }
}

impl Default for ReaderSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking writer for the configured log file.
///
/// `Never` truncates a single `<prefix>.log`; the others roll over.
fn file_writer(config: &FileConfig) -> LogResult<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&config.directory)?;

    let rotation = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            let file = File::create(&path)?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .filename_suffix("log")
        .build(&config.directory)
        .map_err(|e| LogError::Appender(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Pretty console output at info
pub fn init_default() -> LogResult<()> {
    ReaderSubscriberBuilder::new().init().map(|_| ())
}

/// Pretty, colored console output at debug
pub fn init_development() -> LogResult<()> {
    ReaderSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
        .map(|_| ())
}

/// Warnings only. Safe to call from every test.
pub fn init_testing() {
    let _ = ReaderSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}
