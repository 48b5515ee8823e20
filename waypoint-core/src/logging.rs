//! Logging setup for applications embedding the router.
//!
//! The router itself only emits `tracing` events: bind and unbind summaries
//! at `info`, conflicts and skipped routes at `warn`, lookups and
//! negotiation outcomes at `debug` and `trace`. This module installs a
//! subscriber for them.
//!
//! ```no_run
//! use waypoint_core::logging::*;
//!
//! let _guard = LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Compact)
//!     .output(LogOutput::Stderr)
//!     .init()
//!     .expect("logging");
//!
//! info!("router ready");
//! ```

use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use tracing::{debug, error, info, trace, warn};

/// Failure to install the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open log file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(String),

    #[error("unknown {kind}: {value}")]
    Unknown { kind: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(LogError::Unknown {
                kind: "log level",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Structured, one JSON object per line
    #[default]
    Json,
    Plain,
    /// Multi-line, for development
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "plain" | "text" => Ok(LogFormat::Plain),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(LogError::Unknown {
                kind: "log format",
                value: s.to_string(),
            }),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to a file
    File(String),
}

/// Subscriber settings, built fluently and installed with [`LogConfig::init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub thread_ids: bool,
    /// Include the module path of each event
    pub targets: bool,
    pub file_line: bool,
    /// ANSI colors; ignored by the JSON format
    pub colors: bool,
    /// Directive string such as `waypoint_core=trace`. Overrides `level`.
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_file_line(mut self, enable: bool) -> Self {
        self.file_line = enable;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The filter in effect: the explicit directive if set, then `RUST_LOG`,
    /// then the configured level.
    pub fn filter(&self) -> Result<EnvFilter, LogError> {
        match &self.env_filter {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|e| LogError::Filter(e.to_string()))
            }
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))),
        }
    }

    /// Install the global subscriber.
    ///
    /// Writes go through a non-blocking writer; keep the returned guard
    /// alive until shutdown so buffered lines are flushed.
    pub fn init(self) -> Result<WorkerGuard, LogError> {
        let filter = self.filter()?;

        let (writer, guard) = match &self.output {
            LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
            LogOutput::Stderr => tracing_appender::non_blocking(io::stderr()),
            LogOutput::File(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                tracing_appender::non_blocking(file)
            }
        };

        self.install(writer, filter)?;
        Ok(guard)
    }

    fn install<W>(&self, writer: W, filter: EnvFilter) -> Result<(), LogError>
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let base = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(self.targets)
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_line)
            .with_line_number(self.file_line);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            LogFormat::Json => base.json().with_ansi(false).boxed(),
            LogFormat::Plain => base.with_ansi(self.colors).boxed(),
            LogFormat::Pretty => base.pretty().with_ansi(self.colors).boxed(),
            LogFormat::Compact => base
                .compact()
                .with_file(false)
                .with_line_number(false)
                .with_ansi(self.colors)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .map_err(|e| LogError::AlreadyInstalled(e.to_string()))
    }
}

impl Default for LogConfig {
    /// JSON to stdout at `info`
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            thread_ids: false,
            targets: true,
            file_line: false,
            colors: false,
            env_filter: None,
        }
    }
}
