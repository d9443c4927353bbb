//! Logging setup over `tracing-subscriber`.
//!
//! Console output goes to stdout or stderr. File output writes two rotated
//! files into the configured log directory: `debug.log` receives everything
//! from `debug` up, `info.log` everything from `info` up. Both sinks apply the
//! same per-target filters, which by default quiet the network crates.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use discorrecd_runtime::config::ConfigLoader;
//! use discorrecd_runtime::logging;
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use discorrecd_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("discorrecd_core=trace")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LogRotation, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// File receiving everything from `debug` up.
pub const DEBUG_LOG_FILE: &str = "debug.log";

/// File receiving everything from `info` up.
pub const INFO_LOG_FILE: &str = "info.log";

/// Span event configuration for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanEvents {
    /// Log when a span is created.
    pub new: bool,
    /// Log when a span is entered.
    pub enter: bool,
    /// Log when a span is exited.
    pub exit: bool,
    /// Log when a span is closed.
    pub close: bool,
}

impl SpanEvents {
    /// No span events will be logged.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Log span creation and close events.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Log all span events.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        let mut span = fmt::format::FmtSpan::NONE;
        if self.new {
            span |= fmt::format::FmtSpan::NEW;
        }
        if self.enter {
            span |= fmt::format::FmtSpan::ENTER;
        }
        if self.exit {
            span |= fmt::format::FmtSpan::EXIT;
        }
        if self.close {
            span |= fmt::format::FmtSpan::CLOSE;
        }
        span
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

// =============================================================================
// Configuration-Based Initialization
// =============================================================================

/// Initialize logging from a [`LoggingConfig`].
///
/// Uses `try_init`, so calling it when a global subscriber is already set is
/// harmless.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// A builder for configuring logging.
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: tracing::Level,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    rotation: LogRotation,
    log_dir: Option<PathBuf>,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    /// Create a new logging builder: compact lines on stdout at `info`.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: tracing::Level::INFO,
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            rotation: LogRotation::Daily,
            log_dir: None,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
        }
    }

    /// Create a builder from a [`LoggingConfig`].
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new()
            .with_level(config.level.to_tracing_level())
            .format(config.format)
            .output(config.output)
            .rotation(config.rotation)
            .log_dir(config.directory.clone())
            .span_events(SpanEvents::from(&config.span_events))
            .with_thread_ids(config.thread_ids)
            .with_file(config.file_location)
            .with_line_number(config.file_location);

        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));
        for (target, level) in filters {
            builder = builder.directive(&format!("{target}={}", level.as_str()));
        }

        builder
    }

    /// Set the console log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Add a filter directive such as `discorrecd_core=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    /// Configure span events.
    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    /// Set the output format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Set the rotation period of log files.
    pub fn rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the directory log files are written to.
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Include the target (module path) in log output.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Include thread IDs in log output.
    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    /// Include file names in log output.
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    /// Include line numbers in log output.
    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    /// Builds a filter at `level` plus the configured directives.
    ///
    /// `RUST_LOG` replaces the base level of the console sink only.
    fn build_filter(&self, level: tracing::Level, from_env: bool) -> EnvFilter {
        let base = level.to_string().to_lowercase();
        let mut filter = if from_env {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base))
        } else {
            EnvFilter::new(&base)
        };

        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => {
                    warn!(directive = %directive, error = %e, "Ignoring invalid log directive")
                }
            }
        }

        filter
    }

    fn fmt_layer<W>(&self, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_span_events(self.span_events.to_fmt_span())
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids)
            .with_file(self.with_file)
            .with_line_number(self.with_line_number);

        match self.format {
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().with_filter(filter).boxed(),
            LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
            LogFormat::Full => layer.with_filter(filter).boxed(),
            LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
        }
    }

    fn appender(&self, dir: &Path, file_name: &str) -> RollingFileAppender {
        match self.rotation {
            LogRotation::Never => rolling::never(dir, file_name),
            LogRotation::Hourly => rolling::hourly(dir, file_name),
            LogRotation::Daily => rolling::daily(dir, file_name),
        }
    }

    fn file_layers(&self, dir: &Path) -> Vec<BoxedLayer> {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(
                dir = %dir.display(),
                error = %e,
                "Cannot create log directory, file output disabled"
            );
            return Vec::new();
        }

        [
            (DEBUG_LOG_FILE, tracing::Level::DEBUG),
            (INFO_LOG_FILE, tracing::Level::INFO),
        ]
        .into_iter()
        .map(|(name, level)| {
            let filter = self.build_filter(level, false);
            self.fmt_layer(self.appender(dir, name), false, filter)
        })
        .collect()
    }

    /// Assembles the configured sinks without installing them.
    fn layers(&self) -> Vec<BoxedLayer> {
        let mut layers = Vec::new();

        match self.output {
            LogOutput::Stdout | LogOutput::Both => {
                layers.push(self.fmt_layer(std::io::stdout, true, self.build_filter(self.level, true)));
            }
            LogOutput::Stderr => {
                layers.push(self.fmt_layer(std::io::stderr, true, self.build_filter(self.level, true)));
            }
            LogOutput::File => {}
        }

        if self.output.writes_files() {
            match &self.log_dir {
                Some(dir) => layers.extend(self.file_layers(dir)),
                None => warn!("File output requested but no log directory configured"),
            }
        }

        if layers.is_empty() {
            layers.push(self.fmt_layer(std::io::stdout, true, self.build_filter(self.level, true)));
        }

        layers
    }

    /// Initialize the logging system, ignoring an already installed subscriber.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Try to initialize the logging system, returning an error on failure.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry().with(self.layers()).try_init()
    }
}
