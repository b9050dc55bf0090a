//! Contextual structured logger.
//!
//! # Data Flow
//! ```text
//! root Logger (sink + format)
//!     → with / with_key_value / with_map   (new Logger, copied context)
//!     → log / logf / log_error / log_errorf (terminal call)
//!         → capture caller frames at the call site
//!         → resolve fields: ts, level, context, caller_N, msg[, error]
//!         → Format::render
//!         → Sink::write_line (one lock per line)
//! ```
//!
//! # Design Decisions
//! - Loggers are immutable values; decorating returns a new one
//! - Later keys override earlier ones, `level` included
//! - Caller frames are captured at emission, never while building context
//! - Sink failures are reported through `tracing`, never to the caller
//! - `fatal()` is only a label; exiting is the host's decision

pub mod caller;
pub mod context;
pub mod error;
pub mod format;
pub mod sink;

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

pub use self::caller::{capture_frames, Frame};
pub use self::context::{Context, Field, Level, MISSING_VALUE};
pub use self::error::{BoxError, Error};
pub use self::format::Format;
pub use self::sink::{SharedBuffer, Sink};

use self::context::pair_up;
use crate::config::{LogConfig, LogOutput};

/// An immutable, cheaply cloneable logger carrying accumulated context.
#[derive(Clone)]
pub struct Logger {
    sink: Option<Arc<Sink>>,
    format: Format,
    context: Context,
    caller_depth: usize,
}

impl Logger {
    /// Logger writing `format` lines to `writer`.
    pub fn new<W>(writer: W, format: Format) -> Self
    where
        W: std::io::Write + Send + 'static,
    {
        Self::with_sink(Arc::new(Sink::new(writer)), format)
    }

    /// Logger writing to an existing shared sink.
    pub fn with_sink(sink: Arc<Sink>, format: Format) -> Self {
        Self {
            sink: Some(sink),
            format,
            context: Context::new(),
            caller_depth: 1,
        }
    }

    /// Logfmt lines on stdout.
    pub fn new_default() -> Self {
        Self::with_sink(Arc::new(Sink::stdout()), Format::Logfmt)
    }

    /// JSON lines on stdout.
    pub fn json() -> Self {
        Self::with_sink(Arc::new(Sink::stdout()), Format::Json)
    }

    /// Discards everything.
    pub fn nop() -> Self {
        Self {
            sink: None,
            format: Format::Nop,
            context: Context::new(),
            caller_depth: 1,
        }
    }

    /// Logfmt lines captured in memory.
    pub fn buffer() -> (SharedBuffer, Self) {
        let buffer = SharedBuffer::new();
        let logger = Self::new(buffer.clone(), Format::Logfmt);
        (buffer, logger)
    }

    pub fn from_config(config: &LogConfig) -> Self {
        let logger = match (config.format, config.output) {
            (Format::Nop, _) => Self::nop(),
            (format, LogOutput::Stdout) => Self::with_sink(Arc::new(Sink::stdout()), format),
            (format, LogOutput::Stderr) => Self::with_sink(Arc::new(Sink::stderr()), format),
        };
        logger.with_caller_depth(config.caller_depth)
    }

    /// Number of `caller_N` fields emitted per line. Zero omits them all,
    /// including `caller_0`.
    pub fn with_caller_depth(&self, depth: usize) -> Logger {
        Logger {
            caller_depth: depth.min(caller::MAX_DEPTH),
            ..self.clone()
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn with(&self, level: Level) -> Logger {
        self.derive(self.context.with_level(level))
    }

    /// Merges a flat `key, value, key, value, ...` sequence.
    ///
    /// A trailing key without a value renders as `key=(MISSING)`.
    pub fn with_key_value<I, S>(&self, pairs: I) -> Logger
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.derive(self.context.merged(pair_up(pairs)))
    }

    pub fn with_map<I, K, V>(&self, map: I) -> Logger
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        let fields = map
            .into_iter()
            .map(|(k, v)| Field::new(k, v.to_string()));
        self.derive(self.context.merged(fields))
    }

    pub fn debug(&self) -> Logger {
        self.with(Level::Debug)
    }

    pub fn info(&self) -> Logger {
        self.with(Level::Info)
    }

    pub fn warn(&self) -> Logger {
        self.with(Level::Warn)
    }

    pub fn error(&self) -> Logger {
        self.with(Level::Error)
    }

    pub fn fatal(&self) -> Logger {
        self.with(Level::Fatal)
    }

    #[track_caller]
    pub fn log(&self, message: &str) {
        self.emit(vec![Field::new("msg", message)]);
    }

    #[track_caller]
    pub fn logf(&self, args: fmt::Arguments<'_>) {
        self.emit(vec![Field::new("msg", args.to_string())]);
    }

    /// Logs `message` and returns the error to propagate.
    ///
    /// Without `err` the result is an [`Error::Message`] with `message` as
    /// its text. Otherwise `err` is returned unchanged inside
    /// [`Error::Other`]. The line carries `msg=<message>` and
    /// `error=<resolved error text>`.
    #[track_caller]
    pub fn log_error<E>(&self, message: &str, err: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        let resolved = match err {
            Some(err) => Error::Other(err.into()),
            None => Error::Message(message.to_string()),
        };
        self.emit(vec![
            Field::new("msg", message),
            Field::new("error", resolved.to_string()),
        ]);
        resolved
    }

    /// Wraps `err` with `template`, logs the combined text and returns it.
    ///
    /// The first `{}` in `template` is replaced with the error text; with no
    /// placeholder the result is `template: err`. Both `msg` and `error`
    /// carry the combined text and the result's `source()` is `err`.
    #[track_caller]
    pub fn log_errorf<E>(&self, template: &str, err: E) -> Error
    where
        E: StdError + Send + Sync + 'static,
    {
        let message = error::wrap_message(template, &err);
        self.emit(vec![
            Field::new("msg", message.clone()),
            Field::new("error", message.clone()),
        ]);
        Error::Wrapped {
            message,
            source: Box::new(err),
        }
    }

    fn derive(&self, context: Context) -> Logger {
        Logger {
            sink: self.sink.clone(),
            format: self.format,
            context,
            caller_depth: self.caller_depth,
        }
    }

    #[track_caller]
    fn emit(&self, terminal: Vec<Field>) {
        let Some(sink) = &self.sink else {
            return;
        };
        if self.format == Format::Nop {
            return;
        }

        let frames = capture_frames(0, self.caller_depth);
        let fields = self.resolve(&frames, terminal);
        let Some(line) = self.format.render(&fields) else {
            return;
        };
        if let Err(err) = sink.write_line(line.as_bytes()) {
            tracing::warn!(target: "service_base::log", error = %err, "dropping log line");
        }
    }

    fn resolve(&self, frames: &[Frame], terminal: Vec<Field>) -> Vec<Field> {
        let callers = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| Field::new(format!("caller_{i}"), frame.to_string()));
        // ts and level lead the line; anything later overrides their values.
        let defaults = [
            Field::new("ts", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            Field::new(context::LEVEL_KEY, Level::Info.as_str()),
        ];
        Context::new()
            .merged(defaults)
            .merged(self.context.fields().iter().cloned())
            .merged(callers)
            .merged(terminal)
            .into_fields()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("format", &self.format)
            .field("context", &self.context)
            .field("caller_depth", &self.caller_depth)
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new_default()
    }
}

/// `logf!(logger, "fmt", args...)` is `logger.logf(format_args!(...))`.
#[macro_export]
macro_rules! logf {
    ($logger:expr, $($arg:tt)+) => {
        $logger.logf(format_args!($($arg)+))
    };
}
