use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::subscriber::set_global_default;
use tracing::{info, Subscriber};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::{reload, Registry};

pub mod config;
pub mod fan_out;
pub mod rotation;
pub mod sink;
pub mod verbosity;

#[cfg(test)]
mod test_util;

#[doc(hidden)]
pub use tracing;

pub use fan_out::FanOut;
pub use rotation::RotationPolicy;
pub use sink::{SinkKind, TerminalOutput};
pub use verbosity::Verbosity;

use sink::Sink;

/// The subscriber controlled by a [`LogRoot`].
pub type LogRootSubscriber = Layered<reload::Layer<FanOut, Registry>, Registry>;

/// Defines which sinks the log root writes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRootSettings {
    /// Whether the log root writes human readable lines to the standard output.
    pub use_terminal: bool,

    /// Whether the log root writes JSON records to the rotating file at `file_path`.
    pub use_file: bool,

    /// Minimum severity written to the terminal.
    /// Valid values: 0 (crit), 1 (error), 2 (warn), 3 (info), 4 (debug), 5 (trace)
    pub verbosity_terminal: Verbosity,

    /// Minimum severity written to the file. Same values as `verbosity_terminal`.
    pub verbosity_file: Verbosity,

    /// Path of the rotating file. A bare file name is placed in the current directory.
    pub file_path: String,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

impl LogRootSettings {
    pub fn new<P: Into<String>>(
        use_terminal: bool,
        use_file: bool,
        verbosity_terminal: Verbosity,
        verbosity_file: Verbosity,
        file_path: P,
    ) -> Self {
        Self {
            use_terminal,
            use_file,
            verbosity_terminal,
            verbosity_file,
            file_path: file_path.into(),
            rotation: RotationPolicy::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("LoggerConfigurationError: [{message}]")]
    LoggerConfigurationError { message: String },
    #[error("LoggerRuntimeError: [{message}]")]
    LoggerRuntimeError { message: String },
}

impl From<log::SetLoggerError> for LoggerError {
    fn from(error: log::SetLoggerError) -> Self {
        LoggerError::LoggerConfigurationError { message: format!("{}", error) }
    }
}

impl From<std::io::Error> for LoggerError {
    fn from(error: std::io::Error) -> Self {
        LoggerError::LoggerConfigurationError { message: format!("{}", error) }
    }
}

/// Handle to the logging root of a subscriber.
///
/// Clones share the same root. Every [`LogRoot::configure`] call replaces the installed sinks.
#[derive(Clone)]
pub struct LogRoot {
    inner: Arc<LogRootInner>,
}

struct LogRootInner {
    reload_handle: reload::Handle<FanOut, Registry>,
    terminal_output: TerminalOutput,
    settings: ArcSwapOption<LogRootSettings>,
    configure_lock: Mutex<()>,
}

impl LogRoot {
    /// Creates a subscriber with no sinks and the LogRoot that controls it.
    /// The subscriber is not installed; see [`setup_log_root`] for the process-wide setup.
    pub fn new(terminal_output: TerminalOutput) -> (Self, LogRootSubscriber) {
        let (reloadable_fan_out, reload_handle) = reload::Layer::new(FanOut::default());
        let subscriber = tracing_subscriber::registry().with(reloadable_fan_out);

        let log_root = LogRoot {
            inner: Arc::new(LogRootInner {
                reload_handle,
                terminal_output,
                settings: ArcSwapOption::empty(),
                configure_lock: Mutex::new(()),
            }),
        };
        (log_root, subscriber)
    }

    /// Replaces the sinks of the log root with the ones enabled by `settings`.
    ///
    /// If a sink cannot be built the error is returned and the previous configuration stays active.
    pub fn configure(&self, settings: &LogRootSettings) -> Result<(), LoggerError> {
        let _lock = self.inner.configure_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut sinks = Vec::with_capacity(2);
        if settings.use_terminal {
            sinks.push(Sink::terminal(&self.inner.terminal_output, settings.verbosity_terminal));
        }
        if settings.use_file {
            sinks.push(Sink::file(
                &settings.file_path,
                settings.verbosity_file,
                &settings.rotation,
            )?);
        }

        // The replaced sinks are dropped here, which flushes their writers.
        self.inner.reload_handle.reload(FanOut::new(sinks)).map_err(|err| {
            LoggerError::LoggerRuntimeError {
                message: format!("Cannot reload the logger configuration. err: {:?}", err),
            }
        })?;
        self.inner.settings.store(Some(Arc::new(settings.clone())));

        info!(
            terminal = settings.use_terminal,
            file = settings.use_file,
            terminal_verbosity = settings.verbosity_terminal.ordinal(),
            file_verbosity = settings.verbosity_file.ordinal(),
            file_path = %settings.file_path,
            "Set log root"
        );
        Ok(())
    }

    /// Returns the settings of the last successful [`LogRoot::configure`] call.
    pub fn settings(&self) -> Option<Arc<LogRootSettings>> {
        self.inner.settings.load_full()
    }

    /// Returns the kinds of the installed sinks, the terminal one first.
    ///
    /// Fails if the subscriber returned by [`LogRoot::new`] has been dropped.
    pub fn active_sinks(&self) -> Result<Vec<SinkKind>, LoggerError> {
        self.inner.reload_handle.with_current(FanOut::kinds).map_err(|err| {
            LoggerError::LoggerRuntimeError {
                message: format!("Cannot read the logger configuration. err: {:?}", err),
            }
        })
    }
}

/// Configures the process-wide logger and activates it.
///
/// The returned [`LogRoot`] can be passed around to reconfigure the logger later on.
/// It fails if a global logger is already installed.
pub fn setup_log_root(settings: &LogRootSettings) -> Result<LogRoot, LoggerError> {
    let (log_root, subscriber) = LogRoot::new(TerminalOutput::stdout());
    set_global_logger(subscriber)?;
    log_root.configure(settings)?;
    Ok(log_root)
}

fn set_global_logger<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    tracing_log::LogTracer::init().map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!("Cannot start the logger LogTracer. err: {:?}", err),
    })?;
    set_global_default(subscriber).map_err(|err| LoggerError::LoggerConfigurationError {
        message: format!("Cannot start the logger. err: {:?}", err),
    })
}
