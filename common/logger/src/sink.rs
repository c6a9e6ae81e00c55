use crate::rotation::{RotatingFile, RotationPolicy};
use crate::verbosity::Verbosity;
use crate::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, Metadata};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{Layer, Registry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SinkKind {
    Terminal,
    File,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Terminal => f.write_str("terminal"),
            SinkKind::File => f.write_str("file"),
        }
    }
}

type TerminalWriterFactory = dyn Fn() -> (BoxMakeWriter, Option<WorkerGuard>) + Send + Sync;

/// Where the terminal sink writes to.
#[derive(Clone)]
pub struct TerminalOutput {
    make_writer: Arc<TerminalWriterFactory>,
    ansi: bool,
}

impl TerminalOutput {
    /// Writes to the standard output through a non-blocking writer.
    /// Output is colorized when the standard output is a terminal.
    pub fn stdout() -> Self {
        Self {
            make_writer: Arc::new(|| {
                let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
                (BoxMakeWriter::new(non_blocking), Some(guard))
            }),
            ansi: std::io::stdout().is_terminal(),
        }
    }

    /// Writes plain text to the given writer.
    pub fn writer<M>(make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    {
        Self {
            make_writer: Arc::new(move || (BoxMakeWriter::new(make_writer.clone()), None)),
            ansi: false,
        }
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        TerminalOutput::stdout()
    }
}

impl fmt::Debug for TerminalOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalOutput").field("ansi", &self.ansi).finish()
    }
}

/// An output destination with its own verbosity threshold.
///
/// The sink owns the guard of its background writer: dropping the sink flushes it.
pub struct Sink {
    kind: SinkKind,
    verbosity: Verbosity,
    layer: Box<dyn Layer<Registry> + Send + Sync>,
    _guard: Option<WorkerGuard>,
}

impl Sink {
    /// Builds the human readable sink, one line per event.
    pub fn terminal(output: &TerminalOutput, verbosity: Verbosity) -> Self {
        let (make_writer, guard) = (output.make_writer)();
        let layer = tracing_subscriber::fmt::layer().with_ansi(output.ansi).with_writer(make_writer);
        Self { kind: SinkKind::Terminal, verbosity, layer: Box::new(layer), _guard: guard }
    }

    /// Builds the rotating file sink, one JSON record per event.
    pub fn file(
        file_path: &str,
        verbosity: Verbosity,
        policy: &RotationPolicy,
    ) -> Result<Self, LoggerError> {
        let rotating_file = RotatingFile::open(file_path, policy.clone())?;
        debug!("Sink - open log file [{}] with rotation policy {:?}", file_path, policy);

        let (non_blocking, guard) = tracing_appender::non_blocking(rotating_file);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_ansi(false)
            .with_writer(non_blocking);

        Ok(Self { kind: SinkKind::File, verbosity, layer: Box::new(layer), _guard: Some(guard) })
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn enables(&self, metadata: &Metadata<'_>) -> bool {
        self.verbosity.enables(metadata)
    }

    pub(crate) fn layer(&self) -> &(dyn Layer<Registry> + Send + Sync) {
        self.layer.as_ref()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("kind", &self.kind).field("verbosity", &self.verbosity).finish()
    }
}
