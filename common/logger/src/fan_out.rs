use crate::sink::{Sink, SinkKind};
use tracing::level_filters::LevelFilter;
use tracing::span;
use tracing::Event;
use tracing_subscriber::layer::Context;
use tracing_subscriber::{Layer, Registry};

/// A Layer that forwards every event to all its sinks,
/// each sink dropping the events below its own verbosity.
#[derive(Debug, Default)]
pub struct FanOut {
    sinks: Vec<Sink>,
}

impl FanOut {
    pub fn new(sinks: Vec<Sink>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn kinds(&self) -> Vec<SinkKind> {
        self.sinks.iter().map(Sink::kind).collect()
    }
}

impl Layer<Registry> for FanOut {
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            if sink.enables(event.metadata()) {
                sink.layer().on_event(event, ctx.clone());
            }
        }
    }

    // Recomputed by the reload handle every time the FanOut is replaced.
    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(
            self.sinks
                .iter()
                .map(|sink| sink.verbosity().level_filter())
                .max()
                .unwrap_or(LevelFilter::OFF),
        )
    }

    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_new_span(attrs, id, ctx.clone());
        }
    }

    fn on_record(&self, span: &span::Id, values: &span::Record<'_>, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_record(span, values, ctx.clone());
        }
    }

    fn on_follows_from(&self, span: &span::Id, follows: &span::Id, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_follows_from(span, follows, ctx.clone());
        }
    }

    fn on_enter(&self, id: &span::Id, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_enter(id, ctx.clone());
        }
    }

    fn on_exit(&self, id: &span::Id, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_exit(id, ctx.clone());
        }
    }

    fn on_close(&self, id: span::Id, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_close(id.clone(), ctx.clone());
        }
    }

    fn on_id_change(&self, old: &span::Id, new: &span::Id, ctx: Context<'_, Registry>) {
        for sink in &self.sinks {
            sink.layer().on_id_change(old, new, ctx.clone());
        }
    }
}
