//! Edge-event fan-out to the registered sinks.
//!
//! Sinks run one after another in registration order. A failing sink is
//! logged and recorded in the [`DispatchReport`]; the remaining sinks still
//! run and nothing propagates to the monitor loop.

use camwatch_core::types::EdgeEvent;

use crate::sink::Sink;

// ─── Dispatch Report ─────────────────────────────────────────────

/// Outcome of one dispatch, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Names of sinks that delivered the event.
    pub delivered: Vec<&'static str>,
    /// `(sink name, error message)` for every sink that failed.
    pub failed: Vec<(&'static str, String)>,
}

// ─── Dispatcher ──────────────────────────────────────────────────

#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Register a sink. Registration order is invocation order.
    pub fn push(&mut self, sink: impl Sink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    #[must_use]
    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.push(sink);
        self
    }

    /// Register `sink` when present; an absent optional sink is not an error.
    #[must_use]
    pub fn with_optional_sink<S: Sink + 'static>(mut self, sink: Option<S>) -> Self {
        if let Some(sink) = sink {
            self.push(sink);
        }
        self
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver `event` to every sink.
    pub async fn dispatch(&self, event: &EdgeEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in &self.sinks {
            match sink.notify(event).await {
                Ok(()) => report.delivered.push(sink.name()),
                Err(e) => {
                    tracing::warn!(sink = sink.name(), kind = %event.kind, "notify failed: {e}");
                    report.failed.push((sink.name(), e.to_string()));
                }
            }
        }

        report
    }
}

// ─── Tests ───────────────────────────────────────────────────────
