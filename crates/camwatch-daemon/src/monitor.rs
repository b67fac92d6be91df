//! Monitor loop: one sequential tick at a time.
//!
//! Each tick obtains evidence, normalizes it, runs the transition detector
//! and dispatches any edge. Shutdown is checked at the top of every poll
//! iteration and raced against the blocking wait in both models.

use std::sync::Arc;
use std::time::Duration;

use camwatch_core::normalize::normalize;
use camwatch_core::transition::TransitionDetector;
use camwatch_core::types::{ActivityState, EdgeEvent, EdgeKind, RawEvidence};
use camwatch_notify::Dispatcher;
use camwatch_source::{ConsentStore, LogStream, SourceError, sample_consent_store};
use chrono::{Local, Utc};
use tokio_util::sync::CancellationToken;

use crate::adapter::{LineSource, SignalAdapter};
use crate::error::MonitorError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Sleep between consent-store samples. Unused by the stream model.
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Counters kept for the shutdown log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Samples taken or lines read.
    pub ticks: u64,
    /// Poll ticks dropped because sampling failed.
    pub skipped: u64,
    pub started: u64,
    pub stopped: u64,
}

impl MonitorStats {
    pub fn events(&self) -> u64 {
        self.started + self.stopped
    }
}

enum StreamStep {
    Shutdown,
    Line(Option<String>),
}

pub struct Monitor {
    dispatcher: Dispatcher,
    config: MonitorConfig,
    shutdown: CancellationToken,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(dispatcher: Dispatcher, config: MonitorConfig, shutdown: CancellationToken) -> Self {
        Self {
            dispatcher,
            config,
            shutdown,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// Drive `adapter` until shutdown (`Ok`) or a fatal source error.
    pub async fn run(&mut self, adapter: SignalAdapter) -> Result<(), MonitorError> {
        tracing::info!(adapter = adapter.kind().as_str(), "monitor running");
        match adapter {
            SignalAdapter::Poll(store) => self.run_poll(store).await,
            SignalAdapter::Stream(command) => {
                let mut stream = LogStream::spawn(&command)?;
                self.run_stream(&mut stream).await
            }
        }
    }

    /// Poll model. The first sample only seeds the stored state; a failed
    /// sample keeps the previous state for that tick.
    pub async fn run_poll<S>(&mut self, store: Arc<S>) -> Result<(), MonitorError>
    where
        S: ConsentStore + ?Sized + 'static,
    {
        let mut detector = TransitionDetector::new();
        let shutdown = self.shutdown.clone();

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let sampler = Arc::clone(&store);
            let sample =
                tokio::task::spawn_blocking(move || sample_consent_store(&*sampler)).await;
            self.stats.ticks += 1;

            match sample {
                Ok(Ok(records)) => {
                    tracing::debug!(records = records.len(), "consent store sampled");
                    self.observe(&mut detector, RawEvidence::Snapshot(records))
                        .await;
                }
                Ok(Err(e)) if e.is_fatal() => {
                    tracing::error!("consent store unusable: {e}");
                    return Err(e.into());
                }
                Ok(Err(e)) => {
                    self.stats.skipped += 1;
                    tracing::warn!("error checking consent store, keeping previous state: {e}");
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    tracing::warn!("consent store sample task failed: {e}");
                }
            }

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("poll monitor stopped");
        Ok(())
    }

    /// Stream model. Starts from `Idle`; the end of the stream is fatal.
    pub async fn run_stream<L>(&mut self, lines: &mut L) -> Result<(), MonitorError>
    where
        L: LineSource + ?Sized,
    {
        let mut detector = TransitionDetector::seeded(ActivityState::Idle);
        let shutdown = self.shutdown.clone();

        loop {
            let step = tokio::select! {
                biased;
                () = shutdown.cancelled() => StreamStep::Shutdown,
                line = lines.next_line() => StreamStep::Line(line),
            };

            match step {
                StreamStep::Shutdown => {
                    release(lines).await;
                    return Ok(());
                }
                StreamStep::Line(Some(line)) => {
                    self.stats.ticks += 1;
                    self.observe(&mut detector, RawEvidence::Line(line)).await;
                }
                // An interrupt also reaches the child's process group, so the
                // stream can end just before the cancellation is observed.
                StreamStep::Line(None) if shutdown.is_cancelled() => {
                    release(lines).await;
                    return Ok(());
                }
                StreamStep::Line(None) => {
                    let status = lines.closed_status().await;
                    tracing::error!(%status, "log stream ended");
                    return Err(SourceError::StreamClosed { status }.into());
                }
            }
        }
    }

    async fn observe(&mut self, detector: &mut TransitionDetector, evidence: RawEvidence) {
        let Some(current) = normalize(&evidence) else {
            return;
        };
        let detail = match evidence {
            RawEvidence::Line(line) => Some(line.trim().to_string()),
            RawEvidence::Snapshot(_) => None,
        };
        let Some(event) = detector.observe(current, Utc::now(), detail) else {
            return;
        };

        log_edge(&event);
        match event.kind {
            EdgeKind::Started => self.stats.started += 1,
            EdgeKind::Stopped => self.stats.stopped += 1,
        }

        let report = self.dispatcher.dispatch(&event).await;
        tracing::debug!(
            kind = %event.kind,
            delivered = report.delivered.len(),
            failed = report.failed.len(),
            "event dispatched"
        );
    }
}

async fn release<L: LineSource + ?Sized>(lines: &mut L) {
    if let Err(e) = lines.shutdown().await {
        tracing::warn!("failed to stop log stream: {e}");
    }
    tracing::info!("stream monitor stopped");
}

fn log_edge(event: &EdgeEvent) {
    let at = event.occurred_at.with_timezone(&Local).format("%H:%M:%S");
    match event.kind {
        EdgeKind::Started => tracing::info!("webcam STARTED - {at}"),
        EdgeKind::Stopped => tracing::info!("webcam STOPPED - {at}"),
    }
}
