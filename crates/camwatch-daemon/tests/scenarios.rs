//! End-to-end monitor scenarios: scripted sources in, sink calls out.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use camwatch_core::types::{ConsumerGroup, EdgeEvent, EdgeKind};
use camwatch_daemon::{LineSource, Monitor, MonitorConfig, MonitorError, SignalAdapter};
use camwatch_notify::{
    AudioAlertSink, Dispatcher, RemotePushConfig, RemotePushSink, Sink, SinkError, TonePlayer,
};
use camwatch_source::{ConsentStore, SourceError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_PRIVATE_KEY: &str = include_str!("../../camwatch-notify/tests/fixtures/test_rsa_key.pem");

// ─── Stub sinks ─────────────────────────────────────────────────────

type EventLog = Arc<Mutex<Vec<EdgeKind>>>;

struct RecordingSink {
    name: &'static str,
    log: EventLog,
}

#[async_trait]
impl Sink for RecordingSink {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn notify(&self, event: &EdgeEvent) -> Result<(), SinkError> {
        self.log.lock().unwrap().push(event.kind);
        Ok(())
    }
}

struct FailingSink {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Sink for FailingSink {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn notify(&self, _event: &EdgeEvent) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Playback("always fails".into()))
    }
}

#[derive(Default)]
struct CountingPlayer {
    plays: AtomicUsize,
}

impl TonePlayer for CountingPlayer {
    fn play(&self) -> Result<(), SinkError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ─── Scripted consent store ─────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Tick {
    Inactive,
    PackagedActive,
    NonPackagedActive,
    Fails,
}

/// One `Tick` per sample; cancels `done` when the last tick is sampled.
struct ScriptedStore {
    ticks: Vec<Tick>,
    sampled: AtomicUsize,
    done: CancellationToken,
}

impl ScriptedStore {
    fn new(ticks: Vec<Tick>, done: CancellationToken) -> Self {
        Self {
            ticks,
            sampled: AtomicUsize::new(0),
            done,
        }
    }

    fn current(&self) -> Tick {
        let idx = self.sampled.load(Ordering::SeqCst).saturating_sub(1);
        self.ticks.get(idx).copied().unwrap_or(Tick::Inactive)
    }
}

impl ConsentStore for ScriptedStore {
    fn consumers(&self, group: ConsumerGroup) -> Result<Option<Vec<String>>, SourceError> {
        match group {
            ConsumerGroup::Packaged => {
                let idx = self.sampled.fetch_add(1, Ordering::SeqCst);
                if idx + 1 >= self.ticks.len() {
                    self.done.cancel();
                }
                if matches!(self.current(), Tick::Fails) {
                    return Err(SourceError::Registry {
                        path: "webcam".into(),
                        code: 5,
                    });
                }
                Ok(Some(vec![
                    "Microsoft.WindowsCamera".to_string(),
                    "NonPackaged".to_string(),
                ]))
            }
            ConsumerGroup::NonPackaged => Ok(Some(vec![r"C:#Program Files#Zoom#Zoom.exe".into()])),
        }
    }

    fn last_used_time_stop(
        &self,
        group: ConsumerGroup,
        _consumer_id: &str,
    ) -> Result<Option<u64>, SourceError> {
        let active = matches!(
            (group, self.current()),
            (ConsumerGroup::Packaged, Tick::PackagedActive)
                | (ConsumerGroup::NonPackaged, Tick::NonPackagedActive)
        );
        Ok(Some(if active { 0 } else { 133_500_000_000_000_000 }))
    }
}

fn fast_config() -> MonitorConfig {
    MonitorConfig {
        poll_interval: Duration::from_millis(1),
    }
}

async fn run_poll_script(ticks: Vec<Tick>, dispatcher: Dispatcher) -> Monitor {
    let token = CancellationToken::new();
    let store = Arc::new(ScriptedStore::new(ticks, token.clone()));
    let mut monitor = Monitor::new(dispatcher, fast_config(), token);
    monitor.run_poll(store).await.unwrap();
    monitor
}

// ─── Scripted line source ───────────────────────────────────────────

struct ScriptedLines(VecDeque<String>);

impl ScriptedLines {
    fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| l.to_string()).collect())
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> Option<String> {
        self.0.pop_front()
    }

    async fn closed_status(&mut self) -> String {
        "exit status: 0".to_string()
    }

    async fn shutdown(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Never yields a line; records whether it was shut down.
struct SilentLines {
    released: Arc<AtomicBool>,
}

#[async_trait]
impl LineSource for SilentLines {
    async fn next_line(&mut self) -> Option<String> {
        std::future::pending().await
    }

    async fn closed_status(&mut self) -> String {
        unreachable!("silent stream never closes")
    }

    async fn shutdown(&mut self) -> Result<(), SourceError> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ─── Poll model ─────────────────────────────────────────────────────

#[tokio::test]
async fn scenario_a_poll_edges_and_sink_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok",
            "expires_in": 3600,
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/webcam_events.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "-N1"})))
        .expect(2)
        .mount(&server)
        .await;

    let mut credentials = tempfile::NamedTempFile::new().unwrap();
    let account = serde_json::json!({
        "client_email": "camwatch@test.iam.gserviceaccount.com",
        "private_key": TEST_PRIVATE_KEY,
        "token_uri": format!("{}/token", server.uri()),
    });
    credentials
        .write_all(account.to_string().as_bytes())
        .unwrap();

    let remote = RemotePushSink::try_init(&RemotePushConfig {
        credentials_file: credentials.path().to_path_buf(),
        database_url: server.uri(),
        device_name: "test-host".into(),
        device_os: "Windows".into(),
    })
    .unwrap();

    let player = Arc::new(CountingPlayer::default());
    let log = EventLog::default();
    let dispatcher = Dispatcher::new()
        .with_sink(AudioAlertSink::new(player.clone()))
        .with_optional_sink(Some(remote))
        .with_sink(RecordingSink {
            name: "recorder",
            log: log.clone(),
        });

    let monitor = run_poll_script(
        vec![
            Tick::Inactive,
            Tick::Inactive,
            Tick::PackagedActive,
            Tick::PackagedActive,
            Tick::Inactive,
        ],
        dispatcher,
    )
    .await;

    assert_eq!(*log.lock().unwrap(), vec![EdgeKind::Started, EdgeKind::Stopped]);
    assert_eq!(player.plays.load(Ordering::SeqCst), 1);
    assert_eq!(monitor.stats().ticks, 5);
    assert_eq!(monitor.stats().started, 1);
    assert_eq!(monitor.stats().stopped, 1);
    // Remote call count is verified by `expect(2)` when the server drops.
}

#[tokio::test]
async fn first_sample_only_seeds_state() {
    let log = EventLog::default();
    let dispatcher = Dispatcher::new().with_sink(RecordingSink {
        name: "recorder",
        log: log.clone(),
    });

    run_poll_script(
        vec![
            Tick::NonPackagedActive,
            Tick::NonPackagedActive,
            Tick::Inactive,
        ],
        dispatcher,
    )
    .await;

    assert_eq!(*log.lock().unwrap(), vec![EdgeKind::Stopped]);
}

#[tokio::test]
async fn activity_in_either_group_counts() {
    let log = EventLog::default();
    let dispatcher = Dispatcher::new().with_sink(RecordingSink {
        name: "recorder",
        log: log.clone(),
    });

    // Active moves from one group to the other without an idle tick.
    run_poll_script(
        vec![
            Tick::Inactive,
            Tick::PackagedActive,
            Tick::NonPackagedActive,
            Tick::PackagedActive,
            Tick::Inactive,
        ],
        dispatcher,
    )
    .await;

    assert_eq!(*log.lock().unwrap(), vec![EdgeKind::Started, EdgeKind::Stopped]);
}

#[tokio::test]
async fn failed_sample_keeps_previous_state() {
    let log = EventLog::default();
    let dispatcher = Dispatcher::new().with_sink(RecordingSink {
        name: "recorder",
        log: log.clone(),
    });

    let monitor = run_poll_script(
        vec![
            Tick::Inactive,
            Tick::PackagedActive,
            Tick::Fails,
            Tick::PackagedActive,
            Tick::Fails,
            Tick::Inactive,
        ],
        dispatcher,
    )
    .await;

    assert_eq!(*log.lock().unwrap(), vec![EdgeKind::Started, EdgeKind::Stopped]);
    assert_eq!(monitor.stats().skipped, 2);
    assert_eq!(monitor.stats().ticks, 6);
}

#[tokio::test]
async fn failing_sink_isolated_from_loop_and_other_sinks() {
    let calls = Arc::new(AtomicUsize::new(0));
    let log = EventLog::default();
    let dispatcher = Dispatcher::new()
        .with_sink(FailingSink {
            calls: calls.clone(),
        })
        .with_sink(RecordingSink {
            name: "recorder",
            log: log.clone(),
        });

    run_poll_script(
        vec![
            Tick::Inactive,
            Tick::PackagedActive,
            Tick::Inactive,
            Tick::PackagedActive,
        ],
        dispatcher,
    )
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *log.lock().unwrap(),
        vec![EdgeKind::Started, EdgeKind::Stopped, EdgeKind::Started]
    );
}

// ─── Stream model ───────────────────────────────────────────────────

#[tokio::test]
async fn scenario_b_stream_suppresses_duplicate_start() {
    let log = EventLog::default();
    let player = Arc::new(CountingPlayer::default());
    let dispatcher = Dispatcher::new()
        .with_sink(AudioAlertSink::new(player.clone()))
        .with_sink(RecordingSink {
            name: "recorder",
            log: log.clone(),
        });
    let mut monitor = Monitor::new(dispatcher, MonitorConfig::default(), CancellationToken::new());

    let mut lines = ScriptedLines::new(&[
        "noise",
        "2024-01-01 10:00:00.000 Df camera[1]: AVCaptureSessionDidStartRunningNotification",
        "2024-01-01 10:00:01.000 Df camera[1]: AVCaptureSessionDidStartRunningNotification",
        "2024-01-01 10:00:09.000 Df camera[1]: AVCaptureSessionDidStopRunningNotification",
    ]);

    let err = monitor.run_stream(&mut lines).await.unwrap_err();
    assert!(matches!(
        err,
        MonitorError::Source(SourceError::StreamClosed { .. })
    ));
    assert_eq!(*log.lock().unwrap(), vec![EdgeKind::Started, EdgeKind::Stopped]);
    assert_eq!(player.plays.load(Ordering::SeqCst), 1);
    assert_eq!(monitor.stats().ticks, 4);
}

#[tokio::test]
async fn stop_before_any_start_is_ignored() {
    let log = EventLog::default();
    let dispatcher = Dispatcher::new().with_sink(RecordingSink {
        name: "recorder",
        log: log.clone(),
    });
    let mut monitor = Monitor::new(dispatcher, MonitorConfig::default(), CancellationToken::new());

    let mut lines = ScriptedLines::new(&[
        "2024-01-01 10:00:00 AVCaptureSessionDidStopRunningNotification",
        "Filtering the log data using \"AVCaptureSessionDidStartRunningNotification\"",
        "2024-01-01 10:00:02 unrelated",
    ]);

    let _ = monitor.run_stream(&mut lines).await;
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn interrupt_releases_stream_source() {
    let token = CancellationToken::new();
    let released = Arc::new(AtomicBool::new(false));
    let mut lines = SilentLines {
        released: released.clone(),
    };
    let mut monitor = Monitor::new(Dispatcher::new(), MonitorConfig::default(), token.clone());

    let cancel = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    monitor.run_stream(&mut lines).await.unwrap();
    cancel.await.unwrap();
    assert!(released.load(Ordering::SeqCst));
    assert_eq!(monitor.stats().events(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn child_process_stream_end_to_end() {
    use camwatch_source::LogStreamCommand;

    let script = "echo 'Filtering the log data'; \
                  echo '2024-01-01 10:00:00 x AVCaptureSessionDidStartRunningNotification'; \
                  echo '2024-01-01 10:00:05 x AVCaptureSessionDidStopRunningNotification'";
    let command = LogStreamCommand::new("sh", vec!["-c".to_string(), script.to_string()]);

    let log = EventLog::default();
    let dispatcher = Dispatcher::new().with_sink(RecordingSink {
        name: "recorder",
        log: log.clone(),
    });
    let mut monitor = Monitor::new(dispatcher, MonitorConfig::default(), CancellationToken::new());

    let err = monitor
        .run(SignalAdapter::Stream(command))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MonitorError::Source(SourceError::StreamClosed { .. })
    ));
    assert_eq!(*log.lock().unwrap(), vec![EdgeKind::Started, EdgeKind::Stopped]);
}

#[tokio::test]
async fn stream_launch_failure_is_fatal() {
    use camwatch_source::LogStreamCommand;

    let command = LogStreamCommand::new("/nonexistent/camwatch-log", Vec::new());
    let mut monitor = Monitor::new(
        Dispatcher::new(),
        MonitorConfig::default(),
        CancellationToken::new(),
    );
    let err = monitor
        .run(SignalAdapter::Stream(command))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Source(SourceError::Launch { .. })));
    assert_eq!(err.exit_code(), 1);
}

// ─── Platform ───────────────────────────────────────────────────────

#[test]
fn unsupported_platform_is_fatal_with_no_events() {
    let err = SignalAdapter::for_os("plan9").err().unwrap();
    assert!(err.is_fatal());
    let err = MonitorError::from(err);
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains("plan9"));
}
