//! camwatch: webcam activity monitor binary.
//! Picks the signal adapter for the host, wires the audio and optional
//! remote-push sinks into the dispatcher and runs until interrupted.

use camwatch_daemon::{Monitor, SignalAdapter, spawn_shutdown_listener};
use camwatch_notify::{AudioAlertSink, Dispatcher, RemotePushSink};
use camwatch_source::HostInfo;
use clap::Parser;
use tokio_util::sync::CancellationToken;

mod banner;
mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("CAMWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let adapter = match SignalAdapter::for_host() {
        Ok(adapter) => adapter,
        Err(e) => {
            tracing::error!("cannot monitor this host: {e}");
            eprintln!("camwatch: {e}");
            std::process::exit(1);
        }
    };

    let host = HostInfo::detect();

    let remote = match RemotePushSink::try_init(&args.remote_push_config(&host)) {
        Ok(sink) => {
            tracing::info!(endpoint = sink.endpoint(), "mobile notifications enabled");
            Some(sink)
        }
        Err(reason) => {
            tracing::info!("mobile notifications disabled: {reason}");
            None
        }
    };

    println!("{}", banner::banner(&host, remote.is_some()));

    let dispatcher = Dispatcher::new()
        .with_sink(AudioAlertSink::for_host(args.audio_config()))
        .with_optional_sink(remote);
    tracing::info!(sinks = ?dispatcher.sink_names(), "dispatcher ready");

    let shutdown = CancellationToken::new();
    let listener = spawn_shutdown_listener(shutdown.clone());

    let mut monitor = Monitor::new(dispatcher, args.monitor_config(), shutdown);
    let result = monitor.run(adapter).await;
    listener.abort();

    let stats = monitor.stats();
    tracing::info!(
        ticks = stats.ticks,
        skipped = stats.skipped,
        started = stats.started,
        stopped = stats.stopped,
        "camwatch stopped"
    );

    match result {
        Ok(()) => {
            println!("\nStopping webcam monitor. Goodbye!");
            Ok(())
        }
        Err(e) => {
            tracing::error!("monitor failed: {e}");
            eprintln!("camwatch: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
