//! CLI definition using clap derive.
//!
//! Every option has a default, so `camwatch` with no flags is the normal
//! way to run it.

use std::path::PathBuf;
use std::time::Duration;

use camwatch_daemon::MonitorConfig;
use camwatch_notify::AudioConfig;
use camwatch_notify::RemotePushConfig;
use camwatch_notify::audio::{DEFAULT_SOUND_FILE, DEFAULT_VOLUME};
use camwatch_notify::remote_push::DEFAULT_CREDENTIALS_FILE;
use camwatch_source::HostInfo;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "camwatch",
    version,
    about = "Webcam activity monitor with audible and mobile alerts"
)]
pub struct Cli {
    /// Firebase service-account JSON used for mobile notifications
    #[arg(long, env = "FIREBASE_CREDENTIALS_FILE", default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials_file: PathBuf,

    /// Firebase Realtime Database URL (empty disables mobile notifications)
    #[arg(long, env = "FIREBASE_DATABASE_URL", default_value = "")]
    pub database_url: String,

    /// Alert sound played when the webcam starts (macOS)
    #[arg(long, env = "CAMWATCH_SOUND_FILE", default_value = DEFAULT_SOUND_FILE)]
    pub sound_file: PathBuf,

    /// Alert volume, 1-10 (macOS)
    #[arg(
        long,
        env = "CAMWATCH_VOLUME",
        default_value_t = DEFAULT_VOLUME,
        value_parser = clap::value_parser!(u8).range(1..=10)
    )]
    pub volume: u8,

    /// Consent-store poll interval in milliseconds (Windows)
    #[arg(
        long,
        env = "CAMWATCH_POLL_INTERVAL_MS",
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub poll_interval_ms: u64,
}

impl Cli {
    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig::new(self.sound_file.clone(), self.volume)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn remote_push_config(&self, host: &HostInfo) -> RemotePushConfig {
        RemotePushConfig {
            credentials_file: self.credentials_file.clone(),
            database_url: self.database_url.clone(),
            device_name: host.device_name.clone(),
            device_os: host.os_family.clone(),
        }
    }
}
