//! Local audible alert.
//!
//! Only `Started` edges make a sound. Tone players are blocking, so the
//! sink runs them on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use camwatch_core::types::{EdgeEvent, EdgeKind};

use crate::error::SinkError;
use crate::sink::Sink;

/// Built-in macOS tone used when the custom sound file is missing.
pub const FALLBACK_SOUND_FILE: &str = "/System/Library/Sounds/Ping.aiff";
pub const DEFAULT_SOUND_FILE: &str = "BEEP.aiff";
pub const DEFAULT_VOLUME: u8 = 2;
pub const MIN_VOLUME: u8 = 1;
pub const MAX_VOLUME: u8 = 10;

/// Windows beep parameters.
pub const BEEP_FREQUENCY_HZ: u32 = 1000;
pub const BEEP_DURATION_MS: u32 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    pub sound_file: PathBuf,
    /// 1–10.
    pub volume: u8,
}

impl AudioConfig {
    pub fn new(sound_file: impl Into<PathBuf>, volume: u8) -> Self {
        Self {
            sound_file: sound_file.into(),
            volume: volume.clamp(MIN_VOLUME, MAX_VOLUME),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SOUND_FILE, DEFAULT_VOLUME)
    }
}

/// The configured file if it exists, otherwise the system tone.
pub fn resolve_sound_file(configured: &Path) -> PathBuf {
    if configured.exists() {
        configured.to_path_buf()
    } else {
        tracing::debug!(
            configured = %configured.display(),
            "custom sound missing, using {FALLBACK_SOUND_FILE}"
        );
        PathBuf::from(FALLBACK_SOUND_FILE)
    }
}

// ─── Tone players ───────────────────────────────────────────────────

/// Platform-native short-tone player. Blocks until the tone has played.
pub trait TonePlayer: Send + Sync {
    fn play(&self) -> Result<(), SinkError>;
}

/// `afplay -v <volume> <file>` (macOS).
#[derive(Debug, Clone)]
pub struct AfplayPlayer {
    config: AudioConfig,
}

impl AfplayPlayer {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "-v".to_string(),
            self.config.volume.to_string(),
            resolve_sound_file(&self.config.sound_file)
                .display()
                .to_string(),
        ]
    }
}

impl TonePlayer for AfplayPlayer {
    fn play(&self) -> Result<(), SinkError> {
        let status = std::process::Command::new("afplay")
            .args(self.args())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(SinkError::Playback(format!("afplay {status}")))
        }
    }
}

/// System speaker beep (Windows).
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct BeepPlayer;

#[cfg(windows)]
impl TonePlayer for BeepPlayer {
    fn play(&self) -> Result<(), SinkError> {
        use windows_sys::Win32::System::Diagnostics::Debug::Beep;

        // SAFETY: Win32 API call with plain integer arguments.
        let ok = unsafe { Beep(BEEP_FREQUENCY_HZ, BEEP_DURATION_MS) };
        if ok == 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        Ok(())
    }
}

/// Terminal bell on stdout, for hosts without a native player.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellPlayer;

impl TonePlayer for BellPlayer {
    fn play(&self) -> Result<(), SinkError> {
        use std::io::Write;

        let mut out = std::io::stdout().lock();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

/// The native player for the host this binary was built for.
pub fn platform_player(config: AudioConfig) -> Arc<dyn TonePlayer> {
    #[cfg(target_os = "macos")]
    let player: Arc<dyn TonePlayer> = Arc::new(AfplayPlayer::new(config));
    #[cfg(windows)]
    let player: Arc<dyn TonePlayer> = {
        let _ = config;
        Arc::new(BeepPlayer)
    };
    #[cfg(not(any(windows, target_os = "macos")))]
    let player: Arc<dyn TonePlayer> = {
        let _ = config;
        Arc::new(BellPlayer)
    };
    player
}

// ─── Sink ───────────────────────────────────────────────────────────

pub struct AudioAlertSink {
    player: Arc<dyn TonePlayer>,
}

impl AudioAlertSink {
    pub fn new(player: Arc<dyn TonePlayer>) -> Self {
        Self { player }
    }

    /// Sink using the host's native player.
    pub fn for_host(config: AudioConfig) -> Self {
        Self::new(platform_player(config))
    }
}

#[async_trait]
impl Sink for AudioAlertSink {
    fn name(&self) -> &'static str {
        "audio"
    }

    async fn notify(&self, event: &EdgeEvent) -> Result<(), SinkError> {
        if event.kind != EdgeKind::Started {
            return Ok(());
        }
        let player = Arc::clone(&self.player);
        tokio::task::spawn_blocking(move || player.play())
            .await
            .map_err(|e| SinkError::Playback(format!("player task failed: {e}")))?
    }
}
