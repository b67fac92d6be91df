//! Host capability detection.
//!
//! The adapter is chosen exactly once at startup from the target OS; the
//! monitor never re-checks it.

use sysinfo::System;

use crate::error::SourceError;

/// Signal-source model available on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// Windows: poll the webcam consent store once per interval.
    ConsentStorePoll,
    /// macOS: follow `log stream` for capture-session notifications.
    LogStream,
}

impl AdapterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConsentStorePoll => "consent_store_poll",
            Self::LogStream => "log_stream",
        }
    }
}

/// Map an OS identifier (as in `std::env::consts::OS`) to its adapter.
pub fn select_adapter(os: &str) -> Result<AdapterKind, SourceError> {
    match os {
        "windows" => Ok(AdapterKind::ConsentStorePoll),
        "macos" => Ok(AdapterKind::LogStream),
        other => Err(SourceError::UnsupportedPlatform(other.to_string())),
    }
}

/// Adapter for the host this binary was built for.
pub fn host_adapter() -> Result<AdapterKind, SourceError> {
    select_adapter(std::env::consts::OS)
}

/// OS family name in the form remote consumers already expect
/// (`Windows`, `Darwin`, `Linux`).
pub fn os_family(os: &str) -> String {
    match os {
        "windows" => "Windows".to_string(),
        "macos" | "ios" => "Darwin".to_string(),
        "linux" | "android" => "Linux".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "Unknown".to_string(),
            }
        }
    }
}

/// Static facts about the host, gathered once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os_family: String,
    pub os_version: String,
    pub device_name: String,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            os_family: os_family(std::env::consts::OS),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            device_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
        }
    }
}
