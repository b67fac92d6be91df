//! Error types for camera signal sources.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported operating system: {0} (supported: windows, macos)")]
    UnsupportedPlatform(String),

    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("log stream exited ({status})")]
    StreamClosed { status: String },

    #[error("consent store error at {path}: code {code}")]
    Registry { path: String, code: u32 },

    #[error("source io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Fatal errors end the monitor; everything else is a skipped tick.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform(_) | Self::Launch { .. } | Self::StreamClosed { .. }
        )
    }
}
