//! Signal adapter selection.
//!
//! One variant per signal model, chosen once at startup from the host OS.

use std::sync::Arc;

use async_trait::async_trait;
use camwatch_source::{
    AdapterKind, ConsentStore, LogStream, LogStreamCommand, SourceError, host_adapter,
    select_adapter,
};

/// The signal source the monitor will drive.
pub enum SignalAdapter {
    /// Poll model over a consent store.
    Poll(Arc<dyn ConsentStore>),
    /// Stream model over a log-streaming child process.
    Stream(LogStreamCommand),
}

impl SignalAdapter {
    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Poll(_) => AdapterKind::ConsentStorePoll,
            Self::Stream(_) => AdapterKind::LogStream,
        }
    }

    /// Adapter for an OS identifier, or `UnsupportedPlatform`.
    pub fn for_os(os: &str) -> Result<Self, SourceError> {
        Self::from_kind(select_adapter(os)?, os)
    }

    /// Adapter for the host this binary was built for.
    pub fn for_host() -> Result<Self, SourceError> {
        Self::from_kind(host_adapter()?, std::env::consts::OS)
    }

    fn from_kind(kind: AdapterKind, os: &str) -> Result<Self, SourceError> {
        match kind {
            AdapterKind::LogStream => Ok(Self::Stream(LogStreamCommand::default())),
            AdapterKind::ConsentStorePoll => consent_store_adapter(os),
        }
    }
}

#[cfg(windows)]
fn consent_store_adapter(_os: &str) -> Result<SignalAdapter, SourceError> {
    Ok(SignalAdapter::Poll(Arc::new(
        camwatch_source::RegistryConsentStore::new(),
    )))
}

/// The registry store only exists in Windows builds.
#[cfg(not(windows))]
fn consent_store_adapter(os: &str) -> Result<SignalAdapter, SourceError> {
    Err(SourceError::UnsupportedPlatform(format!(
        "{os} (consent store unavailable in this build)"
    )))
}

/// Line-oriented event stream the monitor can wait on.
#[async_trait]
pub trait LineSource: Send {
    /// Next line; `None` once the stream has ended.
    async fn next_line(&mut self) -> Option<String>;

    /// Description of why the stream ended, read after `next_line` is `None`.
    async fn closed_status(&mut self) -> String;

    /// Release the underlying source (kill the child process).
    async fn shutdown(&mut self) -> Result<(), SourceError>;
}

#[async_trait]
impl LineSource for LogStream {
    async fn next_line(&mut self) -> Option<String> {
        LogStream::next_line(self).await
    }

    async fn closed_status(&mut self) -> String {
        self.exit_status().await
    }

    async fn shutdown(&mut self) -> Result<(), SourceError> {
        self.terminate().await
    }
}
