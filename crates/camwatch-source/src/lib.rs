//! camwatch-source: camera activity signal sources.
//! Consent-store polling (Windows), system log streaming (macOS) and
//! host capability detection. No detection logic: pure IO boundary.

pub mod consent_store;
pub mod error;
pub mod log_stream;
pub mod platform;

pub use consent_store::{ConsentStore, sample_consent_store};
#[cfg(windows)]
pub use consent_store::RegistryConsentStore;
pub use error::SourceError;
pub use log_stream::{LogStream, LogStreamCommand};
pub use platform::{AdapterKind, HostInfo, host_adapter, select_adapter};
