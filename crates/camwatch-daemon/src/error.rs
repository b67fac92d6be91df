use camwatch_source::SourceError;
use thiserror::Error;

/// Conditions that end the monitor with a non-zero exit.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl MonitorError {
    pub fn exit_code(&self) -> i32 {
        1
    }
}
