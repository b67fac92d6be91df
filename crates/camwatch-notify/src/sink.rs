use async_trait::async_trait;
use camwatch_core::types::EdgeEvent;

use crate::error::SinkError;

/// Destination for camera edge events.
///
/// Sinks are independent: they never see each other, and a failure is
/// returned rather than raised so the dispatcher can log it and move on.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver one event. Single attempt, no retries.
    async fn notify(&self, event: &EdgeEvent) -> Result<(), SinkError>;
}
