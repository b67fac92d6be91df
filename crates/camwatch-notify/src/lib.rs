//! camwatch-notify: notification sinks for camera edge events.
//!
//! Every sink implements [`Sink`]; the [`Dispatcher`] fans an event out to
//! all of them and isolates their failures from each other.

pub mod audio;
pub mod auth;
pub mod dispatcher;
pub mod error;
pub mod remote_push;
pub mod sink;
#[cfg(test)]
mod test_support;

pub use audio::{AudioAlertSink, AudioConfig, TonePlayer};
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::{AuthError, SinkError};
pub use remote_push::{RemotePushConfig, RemotePushSink, RemotePushUnavailable};
pub use sink::Sink;
