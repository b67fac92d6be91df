//! camwatch-daemon: the monitor loop.
//! Wires signal source → normalizer → transition detector → dispatcher
//! for either the poll or the stream model, and stops on shutdown.

pub mod adapter;
pub mod error;
pub mod monitor;
pub mod shutdown;

pub use adapter::{LineSource, SignalAdapter};
pub use error::MonitorError;
pub use monitor::{Monitor, MonitorConfig, MonitorStats};
pub use shutdown::{shutdown_signal, spawn_shutdown_listener};
