use chrono::{DateTime, Utc};
use std::fmt;

// ─── Activity ─────────────────────────────────────────────────────

/// Normalized "camera in use" state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityState {
    #[default]
    Idle,
    Active,
}

impl ActivityState {
    pub fn from_in_use(in_use: bool) -> Self {
        if in_use { Self::Active } else { Self::Idle }
    }
}

// ─── Edge ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Started,
    Stopped,
}

impl EdgeKind {
    /// Wire name used by remote consumers (`start` / `stop`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "start",
            Self::Stopped => "stop",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single camera state transition. Created by the detector, handed to
/// every sink by reference, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeEvent {
    pub kind: EdgeKind,
    pub occurred_at: DateTime<Utc>,
    /// Free-form evidence (the raw log line in the stream model).
    pub detail: Option<String>,
}

impl EdgeEvent {
    pub fn new(kind: EdgeKind, occurred_at: DateTime<Utc>, detail: Option<String>) -> Self {
        Self {
            kind,
            occurred_at,
            detail,
        }
    }

    pub fn occurred_at_ms(&self) -> i64 {
        self.occurred_at.timestamp_millis()
    }
}

// ─── Evidence ─────────────────────────────────────────────────────

/// Consent-store group a camera consumer is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsumerGroup {
    /// Sandboxed / store-packaged applications.
    Packaged,
    /// Traditional desktop applications.
    NonPackaged,
}

impl ConsumerGroup {
    pub const ALL: [Self; 2] = [Self::Packaged, Self::NonPackaged];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Packaged => "packaged",
            Self::NonPackaged => "non_packaged",
        }
    }
}

/// One camera consumer as recorded by the consent store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerRecord {
    pub group: ConsumerGroup,
    pub consumer_id: String,
    /// `LastUsedTimeStop`; zero means no stop recorded since the last start.
    pub last_stop: u64,
}

impl ConsumerRecord {
    pub const ACTIVE_SENTINEL: u64 = 0;

    pub fn new(group: ConsumerGroup, consumer_id: impl Into<String>, last_stop: u64) -> Self {
        Self {
            group,
            consumer_id: consumer_id.into(),
            last_stop,
        }
    }

    pub fn is_active(&self) -> bool {
        self.last_stop == Self::ACTIVE_SENTINEL
    }
}

/// Raw per-tick evidence, owned by the source for the duration of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvidence {
    /// Poll model: every consumer record found across both groups.
    Snapshot(Vec<ConsumerRecord>),
    /// Stream model: one line of log output.
    Line(String),
}
