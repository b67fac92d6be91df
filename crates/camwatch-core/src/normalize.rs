//! Activity normalizer: reduces raw evidence to an [`ActivityState`].
//!
//! - Poll model: OR over every consumer record, across both groups.
//! - Stream model: each log line is classified against the two capture
//!   session notifications; irrelevant lines leave state untouched.

use crate::types::{ActivityState, ConsumerRecord, RawEvidence};

/// Log message emitted when a capture session starts running.
pub const START_MARKER: &str = "AVCaptureSessionDidStartRunningNotification";
/// Log message emitted when a capture session stops running.
pub const STOP_MARKER: &str = "AVCaptureSessionDidStopRunningNotification";

/// Classification of a single stream line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    StartMarker,
    StopMarker,
    Irrelevant,
}

impl LineClass {
    /// State forced by this line, if any.
    pub fn forced_state(self) -> Option<ActivityState> {
        match self {
            Self::StartMarker => Some(ActivityState::Active),
            Self::StopMarker => Some(ActivityState::Idle),
            Self::Irrelevant => None,
        }
    }
}

/// Full-scan OR over all records; does not stop at the first active one.
pub fn in_use(records: &[ConsumerRecord]) -> ActivityState {
    let active = records
        .iter()
        .fold(false, |acc, record| acc | record.is_active());
    ActivityState::from_in_use(active)
}

/// True when `line` begins with a `YYYY-MM-DD` timestamp. Header and
/// partially flushed lines from the log stream do not.
pub fn is_log_entry(line: &str) -> bool {
    let b = line.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

/// Classify a raw (untrimmed) stream line.
pub fn classify_line(line: &str) -> LineClass {
    let line = line.trim();
    if !is_log_entry(line) {
        return LineClass::Irrelevant;
    }
    if line.contains(START_MARKER) {
        LineClass::StartMarker
    } else if line.contains(STOP_MARKER) {
        LineClass::StopMarker
    } else {
        LineClass::Irrelevant
    }
}

/// Normalize one tick of evidence.
///
/// Returns `None` when the evidence carries no information about the
/// camera (an irrelevant or noise line); callers keep their previous state.
pub fn normalize(evidence: &RawEvidence) -> Option<ActivityState> {
    match evidence {
        RawEvidence::Snapshot(records) => Some(in_use(records)),
        RawEvidence::Line(line) => classify_line(line).forced_state(),
    }
}
