//! camwatch-core: camera activity types, evidence normalization and
//! edge detection. Pure logic only; every IO boundary lives in
//! `camwatch-source` and `camwatch-notify`.

pub mod normalize;
pub mod transition;
pub mod types;

pub use normalize::{LineClass, classify_line, is_log_entry, normalize};
pub use transition::{TransitionDetector, detect};
pub use types::{
    ActivityState, ConsumerGroup, ConsumerRecord, EdgeEvent, EdgeKind, RawEvidence,
};
