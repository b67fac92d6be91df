//! Edge-triggered transition detection.
//!
//! [`detect`] is the pure `(previous, current) -> edge` rule.
//! [`TransitionDetector`] holds the single stored [`ActivityState`] for a
//! monitor and turns normalized observations into [`EdgeEvent`]s.

use chrono::{DateTime, Utc};

use crate::types::{ActivityState, EdgeEvent, EdgeKind};

/// `Idle → Active` is `Started`, `Active → Idle` is `Stopped`, anything
/// else is no edge.
pub fn detect(previous: ActivityState, current: ActivityState) -> Option<EdgeKind> {
    match (previous, current) {
        (ActivityState::Idle, ActivityState::Active) => Some(EdgeKind::Started),
        (ActivityState::Active, ActivityState::Idle) => Some(EdgeKind::Stopped),
        _ => None,
    }
}

/// Stored state plus edge emission.
///
/// An unseeded detector treats its first observation as the baseline and
/// emits nothing for it. Only the latest observation is kept; there is no
/// queue of pending transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionDetector {
    state: Option<ActivityState>,
}

impl TransitionDetector {
    /// Unseeded detector (poll model).
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Detector with a known starting state (stream model starts `Idle`).
    pub fn seeded(state: ActivityState) -> Self {
        Self { state: Some(state) }
    }

    /// Record `current` and return the edge event, if the state changed.
    pub fn observe(
        &mut self,
        current: ActivityState,
        now: DateTime<Utc>,
        detail: Option<String>,
    ) -> Option<EdgeEvent> {
        let previous = self.state.replace(current)?;
        detect(previous, current).map(|kind| EdgeEvent::new(kind, now, detail))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn arb_state() -> impl Strategy<Value = ActivityState> {
        any::<bool>().prop_map(ActivityState::from_in_use)
    }

    fn edges(detector: &mut TransitionDetector, states: &[ActivityState]) -> Vec<EdgeKind> {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        states
            .iter()
            .filter_map(|s| detector.observe(*s, now, None))
            .map(|e| e.kind)
            .collect()
    }

    proptest! {
        /// An edge is emitted exactly when consecutive states differ; the
        /// first observation never emits.
        #[test]
        fn event_iff_consecutive_states_differ(
            states in proptest::collection::vec(arb_state(), 0..64),
        ) {
            let expected: Vec<EdgeKind> = states
                .windows(2)
                .filter_map(|w| detect(w[0], w[1]))
                .collect();
            let mut d = TransitionDetector::new();
            prop_assert_eq!(edges(&mut d, &states), expected);
        }

        /// Emitted edges strictly alternate, whatever the input.
        #[test]
        fn edges_never_repeat(
            states in proptest::collection::vec(arb_state(), 0..64),
        ) {
            let mut d = TransitionDetector::seeded(ActivityState::Idle);
            let out = edges(&mut d, &states);
            prop_assert!(out.windows(2).all(|w| w[0] != w[1]));
            if let Some(first) = out.first() {
                prop_assert_eq!(*first, EdgeKind::Started);
            }
        }
    }
}
