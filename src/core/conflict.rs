//! Conflict Resolver
//!
//! Primaries, sorted by start then score:
//!   overlapping an accepted gesture in time → retime to its end + gap,
//!   repeated until clear. Never dropped.
//! Secondaries:
//!   no channel conflict → layered as-is
//!   channel conflict    → deferred past the conflicting gesture
//! Finally the cultural intensity modifier scales every accepted gesture.
//!
//! Every retime, deferral and layering is recorded as a `Resolution`.

use std::cmp::Ordering;
use tracing::debug;

use crate::core::priority::{ScoredCandidate, Tiers};
use crate::types::{Gesture, ReasonCode, Resolution};

#[derive(Debug, Clone, Default)]
pub struct Resolved {
    /// Conflict-free gestures sorted by start time
    pub gestures: Vec<Gesture>,
    pub resolutions: Vec<Resolution>,
    /// Highest primary score, 0.0 without primaries
    pub priority: f64,
}

#[derive(Debug, Clone)]
pub struct ConflictResolver {
    gap_ms: f64,
}

fn by_start_then_score(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    a.gesture
        .start_ms
        .total_cmp(&b.gesture.start_ms)
        .then_with(|| b.score.total_cmp(&a.score))
}

impl ConflictResolver {
    pub fn new(gap_ms: f64) -> Self {
        Self { gap_ms: gap_ms.max(0.0) }
    }

    pub fn resolve(&self, tiers: Tiers, intensity_modifier: f64) -> Resolved {
        let Tiers { mut primary, mut secondary } = tiers;
        primary.sort_by(by_start_then_score);
        secondary.sort_by(by_start_then_score);

        let mut out = Resolved {
            priority: primary.iter().map(|c| c.score).fold(0.0, f64::max),
            ..Resolved::default()
        };
        let mut accepted: Vec<Gesture> = Vec::new();

        for candidate in primary {
            let mut gesture = candidate.gesture;
            let original = gesture.start_ms;
            let mut shared_channel = false;
            while let Some(end) = latest_end(&accepted, &gesture, Gesture::overlaps) {
                shared_channel |= accepted.iter().any(|a| a.conflicts_with(&gesture));
                gesture.start_ms = end + self.gap_ms;
            }
            if gesture.start_ms != original {
                let reason = if shared_channel {
                    ReasonCode::R102_RETIMED_CHANNEL_CONFLICT
                } else {
                    ReasonCode::R101_RETIMED_TIME_OVERLAP
                };
                debug!(gesture = %gesture.gesture_type, from = original, to = gesture.start_ms, "primary retimed");
                out.resolutions.push(Resolution::new(gesture.gesture_type, reason, original, gesture.start_ms));
            }
            accepted.push(gesture);
        }

        for candidate in secondary {
            let mut gesture = candidate.gesture;
            let original = gesture.start_ms;
            while let Some(end) = latest_end(&accepted, &gesture, Gesture::conflicts_with) {
                gesture.start_ms = end + self.gap_ms;
            }
            let reason = if gesture.start_ms != original {
                debug!(gesture = %gesture.gesture_type, from = original, to = gesture.start_ms, "secondary deferred");
                ReasonCode::R103_SECONDARY_DEFERRED
            } else {
                ReasonCode::R104_SECONDARY_LAYERED
            };
            out.resolutions.push(Resolution::new(gesture.gesture_type, reason, original, gesture.start_ms));
            accepted.push(gesture);
        }

        for gesture in &mut accepted {
            gesture.scale_intensity(intensity_modifier);
        }
        accepted.sort_by(|a, b| a.start_ms.total_cmp(&b.start_ms));
        out.gestures = accepted;
        out
    }
}

/// Latest end among accepted gestures that `test` flags against `gesture`
fn latest_end(accepted: &[Gesture], gesture: &Gesture, test: fn(&Gesture, &Gesture) -> bool) -> Option<f64> {
    accepted
        .iter()
        .filter(|a| test(a, gesture))
        .map(Gesture::end_ms)
        .fold(None, |acc: Option<f64>, end| Some(acc.map_or(end, |a| a.max(end))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture_db::GestureDatabase;
    use crate::types::{GestureCategory, GestureType};

    fn scored(db: &GestureDatabase, t: GestureType, start: f64, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            gesture: db.instantiate(t, GestureCategory::Emphasis, start, 0.8, 400.0, None),
            score,
        }
    }

    fn assert_conflict_free(gestures: &[Gesture]) {
        for (i, a) in gestures.iter().enumerate() {
            for b in &gestures[i + 1..] {
                assert!(!a.conflicts_with(b), "{:?} conflicts with {:?}", a.gesture_type, b.gesture_type);
            }
        }
    }

    #[test]
    fn test_overlapping_primary_is_retimed_not_dropped() {
        let db = GestureDatabase::new();
        let tiers = Tiers {
            primary: vec![scored(&db, GestureType::Nod, 0.0, 0.9), scored(&db, GestureType::Nod, 100.0, 0.8)],
            secondary: vec![],
        };
        let resolved = ConflictResolver::new(50.0).resolve(tiers, 1.0);
        assert_eq!(resolved.gestures.len(), 2);
        assert_eq!(resolved.gestures[1].start_ms, 450.0);
        assert_eq!(resolved.resolutions[0].reason, ReasonCode::R102_RETIMED_CHANNEL_CONFLICT);
        assert_conflict_free(&resolved.gestures);
    }

    #[test]
    fn test_time_overlap_without_shared_channel() {
        let db = GestureDatabase::new();
        let tiers = Tiers {
            primary: vec![scored(&db, GestureType::Nod, 0.0, 0.9), scored(&db, GestureType::Smile, 0.0, 0.5)],
            secondary: vec![],
        };
        let resolved = ConflictResolver::new(50.0).resolve(tiers, 1.0);
        assert_eq!(resolved.resolutions[0].reason, ReasonCode::R101_RETIMED_TIME_OVERLAP);
        assert_eq!(resolved.resolutions[0].gesture_type, GestureType::Smile);
    }

    #[test]
    fn test_secondary_layered_or_deferred() {
        let db = GestureDatabase::new();
        let tiers = Tiers {
            primary: vec![scored(&db, GestureType::EyebrowRaise, 0.0, 0.9)],
            secondary: vec![scored(&db, GestureType::Nod, 0.0, 0.2), scored(&db, GestureType::EyebrowRaise, 100.0, 0.3)],
        };
        let resolved = ConflictResolver::new(50.0).resolve(tiers, 1.0);
        let reasons: Vec<ReasonCode> = resolved.resolutions.iter().map(|r| r.reason).collect();
        assert_eq!(reasons, vec![ReasonCode::R104_SECONDARY_LAYERED, ReasonCode::R103_SECONDARY_DEFERRED]);
        assert_eq!(resolved.gestures.len(), 3);
        assert_conflict_free(&resolved.gestures);
    }

    #[test]
    fn test_cultural_modifier_clamped() {
        let db = GestureDatabase::new();
        let tiers = Tiers { primary: vec![scored(&db, GestureType::Nod, 0.0, 0.9)], secondary: vec![] };
        let resolved = ConflictResolver::new(50.0).resolve(tiers, 1.5);
        assert_eq!(resolved.gestures[0].intensity, 1.0);
        assert_eq!(resolved.priority, 0.9);
    }
}
