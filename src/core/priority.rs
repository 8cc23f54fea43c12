//! Priority Manager
//!
//! score = category base × context boost × analysis confidence × intensity
//!
//! Context boosts:
//! - question context: tilt-type gestures ×1.3
//! - emphasis level: nod-type gestures × `EmphasisLevel::nod_boost()`

use crate::types::{Gesture, MovementContext};

/// Boost for tilt/eyebrow gestures inside a question context
pub const QUESTION_TILT_BOOST: f64 = 1.3;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub gesture: Gesture,
    pub score: f64,
}

/// Candidates split into tiers
#[derive(Debug, Clone, Default)]
pub struct Tiers {
    pub primary: Vec<ScoredCandidate>,
    pub secondary: Vec<ScoredCandidate>,
}

#[derive(Debug, Clone)]
pub struct PriorityManager {
    threshold: f64,
}

impl PriorityManager {
    pub fn new(threshold: f64) -> Self {
        Self { threshold: threshold.clamp(0.0, 1.0) }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn context_boost(&self, gesture: &Gesture, ctx: &MovementContext) -> f64 {
        let mut boost = 1.0;
        if ctx.is_question && gesture.gesture_type.is_tilt_type() {
            boost *= QUESTION_TILT_BOOST;
        }
        if gesture.gesture_type.is_nod_type() {
            boost *= ctx.emphasis_level.nod_boost();
        }
        boost
    }

    pub fn score(&self, gesture: &Gesture, ctx: &MovementContext, analysis_confidence: f64) -> f64 {
        gesture.category.base_priority()
            * self.context_boost(gesture, ctx)
            * analysis_confidence.clamp(0.0, 1.0)
            * gesture.intensity
    }

    /// Score every candidate; ≥ threshold is primary
    pub fn split(&self, candidates: Vec<Gesture>, ctx: &MovementContext, analysis_confidence: f64) -> Tiers {
        let mut tiers = Tiers::default();
        for gesture in candidates {
            let score = self.score(&gesture, ctx, analysis_confidence);
            let scored = ScoredCandidate { gesture, score };
            if score >= self.threshold {
                tiers.primary.push(scored);
            } else {
                tiers.secondary.push(scored);
            }
        }
        tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture_db::{ContentKey, GestureDatabase};
    use crate::types::{EmphasisLevel, GestureType, QuestionType};
    use crate::PRIMARY_PRIORITY_THRESHOLD;

    #[test]
    fn test_high_emphasis_boosts_nod() {
        let db = GestureDatabase::new();
        let pm = PriorityManager::new(PRIMARY_PRIORITY_THRESHOLD);
        let nod = &db.candidates_for(ContentKey::Emphasis, 0.0, 1.0, 0.95, None)[0];
        let low = pm.score(nod, &MovementContext::new(false, EmphasisLevel::Low), 0.95);
        let high = pm.score(nod, &MovementContext::new(false, EmphasisLevel::High), 0.95);
        assert!((high / low - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_question_context_boosts_tilt_only() {
        let db = GestureDatabase::new();
        let pm = PriorityManager::new(PRIMARY_PRIORITY_THRESHOLD);
        let cands = db.candidates_for(ContentKey::Question(QuestionType::WhQuestion), 0.0, 0.85, 0.85, None);
        let tilt = cands.iter().find(|g| g.gesture_type == GestureType::HeadTilt).unwrap();
        let ctx = MovementContext::new(true, EmphasisLevel::Medium);
        assert_eq!(pm.context_boost(tilt, &ctx), QUESTION_TILT_BOOST);
        assert_eq!(pm.context_boost(tilt, &MovementContext::default()), 1.0);
    }

    #[test]
    fn test_split_by_threshold() {
        let db = GestureDatabase::new();
        let pm = PriorityManager::new(PRIMARY_PRIORITY_THRESHOLD);
        let mut candidates = db.candidates_for(ContentKey::Emphasis, 0.0, 1.0, 1.0, None);
        candidates.extend(db.candidates_for(ContentKey::Idle, 0.0, 0.5, 0.5, None));
        let tiers = pm.split(candidates, &MovementContext::default(), 1.0);
        assert_eq!(tiers.primary.len(), 2);
        assert_eq!(tiers.secondary.len(), 1);
        assert_eq!(tiers.secondary[0].gesture.gesture_type, GestureType::Blink);
    }
}
