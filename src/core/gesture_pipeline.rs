//! Gesture selection pipeline
//!
//! ContentAnalysis + MovementContext
//!   → candidates (database) → accent/cultural shaping
//!   → priority tiers → conflict resolution + cultural intensity
//!   → pattern variation → MovementPlan
//!
//! Every stage is an owned instance so tests can drive it deterministically.

use tracing::debug;

use crate::config::BehaviorConfig;
use crate::core::accent::AccentModulator;
use crate::core::conflict::ConflictResolver;
use crate::core::gesture_db::GestureDatabase;
use crate::core::pattern::PatternTracker;
use crate::core::priority::PriorityManager;
use crate::types::{
    ContentAnalysis, Easing, IntentMarker, MovementContext, MovementPlan, MovementState, SemanticIntent,
    TransitionSpec,
};

#[derive(Debug)]
pub struct GesturePipeline {
    database: GestureDatabase,
    modulator: AccentModulator,
    priority: PriorityManager,
    resolver: ConflictResolver,
    tracker: PatternTracker,
    plan_transition_ms: f64,
    next_plan_id: u64,
}

impl GesturePipeline {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self::with_parts(config, GestureDatabase::new(), AccentModulator::new())
    }

    pub fn with_parts(config: &BehaviorConfig, database: GestureDatabase, modulator: AccentModulator) -> Self {
        Self {
            database,
            modulator,
            priority: PriorityManager::new(config.primary_threshold),
            resolver: ConflictResolver::new(config.conflict_gap_ms),
            tracker: PatternTracker::new(config.pattern_window_ms, config.pattern_repeat_limit, config.seed),
            plan_transition_ms: config.plan_transition_ms,
            next_plan_id: 1,
        }
    }

    pub fn database(&self) -> &GestureDatabase {
        &self.database
    }

    pub fn modulator(&self) -> &AccentModulator {
        &self.modulator
    }

    pub fn tracker(&self) -> &PatternTracker {
        &self.tracker
    }

    /// Build a resolved plan. `now_ms` is the clock the plan will start at.
    pub fn build_plan(&mut self, analysis: &ContentAnalysis, ctx: &MovementContext, now_ms: f64) -> MovementPlan {
        let region = ctx.effective_region();
        let mut candidates = self.database.candidates(analysis);
        for gesture in &mut candidates {
            self.modulator.shape_candidate(gesture, &ctx.language, region);
        }

        let tiers = self.priority.split(candidates, ctx, analysis.confidence);
        let culture = self.modulator.culture_for(region).gesture_intensity;
        let resolved = self.resolver.resolve(tiers, culture);

        let mut plan = MovementPlan::empty(self.next_plan_id);
        self.next_plan_id += 1;
        plan.gestures = resolved.gestures;
        plan.resolutions = resolved.resolutions;
        plan.priority = resolved.priority;

        let variations = self.tracker.apply(&mut plan.gestures, now_ms, &self.database);
        plan.resolutions.extend(variations);

        plan.rebuild_head_movements();
        plan.recompute_duration(ctx.speech_duration_ms.unwrap_or(0.0));
        plan.intents = intents_of(analysis);
        plan.transitions = self.transition_specs();

        debug!(
            plan = plan.id,
            gestures = plan.gestures.len(),
            resolutions = plan.resolutions.len(),
            state = %plan.target_state(),
            "plan built"
        );
        plan
    }

    /// Entry curves per target state
    fn transition_specs(&self) -> Vec<TransitionSpec> {
        [
            (MovementState::Speaking, Easing::EaseInOut),
            (MovementState::Questioning, Easing::EaseOut),
            (MovementState::Emphasizing, Easing::Back),
        ]
        .into_iter()
        .map(|(to, easing)| TransitionSpec { from: None, to, duration_ms: self.plan_transition_ms, easing })
        .collect()
    }
}

/// Semantic intents carried by the analysis, in time order
pub fn intents_of(analysis: &ContentAnalysis) -> Vec<IntentMarker> {
    let mut intents = Vec::new();
    for e in &analysis.emphasis_points {
        intents.push(IntentMarker {
            intent: SemanticIntent::Emphasis,
            word: Some(e.word.clone()),
            time_offset_ms: e.time_offset_ms,
            intensity: e.intensity,
        });
    }
    for q in &analysis.question_segments {
        intents.push(IntentMarker {
            intent: SemanticIntent::Question,
            word: None,
            time_offset_ms: q.time_offset_ms,
            intensity: q.intensity,
        });
    }
    for x in &analysis.explanatory_segments {
        intents.push(IntentMarker {
            intent: SemanticIntent::Explanation,
            word: None,
            time_offset_ms: x.time_offset_ms,
            intensity: x.intensity,
        });
    }
    for s in &analysis.sentiment_markers {
        intents.push(IntentMarker {
            intent: SemanticIntent::Feedback,
            word: Some(s.word.clone()),
            time_offset_ms: s.time_offset_ms,
            intensity: s.intensity,
        });
    }
    for c in &analysis.contextual_cues {
        intents.push(IntentMarker {
            intent: SemanticIntent::Feedback,
            word: Some(c.word.clone()),
            time_offset_ms: c.time_offset_ms,
            intensity: c.intensity,
        });
    }
    intents.sort_by(|a, b| a.time_offset_ms.total_cmp(&b.time_offset_ms));
    intents
}
