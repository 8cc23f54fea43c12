//! Movement Orchestrator
//!
//! Top-level movement state machine. Holds at most one current plan and at
//! most one in-flight transition; the state is derived from them:
//!
//!   transition in flight  → TRANSITIONING
//!   plan active           → plan.target_state()
//!   otherwise             → IDLE
//!
//! Submitting over an active plan blends from its live output (plan change,
//! 300ms). Submitting from a non-neutral rest or a plan completing blends
//! over the state window (200ms). `stop_all` drops everything at once.

use tracing::{debug, info};

use crate::config::BehaviorConfig;
use crate::core::transition::{BlendSource, BlendState, TransitionCallback, TransitionEngine};
use crate::types::{Easing, FrameOutput, MovementPlan, MovementState};

const REST_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
struct ActivePlan {
    plan: MovementPlan,
    elapsed_ms: f64,
}

#[derive(Debug)]
pub struct MovementOrchestrator {
    active: Option<ActivePlan>,
    transitions: TransitionEngine,
    plan_transition_ms: f64,
    state_transition_ms: f64,
    last_output: FrameOutput,
}

impl MovementOrchestrator {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            active: None,
            transitions: TransitionEngine::new(),
            plan_transition_ms: config.plan_transition_ms,
            state_transition_ms: config.state_transition_ms,
            last_output: FrameOutput::neutral(),
        }
    }

    /// Register the transition-complete callback
    pub fn on_transition_complete(&mut self, callback: TransitionCallback) {
        self.transitions.on_complete(callback);
    }

    pub fn state(&self) -> MovementState {
        if self.transitions.is_active() {
            MovementState::Transitioning
        } else {
            self.active
                .as_ref()
                .map(|a| a.plan.target_state())
                .unwrap_or(MovementState::Idle)
        }
    }

    pub fn current_plan(&self) -> Option<&MovementPlan> {
        self.active.as_ref().map(|a| &a.plan)
    }

    pub fn plan_elapsed_ms(&self) -> Option<f64> {
        self.active.as_ref().map(|a| a.elapsed_ms)
    }

    pub fn blend_state(&self) -> Option<&BlendState> {
        self.transitions.state()
    }

    /// Eased progress of the in-flight transition
    pub fn transition_progress(&self) -> Option<f64> {
        self.transitions.state().map(BlendState::eased)
    }

    /// Output produced by the last `update`
    pub fn last_output(&self) -> &FrameOutput {
        &self.last_output
    }

    /// Submit a plan. Returns false when it matches the current plan.
    pub fn submit(&mut self, plan: MovementPlan) -> bool {
        if let Some(active) = &self.active {
            if active.plan.same_movements(&plan) {
                debug!(plan = plan.id, "identical plan ignored");
                return false;
            }
        }

        let from_state = self.state();
        let to_state = plan.target_state();
        let blend = match self.active.take() {
            Some(outgoing) => {
                let (duration_ms, easing) = plan
                    .transition_from(from_state)
                    .map(|t| (t.duration_ms, t.easing))
                    .unwrap_or((self.plan_transition_ms, Easing::EaseInOut));
                let source = if self.transitions.is_active() {
                    Self::capture(&self.last_output)
                } else {
                    BlendSource::Plan { plan: outgoing.plan, elapsed_ms: outgoing.elapsed_ms }
                };
                Some(BlendState::new(source, from_state, to_state, duration_ms, easing))
            }
            None if self.transitions.is_active() || !self.last_output.is_neutral(REST_EPSILON) => Some(BlendState::new(
                Self::capture(&self.last_output),
                from_state,
                to_state,
                self.state_transition_ms,
                Easing::EaseInOut,
            )),
            None => None,
        };

        info!(plan = plan.id, gestures = plan.gestures.len(), from = %from_state, to = %to_state, "plan submitted");
        match blend {
            Some(state) => self.transitions.begin(state),
            None => self.transitions.cancel(),
        }
        self.active = Some(ActivePlan { plan, elapsed_ms: 0.0 });
        true
    }

    /// Clear the plan and any transition immediately, no easing
    pub fn stop_all(&mut self) {
        debug!("stop all movements");
        self.active = None;
        self.transitions.cancel();
        self.last_output = FrameOutput::neutral();
    }

    /// Let go of the current plan and ease back to rest over the state
    /// window. Used on teardown, where snapping is not allowed.
    pub fn release(&mut self) {
        let from_state = self.state();
        let had_plan = self.active.take().is_some();
        if !had_plan && !self.transitions.is_active() && self.last_output.is_neutral(REST_EPSILON) {
            return;
        }
        debug!(from = %from_state, "release to idle");
        self.transitions.begin(BlendState::new(
            Self::capture(&self.last_output),
            from_state,
            MovementState::Idle,
            self.state_transition_ms,
            Easing::EaseInOut,
        ));
    }

    /// Outgoing side of a blend starting from `output`
    fn capture(output: &FrameOutput) -> BlendSource {
        if output.is_neutral(REST_EPSILON) {
            BlendSource::Neutral
        } else {
            BlendSource::Frozen(output.clone())
        }
    }

    /// Advance one frame and return the blended output
    pub fn update(&mut self, delta_ms: f64) -> FrameOutput {
        let delta_ms = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        if let Some(active) = self.active.as_mut() {
            active.elapsed_ms += delta_ms;
        }
        if let Some(event) = self.transitions.advance(delta_ms) {
            debug!(from = %event.from_state, to = %event.to_state, "transition complete");
        }

        let target = self
            .active
            .as_ref()
            .map(|a| a.plan.output_at(a.elapsed_ms))
            .unwrap_or_else(FrameOutput::neutral);
        let output = self.transitions.blend(&target);

        let finished = self
            .active
            .as_ref()
            .is_some_and(|a| a.elapsed_ms >= a.plan.total_duration_ms);
        if finished {
            if let Some(done) = self.active.take() {
                let from_state = self.transitions.state().map(|s| s.to_state).unwrap_or_else(|| done.plan.target_state());
                debug!(plan = done.plan.id, "plan complete");
                if !output.is_neutral(REST_EPSILON) || self.transitions.is_active() {
                    self.transitions.begin(BlendState::new(
                        Self::capture(&output),
                        from_state,
                        MovementState::Idle,
                        self.state_transition_ms,
                        Easing::EaseInOut,
                    ));
                }
            }
        }

        self.last_output = output.clone();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gesture_db::GestureDatabase;
    use crate::types::{GestureCategory, GestureType};
    use std::sync::{Arc, Mutex};

    fn plan(id: u64, gesture_type: GestureType, category: GestureCategory, duration: f64) -> MovementPlan {
        let db = GestureDatabase::new();
        let mut plan = MovementPlan::empty(id);
        plan.gestures.push(db.instantiate(gesture_type, category, 0.0, 0.8, duration, None));
        plan.rebuild_head_movements();
        plan.recompute_duration(0.0);
        plan
    }

    #[test]
    fn test_idle_to_plan_state_directly() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        assert_eq!(orch.state(), MovementState::Idle);
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 1000.0));
        assert_eq!(orch.state(), MovementState::Emphasizing);
        assert!(orch.blend_state().is_none());
    }

    #[test]
    fn test_plan_change_transitions_for_300ms() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        orch.update(500.0);
        orch.submit(plan(2, GestureType::HeadTilt, GestureCategory::Question, 2000.0));
        assert_eq!(orch.state(), MovementState::Transitioning);
        assert_eq!(orch.blend_state().unwrap().duration_ms, 300.0);
        orch.update(299.0);
        assert_eq!(orch.state(), MovementState::Transitioning);
        orch.update(1.0);
        assert_eq!(orch.state(), MovementState::Questioning);
    }

    #[test]
    fn test_blend_starts_from_live_output() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        let before = orch.update(1000.0);
        assert!(before.head_rotation.x > 0.0);
        orch.submit(plan(2, GestureType::Smile, GestureCategory::Sentiment, 2000.0));
        let first = orch.update(0.0);
        assert!(first.max_diff(&before) < 1e-9);
    }

    #[test]
    fn test_identical_plan_ignored() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        let p = plan(1, GestureType::Nod, GestureCategory::Emphasis, 1000.0);
        assert!(orch.submit(p.clone()));
        orch.update(100.0);
        assert!(!orch.submit(p));
        assert_eq!(orch.plan_elapsed_ms(), Some(100.0));
    }

    #[test]
    fn test_plan_completion_returns_to_idle() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.submit(plan(1, GestureType::Smile, GestureCategory::Sentiment, 400.0));
        assert_eq!(orch.state(), MovementState::Speaking);
        for _ in 0..30 {
            orch.update(16.0);
        }
        assert_eq!(orch.state(), MovementState::Idle);
        assert!(orch.last_output().is_neutral(1e-6));
    }

    #[test]
    fn test_stop_all_is_immediate() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        orch.update(200.0);
        orch.submit(plan(2, GestureType::HeadTilt, GestureCategory::Question, 2000.0));
        orch.stop_all();
        assert_eq!(orch.state(), MovementState::Idle);
        assert!(orch.blend_state().is_none());
        assert!(orch.update(16.0).is_neutral(1e-12));
    }

    #[test]
    fn test_release_eases_to_rest() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        let live = orch.update(1000.0);
        orch.release();
        assert_eq!(orch.state(), MovementState::Transitioning);
        assert!(orch.current_plan().is_none());
        let first = orch.update(0.0);
        assert!(first.max_diff(&live) < 1e-9);
        orch.update(200.0);
        assert_eq!(orch.state(), MovementState::Idle);
        assert!(orch.update(16.0).is_neutral(1e-9));
    }

    #[test]
    fn test_release_from_rest_blends_from_neutral() {
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        orch.release();
        let blend = orch.blend_state().unwrap();
        assert!(matches!(blend.from, BlendSource::Neutral));
        assert_eq!(blend.to_state, MovementState::Idle);

        orch.submit(plan(2, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        orch.update(1000.0);
        orch.release();
        assert!(matches!(orch.blend_state().unwrap().from, BlendSource::Frozen(_)));
    }

    #[test]
    fn test_callback_sees_completion() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut orch = MovementOrchestrator::new(&BehaviorConfig::default());
        orch.on_transition_complete(Box::new(move |e| sink.lock().unwrap().push(e.to_state)));
        orch.submit(plan(1, GestureType::Nod, GestureCategory::Emphasis, 2000.0));
        orch.update(100.0);
        orch.submit(plan(2, GestureType::HeadTilt, GestureCategory::Question, 2000.0));
        orch.update(400.0);
        assert_eq!(*events.lock().unwrap(), vec![MovementState::Questioning]);
    }
}
