//! Integration tests for the movement orchestrator
//!
//! Tests the path: plans → orchestrator → transition engine → frame output,
//! and the engine facade driving both passes against a rig

use avatar_behavior::config::BehaviorConfig;
use avatar_behavior::core::transition::blend_outputs;
use avatar_behavior::core::{
    BehaviorEngine, ContentAnalyzer, FrameBuffer, GestureDatabase, GesturePipeline, MovementOrchestrator,
};
use avatar_behavior::types::{
    Easing, EmphasisLevel, GestureCategory, GestureType, MovementContext, MovementPlan, MovementState,
    MOUTH_CHANNELS,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

fn plan_for(pipeline: &mut GesturePipeline, text: &str, ctx: &MovementContext) -> MovementPlan {
    let analysis = ContentAnalyzer::new().analyze(text, ctx);
    pipeline.build_plan(&analysis, ctx, 0.0)
}

fn plan_of(id: u64, gestures: &[(GestureType, GestureCategory, f64)]) -> MovementPlan {
    let db = GestureDatabase::new();
    let mut plan = MovementPlan::empty(id);
    for (gesture_type, category, start_ms) in gestures {
        plan.gestures.push(db.instantiate(*gesture_type, *category, *start_ms, 0.8, 600.0, None));
    }
    plan.rebuild_head_movements();
    plan.recompute_duration(0.0);
    plan
}

/// Idle → emphasizing → transitioning → questioning → idle
#[test]
fn test_full_state_walk() {
    let config = BehaviorConfig::default();
    let mut pipeline = GesturePipeline::new(&config);
    let mut orch = MovementOrchestrator::new(&config);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    orch.on_transition_complete(Box::new(move |e| sink.lock().unwrap().push((e.from_state, e.to_state))));

    let emphasis = plan_of(1, &[(GestureType::Nod, GestureCategory::Emphasis, 0.0)]);
    let question = plan_for(&mut pipeline, "How are you?", &MovementContext::new(true, EmphasisLevel::Medium));

    assert_eq!(orch.state(), MovementState::Idle);
    orch.submit(emphasis);
    assert_eq!(orch.state(), MovementState::Emphasizing);
    orch.update(150.0);

    orch.submit(question.clone());
    assert_eq!(orch.state(), MovementState::Transitioning);
    for _ in 0..20 {
        orch.update(16.0);
    }
    assert_eq!(orch.state(), MovementState::Questioning);

    let mut guard = 0;
    while orch.state() != MovementState::Idle && guard < 1000 {
        orch.update(16.0);
        guard += 1;
    }
    assert_eq!(orch.state(), MovementState::Idle);
    assert!(orch.last_output().is_neutral(1e-9));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], (MovementState::Emphasizing, MovementState::Questioning));
}

/// Teardown eases out; the host keeps ticking until settled
#[test]
fn test_shutdown_settles() {
    let mut engine = BehaviorEngine::new(BehaviorConfig::default());
    let mut rig = FrameBuffer::new();
    engine.speak("This is VERY important!", MovementContext::new(false, EmphasisLevel::High));
    for _ in 0..10 {
        engine.update(16.0, &mut rig);
    }
    engine.begin_shutdown();
    let first = engine.update(16.0, &mut rig);
    assert!(!first.mouth.is_neutral(1e-6) || !first.output.is_neutral(1e-6));

    let mut ticks = 0;
    while !engine.is_settled() && ticks < 100 {
        engine.update(16.0, &mut rig);
        ticks += 1;
    }
    assert!(engine.is_settled());
    assert!(ticks * 16 <= 400, "took {}ms", ticks * 16);
    assert_eq!(rig.head_rotation.max_abs(), 0.0);
}

/// Tilt/eyebrow outranks emphasis, whichever category produced it
#[test]
fn test_state_rules_apply_in_order() {
    let config = BehaviorConfig::default();
    let mut orch = MovementOrchestrator::new(&config);

    orch.submit(plan_of(
        1,
        &[(GestureType::Nod, GestureCategory::Emphasis, 0.0), (GestureType::EyebrowRaise, GestureCategory::Emphasis, 700.0)],
    ));
    assert_eq!(orch.state(), MovementState::Questioning);

    orch.stop_all();
    orch.submit(plan_of(
        2,
        &[(GestureType::HeadTilt, GestureCategory::Emphasis, 0.0), (GestureType::Nod, GestureCategory::Emphasis, 700.0)],
    ));
    assert_eq!(orch.state(), MovementState::Questioning);

    orch.stop_all();
    orch.submit(plan_of(3, &[(GestureType::Nod, GestureCategory::Emphasis, 0.0)]));
    assert_eq!(orch.state(), MovementState::Emphasizing);

    orch.stop_all();
    orch.submit(plan_of(4, &[(GestureType::Smile, GestureCategory::Sentiment, 0.0)]));
    assert_eq!(orch.state(), MovementState::Speaking);

    // Pipeline-built emphasis carries an eyebrow raise
    let mut pipeline = GesturePipeline::new(&config);
    let plan = plan_for(&mut pipeline, "This is VERY important!", &MovementContext::new(false, EmphasisLevel::High));
    assert!(plan.gestures.iter().any(|g| g.category == GestureCategory::Emphasis));
    assert_eq!(plan.target_state(), MovementState::Questioning);
}

/// Plan transitions use the curve the plan asks for
#[test]
fn test_question_plan_enters_with_its_curve() {
    let config = BehaviorConfig::default();
    let mut pipeline = GesturePipeline::new(&config);
    let mut orch = MovementOrchestrator::new(&config);
    orch.submit(plan_for(&mut pipeline, "Great, thanks!", &MovementContext::default()));
    orch.update(100.0);
    orch.submit(plan_for(&mut pipeline, "How are you?", &MovementContext::new(true, EmphasisLevel::Medium)));
    let blend = orch.blend_state().unwrap();
    assert_eq!(blend.duration_ms, config.plan_transition_ms);
    assert_eq!(blend.easing, Easing::EaseOut);
}

/// stop_all drops plan and blend without easing
#[test]
fn test_stop_all_cancels_immediately() {
    let mut engine = BehaviorEngine::new(BehaviorConfig::default());
    let mut rig = FrameBuffer::new();
    engine.speak("This is VERY important!", MovementContext::new(false, EmphasisLevel::High));
    engine.update(100.0, &mut rig);
    engine.speak("Why would you do that?", MovementContext::new(true, EmphasisLevel::Medium));
    engine.update(16.0, &mut rig);
    assert_eq!(engine.state(), MovementState::Transitioning);

    engine.stop_all();
    assert_eq!(engine.state(), MovementState::Idle);
    let report = engine.update(16.0, &mut rig);
    assert!(report.output.is_neutral(1e-12));
    assert_eq!(report.transition_progress, None);
    assert!(report.lip_sync_active, "mouth still blending to neutral");
}

/// Rig receives mouth channels from lip-sync and brows/head from gestures
#[test]
fn test_engine_writes_both_passes() {
    let mut engine = BehaviorEngine::new(BehaviorConfig::default());
    let mut rig = FrameBuffer::new();
    engine.speak("This is VERY important!", MovementContext::new(false, EmphasisLevel::High));
    let mut max_head: f64 = 0.0;
    for _ in 0..60 {
        engine.update(16.0, &mut rig);
        max_head = max_head.max(rig.head_rotation.max_abs());
    }
    assert!(MOUTH_CHANNELS.iter().all(|c| rig.blend_shapes.contains_key(*c)));
    assert!(max_head > 0.0);
}

/// Identical resubmission keeps the running plan
#[test]
fn test_identical_plan_is_ignored() {
    let config = BehaviorConfig::default();
    let mut pipeline = GesturePipeline::new(&config);
    let mut orch = MovementOrchestrator::new(&config);
    let plan = plan_for(&mut pipeline, "How are you?", &MovementContext::new(true, EmphasisLevel::Medium));
    assert!(orch.submit(plan.clone()));
    orch.update(50.0);
    assert!(!orch.submit(plan));
    assert!(orch.blend_state().is_none());
}

fn easing() -> impl Strategy<Value = Easing> {
    prop::sample::select(Easing::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_transition_endpoints_match_plans(curve in easing(), t_from in 0.0f64..1500.0, t_to in 0.0f64..1500.0) {
        let config = BehaviorConfig::default();
        let mut pipeline = GesturePipeline::new(&config);
        let from = plan_for(&mut pipeline, "This is VERY important!", &MovementContext::new(false, EmphasisLevel::High));
        let to = plan_for(&mut pipeline, "How are you? I hope well.", &MovementContext::new(true, EmphasisLevel::Medium));
        let a = from.output_at(t_from);
        let b = to.output_at(t_to);
        prop_assert!(blend_outputs(&a, &b, curve.apply(0.0)).max_diff(&a) < 1e-12);
        prop_assert!(blend_outputs(&a, &b, curve.apply(1.0)).max_diff(&b) < 1e-12);
    }
}
