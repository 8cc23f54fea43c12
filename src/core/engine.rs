//! Behavior Engine
//!
//! Host facade owning every component. One `update` per rendered frame:
//!
//!   1. drain queued commands (utterances, stops, settings) atomically
//!   2. lip-sync pass → mouth channels
//!   3. orchestrator pass → gesture channels + head rotation
//!
//! The two passes write disjoint channel sets. Commands may be queued from
//! any thread through a `BehaviorHandle`; they never land mid-frame.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::BehaviorConfig;
use crate::core::accessibility::{AccessibilityFilter, SettingsStore};
use crate::core::content_analyzer::{estimate_duration_ms, ContentAnalyzer};
use crate::core::gesture_pipeline::GesturePipeline;
use crate::core::lipsync::LipSyncPlayer;
use crate::core::orchestrator::MovementOrchestrator;
use crate::core::phoneme_timeline::PhonemeTimelineGenerator;
use crate::core::rig::RigTarget;
use crate::error::Result;
use crate::types::{
    AccessibilityAudit, AlternativeCommunication, ContentAnalysis, FrameReport, MotionSettings,
    MovementContext, MovementPlan, MovementState, PhonemeTimeline, WordTiming, MOUTH_CHANNELS,
};

/// Deferred host request, applied at the start of the next tick
#[derive(Debug, Clone)]
pub enum Command {
    Speak {
        text: String,
        context: MovementContext,
        timings: Option<Vec<WordTiming>>,
    },
    StopSpeech,
    StopAll,
    UpdateSettings(MotionSettings),
    ConfirmSettings,
    PlatformReducedMotion(bool),
}

/// Cloneable, thread-safe sender for engine commands
#[derive(Debug, Clone, Default)]
pub struct BehaviorHandle {
    inbox: Arc<Mutex<VecDeque<Command>>>,
}

impl BehaviorHandle {
    pub fn send(&self, command: Command) {
        self.inbox.lock().push_back(command);
    }

    pub fn speak(&self, text: impl Into<String>, context: MovementContext) {
        self.send(Command::Speak { text: text.into(), context, timings: None });
    }

    pub fn speak_with_timings(&self, text: impl Into<String>, context: MovementContext, timings: Vec<WordTiming>) {
        self.send(Command::Speak { text: text.into(), context, timings: Some(timings) });
    }

    pub fn stop_speech(&self) {
        self.send(Command::StopSpeech);
    }

    pub fn stop_all(&self) {
        self.send(Command::StopAll);
    }

    pub fn update_settings(&self, settings: MotionSettings) {
        self.send(Command::UpdateSettings(settings));
    }

    pub fn confirm_settings(&self) {
        self.send(Command::ConfirmSettings);
    }

    pub fn report_platform_reduced_motion(&self, prefers: bool) {
        self.send(Command::PlatformReducedMotion(prefers));
    }

    /// Commands waiting for the next tick
    pub fn pending(&self) -> usize {
        self.inbox.lock().len()
    }

    fn drain(&self) -> VecDeque<Command> {
        std::mem::take(&mut *self.inbox.lock())
    }
}

/// Everything one utterance produced
#[derive(Debug, Clone)]
pub struct Utterance {
    pub analysis: ContentAnalysis,
    pub timeline: PhonemeTimeline,
    /// Plan after the accessibility filter, as submitted
    pub plan: MovementPlan,
    pub alternatives: Vec<AlternativeCommunication>,
    /// False when the orchestrator already runs an identical plan
    pub submitted: bool,
}

#[derive(Debug)]
pub struct BehaviorEngine {
    clock_ms: f64,
    analyzer: ContentAnalyzer,
    generator: PhonemeTimelineGenerator,
    lipsync: LipSyncPlayer,
    pipeline: GesturePipeline,
    filter: AccessibilityFilter,
    settings: SettingsStore,
    orchestrator: MovementOrchestrator,
    handle: BehaviorHandle,
    last_plan: Option<MovementPlan>,
    pending_alternatives: Vec<AlternativeCommunication>,
    shutting_down: bool,
}

impl BehaviorEngine {
    pub fn new(config: BehaviorConfig) -> Self {
        Self::with_settings(config, MotionSettings::default())
    }

    pub fn with_settings(config: BehaviorConfig, settings: MotionSettings) -> Self {
        let config = config.sanitized();
        Self {
            clock_ms: 0.0,
            analyzer: ContentAnalyzer::new(),
            generator: PhonemeTimelineGenerator::new(config.seed).with_anticipation(config.anticipation_ms),
            lipsync: LipSyncPlayer::new(&config),
            pipeline: GesturePipeline::new(&config),
            filter: AccessibilityFilter::new(),
            settings: SettingsStore::new(settings),
            orchestrator: MovementOrchestrator::new(&config),
            handle: BehaviorHandle::default(),
            last_plan: None,
            pending_alternatives: Vec::new(),
            shutting_down: false,
        }
    }

    /// Sender for commands from other threads
    pub fn handle(&self) -> BehaviorHandle {
        self.handle.clone()
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn state(&self) -> MovementState {
        self.orchestrator.state()
    }

    pub fn analyzer(&self) -> &ContentAnalyzer {
        &self.analyzer
    }

    pub fn pipeline(&self) -> &GesturePipeline {
        &self.pipeline
    }

    pub fn lipsync(&self) -> &LipSyncPlayer {
        &self.lipsync
    }

    pub fn orchestrator(&self) -> &MovementOrchestrator {
        &self.orchestrator
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Last plan handed to the orchestrator
    pub fn last_plan(&self) -> Option<&MovementPlan> {
        self.last_plan.as_ref()
    }

    // =========================================================================
    // UTTERANCES
    // =========================================================================

    /// Start an utterance: lip-sync timeline and gesture plan together
    pub fn speak(&mut self, text: &str, context: MovementContext) -> Utterance {
        let duration_ms = context
            .speech_duration_ms
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or_else(|| estimate_duration_ms(text));
        let context = context.with_duration(duration_ms);
        let accent = self.pipeline.modulator().accent_for(&context.language).clone();

        let timeline = self.generator.generate(text, duration_ms, &accent);
        let analysis = self.analyzer.analyze(text, &context);
        self.play(analysis, timeline, &context)
    }

    /// Start an utterance keyed to measured word timings from the speech layer
    pub fn speak_with_timings(&mut self, text: &str, context: MovementContext, timings: &[WordTiming]) -> Result<Utterance> {
        let measured_end = timings.last().map(|t| t.end_ms).unwrap_or(0.0);
        let duration_ms = context
            .speech_duration_ms
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(measured_end)
            .max(measured_end);
        let context = context.with_duration(duration_ms);
        let accent = self.pipeline.modulator().accent_for(&context.language).clone();

        let timeline = self.generator.generate_with_word_timings(timings, duration_ms, &accent)?;
        let analysis = self.analyzer.analyze_with_timings(text, &context, timings)?;
        Ok(self.play(analysis, timeline, &context))
    }

    fn play(&mut self, analysis: ContentAnalysis, timeline: PhonemeTimeline, context: &MovementContext) -> Utterance {
        if self.shutting_down {
            debug!("shutdown in progress, utterance accepted again");
            self.shutting_down = false;
        }
        let plan = self.pipeline.build_plan(&analysis, context, self.clock_ms);
        let filtered = self.filter.apply(
            plan,
            self.settings.current(),
            self.settings.platform_prefers_reduced_motion(),
        );

        self.lipsync.start(timeline.clone());
        let submitted = self.orchestrator.submit(filtered.plan.clone());
        self.pending_alternatives.extend(filtered.alternatives.iter().cloned());
        self.last_plan = Some(filtered.plan.clone());

        info!(
            plan = filtered.plan.id,
            duration_ms = timeline.total_duration_ms,
            gestures = filtered.plan.gestures.len(),
            alternatives = filtered.alternatives.len(),
            "utterance started"
        );
        Utterance {
            analysis,
            timeline,
            plan: filtered.plan,
            alternatives: filtered.alternatives,
            submitted,
        }
    }

    /// Interrupt speech; the mouth blends to neutral
    pub fn stop_speech(&mut self) {
        self.lipsync.stop();
    }

    /// Cancel everything: mouth blends to neutral, gestures stop at once
    pub fn stop_all(&mut self) {
        self.lipsync.stop();
        self.orchestrator.stop_all();
    }

    /// Teardown. Keep calling `update` until `is_settled()`.
    pub fn begin_shutdown(&mut self) {
        info!("behavior engine shutting down");
        self.shutting_down = true;
        self.lipsync.begin_shutdown();
        self.orchestrator.release();
    }

    /// Mouth and head both at rest
    pub fn is_settled(&self) -> bool {
        self.lipsync.is_settled()
            && self.orchestrator.state() == MovementState::Idle
            && self.orchestrator.last_output().is_neutral(1e-9)
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Applied to the next plan; returns false when staged for confirmation
    pub fn update_settings(&mut self, settings: MotionSettings) -> bool {
        self.settings.update(settings)
    }

    pub fn confirm_settings(&mut self) -> bool {
        self.settings.confirm_pending()
    }

    pub fn observe_platform_reduced_motion(&mut self, prefers: bool) {
        self.settings.observe_platform_reduced_motion(prefers);
    }

    pub fn audit(&self) -> AccessibilityAudit {
        self.settings.audit(self.last_plan.as_ref())
    }

    // =========================================================================
    // TICK
    // =========================================================================

    fn apply(&mut self, command: Command) {
        match command {
            Command::Speak { text, context, timings } => match timings {
                Some(timings) => {
                    if let Err(e) = self.speak_with_timings(&text, context.clone(), &timings) {
                        info!(error = %e, "word timings rejected, falling back to estimates");
                        self.speak(&text, context);
                    }
                }
                None => {
                    self.speak(&text, context);
                }
            },
            Command::StopSpeech => self.stop_speech(),
            Command::StopAll => self.stop_all(),
            Command::UpdateSettings(settings) => {
                self.update_settings(settings);
            }
            Command::ConfirmSettings => {
                self.confirm_settings();
            }
            Command::PlatformReducedMotion(prefers) => self.observe_platform_reduced_motion(prefers),
        }
    }

    /// Advance one frame and write the result to the rig
    pub fn update(&mut self, delta_ms: f64, rig: &mut dyn RigTarget) -> FrameReport {
        for command in self.handle.drain() {
            self.apply(command);
        }

        let delta_ms = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        self.clock_ms += delta_ms;

        let mouth = self.lipsync.tick(delta_ms, rig);
        let output = self.orchestrator.update(delta_ms);

        if rig.has_morph_targets() {
            for (channel, weight) in &output.blend_shapes {
                if !MOUTH_CHANNELS.contains(&channel.as_str()) {
                    rig.set_blend_shape(channel, *weight);
                }
            }
        }
        rig.set_head_rotation(output.head_rotation);

        FrameReport {
            clock_ms: self.clock_ms,
            state: self.orchestrator.state(),
            mouth,
            output,
            lip_sync_active: self.lipsync.is_active(),
            transition_progress: self.orchestrator.transition_progress(),
            alternatives: std::mem::take(&mut self.pending_alternatives),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rig::FrameBuffer;
    use crate::types::{EmphasisLevel, SemanticIntent};

    fn engine() -> BehaviorEngine {
        BehaviorEngine::new(BehaviorConfig::default())
    }

    #[test]
    fn test_speak_estimates_duration() {
        let mut engine = engine();
        let u = engine.speak("How are you?", MovementContext::new(true, EmphasisLevel::Medium));
        assert_eq!(u.timeline.total_duration_ms, estimate_duration_ms("How are you?"));
        assert!(u.submitted);
        assert_eq!(engine.state(), MovementState::Questioning);
    }

    #[test]
    fn test_commands_apply_at_next_tick() {
        let mut engine = engine();
        let handle = engine.handle();
        handle.speak("This is VERY important!", MovementContext::new(false, EmphasisLevel::High));
        assert_eq!(handle.pending(), 1);
        assert_eq!(engine.state(), MovementState::Idle);

        let mut rig = FrameBuffer::new();
        let report = engine.update(16.0, &mut rig);
        assert_eq!(handle.pending(), 0);
        assert_ne!(report.state, MovementState::Idle);
        assert_eq!(Some(report.state), engine.last_plan().map(MovementPlan::target_state));
        assert!(report.lip_sync_active);
    }

    #[test]
    fn test_mouth_and_gesture_channels_disjoint() {
        let mut engine = engine();
        engine.speak("Thank you, this is great!", MovementContext::default());
        let mut rig = FrameBuffer::new();
        for _ in 0..20 {
            let report = engine.update(16.0, &mut rig);
            for channel in report.output.blend_shapes.keys() {
                assert!(!MOUTH_CHANNELS.contains(&channel.as_str()));
            }
        }
        assert!(rig.blend_shapes.contains_key(MOUTH_CHANNELS[0]));
    }

    #[test]
    fn test_disabled_gestures_report_alternatives_once() {
        let mut engine = engine();
        let settings = MotionSettings { enable_gestures: false, ..MotionSettings::default() };
        assert!(engine.update_settings(settings));
        let u = engine.speak("This is VERY important!", MovementContext::new(false, EmphasisLevel::High));
        assert!(u.plan.gestures.is_empty());
        assert!(u.alternatives.iter().any(|a| a.intent == SemanticIntent::Emphasis));

        let mut rig = FrameBuffer::new();
        assert!(!engine.update(16.0, &mut rig).alternatives.is_empty());
        assert!(engine.update(16.0, &mut rig).alternatives.is_empty());
    }

    #[test]
    fn test_shutdown_settles_without_snapping() {
        let mut engine = engine();
        let mut rig = FrameBuffer::new();
        engine.speak("This is VERY important!", MovementContext::new(false, EmphasisLevel::High));
        let mut last = engine.update(200.0, &mut rig);
        engine.begin_shutdown();
        assert!(!engine.is_settled());
        for _ in 0..40 {
            let report = engine.update(16.0, &mut rig);
            assert!(report.mouth.max_diff(&last.mouth) < 0.25);
            last = report;
        }
        assert!(engine.is_settled());
    }

    #[test]
    fn test_bad_timings_fall_back_through_handle() {
        let mut engine = engine();
        let handle = engine.handle();
        handle.speak_with_timings(
            "hello there",
            MovementContext::default(),
            vec![WordTiming::new("hello", 300.0, 100.0)],
        );
        engine.update(16.0, &mut FrameBuffer::new());
        assert!(engine.lipsync().is_active());
        assert!(engine.last_plan().is_some());
    }
}
