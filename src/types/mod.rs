//! Core types for avatar-behavior

mod analysis;
mod context;
mod easing;
mod gesture;
mod output;
mod phoneme;
mod plan;
mod profile;
mod reason;
mod settings;
mod state;

pub use analysis::{
    ContentAnalysis, ContextualCue, CueKind, EmphasisCue, EmphasisPoint, ExplanationType,
    ExplanatorySegment, QuestionSegment, QuestionType, Sentiment, SentimentMarker,
};
pub use context::{EmphasisLevel, MovementContext};
pub use easing::{cubic_in_out, Easing};
pub use gesture::{BlendTarget, Gesture, GestureCategory, GestureType, HeadAxis, HeadMotion};
pub use output::FrameReport;
pub use phoneme::{MouthPose, PhonemeSegment, PhonemeTimeline, WordTiming, MOUTH_CHANNELS, SILENCE};
pub use plan::{
    FrameOutput, HeadMovement, HeadRotation, IntentMarker, MovementPlan, SemanticIntent, TransitionSpec,
};
pub use profile::{AccentProfile, CulturalProfile, CulturalRegion, RhythmProfile};
pub use reason::{ReasonCode, Resolution};
pub use settings::{
    AccessibilityAudit, AlternativeCommunication, AlternativeMethod, MotionProfile, MotionSettings,
    Violation, WcagLevel,
};
pub use state::MovementState;
