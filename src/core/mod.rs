//! Core engines for avatar-behavior

pub mod accent;
pub mod accessibility;
pub mod api;
pub mod conflict;
pub mod content_analyzer;
pub mod engine;
pub mod gesture_db;
pub mod gesture_pipeline;
pub mod lipsync;
pub mod orchestrator;
pub mod pattern;
pub mod phoneme_timeline;
pub mod priority;
pub mod rig;
pub mod transition;
pub mod viseme;

pub use accent::AccentModulator;
pub use accessibility::{audit, AccessibilityFilter, FilteredPlan, SettingsStore};
pub use api::{create_router, run_server};
pub use conflict::{ConflictResolver, Resolved};
pub use content_analyzer::{estimate_duration_ms, ContentAnalyzer, LanguageTables};
pub use engine::{BehaviorEngine, BehaviorHandle, Command, Utterance};
pub use gesture_db::{ContentKey, GestureDatabase};
pub use gesture_pipeline::GesturePipeline;
pub use lipsync::{LipSyncMode, LipSyncPlayer};
pub use orchestrator::MovementOrchestrator;
pub use pattern::PatternTracker;
pub use phoneme_timeline::PhonemeTimelineGenerator;
pub use priority::{PriorityManager, Tiers};
pub use rig::{FrameBuffer, RigTarget};
pub use transition::{BlendSource, BlendState, TransitionEngine, TransitionEvent};
pub use viseme::VisemeMapper;
