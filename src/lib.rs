//! avatar-behavior: nonverbal behavior synthesis for an embodied assistant
//!
//! Text utterance + context → phoneme timeline → lip-sync mouth poses,
//! and in parallel → content analysis → gesture plan → accessibility
//! filter → movement orchestrator → per-frame head rotation and blend shapes.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::BehaviorConfig;
pub use error::BehaviorError;

// =============================================================================
// LIP-SYNC TIMING [ms]
// =============================================================================

/// Mouth movement leads the sound by this much
pub const ANTICIPATION_MS: f64 = 50.0;

/// Final stretch of a segment that interpolates toward the next pose
pub const SEGMENT_BLEND_WINDOW_MS: f64 = 50.0;

/// Share of the previous frame's pose retained by exponential smoothing
pub const DEFAULT_SMOOTHING: f64 = 0.7;

/// Blend to the neutral mouth pose on every stop path
pub const NEUTRAL_BLEND_MS: f64 = 300.0;

/// Silence inserted between words (upper bound, shrinks for short utterances)
pub const INTER_WORD_SILENCE_MS: f64 = 60.0;

/// Per-word jitter applied to relative word durations (±20%)
pub const WORD_JITTER: f64 = 0.2;

// =============================================================================
// CONTENT ANALYSIS
// =============================================================================

/// Estimated speaking time per character
pub const MS_PER_CHAR: f64 = 80.0;

/// Estimated pause between words
pub const WORD_GAP_MS: f64 = 100.0;

/// Overall confidence for empty or ambiguous input
pub const CONFIDENCE_FLOOR: f64 = 0.3;

/// Minimum confidence for a sentence to count as a question
pub const QUESTION_DETECTION_THRESHOLD: f64 = 0.4;

// =============================================================================
// GESTURE SELECTION
// =============================================================================

/// Candidates scoring at or above this are primary
pub const PRIMARY_PRIORITY_THRESHOLD: f64 = 0.4;

/// Gap inserted after a conflicting gesture when retiming
pub const CONFLICT_GAP_MS: f64 = 50.0;

/// Rolling history window of the pattern tracker
pub const PATTERN_WINDOW_MS: f64 = 30_000.0;

/// Uses of one gesture type inside the window before substitution kicks in
pub const PATTERN_REPEAT_LIMIT: usize = 3;

/// Substituted gestures get a jitter between these fractions (sign random)
pub const PATTERN_JITTER_MIN: f64 = 0.10;
pub const PATTERN_JITTER_MAX: f64 = 0.20;

// =============================================================================
// MOVEMENT TRANSITIONS [ms]
// =============================================================================

/// Blend window when a new plan replaces the current one
pub const PLAN_TRANSITION_MS: f64 = 300.0;

/// Blend window for bare state changes (plan start from rest, plan end)
pub const STATE_TRANSITION_MS: f64 = 200.0;

// =============================================================================
// ACCESSIBILITY
// =============================================================================

/// Head rotation cap (radians, any axis) in vestibular-safe mode
pub const VESTIBULAR_MAX_ROTATION: f64 = 0.05;

/// More than this many flashes/blinks per second is a WCAG 2.3.1 failure
pub const MAX_FLASHES_PER_SECOND: f64 = 3.0;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
