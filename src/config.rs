//! Runtime-tunable configuration
//!
//! Defaults come from the constants in `lib.rs`. Values loaded from JSON
//! are clamped into range by `sanitized()`, never rejected.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BehaviorError, Result};
use crate::{
    ANTICIPATION_MS, CONFLICT_GAP_MS, DEFAULT_SMOOTHING, NEUTRAL_BLEND_MS,
    PATTERN_REPEAT_LIMIT, PATTERN_WINDOW_MS, PLAN_TRANSITION_MS,
    PRIMARY_PRIORITY_THRESHOLD, SEGMENT_BLEND_WINDOW_MS, STATE_TRANSITION_MS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Mouth lead over audio (ms)
    pub anticipation_ms: f64,
    /// Boundary interpolation window (ms)
    pub segment_blend_ms: f64,
    /// Share of previous pose kept each frame, 0.0-0.95
    pub smoothing: f64,
    /// Neutral blend on stop (ms)
    pub neutral_blend_ms: f64,
    /// Primary tier threshold
    pub primary_threshold: f64,
    /// Gap after a conflicting gesture (ms)
    pub conflict_gap_ms: f64,
    /// Pattern tracker history window (ms)
    pub pattern_window_ms: f64,
    /// Uses before substitution
    pub pattern_repeat_limit: usize,
    /// Plan replacement blend (ms)
    pub plan_transition_ms: f64,
    /// Bare state change blend (ms)
    pub state_transition_ms: f64,
    /// Seed for timing jitter and pattern variation
    pub seed: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            anticipation_ms: ANTICIPATION_MS,
            segment_blend_ms: SEGMENT_BLEND_WINDOW_MS,
            smoothing: DEFAULT_SMOOTHING,
            neutral_blend_ms: NEUTRAL_BLEND_MS,
            primary_threshold: PRIMARY_PRIORITY_THRESHOLD,
            conflict_gap_ms: CONFLICT_GAP_MS,
            pattern_window_ms: PATTERN_WINDOW_MS,
            pattern_repeat_limit: PATTERN_REPEAT_LIMIT,
            plan_transition_ms: PLAN_TRANSITION_MS,
            state_transition_ms: STATE_TRANSITION_MS,
            seed: 0x5EED,
        }
    }
}

impl BehaviorConfig {
    /// Parse from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BehaviorConfig = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| BehaviorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Clamp every field into its usable range
    pub fn sanitized(mut self) -> Self {
        self.anticipation_ms = finite_or(self.anticipation_ms, ANTICIPATION_MS).clamp(0.0, 200.0);
        self.segment_blend_ms = finite_or(self.segment_blend_ms, SEGMENT_BLEND_WINDOW_MS).clamp(0.0, 200.0);
        self.smoothing = finite_or(self.smoothing, DEFAULT_SMOOTHING).clamp(0.0, 0.95);
        self.neutral_blend_ms = finite_or(self.neutral_blend_ms, NEUTRAL_BLEND_MS).clamp(1.0, 2000.0);
        self.primary_threshold = finite_or(self.primary_threshold, PRIMARY_PRIORITY_THRESHOLD).clamp(0.0, 1.0);
        self.conflict_gap_ms = finite_or(self.conflict_gap_ms, CONFLICT_GAP_MS).clamp(0.0, 1000.0);
        self.pattern_window_ms = finite_or(self.pattern_window_ms, PATTERN_WINDOW_MS).clamp(0.0, 600_000.0);
        self.pattern_repeat_limit = self.pattern_repeat_limit.max(1);
        self.plan_transition_ms = finite_or(self.plan_transition_ms, PLAN_TRANSITION_MS).clamp(1.0, 5000.0);
        self.state_transition_ms = finite_or(self.state_transition_ms, STATE_TRANSITION_MS).clamp(1.0, 5000.0);
        self
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = BehaviorConfig::from_json(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.anticipation_ms, ANTICIPATION_MS);
        assert_eq!(config.plan_transition_ms, PLAN_TRANSITION_MS);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = BehaviorConfig::from_json(
            r#"{"smoothing": 3.0, "primary_threshold": -1.0, "pattern_repeat_limit": 0}"#,
        ).unwrap();
        assert_eq!(config.smoothing, 0.95);
        assert_eq!(config.primary_threshold, 0.0);
        assert_eq!(config.pattern_repeat_limit, 1);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            BehaviorConfig::from_json("{not json"),
            Err(BehaviorError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = BehaviorConfig::load("/nonexistent/behavior.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/behavior.json"));
    }
}
