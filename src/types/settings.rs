//! Motion-sensitivity settings and accessibility records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{BehaviorError, Result};
use crate::types::SemanticIntent;

/// Named amplitude preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionProfile {
    Minimal,
    Reduced,
    #[default]
    Standard,
    Enhanced,
}

impl MotionProfile {
    /// Global intensity multiplier
    pub fn scale(&self) -> f64 {
        match self {
            MotionProfile::Minimal => 0.2,
            MotionProfile::Reduced => 0.5,
            MotionProfile::Standard => 1.0,
            MotionProfile::Enhanced => 1.5,
        }
    }
}

impl FromStr for MotionProfile {
    type Err = BehaviorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(MotionProfile::Minimal),
            "reduced" => Ok(MotionProfile::Reduced),
            "standard" => Ok(MotionProfile::Standard),
            "enhanced" => Ok(MotionProfile::Enhanced),
            other => Err(BehaviorError::UnknownMotionProfile(other.to_string())),
        }
    }
}

/// Non-motion channel that can carry a semantic intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeMethod {
    TextHighlight,
    Bold,
    Underline,
    StatusText,
}

/// User-controlled motion settings; applied on the very next plan evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    pub enable_gestures: bool,
    pub enable_head_movements: bool,
    pub profile: MotionProfile,
    /// User fine-tuning on top of the profile, clamped to [0,1.5]
    pub intensity_scale: f64,
    pub reduced_motion_mode: bool,
    pub vestibular_safe_mode: bool,
    /// Stage updates until confirmed
    pub require_confirmation: bool,
    /// Preferred alternatives per intent, first entry wins
    pub alternative_methods: BTreeMap<SemanticIntent, Vec<AlternativeMethod>>,
}

impl Default for MotionSettings {
    fn default() -> Self {
        let mut alternative_methods = BTreeMap::new();
        alternative_methods.insert(SemanticIntent::Emphasis, vec![AlternativeMethod::Bold, AlternativeMethod::TextHighlight]);
        alternative_methods.insert(SemanticIntent::Question, vec![AlternativeMethod::StatusText, AlternativeMethod::Underline]);
        alternative_methods.insert(SemanticIntent::Feedback, vec![AlternativeMethod::StatusText]);
        alternative_methods.insert(SemanticIntent::Explanation, vec![AlternativeMethod::Underline]);
        Self {
            enable_gestures: true,
            enable_head_movements: true,
            profile: MotionProfile::Standard,
            intensity_scale: 1.0,
            reduced_motion_mode: false,
            vestibular_safe_mode: false,
            require_confirmation: false,
            alternative_methods,
        }
    }
}

impl MotionSettings {
    /// Parse a settings payload; out-of-range numbers are clamped
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: MotionSettings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn sanitized(mut self) -> Self {
        self.intensity_scale = if self.intensity_scale.is_finite() {
            self.intensity_scale.clamp(0.0, 1.5)
        } else {
            1.0
        };
        self
    }

    /// Reduced-motion or vestibular-safe mode overrides numeric settings
    pub fn forces_minimal(&self) -> bool {
        self.reduced_motion_mode || self.vestibular_safe_mode
    }

    /// Preferred alternative for an intent
    pub fn alternative_for(&self, intent: SemanticIntent) -> AlternativeMethod {
        self.alternative_methods
            .get(&intent)
            .and_then(|methods| methods.first().copied())
            .unwrap_or(AlternativeMethod::StatusText)
    }
}

/// A semantic intent re-expressed without motion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeCommunication {
    pub intent: SemanticIntent,
    pub method: AlternativeMethod,
    pub word: Option<String>,
    pub time_offset_ms: f64,
    pub intensity: f64,
    /// Status line text for `StatusText`
    pub message: String,
}

/// Estimated WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WcagLevel {
    None,
    A,
    AA,
    AAA,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Success criterion, e.g. "2.3.3"
    pub criterion: String,
    /// Level the criterion belongs to
    pub level: WcagLevel,
    pub description: String,
}

/// Audit report displayed by the settings UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessibilityAudit {
    pub compliant: bool,
    pub violations: Vec<Violation>,
    pub wcag_level: WcagLevel,
    pub audited_at: DateTime<Utc>,
}

impl AccessibilityAudit {
    /// Level reached is one below the lowest failing level
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let lowest = violations.iter().map(|v| v.level).min();
        let wcag_level = match lowest {
            None => WcagLevel::AAA,
            Some(WcagLevel::AAA) => WcagLevel::AA,
            Some(WcagLevel::AA) => WcagLevel::A,
            Some(WcagLevel::A) | Some(WcagLevel::None) => WcagLevel::None,
        };
        Self {
            compliant: violations.is_empty(),
            violations,
            wcag_level,
            audited_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_scales() {
        assert_eq!(MotionProfile::Minimal.scale(), 0.2);
        assert_eq!(MotionProfile::Reduced.scale(), 0.5);
        assert_eq!(MotionProfile::Standard.scale(), 1.0);
        assert_eq!(MotionProfile::Enhanced.scale(), 1.5);
    }

    #[test]
    fn test_settings_json_clamps() {
        let s = MotionSettings::from_json(r#"{"intensity_scale": 9.0, "enable_gestures": false}"#).unwrap();
        assert_eq!(s.intensity_scale, 1.5);
        assert!(!s.enable_gestures);
        assert!(s.enable_head_movements);
    }

    #[test]
    fn test_alternative_preference() {
        let s = MotionSettings::default();
        assert_eq!(s.alternative_for(SemanticIntent::Emphasis), AlternativeMethod::Bold);
        let mut empty = s.clone();
        empty.alternative_methods.clear();
        assert_eq!(empty.alternative_for(SemanticIntent::Emphasis), AlternativeMethod::StatusText);
    }

    #[test]
    fn test_wcag_level_from_violations() {
        assert_eq!(AccessibilityAudit::from_violations(vec![]).wcag_level, WcagLevel::AAA);
        let aaa = Violation { criterion: "2.3.3".into(), level: WcagLevel::AAA, description: String::new() };
        let a = Violation { criterion: "2.3.1".into(), level: WcagLevel::A, description: String::new() };
        assert_eq!(AccessibilityAudit::from_violations(vec![aaa.clone()]).wcag_level, WcagLevel::AA);
        let audit = AccessibilityAudit::from_violations(vec![aaa, a]);
        assert_eq!(audit.wcag_level, WcagLevel::None);
        assert!(!audit.compliant);
    }
}
