//! Accessibility Compliance Filter
//!
//! Runs on every plan before the orchestrator sees it:
//! 1. Intensity scale: profile × user scale, or the minimal profile when
//!    reduced-motion / vestibular-safe mode is on
//! 2. Category toggles clear whole arrays
//! 3. Vestibular-safe: oscillating head motion removed, amplitude capped
//! 4. Alternatives: every intent whose motion was removed (or whose motion
//!    the platform asked to reduce) is re-emitted as a non-motion signal
//!
//! `SettingsStore` owns the user settings; updates apply on the very next
//! plan unless confirmation is required.

use chrono::Utc;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::types::{
    AccessibilityAudit, AlternativeCommunication, GestureCategory, GestureType, IntentMarker,
    MotionProfile, MotionSettings, MovementPlan, ReasonCode, Resolution, SemanticIntent, Violation,
    WcagLevel,
};
use crate::{MAX_FLASHES_PER_SECOND, VESTIBULAR_MAX_ROTATION};

/// Plan ready for the orchestrator plus the alternatives it produced
#[derive(Debug, Clone)]
pub struct FilteredPlan {
    pub plan: MovementPlan,
    pub alternatives: Vec<AlternativeCommunication>,
}

/// Stateless filter; settings are passed per call
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessibilityFilter;

impl AccessibilityFilter {
    pub fn new() -> Self {
        Self
    }

    /// Multiplier applied to every intensity
    pub fn effective_scale(settings: &MotionSettings) -> f64 {
        if settings.forces_minimal() {
            MotionProfile::Minimal.scale()
        } else {
            settings.profile.scale() * settings.intensity_scale
        }
    }

    pub fn apply(&self, mut plan: MovementPlan, settings: &MotionSettings, platform_reduced_motion: bool) -> FilteredPlan {
        let scale = Self::effective_scale(settings);
        let forced = settings.forces_minimal();
        let mut lost: BTreeSet<SemanticIntent> = BTreeSet::new();

        // 1. Scale
        for gesture in &mut plan.gestures {
            gesture.scale_intensity(scale);
            let reason = if forced {
                ReasonCode::R305_MINIMAL_PROFILE_FORCED
            } else {
                ReasonCode::R304_INTENSITY_SCALED
            };
            if forced || scale != 1.0 {
                plan.resolutions.push(Resolution::new(gesture.gesture_type, reason, gesture.start_ms, gesture.start_ms));
            }
        }
        for head in &mut plan.head_movements {
            head.intensity = (head.intensity * scale).clamp(0.0, 1.0);
        }

        // 2. Category toggles
        if !settings.enable_gestures {
            for gesture in plan.gestures.drain(..) {
                plan.resolutions.push(Resolution::new(
                    gesture.gesture_type,
                    ReasonCode::R301_GESTURES_DISABLED,
                    gesture.start_ms,
                    gesture.start_ms,
                ));
            }
            lost.extend(plan.intents.iter().map(|i| i.intent));
        }
        if !settings.enable_head_movements {
            for head in plan.head_movements.drain(..) {
                plan.resolutions.push(Resolution::new(
                    head.source,
                    ReasonCode::R302_HEAD_MOVEMENTS_DISABLED,
                    head.start_ms,
                    head.start_ms,
                ));
            }
            for gesture in &mut plan.gestures {
                gesture.head = None;
            }
            lost.extend(plan.intents.iter().map(|i| i.intent));
        }

        // 3. Vestibular-safe
        if settings.vestibular_safe_mode {
            let mut removed = Vec::new();
            plan.gestures.retain(|g| {
                if g.gesture_type.is_oscillating() {
                    removed.push((g.gesture_type, g.category, g.start_ms));
                    false
                } else {
                    true
                }
            });
            plan.head_movements.retain(|h| {
                if h.oscillations > 0 {
                    removed.push((h.source, GestureCategory::Agreement, h.start_ms));
                    false
                } else {
                    true
                }
            });
            for (gesture_type, category, start) in removed {
                plan.resolutions.push(Resolution::new(gesture_type, ReasonCode::R303_OSCILLATION_REMOVED, start, start));
                if let Some(intent) = category.intent() {
                    lost.insert(intent);
                }
            }
            for head in &mut plan.head_movements {
                if head.peak() > VESTIBULAR_MAX_ROTATION && head.amplitude.abs() > 0.0 {
                    head.intensity = VESTIBULAR_MAX_ROTATION / head.amplitude.abs();
                    plan.resolutions.push(Resolution::new(
                        head.source,
                        ReasonCode::R306_HEAD_AMPLITUDE_CAPPED,
                        head.start_ms,
                        head.start_ms,
                    ));
                }
            }
        }

        if platform_reduced_motion {
            lost.extend(plan.intents.iter().map(|i| i.intent));
        }

        // 4. Alternatives
        let alternatives: Vec<AlternativeCommunication> = plan
            .intents
            .iter()
            .filter(|marker| lost.contains(&marker.intent))
            .map(|marker| alternative(marker, settings))
            .collect();

        if !alternatives.is_empty() {
            debug!(plan = plan.id, count = alternatives.len(), "alternative communication emitted");
        }
        FilteredPlan { plan, alternatives }
    }
}

fn alternative(marker: &IntentMarker, settings: &MotionSettings) -> AlternativeCommunication {
    let method = settings.alternative_for(marker.intent);
    let message = match (marker.intent, marker.word.as_deref()) {
        (SemanticIntent::Emphasis, Some(word)) => format!("Emphasis: \"{}\"", word),
        (SemanticIntent::Emphasis, None) => "Emphasis".to_string(),
        (SemanticIntent::Question, _) => "Question, waiting for your answer".to_string(),
        (SemanticIntent::Feedback, Some(word)) => format!("Reacting: \"{}\"", word),
        (SemanticIntent::Feedback, None) => "Reacting".to_string(),
        (SemanticIntent::Explanation, _) => "Explaining".to_string(),
    };
    AlternativeCommunication {
        intent: marker.intent,
        method,
        word: marker.word.clone(),
        time_offset_ms: marker.time_offset_ms,
        intensity: marker.intensity,
        message,
    }
}

// =============================================================================
// SETTINGS STORE
// =============================================================================

/// Process-wide motion settings with optional confirmation staging
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    current: MotionSettings,
    pending: Option<MotionSettings>,
    platform_reduced_motion: bool,
}

impl SettingsStore {
    pub fn new(settings: MotionSettings) -> Self {
        Self { current: settings.sanitized(), pending: None, platform_reduced_motion: false }
    }

    pub fn current(&self) -> &MotionSettings {
        &self.current
    }

    pub fn pending(&self) -> Option<&MotionSettings> {
        self.pending.as_ref()
    }

    pub fn platform_prefers_reduced_motion(&self) -> bool {
        self.platform_reduced_motion
    }

    /// Apply now, or stage when the current settings require confirmation.
    /// Returns true when applied.
    pub fn update(&mut self, settings: MotionSettings) -> bool {
        let settings = settings.sanitized();
        if self.current.require_confirmation {
            debug!("motion settings staged for confirmation");
            self.pending = Some(settings);
            false
        } else {
            self.current = settings;
            self.pending = None;
            true
        }
    }

    pub fn confirm_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(settings) => {
                self.current = settings;
                true
            }
            None => false,
        }
    }

    pub fn discard_pending(&mut self) {
        self.pending = None;
    }

    /// Platform preference report. Turning vestibular-safe mode on is the
    /// one automatic correction.
    pub fn observe_platform_reduced_motion(&mut self, prefers: bool) {
        self.platform_reduced_motion = prefers;
        if prefers && !self.current.vestibular_safe_mode {
            info!("platform prefers reduced motion, enabling vestibular-safe mode");
            self.current.vestibular_safe_mode = true;
        }
    }

    pub fn audit(&self, plan: Option<&MovementPlan>) -> AccessibilityAudit {
        audit(&self.current, plan, self.platform_reduced_motion)
    }
}

// =============================================================================
// AUDIT
// =============================================================================

fn violation(criterion: &str, level: WcagLevel, description: impl Into<String>) -> Violation {
    Violation { criterion: criterion.to_string(), level, description: description.into() }
}

/// Blinks starting inside the busiest one-second window
fn max_blinks_per_second(plan: &MovementPlan) -> usize {
    let starts: Vec<f64> = plan
        .gestures
        .iter()
        .filter(|g| g.gesture_type == GestureType::Blink)
        .map(|g| g.start_ms)
        .collect();
    starts
        .iter()
        .map(|s| starts.iter().filter(|o| **o >= *s && **o < s + 1000.0).count())
        .max()
        .unwrap_or(0)
}

/// Report settings and plan problems; nothing is corrected here
pub fn audit(settings: &MotionSettings, plan: Option<&MovementPlan>, platform_reduced_motion: bool) -> AccessibilityAudit {
    let mut violations = Vec::new();

    if platform_reduced_motion && !settings.forces_minimal() {
        violations.push(violation(
            "2.3.3",
            WcagLevel::AAA,
            "Platform prefers reduced motion but full motion is active",
        ));
    }
    if platform_reduced_motion && settings.profile == MotionProfile::Enhanced {
        violations.push(violation("2.3.3", WcagLevel::AAA, "Enhanced motion profile with reduced-motion preference"));
    }
    for intent in [SemanticIntent::Emphasis, SemanticIntent::Question, SemanticIntent::Feedback] {
        let configured = settings.alternative_methods.get(&intent).is_some_and(|m| !m.is_empty());
        if !configured && (!settings.enable_gestures || !settings.enable_head_movements) {
            violations.push(violation(
                "1.3.1",
                WcagLevel::A,
                format!("No alternative method configured for {:?} while motion is disabled", intent),
            ));
        }
    }

    if let Some(plan) = plan {
        if !settings.enable_gestures && !plan.gestures.is_empty() {
            violations.push(violation("2.2.2", WcagLevel::A, "Gestures present although disabled"));
        }
        if settings.vestibular_safe_mode {
            let worst = plan.head_movements.iter().map(|h| h.peak()).fold(0.0, f64::max);
            if worst > VESTIBULAR_MAX_ROTATION + 1e-9 {
                violations.push(violation(
                    "2.3.3",
                    WcagLevel::AAA,
                    format!("Head rotation {:.3} rad exceeds vestibular-safe cap", worst),
                ));
            }
        }
        let blinks = max_blinks_per_second(plan);
        if blinks as f64 > MAX_FLASHES_PER_SECOND {
            violations.push(violation("2.3.1", WcagLevel::A, format!("{} blinks within one second", blinks)));
        }
    }

    let mut report = AccessibilityAudit::from_violations(violations);
    report.audited_at = Utc::now();
    report
}
