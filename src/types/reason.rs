//! Reason codes for gesture resolution and accessibility decisions
//!
//! Nothing here is an error: every code records a deterministic decision
//! so hosts and tests can inspect why a plan looks the way it does.

use serde::{Deserialize, Serialize};

use crate::types::GestureType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R1xx: Conflict resolution
    // =========================================================================
    /// Primary retimed after an overlapping accepted gesture
    R101_RETIMED_TIME_OVERLAP,
    /// Primary retimed after a gesture on the same channel
    R102_RETIMED_CHANNEL_CONFLICT,
    /// Secondary shares a channel with an accepted gesture, deferred
    R103_SECONDARY_DEFERRED,
    /// Secondary layered alongside primaries
    R104_SECONDARY_LAYERED,

    // =========================================================================
    // R2xx: Pattern variation
    // =========================================================================
    /// Repeated gesture replaced by its alternate
    R201_PATTERN_SUBSTITUTED,
    /// Every alternate would conflict, original kept with jitter
    R202_PATTERN_SUBSTITUTION_BLOCKED,

    // =========================================================================
    // R3xx: Accessibility
    // =========================================================================
    /// Gestures disabled by the user
    R301_GESTURES_DISABLED,
    /// Head movements disabled by the user
    R302_HEAD_MOVEMENTS_DISABLED,
    /// Oscillating head motion removed (vestibular-safe)
    R303_OSCILLATION_REMOVED,
    /// Intensities scaled by the motion profile
    R304_INTENSITY_SCALED,
    /// Minimal profile forced by reduced-motion or vestibular-safe mode
    R305_MINIMAL_PROFILE_FORCED,
    /// Head amplitude capped (vestibular-safe)
    R306_HEAD_AMPLITUDE_CAPPED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_RETIMED_TIME_OVERLAP => "R101_RETIMED_TIME_OVERLAP",
            Self::R102_RETIMED_CHANNEL_CONFLICT => "R102_RETIMED_CHANNEL_CONFLICT",
            Self::R103_SECONDARY_DEFERRED => "R103_SECONDARY_DEFERRED",
            Self::R104_SECONDARY_LAYERED => "R104_SECONDARY_LAYERED",
            Self::R201_PATTERN_SUBSTITUTED => "R201_PATTERN_SUBSTITUTED",
            Self::R202_PATTERN_SUBSTITUTION_BLOCKED => "R202_PATTERN_SUBSTITUTION_BLOCKED",
            Self::R301_GESTURES_DISABLED => "R301_GESTURES_DISABLED",
            Self::R302_HEAD_MOVEMENTS_DISABLED => "R302_HEAD_MOVEMENTS_DISABLED",
            Self::R303_OSCILLATION_REMOVED => "R303_OSCILLATION_REMOVED",
            Self::R304_INTENSITY_SCALED => "R304_INTENSITY_SCALED",
            Self::R305_MINIMAL_PROFILE_FORCED => "R305_MINIMAL_PROFILE_FORCED",
            Self::R306_HEAD_AMPLITUDE_CAPPED => "R306_HEAD_AMPLITUDE_CAPPED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_RETIMED_TIME_OVERLAP => "Moved after overlapping gesture",
            Self::R102_RETIMED_CHANNEL_CONFLICT => "Moved after gesture on same channel",
            Self::R103_SECONDARY_DEFERRED => "Secondary deferred, channel busy",
            Self::R104_SECONDARY_LAYERED => "Secondary layered",
            Self::R201_PATTERN_SUBSTITUTED => "Repeated gesture substituted",
            Self::R202_PATTERN_SUBSTITUTION_BLOCKED => "Substitution blocked by conflicts",
            Self::R301_GESTURES_DISABLED => "Gestures disabled",
            Self::R302_HEAD_MOVEMENTS_DISABLED => "Head movements disabled",
            Self::R303_OSCILLATION_REMOVED => "Oscillating motion removed",
            Self::R304_INTENSITY_SCALED => "Intensity scaled by motion profile",
            Self::R305_MINIMAL_PROFILE_FORCED => "Minimal motion profile forced",
            Self::R306_HEAD_AMPLITUDE_CAPPED => "Head amplitude capped",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// One recorded decision about a gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub gesture_type: GestureType,
    pub reason: ReasonCode,
    pub original_start_ms: f64,
    pub resolved_start_ms: f64,
    /// Substitute type for R201
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replaced_with: Option<GestureType>,
}

impl Resolution {
    pub fn new(gesture_type: GestureType, reason: ReasonCode, original_start_ms: f64, resolved_start_ms: f64) -> Self {
        Self {
            gesture_type,
            reason,
            original_start_ms,
            resolved_start_ms,
            replaced_with: None,
        }
    }
}
