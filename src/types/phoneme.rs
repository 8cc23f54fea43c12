//! Phoneme timing and mouth pose types

use serde::{Deserialize, Serialize};

use crate::error::{BehaviorError, Result};

/// Silence symbol used between words and for empty input
pub const SILENCE: &str = "SIL";

/// Blend-shape channels owned by lip-sync (gestures never write these)
pub const MOUTH_CHANNELS: [&str; 5] = [
    "viseme_jaw_open",
    "viseme_lip_pucker",
    "viseme_lip_spread",
    "viseme_tongue_raise",
    "viseme_teeth_show",
];

/// Target mouth shape, every field in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MouthPose {
    pub jaw_open: f64,
    pub lip_pucker: f64,
    pub lip_spread: f64,
    pub tongue_raise: f64,
    pub teeth_show: f64,
}

impl MouthPose {
    /// Build a pose from raw field values
    pub const fn new(jaw_open: f64, lip_pucker: f64, lip_spread: f64, tongue_raise: f64, teeth_show: f64) -> Self {
        Self { jaw_open, lip_pucker, lip_spread, tongue_raise, teeth_show }
    }

    /// Closed, relaxed mouth
    pub const fn neutral() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0)
    }

    /// Linear interpolation toward `other`
    pub fn lerp(&self, other: &MouthPose, t: f64) -> MouthPose {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f64, b: f64| a + (b - a) * t;
        MouthPose {
            jaw_open: mix(self.jaw_open, other.jaw_open),
            lip_pucker: mix(self.lip_pucker, other.lip_pucker),
            lip_spread: mix(self.lip_spread, other.lip_spread),
            tongue_raise: mix(self.tongue_raise, other.tongue_raise),
            teeth_show: mix(self.teeth_show, other.teeth_show),
        }
    }

    /// Scale every field, result clamped to [0,1]
    pub fn scale(&self, factor: f64) -> MouthPose {
        let s = |v: f64| (v * factor).clamp(0.0, 1.0);
        MouthPose {
            jaw_open: s(self.jaw_open),
            lip_pucker: s(self.lip_pucker),
            lip_spread: s(self.lip_spread),
            tongue_raise: s(self.tongue_raise),
            teeth_show: s(self.teeth_show),
        }
    }

    /// Largest per-field difference
    pub fn max_diff(&self, other: &MouthPose) -> f64 {
        self.values()
            .iter()
            .zip(other.values().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Within `eps` of the neutral pose on every field
    pub fn is_neutral(&self, eps: f64) -> bool {
        self.max_diff(&MouthPose::neutral()) <= eps
    }

    pub fn values(&self) -> [f64; 5] {
        [self.jaw_open, self.lip_pucker, self.lip_spread, self.tongue_raise, self.teeth_show]
    }

    /// (channel, weight) pairs in `MOUTH_CHANNELS` order
    pub fn channels(&self) -> [(&'static str, f64); 5] {
        let v = self.values();
        [
            (MOUTH_CHANNELS[0], v[0]),
            (MOUTH_CHANNELS[1], v[1]),
            (MOUTH_CHANNELS[2], v[2]),
            (MOUTH_CHANNELS[3], v[3]),
            (MOUTH_CHANNELS[4], v[4]),
        ]
    }
}

/// One timed phoneme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeSegment {
    pub symbol: String,
    pub start_ms: f64,
    pub end_ms: f64,
    /// Articulation strength, 0.0-1.0
    pub intensity: f64,
}

impl PhonemeSegment {
    pub fn new(symbol: impl Into<String>, start_ms: f64, end_ms: f64, intensity: f64) -> Self {
        Self {
            symbol: symbol.into(),
            start_ms,
            end_ms,
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    pub fn silence(start_ms: f64, end_ms: f64) -> Self {
        Self::new(SILENCE, start_ms, end_ms, 0.0)
    }

    pub fn duration_ms(&self) -> f64 {
        (self.end_ms - self.start_ms).max(0.0)
    }

    /// Half-open containment: [start, end)
    pub fn contains(&self, t_ms: f64) -> bool {
        t_ms >= self.start_ms && t_ms < self.end_ms
    }

    pub fn is_silence(&self) -> bool {
        self.symbol == SILENCE
    }
}

/// Time-ordered, non-overlapping phoneme sequence for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeTimeline {
    pub segments: Vec<PhonemeSegment>,
    pub total_duration_ms: f64,
}

impl PhonemeTimeline {
    pub fn new(segments: Vec<PhonemeSegment>, total_duration_ms: f64) -> Self {
        Self { segments, total_duration_ms }
    }

    /// Index of the segment containing `t_ms` (linear scan)
    pub fn segment_index_at(&self, t_ms: f64) -> Option<usize> {
        self.segments.iter().position(|s| s.contains(t_ms))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End time of the last segment
    pub fn end_ms(&self) -> f64 {
        self.segments.last().map(|s| s.end_ms).unwrap_or(0.0)
    }
}

/// Measured word timing supplied by the speech layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start_ms: f64,
    pub end_ms: f64,
}

impl WordTiming {
    pub fn new(word: impl Into<String>, start_ms: f64, end_ms: f64) -> Self {
        Self { word: word.into(), start_ms, end_ms }
    }

    /// Reject non-finite, negative, inverted or out-of-order timings
    pub fn validate_all(timings: &[WordTiming]) -> Result<()> {
        let mut last_end = 0.0;
        for (index, t) in timings.iter().enumerate() {
            let reason = if !t.start_ms.is_finite() || !t.end_ms.is_finite() {
                Some("non-finite time")
            } else if t.start_ms < 0.0 {
                Some("negative start")
            } else if t.end_ms < t.start_ms {
                Some("end before start")
            } else if t.start_ms < last_end {
                Some("overlaps previous word")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(BehaviorError::InvalidWordTimings { index, reason: reason.to_string() });
            }
            last_end = t.end_ms;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_lerp_endpoints() {
        let a = MouthPose::neutral();
        let b = MouthPose::new(0.8, 0.2, 0.4, 0.0, 0.6);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert!((a.lerp(&b, 0.5).jaw_open - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_segment_half_open() {
        let seg = PhonemeSegment::new("AA", 100.0, 200.0, 1.0);
        assert!(seg.contains(100.0));
        assert!(seg.contains(199.9));
        assert!(!seg.contains(200.0));
    }

    #[test]
    fn test_word_timings_validation() {
        let ok = vec![WordTiming::new("how", 0.0, 200.0), WordTiming::new("are", 250.0, 400.0)];
        assert!(WordTiming::validate_all(&ok).is_ok());

        let overlapping = vec![WordTiming::new("how", 0.0, 300.0), WordTiming::new("are", 250.0, 400.0)];
        match WordTiming::validate_all(&overlapping) {
            Err(BehaviorError::InvalidWordTimings { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidWordTimings, got {:?}", other),
        }

        let inverted = vec![WordTiming::new("x", 10.0, 5.0)];
        assert!(WordTiming::validate_all(&inverted).is_err());
    }
}
