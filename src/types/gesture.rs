//! Gesture definitions

use serde::{Deserialize, Serialize};

use crate::types::SemanticIntent;

/// Nonverbal movement kinds the avatar can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureType {
    Nod,
    SlowNod,
    HeadTilt,
    HeadShake,
    HeadTurn,
    EyebrowRaise,
    BrowFurrow,
    Smile,
    Blink,
}

impl GestureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nod => "nod",
            Self::SlowNod => "slow_nod",
            Self::HeadTilt => "head_tilt",
            Self::HeadShake => "head_shake",
            Self::HeadTurn => "head_turn",
            Self::EyebrowRaise => "eyebrow_raise",
            Self::BrowFurrow => "brow_furrow",
            Self::Smile => "smile",
            Self::Blink => "blink",
        }
    }

    /// Tilt and eyebrow gestures read as questioning
    pub fn is_tilt_type(&self) -> bool {
        matches!(self, Self::HeadTilt | Self::EyebrowRaise)
    }

    pub fn is_nod_type(&self) -> bool {
        matches!(self, Self::Nod | Self::SlowNod)
    }

    /// Oscillating head motion (excluded in vestibular-safe mode)
    pub fn is_oscillating(&self) -> bool {
        matches!(self, Self::HeadShake)
    }
}

impl std::fmt::Display for GestureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content category a gesture was selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureCategory {
    Emphasis,
    Question,
    Agreement,
    Explanation,
    Sentiment,
    Idle,
}

impl GestureCategory {
    /// emphasis > question > agreement > explanation > sentiment > idle
    pub fn base_priority(&self) -> f64 {
        match self {
            Self::Emphasis => 1.0,
            Self::Question => 0.85,
            Self::Agreement => 0.75,
            Self::Explanation => 0.6,
            Self::Sentiment => 0.5,
            Self::Idle => 0.2,
        }
    }

    /// Meaning carried by gestures of this category
    pub fn intent(&self) -> Option<SemanticIntent> {
        match self {
            Self::Emphasis => Some(SemanticIntent::Emphasis),
            Self::Question => Some(SemanticIntent::Question),
            Self::Agreement | Self::Sentiment => Some(SemanticIntent::Feedback),
            Self::Explanation => Some(SemanticIntent::Explanation),
            Self::Idle => None,
        }
    }
}

/// Head rotation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadAxis {
    /// Nodding (x)
    Pitch,
    /// Shaking/turning (y)
    Yaw,
    /// Tilting (z)
    Roll,
}

impl HeadAxis {
    /// Pseudo-channel name used for conflict detection
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Pitch => "head.pitch",
            Self::Yaw => "head.yaw",
            Self::Roll => "head.roll",
        }
    }
}

/// Head component of a gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadMotion {
    pub axis: HeadAxis,
    /// Peak rotation in radians at intensity 1.0
    pub amplitude: f64,
    /// Full back-and-forth cycles; 0 = single excursion
    pub oscillations: u32,
}

/// Weighted blend-shape channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendTarget {
    pub channel: String,
    pub weight: f64,
}

impl BlendTarget {
    pub fn new(channel: impl Into<String>, weight: f64) -> Self {
        Self { channel: channel.into(), weight: weight.clamp(0.0, 1.0) }
    }
}

/// A timed gesture activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gesture {
    pub gesture_type: GestureType,
    pub category: GestureCategory,
    /// 0.0-1.0, clamped after every modifier
    pub intensity: f64,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub targets: Vec<BlendTarget>,
    pub head: Option<HeadMotion>,
    /// Word that triggered the gesture, if any
    pub source_word: Option<String>,
}

impl Gesture {
    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Half-open windows [start, end) intersect
    pub fn overlaps(&self, other: &Gesture) -> bool {
        self.start_ms < other.end_ms() && other.start_ms < self.end_ms()
    }

    /// Blend-shape channels plus head axis pseudo-channels
    pub fn occupied_channels(&self) -> Vec<&str> {
        let mut channels: Vec<&str> = self.targets.iter().map(|t| t.channel.as_str()).collect();
        if let Some(head) = &self.head {
            channels.push(head.axis.channel());
        }
        channels
    }

    pub fn shares_channel(&self, other: &Gesture) -> bool {
        let mine = self.occupied_channels();
        other.occupied_channels().iter().any(|c| mine.contains(c))
    }

    /// Same channel at an overlapping time
    pub fn conflicts_with(&self, other: &Gesture) -> bool {
        self.overlaps(other) && self.shares_channel(other)
    }

    /// Multiply intensity and clamp into [0,1]
    pub fn scale_intensity(&mut self, factor: f64) {
        self.intensity = (self.intensity * factor).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture(gesture_type: GestureType, start_ms: f64, duration_ms: f64, channel: &str) -> Gesture {
        Gesture {
            gesture_type,
            category: GestureCategory::Emphasis,
            intensity: 0.5,
            start_ms,
            duration_ms,
            targets: vec![BlendTarget::new(channel, 1.0)],
            head: None,
            source_word: None,
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = gesture(GestureType::Smile, 0.0, 100.0, "mouth_smile");
        let b = gesture(GestureType::Smile, 100.0, 100.0, "mouth_smile");
        assert!(!a.overlaps(&b));
        let c = gesture(GestureType::Smile, 99.0, 100.0, "mouth_smile");
        assert!(a.conflicts_with(&c));
    }

    #[test]
    fn test_head_axis_counts_as_channel() {
        let mut a = gesture(GestureType::Nod, 0.0, 300.0, "brow_inner_up");
        let mut b = gesture(GestureType::SlowNod, 100.0, 300.0, "cheek_squint");
        assert!(!a.shares_channel(&b));
        let nod = HeadMotion { axis: HeadAxis::Pitch, amplitude: 0.1, oscillations: 0 };
        a.head = Some(nod);
        b.head = Some(nod);
        assert!(a.conflicts_with(&b));
    }

    #[test]
    fn test_scale_intensity_clamps() {
        let mut g = gesture(GestureType::Nod, 0.0, 100.0, "x");
        g.scale_intensity(5.0);
        assert_eq!(g.intensity, 1.0);
        g.scale_intensity(-1.0);
        assert_eq!(g.intensity, 0.0);
    }

    #[test]
    fn test_category_priority_order() {
        let order = [
            GestureCategory::Emphasis,
            GestureCategory::Question,
            GestureCategory::Agreement,
            GestureCategory::Explanation,
            GestureCategory::Sentiment,
            GestureCategory::Idle,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].base_priority() > pair[1].base_priority());
        }
    }
}
