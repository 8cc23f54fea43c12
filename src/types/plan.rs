//! Movement plans and per-frame output

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

use crate::types::{
    Easing, Gesture, GestureCategory, GestureType, HeadAxis, MovementState, Resolution,
};

/// Head rotation delta in radians (x = pitch, y = yaw, z = roll)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadRotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl HeadRotation {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Component-wise linear interpolation (t not clamped, overshooting curves allowed)
    pub fn lerp(&self, other: &HeadRotation, t: f64) -> HeadRotation {
        HeadRotation {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub fn add(&self, other: &HeadRotation) -> HeadRotation {
        HeadRotation::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn max_abs(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    fn on_axis(axis: HeadAxis, value: f64) -> HeadRotation {
        match axis {
            HeadAxis::Pitch => HeadRotation::new(value, 0.0, 0.0),
            HeadAxis::Yaw => HeadRotation::new(0.0, value, 0.0),
            HeadAxis::Roll => HeadRotation::new(0.0, 0.0, value),
        }
    }
}

/// Timed head rotation derived from a gesture's head component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadMovement {
    pub source: GestureType,
    pub axis: HeadAxis,
    pub start_ms: f64,
    pub duration_ms: f64,
    /// Peak radians at intensity 1.0
    pub amplitude: f64,
    pub oscillations: u32,
    pub intensity: f64,
}

impl HeadMovement {
    /// Build from a gesture that carries a head component
    pub fn from_gesture(gesture: &Gesture) -> Option<HeadMovement> {
        gesture.head.map(|head| HeadMovement {
            source: gesture.gesture_type,
            axis: head.axis,
            start_ms: gesture.start_ms,
            duration_ms: gesture.duration_ms,
            amplitude: head.amplitude,
            oscillations: head.oscillations,
            intensity: gesture.intensity,
        })
    }

    pub fn end_ms(&self) -> f64 {
        self.start_ms + self.duration_ms
    }

    /// Peak rotation this movement can reach
    pub fn peak(&self) -> f64 {
        self.amplitude.abs() * self.intensity
    }

    /// Rotation contributed at plan-local time `t_ms`
    pub fn rotation_at(&self, t_ms: f64) -> HeadRotation {
        if self.duration_ms <= 0.0 || t_ms < self.start_ms || t_ms >= self.end_ms() {
            return HeadRotation::zero();
        }
        let p = (t_ms - self.start_ms) / self.duration_ms;
        let envelope = (PI * p).sin();
        let value = if self.oscillations == 0 {
            envelope
        } else {
            (2.0 * PI * self.oscillations as f64 * p).sin() * envelope
        };
        HeadRotation::on_axis(self.axis, self.amplitude * self.intensity * value)
    }
}

/// Meaning a plan carries, independent of the channel that shows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticIntent {
    Emphasis,
    Question,
    Feedback,
    Explanation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMarker {
    pub intent: SemanticIntent,
    pub word: Option<String>,
    pub time_offset_ms: f64,
    pub intensity: f64,
}

/// Blend curve to use when entering `to` (optionally only from `from`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    pub from: Option<MovementState>,
    pub to: MovementState,
    pub duration_ms: f64,
    pub easing: Easing,
}

/// Head movements + gestures + timing, the unit the orchestrator activates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementPlan {
    pub id: u64,
    pub head_movements: Vec<HeadMovement>,
    pub gestures: Vec<Gesture>,
    pub transitions: Vec<TransitionSpec>,
    pub total_duration_ms: f64,
    pub priority: f64,
    pub intents: Vec<IntentMarker>,
    /// Decisions taken while resolving this plan
    pub resolutions: Vec<Resolution>,
}

impl MovementPlan {
    pub fn empty(id: u64) -> Self {
        Self {
            id,
            head_movements: Vec::new(),
            gestures: Vec::new(),
            transitions: Vec::new(),
            total_duration_ms: 0.0,
            priority: 0.0,
            intents: Vec::new(),
            resolutions: Vec::new(),
        }
    }

    /// Rebuild head movements from the gestures' head components
    pub fn rebuild_head_movements(&mut self) {
        self.head_movements = self.gestures.iter().filter_map(HeadMovement::from_gesture).collect();
    }

    /// Longest of gestures, head movements and the given floor
    pub fn recompute_duration(&mut self, floor_ms: f64) {
        let gestures = self.gestures.iter().map(Gesture::end_ms).fold(0.0, f64::max);
        let heads = self.head_movements.iter().map(HeadMovement::end_ms).fold(0.0, f64::max);
        self.total_duration_ms = floor_ms.max(gestures).max(heads);
    }

    /// State this plan puts the orchestrator in. Tilt/eyebrow wins over
    /// emphasis whatever category produced it.
    pub fn target_state(&self) -> MovementState {
        if self.gestures.iter().any(|g| g.gesture_type.is_tilt_type()) {
            MovementState::Questioning
        } else if self.gestures.iter().any(|g| g.category == GestureCategory::Emphasis) {
            MovementState::Emphasizing
        } else {
            MovementState::Speaking
        }
    }

    /// Plans with the same movements are interchangeable
    pub fn same_movements(&self, other: &MovementPlan) -> bool {
        self.gestures == other.gestures
            && self.head_movements == other.head_movements
            && self.total_duration_ms == other.total_duration_ms
    }

    /// Most specific transition spec for entering this plan from `from`
    pub fn transition_from(&self, from: MovementState) -> Option<&TransitionSpec> {
        let to = self.target_state();
        self.transitions
            .iter()
            .find(|t| t.to == to && t.from == Some(from))
            .or_else(|| self.transitions.iter().find(|t| t.to == to && t.from.is_none()))
    }

    pub fn has_intent(&self, intent: SemanticIntent) -> bool {
        self.intents.iter().any(|i| i.intent == intent)
    }

    /// Output of this plan alone at plan-local time `t_ms`
    pub fn output_at(&self, t_ms: f64) -> FrameOutput {
        let head_rotation = self
            .head_movements
            .iter()
            .map(|h| h.rotation_at(t_ms))
            .fold(HeadRotation::zero(), |acc, r| acc.add(&r));

        let mut blend_shapes = BTreeMap::new();
        for gesture in &self.gestures {
            let envelope = gesture_envelope(gesture, t_ms);
            if envelope <= 0.0 {
                continue;
            }
            for target in &gesture.targets {
                let weight = (target.weight * gesture.intensity * envelope).clamp(0.0, 1.0);
                let slot = blend_shapes.entry(target.channel.clone()).or_insert(0.0);
                if weight > *slot {
                    *slot = weight;
                }
            }
        }
        FrameOutput { head_rotation, blend_shapes }
    }
}

/// Attack over the first quarter, hold, release over the last quarter
fn gesture_envelope(gesture: &Gesture, t_ms: f64) -> f64 {
    if gesture.duration_ms <= 0.0 || t_ms < gesture.start_ms || t_ms >= gesture.end_ms() {
        return 0.0;
    }
    let p = (t_ms - gesture.start_ms) / gesture.duration_ms;
    let ramp = if p < 0.25 {
        p / 0.25
    } else if p > 0.75 {
        (1.0 - p) / 0.25
    } else {
        1.0
    };
    smoothstep(ramp)
}

fn smoothstep(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Head rotation + gesture blend-shape weights for one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameOutput {
    pub head_rotation: HeadRotation,
    pub blend_shapes: BTreeMap<String, f64>,
}

impl FrameOutput {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn weight(&self, channel: &str) -> f64 {
        self.blend_shapes.get(channel).copied().unwrap_or(0.0)
    }

    /// Rotation and every weight within `eps` of rest
    pub fn is_neutral(&self, eps: f64) -> bool {
        self.head_rotation.max_abs() <= eps && self.blend_shapes.values().all(|w| w.abs() <= eps)
    }

    /// Largest difference in rotation or any channel weight
    pub fn max_diff(&self, other: &FrameOutput) -> f64 {
        let rot = HeadRotation::new(
            self.head_rotation.x - other.head_rotation.x,
            self.head_rotation.y - other.head_rotation.y,
            self.head_rotation.z - other.head_rotation.z,
        )
        .max_abs();
        self.blend_shapes
            .keys()
            .chain(other.blend_shapes.keys())
            .map(|k| (self.weight(k) - other.weight(k)).abs())
            .fold(rot, f64::max)
    }
}
