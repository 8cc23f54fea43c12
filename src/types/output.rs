//! Per-tick report for hosts and terminal display

use serde::{Deserialize, Serialize};

use crate::types::{AlternativeCommunication, FrameOutput, MouthPose, MovementState};

/// What one `BehaviorEngine::update` produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    /// Engine clock after this tick
    pub clock_ms: f64,
    pub state: MovementState,
    pub mouth: MouthPose,
    pub output: FrameOutput,
    pub lip_sync_active: bool,
    /// Eased progress of an in-flight transition
    pub transition_progress: Option<f64>,
    /// Alternatives emitted by plans submitted during this tick
    pub alternatives: Vec<AlternativeCommunication>,
}

impl FrameReport {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.state.color_code();
        let reset = MovementState::color_reset();
        format!(
            "{}{} t={:.0}ms | state={} | jaw={:.2} | head=({:+.3},{:+.3},{:+.3}) | channels={}{}",
            color,
            self.state.emoji(),
            self.clock_ms,
            self.state,
            self.mouth.jaw_open,
            self.output.head_rotation.x,
            self.output.head_rotation.y,
            self.output.head_rotation.z,
            self.output.blend_shapes.len(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "t={:.0} | state={} | jaw={:.3} | head={:.4},{:.4},{:.4} | lipsync={} | channels={}",
            self.clock_ms,
            self.state,
            self.mouth.jaw_open,
            self.output.head_rotation.x,
            self.output.head_rotation.y,
            self.output.head_rotation.z,
            self.lip_sync_active,
            self.output.blend_shapes.len()
        )
    }
}
