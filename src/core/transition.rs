//! Transition Engine
//!
//! Blends the output of an outgoing source into an incoming plan's output:
//! - head rotation: component-wise lerp by the eased progress
//! - blend shapes: union of channels; outgoing-only fade out,
//!   incoming-only fade in, shared channels lerp
//!
//! A `BlendState` exists only while a transition is in flight and is dropped
//! on completion, after the registered callback fires.

use std::collections::BTreeMap;
use tracing::debug;

pub use crate::types::Easing;
use crate::types::{FrameOutput, MovementPlan, MovementState};

/// Blend output for an eased progress value
pub fn blend_outputs(from: &FrameOutput, to: &FrameOutput, eased: f64) -> FrameOutput {
    let head_rotation = from.head_rotation.lerp(&to.head_rotation, eased);
    let mut blend_shapes = BTreeMap::new();
    for (channel, weight) in &from.blend_shapes {
        let w = match to.blend_shapes.get(channel) {
            Some(target) => weight + (target - weight) * eased,
            None => weight * (1.0 - eased),
        };
        blend_shapes.insert(channel.clone(), w.clamp(0.0, 1.0));
    }
    for (channel, weight) in &to.blend_shapes {
        if !from.blend_shapes.contains_key(channel) {
            blend_shapes.insert(channel.clone(), (weight * eased).clamp(0.0, 1.0));
        }
    }
    FrameOutput { head_rotation, blend_shapes }
}

/// Where the outgoing side of a blend comes from
#[derive(Debug, Clone)]
pub enum BlendSource {
    /// Outgoing plan keeps playing underneath the blend
    Plan { plan: MovementPlan, elapsed_ms: f64 },
    /// Output captured at the moment the blend began
    Frozen(FrameOutput),
    Neutral,
}

impl BlendSource {
    pub fn output(&self) -> FrameOutput {
        match self {
            BlendSource::Plan { plan, elapsed_ms } => plan.output_at(*elapsed_ms),
            BlendSource::Frozen(output) => output.clone(),
            BlendSource::Neutral => FrameOutput::neutral(),
        }
    }

    fn advance(&mut self, delta_ms: f64) {
        if let BlendSource::Plan { elapsed_ms, .. } = self {
            *elapsed_ms += delta_ms;
        }
    }
}

/// In-flight transition
#[derive(Debug, Clone)]
pub struct BlendState {
    pub from: BlendSource,
    pub from_state: MovementState,
    pub to_state: MovementState,
    pub duration_ms: f64,
    pub elapsed_ms: f64,
    pub easing: Easing,
}

impl BlendState {
    pub fn new(from: BlendSource, from_state: MovementState, to_state: MovementState, duration_ms: f64, easing: Easing) -> Self {
        Self { from, from_state, to_state, duration_ms: duration_ms.max(0.0), elapsed_ms: 0.0, easing }
    }

    /// Linear progress in [0,1]
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }

    pub fn eased(&self) -> f64 {
        self.easing.apply(self.progress())
    }
}

/// Reported when a transition completes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionEvent {
    pub from_state: MovementState,
    pub to_state: MovementState,
    pub duration_ms: f64,
}

pub type TransitionCallback = Box<dyn FnMut(&TransitionEvent) + Send>;

#[derive(Default)]
pub struct TransitionEngine {
    active: Option<BlendState>,
    callback: Option<TransitionCallback>,
    completed: u64,
}

impl std::fmt::Debug for TransitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEngine")
            .field("active", &self.active)
            .field("completed", &self.completed)
            .finish()
    }
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the completion callback (replaces any previous one)
    pub fn on_complete(&mut self, callback: TransitionCallback) {
        self.callback = Some(callback);
    }

    /// Start a blend, replacing any in-flight one
    pub fn begin(&mut self, state: BlendState) {
        debug!(
            from = %state.from_state,
            to = %state.to_state,
            duration_ms = state.duration_ms,
            easing = ?state.easing,
            "transition begin"
        );
        self.active = Some(state);
    }

    /// Drop the in-flight blend without completing it
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> Option<&BlendState> {
        self.active.as_ref()
    }

    pub fn completed_count(&self) -> u64 {
        self.completed
    }

    /// Advance the clock; completes (and discards) the blend at progress 1.0
    pub fn advance(&mut self, delta_ms: f64) -> Option<TransitionEvent> {
        let state = self.active.as_mut()?;
        state.elapsed_ms += delta_ms;
        state.from.advance(delta_ms);
        if state.progress() < 1.0 {
            return None;
        }
        let event = TransitionEvent {
            from_state: state.from_state,
            to_state: state.to_state,
            duration_ms: state.duration_ms,
        };
        self.active = None;
        self.completed += 1;
        if let Some(callback) = self.callback.as_mut() {
            callback(&event);
        }
        Some(event)
    }

    /// Output for this frame given the incoming side's output
    pub fn blend(&self, to: &FrameOutput) -> FrameOutput {
        match &self.active {
            Some(state) => blend_outputs(&state.from.output(), to, state.eased()),
            None => to.clone(),
        }
    }
}
