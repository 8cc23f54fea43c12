//! Renderer/rig boundary
//!
//! The core only writes: named blend-shape weights and a head rotation delta.
//! It never reads geometry.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::HeadRotation;

/// Write-only view of the avatar rig
pub trait RigTarget {
    /// False when the model has no morphable meshes at all
    fn has_morph_targets(&self) -> bool;

    /// Write one channel weight. Returns false when the channel does not
    /// exist; a missing channel is never an error.
    fn set_blend_shape(&mut self, channel: &str, weight: f64) -> bool;

    fn set_head_rotation(&mut self, rotation: HeadRotation);
}

/// In-memory rig used by the CLI, the API and tests.
///
/// With a channel whitelist only those channels accept writes; without one
/// every channel does.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    pub blend_shapes: BTreeMap<String, f64>,
    pub head_rotation: HeadRotation,
    channels: Option<BTreeSet<String>>,
    morph_targets: bool,
    /// Count of writes to unknown channels
    pub dropped_writes: usize,
}

impl FrameBuffer {
    /// Rig accepting every channel
    pub fn new() -> Self {
        Self { morph_targets: true, ..Self::default() }
    }

    /// Rig exposing only the listed channels
    pub fn with_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: Some(channels.into_iter().map(Into::into).collect()),
            morph_targets: true,
            ..Self::default()
        }
    }

    /// Model loaded without any morphable meshes
    pub fn without_morph_targets() -> Self {
        Self { channels: Some(BTreeSet::new()), morph_targets: false, ..Self::default() }
    }

    pub fn weight(&self, channel: &str) -> f64 {
        self.blend_shapes.get(channel).copied().unwrap_or(0.0)
    }
}

impl RigTarget for FrameBuffer {
    fn has_morph_targets(&self) -> bool {
        self.morph_targets
    }

    fn set_blend_shape(&mut self, channel: &str, weight: f64) -> bool {
        let known = match &self.channels {
            Some(set) => set.contains(channel),
            None => self.morph_targets,
        };
        if !known {
            self.dropped_writes += 1;
            return false;
        }
        self.blend_shapes.insert(channel.to_string(), weight.clamp(0.0, 1.0));
        true
    }

    fn set_head_rotation(&mut self, rotation: HeadRotation) {
        self.head_rotation = rotation;
    }
}
