//! Lip-Sync Player
//!
//! Per-frame loop over a phoneme timeline:
//! - find the segment containing the elapsed time
//! - in the last `segment_blend_ms` of a segment, ease toward the next pose
//! - exponentially smooth toward that target before writing
//!
//! Every stop path (explicit stop, natural end, teardown) blends to the
//! neutral pose over `neutral_blend_ms`. The mouth never snaps.

use tracing::{debug, warn};

use crate::config::BehaviorConfig;
use crate::core::rig::RigTarget;
use crate::core::viseme::VisemeMapper;
use crate::types::{cubic_in_out, MouthPose, PhonemeTimeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LipSyncMode {
    Idle,
    Playing,
    /// Blending to neutral after a stop
    Stopping,
}

#[derive(Debug)]
pub struct LipSyncPlayer {
    mapper: VisemeMapper,
    timeline: Option<PhonemeTimeline>,
    mode: LipSyncMode,
    elapsed_ms: f64,
    pose: MouthPose,
    smoothing: f64,
    segment_blend_ms: f64,
    neutral_blend_ms: f64,
    stop_from: MouthPose,
    stop_elapsed_ms: f64,
    warned_no_targets: bool,
}

impl LipSyncPlayer {
    pub fn new(config: &BehaviorConfig) -> Self {
        Self {
            mapper: VisemeMapper::new(),
            timeline: None,
            mode: LipSyncMode::Idle,
            elapsed_ms: 0.0,
            pose: MouthPose::neutral(),
            smoothing: config.smoothing,
            segment_blend_ms: config.segment_blend_ms,
            neutral_blend_ms: config.neutral_blend_ms,
            stop_from: MouthPose::neutral(),
            stop_elapsed_ms: 0.0,
            warned_no_targets: false,
        }
    }

    /// Begin playback; the current pose carries over so there is no pop
    pub fn start(&mut self, timeline: PhonemeTimeline) {
        debug!(segments = timeline.len(), duration_ms = timeline.total_duration_ms, "lip-sync start");
        self.timeline = Some(timeline);
        self.elapsed_ms = 0.0;
        self.mode = LipSyncMode::Playing;
    }

    /// Cancel playback and blend to neutral
    pub fn stop(&mut self) {
        match self.mode {
            LipSyncMode::Playing => self.begin_neutral_blend(),
            LipSyncMode::Idle if !self.pose.is_neutral(1e-9) => self.begin_neutral_blend(),
            _ => {}
        }
    }

    /// Teardown uses the same neutral blend as stop; the host keeps ticking
    /// until `is_settled()`
    pub fn begin_shutdown(&mut self) {
        self.stop();
    }

    pub fn is_settled(&self) -> bool {
        self.mode == LipSyncMode::Idle && self.pose.is_neutral(1e-9)
    }

    pub fn mode(&self) -> LipSyncMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode != LipSyncMode::Idle
    }

    pub fn pose(&self) -> MouthPose {
        self.pose
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Advance by `delta_ms` and return the new smoothed pose
    pub fn update(&mut self, delta_ms: f64) -> MouthPose {
        let delta_ms = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        match self.mode {
            LipSyncMode::Idle => {}
            LipSyncMode::Playing => {
                self.elapsed_ms += delta_ms;
                let end = self.timeline.as_ref().map(PhonemeTimeline::end_ms).unwrap_or(0.0);
                if self.elapsed_ms >= end {
                    self.begin_neutral_blend();
                    self.advance_neutral_blend(0.0);
                } else {
                    let target = self.target_pose(self.elapsed_ms);
                    self.pose = self.pose.lerp(&target, 1.0 - self.smoothing);
                }
            }
            LipSyncMode::Stopping => self.advance_neutral_blend(delta_ms),
        }
        self.pose
    }

    /// Write the current pose to the mouth channels.
    ///
    /// Without morph targets nothing is written; this is logged once.
    pub fn write(&mut self, rig: &mut dyn RigTarget) {
        if !rig.has_morph_targets() {
            if !self.warned_no_targets {
                warn!("rig has no morph targets, lip-sync output discarded");
                self.warned_no_targets = true;
            }
            return;
        }
        for (channel, weight) in self.pose.channels() {
            rig.set_blend_shape(channel, weight);
        }
    }

    /// `update` then `write`
    pub fn tick(&mut self, delta_ms: f64, rig: &mut dyn RigTarget) -> MouthPose {
        let pose = self.update(delta_ms);
        self.write(rig);
        pose
    }

    /// Unsmoothed target pose at `t_ms`, including boundary interpolation
    pub fn target_pose(&self, t_ms: f64) -> MouthPose {
        let Some(timeline) = &self.timeline else {
            return MouthPose::neutral();
        };
        let Some(idx) = timeline.segment_index_at(t_ms) else {
            return MouthPose::neutral();
        };
        let seg = &timeline.segments[idx];
        let pose = self.mapper.pose_for(&seg.symbol).scale(seg.intensity);

        let Some(next) = timeline.segments.get(idx + 1) else {
            return pose;
        };
        let window = self.segment_blend_ms.min(seg.duration_ms());
        let remaining = seg.end_ms - t_ms;
        if window <= 0.0 || remaining >= window {
            return pose;
        }
        let next_pose = self.mapper.pose_for(&next.symbol).scale(next.intensity);
        let factor = 1.0 - remaining / window;
        pose.lerp(&next_pose, cubic_in_out(factor))
    }

    fn begin_neutral_blend(&mut self) {
        debug!(elapsed_ms = self.elapsed_ms, "lip-sync blending to neutral");
        self.mode = LipSyncMode::Stopping;
        self.stop_from = self.pose;
        self.stop_elapsed_ms = 0.0;
    }

    fn advance_neutral_blend(&mut self, delta_ms: f64) {
        self.stop_elapsed_ms += delta_ms;
        let progress = (self.stop_elapsed_ms / self.neutral_blend_ms).min(1.0);
        self.pose = self.stop_from.lerp(&MouthPose::neutral(), cubic_in_out(progress));
        if progress >= 1.0 {
            self.pose = MouthPose::neutral();
            self.mode = LipSyncMode::Idle;
            self.timeline = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rig::FrameBuffer;
    use crate::types::PhonemeSegment;

    fn timeline() -> PhonemeTimeline {
        PhonemeTimeline::new(
            vec![
                PhonemeSegment::new("AA", 0.0, 200.0, 1.0),
                PhonemeSegment::new("M", 200.0, 400.0, 0.7),
                PhonemeSegment::silence(400.0, 500.0),
            ],
            500.0,
        )
    }

    #[test]
    fn test_target_pose_inside_segment() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        player.start(timeline());
        let aa = VisemeMapper::new().pose_for("AA");
        assert_eq!(player.target_pose(50.0), aa);
    }

    #[test]
    fn test_boundary_window_moves_toward_next() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        player.start(timeline());
        let aa = VisemeMapper::new().pose_for("AA");
        let near_end = player.target_pose(190.0);
        assert!(near_end.jaw_open < aa.jaw_open);
        assert!(near_end.jaw_open > 0.0);
    }

    #[test]
    fn test_smoothing_retains_previous_pose() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        player.start(timeline());
        let pose = player.update(16.0);
        let aa = VisemeMapper::new().pose_for("AA");
        assert!((pose.jaw_open - aa.jaw_open * 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_stop_blends_to_neutral_without_snapping() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        player.start(timeline());
        for _ in 0..5 {
            player.update(16.0);
        }
        let before = player.pose();
        player.stop();
        let first = player.update(16.0);
        assert!(!first.is_neutral(1e-6));
        assert!(first.max_diff(&before) < 0.1);

        let mut t = 16.0;
        while t < 300.0 {
            player.update(16.0);
            t += 16.0;
        }
        assert!(player.pose().is_neutral(1e-9));
        assert!(player.is_settled());
    }

    #[test]
    fn test_natural_end_blends_out() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        player.start(timeline());
        for _ in 0..20 {
            player.update(16.0);
        }
        player.update(200.0);
        assert_eq!(player.mode(), LipSyncMode::Stopping);
        player.update(300.0);
        assert!(player.is_settled());
    }

    #[test]
    fn test_missing_morph_targets_still_runs() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        let mut rig = FrameBuffer::without_morph_targets();
        player.start(timeline());
        let pose = player.tick(16.0, &mut rig);
        assert!(pose.jaw_open > 0.0);
        assert!(rig.blend_shapes.is_empty());
        player.tick(16.0, &mut rig);
        assert_eq!(rig.dropped_writes, 0);
    }

    #[test]
    fn test_writes_only_mouth_channels() {
        let mut player = LipSyncPlayer::new(&BehaviorConfig::default());
        let mut rig = FrameBuffer::new();
        player.start(timeline());
        player.tick(16.0, &mut rig);
        assert!(rig.blend_shapes.keys().all(|k| k.starts_with("viseme_")));
        assert!(rig.weight("viseme_jaw_open") > 0.0);
    }
}
