//! Integration tests for lip-sync
//!
//! Tests the path: text → phoneme timeline → viseme poses → player → rig

use avatar_behavior::config::BehaviorConfig;
use avatar_behavior::core::{AccentModulator, FrameBuffer, LipSyncPlayer, PhonemeTimelineGenerator};
use avatar_behavior::types::{AccentProfile, MouthPose, WordTiming, MOUTH_CHANNELS};
use proptest::prelude::*;

fn english() -> AccentProfile {
    AccentModulator::new().accent_for("en").clone()
}

/// Timeline ends exactly at the requested duration
#[test]
fn test_timeline_spans_duration() {
    let mut gen = PhonemeTimelineGenerator::new(1);
    let timeline = gen.generate("Hello, how are you today?", 2000.0, &english());
    assert!(!timeline.is_empty());
    assert_eq!(timeline.end_ms(), 2000.0);
    assert_eq!(timeline.segments[0].start_ms, 0.0);
    for pair in timeline.segments.windows(2) {
        assert_eq!(pair[0].end_ms, pair[1].start_ms);
    }
}

/// Same seed, same timeline
#[test]
fn test_seeded_generation_is_reproducible() {
    let a = PhonemeTimelineGenerator::new(42).generate("Thank you very much", 1500.0, &english());
    let b = PhonemeTimelineGenerator::new(42).generate("Thank you very much", 1500.0, &english());
    assert_eq!(a, b);
}

/// Accent remapping changes symbols, not the duration
#[test]
fn test_accent_remap_applies() {
    let modulator = AccentModulator::new();
    let ja = modulator.accent_for("ja").clone();
    let timeline = PhonemeTimelineGenerator::new(3).generate("hello", 800.0, &ja);
    assert!(timeline.segments.iter().all(|s| s.symbol != "L"));
    assert_eq!(timeline.end_ms(), 800.0);
}

/// Measured word timings place words inside their windows
#[test]
fn test_word_timings_drive_placement() {
    let timings = vec![WordTiming::new("hello", 100.0, 500.0), WordTiming::new("there", 700.0, 1100.0)];
    let timeline = PhonemeTimelineGenerator::new(1)
        .with_anticipation(0.0)
        .generate_with_word_timings(&timings, 1200.0, &english())
        .unwrap();
    assert!(timeline.segments[0].is_silence());
    assert_eq!(timeline.segments[0].end_ms, 100.0);
    assert_eq!(timeline.end_ms(), 1200.0);
    let gap = timeline.segment_index_at(600.0).unwrap();
    assert!(timeline.segments[gap].is_silence());
}

/// Stop 10ms in: neutral within 300ms, never instantly
#[test]
fn test_stop_reaches_neutral_within_window() {
    let config = BehaviorConfig::default();
    let timeline = PhonemeTimelineGenerator::new(1).generate("Ahhh wow amazing", 2000.0, &english());
    let mut player = LipSyncPlayer::new(&config);
    let mut rig = FrameBuffer::new();
    player.start(timeline);

    player.tick(10.0, &mut rig);
    let mut pose = player.tick(10.0, &mut rig);
    assert!(!pose.is_neutral(1e-6));
    player.stop();

    let first = player.tick(16.0, &mut rig);
    assert!(!first.is_neutral(1e-6), "mouth snapped to neutral");
    let mut elapsed = 16.0;
    while elapsed < 300.0 {
        pose = player.tick(16.0, &mut rig);
        elapsed += 16.0;
    }
    assert!(pose.is_neutral(1e-9));
    assert!(player.is_settled());
    assert_eq!(rig.weight(MOUTH_CHANNELS[0]), 0.0);
}

/// A rig without morph targets takes no mouth writes; playback continues
#[test]
fn test_missing_morph_targets_discards_output() {
    let config = BehaviorConfig::default();
    let timeline = PhonemeTimelineGenerator::new(1).generate("hello", 500.0, &english());
    let mut player = LipSyncPlayer::new(&config);
    let mut rig = FrameBuffer::without_morph_targets();
    player.start(timeline);
    for _ in 0..10 {
        player.tick(16.0, &mut rig);
    }
    assert!(rig.blend_shapes.is_empty());
    assert!(player.is_active());
    assert!(player.elapsed_ms() > 0.0);
}

proptest! {
    #[test]
    fn prop_timeline_ends_at_duration(text in "[a-zA-Z ,.!?]{0,60}", duration in 50.0f64..10_000.0, seed in any::<u64>()) {
        let timeline = PhonemeTimelineGenerator::new(seed).generate(&text, duration, &english());
        prop_assert!((timeline.end_ms() - duration).abs() < 1e-6);
        prop_assert!(timeline.segments.iter().all(|s| s.end_ms > s.start_ms));
    }

    #[test]
    fn prop_player_output_is_continuous(text in "[a-z]{1,8}( [a-z]{1,8}){0,6}", duration in 300.0f64..4000.0) {
        let config = BehaviorConfig::default();
        let bound = 1.0 - config.smoothing + 1e-9;
        let timeline = PhonemeTimelineGenerator::new(7).generate(&text, duration, &english());
        let mut player = LipSyncPlayer::new(&config);
        player.start(timeline);
        let mut last = MouthPose::neutral();
        let mut t = 0.0;
        while t < duration + 400.0 {
            let pose = player.update(16.0);
            prop_assert!(pose.max_diff(&last) <= bound, "jump {} at {}ms", pose.max_diff(&last), t);
            last = pose;
            t += 16.0;
        }
        prop_assert!(player.is_settled());
    }
}
