//! Pattern Tracker
//!
//! Rolling history of emitted (type, intensity bucket) keys. A gesture type
//! already used `repeat_limit` times inside the window is swapped for an
//! alternate from a fixed table, with ±10-20% jitter on intensity and
//! duration. The start time never moves.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::core::gesture_db::GestureDatabase;
use crate::types::{Gesture, GestureType, ReasonCode, Resolution};
use crate::{PATTERN_JITTER_MAX, PATTERN_JITTER_MIN};

const ALTERNATES: &[(GestureType, &[GestureType])] = &[
    (GestureType::Nod, &[GestureType::SlowNod, GestureType::EyebrowRaise]),
    (GestureType::SlowNod, &[GestureType::Nod, GestureType::HeadTilt]),
    (GestureType::HeadTilt, &[GestureType::EyebrowRaise, GestureType::SlowNod]),
    (GestureType::HeadShake, &[GestureType::BrowFurrow, GestureType::HeadTurn]),
    (GestureType::HeadTurn, &[GestureType::HeadTilt, GestureType::SlowNod]),
    (GestureType::EyebrowRaise, &[GestureType::HeadTilt, GestureType::Nod]),
    (GestureType::BrowFurrow, &[GestureType::HeadTilt, GestureType::SlowNod]),
    (GestureType::Smile, &[GestureType::EyebrowRaise, GestureType::SlowNod]),
];

/// One emitted gesture in the history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageRecord {
    pub at_ms: f64,
    pub gesture_type: GestureType,
    /// Intensity quantized into 4 buckets
    pub bucket: u8,
}

fn bucket(intensity: f64) -> u8 {
    ((intensity.clamp(0.0, 1.0) * 4.0) as u8).min(3)
}

#[derive(Debug)]
pub struct PatternTracker {
    history: VecDeque<UsageRecord>,
    window_ms: f64,
    repeat_limit: usize,
    alternates: HashMap<GestureType, Vec<GestureType>>,
    rng: StdRng,
}

impl PatternTracker {
    pub fn new(window_ms: f64, repeat_limit: usize, seed: u64) -> Self {
        Self {
            history: VecDeque::new(),
            window_ms,
            repeat_limit: repeat_limit.max(1),
            alternates: ALTERNATES.iter().map(|(t, alts)| (*t, alts.to_vec())).collect(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn history(&self) -> &VecDeque<UsageRecord> {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Uses of `gesture_type` in the window ending at `at_ms`
    pub fn usage_count(&self, gesture_type: GestureType, at_ms: f64) -> usize {
        let from = at_ms - self.window_ms;
        self.history
            .iter()
            .filter(|r| r.gesture_type == gesture_type && r.at_ms > from && r.at_ms <= at_ms)
            .count()
    }

    fn prune(&mut self, now_ms: f64) {
        let from = now_ms - self.window_ms;
        while self.history.front().is_some_and(|r| r.at_ms <= from) {
            self.history.pop_front();
        }
    }

    fn jitter(&mut self) -> f64 {
        let magnitude = self.rng.gen_range(PATTERN_JITTER_MIN..=PATTERN_JITTER_MAX);
        if self.rng.gen_bool(0.5) {
            1.0 + magnitude
        } else {
            1.0 - magnitude
        }
    }

    /// Vary repeated gestures in a resolved, conflict-free plan.
    ///
    /// `now_ms` is the absolute clock the plan starts at; gesture starts
    /// are plan-relative.
    pub fn apply(&mut self, gestures: &mut [Gesture], now_ms: f64, db: &GestureDatabase) -> Vec<Resolution> {
        self.prune(now_ms);
        let mut resolutions = Vec::new();

        for i in 0..gestures.len() {
            let current = gestures[i].clone();
            let at_ms = now_ms + current.start_ms;
            let overused = self.usage_count(current.gesture_type, at_ms) >= self.repeat_limit;
            let alternates = self.alternates.get(&current.gesture_type).cloned().unwrap_or_default();

            if overused && !alternates.is_empty() {
                // Least-used alternate first; random order breaks ties
                let mut order = alternates;
                order.shuffle(&mut self.rng);
                order.sort_by_key(|t| self.usage_count(*t, at_ms));

                let intensity_jitter = self.jitter();
                let duration_jitter = self.jitter();
                let mut replacement = None;
                for alt in order {
                    let candidate = db.instantiate(
                        alt,
                        current.category,
                        current.start_ms,
                        current.intensity * intensity_jitter,
                        current.duration_ms * duration_jitter,
                        current.source_word.clone(),
                    );
                    if let Some(fitted) = fit_between(candidate, gestures, i) {
                        replacement = Some(fitted);
                        break;
                    }
                }

                match replacement {
                    Some(new) => {
                        debug!(from = %current.gesture_type, to = %new.gesture_type, "repeated gesture substituted");
                        let mut r = Resolution::new(
                            current.gesture_type,
                            ReasonCode::R201_PATTERN_SUBSTITUTED,
                            current.start_ms,
                            new.start_ms,
                        );
                        r.replaced_with = Some(new.gesture_type);
                        resolutions.push(r);
                        gestures[i] = new;
                    }
                    None => {
                        resolutions.push(Resolution::new(
                            current.gesture_type,
                            ReasonCode::R202_PATTERN_SUBSTITUTION_BLOCKED,
                            current.start_ms,
                            current.start_ms,
                        ));
                    }
                }
            }

            let emitted = &gestures[i];
            self.history.push_back(UsageRecord {
                at_ms,
                gesture_type: emitted.gesture_type,
                bucket: bucket(emitted.intensity),
            });
        }
        resolutions
    }
}

/// Shorten `candidate` so it ends before any later gesture on a shared
/// channel; reject it if a conflict remains.
fn fit_between(mut candidate: Gesture, gestures: &[Gesture], skip: usize) -> Option<Gesture> {
    for (j, other) in gestures.iter().enumerate() {
        if j != skip && other.start_ms > candidate.start_ms && candidate.conflicts_with(other) {
            candidate.duration_ms = candidate.duration_ms.min(other.start_ms - candidate.start_ms);
        }
    }
    let clear = gestures
        .iter()
        .enumerate()
        .all(|(j, other)| j == skip || !candidate.conflicts_with(other));
    (clear && candidate.duration_ms > 0.0).then_some(candidate)
}
