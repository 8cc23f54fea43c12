//! Accent/Cultural Modulator
//!
//! Owns the accent profiles (phoneme remap + rhythm + gesture amplitude) and
//! cultural profiles (intensity, head amplitude, tempo). Missing profiles fall
//! back to neutral ones; nothing here fails.

use std::collections::HashMap;
use tracing::debug;

use crate::types::{AccentProfile, CulturalProfile, CulturalRegion, Gesture, RhythmProfile};

/// Built-in accent tables: (language, remap pairs, vowel stretch, consonant stretch, amplitude)
const BUILTIN_ACCENTS: &[(&str, &[(&str, &str)], f64, f64, f64)] = &[
    ("en", &[], 1.0, 1.0, 1.0),
    ("es", &[("Z", "S"), ("V", "B"), ("SH", "CH"), ("IH", "IY"), ("TH", "T")], 1.1, 0.95, 1.15),
    ("de", &[("W", "V"), ("TH", "Z"), ("DH", "D")], 0.95, 1.05, 0.9),
    ("ja", &[("L", "R"), ("V", "B"), ("TH", "S"), ("DH", "Z"), ("F", "HH")], 1.15, 0.9, 0.75),
    ("fr", &[("TH", "S"), ("DH", "Z"), ("HH", "SIL")], 1.05, 1.0, 1.1),
    ("nl", &[("TH", "T"), ("DH", "D")], 1.0, 1.0, 0.95),
];

/// Built-in cultural profiles: (region, head amplitude, tempo).
/// Intensity comes from `CulturalRegion::gesture_intensity_modifier`.
const BUILTIN_CULTURES: &[(CulturalRegion, f64, f64)] = &[
    (CulturalRegion::Western, 1.0, 1.0),
    (CulturalRegion::Eastern, 0.8, 1.15),
    (CulturalRegion::Mediterranean, 1.15, 0.9),
    (CulturalRegion::Nordic, 0.85, 1.1),
];

#[derive(Debug, Clone)]
pub struct AccentModulator {
    accents: HashMap<String, AccentProfile>,
    cultures: HashMap<CulturalRegion, CulturalProfile>,
    neutral_accent: AccentProfile,
    neutral_culture: CulturalProfile,
}

impl Default for AccentModulator {
    fn default() -> Self {
        Self::new()
    }
}

impl AccentModulator {
    /// Modulator with the built-in profiles
    pub fn new() -> Self {
        let mut modulator = Self::empty();
        for (language, remap, vowel, consonant, amplitude) in BUILTIN_ACCENTS {
            let mut profile = AccentProfile::neutral(*language);
            profile.phoneme_remap = remap.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect();
            profile.rhythm = RhythmProfile { vowel_stretch: *vowel, consonant_stretch: *consonant };
            profile.gesture_amplitude = *amplitude;
            modulator.register_accent(profile);
        }
        for (region, head, tempo) in BUILTIN_CULTURES {
            modulator.register_culture(CulturalProfile {
                region: *region,
                gesture_intensity: region.gesture_intensity_modifier(),
                head_amplitude: *head,
                gesture_tempo: *tempo,
            });
        }
        modulator
    }

    /// Modulator with no profiles; every lookup yields the neutral profile
    pub fn empty() -> Self {
        Self {
            accents: HashMap::new(),
            cultures: HashMap::new(),
            neutral_accent: AccentProfile::neutral("neutral"),
            neutral_culture: CulturalProfile::neutral(),
        }
    }

    pub fn register_accent(&mut self, profile: AccentProfile) {
        self.accents.insert(profile.language.to_ascii_lowercase(), profile);
    }

    pub fn register_culture(&mut self, profile: CulturalProfile) {
        self.cultures.insert(profile.region, profile);
    }

    /// Exact code first ("en-us"), then primary subtag ("en"), then neutral
    pub fn accent_for(&self, language: &str) -> &AccentProfile {
        let code = language.trim().to_ascii_lowercase().replace('_', "-");
        if let Some(profile) = self.accents.get(&code) {
            return profile;
        }
        let primary = code.split('-').next().unwrap_or("");
        match self.accents.get(primary) {
            Some(profile) => profile,
            None => {
                debug!(language, "no accent profile, using neutral");
                &self.neutral_accent
            }
        }
    }

    pub fn culture_for(&self, region: CulturalRegion) -> &CulturalProfile {
        match self.cultures.get(&region) {
            Some(profile) => profile,
            None => {
                debug!(region = %region, "no cultural profile, using neutral");
                &self.neutral_culture
            }
        }
    }

    /// Pre-resolution shaping: tempo stretches duration, head amplitude scales.
    ///
    /// Intensity is left alone here; the conflict resolver applies the
    /// cultural intensity modifier once, after retiming.
    pub fn shape_candidate(&self, gesture: &mut Gesture, language: &str, region: CulturalRegion) {
        let accent = self.accent_for(language);
        let culture = self.culture_for(region);
        gesture.duration_ms = (gesture.duration_ms * culture.gesture_tempo).max(0.0);
        if let Some(head) = gesture.head.as_mut() {
            head.amplitude *= culture.head_amplitude * accent.gesture_amplitude;
        }
        for target in &mut gesture.targets {
            target.weight = (target.weight * accent.gesture_amplitude).clamp(0.0, 1.0);
        }
    }
}
