//! Cultural and accent profiles
//!
//! Static, keyed by language/region, referenced and never mutated at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::BehaviorError;

/// Broad region used for gesture amplitude modulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CulturalRegion {
    #[default]
    Western,
    Eastern,
    Mediterranean,
    Nordic,
    Other,
}

impl CulturalRegion {
    /// Multiplier applied to every resolved gesture intensity
    pub fn gesture_intensity_modifier(&self) -> f64 {
        match self {
            CulturalRegion::Western => 1.0,
            CulturalRegion::Eastern => 0.7,
            CulturalRegion::Mediterranean => 1.2,
            CulturalRegion::Nordic => 0.8,
            CulturalRegion::Other => 1.0,
        }
    }

    /// Default region for a language code ("en", "en-US", "ja", ...)
    pub fn for_language(language: &str) -> CulturalRegion {
        let primary = language
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" | "de" | "nl" | "fr" => CulturalRegion::Western,
            "ja" | "zh" | "ko" | "th" | "vi" => CulturalRegion::Eastern,
            "it" | "es" | "el" | "pt" => CulturalRegion::Mediterranean,
            "sv" | "no" | "nb" | "da" | "fi" | "is" => CulturalRegion::Nordic,
            _ => CulturalRegion::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CulturalRegion::Western => "western",
            CulturalRegion::Eastern => "eastern",
            CulturalRegion::Mediterranean => "mediterranean",
            CulturalRegion::Nordic => "nordic",
            CulturalRegion::Other => "other",
        }
    }
}

impl FromStr for CulturalRegion {
    type Err = BehaviorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "western" => Ok(CulturalRegion::Western),
            "eastern" => Ok(CulturalRegion::Eastern),
            "mediterranean" => Ok(CulturalRegion::Mediterranean),
            "nordic" => Ok(CulturalRegion::Nordic),
            "other" => Ok(CulturalRegion::Other),
            other => Err(BehaviorError::UnknownRegion(other.to_string())),
        }
    }
}

impl std::fmt::Display for CulturalRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Region-level movement style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalProfile {
    pub region: CulturalRegion,
    /// Multiplier on gesture intensity
    pub gesture_intensity: f64,
    /// Multiplier on head rotation amplitude
    pub head_amplitude: f64,
    /// Multiplier on gesture duration (>1.0 = slower, calmer)
    pub gesture_tempo: f64,
}

impl CulturalProfile {
    /// Profile that changes nothing
    pub fn neutral() -> Self {
        Self {
            region: CulturalRegion::Other,
            gesture_intensity: CulturalRegion::Other.gesture_intensity_modifier(),
            head_amplitude: 1.0,
            gesture_tempo: 1.0,
        }
    }
}

/// Relative duration weights for vowels vs consonants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RhythmProfile {
    pub vowel_stretch: f64,
    pub consonant_stretch: f64,
}

impl Default for RhythmProfile {
    fn default() -> Self {
        Self { vowel_stretch: 1.0, consonant_stretch: 1.0 }
    }
}

/// Per-language pronunciation and rhythm adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccentProfile {
    pub language: String,
    /// Phoneme substitutions applied before viseme lookup
    pub phoneme_remap: BTreeMap<String, String>,
    pub rhythm: RhythmProfile,
    /// Multiplier on gesture amplitude
    pub gesture_amplitude: f64,
}

impl AccentProfile {
    /// No remapping, even rhythm, unit amplitude
    pub fn neutral(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            phoneme_remap: BTreeMap::new(),
            rhythm: RhythmProfile::default(),
            gesture_amplitude: 1.0,
        }
    }

    /// Apply the remap table to one symbol
    pub fn remap<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.phoneme_remap.get(symbol).map(String::as_str).unwrap_or(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_modifiers() {
        assert_eq!(CulturalRegion::Western.gesture_intensity_modifier(), 1.0);
        assert_eq!(CulturalRegion::Eastern.gesture_intensity_modifier(), 0.7);
        assert_eq!(CulturalRegion::Mediterranean.gesture_intensity_modifier(), 1.2);
        assert_eq!(CulturalRegion::Nordic.gesture_intensity_modifier(), 0.8);
        assert_eq!(CulturalRegion::Other.gesture_intensity_modifier(), 1.0);
    }

    #[test]
    fn test_region_for_language() {
        assert_eq!(CulturalRegion::for_language("en-US"), CulturalRegion::Western);
        assert_eq!(CulturalRegion::for_language("ja"), CulturalRegion::Eastern);
        assert_eq!(CulturalRegion::for_language("it_IT"), CulturalRegion::Mediterranean);
        assert_eq!(CulturalRegion::for_language("sv"), CulturalRegion::Nordic);
        assert_eq!(CulturalRegion::for_language("xx"), CulturalRegion::Other);
    }

    #[test]
    fn test_region_parse() {
        assert_eq!("Nordic".parse::<CulturalRegion>().unwrap(), CulturalRegion::Nordic);
        assert!("atlantis".parse::<CulturalRegion>().is_err());
    }

    #[test]
    fn test_accent_remap_passthrough() {
        let mut accent = AccentProfile::neutral("es");
        accent.phoneme_remap.insert("TH".into(), "T".into());
        assert_eq!(accent.remap("TH"), "T");
        assert_eq!(accent.remap("AA"), "AA");
    }
}
