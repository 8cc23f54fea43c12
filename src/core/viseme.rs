//! Viseme Mapper: phoneme symbol → mouth pose
//!
//! Static ARPAbet lookup. Unknown symbols and silence map to neutral.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::types::{MouthPose, SILENCE};

// (symbol, jaw_open, lip_pucker, lip_spread, tongue_raise, teeth_show)
const VISEME_TABLE: &[(&str, f64, f64, f64, f64, f64)] = &[
    // Open vowels
    ("AA", 0.90, 0.00, 0.20, 0.00, 0.30),
    ("AE", 0.70, 0.00, 0.50, 0.10, 0.40),
    ("AH", 0.60, 0.00, 0.20, 0.00, 0.20),
    ("AO", 0.70, 0.50, 0.00, 0.00, 0.10),
    ("AW", 0.70, 0.40, 0.10, 0.00, 0.20),
    ("AY", 0.70, 0.00, 0.40, 0.10, 0.30),
    // Mid / front vowels
    ("EH", 0.50, 0.00, 0.50, 0.20, 0.40),
    ("ER", 0.40, 0.30, 0.10, 0.40, 0.20),
    ("EY", 0.40, 0.00, 0.60, 0.30, 0.50),
    ("IH", 0.30, 0.00, 0.60, 0.40, 0.50),
    ("IY", 0.20, 0.00, 0.80, 0.50, 0.60),
    // Rounded vowels
    ("OW", 0.50, 0.70, 0.00, 0.00, 0.10),
    ("OY", 0.50, 0.60, 0.20, 0.10, 0.20),
    ("UH", 0.30, 0.60, 0.00, 0.20, 0.10),
    ("UW", 0.20, 0.90, 0.00, 0.20, 0.00),
    // Bilabials close the lips
    ("B", 0.00, 0.20, 0.00, 0.00, 0.00),
    ("M", 0.00, 0.20, 0.00, 0.00, 0.00),
    ("P", 0.00, 0.30, 0.00, 0.00, 0.00),
    // Labiodentals show the upper teeth
    ("F", 0.10, 0.00, 0.20, 0.00, 0.80),
    ("V", 0.10, 0.00, 0.20, 0.00, 0.80),
    // Dentals put the tongue between the teeth
    ("TH", 0.20, 0.00, 0.20, 0.70, 0.60),
    ("DH", 0.20, 0.00, 0.20, 0.70, 0.60),
    // Alveolars
    ("T", 0.20, 0.00, 0.30, 0.80, 0.50),
    ("D", 0.20, 0.00, 0.30, 0.80, 0.50),
    ("N", 0.20, 0.00, 0.30, 0.80, 0.40),
    ("L", 0.30, 0.00, 0.30, 0.90, 0.40),
    ("S", 0.10, 0.00, 0.50, 0.60, 0.90),
    ("Z", 0.10, 0.00, 0.50, 0.60, 0.90),
    // Postalveolars push the lips forward
    ("SH", 0.20, 0.60, 0.00, 0.50, 0.70),
    ("ZH", 0.20, 0.60, 0.00, 0.50, 0.70),
    ("CH", 0.20, 0.50, 0.00, 0.60, 0.70),
    ("JH", 0.20, 0.50, 0.00, 0.60, 0.70),
    // Velars and glottal
    ("K", 0.30, 0.00, 0.20, 0.30, 0.30),
    ("G", 0.30, 0.00, 0.20, 0.30, 0.30),
    ("NG", 0.30, 0.00, 0.20, 0.30, 0.30),
    ("HH", 0.40, 0.00, 0.10, 0.00, 0.20),
    // Approximants
    ("R", 0.30, 0.50, 0.00, 0.40, 0.20),
    ("W", 0.20, 0.90, 0.00, 0.10, 0.00),
    ("Y", 0.20, 0.00, 0.60, 0.50, 0.50),
];

lazy_static! {
    static ref VISEMES: HashMap<&'static str, MouthPose> = VISEME_TABLE
        .iter()
        .map(|(s, jaw, pucker, spread, tongue, teeth)| {
            (*s, MouthPose::new(*jaw, *pucker, *spread, *tongue, *teeth))
        })
        .collect();
}

/// Phoneme → pose lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct VisemeMapper;

impl VisemeMapper {
    pub fn new() -> Self {
        Self
    }

    /// Static pose for a symbol; unknown symbols are neutral
    pub fn pose_for(&self, symbol: &str) -> MouthPose {
        if symbol == SILENCE {
            return MouthPose::neutral();
        }
        VISEMES.get(symbol).copied().unwrap_or_else(MouthPose::neutral)
    }

    pub fn is_known(&self, symbol: &str) -> bool {
        symbol == SILENCE || VISEMES.contains_key(symbol)
    }

    /// Vowel symbols carry the open-mouth weight in timing and intensity
    pub fn is_vowel(symbol: &str) -> bool {
        matches!(
            symbol,
            "AA" | "AE" | "AH" | "AO" | "AW" | "AY" | "EH" | "ER" | "EY" | "IH" | "IY" | "OW" | "OY" | "UH" | "UW"
        )
    }
}
