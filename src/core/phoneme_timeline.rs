//! Phoneme Timeline Generator
//!
//! Text + total duration → time-ordered, contiguous phoneme segments.
//! Known words come from a small pronunciation dictionary; anything else
//! uses a letter heuristic (vowel letter → AH, consonant letter → T).
//! Word durations carry ±20% seeded jitter and every segment starts
//! `anticipation_ms` early so the mouth leads the sound.

use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::collections::HashMap;

use crate::core::viseme::VisemeMapper;
use crate::error::Result;
use crate::types::{AccentProfile, PhonemeSegment, PhonemeTimeline, WordTiming, SILENCE};
use crate::{ANTICIPATION_MS, INTER_WORD_SILENCE_MS, WORD_JITTER};

/// Fallback phoneme for vowel letters
pub const FALLBACK_VOWEL: &str = "AH";
/// Fallback phoneme for consonant letters
pub const FALLBACK_CONSONANT: &str = "T";

const VOWEL_WEIGHT: f64 = 1.4;
const CONSONANT_WEIGHT: f64 = 1.0;
const SILENCE_WEIGHT: f64 = 0.5;

const VOWEL_INTENSITY: f64 = 1.0;
const CONSONANT_INTENSITY: f64 = 0.7;
const SHOUTED_BOOST: f64 = 1.2;

const BUILTIN_DICTIONARY: &[(&str, &str)] = &[
    ("a", "AH"),
    ("about", "AH B AW T"),
    ("am", "AE M"),
    ("and", "AE N D"),
    ("are", "AA R"),
    ("be", "B IY"),
    ("but", "B AH T"),
    ("can", "K AE N"),
    ("do", "D UW"),
    ("does", "D AH Z"),
    ("for", "F AO R"),
    ("good", "G UH D"),
    ("great", "G R EY T"),
    ("have", "HH AE V"),
    ("hello", "HH AH L OW"),
    ("help", "HH EH L P"),
    ("hi", "HH AY"),
    ("how", "HH AW"),
    ("i", "AY"),
    ("important", "IH M P AO R T AH N T"),
    ("is", "IH Z"),
    ("it", "IH T"),
    ("know", "N OW"),
    ("me", "M IY"),
    ("my", "M AY"),
    ("no", "N OW"),
    ("not", "N AA T"),
    ("of", "AH V"),
    ("ok", "OW K EY"),
    ("please", "P L IY Z"),
    ("really", "R IH L IY"),
    ("thank", "TH AE NG K"),
    ("thanks", "TH AE NG K S"),
    ("that", "DH AE T"),
    ("the", "DH AH"),
    ("this", "DH IH S"),
    ("to", "T UW"),
    ("very", "V EH R IY"),
    ("we", "W IY"),
    ("what", "W AH T"),
    ("when", "W EH N"),
    ("where", "W EH R"),
    ("why", "W AY"),
    ("will", "W IH L"),
    ("with", "W IH DH"),
    ("yes", "Y EH S"),
    ("you", "Y UW"),
    ("your", "Y AO R"),
];

lazy_static! {
    static ref RE_WORD: Regex = Regex::new(r"[\p{L}\p{N}']+").unwrap();
}

/// One phoneme before timing is assigned
#[derive(Debug, Clone)]
struct PlannedPhoneme {
    symbol: String,
    weight: f64,
    intensity: f64,
}

#[derive(Debug)]
pub struct PhonemeTimelineGenerator {
    dictionary: HashMap<String, Vec<String>>,
    anticipation_ms: f64,
    rng: StdRng,
}

impl PhonemeTimelineGenerator {
    /// Generator with the built-in dictionary and a seeded jitter source
    pub fn new(seed: u64) -> Self {
        let dictionary = BUILTIN_DICTIONARY
            .iter()
            .map(|(word, phonemes)| {
                (word.to_string(), phonemes.split_whitespace().map(str::to_string).collect())
            })
            .collect();
        Self {
            dictionary,
            anticipation_ms: ANTICIPATION_MS,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_anticipation(mut self, anticipation_ms: f64) -> Self {
        self.anticipation_ms = anticipation_ms.max(0.0);
        self
    }

    /// Add or replace a dictionary entry
    pub fn add_word(&mut self, word: &str, phonemes: &[&str]) {
        self.dictionary.insert(
            word.to_lowercase(),
            phonemes.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Dictionary pronunciation, or the letter heuristic
    pub fn phonemes_for_word(&self, word: &str) -> Vec<String> {
        let lower = word.to_lowercase();
        if let Some(entry) = self.dictionary.get(&lower) {
            return entry.clone();
        }
        let mut phonemes: Vec<String> = Vec::new();
        for c in lower.chars() {
            let symbol = if is_vowel_letter(c) || c.is_numeric() {
                FALLBACK_VOWEL
            } else if c.is_alphabetic() {
                FALLBACK_CONSONANT
            } else {
                continue;
            };
            // Runs of the same fallback phoneme read as one articulation
            if phonemes.last().map(String::as_str) != Some(symbol) {
                phonemes.push(symbol.to_string());
            }
        }
        phonemes
    }

    /// Estimate a timeline for `text` spanning `total_duration_ms`
    pub fn generate(&mut self, text: &str, total_duration_ms: f64, accent: &AccentProfile) -> PhonemeTimeline {
        let total = sanitize_duration(total_duration_ms);
        let words: Vec<Vec<PlannedPhoneme>> = RE_WORD
            .find_iter(text)
            .map(|m| self.plan_word(m.as_str(), accent))
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() || total <= 0.0 {
            return PhonemeTimeline::new(vec![PhonemeSegment::silence(0.0, total)], total);
        }

        let gaps = words.len() - 1;
        let silence = if gaps > 0 {
            INTER_WORD_SILENCE_MS.min(total * 0.15 / gaps as f64)
        } else {
            0.0
        };
        let speech = total - silence * gaps as f64;

        let weights: Vec<f64> = words
            .iter()
            .map(|w| {
                let jitter = self.rng.gen_range((1.0 - WORD_JITTER)..=(1.0 + WORD_JITTER));
                w.iter().map(|p| p.weight).sum::<f64>() * jitter
            })
            .collect();
        let weight_sum: f64 = weights.iter().sum();

        let mut segments = Vec::new();
        let mut cursor = 0.0;
        for (i, (word, weight)) in words.iter().zip(weights.iter()).enumerate() {
            let word_duration = speech * weight / weight_sum;
            cursor = place_word(&mut segments, word, cursor, word_duration);
            if i < gaps {
                segments.push(PhonemeSegment::silence(cursor, cursor + silence));
                cursor += silence;
            }
        }

        self.finish(segments, total)
    }

    /// Timeline from measured word timings; each word's phonemes fill its window
    pub fn generate_with_word_timings(
        &mut self,
        timings: &[WordTiming],
        total_duration_ms: f64,
        accent: &AccentProfile,
    ) -> Result<PhonemeTimeline> {
        WordTiming::validate_all(timings)?;
        let last_end = timings.last().map(|t| t.end_ms).unwrap_or(0.0);
        let total = sanitize_duration(total_duration_ms).max(last_end);

        let mut segments = Vec::new();
        let mut cursor = 0.0;
        for timing in timings {
            let word = self.plan_word(&timing.word, accent);
            if word.is_empty() {
                continue;
            }
            if timing.start_ms > cursor {
                segments.push(PhonemeSegment::silence(cursor, timing.start_ms));
            }
            cursor = place_word(&mut segments, &word, timing.start_ms, timing.end_ms - timing.start_ms);
        }
        if segments.is_empty() {
            return Ok(PhonemeTimeline::new(vec![PhonemeSegment::silence(0.0, total)], total));
        }
        if cursor < total {
            segments.push(PhonemeSegment::silence(cursor, total));
        }
        Ok(self.finish(segments, total))
    }

    fn plan_word(&self, word: &str, accent: &AccentProfile) -> Vec<PlannedPhoneme> {
        let shouted = is_shouted(word);
        self.phonemes_for_word(word)
            .iter()
            .map(|raw| {
                let symbol = accent.remap(raw).to_string();
                let (weight, intensity) = if symbol == SILENCE {
                    (SILENCE_WEIGHT, 0.0)
                } else if VisemeMapper::is_vowel(&symbol) {
                    (VOWEL_WEIGHT * accent.rhythm.vowel_stretch, VOWEL_INTENSITY)
                } else {
                    (CONSONANT_WEIGHT * accent.rhythm.consonant_stretch, CONSONANT_INTENSITY)
                };
                let intensity = if shouted { (intensity * SHOUTED_BOOST).min(1.0) } else { intensity };
                PlannedPhoneme { symbol, weight: weight.max(0.01), intensity }
            })
            .collect()
    }

    /// Pin the last end to `total`, apply anticipation, drop empty segments
    fn finish(&self, mut segments: Vec<PhonemeSegment>, total: f64) -> PhonemeTimeline {
        if let Some(last) = segments.last_mut() {
            last.end_ms = total;
        }
        let starts: Vec<f64> = segments
            .iter()
            .map(|s| (s.start_ms - self.anticipation_ms).max(0.0))
            .collect();
        for (i, seg) in segments.iter_mut().enumerate() {
            seg.start_ms = starts[i];
            seg.end_ms = starts.get(i + 1).copied().unwrap_or(total);
        }
        segments.retain(|s| s.end_ms > s.start_ms);
        if segments.is_empty() {
            segments.push(PhonemeSegment::silence(0.0, total));
        }
        PhonemeTimeline::new(segments, total)
    }
}

/// Lay out one word's phonemes proportionally; returns the new cursor
fn place_word(segments: &mut Vec<PhonemeSegment>, word: &[PlannedPhoneme], start: f64, duration: f64) -> f64 {
    let weight_sum: f64 = word.iter().map(|p| p.weight).sum();
    let mut cursor = start;
    for p in word {
        let d = duration * p.weight / weight_sum;
        segments.push(PhonemeSegment::new(p.symbol.clone(), cursor, cursor + d, p.intensity));
        cursor += d;
    }
    start + duration
}

fn sanitize_duration(ms: f64) -> f64 {
    if ms.is_finite() { ms.max(0.0) } else { 0.0 }
}

fn is_vowel_letter(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'y'
            | 'à' | 'á' | 'â' | 'ä' | 'è' | 'é' | 'ê' | 'ë'
            | 'ì' | 'í' | 'î' | 'ï' | 'ò' | 'ó' | 'ô' | 'ö'
            | 'ù' | 'ú' | 'û' | 'ü'
    )
}

fn is_shouted(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}
