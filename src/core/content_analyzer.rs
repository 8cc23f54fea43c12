//! Content Analyzer
//!
//! Pure function of (text, context) → ContentAnalysis. Heuristics are
//! data-driven: each language has a `LanguageTables` bundle of keyword
//! lists and phrase lists, so locales swap without code changes.
//!
//! Time offsets are estimated from cumulative word length
//! (`MS_PER_CHAR` per character + `WORD_GAP_MS` per word) until measured
//! word timings replace them.

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::Result;
use crate::types::{
    ContentAnalysis, ContextualCue, CueKind, EmphasisCue, EmphasisPoint, ExplanationType,
    ExplanatorySegment, MovementContext, QuestionSegment, QuestionType, Sentiment, SentimentMarker,
    WordTiming,
};
use crate::{MS_PER_CHAR, QUESTION_DETECTION_THRESHOLD, WORD_GAP_MS};

lazy_static! {
    static ref RE_SENTENCE: Regex = Regex::new(r"[^.!?]+[.!?]*").unwrap();
    static ref RE_WORD: Regex = Regex::new(r"[\p{L}\p{N}']+").unwrap();
}

// Emphasis scoring
const KEYWORD_SCORE: f64 = 0.6;
const CAPS_KEYWORD_BONUS: f64 = 0.2;
const CAPS_SCORE: f64 = 0.5;
const MODIFIED_WORD_SCORE: f64 = 0.45;
const CAPS_MODIFIER_BOOST: f64 = 1.15;
const EXCLAMATION_BOOST: f64 = 1.2;
const EXCLAMATION_ONLY_SCORE: f64 = 0.5;

// Question confidence contributions
const QUESTION_MARK_WEIGHT: f64 = 0.5;
const LEADING_WORD_WEIGHT: f64 = 0.35;
const RHETORICAL_WEIGHT: f64 = 0.45;
const CONFIRMATION_WEIGHT: f64 = 0.3;
const CONTEXT_QUESTION_CONFIDENCE: f64 = 0.5;

// Sentiment
const SENTIMENT_BASE: f64 = 0.5;
const SENTIMENT_EXCLAMATION: f64 = 1.3;
const SENTIMENT_CAPS: f64 = 1.2;

/// Keyword and phrase tables for one language
#[derive(Debug, Clone)]
pub struct LanguageTables {
    pub language: String,
    pub emphasis_keywords: HashSet<String>,
    /// Intensity modifier → multiplier on the following word
    pub modifiers: HashMap<String, f64>,
    pub wh_words: HashSet<String>,
    pub auxiliaries: HashSet<String>,
    pub rhetorical_phrases: Vec<String>,
    /// Trailing tags that turn a statement into a confirmation question
    pub confirmation_tags: Vec<String>,
    pub explanation_indicators: Vec<(ExplanationType, Vec<String>)>,
    pub sentiment_words: HashMap<String, Sentiment>,
    pub cue_words: HashMap<String, CueKind>,
}

fn words(list: &[&str]) -> HashSet<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn phrases(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

fn tagged<T: Copy>(groups: &[(T, &[&str])]) -> HashMap<String, T> {
    let mut map = HashMap::new();
    for (tag, list) in groups {
        for w in list.iter() {
            map.insert(w.to_string(), *tag);
        }
    }
    map
}

impl LanguageTables {
    pub fn english() -> Self {
        Self {
            language: "en".to_string(),
            emphasis_keywords: words(&[
                "important", "essential", "critical", "crucial", "key", "must", "never", "always",
                "definitely", "vital", "significant", "remember", "warning", "urgent", "only",
                "best", "worst", "huge", "every", "need",
            ]),
            modifiers: [
                ("very", 1.3),
                ("really", 1.25),
                ("extremely", 1.5),
                ("so", 1.2),
                ("incredibly", 1.5),
                ("super", 1.3),
                ("absolutely", 1.4),
                ("truly", 1.25),
                ("highly", 1.3),
                ("totally", 1.3),
            ]
            .iter()
            .map(|(w, m)| (w.to_string(), *m))
            .collect(),
            wh_words: words(&["what", "who", "whom", "whose", "where", "when", "why", "how", "which"]),
            auxiliaries: words(&[
                "is", "are", "am", "was", "were", "do", "does", "did", "can", "could", "will",
                "would", "should", "shall", "may", "might", "have", "has", "had",
            ]),
            rhetorical_phrases: phrases(&[
                "who knows", "why not", "guess what", "you know what", "isn't it obvious",
                "what if", "who cares", "how about that",
            ]),
            confirmation_tags: phrases(&[
                "right", "correct", "ok", "okay", "isn't it", "aren't they", "don't you think",
                "wouldn't you", "agreed",
            ]),
            explanation_indicators: vec![
                (
                    ExplanationType::Definition,
                    phrases(&["means", "is defined as", "refers to", "in other words", "that is", "is called"]),
                ),
                (
                    ExplanationType::Process,
                    phrases(&["first", "then", "next", "finally", "step", "after that", "followed by"]),
                ),
                (
                    ExplanationType::Comparison,
                    phrases(&["compared to", "whereas", "unlike", "similar to", "on the other hand", "than"]),
                ),
                (
                    ExplanationType::Example,
                    phrases(&["for example", "for instance", "such as", "like when", "imagine"]),
                ),
            ],
            sentiment_words: tagged(&[
                (
                    Sentiment::Positive,
                    &["good", "great", "nice", "happy", "glad", "love", "wonderful", "thanks", "pleased", "perfect", "excellent"][..],
                ),
                (
                    Sentiment::Negative,
                    &["bad", "sad", "sorry", "unfortunately", "wrong", "terrible", "awful", "hate", "problem", "failed"][..],
                ),
                (
                    Sentiment::Excited,
                    &["amazing", "awesome", "fantastic", "incredible", "wow", "exciting", "excited", "brilliant"][..],
                ),
                (
                    Sentiment::Concerned,
                    &["worried", "concern", "concerned", "careful", "risk", "risky", "afraid", "unsure", "difficult", "danger"][..],
                ),
            ]),
            cue_words: tagged(&[
                (CueKind::Greeting, &["hello", "hi", "hey", "greetings", "welcome"][..]),
                (CueKind::Farewell, &["bye", "goodbye", "farewell", "cheers"][..]),
                (CueKind::Agreement, &["yes", "yeah", "yep", "agree", "exactly", "sure", "indeed"][..]),
                (CueKind::Disagreement, &["no", "nope", "disagree", "nah"][..]),
            ]),
        }
    }

    pub fn dutch() -> Self {
        Self {
            language: "nl".to_string(),
            emphasis_keywords: words(&[
                "belangrijk", "essentieel", "cruciaal", "nooit", "altijd", "moet", "zeker",
                "onthoud", "waarschuwing", "dringend", "alleen", "beste", "slechtste",
            ]),
            modifiers: [
                ("heel", 1.3),
                ("erg", 1.3),
                ("zeer", 1.35),
                ("echt", 1.25),
                ("super", 1.3),
                ("ontzettend", 1.5),
                ("enorm", 1.4),
                ("absoluut", 1.4),
            ]
            .iter()
            .map(|(w, m)| (w.to_string(), *m))
            .collect(),
            wh_words: words(&["wat", "wie", "waar", "wanneer", "waarom", "hoe", "welke", "welk"]),
            auxiliaries: words(&[
                "is", "zijn", "ben", "bent", "heb", "hebt", "heeft", "hebben", "kan", "kun", "kunt",
                "kunnen", "wil", "wilt", "willen", "moeten", "zal", "zou", "doe", "doet", "mag",
            ]),
            rhetorical_phrases: phrases(&["weet je wat", "wie weet", "waarom niet", "wie had dat gedacht"]),
            confirmation_tags: phrases(&["toch", "hè", "of niet", "klopt dat"]),
            explanation_indicators: vec![
                (
                    ExplanationType::Definition,
                    phrases(&["betekent", "houdt in", "met andere woorden", "wordt genoemd"]),
                ),
                (
                    ExplanationType::Process,
                    phrases(&["eerst", "daarna", "vervolgens", "tenslotte", "stap"]),
                ),
                (
                    ExplanationType::Comparison,
                    phrases(&["vergeleken met", "terwijl", "in tegenstelling tot", "net als", "dan"]),
                ),
                (
                    ExplanationType::Example,
                    phrases(&["bijvoorbeeld", "zoals", "stel je voor"]),
                ),
            ],
            sentiment_words: tagged(&[
                (Sentiment::Positive, &["goed", "fijn", "leuk", "mooi", "blij", "bedankt", "top"][..]),
                (Sentiment::Negative, &["slecht", "jammer", "helaas", "verkeerd", "probleem"][..]),
                (Sentiment::Excited, &["geweldig", "fantastisch", "wauw", "prachtig"][..]),
                (Sentiment::Concerned, &["zorgen", "bang", "moeilijk", "lastig", "voorzichtig"][..]),
            ]),
            cue_words: tagged(&[
                (CueKind::Greeting, &["hallo", "hoi", "goedemorgen", "goedemiddag", "goedenavond"][..]),
                (CueKind::Farewell, &["doei", "houdoe", "vaarwel"][..]),
                (CueKind::Agreement, &["ja", "precies", "inderdaad", "klopt", "akkoord", "prima"][..]),
                (CueKind::Disagreement, &["nee", "oneens", "onjuist"][..]),
            ]),
        }
    }
}

/// One word with its global index and estimated offset
#[derive(Debug, Clone)]
struct Token {
    text: String,
    lower: String,
    index: usize,
    offset_ms: f64,
    chars: usize,
}

#[derive(Debug)]
struct Sentence {
    text: String,
    terminator: Option<char>,
    tokens: Vec<Token>,
    /// Lowercased words joined with single spaces, padded on both ends
    padded: String,
}

impl Sentence {
    fn exclaims(&self) -> bool {
        self.terminator == Some('!')
    }

    fn asks(&self) -> bool {
        self.terminator == Some('?')
    }

    fn contains_phrase(&self, phrase: &str) -> bool {
        self.padded.contains(&format!(" {} ", phrase))
    }

    fn ends_with_phrase(&self, phrase: &str) -> bool {
        self.padded.ends_with(&format!(" {} ", phrase))
    }

    fn spoken_ms(&self) -> f64 {
        let chars: usize = self.tokens.iter().map(|t| t.chars).sum();
        chars as f64 * MS_PER_CHAR + WORD_GAP_MS * self.tokens.len().saturating_sub(1) as f64
    }
}

fn is_all_caps(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn split_sentences(text: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut index = 0;
    let mut offset_ms = 0.0;
    for m in RE_SENTENCE.find_iter(text) {
        let raw = m.as_str().trim();
        let tokens: Vec<Token> = RE_WORD
            .find_iter(raw)
            .map(|w| {
                let chars = w.as_str().chars().count();
                let token = Token {
                    text: w.as_str().to_string(),
                    lower: w.as_str().to_lowercase(),
                    index,
                    offset_ms,
                    chars,
                };
                index += 1;
                offset_ms += chars as f64 * MS_PER_CHAR + WORD_GAP_MS;
                token
            })
            .collect();
        if tokens.is_empty() {
            continue;
        }
        let joined: Vec<&str> = tokens.iter().map(|t| t.lower.as_str()).collect();
        sentences.push(Sentence {
            text: raw.to_string(),
            terminator: raw.chars().last().filter(|c| matches!(c, '.' | '!' | '?')),
            padded: format!(" {} ", joined.join(" ")),
            tokens,
        });
    }
    sentences
}

/// Owned analyzer holding one table bundle per language
#[derive(Debug, Clone)]
pub struct ContentAnalyzer {
    tables: HashMap<String, LanguageTables>,
    fallback: LanguageTables,
}

impl Default for ContentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentAnalyzer {
    /// Analyzer with English and Dutch tables; English is the fallback
    pub fn new() -> Self {
        let mut analyzer = Self { tables: HashMap::new(), fallback: LanguageTables::english() };
        analyzer.register(LanguageTables::english());
        analyzer.register(LanguageTables::dutch());
        analyzer
    }

    pub fn register(&mut self, tables: LanguageTables) {
        self.tables.insert(tables.language.to_ascii_lowercase(), tables);
    }

    /// Exact code, then primary subtag, then English
    pub fn tables_for(&self, language: &str) -> &LanguageTables {
        let code = language.trim().to_ascii_lowercase().replace('_', "-");
        if let Some(t) = self.tables.get(&code) {
            return t;
        }
        let primary = code.split('-').next().unwrap_or("");
        match self.tables.get(primary) {
            Some(t) => t,
            None => {
                debug!(language, "no language tables, using English");
                &self.fallback
            }
        }
    }

    pub fn analyze(&self, text: &str, ctx: &MovementContext) -> ContentAnalysis {
        let tables = self.tables_for(&ctx.language);
        let sentences = split_sentences(text);

        let mut analysis = ContentAnalysis::empty();
        analysis.word_count = sentences.iter().map(|s| s.tokens.len()).sum();
        analysis.analyzed_at = Utc::now();

        for sentence in &sentences {
            analysis.emphasis_points.extend(detect_emphasis(sentence, tables));
            analysis.question_segments.extend(detect_question(sentence, tables));
            analysis.explanatory_segments.extend(detect_explanation(sentence, tables));
            analysis.sentiment_markers.extend(detect_sentiment(sentence, tables));
            analysis.contextual_cues.extend(detect_cues(sentence, tables));
        }

        // The host says it is a question even though the text does not
        if ctx.is_question && analysis.question_segments.is_empty() {
            if let Some(last) = sentences.last() {
                analysis.question_segments.push(question_segment(
                    last,
                    QuestionType::YesNo,
                    CONTEXT_QUESTION_CONFIDENCE,
                ));
            }
        }

        analysis.recompute_confidence();
        debug!(
            words = analysis.word_count,
            items = analysis.item_count(),
            confidence = analysis.confidence,
            "content analyzed"
        );
        analysis
    }

    /// Analyze, then replace estimated offsets with measured word timings
    pub fn analyze_with_timings(
        &self,
        text: &str,
        ctx: &MovementContext,
        timings: &[WordTiming],
    ) -> Result<ContentAnalysis> {
        let mut analysis = self.analyze(text, ctx);
        analysis.apply_word_timings(timings)?;
        Ok(analysis)
    }
}

fn detect_emphasis(sentence: &Sentence, tables: &LanguageTables) -> Vec<EmphasisPoint> {
    let mut points = Vec::new();
    for (k, token) in sentence.tokens.iter().enumerate() {
        // Modifiers only amplify the word after them
        if tables.modifiers.contains_key(&token.lower) {
            continue;
        }
        let keyword = tables.emphasis_keywords.contains(&token.lower);
        let caps = is_all_caps(&token.text);
        let modifier = k
            .checked_sub(1)
            .and_then(|p| sentence.tokens.get(p))
            .and_then(|prev| tables.modifiers.get(&prev.lower).map(|m| (*m, is_all_caps(&prev.text))));

        let mut cues = Vec::new();
        let mut score = if keyword {
            cues.push(EmphasisCue::Keyword);
            KEYWORD_SCORE
        } else if caps {
            CAPS_SCORE
        } else if modifier.is_some() {
            MODIFIED_WORD_SCORE
        } else {
            continue;
        };
        if caps {
            cues.push(EmphasisCue::Capitalization);
            if keyword {
                score += CAPS_KEYWORD_BONUS;
            }
        }
        if let Some((multiplier, shouted)) = modifier {
            cues.push(EmphasisCue::Modifier);
            score *= multiplier;
            if shouted {
                score *= CAPS_MODIFIER_BOOST;
            }
        }
        if sentence.exclaims() {
            cues.push(EmphasisCue::Exclamation);
            score *= EXCLAMATION_BOOST;
        }
        points.push(EmphasisPoint {
            word: token.text.clone(),
            word_index: token.index,
            intensity: score.clamp(0.0, 1.0),
            confidence: (0.5 + 0.15 * cues.len() as f64).min(1.0),
            time_offset_ms: token.offset_ms,
            cues,
        });
    }

    // An exclamation with nothing else stresses its last word
    if points.is_empty() && sentence.exclaims() {
        if let Some(last) = sentence.tokens.last() {
            points.push(EmphasisPoint {
                word: last.text.clone(),
                word_index: last.index,
                intensity: EXCLAMATION_ONLY_SCORE,
                confidence: 0.65,
                time_offset_ms: last.offset_ms,
                cues: vec![EmphasisCue::Exclamation],
            });
        }
    }
    points
}

fn question_segment(sentence: &Sentence, question_type: QuestionType, confidence: f64) -> QuestionSegment {
    let first = &sentence.tokens[0];
    QuestionSegment {
        text: sentence.text.clone(),
        question_type,
        start_word: first.index,
        word_count: sentence.tokens.len(),
        intensity: confidence,
        confidence,
        time_offset_ms: first.offset_ms,
        duration_ms: sentence.spoken_ms(),
    }
}

fn detect_question(sentence: &Sentence, tables: &LanguageTables) -> Option<QuestionSegment> {
    let first = &sentence.tokens.first()?.lower;
    let starts_wh = tables.wh_words.contains(first);
    let starts_aux = tables.auxiliaries.contains(first);
    let rhetorical = tables.rhetorical_phrases.iter().any(|p| sentence.contains_phrase(p));
    let confirmation = tables.confirmation_tags.iter().any(|t| sentence.ends_with_phrase(t));

    let mut confidence: f64 = 0.0;
    if sentence.asks() {
        confidence += QUESTION_MARK_WEIGHT;
    }
    if starts_wh || starts_aux {
        confidence += LEADING_WORD_WEIGHT;
    }
    if rhetorical {
        confidence += RHETORICAL_WEIGHT;
    }
    if confirmation && sentence.asks() {
        confidence += CONFIRMATION_WEIGHT;
    }
    let confidence = confidence.min(1.0);
    if confidence < QUESTION_DETECTION_THRESHOLD {
        return None;
    }

    let question_type = if rhetorical {
        QuestionType::Rhetorical
    } else if confirmation && sentence.asks() {
        QuestionType::Confirmation
    } else if starts_wh {
        QuestionType::WhQuestion
    } else {
        QuestionType::YesNo
    };
    Some(question_segment(sentence, question_type, confidence))
}

fn detect_explanation(sentence: &Sentence, tables: &LanguageTables) -> Option<ExplanatorySegment> {
    let mut best: Option<(ExplanationType, usize)> = None;
    let mut total = 0;
    for (kind, indicators) in &tables.explanation_indicators {
        let hits = indicators.iter().filter(|p| sentence.contains_phrase(p)).count();
        total += hits;
        if hits > 0 && best.map_or(true, |(_, b)| hits > b) {
            best = Some((*kind, hits));
        }
    }
    let (explanation_type, _) = best?;

    let n = sentence.tokens.len() as f64;
    let avg_len = sentence.tokens.iter().map(|t| t.chars).sum::<usize>() as f64 / n;
    let complexity = (((avg_len - 3.0) / 5.0).clamp(0.0, 1.0) * 0.5 + (n / 25.0).min(1.0) * 0.5).clamp(0.0, 1.0);
    let first = &sentence.tokens[0];
    Some(ExplanatorySegment {
        text: sentence.text.clone(),
        explanation_type,
        start_word: first.index,
        complexity,
        intensity: 0.4 + 0.4 * complexity,
        confidence: (0.6 + 0.1 * (total as f64 - 1.0)).min(0.9),
        time_offset_ms: first.offset_ms,
    })
}

fn detect_sentiment(sentence: &Sentence, tables: &LanguageTables) -> Vec<SentimentMarker> {
    let mut markers = Vec::new();
    for (k, token) in sentence.tokens.iter().enumerate() {
        let Some(sentiment) = tables.sentiment_words.get(&token.lower) else {
            continue;
        };
        let mut intensity = SENTIMENT_BASE;
        let mut amplifiers = 0;
        if sentence.exclaims() {
            intensity *= SENTIMENT_EXCLAMATION;
            amplifiers += 1;
        }
        if let Some(m) = k
            .checked_sub(1)
            .and_then(|p| sentence.tokens.get(p))
            .and_then(|prev| tables.modifiers.get(&prev.lower))
        {
            intensity *= m;
            amplifiers += 1;
        }
        if is_all_caps(&token.text) {
            intensity *= SENTIMENT_CAPS;
            amplifiers += 1;
        }
        markers.push(SentimentMarker {
            word: token.text.clone(),
            word_index: token.index,
            sentiment: *sentiment,
            intensity: intensity.clamp(0.0, 1.0),
            confidence: (0.6 + 0.1 * amplifiers as f64).min(0.9),
            time_offset_ms: token.offset_ms,
        });
    }
    markers
}

fn detect_cues(sentence: &Sentence, tables: &LanguageTables) -> Vec<ContextualCue> {
    sentence
        .tokens
        .iter()
        .enumerate()
        .filter_map(|(k, token)| {
            let kind = *tables.cue_words.get(&token.lower)?;
            let intensity = match kind {
                CueKind::Farewell => 0.5,
                _ => 0.6,
            };
            Some(ContextualCue {
                kind,
                word: token.text.clone(),
                word_index: token.index,
                intensity,
                confidence: if k == 0 { 0.8 } else { 0.7 },
                time_offset_ms: token.offset_ms,
            })
        })
        .collect()
}

/// Estimated speaking time when the speech layer reports no duration
pub fn estimate_duration_ms(text: &str) -> f64 {
    let (chars, words) = RE_WORD
        .find_iter(text)
        .fold((0usize, 0usize), |(c, w), m| (c + m.as_str().chars().count(), w + 1));
    chars as f64 * MS_PER_CHAR + WORD_GAP_MS * words.saturating_sub(1) as f64
}

// =============================================================================
// TESTS
// =============================================================================
