//! Content analysis results
//!
//! Derived once per utterance and read-only afterwards. Every item carries a
//! word index so estimated time offsets can be replaced by measured timings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::WordTiming;
use crate::CONFIDENCE_FLOOR;

/// What made a word emphasized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmphasisCue {
    Keyword,
    Modifier,
    Capitalization,
    Exclamation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmphasisPoint {
    pub word: String,
    /// Index into the utterance's word sequence
    pub word_index: usize,
    pub intensity: f64,
    pub confidence: f64,
    pub time_offset_ms: f64,
    pub cues: Vec<EmphasisCue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    YesNo,
    WhQuestion,
    Rhetorical,
    Confirmation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSegment {
    pub text: String,
    pub question_type: QuestionType,
    pub start_word: usize,
    pub word_count: usize,
    pub intensity: f64,
    pub confidence: f64,
    pub time_offset_ms: f64,
    /// Estimated spoken length of the segment
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationType {
    Definition,
    Process,
    Comparison,
    Example,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanatorySegment {
    pub text: String,
    pub explanation_type: ExplanationType,
    pub start_word: usize,
    /// 0.0-1.0 from average word length and sentence length
    pub complexity: f64,
    pub intensity: f64,
    pub confidence: f64,
    pub time_offset_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Excited,
    Concerned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentMarker {
    pub word: String,
    pub word_index: usize,
    pub sentiment: Sentiment,
    pub intensity: f64,
    pub confidence: f64,
    pub time_offset_ms: f64,
}

/// Conversational moves that are not emphasis, question or sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    Greeting,
    Farewell,
    Agreement,
    Disagreement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextualCue {
    pub kind: CueKind,
    pub word: String,
    pub word_index: usize,
    pub intensity: f64,
    pub confidence: f64,
    pub time_offset_ms: f64,
}

/// Full analysis of one utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub emphasis_points: Vec<EmphasisPoint>,
    pub question_segments: Vec<QuestionSegment>,
    pub explanatory_segments: Vec<ExplanatorySegment>,
    pub sentiment_markers: Vec<SentimentMarker>,
    pub contextual_cues: Vec<ContextualCue>,
    /// Intensity-weighted mean confidence, floored at 0.3
    pub confidence: f64,
    pub word_count: usize,
    /// True once offsets come from measured speech timing
    pub timing_measured: bool,
    pub analyzed_at: DateTime<Utc>,
}

impl ContentAnalysis {
    /// Analysis with no detected items
    pub fn empty() -> Self {
        Self {
            emphasis_points: Vec::new(),
            question_segments: Vec::new(),
            explanatory_segments: Vec::new(),
            sentiment_markers: Vec::new(),
            contextual_cues: Vec::new(),
            confidence: CONFIDENCE_FLOOR,
            word_count: 0,
            timing_measured: false,
            analyzed_at: Utc::now(),
        }
    }

    pub fn item_count(&self) -> usize {
        self.emphasis_points.len()
            + self.question_segments.len()
            + self.explanatory_segments.len()
            + self.sentiment_markers.len()
            + self.contextual_cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    pub fn has_emphasis(&self) -> bool {
        !self.emphasis_points.is_empty()
    }

    pub fn has_question(&self) -> bool {
        !self.question_segments.is_empty()
    }

    /// (intensity, confidence) of every detected item
    fn weighted_items(&self) -> Vec<(f64, f64)> {
        let mut items = Vec::with_capacity(self.item_count());
        items.extend(self.emphasis_points.iter().map(|e| (e.intensity, e.confidence)));
        items.extend(self.question_segments.iter().map(|q| (q.intensity, q.confidence)));
        items.extend(self.explanatory_segments.iter().map(|x| (x.intensity, x.confidence)));
        items.extend(self.sentiment_markers.iter().map(|s| (s.intensity, s.confidence)));
        items.extend(self.contextual_cues.iter().map(|c| (c.intensity, c.confidence)));
        items
    }

    /// Recompute overall confidence from the items
    pub fn recompute_confidence(&mut self) {
        let items = self.weighted_items();
        let weight: f64 = items.iter().map(|(i, _)| i).sum();
        self.confidence = if weight <= f64::EPSILON {
            CONFIDENCE_FLOOR
        } else {
            let mean = items.iter().map(|(i, c)| i * c).sum::<f64>() / weight;
            mean.clamp(CONFIDENCE_FLOOR, 1.0)
        };
    }

    /// Replace estimated offsets with measured word start times.
    ///
    /// Items whose word index falls outside `timings` keep their estimate.
    pub fn apply_word_timings(&mut self, timings: &[WordTiming]) -> Result<()> {
        WordTiming::validate_all(timings)?;
        let start_of = |idx: usize, fallback: f64| timings.get(idx).map(|t| t.start_ms).unwrap_or(fallback);

        for e in &mut self.emphasis_points {
            e.time_offset_ms = start_of(e.word_index, e.time_offset_ms);
        }
        for q in &mut self.question_segments {
            q.time_offset_ms = start_of(q.start_word, q.time_offset_ms);
            let last = q.start_word + q.word_count.saturating_sub(1);
            if let Some(end) = timings.get(last) {
                q.duration_ms = (end.end_ms - q.time_offset_ms).max(0.0);
            }
        }
        for x in &mut self.explanatory_segments {
            x.time_offset_ms = start_of(x.start_word, x.time_offset_ms);
        }
        for s in &mut self.sentiment_markers {
            s.time_offset_ms = start_of(s.word_index, s.time_offset_ms);
        }
        for c in &mut self.contextual_cues {
            c.time_offset_ms = start_of(c.word_index, c.time_offset_ms);
        }
        self.timing_measured = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(word_index: usize, intensity: f64, confidence: f64) -> EmphasisPoint {
        EmphasisPoint {
            word: "x".into(),
            word_index,
            intensity,
            confidence,
            time_offset_ms: word_index as f64 * 300.0,
            cues: vec![EmphasisCue::Keyword],
        }
    }

    #[test]
    fn test_empty_confidence_floor() {
        let mut analysis = ContentAnalysis::empty();
        analysis.recompute_confidence();
        assert_eq!(analysis.confidence, CONFIDENCE_FLOOR);
    }

    #[test]
    fn test_confidence_is_intensity_weighted() {
        let mut analysis = ContentAnalysis::empty();
        analysis.emphasis_points.push(point(0, 1.0, 0.9));
        analysis.emphasis_points.push(point(1, 0.5, 0.3));
        analysis.recompute_confidence();
        // (1.0*0.9 + 0.5*0.3) / 1.5 = 0.7
        assert!((analysis.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_word_timings_override_estimates() {
        let mut analysis = ContentAnalysis::empty();
        analysis.emphasis_points.push(point(1, 1.0, 1.0));
        analysis.emphasis_points.push(point(5, 1.0, 1.0));
        let timings = vec![WordTiming::new("a", 0.0, 90.0), WordTiming::new("b", 120.0, 400.0)];

        analysis.apply_word_timings(&timings).unwrap();

        assert_eq!(analysis.emphasis_points[0].time_offset_ms, 120.0);
        // Out of range keeps the estimate
        assert_eq!(analysis.emphasis_points[1].time_offset_ms, 1500.0);
        assert!(analysis.timing_measured);
    }
}
