//! Gesture Candidate Database
//!
//! Static catalog: content classification → candidate gestures.
//! Every gesture type has one canonical shape (blend targets + head motion);
//! content mappings pick types and set base intensity and duration.
//!
//! Gesture channels never overlap the `viseme_*` mouth channels.

use std::collections::HashMap;

use crate::types::{
    BlendTarget, ContentAnalysis, CueKind, ExplanationType, Gesture, GestureCategory, GestureType,
    HeadAxis, HeadMotion, QuestionType, Sentiment,
};

/// Classification a candidate is looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKey {
    Emphasis,
    Question(QuestionType),
    Explanation(ExplanationType),
    Sentiment(Sentiment),
    Cue(CueKind),
    Idle,
}

impl ContentKey {
    pub fn category(&self) -> GestureCategory {
        match self {
            ContentKey::Emphasis => GestureCategory::Emphasis,
            ContentKey::Question(_) => GestureCategory::Question,
            ContentKey::Explanation(_) => GestureCategory::Explanation,
            ContentKey::Sentiment(_) => GestureCategory::Sentiment,
            ContentKey::Cue(_) => GestureCategory::Agreement,
            ContentKey::Idle => GestureCategory::Idle,
        }
    }
}

/// Canonical shape of a gesture type
#[derive(Debug, Clone, PartialEq)]
pub struct GestureShape {
    pub targets: Vec<BlendTarget>,
    pub head: Option<HeadMotion>,
    pub default_intensity: f64,
    pub default_duration_ms: f64,
}

/// One mapping entry: which type, how strong, how long
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateSpec {
    pub gesture_type: GestureType,
    pub base_intensity: f64,
    pub duration_ms: f64,
}

const fn spec(gesture_type: GestureType, base_intensity: f64, duration_ms: f64) -> CandidateSpec {
    CandidateSpec { gesture_type, base_intensity, duration_ms }
}

const MAPPINGS: &[(ContentKey, &[CandidateSpec])] = &[
    (ContentKey::Emphasis, &[spec(GestureType::Nod, 0.7, 400.0), spec(GestureType::EyebrowRaise, 0.6, 500.0)]),
    (
        ContentKey::Question(QuestionType::WhQuestion),
        &[spec(GestureType::HeadTilt, 0.6, 800.0), spec(GestureType::EyebrowRaise, 0.5, 700.0)],
    ),
    (
        ContentKey::Question(QuestionType::YesNo),
        &[spec(GestureType::EyebrowRaise, 0.7, 600.0), spec(GestureType::HeadTilt, 0.4, 700.0)],
    ),
    (ContentKey::Question(QuestionType::Rhetorical), &[spec(GestureType::HeadTilt, 0.3, 700.0)]),
    (
        ContentKey::Question(QuestionType::Confirmation),
        &[spec(GestureType::Nod, 0.4, 400.0), spec(GestureType::EyebrowRaise, 0.4, 500.0)],
    ),
    (
        ContentKey::Explanation(ExplanationType::Definition),
        &[spec(GestureType::SlowNod, 0.4, 700.0), spec(GestureType::BrowFurrow, 0.3, 600.0)],
    ),
    (ContentKey::Explanation(ExplanationType::Process), &[spec(GestureType::Nod, 0.35, 400.0)]),
    (ContentKey::Explanation(ExplanationType::Comparison), &[spec(GestureType::HeadTurn, 0.4, 700.0)]),
    (ContentKey::Explanation(ExplanationType::Example), &[spec(GestureType::EyebrowRaise, 0.35, 500.0)]),
    (ContentKey::Sentiment(Sentiment::Positive), &[spec(GestureType::Smile, 0.6, 900.0)]),
    (
        ContentKey::Sentiment(Sentiment::Negative),
        &[spec(GestureType::BrowFurrow, 0.5, 600.0), spec(GestureType::HeadShake, 0.4, 600.0)],
    ),
    (
        ContentKey::Sentiment(Sentiment::Excited),
        &[spec(GestureType::EyebrowRaise, 0.7, 500.0), spec(GestureType::Smile, 0.7, 900.0)],
    ),
    (
        ContentKey::Sentiment(Sentiment::Concerned),
        &[spec(GestureType::BrowFurrow, 0.5, 700.0), spec(GestureType::HeadTilt, 0.3, 700.0)],
    ),
    (ContentKey::Cue(CueKind::Agreement), &[spec(GestureType::Nod, 0.5, 400.0)]),
    (ContentKey::Cue(CueKind::Disagreement), &[spec(GestureType::HeadShake, 0.5, 600.0)]),
    (
        ContentKey::Cue(CueKind::Greeting),
        &[spec(GestureType::Smile, 0.6, 900.0), spec(GestureType::Nod, 0.4, 400.0)],
    ),
    (ContentKey::Cue(CueKind::Farewell), &[spec(GestureType::Nod, 0.4, 400.0)]),
    (ContentKey::Idle, &[spec(GestureType::Blink, 0.3, 150.0)]),
];

fn canonical_shape(gesture_type: GestureType) -> GestureShape {
    let head = |axis, amplitude, oscillations| Some(HeadMotion { axis, amplitude, oscillations });
    let (targets, head, intensity, duration) = match gesture_type {
        GestureType::Nod => (vec![], head(HeadAxis::Pitch, 0.12, 0), 0.7, 400.0),
        GestureType::SlowNod => (vec![], head(HeadAxis::Pitch, 0.08, 0), 0.5, 700.0),
        GestureType::HeadTilt => (vec![], head(HeadAxis::Roll, 0.12, 0), 0.6, 800.0),
        GestureType::HeadShake => (vec![], head(HeadAxis::Yaw, 0.1, 2), 0.5, 600.0),
        GestureType::HeadTurn => (vec![], head(HeadAxis::Yaw, 0.15, 0), 0.4, 700.0),
        GestureType::EyebrowRaise => (
            vec![BlendTarget::new("brow_inner_up", 0.8), BlendTarget::new("brow_outer_up", 0.6)],
            None,
            0.6,
            500.0,
        ),
        GestureType::BrowFurrow => (vec![BlendTarget::new("brow_down", 0.7)], None, 0.5, 600.0),
        GestureType::Smile => (
            vec![BlendTarget::new("mouth_smile", 0.8), BlendTarget::new("cheek_squint", 0.4)],
            None,
            0.6,
            900.0,
        ),
        GestureType::Blink => (vec![BlendTarget::new("eye_blink", 1.0)], None, 0.3, 150.0),
    };
    GestureShape { targets, head, default_intensity: intensity, default_duration_ms: duration }
}

const ALL_TYPES: [GestureType; 9] = [
    GestureType::Nod,
    GestureType::SlowNod,
    GestureType::HeadTilt,
    GestureType::HeadShake,
    GestureType::HeadTurn,
    GestureType::EyebrowRaise,
    GestureType::BrowFurrow,
    GestureType::Smile,
    GestureType::Blink,
];

/// Owned catalog; constructed once and passed to the pipeline
#[derive(Debug, Clone)]
pub struct GestureDatabase {
    shapes: HashMap<GestureType, GestureShape>,
    mappings: HashMap<ContentKey, Vec<CandidateSpec>>,
}

impl Default for GestureDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureDatabase {
    pub fn new() -> Self {
        Self {
            shapes: ALL_TYPES.iter().map(|t| (*t, canonical_shape(*t))).collect(),
            mappings: MAPPINGS.iter().map(|(k, specs)| (*k, specs.to_vec())).collect(),
        }
    }

    pub fn shape(&self, gesture_type: GestureType) -> Option<&GestureShape> {
        self.shapes.get(&gesture_type)
    }

    pub fn specs_for(&self, key: ContentKey) -> &[CandidateSpec] {
        self.mappings.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the candidates for one classification
    pub fn set_mapping(&mut self, key: ContentKey, specs: Vec<CandidateSpec>) {
        self.mappings.insert(key, specs);
    }

    /// Build a gesture of `gesture_type` from its canonical shape
    pub fn instantiate(
        &self,
        gesture_type: GestureType,
        category: GestureCategory,
        start_ms: f64,
        intensity: f64,
        duration_ms: f64,
        source_word: Option<String>,
    ) -> Gesture {
        let shape = self
            .shapes
            .get(&gesture_type)
            .cloned()
            .unwrap_or_else(|| canonical_shape(gesture_type));
        Gesture {
            gesture_type,
            category,
            intensity: intensity.clamp(0.0, 1.0),
            start_ms: start_ms.max(0.0),
            duration_ms: duration_ms.max(0.0),
            targets: shape.targets,
            head: shape.head,
            source_word,
        }
    }

    /// Candidates for one classified item.
    ///
    /// Intensity = base × (0.5 + 0.5 × item intensity) × (0.7 + 0.3 × item confidence)
    pub fn candidates_for(
        &self,
        key: ContentKey,
        start_ms: f64,
        item_intensity: f64,
        item_confidence: f64,
        source_word: Option<&str>,
    ) -> Vec<Gesture> {
        let modulation = (0.5 + 0.5 * item_intensity.clamp(0.0, 1.0)) * (0.7 + 0.3 * item_confidence.clamp(0.0, 1.0));
        self.specs_for(key)
            .iter()
            .map(|s| {
                self.instantiate(
                    s.gesture_type,
                    key.category(),
                    start_ms,
                    s.base_intensity * modulation,
                    s.duration_ms,
                    source_word.map(str::to_string),
                )
            })
            .collect()
    }

    /// Every candidate for an analysis, in item order.
    ///
    /// Content-free input gets one idle blink.
    pub fn candidates(&self, analysis: &ContentAnalysis) -> Vec<Gesture> {
        let mut out = Vec::new();
        for e in &analysis.emphasis_points {
            out.extend(self.candidates_for(ContentKey::Emphasis, e.time_offset_ms, e.intensity, e.confidence, Some(&e.word)));
        }
        for q in &analysis.question_segments {
            out.extend(self.candidates_for(
                ContentKey::Question(q.question_type),
                q.time_offset_ms,
                q.intensity,
                q.confidence,
                None,
            ));
        }
        for x in &analysis.explanatory_segments {
            out.extend(self.candidates_for(
                ContentKey::Explanation(x.explanation_type),
                x.time_offset_ms,
                x.intensity,
                x.confidence,
                None,
            ));
        }
        for s in &analysis.sentiment_markers {
            out.extend(self.candidates_for(
                ContentKey::Sentiment(s.sentiment),
                s.time_offset_ms,
                s.intensity,
                s.confidence,
                Some(&s.word),
            ));
        }
        for c in &analysis.contextual_cues {
            out.extend(self.candidates_for(ContentKey::Cue(c.kind), c.time_offset_ms, c.intensity, c.confidence, Some(&c.word)));
        }
        if analysis.is_empty() {
            out.extend(self.candidates_for(ContentKey::Idle, 0.0, 0.5, 0.5, None));
        }
        out
    }
}
