//! Movement context supplied with each utterance

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{BehaviorError, Result};
use crate::types::CulturalRegion;

/// How strongly the speaker wants to stress the utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmphasisLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl EmphasisLevel {
    /// Boost applied to nod-type gestures
    pub fn nod_boost(&self) -> f64 {
        match self {
            EmphasisLevel::Low => 1.0,
            EmphasisLevel::Medium => 1.1,
            EmphasisLevel::High => 1.3,
        }
    }
}

impl FromStr for EmphasisLevel {
    type Err = BehaviorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(EmphasisLevel::Low),
            "medium" => Ok(EmphasisLevel::Medium),
            "high" => Ok(EmphasisLevel::High),
            other => Err(BehaviorError::UnknownEmphasisLevel(other.to_string())),
        }
    }
}

/// Everything the pipeline reads besides the utterance text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementContext {
    #[serde(default)]
    pub is_question: bool,
    #[serde(default)]
    pub emphasis_level: EmphasisLevel,
    /// BCP-47 style language code ("en", "en-US")
    #[serde(default = "default_language")]
    pub language: String,
    /// Explicit region; derived from `language` when absent
    #[serde(default)]
    pub region: Option<CulturalRegion>,
    /// Measured or estimated speech duration
    #[serde(default)]
    pub speech_duration_ms: Option<f64>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for MovementContext {
    fn default() -> Self {
        Self {
            is_question: false,
            emphasis_level: EmphasisLevel::Medium,
            language: default_language(),
            region: None,
            speech_duration_ms: None,
        }
    }
}

impl MovementContext {
    pub fn new(is_question: bool, emphasis_level: EmphasisLevel) -> Self {
        Self { is_question, emphasis_level, ..Self::default() }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_region(mut self, region: CulturalRegion) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.speech_duration_ms = Some(duration_ms);
        self
    }

    /// Explicit region, or the language default
    pub fn effective_region(&self) -> CulturalRegion {
        self.region.unwrap_or_else(|| CulturalRegion::for_language(&self.language))
    }

    /// Parse and validate a host-supplied JSON context
    pub fn from_json(json: &str) -> Result<Self> {
        let ctx: MovementContext = serde_json::from_str(json)?;
        ctx.validate()?;
        Ok(ctx)
    }

    /// Boundary validation
    pub fn validate(&self) -> Result<()> {
        let lang = self.language.trim();
        if lang.is_empty() || lang.len() > 16 {
            return Err(BehaviorError::InvalidContext(format!("language code '{}'", self.language)));
        }
        if !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(BehaviorError::InvalidContext(format!("language code '{}'", self.language)));
        }
        if let Some(d) = self.speech_duration_ms {
            if !d.is_finite() || d < 0.0 {
                return Err(BehaviorError::InvalidContext(format!("speech duration {}", d)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_defaults() {
        let ctx = MovementContext::from_json(r#"{"is_question": true}"#).unwrap();
        assert!(ctx.is_question);
        assert_eq!(ctx.emphasis_level, EmphasisLevel::Medium);
        assert_eq!(ctx.language, "en");
        assert_eq!(ctx.effective_region(), CulturalRegion::Western);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(MovementContext::from_json(r#"{"mood": "happy"}"#).is_err());
    }

    #[test]
    fn test_bad_language_rejected() {
        let err = MovementContext::from_json(r#"{"language": "en US!"}"#).unwrap_err();
        assert!(matches!(err, BehaviorError::InvalidContext(_)));
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert!(MovementContext::from_json(r#"{"speech_duration_ms": -5.0}"#).is_err());
    }

    #[test]
    fn test_explicit_region_wins() {
        let ctx = MovementContext::default()
            .with_language("ja")
            .with_region(CulturalRegion::Mediterranean);
        assert_eq!(ctx.effective_region(), CulturalRegion::Mediterranean);
    }

    #[test]
    fn test_emphasis_parse() {
        assert_eq!("HIGH".parse::<EmphasisLevel>().unwrap(), EmphasisLevel::High);
        assert!("extreme".parse::<EmphasisLevel>().is_err());
    }
}
