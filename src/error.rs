//! Boundary errors
//!
//! The per-frame core never fails; only inputs crossing in from a host
//! (JSON payloads, config files, speech-layer timings) are validated here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BehaviorError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid movement context: {0}")]
    InvalidContext(String),

    #[error("Invalid word timings at index {index}: {reason}")]
    InvalidWordTimings { index: usize, reason: String },

    #[error("Unknown emphasis level: {0}")]
    UnknownEmphasisLevel(String),

    #[error("Unknown motion profile: {0}")]
    UnknownMotionProfile(String),

    #[error("Unknown cultural region: {0}")]
    UnknownRegion(String),

    #[error("Unknown easing curve: {0}")]
    UnknownEasing(String),
}

pub type Result<T> = std::result::Result<T, BehaviorError>;
