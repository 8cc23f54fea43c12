//! Movement state definitions

use serde::{Deserialize, Serialize};

/// The five states of the movement orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementState {
    /// No active plan
    #[default]
    Idle,
    /// Plan active, no question or emphasis gestures
    Speaking,
    /// Plan contains a question tilt/eyebrow gesture
    Questioning,
    /// Plan contains an emphasis gesture
    Emphasizing,
    /// Blending between two plans (or a plan and rest)
    Transitioning,
}

impl MovementState {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            MovementState::Idle => "\x1b[90m",          // Gray
            MovementState::Speaking => "\x1b[32m",      // Green
            MovementState::Questioning => "\x1b[36m",   // Cyan
            MovementState::Emphasizing => "\x1b[33m",   // Yellow
            MovementState::Transitioning => "\x1b[35m", // Magenta
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            MovementState::Idle => "💤",
            MovementState::Speaking => "💬",
            MovementState::Questioning => "❓",
            MovementState::Emphasizing => "❗",
            MovementState::Transitioning => "🔀",
        }
    }
}

impl std::fmt::Display for MovementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MovementState::Idle => "IDLE",
            MovementState::Speaking => "SPEAKING",
            MovementState::Questioning => "QUESTIONING",
            MovementState::Emphasizing => "EMPHASIZING",
            MovementState::Transitioning => "TRANSITIONING",
        };
        write!(f, "{}", name)
    }
}
