//! Easing curves for transitions
//!
//! Every curve maps 0 → 0 and 1 → 1. Bounce, elastic and back overshoot
//! in between.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::BehaviorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
    Bounce,
    Elastic,
    Back,
}

impl Easing {
    pub const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::Bounce,
        Easing::Elastic,
        Easing::Back,
    ];

    /// Eased value for progress `t` (clamped to [0,1])
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => cubic_in_out(t),
            Easing::Bounce => bounce_out(t),
            Easing::Elastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::Back => {
                let c1 = 1.70158;
                let c3 = c1 + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
            }
        }
    }
}

/// Cubic ease in-out, also used by lip-sync boundary blending
pub fn cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

fn bounce_out(t: f64) -> f64 {
    let n1 = 7.5625;
    let d1 = 2.75;
    if t < 1.0 / d1 {
        n1 * t * t
    } else if t < 2.0 / d1 {
        let t = t - 1.5 / d1;
        n1 * t * t + 0.75
    } else if t < 2.5 / d1 {
        let t = t - 2.25 / d1;
        n1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / d1;
        n1 * t * t + 0.984375
    }
}

impl std::str::FromStr for Easing {
    type Err = BehaviorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Easing::Linear),
            "ease_in" => Ok(Easing::EaseIn),
            "ease_out" => Ok(Easing::EaseOut),
            "ease_in_out" => Ok(Easing::EaseInOut),
            "bounce" => Ok(Easing::Bounce),
            "elastic" => Ok(Easing::Elastic),
            "back" => Ok(Easing::Back),
            other => Err(BehaviorError::UnknownEasing(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_for_every_curve() {
        for easing in Easing::ALL {
            assert!(easing.apply(0.0).abs() < 1e-9, "{:?} at 0 = {}", easing, easing.apply(0.0));
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-9, "{:?} at 1 = {}", easing, easing.apply(1.0));
        }
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(2.0), 1.0);
        assert_eq!(Easing::Linear.apply(f64::NAN), 0.0);
    }

    #[test]
    fn test_in_out_midpoint() {
        assert!((cubic_in_out(0.5) - 0.5).abs() < 1e-12);
        assert!(Easing::EaseIn.apply(0.5) < 0.5);
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(" Ease_Out ".parse::<Easing>().unwrap(), Easing::EaseOut);
        assert!(matches!("wobble".parse::<Easing>(), Err(BehaviorError::UnknownEasing(name)) if name == "wobble"));
    }

    #[test]
    fn test_back_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::Back.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }
}
