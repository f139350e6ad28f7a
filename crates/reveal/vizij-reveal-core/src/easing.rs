//! Easing curves for counter interpolation.
//!
//! A curve maps normalized elapsed time `p ∈ [0, 1]` to normalized progress.
//! Curves must satisfy `f(0) = 0`, `f(1) = 1` and be non-decreasing; the
//! counter additionally clamps the result and forces `1` at `p = 1`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Replaceable easing strategy.
pub trait EasingCurve: fmt::Debug {
    fn apply(&self, progress: f64) -> f64;
}

/// Built-in curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseOutQuad,
    EaseOutCubic,
    EaseInOutCubic,
    #[default]
    EaseOutExpo,
}

impl From<&str> for Easing {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "linear" => Self::Linear,
            "ease_out_quad" => Self::EaseOutQuad,
            "ease_out_cubic" => Self::EaseOutCubic,
            "ease_in_out_cubic" => Self::EaseInOutCubic,
            "ease_out_expo" => Self::EaseOutExpo,
            _ => Self::EaseOutExpo, // Default curve for unknown names
        }
    }
}

impl Easing {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseOutQuad => "ease_out_quad",
            Self::EaseOutCubic => "ease_out_cubic",
            Self::EaseInOutCubic => "ease_in_out_cubic",
            Self::EaseOutExpo => "ease_out_expo",
        }
    }
}

impl EasingCurve for Easing {
    #[inline]
    fn apply(&self, p: f64) -> f64 {
        match self {
            Self::Linear => p,
            Self::EaseOutQuad => 1.0 - (1.0 - p) * (1.0 - p),
            Self::EaseOutCubic => 1.0 - (1.0 - p).powi(3),
            Self::EaseInOutCubic => {
                if p < 0.5 {
                    4.0 * p * p * p
                } else {
                    1.0 - (-2.0 * p + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseOutExpo => ease_out_expo(p),
        }
    }
}

/// `1 − 2^(−10p)`, with an exact `1` at `p = 1` (the raw formula stops at 0.999).
#[inline]
pub fn ease_out_expo(p: f64) -> f64 {
    if p >= 1.0 {
        1.0
    } else {
        1.0 - 2f64.powf(-10.0 * p)
    }
}
