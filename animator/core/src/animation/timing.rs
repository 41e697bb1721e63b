//! Easing Functions
//!
//! Progress curves used by gesture phases. Progress values are clamped to
//! `0.0..=1.0` before the curve is applied.

use serde::{Deserialize, Serialize};

/// Easing curves used by the wave gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingFunction {
    /// Quadratic ease in: slow start, fast end
    EaseInQuad,

    /// Quadratic ease out: fast start, slow end
    EaseOutQuad,
}

impl EasingFunction {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::EaseInQuad => ease_in_quad(t),
            Self::EaseOutQuad => ease_out_quad(t),
        }
    }
}

/// `t * t`
#[must_use]
pub fn ease_in_quad(t: f32) -> f32 {
    t * t
}

/// `t * (2 - t)`
#[must_use]
pub fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}
