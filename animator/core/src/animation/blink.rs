//! Blink Cycle
//!
//! Waiting -> Closing -> Opening -> Waiting. The wait between blinks is
//! redrawn from the injected random source each time a blink starts; the
//! blink itself always takes [`BLINK_DURATION_SECS`] of simulated time.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Total duration of one close + open
pub const BLINK_DURATION_SECS: f32 = 0.15;

/// Shortest wait between blinks (inclusive)
pub const BLINK_INTERVAL_MIN_SECS: f32 = 3.0;

/// Longest wait between blinks (exclusive)
pub const BLINK_INTERVAL_MAX_SECS: f32 = 5.0;

/// Observable blink state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlinkPhase {
    /// Eyes open, counting down to the next blink
    Waiting,
    /// First half of the blink, lids closing
    Closing,
    /// Second half of the blink, lids opening
    Opening,
}

/// Blink timer state
#[derive(Clone, Debug)]
pub struct BlinkCycle {
    timer: f32,
    interval: f32,
    blinking: bool,
}

impl BlinkCycle {
    /// Start waiting with a freshly drawn interval
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            timer: 0.0,
            interval: draw_interval(rng),
            blinking: false,
        }
    }

    /// Advance by `delta` seconds
    ///
    /// Returns the eyelid closure to write to the blink channel, or `None`
    /// while waiting (the channel is left alone between blinks).
    pub fn advance<R: Rng + ?Sized>(&mut self, delta: f32, rng: &mut R) -> Option<f32> {
        self.timer += delta;

        if !self.blinking && self.timer >= self.interval {
            self.blinking = true;
            self.timer = 0.0;
            self.interval = draw_interval(rng);
            tracing::trace!(next_interval = self.interval, "Blink started");
        }

        if !self.blinking {
            return None;
        }

        let progress = self.timer / BLINK_DURATION_SECS;
        let closure = if progress < 0.5 {
            progress * 2.0
        } else if progress < 1.0 {
            1.0 - (progress - 0.5) * 2.0
        } else {
            self.blinking = false;
            self.timer = 0.0;
            0.0
        };

        Some(closure)
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> BlinkPhase {
        if !self.blinking {
            BlinkPhase::Waiting
        } else if self.timer / BLINK_DURATION_SECS < 0.5 {
            BlinkPhase::Closing
        } else {
            BlinkPhase::Opening
        }
    }

    /// Seconds accumulated in the current phase
    #[must_use]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Wait before the next blink starts
    #[must_use]
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Whether a blink is in progress
    #[must_use]
    pub fn is_blinking(&self) -> bool {
        self.blinking
    }
}

fn draw_interval<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(BLINK_INTERVAL_MIN_SECS..BLINK_INTERVAL_MAX_SECS)
}
