//! Breathing
//!
//! A small vertical sine oscillation of the chest joint. Stateless apart
//! from accumulated time.

/// Angular rate of the breathing wave (rad/s), period ~4.19s
pub const BREATHE_RATE: f32 = 1.5;

/// Peak chest offset
pub const BREATHE_AMPLITUDE: f32 = 0.002;

/// Accumulated breathing clock
#[derive(Clone, Copy, Debug, Default)]
pub struct Breathing {
    time: f32,
}

impl Breathing {
    /// Start at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock and return the chest y offset for this frame
    pub fn advance(&mut self, delta: f32) -> f32 {
        self.time += delta;
        self.offset()
    }

    /// Chest y offset at the current time
    #[must_use]
    pub fn offset(&self) -> f32 {
        chest_offset(self.time)
    }

    /// Seconds accumulated so far
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }
}

/// Chest y offset at `time` seconds
#[must_use]
pub fn chest_offset(time: f32) -> f32 {
    (time * BREATHE_RATE).sin() * BREATHE_AMPLITUDE
}
