//! Gesture State Machine
//!
//! One-shot gestures are explicit state (`Idle | Wave { .. }`) advanced by
//! a pure step function. Each step yields a list of [`PoseWrite`]s that the
//! animator applies to the rig, so the timing logic never touches the rig
//! directly and can be tested on its own.
//!
//! ```text
//!  play_wave ──► Wave{elapsed=0, captured}
//!                  │  advance(delta) -> phase writes
//!                  │   Raise  [0.0, 0.5)   arm up, ease-out
//!                  │   Wave   [0.5, 2.0)   hand oscillates, happy 0.7
//!                  │   Lower  [2.0, 2.5)   arm down, ease-in, happy fades
//!                  ▼
//!                Idle  ◄── elapsed >= 2.5: restore captured pose
//! ```

use std::collections::BTreeMap;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::timing::EasingFunction;
use crate::rig::{Axis, Expression, JointName, Rig, Rotation};

/// Total wave duration
pub const WAVE_DURATION_SECS: f32 = 2.5;

/// End of the raise phase
pub const WAVE_RAISE_END_SECS: f32 = 0.5;

/// End of the oscillation phase
pub const WAVE_OSCILLATE_END_SECS: f32 = 2.0;

/// Hand oscillation rate (rad/s)
const WAVE_FREQUENCY: f32 = 8.0;

/// Hand oscillation amplitude (rad)
const WAVE_AMPLITUDE: f32 = 0.3;

/// Smile held while waving
const WAVE_HAPPY: f32 = 0.7;

/// A single write the animator applies to the rig
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PoseWrite {
    /// Overwrite one rotation axis of a joint
    Rotate {
        /// Target joint
        joint: JointName,
        /// Axis to overwrite
        axis: Axis,
        /// New value in radians
        radians: f32,
    },
    /// Overwrite a joint's full rotation
    Restore {
        /// Target joint
        joint: JointName,
        /// Rotation to put back
        rotation: Rotation,
    },
    /// Set an expression channel
    Expression {
        /// Target channel
        channel: Expression,
        /// Intensity (0.0 - 1.0)
        value: f32,
    },
}

impl PoseWrite {
    /// Apply to a rig, skipping joints the rig does not have
    pub fn apply<R: Rig + ?Sized>(self, rig: &mut R) {
        match self {
            Self::Rotate {
                joint,
                axis,
                radians,
            } => {
                if let Some(handle) = rig.joint_mut(joint) {
                    handle.rotation.set(axis, radians);
                }
            }
            Self::Restore { joint, rotation } => {
                if let Some(handle) = rig.joint_mut(joint) {
                    handle.rotation = rotation;
                }
            }
            Self::Expression { channel, value } => rig.set_expression(channel, value),
        }
    }
}

/// Rotations recorded before a gesture starts
///
/// Only joints present on the rig are recorded; restoration puts back
/// exactly these values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapturedPose {
    rotations: BTreeMap<JointName, Rotation>,
}

impl CapturedPose {
    /// Record the current rotation of each listed joint that exists
    pub fn capture<R: Rig + ?Sized>(rig: &R, joints: &[JointName]) -> Self {
        let rotations = joints
            .iter()
            .filter_map(|&joint| rig.joint(joint).map(|handle| (joint, handle.rotation)))
            .collect();
        Self { rotations }
    }

    /// Recorded rotation of a joint
    #[must_use]
    pub fn get(&self, joint: JointName) -> Option<Rotation> {
        self.rotations.get(&joint).copied()
    }

    /// Number of recorded joints
    #[must_use]
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// Recorded joints and rotations in joint order
    pub fn iter(&self) -> impl Iterator<Item = (JointName, Rotation)> + '_ {
        self.rotations.iter().map(|(&joint, &rotation)| (joint, rotation))
    }

    /// Writes that put every recorded joint back
    #[must_use]
    pub fn restore_writes(&self) -> Vec<PoseWrite> {
        self.iter()
            .map(|(joint, rotation)| PoseWrite::Restore { joint, rotation })
            .collect()
    }
}

/// Phases of the wave gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    /// Arm lifting
    Raise,
    /// Hand oscillating
    Wave,
    /// Arm lowering
    Lower,
    /// Past the end, pose restored
    Complete,
}

impl WavePhase {
    /// Phase at `t` seconds since the gesture started
    #[must_use]
    pub fn at(t: f32) -> Self {
        if t < WAVE_RAISE_END_SECS {
            Self::Raise
        } else if t < WAVE_OSCILLATE_END_SECS {
            Self::Wave
        } else if t < WAVE_DURATION_SECS {
            Self::Lower
        } else {
            Self::Complete
        }
    }
}

/// Joint and expression writes for the wave at `t` seconds
///
/// Empty once the gesture is complete; restoration is handled by
/// [`GestureState::advance`] since it needs the captured pose.
#[must_use]
pub fn wave_writes(t: f32) -> Vec<PoseWrite> {
    match WavePhase::at(t) {
        WavePhase::Raise => {
            let ease = EasingFunction::EaseOutQuad.apply(t / WAVE_RAISE_END_SECS);
            right_arm_lift(ease)
        }
        WavePhase::Wave => {
            let wave_angle = ((t - WAVE_RAISE_END_SECS) * WAVE_FREQUENCY).sin() * WAVE_AMPLITUDE;
            vec![
                PoseWrite::Rotate {
                    joint: JointName::RightHand,
                    axis: Axis::Z,
                    radians: wave_angle,
                },
                PoseWrite::Expression {
                    channel: Expression::Happy,
                    value: WAVE_HAPPY,
                },
            ]
        }
        WavePhase::Lower => {
            let progress = (t - WAVE_OSCILLATE_END_SECS)
                / (WAVE_DURATION_SECS - WAVE_OSCILLATE_END_SECS);
            let remaining = 1.0 - EasingFunction::EaseInQuad.apply(progress);

            let mut writes = right_arm_lift(remaining);
            writes.push(PoseWrite::Rotate {
                joint: JointName::RightHand,
                axis: Axis::Z,
                radians: 0.0,
            });
            writes.push(PoseWrite::Expression {
                channel: Expression::Happy,
                value: WAVE_HAPPY * remaining,
            });
            writes
        }
        WavePhase::Complete => Vec::new(),
    }
}

/// Right arm raised by `amount` (0 = rest, 1 = fully raised)
fn right_arm_lift(amount: f32) -> Vec<PoseWrite> {
    vec![
        PoseWrite::Rotate {
            joint: JointName::RightUpperArm,
            axis: Axis::Z,
            radians: -PI * 0.7 * amount,
        },
        PoseWrite::Rotate {
            joint: JointName::RightUpperArm,
            axis: Axis::X,
            radians: -PI * 0.1 * amount,
        },
        PoseWrite::Rotate {
            joint: JointName::RightLowerArm,
            axis: Axis::Y,
            radians: PI * 0.2 * amount,
        },
    ]
}

/// Active gesture, if any
#[derive(Clone, Debug, Default, PartialEq)]
pub enum GestureState {
    /// No gesture running
    #[default]
    Idle,
    /// Wave in flight
    Wave {
        /// Seconds since the wave started
        elapsed: f32,
        /// Pose to restore when the wave ends
        captured: CapturedPose,
    },
}

impl GestureState {
    /// Begin a wave from the given captured pose
    #[must_use]
    pub fn start_wave(captured: CapturedPose) -> Self {
        Self::Wave {
            elapsed: 0.0,
            captured,
        }
    }

    /// Whether a gesture is running
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Seconds since the running gesture started (0 when idle)
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        match self {
            Self::Idle => 0.0,
            Self::Wave { elapsed, .. } => *elapsed,
        }
    }

    /// Pose that will be restored when the running gesture ends
    #[must_use]
    pub fn captured_pose(&self) -> Option<&CapturedPose> {
        match self {
            Self::Idle => None,
            Self::Wave { captured, .. } => Some(captured),
        }
    }

    /// Step the gesture forward by `delta` seconds
    ///
    /// Returns the next state and the writes for this frame. When the
    /// gesture finishes the writes restore the captured pose and clear the
    /// smile, and the next state is `Idle`.
    #[must_use]
    pub fn advance(self, delta: f32) -> (Self, Vec<PoseWrite>) {
        match self {
            Self::Idle => (Self::Idle, Vec::new()),
            Self::Wave { elapsed, captured } => {
                let elapsed = elapsed + delta;
                if elapsed >= WAVE_DURATION_SECS {
                    (Self::Idle, release_writes(&captured))
                } else {
                    let writes = wave_writes(elapsed);
                    (Self::Wave { elapsed, captured }, writes)
                }
            }
        }
    }

    /// End the gesture now, returning the writes that undo it
    #[must_use]
    pub fn release(self) -> Vec<PoseWrite> {
        match self {
            Self::Idle => Vec::new(),
            Self::Wave { captured, .. } => release_writes(&captured),
        }
    }
}

fn release_writes(captured: &CapturedPose) -> Vec<PoseWrite> {
    let mut writes = captured.restore_writes();
    writes.push(PoseWrite::Expression {
        channel: Expression::Happy,
        value: 0.0,
    });
    writes
}
