//! Animator Core - Procedural Avatar Animation
//!
//! This crate drives a humanoid avatar rig with procedural idle behaviour
//! and one-shot gestures. It knows nothing about rendering, asset loading
//! or the chat relay; the host hands it a [`Rig`] and calls
//! [`AvatarAnimator::update`] once per frame.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            Host render loop (surface)        │
//! │   update(rig, delta) · play_wave · talk cues │
//! └───────────────────────┬──────────────────────┘
//!                         │
//! ┌───────────────────────┴──────────────────────┐
//! │                AvatarAnimator                │
//! │  ┌────────────┐ ┌───────────┐ ┌────────────┐ │
//! │  │ BlinkCycle │ │ Breathing │ │  Gesture   │ │
//! │  │            │ │           │ │   State    │ │
//! │  └─────┬──────┘ └─────┬─────┘ └─────┬──────┘ │
//! └────────┼──────────────┼─────────────┼────────┘
//!          ▼              ▼             ▼
//!   expression       chest joint    arm joints +
//!    "blink"          position      "happy" expression
//!                         │
//!                   Rig (trait)
//! ```
//!
//! # Quick Start
//!
//! ```
//! use animator_core::{AvatarAnimator, MemoryRig};
//!
//! let mut rig = MemoryRig::humanoid();
//! let mut animator = AvatarAnimator::seeded(42);
//!
//! animator.play_wave_animation(&mut rig);
//! for _ in 0..60 {
//!     animator.update(&mut rig, 1.0 / 60.0);
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod animator;
pub mod rig;

pub use animation::{
    BlinkCycle, BlinkPhase, Breathing, CapturedPose, EasingFunction, GestureState, PoseWrite,
    WavePhase,
};
pub use animator::AvatarAnimator;
pub use rig::{
    Axis, Expression, JointHandle, JointName, MemoryRig, Position, Rig, RigError, Rotation,
};
