//! Animation Behaviours
//!
//! Building blocks the [`AvatarAnimator`](crate::AvatarAnimator) composes
//! every frame:
//!
//! - [`blink`]: randomised blink cycle on the `blink` expression channel
//! - [`breathing`]: sine offset on the chest joint
//! - [`gesture`]: one-shot gestures (wave) with pose capture/restore
//! - [`timing`]: easing curves
//!
//! Idle behaviours and gestures write disjoint channels, so they run side
//! by side without blending:
//!
//! ```text
//! blink     ──► expression "blink"
//! breathing ──► chest.position.y
//! gesture   ──► right arm/hand rotation, expression "happy"
//! ```

pub mod blink;
pub mod breathing;
pub mod gesture;
pub mod timing;

pub use blink::{BlinkCycle, BlinkPhase};
pub use breathing::Breathing;
pub use gesture::{CapturedPose, GestureState, PoseWrite, WavePhase};
pub use timing::{ease_in_quad, ease_out_quad, EasingFunction};
