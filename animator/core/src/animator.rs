//! Avatar Animator
//!
//! Per-frame driver for the avatar rig. The host render loop calls
//! [`AvatarAnimator::update`] once per frame with the wall-clock delta;
//! everything here is time based, never frame-count based, so behaviour is
//! identical at any frame rate.
//!
//! # Design
//!
//! The animator does not own the rig. Every call that writes to the model
//! takes it by `&mut`, which keeps the single-writer rule visible in the
//! types: nothing else can touch the joints while a frame is applied.
//!
//! Delta is not clamped. A long stall (suspended tab, debugger) produces
//! one large step; blink and gestures simply jump ahead.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::animation::{
    BlinkCycle, BlinkPhase, Breathing, CapturedPose, GestureState, PoseWrite, WavePhase,
};
use crate::rig::{Expression, JointName, Rig};

/// Smile used while a reply is being shown
const TALKING_HAPPY: f32 = 0.3;

/// Procedural animator for one rig
///
/// Runs blinking and breathing continuously and at most one gesture on
/// top. The random source used for blink timing is injected so tests can
/// seed it.
#[derive(Debug)]
pub struct AvatarAnimator<G = StdRng> {
    rng: G,
    blink: BlinkCycle,
    breathing: Breathing,
    gesture: GestureState,
}

impl AvatarAnimator<StdRng> {
    /// Create an animator seeded from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create an animator with a deterministic blink schedule
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for AvatarAnimator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Rng> AvatarAnimator<G> {
    /// Create an animator drawing blink intervals from `rng`
    pub fn with_rng(mut rng: G) -> Self {
        let blink = BlinkCycle::new(&mut rng);
        Self {
            rng,
            blink,
            breathing: Breathing::new(),
            gesture: GestureState::Idle,
        }
    }

    /// Advance every behaviour by `delta` seconds and write the result
    ///
    /// Defined for any `delta >= 0`; never fails. Missing joints and
    /// expression channels are skipped.
    pub fn update<R: Rig + ?Sized>(&mut self, rig: &mut R, delta: f32) {
        if let Some(closure) = self.blink.advance(delta, &mut self.rng) {
            rig.set_expression(Expression::Blink, closure);
        }

        let chest_y = self.breathing.advance(delta);
        if rig.has_skeleton() {
            if let Some(chest) = rig.joint_mut(JointName::Chest) {
                chest.position.y = chest_y;
            }
        }

        if self.gesture.is_active() {
            let (next, writes) = std::mem::take(&mut self.gesture).advance(delta);
            if !next.is_active() {
                debug!("Wave finished, pose restored");
            }
            self.gesture = next;
            apply(rig, writes);
        }
    }

    /// Start the wave gesture
    ///
    /// Returns `false` without touching any state when the rig has no
    /// humanoid skeleton. A wave already in flight is released first
    /// (its captured pose restored) and then restarted from the top.
    pub fn play_wave_animation<R: Rig + ?Sized>(&mut self, rig: &mut R) -> bool {
        if !rig.has_skeleton() {
            warn!("No humanoid skeleton on rig, ignoring wave");
            return false;
        }

        if self.gesture.is_active() {
            debug!(
                elapsed = self.gesture.elapsed(),
                "Wave requested mid-gesture, restoring pose before restart"
            );
            apply(rig, std::mem::take(&mut self.gesture).release());
        }

        let captured = CapturedPose::capture(&*rig, &JointName::ARM_CHAIN);
        debug!(captured_joints = captured.len(), "Wave started");
        self.gesture = GestureState::start_wave(captured);
        true
    }

    /// Abort the running gesture and restore its captured pose
    ///
    /// Returns `false` if nothing was running.
    pub fn cancel_gesture<R: Rig + ?Sized>(&mut self, rig: &mut R) -> bool {
        if !self.gesture.is_active() {
            return false;
        }
        debug!(elapsed = self.gesture.elapsed(), "Gesture cancelled");
        apply(rig, std::mem::take(&mut self.gesture).release());
        true
    }

    /// Show the talking smile immediately
    pub fn play_talking_animation<R: Rig + ?Sized>(&mut self, rig: &mut R) {
        rig.set_expression(Expression::Happy, TALKING_HAPPY);
    }

    /// Clear the talking smile immediately
    pub fn stop_talking_animation<R: Rig + ?Sized>(&mut self, rig: &mut R) {
        rig.set_expression(Expression::Happy, 0.0);
    }

    /// Current blink phase
    #[must_use]
    pub fn blink_phase(&self) -> BlinkPhase {
        self.blink.phase()
    }

    /// Wait before the next blink
    #[must_use]
    pub fn blink_interval(&self) -> f32 {
        self.blink.interval()
    }

    /// Seconds accumulated in the current blink phase
    #[must_use]
    pub fn blink_timer(&self) -> f32 {
        self.blink.timer()
    }

    /// Seconds of breathing accumulated
    #[must_use]
    pub fn breathe_time(&self) -> f32 {
        self.breathing.time()
    }

    /// Whether a gesture is running
    #[must_use]
    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_active()
    }

    /// Seconds since the running gesture started (0 when idle)
    #[must_use]
    pub fn gesture_elapsed(&self) -> f32 {
        self.gesture.elapsed()
    }

    /// Wave phase of the running gesture
    #[must_use]
    pub fn wave_phase(&self) -> Option<WavePhase> {
        match self.gesture {
            GestureState::Idle => None,
            GestureState::Wave { elapsed, .. } => Some(WavePhase::at(elapsed)),
        }
    }

    /// Pose that will be restored when the running gesture ends
    #[must_use]
    pub fn captured_pose(&self) -> Option<&CapturedPose> {
        self.gesture.captured_pose()
    }
}

fn apply<R: Rig + ?Sized>(rig: &mut R, writes: Vec<PoseWrite>) {
    for write in writes {
        write.apply(rig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{MemoryRig, Rotation};

    #[test]
    fn test_animator_creation() {
        let animator = AvatarAnimator::seeded(1);
        assert_eq!(animator.blink_phase(), BlinkPhase::Waiting);
        assert!(!animator.is_gesture_active());
        assert_eq!(animator.gesture_elapsed(), 0.0);
        assert_eq!(animator.breathe_time(), 0.0);
        assert!(animator.captured_pose().is_none());
    }

    #[test]
    fn test_seeded_animators_agree() {
        let a = AvatarAnimator::seeded(99);
        let b = AvatarAnimator::seeded(99);
        assert_eq!(a.blink_interval(), b.blink_interval());
    }

    #[test]
    fn test_talking_cue_applies_immediately() {
        let mut rig = MemoryRig::humanoid();
        let mut animator = AvatarAnimator::seeded(3);

        animator.play_talking_animation(&mut rig);
        assert_eq!(rig.expression(Expression::Happy), Some(0.3));

        animator.stop_talking_animation(&mut rig);
        assert_eq!(rig.expression(Expression::Happy), Some(0.0));
    }

    #[test]
    fn test_wave_without_skeleton_is_noop() {
        let mut rig = MemoryRig::without_skeleton();
        let mut animator = AvatarAnimator::seeded(3);

        assert!(!animator.play_wave_animation(&mut rig));
        assert!(!animator.is_gesture_active());
        assert_eq!(animator.gesture_elapsed(), 0.0);
    }

    #[test]
    fn test_wave_captures_arm_chain() {
        let mut rig = MemoryRig::humanoid();
        rig.set_rotation(JointName::LeftHand, Rotation::new(0.5, 0.0, 0.0));
        let mut animator = AvatarAnimator::seeded(3);

        assert!(animator.play_wave_animation(&mut rig));
        let pose = animator.captured_pose().unwrap();
        assert_eq!(pose.len(), 6);
        assert_eq!(pose.get(JointName::LeftHand), Some(Rotation::new(0.5, 0.0, 0.0)));
        assert_eq!(pose.get(JointName::Chest), None);
    }

    #[test]
    fn test_restart_restores_in_flight_pose() {
        let mut rig = MemoryRig::humanoid();
        let rest = Rotation::new(0.1, 0.0, -0.2);
        rig.set_rotation(JointName::RightUpperArm, rest);

        let mut animator = AvatarAnimator::seeded(3);
        animator.play_wave_animation(&mut rig);
        animator.update(&mut rig, 0.25);
        assert_ne!(rig.rotation(JointName::RightUpperArm), Some(rest));

        // Second wave captures the original rest pose, not the raised arm
        assert!(animator.play_wave_animation(&mut rig));
        assert_eq!(rig.rotation(JointName::RightUpperArm), Some(rest));
        assert_eq!(animator.gesture_elapsed(), 0.0);
        assert_eq!(
            animator.captured_pose().unwrap().get(JointName::RightUpperArm),
            Some(rest)
        );
    }

    #[test]
    fn test_cancel_gesture() {
        let mut rig = MemoryRig::humanoid();
        let mut animator = AvatarAnimator::seeded(3);
        assert!(!animator.cancel_gesture(&mut rig));

        animator.play_wave_animation(&mut rig);
        animator.update(&mut rig, 1.0);
        assert_eq!(rig.expression(Expression::Happy), Some(0.7));

        assert!(animator.cancel_gesture(&mut rig));
        assert!(!animator.is_gesture_active());
        assert_eq!(rig.rotation(JointName::RightHand), Some(Rotation::default()));
        assert_eq!(rig.expression(Expression::Happy), Some(0.0));
    }

    #[test]
    fn test_wave_phase_reporting() {
        let mut rig = MemoryRig::humanoid();
        let mut animator = AvatarAnimator::seeded(3);
        assert_eq!(animator.wave_phase(), None);

        animator.play_wave_animation(&mut rig);
        assert_eq!(animator.wave_phase(), Some(WavePhase::Raise));
        animator.update(&mut rig, 1.0);
        assert_eq!(animator.wave_phase(), Some(WavePhase::Wave));
        animator.update(&mut rig, 1.25);
        assert_eq!(animator.wave_phase(), Some(WavePhase::Lower));
    }

    #[test]
    fn test_breathing_moves_chest() {
        let mut rig = MemoryRig::humanoid();
        let mut animator = AvatarAnimator::seeded(3);
        animator.update(&mut rig, 1.0);

        let chest = rig.position(JointName::Chest).unwrap();
        assert_eq!(chest.y, (1.0_f32 * 1.5).sin() * 0.002);
    }

    #[test]
    fn test_breathing_without_chest_still_advances() {
        let mut rig = MemoryRig::with_joints([JointName::RightHand]);
        let mut animator = AvatarAnimator::seeded(3);
        animator.update(&mut rig, 0.5);
        assert_eq!(animator.breathe_time(), 0.5);
        assert_eq!(rig.position(JointName::Chest), None);
    }
}
