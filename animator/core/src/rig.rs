//! Rig Abstraction
//!
//! The humanoid rig is owned by the host (renderer, asset loader, test
//! harness). The animator only ever sees it through the [`Rig`] trait:
//!
//! - a joint lookup that may come back empty (partial rigs are normal)
//! - an expression channel setter that silently ignores unknown channels
//!
//! [`MemoryRig`] is a plain in-memory implementation used by headless
//! surfaces and by the test suites.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when naming rig parts from strings
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RigError {
    /// Joint name is not one the animator drives
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    /// Expression channel name is not one the animator drives
    #[error("Unknown expression channel: {0}")]
    UnknownExpression(String),
}

/// Humanoid joints touched by the animator
///
/// String forms are the VRM humanoid bone identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JointName {
    /// Upper torso, carries the breathing offset
    Chest,
    /// Right shoulder to elbow
    RightUpperArm,
    /// Right elbow to wrist
    RightLowerArm,
    /// Right wrist
    RightHand,
    /// Left shoulder to elbow
    LeftUpperArm,
    /// Left elbow to wrist
    LeftLowerArm,
    /// Left wrist
    LeftHand,
}

impl JointName {
    /// Every joint the animator knows about
    pub const ALL: [JointName; 7] = [
        JointName::Chest,
        JointName::RightUpperArm,
        JointName::RightLowerArm,
        JointName::RightHand,
        JointName::LeftUpperArm,
        JointName::LeftLowerArm,
        JointName::LeftHand,
    ];

    /// Arm and hand joints captured before a gesture starts
    ///
    /// The left side is captured too even though no gesture moves it yet.
    pub const ARM_CHAIN: [JointName; 6] = [
        JointName::RightUpperArm,
        JointName::RightLowerArm,
        JointName::RightHand,
        JointName::LeftUpperArm,
        JointName::LeftLowerArm,
        JointName::LeftHand,
    ];

    /// VRM bone identifier
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chest => "chest",
            Self::RightUpperArm => "rightUpperArm",
            Self::RightLowerArm => "rightLowerArm",
            Self::RightHand => "rightHand",
            Self::LeftUpperArm => "leftUpperArm",
            Self::LeftLowerArm => "leftLowerArm",
            Self::LeftHand => "leftHand",
        }
    }
}

impl fmt::Display for JointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointName {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|joint| joint.as_str() == s)
            .ok_or_else(|| RigError::UnknownJoint(s.to_string()))
    }
}

/// Facial expression channels (blend shapes)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// Eyelid closure
    Blink,
    /// Smile
    Happy,
}

impl Expression {
    /// Every channel the animator writes
    pub const ALL: [Expression; 2] = [Expression::Blink, Expression::Happy];

    /// VRM expression preset name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blink => "blink",
            Self::Happy => "happy",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Expression {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| RigError::UnknownExpression(s.to_string()))
    }
}

/// Rotation axis of a joint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Pitch
    X,
    /// Yaw
    Y,
    /// Roll
    Z,
}

/// Euler rotation in radians
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Rotation about X
    pub x: f32,
    /// Rotation about Y
    pub y: f32,
    /// Rotation about Z
    pub z: f32,
}

impl Rotation {
    /// Create a rotation from its three components
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Read one axis
    #[must_use]
    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Overwrite one axis
    pub fn set(&mut self, axis: Axis, radians: f32) {
        match axis {
            Axis::X => self.x = radians,
            Axis::Y => self.y = radians,
            Axis::Z => self.z = radians,
        }
    }
}

/// Local joint translation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X offset
    pub x: f32,
    /// Y offset
    pub y: f32,
    /// Z offset
    pub z: f32,
}

/// Mutable joint exposed by a rig
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JointHandle {
    /// Local rotation
    pub rotation: Rotation,
    /// Local position
    pub position: Position,
}

impl JointHandle {
    /// Joint at rest with the given rotation
    #[must_use]
    pub fn with_rotation(rotation: Rotation) -> Self {
        Self {
            rotation,
            position: Position::default(),
        }
    }
}

/// Capability the host rig exposes to the animator
///
/// Implementations must tolerate partial coverage: `joint_mut` returns
/// `None` for anything the model lacks, and `set_expression` is a no-op
/// for channels the model does not define.
pub trait Rig {
    /// Whether the model carries a humanoid skeleton at all
    fn has_skeleton(&self) -> bool;

    /// Look up a joint for reading
    fn joint(&self, name: JointName) -> Option<&JointHandle>;

    /// Look up a joint for writing
    fn joint_mut(&mut self, name: JointName) -> Option<&mut JointHandle>;

    /// Set an expression channel (0.0 - 1.0)
    fn set_expression(&mut self, channel: Expression, value: f32);
}

/// In-memory rig
///
/// Joints and expression channels are plain maps. Builders allow
/// modelling rigs that lack a skeleton, individual joints, or the
/// expression subsystem entirely.
#[derive(Clone, Debug, Default)]
pub struct MemoryRig {
    joints: HashMap<JointName, JointHandle>,
    expressions: Option<HashMap<Expression, f32>>,
    skeleton: bool,
}

impl MemoryRig {
    /// Full humanoid: every joint at rest, every expression at 0
    #[must_use]
    pub fn humanoid() -> Self {
        Self {
            joints: JointName::ALL
                .into_iter()
                .map(|joint| (joint, JointHandle::default()))
                .collect(),
            expressions: Some(Expression::ALL.into_iter().map(|e| (e, 0.0)).collect()),
            skeleton: true,
        }
    }

    /// Model with expressions but no humanoid skeleton
    #[must_use]
    pub fn without_skeleton() -> Self {
        Self {
            joints: HashMap::new(),
            expressions: Some(Expression::ALL.into_iter().map(|e| (e, 0.0)).collect()),
            skeleton: false,
        }
    }

    /// Humanoid exposing only the listed joints
    #[must_use]
    pub fn with_joints(joints: impl IntoIterator<Item = JointName>) -> Self {
        Self {
            joints: joints
                .into_iter()
                .map(|joint| (joint, JointHandle::default()))
                .collect(),
            ..Self::humanoid()
        }
    }

    /// Drop the expression subsystem
    #[must_use]
    pub fn without_expressions(mut self) -> Self {
        self.expressions = None;
        self
    }

    /// Set a joint's rotation, adding the joint if it is missing
    pub fn set_rotation(&mut self, name: JointName, rotation: Rotation) {
        self.joints
            .entry(name)
            .and_modify(|joint| joint.rotation = rotation)
            .or_insert_with(|| JointHandle::with_rotation(rotation));
    }

    /// Current rotation of a joint
    #[must_use]
    pub fn rotation(&self, name: JointName) -> Option<Rotation> {
        self.joints.get(&name).map(|joint| joint.rotation)
    }

    /// Current position of a joint
    #[must_use]
    pub fn position(&self, name: JointName) -> Option<Position> {
        self.joints.get(&name).map(|joint| joint.position)
    }

    /// Current value of an expression channel
    #[must_use]
    pub fn expression(&self, channel: Expression) -> Option<f32> {
        self.expressions.as_ref()?.get(&channel).copied()
    }
}

impl Rig for MemoryRig {
    fn has_skeleton(&self) -> bool {
        self.skeleton
    }

    fn joint(&self, name: JointName) -> Option<&JointHandle> {
        if !self.skeleton {
            return None;
        }
        self.joints.get(&name)
    }

    fn joint_mut(&mut self, name: JointName) -> Option<&mut JointHandle> {
        if !self.skeleton {
            return None;
        }
        self.joints.get_mut(&name)
    }

    fn set_expression(&mut self, channel: Expression, value: f32) {
        if let Some(slot) = self
            .expressions
            .as_mut()
            .and_then(|channels| channels.get_mut(&channel))
        {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_names_round_trip_through_strings() {
        for joint in JointName::ALL {
            assert_eq!(joint.as_str().parse::<JointName>(), Ok(joint));
        }
        assert_eq!(
            "tail".parse::<JointName>(),
            Err(RigError::UnknownJoint("tail".to_string()))
        );
    }

    #[test]
    fn test_expression_names() {
        assert_eq!("blink".parse::<Expression>(), Ok(Expression::Blink));
        assert_eq!(Expression::Happy.to_string(), "happy");
        assert!("angry".parse::<Expression>().is_err());
    }

    #[test]
    fn test_rotation_axis_access() {
        let mut rotation = Rotation::default();
        rotation.set(Axis::Y, 0.25);
        assert_eq!(rotation.get(Axis::Y), 0.25);
        assert_eq!(rotation.get(Axis::X), 0.0);
    }

    #[test]
    fn test_partial_rig_lookups() {
        let mut rig = MemoryRig::with_joints([JointName::RightHand]);
        assert!(rig.joint_mut(JointName::RightHand).is_some());
        assert!(rig.joint_mut(JointName::RightUpperArm).is_none());
        assert!(rig.joint(JointName::Chest).is_none());
    }

    #[test]
    fn test_set_rotation_adds_or_updates_joint() {
        let mut rig = MemoryRig::with_joints([JointName::Chest]);
        rig.joint_mut(JointName::Chest).unwrap().position.y = 0.01;

        rig.set_rotation(JointName::Chest, Rotation::new(0.1, 0.0, 0.0));
        rig.set_rotation(JointName::Head, Rotation::new(0.0, 0.2, 0.0));

        assert_eq!(rig.position(JointName::Chest).unwrap().y, 0.01);
        assert_eq!(rig.rotation(JointName::Chest), Some(Rotation::new(0.1, 0.0, 0.0)));
        assert_eq!(
            rig.joint(JointName::Head),
            Some(&JointHandle::with_rotation(Rotation::new(0.0, 0.2, 0.0)))
        );
    }

    #[test]
    fn test_rig_without_skeleton_hides_joints() {
        let mut rig = MemoryRig::without_skeleton();
        assert!(!rig.has_skeleton());
        assert!(rig.joint_mut(JointName::Chest).is_none());
    }

    #[test]
    fn test_missing_expression_subsystem_is_noop() {
        let mut rig = MemoryRig::humanoid().without_expressions();
        rig.set_expression(Expression::Happy, 0.5);
        assert_eq!(rig.expression(Expression::Happy), None);

        let mut rig = MemoryRig::humanoid();
        rig.set_expression(Expression::Happy, 0.5);
        assert_eq!(rig.expression(Expression::Happy), Some(0.5));
    }

    #[test]
    fn test_serde_uses_vrm_names() {
        let json = serde_json::to_string(&JointName::RightUpperArm).unwrap();
        assert_eq!(json, "\"rightUpperArm\"");
    }
}
