//! Types identifying robots and pose variables.

/// Identifier of a robot in the fleet.
///
/// Robot ids are dense integers in `[0, nb_robots)`, assigned at deployment
/// and stable for the lifetime of the process.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct RobotId(pub u32);

impl RobotId {
    /// This id as an array index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RobotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u32> for RobotId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Sequence number of a keyframe, assigned by the front end.
///
/// Keyframe ids are strictly increasing per robot; fleetgraph never
/// generates them.
pub type KeyframeId = u64;

/// Globally unique label for a pose variable.
///
/// Uniqueness across the fleet relies on the robot id being part of the
/// key; no two robots ever produce the same key.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PoseKey {
    /// The robot that owns this pose variable.
    pub robot: RobotId,

    /// The keyframe this pose variable was created for.
    pub keyframe: KeyframeId,
}

impl PoseKey {
    /// Construct a new pose key.
    pub fn new(robot: RobotId, keyframe: KeyframeId) -> Self {
        Self { robot, keyframe }
    }
}

impl std::fmt::Display for PoseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}k{}", self.robot, self.keyframe)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pose_key_orders_by_robot_then_keyframe() {
        let a = PoseKey::new(RobotId(0), 7);
        let b = PoseKey::new(RobotId(1), 0);
        let c = PoseKey::new(RobotId(1), 3);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn display() {
        assert_eq!("r2k5", PoseKey::new(RobotId(2), 5).to_string());
    }
}
