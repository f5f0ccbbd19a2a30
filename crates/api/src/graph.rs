//! Factor-graph value types.

use crate::{NoiseModel, Pose, PoseKey, RobotId};
use std::collections::BTreeMap;

/// A relative-pose constraint between two pose variables.
///
/// Odometry factors (both keys on the same robot, consecutive keyframes)
/// and loop-closure factors (keys possibly on different robots) share this
/// shape.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetweenFactor {
    /// The pose variable the measurement is expressed from.
    pub from: PoseKey,

    /// The pose variable the measurement points to.
    pub to: PoseKey,

    /// The measured relative pose.
    pub measured: Pose,

    /// The uncertainty of the measurement.
    pub noise: NoiseModel,
}

impl BetweenFactor {
    /// Construct a new between factor.
    pub fn new(
        from: PoseKey,
        to: PoseKey,
        measured: Pose,
        noise: NoiseModel,
    ) -> Self {
        Self {
            from,
            to,
            measured,
            noise,
        }
    }

    /// Whether the two endpoints belong to different robots.
    pub fn is_inter_robot(&self) -> bool {
        self.from.robot != self.to.robot
    }

    /// The canonical `(min, max)` robot pair of the two endpoints.
    pub fn robot_pair(&self) -> (RobotId, RobotId) {
        let a = self.from.robot;
        let b = self.to.robot;
        (a.min(b), a.max(b))
    }
}

/// A unary constraint pinning one pose variable to a fixed pose.
///
/// Used as the gauge anchor of the merged graph; without one, the joint
/// graph has an unobservable global rigid-body degree of freedom.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorFactor {
    /// The anchored pose variable.
    pub key: PoseKey,

    /// The pose the variable is pinned to.
    pub pose: Pose,

    /// The uncertainty of the anchor.
    pub noise: NoiseModel,
}

/// A factor graph: between factors plus prior factors, jointly optimized
/// over the pose variables they reference.
#[derive(
    Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct FactorGraph {
    /// Relative-pose constraints.
    pub between: Vec<BetweenFactor>,

    /// Unary anchors.
    pub priors: Vec<PriorFactor>,
}

impl FactorGraph {
    /// Append a between factor.
    pub fn push_between(&mut self, factor: BetweenFactor) {
        self.between.push(factor);
    }

    /// Append every between factor from an iterator.
    pub fn extend_between<I: IntoIterator<Item = BetweenFactor>>(
        &mut self,
        factors: I,
    ) {
        self.between.extend(factors);
    }

    /// Append a prior factor.
    pub fn push_prior(&mut self, factor: PriorFactor) {
        self.priors.push(factor);
    }

    /// Total number of factors of either kind.
    pub fn factor_count(&self) -> usize {
        self.between.len() + self.priors.len()
    }

    /// Whether the graph holds no factors at all.
    pub fn is_empty(&self) -> bool {
        self.between.is_empty() && self.priors.is_empty()
    }
}

/// Pose estimates keyed by pose variable.
///
/// Deterministically ordered so that downstream consumers and tests see a
/// stable iteration order. Serialized as a sequence of `(key, pose)`
/// entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(BTreeMap<PoseKey, Pose>);

impl Values {
    /// Construct an empty estimate map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the estimate for a key.
    pub fn insert(&mut self, key: PoseKey, pose: Pose) {
        self.0.insert(key, pose);
    }

    /// Get the estimate for a key, if any.
    pub fn get(&self, key: &PoseKey) -> Option<&Pose> {
        self.0.get(key)
    }

    /// Whether an estimate exists for a key.
    pub fn contains_key(&self, key: &PoseKey) -> bool {
        self.0.contains_key(key)
    }

    /// Insert every estimate from `other`, replacing on key collision.
    pub fn merge(&mut self, other: &Values) {
        for (key, pose) in other.iter() {
            self.0.insert(*key, *pose);
        }
    }

    /// Number of estimates held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no estimates are held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the estimates in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PoseKey, &Pose)> {
        self.0.iter()
    }

    /// Iterate over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &PoseKey> {
        self.0.keys()
    }
}

impl serde::Serialize for Values {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> serde::Deserialize<'de> for Values {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<(PoseKey, Pose)>::deserialize(deserializer)?;
        Ok(Self(entries.into_iter().collect()))
    }
}

impl FromIterator<(PoseKey, Pose)> for Values {
    fn from_iter<I: IntoIterator<Item = (PoseKey, Pose)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
