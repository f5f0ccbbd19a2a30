//! Rigid-transform value types.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// A 6-DOF rigid transform (rotation + translation).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Pose(pub Isometry3<f64>);

impl Pose {
    /// The identity pose.
    pub fn identity() -> Self {
        Self(Isometry3::identity())
    }

    /// Construct a pose from a translation and a rotation.
    pub fn from_parts(
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self(Isometry3::from_parts(
            Translation3::from(translation),
            rotation,
        ))
    }

    /// Construct a pose from a translation with identity rotation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::from_parts(translation, UnitQuaternion::identity())
    }

    /// Compose this pose with another: `self ∘ other`.
    pub fn compose(&self, other: &Pose) -> Pose {
        Pose(self.0 * other.0)
    }

    /// The inverse transform.
    pub fn inverse(&self) -> Pose {
        Pose(self.0.inverse())
    }

    /// The relative transform taking `other` to `self`: `self ∘ other⁻¹`.
    pub fn relative_to(&self, other: &Pose) -> Pose {
        Pose(self.0 * other.0.inverse())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// A fixed diagonal noise model: independent standard deviations for the
/// three rotation and three translation components.
///
/// The same model is applied to odometry factors, loop-closure factors and
/// the gauge prior.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseModel {
    /// Standard deviation of each rotation component, in radians.
    pub rotation_sigma: f64,

    /// Standard deviation of each translation component, in meters.
    pub translation_sigma: f64,
}

impl NoiseModel {
    /// The six diagonal sigmas, rotation components first.
    pub fn sigmas(&self) -> [f64; 6] {
        [
            self.rotation_sigma,
            self.rotation_sigma,
            self.rotation_sigma,
            self.translation_sigma,
            self.translation_sigma,
            self.translation_sigma,
        ]
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self {
            rotation_sigma: 0.01,
            translation_sigma: 0.1,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn compose_then_inverse_is_identity() {
        let a = Pose::from_parts(
            Vector3::new(1.0, 2.0, 3.0),
            UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3),
        );
        let round_trip = a.compose(&a.inverse());
        let delta = round_trip.0.translation.vector.norm();
        assert!(delta < 1e-12);
        assert!(round_trip.0.rotation.angle() < 1e-12);
    }

    #[test]
    fn relative_to_recovers_increment() {
        let prev = Pose::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let curr = Pose::from_translation(Vector3::new(3.0, 0.0, 0.0));
        let rel = curr.relative_to(&prev);
        assert_eq!(
            Vector3::new(2.0, 0.0, 0.0),
            rel.0.translation.vector
        );
    }

    #[test]
    fn default_sigmas() {
        let sigmas = NoiseModel::default().sigmas();
        assert_eq!([0.01, 0.01, 0.01, 0.1, 0.1, 0.1], sigmas);
    }
}
