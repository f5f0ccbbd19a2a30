//! Configuration parameters for the exchange module.

use fleetgraph_api::{NoiseModel, RobotId};

/// Configuration parameters for [PoseGraphExchange](crate::PoseGraphExchange).
///
/// Loaded once at process startup; never changes over the life of the
/// coordinator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeConfig {
    /// The total number of robots in the fleet.
    ///
    /// Robot ids are dense in `[0, nbRobots)`; this bounds every
    /// id-indexed structure, independent of how many neighbors happen to
    /// be reachable in a given round.
    pub nb_robots: u32,

    /// This robot's id.
    pub robot_id: u32,

    /// The interval in milliseconds between attempts to start a round.
    ///
    /// Attempts are no-ops unless the coordinator is idle.
    ///
    /// Default: 1000
    pub round_interval_ms: u32,

    /// The interval in milliseconds between drive ticks.
    ///
    /// The drive tick moves an active round through its transitions,
    /// checks waiting deadlines and publishes the optimizer state.
    ///
    /// Default: 100
    pub drive_interval_ms: u32,

    /// The waiting budget in seconds applied to each wait of a round,
    /// discovery and subgraph collection alike. A round that stalls past
    /// this deadline is abandoned.
    ///
    /// Default: 60
    pub round_timeout_s: u32,

    /// Standard deviation of each rotation component of the fixed
    /// diagonal noise model, in radians.
    ///
    /// Default: 0.01
    pub rotation_noise_std: f64,

    /// Standard deviation of each translation component of the fixed
    /// diagonal noise model, in meters.
    ///
    /// Default: 0.1
    pub translation_noise_std: f64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            nb_robots: 1,
            robot_id: 0,
            round_interval_ms: 1000,
            drive_interval_ms: 100,
            round_timeout_s: 60,
            rotation_noise_std: 0.01,
            translation_noise_std: 0.1,
        }
    }
}

impl ExchangeConfig {
    /// This robot's id.
    pub fn self_id(&self) -> RobotId {
        RobotId(self.robot_id)
    }

    /// The fixed noise model applied to every factor.
    pub fn noise_model(&self) -> NoiseModel {
        NoiseModel {
            rotation_sigma: self.rotation_noise_std,
            translation_sigma: self.translation_noise_std,
        }
    }

    /// The interval between round-start attempts.
    pub(crate) fn round_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.round_interval_ms as u64)
    }

    /// The interval between drive ticks.
    pub(crate) fn drive_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.drive_interval_ms as u64)
    }

    /// The waiting budget of a round.
    pub(crate) fn round_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.round_timeout_s as u64)
    }
}
