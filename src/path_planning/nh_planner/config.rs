//! Planner parameters, loadable from TOML

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::extender::ExtenderConfig;
use super::free_space::FreeSpaceConfig;
use super::sampling::{AngleSampling, PositionSampling};
use crate::common::{RoboticsError, RoboticsResult};

/// Configuration for the nonholonomic wall-following planner
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NHPlannerConfig {
    /// Position tolerance of the goal test and corner deduplication [m]
    pub delta_x: f64,
    /// Heading tolerance of the goal test [rad]
    pub delta_theta: f64,
    /// Samples drawn around each new corner
    pub k: usize,
    /// How many ancestors a new corner is offered to
    pub k_ancestors: usize,
    /// Planning deadline [s]
    pub t_max: f64,
    /// Both collision points farther than this from the target force both
    /// wall-following sides to be explored [m]
    pub resample_step: f64,
    /// Draws allowed per corner before falling back to the bare corner
    pub max_corner_retries: usize,
    /// Seed of the sampling strategies; entropy when unset
    pub seed: Option<u64>,
    pub extender: ExtenderConfig,
    pub free_space: FreeSpaceConfig,
    pub angle_sampling: AngleSampling,
    pub position_sampling: PositionSampling,
}

impl Default for NHPlannerConfig {
    fn default() -> Self {
        Self {
            delta_x: 0.5,
            delta_theta: 0.5,
            k: 3,
            k_ancestors: 1,
            t_max: 300.0,
            resample_step: 0.3,
            max_corner_retries: 100,
            seed: None,
            extender: ExtenderConfig::default(),
            free_space: FreeSpaceConfig::default(),
            angle_sampling: AngleSampling::default(),
            position_sampling: PositionSampling::default(),
        }
    }
}

impl NHPlannerConfig {
    pub fn from_toml_str(s: &str) -> RoboticsResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> RoboticsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs_f64(self.t_max.max(0.0))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_t_max(mut self, t_max: f64) -> Self {
        self.t_max = t_max;
        self
    }

    pub fn validate(&self) -> RoboticsResult<()> {
        let positive = [
            ("delta_x", self.delta_x),
            ("delta_theta", self.delta_theta),
            ("resample_step", self.resample_step),
            ("extender.max_curvature", self.extender.max_curvature),
            ("extender.step_size", self.extender.step_size),
            ("free_space.exit_margin", self.free_space.exit_margin),
            ("free_space.corner_radius", self.free_space.corner_radius),
            ("free_space.follow_distance", self.free_space.follow_distance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(RoboticsError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.t_max >= 0.0) || !self.t_max.is_finite() {
            return Err(RoboticsError::InvalidParameter(format!(
                "t_max must be a non-negative number of seconds, got {}",
                self.t_max
            )));
        }
        if self.k == 0 {
            return Err(RoboticsError::InvalidParameter("k must be at least 1".to_string()));
        }
        self.angle_sampling.validate().map_err(RoboticsError::InvalidParameter)?;
        self.position_sampling.validate().map_err(RoboticsError::InvalidParameter)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = NHPlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.deadline(), Duration::from_secs(300));
    }

    #[test]
    fn test_from_toml_with_nested_sections() {
        let config = NHPlannerConfig::from_toml_str(
            r#"
            delta_x = 0.25
            k = 5
            t_max = 2.5
            seed = 17

            [extender]
            max_curvature = 1.0

            [angle_sampling]
            type = "uniform"
            half_width = 0.4

            [position_sampling]
            type = "gaussian"
            sigma = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.delta_x, 0.25);
        assert_eq!(config.delta_theta, 0.5);
        assert_eq!(config.k, 5);
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.extender.max_curvature, 1.0);
        assert_eq!(config.extender.step_size, 0.05);
        assert_eq!(config.angle_sampling, AngleSampling::Uniform { half_width: 0.4 });
        assert_eq!(config.position_sampling, PositionSampling::Gaussian { sigma: 0.1 });
        assert_eq!(config.deadline(), Duration::from_millis(2500));
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(NHPlannerConfig::from_toml_str("").unwrap(), NHPlannerConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = NHPlannerConfig::from_toml_str("delta_x = -1.0").unwrap_err();
        assert!(matches!(err, RoboticsError::InvalidParameter(_)));

        let err = NHPlannerConfig::from_toml_str("k = 0").unwrap_err();
        assert!(matches!(err, RoboticsError::InvalidParameter(_)));

        let err = NHPlannerConfig::from_toml_str("delta_x = \"wide\"").unwrap_err();
        assert!(matches!(err, RoboticsError::Config(_)));
    }
}
