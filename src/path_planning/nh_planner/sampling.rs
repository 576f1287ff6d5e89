//! Stochastic perturbation of approach headings and corner positions

use std::f64::consts::FRAC_PI_2;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use serde::Deserialize;

use crate::common::{normalize_angle, Pose2D};

/// Heading perturbation applied to every non-goal sample
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AngleSampling {
    /// Keep the approach heading
    None,
    /// Offset drawn from `[-half_width, half_width]`
    Uniform { half_width: f64 },
    /// Zero-mean normal offset
    Gaussian { sigma: f64 },
}

impl Default for AngleSampling {
    fn default() -> Self {
        AngleSampling::Gaussian { sigma: 0.25 }
    }
}

impl AngleSampling {
    /// Heading around `theta`
    pub fn sample<R: Rng + ?Sized>(&self, theta: f64, rng: &mut R) -> f64 {
        let offset = match *self {
            AngleSampling::None => 0.0,
            AngleSampling::Uniform { half_width } if half_width > 0.0 => {
                Uniform::new_inclusive(-half_width, half_width).sample(rng)
            }
            AngleSampling::Gaussian { sigma } if sigma > 0.0 => {
                let n: f64 = StandardNormal.sample(rng);
                n * sigma
            }
            _ => 0.0,
        };
        normalize_angle(theta + offset)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match *self {
            AngleSampling::Uniform { half_width } if !(half_width >= 0.0) => {
                Err(format!("angle sampling half_width must be non-negative, got {}", half_width))
            }
            AngleSampling::Gaussian { sigma } if !(sigma >= 0.0) => {
                Err(format!("angle sampling sigma must be non-negative, got {}", sigma))
            }
            _ => Ok(()),
        }
    }
}

/// Positions drawn around a corner, on the far side of it as seen along
/// the corner's heading and biased toward the wall-following side
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSampling {
    /// Radius drawn from `[0, radius]`
    Uniform { radius: f64 },
    /// Radius drawn as the magnitude of a zero-mean normal
    Gaussian { sigma: f64 },
}

impl Default for PositionSampling {
    fn default() -> Self {
        PositionSampling::Uniform { radius: 0.3 }
    }
}

impl PositionSampling {
    /// Configuration near `corner`. Clockwise samples turn away from the
    /// heading to the right, counter-clockwise ones to the left.
    pub fn sample<R: Rng + ?Sized>(&self, corner: &Pose2D, clockwise: bool, rng: &mut R) -> Pose2D {
        let radius = match *self {
            PositionSampling::Uniform { radius } if radius > 0.0 => {
                Uniform::new_inclusive(0.0, radius).sample(rng)
            }
            PositionSampling::Gaussian { sigma } => {
                let n: f64 = StandardNormal.sample(rng);
                (n * sigma).abs()
            }
            _ => 0.0,
        };
        let spread: f64 = Uniform::new_inclusive(0.0, FRAC_PI_2).sample(rng);
        let angle = if clockwise { corner.yaw - spread } else { corner.yaw + spread };

        Pose2D::new(
            corner.x + radius * angle.cos(),
            corner.y + radius * angle.sin(),
            corner.yaw,
        )
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match *self {
            PositionSampling::Uniform { radius } if !(radius > 0.0) => {
                Err(format!("position sampling radius must be positive, got {}", radius))
            }
            PositionSampling::Gaussian { sigma } if !(sigma > 0.0) => {
                Err(format!("position sampling sigma must be positive, got {}", sigma))
            }
            _ => Ok(()),
        }
    }
}
