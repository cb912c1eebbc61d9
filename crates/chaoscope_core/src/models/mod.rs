pub mod decay;
pub mod double_pendulum;
pub mod pendulum;

pub use decay::ExponentialDecay;
pub use double_pendulum::{delta, solve_ensemble, DoublePendulum, DoublePendulumSim};
pub use pendulum::{Pendulum, PendulumSim};

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Unit of the angles in an initial condition. Conversion to radians happens
/// once, before integration; integrated states are always radians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleUnit {
    Radians,
    Degrees,
}

impl AngleUnit {
    pub(crate) fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value * std::f64::consts::PI / 180.0,
        }
    }
}

/// Uniform sampling grid over `[0, duration]` with spacing close to `dt`,
/// both endpoints included.
pub(crate) fn sample_times(duration: f64, dt: f64) -> CoreResult<Vec<f64>> {
    if !(duration > 0.0 && duration.is_finite()) {
        return Err(CoreError::InvalidParameter(format!(
            "duration must be positive and finite, got {duration}"
        )));
    }
    if !(dt > 0.0 && dt <= duration) {
        return Err(CoreError::InvalidParameter(format!(
            "dt must lie in (0, duration], got {dt}"
        )));
    }
    let n = ((duration / dt).round() as usize).max(2);
    Ok((0..n)
        .map(|i| duration * i as f64 / (n - 1) as f64)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{sample_times, AngleUnit};

    #[test]
    fn degrees_convert_to_radians() {
        assert!((AngleUnit::Degrees.to_radians(180.0) - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(AngleUnit::Radians.to_radians(1.25), 1.25);
    }

    #[test]
    fn sampling_grid_covers_both_endpoints() {
        let times = sample_times(10.0, 0.1).expect("grid should build");
        assert_eq!(times.len(), 100);
        assert_eq!(times[0], 0.0);
        assert_eq!(*times.last().unwrap(), 10.0);
    }

    #[test]
    fn sampling_grid_rejects_bad_arguments() {
        assert!(sample_times(0.0, 0.1).is_err());
        assert!(sample_times(10.0, 0.0).is_err());
        assert!(sample_times(10.0, 20.0).is_err());
    }
}
