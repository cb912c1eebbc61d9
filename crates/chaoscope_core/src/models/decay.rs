use crate::error::CoreResult;
use crate::integrate::{integrate, Method, SolveSettings};
use crate::models::sample_times;
use crate::traits::{Scalar, VectorField};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};

/// First-order exponential decay, `du/dt = -a u`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExponentialDecay {
    pub rate: f64,
}

impl ExponentialDecay {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// Integrates from `u0` over `[0, duration]` sampled at spacing `dt`.
    pub fn solve(&self, u0: f64, duration: f64, dt: f64) -> CoreResult<Trajectory> {
        let eval = sample_times(duration, dt)?;
        integrate(
            self,
            &[u0],
            (0.0, duration),
            &eval,
            Method::Dopri45,
            &SolveSettings::default(),
        )
    }
}

impl<T: Scalar> VectorField<T> for ExponentialDecay {
    fn dim(&self) -> usize {
        1
    }

    fn eval(&self, _t: T, y: &[T], dydt: &mut [T]) {
        let a = T::from_f64(self.rate).unwrap();
        dydt[0] = -a * y[0];
    }
}

#[cfg(test)]
mod tests {
    use super::ExponentialDecay;
    use crate::traits::VectorField;

    #[test]
    fn derivative_is_minus_rate_times_value() {
        let model = ExponentialDecay::new(0.4);
        let mut dydt: [f64; 1] = [0.0];
        model.eval(99.0, &[3.2], &mut dydt);
        assert!((dydt[0] - (-1.28)).abs() < 1e-12);
    }

    #[test]
    fn solution_follows_the_closed_form() {
        let model = ExponentialDecay::new(0.4);
        let traj = model.solve(1.0, 10.0, 0.1).expect("solve should succeed");
        for (i, &t) in traj.times().iter().enumerate() {
            assert!((traj.state(i)[0] - (-0.4 * t).exp()).abs() < 1e-5);
        }
    }
}
