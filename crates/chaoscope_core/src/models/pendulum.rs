use crate::error::{CoreError, CoreResult};
use crate::integrate::{integrate, Method, SolveSettings};
use crate::models::{sample_times, AngleUnit};
use crate::traits::{Scalar, VectorField};
use crate::trajectory::{gradient, Trajectory};
use serde::{Deserialize, Serialize};

/// A single rigid pendulum, optionally with linear damping.
///
/// `d2theta/dt2 = -(g/L) sin theta - (B/M) dtheta/dt` when `damping = Some(B)`.
/// Damping is a configuration field, not a separate model type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pendulum {
    pub mass: f64,
    pub length: f64,
    pub gravity: f64,
    pub damping: Option<f64>,
}

impl Default for Pendulum {
    fn default() -> Self {
        Self {
            mass: 1.0,
            length: 1.0,
            gravity: 9.81,
            damping: None,
        }
    }
}

impl Pendulum {
    pub fn new(mass: f64, length: f64) -> CoreResult<Self> {
        if !(mass > 0.0 && length > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "mass and length must be positive, got M = {mass}, L = {length}"
            )));
        }
        Ok(Self {
            mass,
            length,
            ..Self::default()
        })
    }

    pub fn with_damping(mut self, coefficient: f64) -> Self {
        self.damping = Some(coefficient);
        self
    }
}

impl<T: Scalar> VectorField<T> for Pendulum {
    fn dim(&self) -> usize {
        2
    }

    fn eval(&self, _t: T, y: &[T], dydt: &mut [T]) {
        let g_over_l = T::from_f64(self.gravity / self.length).unwrap();
        dydt[0] = y[1];
        dydt[1] = -g_over_l * y[0].sin();
        if let Some(b) = self.damping {
            dydt[1] = dydt[1] - T::from_f64(b / self.mass).unwrap() * y[1];
        }
    }
}

/// Runs a [`Pendulum`] and derives observables from the stored trajectory.
///
/// Accessors fail with `NotYetComputed` until [`solve`](Self::solve) has run.
#[derive(Debug, Clone)]
pub struct PendulumSim {
    model: Pendulum,
    solution: Option<Trajectory>,
}

impl PendulumSim {
    pub fn new(model: Pendulum) -> Self {
        Self {
            model,
            solution: None,
        }
    }

    pub fn model(&self) -> &Pendulum {
        &self.model
    }

    /// Integrates from `(theta0, omega0)` over `[0, duration]`, sampling at
    /// spacing `dt`. Degree-valued initial conditions are converted to
    /// radians here, before integration.
    pub fn solve(
        &mut self,
        y0: [f64; 2],
        duration: f64,
        dt: f64,
        unit: AngleUnit,
    ) -> CoreResult<()> {
        let y0 = [unit.to_radians(y0[0]), unit.to_radians(y0[1])];
        let eval = sample_times(duration, dt)?;
        let trajectory = integrate(
            &self.model,
            &y0,
            (0.0, duration),
            &eval,
            Method::Dopri45,
            &SolveSettings::default(),
        )?;
        self.solution = Some(trajectory);
        Ok(())
    }

    pub fn trajectory(&self) -> CoreResult<&Trajectory> {
        self.solution.as_ref().ok_or(CoreError::NotYetComputed {
            what: "the trajectory",
            run_first: "solve",
        })
    }

    pub fn times(&self) -> CoreResult<&[f64]> {
        Ok(self.trajectory()?.times())
    }

    pub fn theta(&self) -> CoreResult<Vec<f64>> {
        Ok(self.trajectory()?.component(0))
    }

    pub fn omega(&self) -> CoreResult<Vec<f64>> {
        Ok(self.trajectory()?.component(1))
    }

    /// Cartesian bob position, pivot at the origin, y measured upwards.
    pub fn x(&self) -> CoreResult<Vec<f64>> {
        Ok(self
            .theta()?
            .into_iter()
            .map(|theta| self.model.length * theta.sin())
            .collect())
    }

    pub fn y(&self) -> CoreResult<Vec<f64>> {
        Ok(self
            .theta()?
            .into_iter()
            .map(|theta| -self.model.length * theta.cos())
            .collect())
    }

    /// Velocity from the numerical gradient of position over the sample grid.
    pub fn vx(&self) -> CoreResult<Vec<f64>> {
        gradient(&self.x()?, self.times()?)
    }

    pub fn vy(&self) -> CoreResult<Vec<f64>> {
        gradient(&self.y()?, self.times()?)
    }

    pub fn kinetic(&self) -> CoreResult<Vec<f64>> {
        let vx = self.vx()?;
        let vy = self.vy()?;
        Ok(vx
            .iter()
            .zip(&vy)
            .map(|(vx, vy)| 0.5 * self.model.mass * (vx * vx + vy * vy))
            .collect())
    }

    /// Potential energy measured from the lowest point of the swing.
    pub fn potential(&self) -> CoreResult<Vec<f64>> {
        Ok(self
            .y()?
            .into_iter()
            .map(|y| self.model.mass * self.model.gravity * (y + self.model.length))
            .collect())
    }

    pub fn total_energy(&self) -> CoreResult<Vec<f64>> {
        let kinetic = self.kinetic()?;
        let potential = self.potential()?;
        Ok(kinetic.iter().zip(&potential).map(|(k, p)| k + p).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Pendulum, PendulumSim};
    use crate::error::CoreError;
    use crate::models::AngleUnit;
    use crate::traits::VectorField;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_6};

    #[test]
    fn derivative_at_rest_is_zero() {
        let model = Pendulum::new(1.0, 2.7).expect("parameters are valid");
        let mut dydt = [0.0; 2];
        model.eval(99.0, &[0.0, 0.0], &mut dydt);
        assert_eq!(dydt, [0.0, 0.0]);
    }

    #[test]
    fn derivative_matches_closed_form() {
        let model = Pendulum::new(1.0, 2.7).expect("parameters are valid");
        let mut dydt = [0.0; 2];
        model.eval(99.0, &[FRAC_PI_6, 0.15], &mut dydt);
        assert!((dydt[0] - 0.15).abs() < 1e-12);
        assert!((dydt[1] - (-9.81 / 2.7 * FRAC_PI_6.sin())).abs() < 1e-12);
    }

    #[test]
    fn damping_subtracts_a_velocity_term() {
        let model = Pendulum::default().with_damping(0.2);
        let mut dydt = [0.0; 2];
        model.eval(0.0, &[FRAC_PI_6, 0.15], &mut dydt);
        let undamped = -9.81 * FRAC_PI_6.sin();
        assert!((dydt[1] - (undamped - 0.2 * 0.15)).abs() < 1e-12);
    }

    #[test]
    fn constructor_rejects_nonpositive_parameters() {
        assert!(matches!(
            Pendulum::new(0.0, 1.0),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            Pendulum::new(1.0, -2.0),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn observables_before_solve_are_not_yet_computed() {
        let sim = PendulumSim::new(Pendulum::default());
        for result in [sim.theta(), sim.omega(), sim.kinetic()] {
            assert!(matches!(result, Err(CoreError::NotYetComputed { .. })));
        }
    }

    #[test]
    fn solving_from_rest_stays_at_rest() {
        let mut sim = PendulumSim::new(Pendulum::new(1.0, 3.4).expect("parameters are valid"));
        sim.solve([0.0, 0.0], 10.0, 1.0, AngleUnit::Radians)
            .expect("solve should succeed");
        for theta in sim.theta().expect("solved") {
            assert!(theta.abs() < 1e-12);
        }
    }

    #[test]
    fn bob_stays_on_the_rod_circle() {
        let length = 3.4;
        let mut sim = PendulumSim::new(Pendulum::new(1.0, length).expect("parameters are valid"));
        sim.solve([1.0, 1.0], 10.0, 0.1, AngleUnit::Radians)
            .expect("solve should succeed");
        let x = sim.x().expect("solved");
        let y = sim.y().expect("solved");
        for (x, y) in x.iter().zip(&y) {
            assert!((x * x + y * y - length * length).abs() < 1e-9);
        }
    }

    #[test]
    fn undamped_energy_is_roughly_conserved() {
        let mut sim = PendulumSim::new(Pendulum::default());
        sim.solve([FRAC_PI_2, 0.0], 10.0, 0.01, AngleUnit::Radians)
            .expect("solve should succeed");
        let total = sim.total_energy().expect("solved");
        // Skip the endpoints: their velocities come from first-order
        // one-sided differences.
        let interior = &total[1..total.len() - 1];
        let reference = interior[0];
        for e in interior {
            assert!(
                (e - reference).abs() < 5e-2,
                "energy drifted from {reference} to {e}"
            );
        }
    }

    #[test]
    fn degree_initial_conditions_are_converted() {
        let mut deg = PendulumSim::new(Pendulum::default());
        let mut rad = PendulumSim::new(Pendulum::default());
        deg.solve([90.0, 0.0], 1.0, 0.01, AngleUnit::Degrees)
            .expect("solve should succeed");
        rad.solve([FRAC_PI_2, 0.0], 1.0, 0.01, AngleUnit::Radians)
            .expect("solve should succeed");
        let a = deg.theta().expect("solved");
        let b = rad.theta().expect("solved");
        for (a, b) in a.iter().zip(&b) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
