use crate::error::{CoreError, CoreResult};
use crate::integrate::{integrate, Method, SolveSettings};
use crate::models::{sample_times, AngleUnit};
use crate::traits::{Scalar, VectorField};
use crate::trajectory::{gradient, Trajectory};
use serde::{Deserialize, Serialize};

/// Angular difference between the two links, the coupling variable of the
/// equations of motion.
pub fn delta(theta1: f64, theta2: f64) -> f64 {
    theta2 - theta1
}

/// Two coupled rigid links under gravity, state `(theta1, omega1, theta2,
/// omega2)` with angles unconstrained (no wrap-around).
///
/// The effective-inertia denominators `(M1+M2) L - M2 L cos^2(dtheta)` can
/// vanish; evaluation is left unguarded and the integration driver reports
/// the resulting non-finite state as a `NumericSingularity`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DoublePendulum {
    pub m1: f64,
    pub l1: f64,
    pub m2: f64,
    pub l2: f64,
    pub gravity: f64,
}

impl Default for DoublePendulum {
    fn default() -> Self {
        Self {
            m1: 1.0,
            l1: 1.0,
            m2: 1.0,
            l2: 1.0,
            gravity: 9.81,
        }
    }
}

impl DoublePendulum {
    pub fn new(m1: f64, l1: f64, m2: f64, l2: f64) -> CoreResult<Self> {
        if !(m1 > 0.0 && l1 > 0.0 && m2 > 0.0 && l2 > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "masses and lengths must be positive, got M1 = {m1}, L1 = {l1}, M2 = {m2}, L2 = {l2}"
            )));
        }
        Ok(Self {
            m1,
            l1,
            m2,
            l2,
            ..Self::default()
        })
    }
}

impl<T: Scalar> VectorField<T> for DoublePendulum {
    fn dim(&self) -> usize {
        4
    }

    fn eval(&self, _t: T, y: &[T], dydt: &mut [T]) {
        let m1 = T::from_f64(self.m1).unwrap();
        let l1 = T::from_f64(self.l1).unwrap();
        let m2 = T::from_f64(self.m2).unwrap();
        let l2 = T::from_f64(self.l2).unwrap();
        let g = T::from_f64(self.gravity).unwrap();

        let (theta1, omega1, theta2, omega2) = (y[0], y[1], y[2], y[3]);
        let dtheta = theta2 - theta1;
        let (sin_d, cos_d) = (dtheta.sin(), dtheta.cos());
        let total_mass = m1 + m2;

        dydt[0] = omega1;
        dydt[2] = omega2;

        let a1 = m2 * l1 * omega1 * omega1 * sin_d * cos_d;
        let b1 = m2 * g * theta2.sin() * cos_d;
        let c1 = m2 * l2 * omega2 * omega2 * sin_d;
        let d1 = total_mass * g * theta1.sin();
        dydt[1] = (a1 + b1 + c1 - d1) / (total_mass * l1 - m2 * l1 * cos_d * cos_d);

        let a2 = m2 * l2 * omega2 * omega2 * sin_d * cos_d;
        let b2 = total_mass * g * theta1.sin() * cos_d;
        let c2 = total_mass * l1 * omega1 * omega1 * sin_d;
        let d2 = total_mass * g * theta2.sin();
        dydt[3] = (-a2 + b2 - c2 - d2) / (total_mass * l2 - m2 * l2 * cos_d * cos_d);
    }
}

/// Runs a [`DoublePendulum`] with the implicit stiff method and derives bob
/// positions, finite-difference velocities and energies from the stored
/// trajectory. Accessors fail with `NotYetComputed` until
/// [`solve`](Self::solve) has run.
#[derive(Debug, Clone)]
pub struct DoublePendulumSim {
    model: DoublePendulum,
    solution: Option<Trajectory>,
}

impl DoublePendulumSim {
    pub fn new(model: DoublePendulum) -> Self {
        Self {
            model,
            solution: None,
        }
    }

    pub fn model(&self) -> &DoublePendulum {
        &self.model
    }

    /// Integrates from `(theta1, omega1, theta2, omega2)` over
    /// `[0, duration]`, sampling at spacing `dt`. Degree-valued initial
    /// conditions are converted to radians here, before integration.
    pub fn solve(
        &mut self,
        y0: [f64; 4],
        duration: f64,
        dt: f64,
        unit: AngleUnit,
    ) -> CoreResult<()> {
        let y0: Vec<f64> = y0.iter().map(|&v| unit.to_radians(v)).collect();
        let eval = sample_times(duration, dt)?;
        // Energetic swings move the field a long way in 0.1s; keep the
        // implicit step short enough for the stage Newton to stay reliable.
        let settings = SolveSettings {
            h_max: 0.05,
            ..SolveSettings::default()
        };
        let trajectory = integrate(
            &self.model,
            &y0,
            (0.0, duration),
            &eval,
            Method::Radau3,
            &settings,
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

    pub fn theta1(&self) -> CoreResult<Vec<f64>> {
        Ok(self.trajectory()?.component(0))
    }

    pub fn omega1(&self) -> CoreResult<Vec<f64>> {
        Ok(self.trajectory()?.component(1))
    }

    pub fn theta2(&self) -> CoreResult<Vec<f64>> {
        Ok(self.trajectory()?.component(2))
    }

    pub fn omega2(&self) -> CoreResult<Vec<f64>> {
        Ok(self.trajectory()?.component(3))
    }

    /// First bob, pivot at the origin, y measured upwards.
    pub fn x1(&self) -> CoreResult<Vec<f64>> {
        Ok(self
            .theta1()?
            .into_iter()
            .map(|theta| self.model.l1 * theta.sin())
            .collect())
    }

    pub fn y1(&self) -> CoreResult<Vec<f64>> {
        Ok(self
            .theta1()?
            .into_iter()
            .map(|theta| -self.model.l1 * theta.cos())
            .collect())
    }

    /// Second bob, offset from the first.
    pub fn x2(&self) -> CoreResult<Vec<f64>> {
        let x1 = self.x1()?;
        Ok(self
            .theta2()?
            .into_iter()
            .zip(x1)
            .map(|(theta, x1)| x1 + self.model.l2 * theta.sin())
            .collect())
    }

    pub fn y2(&self) -> CoreResult<Vec<f64>> {
        let y1 = self.y1()?;
        Ok(self
            .theta2()?
            .into_iter()
            .zip(y1)
            .map(|(theta, y1)| y1 - self.model.l2 * theta.cos())
            .collect())
    }

    pub fn vx1(&self) -> CoreResult<Vec<f64>> {
        gradient(&self.x1()?, self.times()?)
    }

    pub fn vy1(&self) -> CoreResult<Vec<f64>> {
        gradient(&self.y1()?, self.times()?)
    }

    pub fn vx2(&self) -> CoreResult<Vec<f64>> {
        gradient(&self.x2()?, self.times()?)
    }

    pub fn vy2(&self) -> CoreResult<Vec<f64>> {
        gradient(&self.y2()?, self.times()?)
    }

    pub fn kinetic(&self) -> CoreResult<Vec<f64>> {
        let (vx1, vy1) = (self.vx1()?, self.vy1()?);
        let (vx2, vy2) = (self.vx2()?, self.vy2()?);
        Ok((0..vx1.len())
            .map(|i| {
                0.5 * self.model.m1 * (vx1[i] * vx1[i] + vy1[i] * vy1[i])
                    + 0.5 * self.model.m2 * (vx2[i] * vx2[i] + vy2[i] * vy2[i])
            })
            .collect())
    }

    /// Potential energy measured from the lowest point each bob can reach.
    pub fn potential(&self) -> CoreResult<Vec<f64>> {
        let y1 = self.y1()?;
        let y2 = self.y2()?;
        let g = self.model.gravity;
        Ok(y1
            .iter()
            .zip(&y2)
            .map(|(y1, y2)| {
                self.model.m1 * g * (y1 + self.model.l1)
                    + self.model.m2 * g * (y2 + self.model.l1 + self.model.l2)
            })
            .collect())
    }

    pub fn total_energy(&self) -> CoreResult<Vec<f64>> {
        let kinetic = self.kinetic()?;
        let potential = self.potential()?;
        Ok(kinetic.iter().zip(&potential).map(|(k, p)| k + p).collect())
    }
}

/// Solves the same model from several initial conditions, one trajectory per
/// condition (the classic chaotic-divergence comparison). Runs are fully
/// independent and are only collected once each has finished.
pub fn solve_ensemble(
    model: DoublePendulum,
    initial_conditions: &[[f64; 4]],
    duration: f64,
    dt: f64,
) -> CoreResult<Vec<Trajectory>> {
    initial_conditions
        .iter()
        .map(|&y0| {
            let mut sim = DoublePendulumSim::new(model);
            sim.solve(y0, duration, dt, AngleUnit::Radians)?;
            sim.trajectory().cloned()
        })
        .collect()
}
