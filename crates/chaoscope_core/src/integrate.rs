use crate::error::{CoreError, CoreResult};
use crate::solvers::{Dopri45, NewtonSettings, Radau3, Rk4};
use crate::traits::{Differentiable, Stepper, VectorField};
use crate::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Integration method selection.
///
/// `Dopri45` is the default explicit choice; `Radau3` is the implicit option
/// for stiff fields such as the double pendulum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Rk4,
    Dopri45,
    Radau3,
}

impl Default for Method {
    fn default() -> Self {
        Method::Dopri45
    }
}

/// Tolerances and step policy for [`integrate`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SolveSettings {
    /// Relative tolerance for the adaptive error control.
    pub rel_tol: f64,
    /// Absolute tolerance floor for the adaptive error control.
    pub abs_tol: f64,
    /// Initial step for the adaptive method.
    pub h_init: f64,
    /// Largest step any method may take.
    pub h_max: f64,
    /// Budget of steps (attempts included) across the whole span.
    pub max_steps: usize,
    /// Stage-solve settings for the implicit method.
    pub newton: NewtonSettings,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-9,
            h_init: 1e-3,
            h_max: 0.1,
            max_steps: 1_000_000,
            newton: NewtonSettings::default(),
        }
    }
}

/// Integrates `field` from `y0` over `t_span`, sampling the state at exactly
/// the requested `eval` times.
///
/// `eval` must be non-empty, strictly increasing and contained in `t_span`.
/// The produced [`Trajectory`] is immutable; re-run to get a new one.
pub fn integrate<S: Differentiable>(
    field: &S,
    y0: &[f64],
    t_span: (f64, f64),
    eval: &[f64],
    method: Method,
    settings: &SolveSettings,
) -> CoreResult<Trajectory> {
    let dim = VectorField::<f64>::dim(field);
    validate(dim, y0, t_span, eval, settings)?;

    let (t0, _t1) = t_span;
    let mut driver = Driver {
        engine: Engine::new(method, dim, settings),
        settings,
        t: t0,
        y: y0.to_vec(),
        h: settings.h_init.min(settings.h_max),
        steps_taken: 0,
    };

    let mut trajectory = Trajectory::with_capacity(dim, eval.len());
    for &target in eval {
        driver.advance_to(field, target)?;
        trajectory.push(target, &driver.y);
    }

    debug!(
        method = ?method,
        samples = eval.len(),
        steps = driver.steps_taken,
        "integration finished"
    );
    Ok(trajectory)
}

fn validate(
    dim: usize,
    y0: &[f64],
    t_span: (f64, f64),
    eval: &[f64],
    settings: &SolveSettings,
) -> CoreResult<()> {
    let (t0, t1) = t_span;
    if y0.len() != dim {
        return Err(CoreError::InvalidParameter(format!(
            "initial state has dimension {}, field expects {dim}",
            y0.len()
        )));
    }
    if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
        return Err(CoreError::InvalidParameter(format!(
            "time span ({t0}, {t1}) is not a forward interval"
        )));
    }
    if eval.is_empty() {
        return Err(CoreError::InvalidParameter(
            "evaluation grid is empty".into(),
        ));
    }
    if eval.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(CoreError::InvalidParameter(
            "evaluation times must be strictly increasing".into(),
        ));
    }
    if eval[0] < t0 || *eval.last().unwrap() > t1 {
        return Err(CoreError::InvalidParameter(
            "evaluation times must lie inside the time span".into(),
        ));
    }
    if !(settings.rel_tol > 0.0 && settings.abs_tol > 0.0) {
        return Err(CoreError::InvalidParameter(
            "tolerances must be positive".into(),
        ));
    }
    if !(settings.h_init > 0.0 && settings.h_max > 0.0) {
        return Err(CoreError::InvalidParameter(
            "step sizes must be positive".into(),
        ));
    }
    if settings.max_steps == 0 {
        return Err(CoreError::InvalidParameter(
            "max_steps must be greater than zero".into(),
        ));
    }
    Ok(())
}

enum Engine {
    Rk4(Rk4),
    Dopri45(Dopri45),
    Radau3(Radau3),
}

impl Engine {
    fn new(method: Method, dim: usize, settings: &SolveSettings) -> Self {
        match method {
            Method::Rk4 => Engine::Rk4(Rk4::new(dim)),
            Method::Dopri45 => Engine::Dopri45(Dopri45::new(dim)),
            Method::Radau3 => Engine::Radau3(Radau3::new(dim, settings.newton)),
        }
    }
}

struct Driver<'a> {
    engine: Engine,
    settings: &'a SolveSettings,
    t: f64,
    y: Vec<f64>,
    h: f64,
    steps_taken: usize,
}

impl Driver<'_> {
    fn advance_to(&mut self, field: &impl Differentiable, target: f64) -> CoreResult<()> {
        // Resolution below which the remaining gap is considered closed.
        let eps = 1e-12 * target.abs().max(1.0);

        while target - self.t > eps {
            self.charge_step()?;
            match &mut self.engine {
                Engine::Rk4(stepper) => {
                    let h = (target - self.t).min(self.settings.h_max);
                    stepper.step(field, &mut self.t, &mut self.y, h)?;
                }
                Engine::Radau3(stepper) => {
                    let h = (target - self.t).min(self.settings.h_max);
                    stepper.step(field, &mut self.t, &mut self.y, h)?;
                }
                Engine::Dopri45(stepper) => {
                    let h = self.h.min(target - self.t).min(self.settings.h_max);
                    let (candidate, err) = stepper.attempt(field, self.t, &self.y, h);
                    let err_norm = scaled_error_norm(
                        err,
                        &self.y,
                        candidate,
                        self.settings.abs_tol,
                        self.settings.rel_tol,
                    );
                    if err_norm <= 1.0 {
                        self.y.copy_from_slice(candidate);
                        self.t += h;
                    } else {
                        trace!(t = self.t, h, err_norm, "step rejected");
                    }
                    self.h = next_step_size(h, err_norm);
                    if self.h < eps {
                        return Err(CoreError::Convergence(format!(
                            "step size underflow near t = {}",
                            self.t
                        )));
                    }
                }
            }
            if self.y.iter().any(|v| !v.is_finite()) {
                return Err(CoreError::NumericSingularity { t: self.t });
            }
        }
        self.t = target;
        Ok(())
    }

    fn charge_step(&mut self) -> CoreResult<()> {
        self.steps_taken += 1;
        if self.steps_taken > self.settings.max_steps {
            Err(CoreError::Convergence(format!(
                "step budget of {} exhausted at t = {}",
                self.settings.max_steps, self.t
            )))
        } else {
            Ok(())
        }
    }
}

/// RMS of the embedded error against the mixed absolute/relative tolerance;
/// values at or below 1 mean the step is acceptable.
fn scaled_error_norm(err: &[f64], y: &[f64], y_next: &[f64], abs_tol: f64, rel_tol: f64) -> f64 {
    let n = err.len();
    let mut acc = 0.0;
    for i in 0..n {
        let scale = abs_tol + rel_tol * y[i].abs().max(y_next[i].abs());
        let ratio = err[i] / scale;
        acc += ratio * ratio;
    }
    let norm = (acc / n as f64).sqrt();
    if norm.is_finite() {
        norm
    } else {
        f64::INFINITY
    }
}

fn next_step_size(h: f64, err_norm: f64) -> f64 {
    let factor = if err_norm > 0.0 {
        (0.9 * err_norm.powf(-0.2)).clamp(0.2, 5.0)
    } else {
        5.0
    };
    h * factor
}

#[cfg(test)]
mod tests {
    use super::{integrate, Method, SolveSettings};
    use crate::error::CoreError;
    use crate::models::decay::ExponentialDecay;

    fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| a + (b - a) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn samples_land_exactly_on_the_eval_grid() {
        let field = ExponentialDecay::new(0.4);
        let eval = linspace(0.0, 10.0, 101);
        let traj = integrate(
            &field,
            &[1.0],
            (0.0, 10.0),
            &eval,
            Method::Dopri45,
            &SolveSettings::default(),
        )
        .expect("integration should succeed");
        assert_eq!(traj.times(), &eval[..]);
    }

    #[test]
    fn adaptive_solution_matches_closed_form() {
        let field = ExponentialDecay::new(0.4);
        let eval = linspace(0.0, 10.0, 101);
        let traj = integrate(
            &field,
            &[1.0],
            (0.0, 10.0),
            &eval,
            Method::Dopri45,
            &SolveSettings::default(),
        )
        .expect("integration should succeed");
        for (i, &t) in traj.times().iter().enumerate() {
            let exact = (-0.4 * t).exp();
            assert!(
                (traj.state(i)[0] - exact).abs() < 1e-5,
                "mismatch at t = {t}"
            );
        }
    }

    #[test]
    fn every_method_agrees_on_a_smooth_problem() {
        let field = ExponentialDecay::new(1.0);
        let eval = linspace(0.0, 2.0, 21);
        let exact = (-2.0_f64).exp();
        for method in [Method::Rk4, Method::Dopri45, Method::Radau3] {
            let traj = integrate(
                &field,
                &[1.0],
                (0.0, 2.0),
                &eval,
                method,
                &SolveSettings::default(),
            )
            .expect("integration should succeed");
            let last = traj.state(traj.len() - 1)[0];
            assert!(
                (last - exact).abs() < 1e-4,
                "{method:?} ended at {last}, expected {exact}"
            );
        }
    }

    #[test]
    fn rejects_malformed_requests() {
        let field = ExponentialDecay::new(1.0);
        let settings = SolveSettings::default();
        let cases = [
            integrate(&field, &[1.0, 2.0], (0.0, 1.0), &[0.5], Method::Rk4, &settings),
            integrate(&field, &[1.0], (1.0, 0.0), &[0.5], Method::Rk4, &settings),
            integrate(&field, &[1.0], (0.0, 1.0), &[], Method::Rk4, &settings),
            integrate(&field, &[1.0], (0.0, 1.0), &[0.5, 0.25], Method::Rk4, &settings),
            integrate(&field, &[1.0], (0.0, 1.0), &[0.5, 2.0], Method::Rk4, &settings),
        ];
        for result in cases {
            assert!(matches!(
                result,
                Err(CoreError::InvalidParameter(_))
            ));
        }
    }
}
