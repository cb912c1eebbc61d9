use crate::autodiff::jacobian;
use crate::error::{CoreError, CoreResult};
use crate::traits::{Differentiable, Stepper, VectorField};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Classic Runge-Kutta 4th order step.
pub struct Rk4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl Rk4 {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }
}

impl Stepper for Rk4 {
    fn step(
        &mut self,
        field: &impl Differentiable,
        t: &mut f64,
        y: &mut [f64],
        h: f64,
    ) -> CoreResult<()> {
        let t0 = *t;
        let half = 0.5 * h;

        field.eval(t0, y, &mut self.k1);

        for i in 0..y.len() {
            self.tmp[i] = y[i] + half * self.k1[i];
        }
        field.eval(t0 + half, &self.tmp, &mut self.k2);

        for i in 0..y.len() {
            self.tmp[i] = y[i] + half * self.k2[i];
        }
        field.eval(t0 + half, &self.tmp, &mut self.k3);

        for i in 0..y.len() {
            self.tmp[i] = y[i] + h * self.k3[i];
        }
        field.eval(t0 + h, &self.tmp, &mut self.k4);

        for i in 0..y.len() {
            y[i] += h / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        *t = t0 + h;
        Ok(())
    }
}

/// Dormand-Prince 5(4) embedded pair.
///
/// [`attempt`](Dopri45::attempt) produces the 5th-order candidate together
/// with the embedded error estimate; the integration driver owns the
/// accept/reject and step-size policy.
pub struct Dopri45 {
    k: [Vec<f64>; 7],
    tmp: Vec<f64>,
    y_next: Vec<f64>,
    err: Vec<f64>,
}

// Butcher tableau.
const DP_C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const DP_A2: [f64; 1] = [1.0 / 5.0];
const DP_A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
const DP_A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
const DP_A5: [f64; 4] = [
    19372.0 / 6561.0,
    -25360.0 / 2187.0,
    64448.0 / 6561.0,
    -212.0 / 729.0,
];
const DP_A6: [f64; 5] = [
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];
const DP_B5: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];
const DP_B4: [f64; 7] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];

impl Dopri45 {
    pub fn new(dim: usize) -> Self {
        Self {
            k: std::array::from_fn(|_| vec![0.0; dim]),
            tmp: vec![0.0; dim],
            y_next: vec![0.0; dim],
            err: vec![0.0; dim],
        }
    }

    /// Trial step of size `h` from `(t, y)`. Returns the 5th-order candidate
    /// and the componentwise embedded error; nothing is committed.
    pub fn attempt(
        &mut self,
        field: &impl Differentiable,
        t: f64,
        y: &[f64],
        h: f64,
    ) -> (&[f64], &[f64]) {
        let n = y.len();
        let rows: [&[f64]; 5] = [&DP_A2, &DP_A3, &DP_A4, &DP_A5, &DP_A6];

        field.eval(t, y, &mut self.k[0]);
        for (stage, row) in rows.iter().enumerate() {
            for i in 0..n {
                let mut acc = 0.0;
                for (j, a) in row.iter().enumerate() {
                    acc += a * self.k[j][i];
                }
                self.tmp[i] = y[i] + h * acc;
            }
            let (tmp, k) = (&self.tmp, &mut self.k[stage + 1]);
            field.eval(t + DP_C[stage + 1] * h, tmp, k);
        }

        // 5th-order candidate, then k7 = f(t + h, y5) for the embedded pair.
        for i in 0..n {
            let mut acc = 0.0;
            for j in 0..6 {
                acc += DP_B5[j] * self.k[j][i];
            }
            self.y_next[i] = y[i] + h * acc;
        }
        {
            let (y5, k7) = (&self.y_next, &mut self.k[6]);
            field.eval(t + h, y5, k7);
        }

        for i in 0..n {
            let mut acc = 0.0;
            for j in 0..7 {
                acc += (DP_B5[j] - DP_B4[j]) * self.k[j][i];
            }
            self.err[i] = h * acc;
        }

        (&self.y_next, &self.err)
    }
}

/// Newton-iteration settings for the implicit step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewtonSettings {
    pub max_iters: usize,
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_iters: 12,
            tolerance: 1e-10,
        }
    }
}

/// Two-stage Radau IIA step (order 3, stiffly accurate, A-stable).
///
/// The stage system `k_i = f(t + c_i h, y + h sum_j a_ij k_j)` is solved by
/// Newton iteration. The Jacobian is exact (dual numbers) and re-evaluated at
/// the current stage states every iteration, so convergence stays quadratic
/// even when the field changes noticeably across one step.
pub struct Radau3 {
    dim: usize,
    newton: NewtonSettings,
    stages: Vec<f64>,
    residual: Vec<f64>,
    jac: Vec<f64>,
    tmp_y: Vec<f64>,
    tmp_f: Vec<f64>,
}

const RADAU_A: [[f64; 2]; 2] = [[5.0 / 12.0, -1.0 / 12.0], [3.0 / 4.0, 1.0 / 4.0]];
const RADAU_C: [f64; 2] = [1.0 / 3.0, 1.0];
const RADAU_B: [f64; 2] = [3.0 / 4.0, 1.0 / 4.0];

impl Radau3 {
    pub fn new(dim: usize, newton: NewtonSettings) -> Self {
        Self {
            dim,
            newton,
            stages: vec![0.0; 2 * dim],
            residual: vec![0.0; 2 * dim],
            jac: vec![0.0; dim * dim],
            tmp_y: vec![0.0; dim],
            tmp_f: vec![0.0; dim],
        }
    }

    /// Fills `tmp_y` with the state seen by `stage`, `y + h sum_j a_ij k_j`.
    fn stage_state(&mut self, stage: usize, y: &[f64], h: f64) {
        let n = self.dim;
        for i in 0..n {
            let mut acc = 0.0;
            for (j, a) in RADAU_A[stage].iter().enumerate() {
                acc += a * self.stages[j * n + i];
            }
            self.tmp_y[i] = y[i] + h * acc;
        }
    }

    fn stage_residual(&mut self, field: &impl Differentiable, t: f64, y: &[f64], h: f64) -> f64 {
        let n = self.dim;
        let mut norm_sq = 0.0;
        for stage in 0..2 {
            self.stage_state(stage, y, h);
            field.eval(t + RADAU_C[stage] * h, &self.tmp_y, &mut self.tmp_f);
            for i in 0..n {
                let r = self.stages[stage * n + i] - self.tmp_f[i];
                self.residual[stage * n + i] = r;
                norm_sq += r * r;
            }
        }
        (norm_sq / (2 * n) as f64).sqrt()
    }

    /// Newton matrix of the stage system: block row `i` is
    /// `delta_ij I - h a_ij J(X_i)` with `J` evaluated at that row's current
    /// stage state `X_i`.
    fn newton_matrix(
        &mut self,
        field: &impl Differentiable,
        t: f64,
        y: &[f64],
        h: f64,
    ) -> DMatrix<f64> {
        let n = self.dim;
        let mut matrix = DMatrix::<f64>::identity(2 * n, 2 * n);
        for stage_i in 0..2 {
            self.stage_state(stage_i, y, h);
            jacobian(field, t + RADAU_C[stage_i] * h, &self.tmp_y, &mut self.jac);
            for stage_j in 0..2 {
                let a = RADAU_A[stage_i][stage_j];
                for i in 0..n {
                    for j in 0..n {
                        matrix[(stage_i * n + i, stage_j * n + j)] -= h * a * self.jac[i * n + j];
                    }
                }
            }
        }
        matrix
    }
}

impl Stepper for Radau3 {
    fn step(
        &mut self,
        field: &impl Differentiable,
        t: &mut f64,
        y: &mut [f64],
        h: f64,
    ) -> CoreResult<()> {
        let n = self.dim;

        // Initial guess: both stages at f(t, y).
        field.eval(*t, y, &mut self.tmp_f);
        for stage in 0..2 {
            self.stages[stage * n..(stage + 1) * n].copy_from_slice(&self.tmp_f);
        }

        // Convergence is judged against the stage magnitude so that stiff
        // fields (large |f|) are not held to an absolute residual they can
        // never reach in floating point.
        let newton_tol = self.newton.tolerance;
        let tolerance_for = move |stages: &[f64]| {
            let scale = (stages.iter().map(|k| k * k).sum::<f64>() / stages.len() as f64).sqrt();
            newton_tol * (1.0 + scale)
        };

        let mut converged = false;
        for _ in 0..self.newton.max_iters {
            let norm = self.stage_residual(field, *t, y, h);
            if norm <= tolerance_for(&self.stages) {
                converged = true;
                break;
            }
            let matrix = self.newton_matrix(field, *t, y, h);
            let rhs = DVector::from_column_slice(&self.residual);
            let delta = matrix.lu().solve(&rhs).ok_or_else(|| {
                CoreError::Convergence(format!(
                    "implicit stage matrix is singular at t = {t} (h = {h})"
                ))
            })?;
            for i in 0..2 * n {
                self.stages[i] -= delta[i];
            }
        }
        if !converged && self.stage_residual(field, *t, y, h) > tolerance_for(&self.stages) {
            return Err(CoreError::Convergence(format!(
                "Newton iteration failed to converge in {} steps at t = {t}",
                self.newton.max_iters
            )));
        }

        for i in 0..n {
            y[i] += h * (RADAU_B[0] * self.stages[i] + RADAU_B[1] * self.stages[n + i]);
        }
        *t += h;
        Ok(())
    }
}
