use crate::error::{CoreError, CoreResult};
use serde::Serialize;

/// A sampled solution: one state row per time, times strictly increasing.
///
/// Produced once by [`crate::integrate`] and immutable afterwards; every
/// derived observable is a pure function of this data plus model constants.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    dim: usize,
    times: Vec<f64>,
    states: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(dim: usize, samples: usize) -> Self {
        Self {
            dim,
            times: Vec::with_capacity(samples),
            states: Vec::with_capacity(samples * dim),
        }
    }

    pub(crate) fn push(&mut self, t: f64, y: &[f64]) {
        debug_assert_eq!(y.len(), self.dim);
        debug_assert!(self.times.last().map_or(true, |last| t > *last));
        self.times.push(t);
        self.states.extend_from_slice(y);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State-space dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The state row at sample `index`.
    pub fn state(&self, index: usize) -> &[f64] {
        let start = index * self.dim;
        &self.states[start..start + self.dim]
    }

    /// Copies one state component across all samples.
    pub fn component(&self, index: usize) -> Vec<f64> {
        assert!(index < self.dim, "component index out of range");
        (0..self.len())
            .map(|i| self.states[i * self.dim + index])
            .collect()
    }
}

/// Numerical derivative of `values` with respect to `times`: central
/// differences in the interior, one-sided at the two ends.
pub fn gradient(values: &[f64], times: &[f64]) -> CoreResult<Vec<f64>> {
    if values.len() != times.len() {
        return Err(CoreError::InvalidParameter(format!(
            "gradient needs equally long arrays, got {} values over {} times",
            values.len(),
            times.len()
        )));
    }
    let n = values.len();
    if n < 2 {
        return Err(CoreError::InvalidParameter(
            "gradient needs at least two samples".into(),
        ));
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (times[1] - times[0]));
    for i in 1..n - 1 {
        out.push((values[i + 1] - values[i - 1]) / (times[i + 1] - times[i - 1]));
    }
    out.push((values[n - 1] - values[n - 2]) / (times[n - 1] - times[n - 2]));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{gradient, Trajectory};

    #[test]
    fn component_extracts_columns() {
        let mut traj = Trajectory::with_capacity(2, 3);
        traj.push(0.0, &[1.0, 10.0]);
        traj.push(0.5, &[2.0, 20.0]);
        traj.push(1.0, &[3.0, 30.0]);

        assert_eq!(traj.len(), 3);
        assert_eq!(traj.state(1), &[2.0, 20.0]);
        assert_eq!(traj.component(0), vec![1.0, 2.0, 3.0]);
        assert_eq!(traj.component(1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn gradient_is_exact_on_linear_data() {
        let times: Vec<f64> = (0..6).map(|i| 0.3 * i as f64).collect();
        let values: Vec<f64> = times.iter().map(|t| 2.5 * t - 1.0).collect();
        let grad = gradient(&values, &times).expect("gradient should compute");
        for g in grad {
            assert!((g - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn gradient_central_difference_is_exact_on_quadratics() {
        let times: Vec<f64> = (0..11).map(|i| 0.1 * i as f64).collect();
        let values: Vec<f64> = times.iter().map(|t| t * t).collect();
        let grad = gradient(&values, &times).expect("gradient should compute");
        // Interior points only; the one-sided ends are first order.
        for i in 1..10 {
            assert!((grad[i] - 2.0 * times[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn gradient_rejects_mismatched_or_short_input() {
        assert!(gradient(&[1.0, 2.0], &[0.0]).is_err());
        assert!(gradient(&[1.0], &[0.0]).is_err());
    }
}
