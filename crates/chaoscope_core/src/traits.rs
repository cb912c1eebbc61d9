use crate::autodiff::Dual;
use crate::error::CoreResult;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric types the models can be evaluated over.
/// Covers `f64` for integration and [`Dual`] for Jacobians.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A time-dependent vector field `dy/dt = f(t, y)`.
///
/// `eval` writes the derivative into `dydt`; it must not allocate and must
/// stay pure (no interior state), so the same field can be handed to any
/// stepper or differentiated with dual numbers.
pub trait VectorField<T: Scalar> {
    /// Dimension of the state space.
    fn dim(&self) -> usize;

    /// Evaluates the field at `(t, y)` into `dydt`.
    fn eval(&self, t: T, y: &[T], dydt: &mut [T]);
}

/// A field every solver can drive, including the implicit one, which needs
/// dual-number evaluations for its Newton iteration matrix.
pub trait Differentiable: VectorField<f64> + VectorField<Dual> {}

impl<S: VectorField<f64> + VectorField<Dual>> Differentiable for S {}

/// One integration step of fixed size `h`.
///
/// `t` and `y` are advanced in place. Explicit steps cannot fail; the
/// implicit step reports `Convergence` when its stage solve does.
pub trait Stepper {
    fn step(
        &mut self,
        field: &impl Differentiable,
        t: &mut f64,
        y: &mut [f64],
        h: f64,
    ) -> CoreResult<()>;
}
