//! The `chaoscope_core` crate is the numerics engine behind the chaoscope
//! workspace: rigid-pendulum dynamics and iterated-function-system fractals.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `VectorField` (ODE
//!   right-hand sides), `Stepper` (integration steps).
//! - **Models**: exponential decay, single pendulum (optionally damped) and
//!   the coupled double pendulum, with trajectory-derived observables
//!   (positions, finite-difference velocities, energies).
//! - **Solvers**: classic RK4, adaptive Dormand-Prince 5(4) and an implicit
//!   Radau IIA step for stiff systems, driven by [`integrate`].
//! - **Fractals**: the chaos game on regular n-gons, affine IFS sampling
//!   (Barnsley fern) and the nonlinear variation catalog.
//! - **Autodiff**: dual numbers supplying exact Jacobians to the implicit
//!   solver.
//!
//! Rendering and file output live in the companion `chaoscope_render` crate;
//! this crate only produces arrays of numbers.

pub mod autodiff;
pub mod error;
pub mod fractal;
pub mod integrate;
pub mod models;
pub mod solvers;
pub mod traits;
pub mod trajectory;

pub use error::{CoreError, CoreResult};
pub use integrate::{integrate, Method, SolveSettings};
pub use trajectory::Trajectory;
