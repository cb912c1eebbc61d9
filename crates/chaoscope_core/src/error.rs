use thiserror::Error;

/// Closed error taxonomy for the core.
///
/// Every failure is local and synchronous; nothing is retried internally.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed constructor or driver arguments, reported before any
    /// computation starts.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A derived quantity was requested before the step that produces it ran.
    #[error("{what} is not available yet; call {run_first} first")]
    NotYetComputed {
        what: &'static str,
        run_first: &'static str,
    },

    /// A variation name outside the fixed catalog.
    #[error("unknown variation \"{0}\"")]
    UnknownVariation(String),

    /// The integrated state stopped being finite. The double-pendulum
    /// denominators can vanish where cos^2(dtheta) cancels the effective
    /// inertia; the derivative itself is evaluated unguarded and the driver
    /// reports the first non-finite state instead of returning garbage.
    #[error("state became non-finite at t = {t}")]
    NumericSingularity { t: f64 },

    /// An iteration (implicit stage solve, adaptive step control) gave up.
    #[error("{0}")]
    Convergence(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
