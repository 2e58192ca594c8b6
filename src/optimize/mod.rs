//! optimize — phased constrained maximum-likelihood driver.
//!
//! Purpose
//! -------
//! Minimize a model-supplied negative log-likelihood over an unconstrained
//! link-scale vector using L-BFGS, with box constraints enforced by
//! projection and staged phases that unfreeze parameter groups cumulatively.
//!
//! Key behaviors
//! -------------
//! - Adapt an [`Objective`] to `argmin`'s cost/gradient traits per stage,
//!   restricting the search to the currently active coordinates.
//! - Differentiate by finite differences only: central first, forward on
//!   retry, with errors captured out of the closure.
//! - Compute an optional finite-difference Hessian at the optimum and
//!   invert it into a covariance matrix by symmetric eigendecomposition
//!   with an eigenvalue floor.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective is evaluated on the link scale; inverse links inside the
//!   model keep every iterate in the natural domain.
//! - The final stage always covers every free coordinate, so phase numbers
//!   affect the path, never the final estimate's support.
//! - Backend errors never leak: every `argmin` error converts into an
//!   [`OptError`] at the module boundary.
//!
//! Conventions
//! -----------
//! - `Theta`/`Grad` are `ndarray` vectors over the free parameters;
//!   `Hessian` is dense `n × n`.
//! - Covariance inversion treats eigenvalues at or below
//!   [`crate::numerics::EIGEN_EPS`] as singular.
//!
//! Downstream usage
//! ----------------
//! - The likelihood layer implements [`Objective`] and calls [`minimize`];
//!   inference calls [`covariance_from_hessian`] and records singularity as
//!   a fit-level flag instead of failing the fit.
//!
//! Testing notes
//! -------------
//! - Unit tests solve quadratics with known optima, curvatures, and
//!   covariance matrices, and exercise the staging, projection, and
//!   rejection paths.

pub mod adapter;
pub mod driver;
pub mod errors;
pub mod hessian;

use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

pub use self::driver::{
    minimize, LineSearcher, MinimizeOptions, MinimizeOutcome, Objective, Tolerances,
};
pub use self::errors::{OptError, OptResult};
pub use self::hessian::{compute_hessian, covariance_from_hessian};

/// Free-parameter vector on the link scale.
pub type Theta = Array1<f64>;

/// Gradient vector matching the shape of [`Theta`].
pub type Grad = Array1<f64>;

/// Dense Hessian matrix, `n × n` for `n = Theta.len()`.
pub type Hessian = Array2<f64>;

/// Scalar objective value (negative log-likelihood).
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager-Zhang line search specialized to this crate's numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More-Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager-Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More-Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
