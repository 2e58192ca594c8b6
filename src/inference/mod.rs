//! inference — coefficients, intervals, prediction, and the bootstrap.
//!
//! Purpose
//! -------
//! Everything that happens after a fit: coefficient extraction over the
//! full coefficient space, standard errors, confidence intervals,
//! density-surface prediction, nonparametric bootstrapping, and model
//! comparison via AIC.
//!
//! Key behaviors
//! -------------
//! - [`FitResult`] carries estimates in the fixed coefficient order
//!   fitted → derived → linked; covariance rows and bootstrap draw
//!   columns follow the same order.
//! - [`coef`] composes selections ([`CoefSet`]) as a stable union;
//!   [`vcov`] extracts the matching covariance submatrix.
//! - [`confint`] offers Wald intervals with link-scale back-transform
//!   plus three bootstrap constructions ([`CiMethod`]).
//! - [`predict_density`] evaluates the log-linear density predictor at
//!   new design rows with delta-method standard errors.
//! - [`bootstrap`] resamples individuals within sessions, refits in
//!   parallel with deterministic per-replicate seeds, and attaches the
//!   draws to the fit.
//!
//! Invariants & assumptions
//! ------------------------
//! - A fit may legitimately carry no covariance matrix (singular Hessian
//!   or non-convergence); every consumer reports that case as
//!   [`InferenceError::CovarianceUnavailable`] rather than panicking.
//! - Bootstrap-based methods never fall back to Wald silently; missing
//!   draws are an error.
//!
//! Conventions
//! -----------
//! - Coefficient names are display names: the density intercept of a
//!   uniform model is `D`, linked coefficients append `_link`, and
//!   per-session effective survey areas are `esa.1`, `esa.2`, ...
//!
//! Downstream usage
//! ----------------
//! - `ScrModel::fit` in `crate::likelihood` produces the [`FitResult`]
//!   consumed here.
//!
//! Testing notes
//! -------------
//! - Unit tests here run against hand-assembled fits with known
//!   covariances; `tests/` exercises the full fit-then-infer pipeline.
pub mod bootstrap;
pub mod coef;
pub mod confint;
pub mod errors;
pub mod fit;
pub mod predict;

pub use self::bootstrap::bootstrap;
pub use self::coef::{coef, vcov, CoefSet};
pub use self::confint::{confint, CiMethod, ConfInt};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::fit::{
    aic, BootstrapDraws, Covariance, DerivedKind, DetectionUnit, FitMeta, FitResult, FittedParam,
    StdError,
};
pub use self::predict::{predict_density, DensityPrediction};
