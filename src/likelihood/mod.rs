//! Spatial capture-recapture likelihood.
//!
//! Purpose
//! -------
//! Assemble the full negative log-likelihood of an acoustic SCR survey:
//! detection-probability surfaces over the habitat mask, per-individual
//! mask integrals with auxiliary-measurement densities, and the Poisson
//! count term, summed over independent sessions.
//!
//! Key behaviors
//! -------------
//! - [`ScrModel::new`] performs all configuration validation up front;
//!   after it succeeds, likelihood evaluation cannot fail on data shape.
//! - [`ScrModel::fit`] runs the phased bounded quasi-Newton driver and
//!   returns an inference-ready [`crate::inference::FitResult`].
//! - Auxiliary components (time of arrival, signal strength, bearing,
//!   distance) each add an independent log-density term per detecting
//!   trap, evaluated per mask point.
//!
//! Invariants & assumptions
//! ------------------------
//! - Sessions are independent; the auxiliary component set is identical
//!   across sessions.
//! - All probability logs are floored so the objective is finite at any
//!   admissible parameter vector.
//! - Density surfaces are stated per unit of mask area; cell area converts
//!   mask sums to areal integrals.
//!
//! Conventions
//! -----------
//! - Matrices over the mask are laid out detector × mask-point.
//! - The optimizer sees only the free link-scale vector; fixed parameters
//!   are reinserted by the registry before every evaluation.
//!
//! Downstream usage
//! ----------------
//! - `crate::inference` consumes [`ScrModel`] and its fits for coefficient
//!   extraction, intervals, prediction, and bootstrapping.
//!
//! Testing notes
//! -------------
//! - Unit tests live with each component; the end-to-end fit path is
//!   exercised in `tests/`.
mod auxiliary;
mod detprob;
mod errors;
mod model;
mod session;

pub use auxiliary::{bearing_log_terms, distance_log_terms, ss_log_terms, toa_log_terms};
pub use detprob::DetProb;
pub use errors::{LikelihoodError, LikelihoodResult};
pub use model::{CueRate, DensityModel, FitOverrides, ScrModel, ScrOptions};
pub use session::{session_log_likelihood, AuxParams};
