//! detection — detection-function library.
//!
//! Purpose
//! -------
//! Map distance and a named parameter set to a detection probability for the
//! six supported functional families, and expose the plot-curve data
//! interface consumed by external rendering code.
//!
//! Key behaviors
//! -------------
//! - Represent each family as a variant of the closed [`DetFn`] enum; the
//!   required parameter fields are enumerated statically per variant.
//! - Validate named-parameter sets at construction time (exact set match,
//!   domain checks), so evaluation never re-validates.
//! - Evaluate probabilities with guarded arithmetic: every family is
//!   well-defined at distance zero and clamped into `[0, 1]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed [`DetFn`] always holds domain-valid parameters.
//! - Evaluation is pure and re-entrant; no shared mutable state.
//!
//! Conventions
//! -----------
//! - Parameter names follow the survey literature: `g0`, `sigma`, `z`,
//!   `scale`, `shape*`, `b0`, `b1`, `sigma.ss`, `cutoff`.
//! - Errors are [`DetFnError`] values naming the offending field; this
//!   module never panics on user input.
//!
//! Downstream usage
//! ----------------
//! - The likelihood layer rebuilds a [`DetFn`] from the current natural
//!   parameter vector on every objective evaluation via
//!   [`DetFn::from_values`].
//! - Plot front-ends call [`DetFn::curve`] for `(distance, probability)`
//!   samples; no rendering logic lives here.
//!
//! Testing notes
//! -------------
//! - Unit tests cover closed-form limits at zero/infinite distance, the
//!   exact-set parameter validation for every tag, and curve sampling.

pub mod errors;
pub mod function;

pub use self::errors::{DetFnError, DetFnResult};
pub use self::function::{DetFn, DetFnTag};
