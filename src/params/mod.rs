//! params — parameter naming, linking, and optimizer-facing layout.
//!
//! Purpose
//! -------
//! Own the mapping between the model's named natural-scale parameters and
//! the unconstrained link-scale vector the optimizer iterates on, including
//! fixed values, natural-scale bounds, and phase assignments.
//!
//! Key behaviors
//! -------------
//! - Validate names, starts, bounds, phases, and fixed values once at
//!   construction; every later query is total over validated state.
//! - Exclude fixed parameters from the link vector and reinsert them at
//!   their registered positions when expanding back to the natural scale.
//! - Transform natural-scale bounds through the forward link so box
//!   constraints apply on the scale the optimizer sees.
//!
//! Invariants & assumptions
//! ------------------------
//! - Registration order is the canonical parameter order; the free subset
//!   preserves relative order.
//! - `phase == -1` if and only if a fixed value is present.
//! - Inverse links are total: any real link-scale iterate maps into the
//!   natural domain.
//!
//! Conventions
//! -----------
//! - Positive parameters use [`LinkFn::Log`], probabilities
//!   [`LinkFn::Logit`], unbounded parameters [`LinkFn::Identity`].
//! - Link-scale coefficient names append `_link` to the natural name.
//!
//! Downstream usage
//! ----------------
//! - The likelihood expands each optimizer iterate with
//!   [`ParamRegistry::natural_full`]; the optimizer reads starts, bounds,
//!   and phases; inference reads links for the delta method.
//!
//! Testing notes
//! -------------
//! - Unit tests cover round trips, fixed-value reinsertion, link-scale
//!   bounds, and every rejection path.

pub mod errors;
pub mod link;
pub mod registry;

pub use self::errors::{ParamError, ParamResult};
pub use self::link::LinkFn;
pub use self::registry::{ParamRegistry, ParamSpec};
