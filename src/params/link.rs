//! Link transforms between natural and unconstrained optimizer scales.
use crate::numerics::{safe_logistic, safe_logit};

/// Transform applied to a parameter before it reaches the optimizer.
///
/// Positive-valued parameters travel on the log scale, probability-valued
/// parameters on the logit scale, and unbounded parameters untransformed.
/// The inverse of each transform maps any real optimizer iterate back into
/// the natural domain, so the unconstrained search can never leave it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFn {
    Identity,
    Log,
    Logit,
}

impl LinkFn {
    /// Natural → link scale.
    pub fn to_link(&self, natural: f64) -> f64 {
        match self {
            LinkFn::Identity => natural,
            LinkFn::Log => natural.max(f64::MIN_POSITIVE).ln(),
            LinkFn::Logit => safe_logit(natural),
        }
    }

    /// Link → natural scale; total over all finite inputs.
    pub fn from_link(&self, link: f64) -> f64 {
        match self {
            LinkFn::Identity => link,
            LinkFn::Log => link.exp(),
            LinkFn::Logit => safe_logistic(link),
        }
    }

    /// Derivative of the inverse link at the given link-scale value.
    ///
    /// Used by the delta method to propagate link-scale covariance onto the
    /// natural scale.
    pub fn inverse_derivative(&self, link: f64) -> f64 {
        match self {
            LinkFn::Identity => 1.0,
            LinkFn::Log => link.exp(),
            LinkFn::Logit => {
                let p = safe_logistic(link);
                p * (1.0 - p)
            }
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            LinkFn::Identity => "identity",
            LinkFn::Log => "log",
            LinkFn::Logit => "logit",
        }
    }
}
